use serde_json::Value;

/// Returned by the suggestions endpoint when no AI credential is set.
pub const BASELINE_SUGGESTIONS: [&str; 3] = [
    "Implement a peer-review system to foster collaboration.",
    "Organize weekly knowledge-sharing sessions.",
    "Set clearer goals and KPIs for each team member.",
];

pub fn job_recommendations(skills: &str, job_role: &str, resume: &str) -> String {
    format!(
        "Based on the following details, recommend job roles:\n\
         Skills: {skills}\n\
         Experience Level: {job_role}\n\
         Resume Summary: {resume}\n\n\
         Provide 2-3 job recommendations in JSON format with fields: \
         title, company, location, description, matchPercentage. \
         Reply with the JSON array only."
    )
}

pub fn performance_suggestions(team_data: &Value) -> String {
    let team = serde_json::to_string_pretty(team_data).unwrap_or_else(|_| team_data.to_string());
    format!(
        "You are advising a team manager. Review the team data below and suggest \
         concrete ways to improve team performance.\n\n\
         Team Data:\n{team}\n\n\
         Reply with a JSON array of 3 to 5 short suggestion strings and nothing else."
    )
}

pub fn best_employee(employee_data: &Value) -> String {
    let data = serde_json::to_string_pretty(employee_data).unwrap_or_else(|_| employee_data.to_string());
    format!(
        "Analyze the following employee performance data and determine the best performing \
         employee. Consider factors like tasks completed, attendance rate, performance score, \
         and tenure.\n\n\
         Employee Data:\n{data}\n\n\
         Provide a JSON response with the best employee's name, department, and a brief reason \
         why they are the best performer. Format: \
         {{\"bestEmployee\": {{\"name\": \"string\", \"department\": \"string\", \"reason\": \"string\"}}}}"
    )
}

pub fn admin_chat(message: &str) -> String {
    format!(
        "You are a helpful AI assistant for an employment management system. Respond to the \
         following query in a concise and helpful manner.\n\n\
         User Query: {message}"
    )
}
