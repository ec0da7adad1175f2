mod common;

use anyhow::Result;
use reqwest::{header::CONTENT_TYPE, StatusCode};
use serde_json::{json, Value};

use common::{ScriptedAi, TestServer};

fn profile() -> Value {
    json!({ "skills": "Rust, SQL", "jobRole": "Senior", "resume": "Ten years of backend work" })
}

#[tokio::test]
async fn unconfigured_ai_answers_503_without_calling_out() -> Result<()> {
    let server = TestServer::start().await?;
    let admin = server.admin().await?;
    server.employee("Staff").await?;

    let res = server
        .client
        .post(server.url("/ai/job-recommendations"))
        .bearer_auth(&admin.token)
        .json(&profile())
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

    let res = server.client.get(server.url("/ai/best-employee")).bearer_auth(&admin.token).send().await?;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

    let res = server
        .client
        .post(server.url("/ai/chat"))
        .bearer_auth(&admin.token)
        .json(&json!({ "message": "Hello" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

    assert_eq!(server.ai_calls(), 0);
    Ok(())
}

#[tokio::test]
async fn missing_input_is_rejected_before_the_ai_check() -> Result<()> {
    let server = TestServer::start().await?;
    let staff = server.employee("Staff").await?;

    let res = server
        .client
        .post(server.url("/ai/job-recommendations"))
        .bearer_auth(&staff.token)
        .json(&json!({ "skills": "Rust" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn suggestions_fall_back_to_baseline() -> Result<()> {
    let server = TestServer::start().await?;
    let manager = server.employee("Manager").await?;
    let staff = server.employee("Staff").await?;

    let res = server
        .client
        .post(server.url("/ai/performance-suggestions"))
        .bearer_auth(&manager.token)
        .json(&json!({ "teamData": [{ "name": "Ada", "performanceScore": 70 }] }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(3));
    assert_eq!(server.ai_calls(), 0);

    let res = server
        .client
        .post(server.url("/ai/performance-suggestions"))
        .bearer_auth(&staff.token)
        .json(&json!({ "teamData": [] }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    Ok(())
}

#[tokio::test]
async fn fenced_json_replies_are_unwrapped() -> Result<()> {
    let reply = "```json\n[{\"title\": \"Backend Engineer\", \"matchPercentage\": 92}]\n```";
    let server = TestServer::with_ai(ScriptedAi::replying(reply)).await?;
    let staff = server.employee("Staff").await?;

    let res = server
        .client
        .post(server.url("/ai/job-recommendations"))
        .bearer_auth(&staff.token)
        .json(&profile())
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["data"][0]["title"], "Backend Engineer");
    assert_eq!(server.ai_calls(), 1);

    Ok(())
}

#[tokio::test]
async fn unparseable_replies_are_a_server_error() -> Result<()> {
    let server = TestServer::with_ai(ScriptedAi::replying("Sure! Here are some ideas.")).await?;
    let manager = server.employee("Manager").await?;

    let res = server
        .client
        .post(server.url("/ai/performance-suggestions"))
        .bearer_auth(&manager.token)
        .json(&json!({ "teamData": [] }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = res.json::<Value>().await?;
    assert_eq!(body["error"], "Invalid response from AI service");

    Ok(())
}

#[tokio::test]
async fn best_employee_needs_employees() -> Result<()> {
    let server = TestServer::with_ai(ScriptedAi::replying("{\"bestEmployee\": {\"name\": \"Ada Staff\"}}")).await?;
    let admin = server.admin().await?;

    let res = server.client.get(server.url("/ai/best-employee")).bearer_auth(&admin.token).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(server.ai_calls(), 0);

    server.employee("Staff").await?;
    let res = server.client.get(server.url("/ai/best-employee")).bearer_auth(&admin.token).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["data"]["bestEmployee"]["name"], "Ada Staff");

    Ok(())
}

#[tokio::test]
async fn chat_streams_tokens_then_done() -> Result<()> {
    let server = TestServer::with_ai(ScriptedAi::streaming(&["Hel", "lo"])).await?;
    let admin = server.admin().await?;

    let res = server
        .client
        .post(server.url("/ai/chat"))
        .bearer_auth(&admin.token)
        .json(&json!({ "message": "Say hello" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("text/event-stream")));

    let body = res.text().await?;
    assert!(body.contains(r#"data: {"content":"Hel"}"#), "{}", body);
    assert!(body.contains(r#"data: {"content":"lo"}"#), "{}", body);
    assert!(body.trim_end().ends_with("data: [DONE]"), "{}", body);

    Ok(())
}

#[tokio::test]
async fn chat_reports_upstream_failure_in_band() -> Result<()> {
    let ai = ScriptedAi {
        fail_stream_after: Some(1),
        ..ScriptedAi::streaming(&["partial", "never sent"])
    };
    let server = TestServer::with_ai(ai).await?;
    let admin = server.admin().await?;

    let res = server
        .client
        .post(server.url("/ai/chat"))
        .bearer_auth(&admin.token)
        .json(&json!({ "message": "Say hello" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.text().await?;
    assert!(body.contains(r#"{"content":"partial"}"#), "{}", body);
    assert!(!body.contains("never sent"), "{}", body);
    assert!(body.contains(r#"{"error":"AI service request failed"}"#), "{}", body);
    assert!(body.trim_end().ends_with("data: [DONE]"), "{}", body);

    Ok(())
}

#[tokio::test]
async fn chat_reports_a_refused_request_in_band() -> Result<()> {
    let ai = ScriptedAi {
        refuse_stream: true,
        ..ScriptedAi::streaming(&["never sent"])
    };
    let server = TestServer::with_ai(ai).await?;
    let admin = server.admin().await?;

    let res = server
        .client
        .post(server.url("/ai/chat"))
        .bearer_auth(&admin.token)
        .json(&json!({ "message": "Say hello" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("text/event-stream")));

    let body = res.text().await?;
    assert!(!body.contains("never sent"), "{}", body);
    assert!(body.contains(r#"data: {"error":"AI service request failed"}"#), "{}", body);
    assert!(body.trim_end().ends_with("data: [DONE]"), "{}", body);
    assert_eq!(server.ai_calls(), 1);

    Ok(())
}

#[tokio::test]
async fn chat_is_admin_only() -> Result<()> {
    let server = TestServer::with_ai(ScriptedAi::streaming(&["hi"])).await?;
    let manager = server.employee("Manager").await?;

    let res = server
        .client
        .post(server.url("/ai/chat"))
        .bearer_auth(&manager.token)
        .json(&json!({ "message": "Hello" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(server.ai_calls(), 0);

    Ok(())
}
