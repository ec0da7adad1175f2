use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{is_blank, normalize_date};
use crate::error::FieldError;
use crate::store::{Meta, Model};

pub const DEFAULT_AVATAR: &str = "/default-avatar.png";
pub const MIN_PASSWORD_LEN: usize = 6;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\w+([.-]?\w+)*@\w+([.-]?\w+)*(\.\w{2,3})+$").expect("email pattern compiles")
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Admin,
    #[default]
    Employee,
}

impl Role {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "Admin" => Some(Role::Admin),
            "Employee" => Some(Role::Employee),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Manager,
    Supervisor,
    Staff,
}

impl Category {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "Manager" => Some(Category::Manager),
            "Supervisor" => Some(Category::Supervisor),
            "Staff" => Some(Category::Staff),
            _ => None,
        }
    }
}

/// A person who can sign in. `password` always holds a bcrypt hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    #[serde(flatten)]
    pub meta: Meta,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default = "default_avatar")]
    pub profile_picture: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hire_date: Option<String>,
    #[serde(default)]
    pub team: Vec<String>,
    #[serde(default)]
    pub tasks_completed: i64,
    #[serde(default)]
    pub attendance_rate: f64,
    #[serde(default)]
    pub performance_score: f64,
}

fn default_avatar() -> String {
    DEFAULT_AVATAR.to_string()
}

impl Default for Account {
    fn default() -> Self {
        Self {
            meta: Meta::default(),
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            password: String::new(),
            role: Role::default(),
            category: None,
            profile_picture: default_avatar(),
            phone: None,
            department: None,
            salary: None,
            hire_date: None,
            team: Vec::new(),
            tasks_completed: 0,
            attendance_rate: 0.0,
            performance_score: 0.0,
        }
    }
}

impl Account {
    pub fn normalize_email(raw: &str) -> String {
        raw.trim().to_lowercase()
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_manager(&self) -> bool {
        self.category == Some(Category::Manager)
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    /// Checks a plain-text password before it is hashed.
    pub fn validate_plain_password(password: &str) -> Result<(), FieldError> {
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(FieldError::new(
                "password",
                format!("Password must be at least {} characters", MIN_PASSWORD_LEN),
            ));
        }
        Ok(())
    }
}

impl Model for Account {
    const COLLECTION: &'static str = "accounts";
    const LABEL: &'static str = "Employee";
    const HIDDEN: &'static [&'static str] = &["password"];

    fn meta(&self) -> &Meta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut Meta {
        &mut self.meta
    }

    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        if is_blank(&self.first_name) {
            errors.push(FieldError::new("firstName", "First name is required"));
        }
        if is_blank(&self.last_name) {
            errors.push(FieldError::new("lastName", "Last name is required"));
        }
        if is_blank(&self.email) {
            errors.push(FieldError::new("email", "Email is required"));
        } else if !EMAIL_RE.is_match(&self.email) {
            errors.push(FieldError::new("email", "Please add a valid email"));
        }
        if self.password.is_empty() {
            errors.push(FieldError::new("password", "Password is required"));
        }

        if self.role == Role::Employee && self.category.is_none() {
            errors.push(FieldError::new("category", "Category is required for employees"));
        }

        if !self.is_admin() {
            if self.phone.as_deref().map_or(true, is_blank) {
                errors.push(FieldError::new("phone", "Phone is required"));
            }
            if self.department.as_deref().map_or(true, is_blank) {
                errors.push(FieldError::new("department", "Department is required"));
            }
            match self.salary {
                None => errors.push(FieldError::new("salary", "Salary is required")),
                Some(salary) if !salary.is_finite() || salary < 0.0 => {
                    errors.push(FieldError::new("salary", "Salary must be a non-negative number"))
                }
                Some(_) => {}
            }
            if self.hire_date.is_none() {
                errors.push(FieldError::new("hireDate", "Hire date is required"));
            }
        }

        if let Some(hire_date) = &self.hire_date {
            if normalize_date(hire_date).is_none() {
                errors.push(FieldError::new("hireDate", "Hire date must be a valid date"));
            }
        }

        if self.tasks_completed < 0 {
            errors.push(FieldError::new("tasksCompleted", "Tasks completed cannot be negative"));
        }
        if !(0.0..=100.0).contains(&self.attendance_rate) {
            errors.push(FieldError::new("attendanceRate", "Attendance rate must be between 0 and 100"));
        }
        if !(0.0..=100.0).contains(&self.performance_score) {
            errors.push(FieldError::new("performanceScore", "Performance score must be between 0 and 100"));
        }
        if self.team.iter().any(|member| member == &self.meta.id) {
            errors.push(FieldError::new("team", "An account cannot be on its own team"));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
