// src/models/user.rs

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

/// Session role embedded in the auth token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
            Role::Admin => "admin",
        }
    }

    /// Teachers and admins may author papers and see answer keys.
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Teacher | Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "teacher" => Ok(Role::Teacher),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// Represents the 'students' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    pub roll_number: String,
    pub class: String,
    pub stream: Option<String>,
    pub year: Option<String>,
    pub student_type: Option<String>,
    #[serde(rename = "studentSubject")]
    pub subject: String,
    pub created_at: DateTime<Utc>,
}

impl Student {
    /// The stream when known, otherwise the class.
    pub fn class_stream(&self) -> &str {
        self.stream.as_deref().unwrap_or(&self.class)
    }
}

/// Represents the 'teachers' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,

    #[serde(skip)]
    pub password: String,

    pub subject: String,
    pub qualification: String,
    pub created_at: DateTime<Utc>,
}

/// A stored identity found by email at login.
#[derive(Debug, Clone)]
pub enum Account {
    Student(Student),
    Teacher(Teacher),
}

impl Account {
    pub fn id(&self) -> Uuid {
        match self {
            Account::Student(s) => s.id,
            Account::Teacher(t) => t.id,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Account::Student(_) => Role::Student,
            Account::Teacher(_) => Role::Teacher,
        }
    }

    pub fn full_name(&self) -> &str {
        match self {
            Account::Student(s) => &s.full_name,
            Account::Teacher(t) => &t.full_name,
        }
    }

    pub fn password_hash(&self) -> &str {
        match self {
            Account::Student(s) => &s.password,
            Account::Teacher(t) => &t.password,
        }
    }

    pub fn class_stream(&self) -> Option<&str> {
        match self {
            Account::Student(s) => Some(s.class_stream()),
            Account::Teacher(_) => None,
        }
    }
}

/// Public profile returned by user lookups and registration.
#[derive(Debug, Serialize)]
#[serde(tag = "userType", rename_all = "lowercase")]
pub enum UserProfile {
    Student(Student),
    Teacher(Teacher),
}

/// Student registration fields.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StudentRegistration {
    #[validate(length(min = 1, max = 100, message = "Full name is required"))]
    pub full_name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 6, max = 128, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 50, message = "Roll number is required"))]
    pub roll_number: String,
    #[validate(length(min = 1, max = 50, message = "Class is required"))]
    pub class: String,
    #[validate(length(min = 1, max = 100, message = "Subject is required"))]
    pub student_subject: String,
    #[serde(default)]
    pub stream: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub student_type: Option<String>,
}

/// Teacher registration fields.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TeacherRegistration {
    #[validate(length(min = 1, max = 100, message = "Full name is required"))]
    pub full_name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 6, max = 128, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 100, message = "Subject is required"))]
    pub subject: String,
    #[validate(length(min = 1, max = 200, message = "Qualification is required"))]
    pub qualification: String,
}

/// DTO for registration, discriminated by `userType`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "userType", rename_all = "lowercase")]
pub enum RegisterRequest {
    Student(StudentRegistration),
    Teacher(TeacherRegistration),
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        match self {
            RegisterRequest::Student(s) => s.validate(),
            RegisterRequest::Teacher(t) => t.validate(),
        }
    }
}

impl RegisterRequest {
    pub fn email(&self) -> &str {
        match self {
            RegisterRequest::Student(s) => &s.email,
            RegisterRequest::Teacher(t) => &t.email,
        }
    }

    pub fn password(&self) -> &str {
        match self {
            RegisterRequest::Student(s) => &s.password,
            RegisterRequest::Teacher(t) => &t.password,
        }
    }
}

/// DTO for login.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, max = 128, message = "Password is required"))]
    pub password: String,
    /// Restricts the lookup to one collection when present.
    #[serde(default)]
    pub role: Option<Role>,
}

/// Successful login body (the token itself travels in the cookie).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    pub role: Role,
    pub user_id: String,
    pub full_name: String,
}

/// Body of `GET /api/auth/verify`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub authenticated: bool,
    pub user_id: String,
    pub role: Role,
    pub full_name: String,
    pub class_stream: Option<String>,
}

/// DTO for password reset.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[serde(default)]
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    /// `student` or `teacher`.
    #[serde(default)]
    #[validate(length(min = 1, message = "userType is required"))]
    pub user_type: String,
    #[serde(default)]
    #[validate(length(min = 6, max = 128, message = "Password must be at least 6 characters"))]
    pub new_password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_request_is_discriminated_by_user_type() {
        let body = serde_json::json!({
            "userType": "teacher",
            "fullName": "Ada Lovelace",
            "email": "ada@quested.io",
            "password": "engine",
            "subject": "Maths",
            "qualification": "PhD"
        });
        let req: RegisterRequest = serde_json::from_value(body).unwrap();
        assert!(matches!(req, RegisterRequest::Teacher(_)));
        assert!(req.validate().is_ok());
        assert_eq!(req.email(), "ada@quested.io");
    }

    #[test]
    fn student_registration_requires_roll_number() {
        let body = serde_json::json!({
            "userType": "student",
            "fullName": "Sam",
            "email": "sam@quested.io",
            "password": "secret1",
            "rollNumber": "",
            "class": "10A",
            "studentSubject": "Science"
        });
        let req: RegisterRequest = serde_json::from_value(body).unwrap();
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("roll_number"));
    }

    #[test]
    fn short_password_is_rejected() {
        let req = LoginRequest {
            email: "x@y.io".into(),
            password: String::new(),
            role: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn role_text_matches_serde() {
        for role in [Role::Student, Role::Teacher, Role::Admin] {
            let json = serde_json::to_value(role).unwrap();
            assert_eq!(json, role.as_str());
            assert_eq!(role.as_str().parse::<Role>(), Ok(role));
        }
    }
}
