// src/handlers/auth.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::{
    config::Config,
    error::AppError,
    handlers::parse_id,
    models::user::{
        LoginRequest, LoginResponse, RegisterRequest, ResetPasswordRequest, Role, Student,
        Teacher, UserProfile, VerifyResponse,
    },
    store::{DUPLICATE_EMAIL, DynStore},
    utils::{
        hash::{hash_password, verify_password},
        html::clean_html,
        json::{AppJson, ValidatedJson},
        jwt::{ADMIN_SUBJECT, Claims, removal_cookie, session_cookie, sign_jwt},
    },
};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Display name carried in admin sessions.
const ADMIN_NAME: &str = "Admin";

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn clean_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| clean_html(v.trim()))
        .filter(|v| !v.is_empty())
}

/// Registers a new student or teacher.
///
/// The email must be unused across both collections. Hashes the password
/// using Argon2 before storing it. Returns 201 Created and the public
/// profile (excluding password).
pub async fn register(
    State(store): State<DynStore>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let email = normalize_email(payload.email());

    if store.email_exists(&email).await? {
        return Err(AppError::Conflict(DUPLICATE_EMAIL.to_string()));
    }

    let password = hash_password(payload.password())?;
    let now = Utc::now();

    let profile = match payload {
        RegisterRequest::Student(s) => {
            let student = Student {
                id: Uuid::new_v4(),
                full_name: clean_html(s.full_name.trim()),
                email,
                password,
                roll_number: clean_html(s.roll_number.trim()),
                class: clean_html(s.class.trim()),
                stream: clean_optional(s.stream),
                year: clean_optional(s.year),
                student_type: clean_optional(s.student_type),
                subject: clean_html(s.student_subject.trim()),
                created_at: now,
            };
            UserProfile::Student(store.insert_student(student).await?)
        }
        RegisterRequest::Teacher(t) => {
            let teacher = Teacher {
                id: Uuid::new_v4(),
                full_name: clean_html(t.full_name.trim()),
                email,
                password,
                subject: clean_html(t.subject.trim()),
                qualification: clean_html(t.qualification.trim()),
                created_at: now,
            };
            UserProfile::Teacher(store.insert_teacher(teacher).await?)
        }
    };

    Ok((StatusCode::CREATED, Json(profile)))
}

/// Authenticates a student, teacher or the configured admin.
///
/// The admin pair from the environment is checked first. On success the
/// JWT is placed in the HTTP-only `authToken` cookie.
pub async fn login(
    State(store): State<DynStore>,
    State(config): State<Config>,
    jar: CookieJar,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let email = normalize_email(&payload.email);

    if matches!(payload.role, None | Some(Role::Admin)) {
        if let Some((admin_email, admin_password)) = config.admin_credentials() {
            if email == normalize_email(admin_email) && payload.password == admin_password {
                let token = sign_jwt(
                    ADMIN_SUBJECT,
                    Role::Admin,
                    ADMIN_NAME,
                    None,
                    &config.jwt_secret,
                    config.jwt_expiration,
                )?;
                tracing::info!("Admin signed in");

                let body = LoginResponse {
                    success: true,
                    role: Role::Admin,
                    user_id: ADMIN_SUBJECT.to_string(),
                    full_name: ADMIN_NAME.to_string(),
                };
                return Ok((jar.add(session_cookie(token, &config)), Json(body)));
            }
        }
    }

    if payload.role == Some(Role::Admin) || payload.password.is_empty() {
        return Err(AppError::AuthError(INVALID_CREDENTIALS.to_string()));
    }

    let account = store
        .find_account(&email, payload.role)
        .await?
        .ok_or_else(|| AppError::AuthError(INVALID_CREDENTIALS.to_string()))?;

    if !verify_password(&payload.password, account.password_hash())? {
        return Err(AppError::AuthError(INVALID_CREDENTIALS.to_string()));
    }

    let user_id = account.id().to_string();
    let token = sign_jwt(
        &user_id,
        account.role(),
        account.full_name(),
        account.class_stream(),
        &config.jwt_secret,
        config.jwt_expiration,
    )?;

    tracing::info!("User {} signed in as {}", user_id, account.role());

    let body = LoginResponse {
        success: true,
        role: account.role(),
        user_id,
        full_name: account.full_name().to_string(),
    };
    Ok((jar.add(session_cookie(token, &config)), Json(body)))
}

/// Reports the identity behind the current session.
pub async fn verify(Extension(claims): Extension<Claims>) -> Json<VerifyResponse> {
    Json(VerifyResponse {
        authenticated: true,
        user_id: claims.sub,
        role: claims.role,
        full_name: claims.name,
        class_stream: claims.class_stream,
    })
}

/// Clears the session cookie.
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    (
        jar.remove(removal_cookie()),
        Json(json!({ "success": true, "message": "Logged out" })),
    )
}

/// Replaces the password of a student or teacher identified by email.
pub async fn reset_password(
    State(store): State<DynStore>,
    ValidatedJson(payload): ValidatedJson<ResetPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    let role = match payload.user_type.parse::<Role>() {
        Ok(role @ (Role::Student | Role::Teacher)) => role,
        _ => return Err(AppError::BadRequest("Invalid userType.".to_string())),
    };

    let email = normalize_email(&payload.email);
    let password_hash = hash_password(&payload.new_password)?;

    if !store.update_password(role, &email, &password_hash).await? {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    tracing::info!("Password reset for a {} account", role);

    Ok(Json(json!({ "success": true, "message": "Password updated successfully" })))
}

/// Public profile of a student or teacher.
pub async fn get_user(
    State(store): State<DynStore>,
    Path(id): Path<String>,
) -> Result<Json<UserProfile>, AppError> {
    let not_found = || AppError::NotFound("User not found".to_string());
    let id = parse_id(&id).ok_or_else(not_found)?;

    if let Some(student) = store.get_student(id).await? {
        return Ok(Json(UserProfile::Student(student)));
    }

    store
        .get_teacher(id)
        .await?
        .map(|teacher| Json(UserProfile::Teacher(teacher)))
        .ok_or_else(not_found)
}
