// src/utils/jwt.rs

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{config::Config, error::AppError, models::user::Role};

/// Name of the HTTP-only session cookie.
pub const AUTH_COOKIE: &str = "authToken";

/// Subject used in admin tokens; the admin has no stored record.
pub const ADMIN_SUBJECT: &str = "admin";

/// JWT Claims structure.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Claims {
    /// Subject - the account id, or `admin`.
    pub sub: String,
    pub role: Role,
    /// Display name.
    pub name: String,
    /// Students only: stream, or class when no stream is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_stream: Option<String>,
    /// Expiration time as Unix timestamp.
    pub exp: usize,
}

impl Claims {
    /// The account id of a student or teacher session.
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| AppError::Forbidden("Session has no user account".to_string()))
    }
}

/// Signs a new JWT for an authenticated identity.
pub fn sign_jwt(
    subject: &str,
    role: Role,
    name: &str,
    class_stream: Option<&str>,
    secret: &str,
    expiration_seconds: u64,
) -> Result<String, AppError> {
    // Calculate expiration: current time + expiration_seconds
    let expiration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .as_secs() as usize
        + expiration_seconds as usize;

    let claims = Claims {
        sub: subject.to_owned(),
        role,
        name: name.to_owned(),
        class_stream: class_stream.map(str::to_owned),
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(e.to_string()))
}

/// Verifies and decodes a JWT string.
///
/// Returns the `Claims` if valid, otherwise returns an `AppError`.
pub fn verify_jwt(token: &str, secret: &str) -> Result<Claims, AppError> {
    let token_data = decode(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::AuthError("Invalid token".to_string()))?;

    Ok(token_data.claims)
}

/// Builds the session cookie carrying `token`.
pub fn session_cookie(token: String, config: &Config) -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE, token))
        .http_only(true)
        .secure(config.cookie_secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::seconds(config.jwt_expiration as i64))
        .build()
}

/// Cookie that `CookieJar::remove` turns into an expiring Set-Cookie.
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE, "")).path("/").build()
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

/// Axum Middleware: Authentication.
///
/// Reads the token from `Authorization: Bearer <token>` or, failing that,
/// from the session cookie. Valid claims are injected into the request
/// extensions; anything else is a 401.
pub async fn auth_middleware(
    State(config): State<Config>,
    jar: CookieJar,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = match bearer_token(req.headers()) {
        Some(token) => token.to_string(),
        None => jar
            .get(AUTH_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .ok_or_else(|| AppError::AuthError("Not authenticated".to_string()))?,
    };

    let claims = verify_jwt(&token, &config.jwt_secret)?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Must run AFTER `auth_middleware`.
async fn require_role(req: Request<Body>, next: Next, allowed: &[Role]) -> Result<Response, AppError> {
    let claims = req
        .extensions()
        .get::<Claims>()
        .ok_or_else(|| AppError::AuthError("Not authenticated".to_string()))?;

    if !allowed.contains(&claims.role) {
        return Err(AppError::Forbidden(format!(
            "This action is not available to a {}",
            claims.role
        )));
    }

    Ok(next.run(req).await)
}

/// Axum Middleware: admin only.
pub async fn admin_middleware(req: Request<Body>, next: Next) -> Result<Response, AppError> {
    require_role(req, next, &[Role::Admin]).await
}

/// Axum Middleware: teachers (and admin).
pub async fn teacher_middleware(req: Request<Body>, next: Next) -> Result<Response, AppError> {
    require_role(req, next, &[Role::Teacher, Role::Admin]).await
}

/// Axum Middleware: students only.
pub async fn student_middleware(req: Request<Body>, next: Next) -> Result<Response, AppError> {
    require_role(req, next, &[Role::Student]).await
}
