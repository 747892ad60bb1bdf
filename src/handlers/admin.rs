// src/handlers/admin.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};
use axum_extra::extract::cookie::CookieJar;
use serde_json::json;

use crate::{
    error::AppError,
    models::stats::CollectionCounts,
    store::DynStore,
    utils::jwt::{Claims, removal_cookie},
};

/// Confirms an admin session.
/// Admin only.
pub async fn check_auth(Extension(claims): Extension<Claims>) -> impl IntoResponse {
    Json(json!({
        "authenticated": true,
        "role": claims.role,
    }))
}

/// Ends the admin session.
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    (
        jar.remove(removal_cookie()),
        Json(json!({ "success": true, "message": "Logged out" })),
    )
}

/// Document counts per collection for the dashboard.
/// Admin only.
pub async fn stats(State(store): State<DynStore>) -> Result<Json<CollectionCounts>, AppError> {
    Ok(Json(store.counts().await?))
}
