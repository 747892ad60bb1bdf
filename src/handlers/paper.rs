// src/handlers/paper.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;

use crate::{
    error::AppError,
    handlers::parse_id,
    models::paper::{CreatePaperRequest, PaperFilter, PaperSummary, PaperView},
    store::DynStore,
    utils::{json::ValidatedJson, jwt::Claims},
};

/// Publishes a new question paper.
/// Teacher or admin only.
///
/// Question marks must add up to the paper's total; every mcq answer must
/// be one of its four options.
pub async fn create_paper(
    State(store): State<DynStore>,
    Extension(claims): Extension<Claims>,
    ValidatedJson(payload): ValidatedJson<CreatePaperRequest>,
) -> Result<impl IntoResponse, AppError> {
    let paper = store.insert_paper(payload.into_paper(Utc::now())).await?;

    tracing::info!(
        "{} '{}' published paper {} ({} questions)",
        claims.role,
        claims.sub,
        paper.id,
        paper.questions.len()
    );

    Ok((StatusCode::CREATED, Json(paper)))
}

/// Lists papers newest first, optionally filtered by class/stream and subject.
pub async fn list_papers(
    State(store): State<DynStore>,
    Query(filter): Query<PaperFilter>,
) -> Result<Json<Vec<PaperSummary>>, AppError> {
    let papers = store.list_papers(&filter).await?;
    Ok(Json(papers.iter().map(|p| p.summary()).collect()))
}

/// Fetches one paper. Students receive it without the answer key.
pub async fn get_paper(
    State(store): State<DynStore>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<PaperView>, AppError> {
    let not_found = || AppError::NotFound("Paper not found".to_string());
    let id = parse_id(&id).ok_or_else(not_found)?;
    let paper = store.get_paper(id).await?.ok_or_else(not_found)?;

    if claims.role.is_staff() {
        Ok(Json(PaperView::Full(paper)))
    } else {
        Ok(Json(PaperView::Public(paper.to_public())))
    }
}
