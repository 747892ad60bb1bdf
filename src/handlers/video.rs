// src/handlers/video.rs

use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::video::{CreateVideoRequest, Video, VideoFilter},
    store::DynStore,
    utils::{html::clean_html, json::ValidatedJson, jwt::Claims},
};

/// Shares a lecture video link.
/// Teacher only; the subject defaults to the teacher's own.
pub async fn create_video(
    State(store): State<DynStore>,
    Extension(claims): Extension<Claims>,
    ValidatedJson(payload): ValidatedJson<CreateVideoRequest>,
) -> Result<impl IntoResponse, AppError> {
    let teacher_id = claims.user_id()?;

    let subject = match payload.subject {
        Some(subject) => clean_html(subject.trim()),
        None => {
            store
                .get_teacher(teacher_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Teacher not found".to_string()))?
                .subject
        }
    };

    let video = Video {
        id: Uuid::new_v4(),
        title: clean_html(payload.title.trim()),
        link: payload.link.trim().to_string(),
        subject,
        teacher_id,
        uploaded_at: Utc::now(),
    };

    let video = store.insert_video(video).await?;
    tracing::info!("Teacher {} shared video {}", teacher_id, video.id);

    Ok((StatusCode::CREATED, Json(video)))
}

/// Lists videos newest first, optionally for one subject.
pub async fn list_videos(
    State(store): State<DynStore>,
    Query(filter): Query<VideoFilter>,
) -> Result<Json<Vec<Video>>, AppError> {
    Ok(Json(store.list_videos(filter.subject.as_deref()).await?))
}
