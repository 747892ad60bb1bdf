// src/models/video.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use url::Url;
use uuid::Uuid;
use validator::Validate;

/// Represents the 'videos' table in the database.
/// A lecture link shared by a teacher; unrelated to papers.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: Uuid,
    pub title: String,
    /// YouTube, Drive or any other http(s) link.
    pub link: String,
    pub subject: String,
    pub teacher_id: Uuid,
    pub uploaded_at: DateTime<Utc>,
}

/// DTO for uploading a video link.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateVideoRequest {
    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, max = 500), custom(function = validate_video_link))]
    pub link: String,
    /// Defaults to the uploading teacher's subject.
    #[serde(default)]
    #[validate(length(min = 1, max = 100))]
    pub subject: Option<String>,
}

/// Query parameters for the video listing.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct VideoFilter {
    pub subject: Option<String>,
}

/// Validates that a link is an absolute http(s) URL.
fn validate_video_link(link: &str) -> Result<(), validator::ValidationError> {
    match Url::parse(link) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.host().is_some() => Ok(()),
        _ => Err(validator::ValidationError::new("invalid_url")
            .with_message("Link must be an http(s) URL".into())),
    }
}
