// src/handlers/mod.rs

pub mod admin;
pub mod auth;
pub mod exam;
pub mod paper;
pub mod video;

use uuid::Uuid;

/// Path ids that are not UUIDs cannot name a record, so callers answer 404.
pub(crate) fn parse_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw.trim()).ok()
}
