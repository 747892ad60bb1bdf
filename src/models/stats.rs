// src/models/stats.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Document counts per collection, shown on the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CollectionCounts {
    pub students: i64,
    pub teachers: i64,
    pub papers: i64,
    pub solutions: i64,
    pub videos: i64,
}
