//! Route handlers for the REST API
//!
//! - [`videos`] — Per-user stored streams
//! - [`system`] — Health and OpenAPI

use crate::types::VideoRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

mod system;
mod videos;

pub use system::*;
pub use videos::*;

/// One stored stream as returned by GET /users/:id/videos
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct VideoEntry {
    /// Share link as the user sent it, trimmed
    pub original_url: String,
    /// Resolved stream URL
    pub processed_url: String,
    /// First submission time
    pub added_at: DateTime<Utc>,
    /// Last re-resolution time
    pub updated_at: DateTime<Utc>,
}

impl From<VideoRecord> for VideoEntry {
    fn from(record: VideoRecord) -> Self {
        Self {
            original_url: record.original_url,
            processed_url: record.processed_url,
            added_at: record.added_at,
            updated_at: record.updated_at,
        }
    }
}

/// Response body for GET /users/:id/videos
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct VideoList {
    /// Owner of the records
    pub user_id: i64,
    /// Records, newest first
    pub videos: Vec<VideoEntry>,
}

/// Response body for GET /health
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct HealthResponse {
    /// Always "ok" when the process answers
    pub status: String,
    /// Crate version
    pub version: String,
}
