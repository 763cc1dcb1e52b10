//! Database layer for terabox-player-bot
//!
//! Handles SQLite persistence for users and their resolved videos.
//!
//! ## Submodules
//!
//! Methods on [`Database`] are organized by domain:
//! - [`migrations`] — Database lifecycle, schema migrations
//! - [`users`] — User upsert and lookup
//! - [`videos`] — Video record upsert and listing
//! - [`stats`] — Read-side aggregation for the admin report

use crate::error::DatabaseError;
use crate::types::{User, UserId, VideoRecord};
use crate::Error;
use chrono::{DateTime, TimeZone, Utc};
use sqlx::{FromRow, sqlite::SqlitePool};

mod migrations;
mod stats;
mod users;
mod videos;

/// User record from database (raw from SQLite)
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    /// Chat platform account id
    pub user_id: i64,
    /// Display name
    pub username: Option<String>,
    /// Unix timestamp of first contact
    pub joined_at: i64,
    /// Unix timestamp of last interaction
    pub last_active: i64,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            user_id: UserId(row.user_id),
            username: row.username,
            joined_at: from_unix(row.joined_at),
            last_active: from_unix(row.last_active),
        }
    }
}

/// Video record from database (raw from SQLite)
#[derive(Debug, Clone, FromRow)]
pub struct VideoRow {
    /// Unique database ID
    pub id: i64,
    /// Owner
    pub user_id: i64,
    /// Share link as submitted, trimmed
    pub original_url: String,
    /// Resolved stream URL
    pub processed_url: String,
    /// Unix timestamp when the record was created
    pub added_at: i64,
    /// Unix timestamp when the stream URL was last replaced
    pub updated_at: i64,
}

impl From<VideoRow> for VideoRecord {
    fn from(row: VideoRow) -> Self {
        VideoRecord {
            user_id: UserId(row.user_id),
            original_url: row.original_url,
            processed_url: row.processed_url,
            added_at: from_unix(row.added_at),
            updated_at: from_unix(row.updated_at),
        }
    }
}

/// Out-of-range values decode as the Unix epoch
fn from_unix(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap_or_else(|| {
        tracing::warn!(timestamp = secs, "stored timestamp out of range, using epoch");
        DateTime::<Utc>::default()
    })
}

/// Classify a failed write: schema constraint violations are kept apart
/// from every other query failure
fn write_error(action: &str, e: sqlx::Error) -> Error {
    let violation = e
        .as_database_error()
        .is_some_and(|db| !matches!(db.kind(), sqlx::error::ErrorKind::Other));
    let message = format!("Failed to {}: {}", action, e);

    if violation {
        Error::Database(DatabaseError::ConstraintViolation(message))
    } else {
        Error::Database(DatabaseError::QueryFailed(message))
    }
}

/// Database handle for terabox-player-bot
pub struct Database {
    pool: SqlitePool,
}
