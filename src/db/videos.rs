//! Video record upsert and listing.

use crate::error::DatabaseError;
use crate::types::{UserId, VideoRecord};
use crate::{Error, Result};
use chrono::{DateTime, Utc};

use super::{Database, VideoRow, write_error};

impl Database {
    /// Store the stream URL for `(user_id, original_url)`
    ///
    /// Creates the record on first submission. A resubmission replaces
    /// `processed_url` and `updated_at` in place; `added_at` is kept. The
    /// unique key makes this a single atomic statement, so concurrent calls
    /// never produce duplicates.
    pub async fn upsert_video(
        &self,
        user_id: UserId,
        original_url: &str,
        processed_url: &str,
    ) -> Result<()> {
        self.upsert_video_at(user_id, original_url, processed_url, Utc::now())
            .await
    }

    /// [`upsert_video`](Self::upsert_video) with an explicit clock
    pub async fn upsert_video_at(
        &self,
        user_id: UserId,
        original_url: &str,
        processed_url: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let now = now.timestamp();

        sqlx::query(
            r#"
            INSERT INTO videos (user_id, original_url, processed_url, added_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(user_id, original_url) DO UPDATE SET
                processed_url = excluded.processed_url,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(user_id)
        .bind(original_url)
        .bind(processed_url)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error("upsert video", e))?;

        Ok(())
    }

    /// Fetch the record for one `(user, link)` key
    pub async fn get_video(
        &self,
        user_id: UserId,
        original_url: &str,
    ) -> Result<Option<VideoRecord>> {
        let row = sqlx::query_as::<_, VideoRow>(
            r#"
            SELECT id, user_id, original_url, processed_url, added_at, updated_at
            FROM videos WHERE user_id = ? AND original_url = ?
            "#,
        )
        .bind(user_id)
        .bind(original_url)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to get video: {}",
                e
            )))
        })?;

        Ok(row.map(VideoRecord::from))
    }

    /// All records of a user, newest first
    pub async fn list_user_videos(&self, user_id: UserId) -> Result<Vec<VideoRecord>> {
        let rows = sqlx::query_as::<_, VideoRow>(
            r#"
            SELECT id, user_id, original_url, processed_url, added_at, updated_at
            FROM videos WHERE user_id = ?
            ORDER BY added_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to list user videos: {}",
                e
            )))
        })?;

        Ok(rows.into_iter().map(VideoRecord::from).collect())
    }

    /// Total number of stored records
    pub async fn count_videos(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM videos")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to count videos: {}",
                    e
                )))
            })?;

        Ok(count)
    }

    /// Number of records for one `(user, link)` key (0 or 1)
    pub async fn count_user_videos(&self, user_id: UserId, original_url: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM videos WHERE user_id = ? AND original_url = ?",
        )
        .bind(user_id)
        .bind(original_url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to count user videos: {}",
                e
            )))
        })?;

        Ok(count)
    }
}
