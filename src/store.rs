//! Record store seam used by the intake pipeline

use crate::Result;
use crate::db::Database;
use crate::types::UserId;
use async_trait::async_trait;

/// Write side of the record store as the intake pipeline sees it
///
/// Both operations are idempotent upserts with last-write-wins on mutable
/// fields. Any `Err` means nothing can be assumed about what was written.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Create the user or refresh their name and last-active time
    async fn touch_user(&self, user_id: UserId, username: Option<&str>) -> Result<()>;

    /// Create or replace the stream URL for `(user_id, original_url)`
    async fn upsert_video(
        &self,
        user_id: UserId,
        original_url: &str,
        stream_url: &str,
    ) -> Result<()>;
}

#[async_trait]
impl RecordStore for Database {
    async fn touch_user(&self, user_id: UserId, username: Option<&str>) -> Result<()> {
        Database::touch_user(self, user_id, username).await
    }

    async fn upsert_video(
        &self,
        user_id: UserId,
        original_url: &str,
        stream_url: &str,
    ) -> Result<()> {
        Database::upsert_video(self, user_id, original_url, stream_url).await
    }
}

#[async_trait]
impl<T: RecordStore + ?Sized> RecordStore for std::sync::Arc<T> {
    async fn touch_user(&self, user_id: UserId, username: Option<&str>) -> Result<()> {
        (**self).touch_user(user_id, username).await
    }

    async fn upsert_video(
        &self,
        user_id: UserId,
        original_url: &str,
        stream_url: &str,
    ) -> Result<()> {
        (**self).upsert_video(user_id, original_url, stream_url).await
    }
}
