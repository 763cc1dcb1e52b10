//! Core types for terabox-player-bot

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Chat platform account identifier
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl UserId {
    /// Create a new UserId
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the inner i64 value
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<UserId> for i64 {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for UserId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

impl sqlx::Type<sqlx::Sqlite> for UserId {
    fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
        <i64 as sqlx::Type<sqlx::Sqlite>>::type_info()
    }

    fn compatible(ty: &sqlx::sqlite::SqliteTypeInfo) -> bool {
        <i64 as sqlx::Type<sqlx::Sqlite>>::compatible(ty)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for UserId {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<sqlx::sqlite::SqliteArgumentValue<'q>>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        sqlx::Encode::<sqlx::Sqlite>::encode_by_ref(&self.0, buf)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for UserId {
    fn decode(value: sqlx::sqlite::SqliteValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let id = <i64 as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
        Ok(Self(id))
    }
}

/// A bot user as seen by the record store
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct User {
    /// Chat platform account id
    pub user_id: UserId,
    /// Display name, if the account has one
    pub username: Option<String>,
    /// First contact
    pub joined_at: DateTime<Utc>,
    /// Most recent interaction
    pub last_active: DateTime<Utc>,
}

/// Stored association between a user, a share link and its stream URL
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct VideoRecord {
    /// Owner of the record
    pub user_id: UserId,
    /// Share link as the user sent it, with surrounding whitespace trimmed
    pub original_url: String,
    /// Most recently resolved direct stream URL
    pub processed_url: String,
    /// When the record was first created
    pub added_at: DateTime<Utc>,
    /// When the stream URL was last replaced
    pub updated_at: DateTime<Utc>,
}

/// Aggregate counters for the admin statistics command
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Stats {
    /// Number of known users
    pub total_users: i64,
    /// Users active since UTC midnight
    pub active_today: i64,
    /// Number of stored video records
    pub total_videos: i64,
}

/// One inbound text message handed over by the chat transport
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InboundMessage {
    /// Sender
    pub user_id: UserId,
    /// Sender's display name
    pub username: Option<String>,
    /// Raw message text
    pub text: String,
}

impl InboundMessage {
    /// Create a new inbound message
    pub fn new(user_id: impl Into<UserId>, username: Option<String>, text: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            username,
            text: text.into(),
        }
    }
}
