//! User upsert and lookup.

use crate::error::DatabaseError;
use crate::types::{User, UserId};
use crate::{Error, Result};
use chrono::{DateTime, Utc};

use super::{Database, UserRow, write_error};

impl Database {
    /// Create the user on first contact, otherwise refresh name and activity
    ///
    /// `joined_at` is only written on insert.
    pub async fn touch_user(&self, user_id: UserId, username: Option<&str>) -> Result<()> {
        self.touch_user_at(user_id, username, Utc::now()).await
    }

    /// [`touch_user`](Self::touch_user) with an explicit clock
    pub async fn touch_user_at(
        &self,
        user_id: UserId,
        username: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let now = now.timestamp();

        sqlx::query(
            r#"
            INSERT INTO users (user_id, username, joined_at, last_active)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                username = excluded.username,
                last_active = excluded.last_active
            "#,
        )
        .bind(user_id)
        .bind(username)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error("upsert user", e))?;

        Ok(())
    }

    /// Look up a user by id
    pub async fn get_user(&self, user_id: UserId) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT user_id, username, joined_at, last_active
            FROM users WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to get user: {}",
                e
            )))
        })?;

        Ok(row.map(User::from))
    }

    /// Number of known users
    pub async fn count_users(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to count users: {}",
                    e
                )))
            })?;

        Ok(count)
    }

    /// Number of users whose last activity is at or after `since`
    pub async fn count_users_active_since(&self, since: DateTime<Utc>) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE last_active >= ?")
            .bind(since.timestamp())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to count active users: {}",
                    e
                )))
            })?;

        Ok(count)
    }
}
