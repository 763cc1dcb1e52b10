//! Read-side aggregation for the admin statistics report.

use crate::Result;
use crate::types::Stats;
use chrono::{DateTime, Utc};

use super::Database;

impl Database {
    /// Totals as of `now`; "active today" counts from the preceding UTC midnight
    pub async fn get_stats(&self, now: DateTime<Utc>) -> Result<Stats> {
        let total_users = self.count_users().await?;
        let active_today = self
            .count_users_active_since(crate::stats::utc_midnight(now))
            .await?;
        let total_videos = self.count_videos().await?;

        Ok(Stats {
            total_users,
            active_today,
            total_videos,
        })
    }
}
