//! Admin statistics report

use crate::config::Config;
use crate::db::Database;
use crate::types::{Stats, UserId};
use chrono::{DateTime, NaiveTime, Utc};

/// Reply sent when the counters cannot be read
pub const STATS_FAILED: &str = "Failed to get statistics.";

/// Start of the UTC day containing `now`
pub fn utc_midnight(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// Rendered admin statistics message
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatsReport {
    stats: Stats,
}

impl StatsReport {
    /// Wrap counters for rendering
    pub fn new(stats: Stats) -> Self {
        Self { stats }
    }

    /// HTML-formatted message body
    pub fn render(&self) -> String {
        format!(
            "📊 <b>Bot Statistics</b>\n\n\
             Total Users: <code>{}</code>\n\
             Active Today: <code>{}</code>\n\
             Total Videos: <code>{}</code>",
            self.stats.total_users, self.stats.active_today, self.stats.total_videos
        )
    }
}

/// Produce the `/stats` reply for `user_id`
///
/// Returns `None` for non-admins, who get no reply at all.
pub async fn stats_reply(
    db: &Database,
    config: &Config,
    user_id: UserId,
    now: DateTime<Utc>,
) -> Option<String> {
    if !config.is_admin(user_id) {
        tracing::debug!(user_id = %user_id, "ignoring stats request from non-admin");
        return None;
    }

    match db.get_stats(now).await {
        Ok(stats) => {
            tracing::info!(user_id = %user_id, ?stats, "stats requested");
            Some(StatsReport::new(stats).render())
        }
        Err(e) => {
            tracing::error!(user_id = %user_id, error = %e, "failed to read stats");
            Some(STATS_FAILED.to_string())
        }
    }
}
