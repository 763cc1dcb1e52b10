//! Application state for the API server

use crate::Config;
use crate::db::Database;
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// Cloned per request; both fields are `Arc`s shared with the bot.
#[derive(Clone)]
pub struct AppState {
    /// Record store shared with the intake pipeline
    pub db: Arc<Database>,

    /// Read-only process configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(db: Arc<Database>, config: Arc<Config>) -> Self {
        Self { db, config }
    }
}
