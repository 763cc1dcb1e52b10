//! # terabox-player-bot
//!
//! Chat bot that turns Terabox share links into playable stream URLs and
//! remembers them per user for a companion player mini app.
//!
//! Each text message goes through the [`IntakePipeline`]: the link is checked
//! against an allow-list of hosts, its share token extracted, the external
//! resolution API asked for a stream URL, and the result upserted into the
//! SQLite record store. Exactly one reply is sent per message.
//!
//! ## Quick Start
//!
//! ```no_run
//! use terabox_player_bot::{Config, run};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     run(config).await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Chat transport
pub mod bot;
/// Configuration types
pub mod config;
/// Database persistence layer
pub mod db;
/// Error types
pub mod error;
/// Link intake pipeline
pub mod intake;
/// Link validation and share token extraction
pub mod link;
/// Stream resolution
pub mod resolver;
/// Admin statistics
pub mod stats;
/// Record store seam
pub mod store;
/// Core types
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use db::Database;
pub use error::{ApiError, DatabaseError, Error, ErrorDetail, ResolveError, Result, ToHttpStatus};
pub use intake::{IntakeOutcome, IntakePipeline};
pub use link::LinkValidator;
pub use resolver::{HttpResolver, Resolver, StreamUrl};
pub use store::RecordStore;
pub use types::{InboundMessage, Stats, User, UserId, VideoRecord};

use std::sync::Arc;
use teloxide::Bot;
use tokio_util::sync::CancellationToken;

/// Run the bot and, if enabled, the REST API until a termination signal
///
/// Validates `config`, opens the record store, and wires the resolver and
/// intake pipeline into the chat dispatcher. Both surfaces stop together,
/// letting in-flight work finish, and the database is closed last.
pub async fn run(config: Config) -> Result<()> {
    config.validate()?;
    let config = Arc::new(config);

    let db = Arc::new(Database::new(&config.persistence.database_path).await?);
    tracing::info!(path = %config.persistence.database_path.display(), "database ready");

    let resolver = HttpResolver::new(&config.resolver)?;
    tracing::info!(endpoint = %resolver.endpoint(), "resolver ready");

    let pipeline = Arc::new(IntakePipeline::from_config(&config, resolver, db.clone()));
    let ctx = Arc::new(bot::BotContext::new(config.clone(), db.clone(), pipeline)?);

    let shutdown = CancellationToken::new();

    let api_handle = config.server.api.enabled.then(|| {
        tokio::spawn(api::start_api_server(
            db.clone(),
            config.clone(),
            shutdown.clone(),
        ))
    });

    let signal_handle = tokio::spawn(run_with_shutdown(shutdown.clone()));

    bot::run_dispatcher(Bot::new(config.bot.token.clone()), ctx, shutdown.clone()).await;

    // The dispatcher can also end on its own; take the API down with it
    shutdown.cancel();
    signal_handle.abort();

    if let Some(handle) = api_handle {
        handle
            .await
            .map_err(|e| Error::ApiServerError(format!("API server task failed: {}", e)))??;
    }

    match Arc::try_unwrap(db) {
        Ok(db) => db.close().await,
        Err(_) => tracing::warn!("database still shared at shutdown, leaving pool to drop"),
    }

    tracing::info!("shutdown complete");
    Ok(())
}

/// Wait for a termination signal, then cancel `shutdown`
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
pub async fn run_with_shutdown(shutdown: CancellationToken) {
    tokio::select! {
        _ = wait_for_signal() => {
            tracing::info!("shutting down");
            shutdown.cancel();
        }
        _ = shutdown.cancelled() => {}
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration can fail in restricted environments (containers, tests)
    match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => tracing::info!("Received SIGTERM signal"),
                _ = sigint.recv() => tracing::info!("Received SIGINT signal (Ctrl+C)"),
            }
        }
        (Ok(mut sigterm), Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            sigterm.recv().await;
            tracing::info!("Received SIGTERM signal");
        }
        (Err(e), Ok(mut sigint)) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            sigint.recv().await;
            tracing::info!("Received SIGINT signal (Ctrl+C)");
        }
        (Err(e), Err(_)) => {
            tracing::error!(error = %e, "Could not register any signal handlers, using ctrl_c fallback");
            tokio::signal::ctrl_c().await.ok();
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl+C signal"),
        Err(e) => tracing::error!(error = %e, "Failed to listen for Ctrl+C signal"),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_shutdown_watcher_returns_when_already_cancelled() {
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        tokio::time::timeout(Duration::from_secs(1), run_with_shutdown(shutdown))
            .await
            .expect("watcher should return once the token is cancelled");
    }

    #[tokio::test]
    async fn test_run_rejects_invalid_config_before_touching_anything() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.persistence.database_path = dir.path().join("never-created.db");

        let err = run(config).await.unwrap_err();

        assert!(matches!(err, Error::Config { .. }));
        assert!(!dir.path().join("never-created.db").exists());
    }
}
