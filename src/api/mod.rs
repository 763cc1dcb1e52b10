//! REST API server module
//!
//! Read-only OpenAPI 3.1 surface used by the player mini app to list the
//! streams a user has stored through the bot.

use crate::db::Database;
use crate::{Config, Result};
use axum::{Router, http::HeaderValue, middleware, routing::get};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod error_response;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Create the API router with all route definitions
///
/// # Routes
///
/// All routes are mounted under `/api/v1`.
///
/// - `GET /health` - Health check
/// - `GET /users/:id/videos` - Stored streams of a user, newest first
/// - `GET /openapi.json` - OpenAPI specification
pub fn create_router(db: Arc<Database>, config: Arc<Config>) -> Router {
    let state = AppState::new(db, config.clone());

    let v1 = Router::new()
        .route("/health", get(routes::health_check))
        .route("/users/:id/videos", get(routes::list_user_videos))
        .route("/openapi.json", get(routes::openapi_spec))
        .with_state(state);

    // Request → Trace → CORS → Auth → Handler
    let v1 = if config.server.api.api_key.is_some() {
        v1.layer(middleware::from_fn_with_state(
            config.server.api.api_key.clone(),
            auth::require_api_key,
        ))
    } else {
        v1
    };

    Router::new()
        .nest("/api/v1", v1)
        .layer(build_cors_layer(&config.server.api.cors_origins))
        .layer(TraceLayer::new_for_http())
}

/// Build a CORS layer based on configured origins
///
/// `"*"` anywhere in the list, or an empty list, allows any origin.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Serve the API on the configured bind address until `shutdown` fires
///
/// In-flight requests are allowed to finish before this returns.
pub async fn start_api_server(
    db: Arc<Database>,
    config: Arc<Config>,
    shutdown: CancellationToken,
) -> Result<()> {
    let bind_address = config.server.api.bind_address;

    tracing::info!(address = %bind_address, "Starting API server");

    let app = create_router(db, config);

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    tracing::info!(
        address = %listener.local_addr().map_err(crate::error::Error::Io)?,
        "API server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
