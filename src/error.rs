//! Error types for terabox-player-bot
//!
//! This module provides error handling for the library, including:
//! - Domain-specific error types (Database, Resolve, Config)
//! - HTTP status code mapping for the mini app API
//! - Structured error responses with machine-readable error codes

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for terabox-player-bot operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for terabox-player-bot
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "BOT_TOKEN")
        key: Option<String>,
    },

    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stream resolution failed
    #[error("resolution error: {0}")]
    Resolve(#[from] ResolveError),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Requested record not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for a configuration error tied to a specific key
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }
}

/// Database-related errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to run migrations
    #[error("failed to run migrations: {0}")]
    MigrationFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// A write broke a schema constraint (CHECK, NOT NULL, UNIQUE)
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    /// Store call did not complete in time
    #[error("store operation timed out after {0:?}")]
    Timeout(Duration),
}

/// Failure to exchange a share link for a direct stream URL
///
/// Variants split into two subkinds: network-layer failures (the request
/// never produced a response) and application-layer failures (the API
/// answered, but not with a usable stream). See [`ResolveError::is_network`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The request exceeded the configured timeout
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Could not establish a connection (refused, DNS, TLS)
    #[error("connection failed: {0}")]
    Connect(String),

    /// Any other transport-level failure
    #[error("request failed: {0}")]
    Request(String),

    /// The API answered with a non-200 status
    #[error("API returned HTTP {0}")]
    Status(u16),

    /// The API answered 200 but reported `success: false`
    #[error("API reported failure: {0}")]
    Rejected(String),

    /// The body was not JSON or lacked a stream URL
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl ResolveError {
    /// Whether the failure happened before any HTTP response was received
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            ResolveError::Timeout(_) | ResolveError::Connect(_) | ResolveError::Request(_)
        )
    }

    /// Short machine-readable label, used as a structured log field
    pub fn kind(&self) -> &'static str {
        match self {
            ResolveError::Timeout(_) => "timeout",
            ResolveError::Connect(_) => "connect",
            ResolveError::Request(_) => "request",
            ResolveError::Status(_) => "http_status",
            ResolveError::Rejected(_) => "rejected",
            ResolveError::Malformed(_) => "malformed",
        }
    }
}

/// API error response format
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "not_found",
///     "message": "not found: user 42",
///     "details": {
///       "user_id": 42
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "not_found", "database_error")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create a "not found" error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new("not_found", format!("{} not found", resource.into()))
    }

    /// Create an "unauthorized" error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("unauthorized", message)
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            Error::Config { .. } => 400,

            Error::NotFound(_) => 404,

            Error::Database(DatabaseError::ConstraintViolation(_)) => 409,

            Error::Database(DatabaseError::Timeout(_)) => 503,

            Error::Database(_) => 500,
            Error::Io(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::Other(_) => 500,

            // External service errors
            Error::Resolve(_) => 502,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Database(DatabaseError::ConstraintViolation(_)) => "conflict",
            Error::Database(DatabaseError::Timeout(_)) => "store_timeout",
            Error::Database(_) => "database_error",
            Error::Io(_) => "io_error",
            Error::Resolve(_) => "resolution_error",
            Error::ApiServerError(_) => "api_server_error",
            Error::NotFound(_) => "not_found",
            Error::Other(_) => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        let details = match &error {
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({ "key": key })),
            Error::Resolve(e) => Some(serde_json::json!({ "kind": e.kind() })),
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}
