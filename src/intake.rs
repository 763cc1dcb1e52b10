//! Link intake pipeline
//!
//! One inbound message runs through validation, identifier extraction,
//! stream resolution and persistence, and always ends in exactly one
//! [`IntakeOutcome`]. Each step returns early on failure; nothing is carried
//! over to the next message.
//!
//! ```text
//! Received ─▶ Validated ─▶ IdentifierExtracted ─▶ Resolved ─▶ Persisted
//!    │            │                 │                 │           │
//!    └─invalid────┴─invalid         └─resolution      └─persist   └─success
//! ```

use crate::config::Config;
use crate::error::{Error, ResolveError};
use crate::link::{self, LinkValidator};
use crate::resolver::Resolver;
use crate::store::RecordStore;
use crate::types::InboundMessage;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

/// Reply for [`IntakeOutcome::Success`]
pub const REPLY_SUCCESS: &str = "✅ Video added successfully!\nClick the button below to watch:";
/// Reply for [`IntakeOutcome::InvalidUrl`]
pub const REPLY_INVALID_URL: &str = "❌ Please send a valid Terabox URL.";
/// Reply for [`IntakeOutcome::ResolutionFailed`]
pub const REPLY_RESOLUTION_FAILED: &str = "❌ Failed to process video URL.";
/// Reply for [`IntakeOutcome::PersistenceFailed`]
pub const REPLY_PERSISTENCE_FAILED: &str = "❌ Failed to save video.";
/// Reply for [`IntakeOutcome::InternalFault`]
pub const REPLY_INTERNAL_FAULT: &str = "Sorry, there was an error processing your URL.";

/// Terminal result of one intake
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IntakeOutcome {
    /// Link resolved and stored
    Success {
        /// Stored stream URL
        stream_url: String,
    },
    /// Link rejected by the validator or had no share token
    InvalidUrl,
    /// The resolution API could not produce a stream
    ResolutionFailed(ResolveError),
    /// The record store rejected or timed out on a write
    PersistenceFailed,
    /// Unexpected fault caught at the pipeline boundary
    InternalFault,
}

impl IntakeOutcome {
    /// User-facing reply text; never includes internal detail
    pub fn reply(&self) -> &'static str {
        match self {
            IntakeOutcome::Success { .. } => REPLY_SUCCESS,
            IntakeOutcome::InvalidUrl => REPLY_INVALID_URL,
            IntakeOutcome::ResolutionFailed(_) => REPLY_RESOLUTION_FAILED,
            IntakeOutcome::PersistenceFailed => REPLY_PERSISTENCE_FAILED,
            IntakeOutcome::InternalFault => REPLY_INTERNAL_FAULT,
        }
    }

    /// Short label for structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            IntakeOutcome::Success { .. } => "success",
            IntakeOutcome::InvalidUrl => "invalid_url",
            IntakeOutcome::ResolutionFailed(_) => "resolution_failed",
            IntakeOutcome::PersistenceFailed => "persistence_failed",
            IntakeOutcome::InternalFault => "internal_fault",
        }
    }

    /// Whether the link ended up stored
    pub fn is_success(&self) -> bool {
        matches!(self, IntakeOutcome::Success { .. })
    }
}

/// Sequences validation, resolution and persistence for inbound links
pub struct IntakePipeline<R, S> {
    validator: LinkValidator,
    resolver: R,
    store: S,
    store_timeout: Duration,
}

impl<R, S> IntakePipeline<R, S>
where
    R: Resolver,
    S: RecordStore,
{
    /// Create a pipeline
    pub fn new(validator: LinkValidator, resolver: R, store: S, store_timeout: Duration) -> Self {
        Self {
            validator,
            resolver,
            store,
            store_timeout,
        }
    }

    /// Create a pipeline with the allow-list and store timeout from `config`
    pub fn from_config(config: &Config, resolver: R, store: S) -> Self {
        Self::new(
            LinkValidator::new(config.resolver.allowed_hosts.iter().cloned()),
            resolver,
            store,
            config.persistence.store_timeout,
        )
    }

    /// The record store this pipeline writes to
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Process one inbound message to its terminal outcome
    ///
    /// Never panics and never returns an error: every failure, including a
    /// panic in a collaborator, is mapped to an outcome and logged.
    pub async fn handle(&self, message: &InboundMessage) -> IntakeOutcome {
        let outcome = match AssertUnwindSafe(self.run(message)).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(panic) => {
                let detail = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "non-string panic payload".to_string());
                tracing::error!(
                    user_id = %message.user_id,
                    link = %message.text,
                    panic = %detail,
                    "intake pipeline panicked"
                );
                IntakeOutcome::InternalFault
            }
        };

        tracing::debug!(user_id = %message.user_id, kind = outcome.kind(), "intake finished");
        outcome
    }

    async fn run(&self, message: &InboundMessage) -> IntakeOutcome {
        let user_id = message.user_id;
        let link = message.text.trim();

        if !self.validator.validate(link) {
            tracing::info!(user_id = %user_id, link, "rejected link: host or scheme not allowed");
            return IntakeOutcome::InvalidUrl;
        }

        let Some(identifier) = link::extract_id(link) else {
            tracing::info!(user_id = %user_id, link, "rejected link: no share identifier");
            return IntakeOutcome::InvalidUrl;
        };

        let stream_url = match self.resolver.resolve(link, identifier).await {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(
                    user_id = %user_id,
                    link,
                    identifier,
                    kind = e.kind(),
                    network = e.is_network(),
                    error = %e,
                    "stream resolution failed"
                );
                return IntakeOutcome::ResolutionFailed(e);
            }
        };

        if let Err(e) = self
            .bounded("touch_user", self.store.touch_user(user_id, message.username.as_deref()))
            .await
        {
            tracing::error!(user_id = %user_id, link, error = %e, "failed to record user");
            return IntakeOutcome::PersistenceFailed;
        }

        if let Err(e) = self
            .bounded(
                "upsert_video",
                self.store.upsert_video(user_id, link, stream_url.as_str()),
            )
            .await
        {
            tracing::error!(user_id = %user_id, link, error = %e, "failed to save video");
            return IntakeOutcome::PersistenceFailed;
        }

        tracing::info!(user_id = %user_id, link, identifier, "URL added");
        IntakeOutcome::Success {
            stream_url: stream_url.into_inner(),
        }
    }

    /// Apply the store timeout to one store call
    async fn bounded<F>(&self, op: &'static str, fut: F) -> crate::Result<()>
    where
        F: std::future::Future<Output = crate::Result<()>>,
    {
        match tokio::time::timeout(self.store_timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(op, timeout = ?self.store_timeout, "store call timed out");
                Err(Error::Database(crate::error::DatabaseError::Timeout(
                    self.store_timeout,
                )))
            }
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
