//! Stream resolution
//!
//! Exchanges a share link for a directly playable stream URL. The
//! [`Resolver`] trait is the seam the intake pipeline depends on;
//! [`HttpResolver`] is the production implementation backed by the external
//! resolution API.

use crate::error::ResolveError;
use async_trait::async_trait;

mod client;

pub use client::HttpResolver;

/// Direct stream URL returned by a successful resolution
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamUrl(pub String);

impl StreamUrl {
    /// Borrow the URL
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Take ownership of the URL
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for StreamUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Turns a validated share link into a stream URL
///
/// Implementations must convert every failure into a [`ResolveError`] and
/// must not retry on their own; retry is the caller's decision.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Resolve `link`, whose share token is `identifier`
    async fn resolve(&self, link: &str, identifier: &str) -> Result<StreamUrl, ResolveError>;
}
