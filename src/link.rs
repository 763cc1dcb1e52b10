//! Share link acceptance and identifier extraction

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

#[allow(clippy::expect_used)]
static SHARE_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/s/([A-Za-z0-9_-]+)").expect("share id pattern is valid"));

/// Decides whether an inbound string is a link this bot accepts
///
/// The host check is deliberately narrow: the raw authority of the link
/// (everything between `://` and the first `/`, `?` or `#`) must equal one
/// of the configured hosts byte for byte. Ports, credentials, upper-case
/// spellings and `www.` variants are only accepted when listed.
#[derive(Clone, Debug)]
pub struct LinkValidator {
    allowed_hosts: Vec<String>,
}

impl LinkValidator {
    /// Create a validator for the given allow-list
    pub fn new(allowed_hosts: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            allowed_hosts: allowed_hosts.into_iter().map(Into::into).collect(),
        }
    }

    /// Hosts this validator accepts
    pub fn allowed_hosts(&self) -> &[String] {
        &self.allowed_hosts
    }

    /// Returns true when `candidate` is an http(s) link to an allowed host
    ///
    /// Never fails: anything that doesn't parse is simply rejected.
    pub fn validate(&self, candidate: &str) -> bool {
        let Ok(parsed) = Url::parse(candidate) else {
            return false;
        };
        if !matches!(parsed.scheme(), "http" | "https") {
            return false;
        }
        let Some(authority) = raw_authority(candidate) else {
            return false;
        };
        self.allowed_hosts.iter().any(|host| host == authority)
    }
}

/// Authority component exactly as written, without the url crate's
/// normalization (which lowercases hosts and drops default ports).
fn raw_authority(candidate: &str) -> Option<&str> {
    let (_, rest) = candidate.trim_start().split_once("://")?;
    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    Some(&rest[..end])
}

/// Extracts the share token from the first `/s/<token>` segment of a link
///
/// Returns `None` when there is no such segment.
pub fn extract_id(link: &str) -> Option<&str> {
    SHARE_ID_RE
        .captures(link)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}
