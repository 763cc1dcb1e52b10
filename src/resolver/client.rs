//! HTTP client for the resolution API.
//!
//! Wire contract: `GET {api_base}/process?url=<link>` answering
//! `{"success": bool, "stream_url": string?, "error": string?}`.

use super::{Resolver, StreamUrl};
use crate::config::ResolverConfig;
use crate::error::{Error, ResolveError, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;

/// Resolver that calls the external resolution API over HTTP
#[derive(Clone, Debug)]
pub struct HttpResolver {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpResolver {
    /// Build a client for `config.api_base` bounded by `config.timeout`
    pub fn new(config: &ResolverConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: format!("{}/process", config.api_base.trim_end_matches('/')),
            timeout: config.timeout,
        })
    }

    /// Full URL requests are sent to (without the query string)
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn classify_send_error(&self, e: reqwest::Error) -> ResolveError {
        if e.is_timeout() {
            ResolveError::Timeout(self.timeout)
        } else if e.is_connect() {
            ResolveError::Connect(e.to_string())
        } else {
            ResolveError::Request(e.to_string())
        }
    }
}

#[async_trait]
impl Resolver for HttpResolver {
    async fn resolve(&self, link: &str, identifier: &str) -> std::result::Result<StreamUrl, ResolveError> {
        tracing::debug!(endpoint = %self.endpoint, identifier, "requesting stream resolution");

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("url", link)])
            .send()
            .await
            .map_err(|e| self.classify_send_error(e))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ResolveError::Status(status.as_u16()));
        }

        // A timeout can also fire while the body is still streaming in
        let body = response
            .bytes()
            .await
            .map_err(|e| self.classify_send_error(e))?;

        parse_body(&body)
    }
}

/// Interpret a 200 response body
pub(crate) fn parse_body(body: &[u8]) -> std::result::Result<StreamUrl, ResolveError> {
    let data: Value = serde_json::from_slice(body)
        .map_err(|e| ResolveError::Malformed(format!("body is not JSON: {}", e)))?;

    if !data.is_object() {
        return Err(ResolveError::Malformed("body is not a JSON object".into()));
    }

    if !is_truthy(data.get("success")) {
        let reason = data
            .get("error")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or("no error message")
            .to_string();
        return Err(ResolveError::Rejected(reason));
    }

    match data.get("stream_url").and_then(Value::as_str) {
        Some(url) if !url.trim().is_empty() => Ok(StreamUrl(url.to_string())),
        _ => Err(ResolveError::Malformed(
            "success response without stream_url".into(),
        )),
    }
}

/// Loose truthiness: `true`, non-zero numbers, non-empty strings and
/// containers
fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
    }
}
