//! Configuration types for terabox-player-bot
//!
//! [`Config`] is built once at process start, validated, and then handed by
//! reference (or inside an `Arc`) to every component. Nothing reads process
//! environment after that point.

use crate::error::{Error, Result};
use crate::types::UserId;
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf, time::Duration};
use url::Url;

/// Chat bot settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BotConfig {
    /// Bot API token
    #[serde(default)]
    pub token: String,

    /// Accounts allowed to run `/stats`
    #[serde(default)]
    pub admin_ids: Vec<UserId>,

    /// Web app opened by the "Open Player" button
    #[serde(default = "default_mini_app_url")]
    pub mini_app_url: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            admin_ids: vec![],
            mini_app_url: default_mini_app_url(),
        }
    }
}

/// Resolution API and link acceptance settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Base URL of the resolution API; requests go to `{api_base}/process`
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Upper bound for one resolution request (default: 10s)
    #[serde(with = "duration_serde", default = "default_resolve_timeout")]
    pub timeout: Duration,

    /// Accepted link hosts, matched exactly against the link's authority
    ///
    /// No case folding and no implicit `www.` handling: every accepted
    /// spelling must be listed.
    #[serde(default = "default_allowed_hosts")]
    pub allowed_hosts: Vec<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            timeout: default_resolve_timeout(),
            allowed_hosts: default_allowed_hosts(),
        }
    }
}

/// Record store settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Database path (default: "terabox-bot.db")
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Upper bound for a single store call (default: 5s)
    #[serde(with = "duration_serde", default = "default_store_timeout")]
    pub store_timeout: Duration,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            store_timeout: default_store_timeout(),
        }
    }
}

/// API and external server integration configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ServerIntegrationConfig {
    /// Mini app REST API configuration
    #[serde(default)]
    pub api: ApiConfig,
}

/// Mini app REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Whether to serve the API at all (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Address to bind to (default: 127.0.0.1:8080)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Optional API key for authentication
    #[serde(default)]
    pub api_key: Option<String>,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: default_bind_address(),
            api_key: None,
            cors_origins: default_cors_origins(),
        }
    }
}

/// Main configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Chat bot settings
    #[serde(default)]
    pub bot: BotConfig,

    /// Resolution API settings
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Record store settings
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// REST API settings
    #[serde(default)]
    pub server: ServerIntegrationConfig,
}

impl Config {
    /// Build configuration from process environment variables
    ///
    /// Loading a `.env` file is left to the binary.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    ///
    /// Recognized keys: `BOT_TOKEN` (required), `ADMIN_IDS`, `MINI_APP_URL`,
    /// `API_BASE`, `API_TIMEOUT_SECS`, `ALLOWED_HOSTS`, `DATABASE_PATH`,
    /// `STORE_TIMEOUT_SECS`, `API_ENABLED`, `API_BIND_ADDRESS`, `API_KEY`,
    /// `CORS_ORIGINS`. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut config = Config::default();

        config.bot.token = get("BOT_TOKEN")
            .ok_or_else(|| Error::config("BOT_TOKEN", "missing required environment variable"))?;

        if let Some(raw) = get("ADMIN_IDS") {
            config.bot.admin_ids = parse_admin_ids(&raw)?;
        }
        if let Some(url) = get("MINI_APP_URL") {
            config.bot.mini_app_url = url;
        }

        if let Some(base) = get("API_BASE") {
            config.resolver.api_base = base;
        }
        if let Some(secs) = get("API_TIMEOUT_SECS") {
            config.resolver.timeout = parse_secs("API_TIMEOUT_SECS", &secs)?;
        }
        if let Some(hosts) = get("ALLOWED_HOSTS") {
            config.resolver.allowed_hosts = split_list(&hosts);
        }

        if let Some(path) = get("DATABASE_PATH") {
            config.persistence.database_path = PathBuf::from(path);
        }
        if let Some(secs) = get("STORE_TIMEOUT_SECS") {
            config.persistence.store_timeout = parse_secs("STORE_TIMEOUT_SECS", &secs)?;
        }

        if let Some(enabled) = get("API_ENABLED") {
            config.server.api.enabled = parse_bool("API_ENABLED", &enabled)?;
        }
        if let Some(addr) = get("API_BIND_ADDRESS") {
            config.server.api.bind_address = addr
                .trim()
                .parse()
                .map_err(|e| Error::config("API_BIND_ADDRESS", format!("invalid address: {e}")))?;
        }
        config.server.api.api_key = get("API_KEY");
        if let Some(origins) = get("CORS_ORIGINS") {
            config.server.api.cors_origins = split_list(&origins);
        }

        Ok(config)
    }

    /// Check invariants that the type system doesn't
    pub fn validate(&self) -> Result<()> {
        if self.bot.token.trim().is_empty() {
            return Err(Error::config("BOT_TOKEN", "bot token must not be empty"));
        }
        check_http_url("MINI_APP_URL", &self.bot.mini_app_url)?;
        check_http_url("API_BASE", &self.resolver.api_base)?;

        if self.resolver.allowed_hosts.is_empty() {
            return Err(Error::config(
                "ALLOWED_HOSTS",
                "at least one accepted link host is required",
            ));
        }
        if self.resolver.timeout.is_zero() {
            return Err(Error::config("API_TIMEOUT_SECS", "timeout must be non-zero"));
        }
        if self.persistence.store_timeout.is_zero() {
            return Err(Error::config(
                "STORE_TIMEOUT_SECS",
                "timeout must be non-zero",
            ));
        }
        Ok(())
    }

    /// Whether the account may use admin-only commands
    pub fn is_admin(&self, user_id: UserId) -> bool {
        self.bot.admin_ids.contains(&user_id)
    }
}

fn parse_admin_ids(raw: &str) -> Result<Vec<UserId>> {
    raw.split(',')
        .map(|part| {
            part.parse::<UserId>().map_err(|_| {
                Error::config(
                    "ADMIN_IDS",
                    "invalid ADMIN_IDS format, must be comma-separated integers",
                )
            })
        })
        .collect()
}

fn parse_secs(key: &str, raw: &str) -> Result<Duration> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| Error::config(key, format!("expected whole seconds, got {raw:?}")))
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::config(key, format!("expected a boolean, got {raw:?}"))),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn check_http_url(key: &str, raw: &str) -> Result<()> {
    let url = Url::parse(raw).map_err(|e| Error::config(key, format!("invalid URL: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(Error::config(key, format!("unsupported scheme {other:?}"))),
    }
}

// Default value functions
fn default_mini_app_url() -> String {
    "https://terabox-mini-app.onrender.com".to_string()
}

fn default_api_base() -> String {
    "https://opabhik.serv00.net".to_string()
}

fn default_resolve_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_allowed_hosts() -> Vec<String> {
    vec!["terabox.com".into(), "www.terabox.com".into()]
}

fn default_database_path() -> PathBuf {
    PathBuf::from("terabox-bot.db")
}

fn default_store_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_true() -> bool {
    true
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".into()]
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_minimal_environment_uses_defaults() {
        let config = Config::from_lookup(lookup(&[("BOT_TOKEN", "123:abc")])).unwrap();

        assert_eq!(config.bot.token, "123:abc");
        assert!(config.bot.admin_ids.is_empty());
        assert_eq!(config.resolver.timeout, Duration::from_secs(10));
        assert_eq!(
            config.resolver.allowed_hosts,
            vec!["terabox.com".to_string(), "www.terabox.com".to_string()]
        );
        assert_eq!(config.persistence.store_timeout, Duration::from_secs(5));
        assert!(config.server.api.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_token_is_a_config_error() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        match err {
            Error::Config { key, .. } => assert_eq!(key.as_deref(), Some("BOT_TOKEN")),
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn test_blank_token_counts_as_missing() {
        assert!(Config::from_lookup(lookup(&[("BOT_TOKEN", "   ")])).is_err());
    }

    #[test]
    fn test_admin_ids_are_parsed_from_comma_list() {
        let config = Config::from_lookup(lookup(&[
            ("BOT_TOKEN", "t"),
            ("ADMIN_IDS", "11, 22,33"),
        ]))
        .unwrap();

        assert_eq!(
            config.bot.admin_ids,
            vec![UserId(11), UserId(22), UserId(33)]
        );
        assert!(config.is_admin(UserId(22)));
        assert!(!config.is_admin(UserId(44)));
    }

    #[test]
    fn test_malformed_admin_ids_are_rejected() {
        let err = Config::from_lookup(lookup(&[("BOT_TOKEN", "t"), ("ADMIN_IDS", "11,abc")]))
            .unwrap_err();
        assert!(err.to_string().contains("comma-separated integers"));
    }

    #[test]
    fn test_overrides_are_applied() {
        let config = Config::from_lookup(lookup(&[
            ("BOT_TOKEN", "t"),
            ("API_BASE", "http://localhost:9000"),
            ("API_TIMEOUT_SECS", "3"),
            ("ALLOWED_HOSTS", "terabox.com, 1024terabox.com"),
            ("DATABASE_PATH", "/tmp/bot.db"),
            ("API_ENABLED", "false"),
            ("API_BIND_ADDRESS", "0.0.0.0:9999"),
            ("API_KEY", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.resolver.api_base, "http://localhost:9000");
        assert_eq!(config.resolver.timeout, Duration::from_secs(3));
        assert_eq!(
            config.resolver.allowed_hosts,
            vec!["terabox.com".to_string(), "1024terabox.com".to_string()]
        );
        assert_eq!(config.persistence.database_path, PathBuf::from("/tmp/bot.db"));
        assert!(!config.server.api.enabled);
        assert_eq!(config.server.api.bind_address.port(), 9999);
        assert_eq!(config.server.api.api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::from_lookup(lookup(&[("BOT_TOKEN", "t")])).unwrap();
        config.resolver.api_base = "ftp://example.com".into();
        assert!(config.validate().is_err());

        let mut config = Config::from_lookup(lookup(&[("BOT_TOKEN", "t")])).unwrap();
        config.resolver.allowed_hosts.clear();
        assert!(config.validate().is_err());

        let mut config = Config::from_lookup(lookup(&[("BOT_TOKEN", "t")])).unwrap();
        config.resolver.timeout = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_timeouts_serialize_as_seconds() {
        let config = Config::default();
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["resolver"]["timeout"], 10);

        let parsed: Config = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.resolver.timeout, Duration::from_secs(10));
    }
}
