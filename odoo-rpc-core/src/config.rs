//! # Connection Configuration
//!
//! [`ConnectionConfig`] holds everything needed to reach and authenticate against a server.
//! It is built once, before any client exists, either in code, through `serde` from a
//! configuration document, or from `ODOO_*` environment variables.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Timeout applied when neither the document nor the environment sets one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Path of the JSON-RPC endpoint, relative to the base URL.
pub(crate) const JSONRPC_PATH: &str = "/jsonrpc";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required configuration value '{0}'")]
    Missing(&'static str),
}

/// Immutable connection parameters.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    url: String,
    #[serde(alias = "db")]
    database: String,
    username: String,
    #[serde(alias = "password")]
    secret: String,
    #[serde(default = "default_timeout", with = "duration_secs")]
    timeout: Duration,
    #[serde(default = "default_verify_tls", alias = "verify_ssl")]
    verify_tls: bool,
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

fn default_verify_tls() -> bool {
    true
}

impl ConnectionConfig {
    /// Creates a configuration with the default timeout and TLS verification enabled.
    pub fn new(
        url: impl Into<String>,
        database: impl Into<String>,
        username: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            database: database.into(),
            username: username.into(),
            secret: secret.into(),
            timeout: DEFAULT_TIMEOUT,
            verify_tls: true,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_tls_verification(mut self, verify_tls: bool) -> Self {
        self.verify_tls = verify_tls;
        self
    }

    /// Loads the configuration from the process environment.
    ///
    /// | Variable                      | Meaning                                     |
    /// |-------------------------------|---------------------------------------------|
    /// | `ODOO_URL`                    | server URL (required)                       |
    /// | `ODOO_DB` or `ODOO_DATABASE`  | database name (required)                    |
    /// | `ODOO_USERNAME`               | login (required)                            |
    /// | `ODOO_PASSWORD`               | password or API key (required)              |
    /// | `ODOO_TIMEOUT`                | seconds, defaults to 30 when absent/invalid |
    /// | `ODOO_VERIFY_SSL`             | `false`, `0` or `no` disable verification   |
    /// | `ODOO_NO_VERIFY_SSL`          | `true`, `1` or `yes` disable verification   |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| lookup(name).ok_or(ConfigError::Missing(name));

        let url = required("ODOO_URL")?;
        let database = lookup("ODOO_DB")
            .or_else(|| lookup("ODOO_DATABASE"))
            .ok_or(ConfigError::Missing("ODOO_DB"))?;
        let username = required("ODOO_USERNAME")?;
        let secret = required("ODOO_PASSWORD")?;

        let timeout = lookup("ODOO_TIMEOUT")
            .and_then(|value| value.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT);

        let verify_tls = lookup("ODOO_VERIFY_SSL")
            .map(|value| !matches!(value.trim().to_lowercase().as_str(), "false" | "0" | "no"))
            .unwrap_or(true);
        let skip_tls = lookup("ODOO_NO_VERIFY_SSL")
            .is_some_and(|value| matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "yes"));

        Ok(Self {
            url,
            database,
            username,
            secret,
            timeout,
            verify_tls: verify_tls && !skip_tls,
        })
    }

    /// The server URL with a scheme (defaults to `https://`) and without trailing slashes.
    pub fn base_url(&self) -> String {
        let url = self.url.trim().trim_end_matches('/');
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("https://{url}")
        }
    }

    /// Full URL of the JSON-RPC endpoint.
    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url(), JSONRPC_PATH)
    }

    /// Host part of the URL, used in log messages.
    pub fn host(&self) -> &str {
        let url = self.url.trim();
        let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
        without_scheme
            .split(['/', '?', '#'])
            .next()
            .unwrap_or(without_scheme)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn verify_tls(&self) -> bool {
        self.verify_tls
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("url", &self.url)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("verify_tls", &self.verify_tls)
            .finish()
    }
}

/// (De)serializes a [`Duration`] as a number of seconds.
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn base_url_adds_scheme_and_strips_trailing_slash() {
        let config = ConnectionConfig::new("example.com/", "db", "admin", "admin");
        assert_eq!(config.base_url(), "https://example.com");
        assert_eq!(config.endpoint(), "https://example.com/jsonrpc");

        let config = ConnectionConfig::new("http://localhost:8069", "db", "admin", "admin");
        assert_eq!(config.base_url(), "http://localhost:8069");
    }

    #[test]
    fn host_is_extracted_from_url() {
        let config = ConnectionConfig::new("https://erp.example.com:8069/web", "db", "u", "p");
        assert_eq!(config.host(), "erp.example.com:8069");
        let config = ConnectionConfig::new("erp.example.com", "db", "u", "p");
        assert_eq!(config.host(), "erp.example.com");
    }

    #[test]
    fn debug_redacts_secret() {
        let config = ConnectionConfig::new("example.com", "db", "admin", "hunter2");
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn deserializes_with_aliases_and_defaults() {
        let config: ConnectionConfig = serde_json::from_value(serde_json::json!({
            "url": "https://example.com",
            "db": "demo",
            "username": "admin",
            "password": "admin",
            "verify_ssl": false
        }))
        .unwrap();

        assert_eq!(config.database(), "demo");
        assert_eq!(config.secret(), "admin");
        assert_eq!(config.timeout(), DEFAULT_TIMEOUT);
        assert!(!config.verify_tls());
    }

    #[test]
    fn deserializes_timeout_in_seconds() {
        let config: ConnectionConfig = serde_json::from_value(serde_json::json!({
            "url": "https://example.com",
            "database": "demo",
            "username": "admin",
            "secret": "admin",
            "timeout": 60
        }))
        .unwrap();
        assert_eq!(config.timeout(), Duration::from_secs(60));
    }

    #[test]
    fn loads_from_environment_lookup() {
        let config = ConnectionConfig::from_lookup(lookup(&[
            ("ODOO_URL", "erp.example.com"),
            ("ODOO_DATABASE", "prod"),
            ("ODOO_USERNAME", "admin"),
            ("ODOO_PASSWORD", "secret"),
            ("ODOO_TIMEOUT", "not-a-number"),
            ("ODOO_VERIFY_SSL", "No"),
        ]))
        .unwrap();

        assert_eq!(config.database(), "prod");
        assert_eq!(config.timeout(), DEFAULT_TIMEOUT);
        assert!(!config.verify_tls());
    }

    #[test]
    fn no_verify_flag_disables_tls_verification() {
        let base = [
            ("ODOO_URL", "erp.example.com"),
            ("ODOO_DB", "prod"),
            ("ODOO_USERNAME", "admin"),
            ("ODOO_PASSWORD", "secret"),
        ];

        let mut vars = base.to_vec();
        vars.push(("ODOO_NO_VERIFY_SSL", "Yes"));
        assert!(!ConnectionConfig::from_lookup(lookup(&vars)).unwrap().verify_tls());

        let mut vars = base.to_vec();
        vars.push(("ODOO_NO_VERIFY_SSL", "false"));
        assert!(ConnectionConfig::from_lookup(lookup(&vars)).unwrap().verify_tls());
    }

    #[test]
    fn missing_environment_value_is_reported() {
        let err = ConnectionConfig::from_lookup(lookup(&[
            ("ODOO_URL", "erp.example.com"),
            ("ODOO_DB", "prod"),
            ("ODOO_USERNAME", "admin"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Missing("ODOO_PASSWORD")));
    }
}
