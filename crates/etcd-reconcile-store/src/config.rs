//! Connection settings for a remote store.
//!
//! # Load Order
//!
//! 1. Defaults (timeout of one second, no credentials)
//! 2. Environment variables (`ETCDV2_HOST`, `ETCDV2_USERNAME`,
//!    `ETCDV2_PASSWORD`, `ETCDV2_TIMEOUT`)
//! 3. Explicit values set through the builder methods
//!
//! Each layer overrides the previous. The resulting [`StoreConfig`] is handed
//! to whatever constructs a directory; nothing here is process-global.

use std::fmt;
use std::time::Duration;

use reqwest::Url;
use thiserror::Error;
use tracing::debug;

pub const ENV_HOST: &str = "ETCDV2_HOST";
pub const ENV_USERNAME: &str = "ETCDV2_USERNAME";
pub const ENV_PASSWORD: &str = "ETCDV2_PASSWORD";
pub const ENV_TIMEOUT: &str = "ETCDV2_TIMEOUT";

/// Per-request timeout used when none is configured.
pub const DEFAULT_TIMEOUT_SECS: i64 = 1;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no store endpoint configured: set it explicitly or via {ENV_HOST}")]
    MissingEndpoint,

    #[error("invalid store endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("timeout must be > 0 seconds, got {0}")]
    InvalidTimeout(i64),

    #[error("invalid value for environment variable '{name}': {message}")]
    InvalidEnvVar { name: String, message: String },
}

impl ConfigError {
    pub fn invalid_env_var(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidEnvVar {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Unresolved connection configuration, as declared by the caller.
#[derive(Clone, Default)]
pub struct StoreConfig {
    pub endpoint: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout_secs: Option<i64>,
}

impl StoreConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Start from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let timeout_secs = match var(ENV_TIMEOUT) {
            Some(raw) => Some(
                raw.trim()
                    .parse::<i64>()
                    .map_err(|e| ConfigError::invalid_env_var(ENV_TIMEOUT, e.to_string()))?,
            ),
            None => None,
        };

        Ok(Self {
            endpoint: var(ENV_HOST),
            username: var(ENV_USERNAME),
            password: var(ENV_PASSWORD),
            timeout_secs,
        })
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    #[must_use]
    pub fn with_timeout_secs(mut self, secs: i64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Validate and produce the settings a client is built from.
    pub fn resolve(&self) -> Result<ConnectionSettings, ConfigError> {
        let raw = self
            .endpoint
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .ok_or(ConfigError::MissingEndpoint)?;

        let endpoint = Url::parse(raw).map_err(|e| ConfigError::InvalidEndpoint {
            endpoint: raw.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEndpoint {
                endpoint: raw.to_string(),
                reason: format!("unsupported scheme '{}'", endpoint.scheme()),
            });
        }

        let secs = self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if secs <= 0 {
            return Err(ConfigError::InvalidTimeout(secs));
        }

        // Both halves must be present for authentication to be used at all.
        let credentials = match (self.username.as_deref(), self.password.as_deref()) {
            (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => Some(Credentials {
                username: u.to_string(),
                password: p.to_string(),
            }),
            _ => None,
        };

        debug!(
            endpoint = %endpoint,
            username_set = credentials.is_some(),
            timeout_secs = secs,
            "Resolved store configuration"
        );

        Ok(ConnectionSettings {
            endpoint,
            credentials,
            timeout: Duration::from_secs(secs as u64),
        })
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("endpoint", &self.endpoint)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Validated connection settings.
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    pub endpoint: Url,
    pub credentials: Option<Credentials>,
    pub timeout: Duration,
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_env_layer() {
        let config = StoreConfig::from_lookup(env(&[
            (ENV_HOST, "http://etcd:2379"),
            (ENV_USERNAME, "root"),
            (ENV_PASSWORD, "secret"),
            (ENV_TIMEOUT, "5"),
        ]))
        .unwrap();

        let settings = config.resolve().unwrap();
        assert_eq!(settings.endpoint.as_str(), "http://etcd:2379/");
        assert_eq!(settings.timeout, Duration::from_secs(5));
        assert_eq!(
            settings.credentials,
            Some(Credentials {
                username: "root".into(),
                password: "secret".into()
            })
        );
    }

    #[test]
    fn test_explicit_overrides_env() {
        let settings = StoreConfig::from_lookup(env(&[(ENV_HOST, "http://from-env:2379")]))
            .unwrap()
            .with_endpoint("http://explicit:2379")
            .resolve()
            .unwrap();

        assert_eq!(settings.endpoint.host_str(), Some("explicit"));
    }

    #[test]
    fn test_default_timeout() {
        let settings = StoreConfig::new()
            .with_endpoint("http://localhost:2379")
            .resolve()
            .unwrap();
        assert_eq!(settings.timeout, Duration::from_secs(1));
        assert!(settings.credentials.is_none());
    }

    #[test]
    fn test_missing_endpoint() {
        let result = StoreConfig::new().resolve();
        assert!(matches!(result, Err(ConfigError::MissingEndpoint)));
    }

    #[test]
    fn test_non_positive_timeout() {
        let result = StoreConfig::new()
            .with_endpoint("http://localhost:2379")
            .with_timeout_secs(0)
            .resolve();
        assert!(matches!(result, Err(ConfigError::InvalidTimeout(0))));
    }

    #[test]
    fn test_bad_timeout_env_var() {
        let result = StoreConfig::from_lookup(env(&[(ENV_TIMEOUT, "soon")]));
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar { .. })));
    }

    #[test]
    fn test_username_without_password_disables_auth() {
        let mut config = StoreConfig::new().with_endpoint("http://localhost:2379");
        config.username = Some("root".into());

        assert!(config.resolve().unwrap().credentials.is_none());
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        let result = StoreConfig::new().with_endpoint("ftp://etcd").resolve();
        assert!(matches!(result, Err(ConfigError::InvalidEndpoint { .. })));
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = StoreConfig::new().with_credentials("root", "secret");
        assert!(!format!("{:?}", config).contains("secret"));
    }
}
