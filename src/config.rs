//! Runtime configuration: defaults, optional TOML file, environment overrides.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub fetch: FetchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Largest accepted request body, in bytes.
    pub max_body_bytes: usize,
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 5001,
            max_body_bytes: 65_536,
            request_timeout_secs: 30,
        }
    }
}

/// Settings for the outbound page fetch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_ms: u64,
    /// Redirect hops tolerated before a URL is judged unsafe.
    pub max_redirects: usize,
    /// Redirect hops followed to reach a page that is still content-scanned.
    pub content_max_redirects: usize,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5000,
            max_redirects: 5,
            content_max_redirects: 21,
            user_agent: concat!("phishguard/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

impl Config {
    /// Load from `path` when given, otherwise start from defaults; then apply
    /// environment overrides and validate.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: display,
            source,
        })
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |primary: &str, fallback: Option<&str>| {
            lookup(primary)
                .or_else(|| fallback.and_then(&lookup))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(raw) = var("PHISHGUARD_PORT", Some("PORT")) {
            match raw.parse::<u16>() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!(value = %raw, "ignoring unparseable port override"),
            }
        }

        if let Some(host) = var("PHISHGUARD_HOST", Some("HOST")) {
            self.server.host = host;
        }

        if let Some(raw) = var("PHISHGUARD_FETCH_TIMEOUT_MS", None) {
            match raw.parse::<u64>() {
                Ok(ms) if ms > 0 => self.fetch.timeout_ms = ms,
                _ => tracing::warn!(value = %raw, "ignoring invalid fetch timeout override"),
            }
        }

        if let Some(raw) = var("PHISHGUARD_MAX_REDIRECTS", None) {
            match raw.parse::<usize>() {
                Ok(hops) => self.fetch.max_redirects = hops,
                Err(_) => tracing::warn!(value = %raw, "ignoring invalid redirect cap override"),
            }
        }

        if let Some(raw) = var("PHISHGUARD_CONTENT_MAX_REDIRECTS", None) {
            match raw.parse::<usize>() {
                Ok(hops) => self.fetch.content_max_redirects = hops,
                Err(_) => {
                    tracing::warn!(value = %raw, "ignoring invalid content redirect cap override");
                }
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fetch.timeout_ms == 0 {
            return Err(ConfigError::Invalid("fetch.timeout_ms must be > 0".into()));
        }
        if self.server.max_body_bytes == 0 {
            return Err(ConfigError::Invalid(
                "server.max_body_bytes must be > 0".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_backend() {
        let config = Config::default();
        assert_eq!(config.server.port, 5001);
        assert_eq!(config.fetch.timeout_ms, 5000);
        assert_eq!(config.fetch.max_redirects, 5);
        assert_eq!(config.fetch.content_max_redirects, 21);
    }

    #[test]
    fn port_falls_back_to_plain_port_var() {
        let mut config = Config::default();
        config.apply_overrides_from(env(&[("PORT", "8080")]));
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn prefixed_var_wins_over_plain() {
        let mut config = Config::default();
        config.apply_overrides_from(env(&[("PORT", "8080"), ("PHISHGUARD_PORT", "9090")]));
        assert_eq!(config.server.port, 9090);
    }

    #[test]
    fn bad_values_keep_defaults() {
        let mut config = Config::default();
        config.apply_overrides_from(env(&[
            ("PORT", "not-a-port"),
            ("PHISHGUARD_FETCH_TIMEOUT_MS", "0"),
            ("PHISHGUARD_MAX_REDIRECTS", "-1"),
            ("HOST", "   "),
        ]));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn fetch_overrides_apply() {
        let mut config = Config::default();
        config.apply_overrides_from(env(&[
            ("PHISHGUARD_FETCH_TIMEOUT_MS", "1500"),
            ("PHISHGUARD_MAX_REDIRECTS", "2"),
            ("PHISHGUARD_CONTENT_MAX_REDIRECTS", "10"),
            ("PHISHGUARD_HOST", "0.0.0.0"),
        ]));
        assert_eq!(config.fetch.content_max_redirects, 10);
        assert_eq!(config.fetch.timeout_ms, 1500);
        assert_eq!(config.fetch.max_redirects, 2);
        assert_eq!(config.server.host, "0.0.0.0");
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[fetch]\ntimeout_ms = 2500").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.fetch.timeout_ms, 2500);
        assert_eq!(config.fetch.max_redirects, 5);
        assert_eq!(config.server, ServerConfig::default());
    }

    #[test]
    fn unreadable_file_is_an_error() {
        let err = Config::from_file(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn zero_timeout_fails_validation() {
        let mut config = Config::default();
        config.fetch.timeout_ms = 0;
        assert!(config.validate().is_err());
    }
}
