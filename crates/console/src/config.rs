//! Console configuration, read from the environment.
//!
//! `dotenvy` is loaded by the binary before [`ConsoleConfig::from_env`] runs, so
//! a `.env` file next to the working directory behaves like exported variables.

use std::path::PathBuf;
use std::time::Duration;

use jinkops_client::{FileSessionStore, RestConfig};
use thiserror::Error;

pub const ENV_API_BASE_URL: &str = "JINKOPS_API_BASE_URL";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "JINKOPS_REQUEST_TIMEOUT_MS";
pub const ENV_BOOTSTRAP_TIMEOUT_MS: &str = "JINKOPS_BOOTSTRAP_TIMEOUT_MS";
pub const ENV_SESSION_FILE: &str = "JINKOPS_SESSION_FILE";
pub const ENV_COALESCE_BOOTSTRAP: &str = "JINKOPS_COALESCE_BOOTSTRAP";

const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api/";
const DEFAULT_TIMEOUT_MS: u64 = 15_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must not be empty")]
    Empty { var: &'static str },

    #[error("{var} must be a positive number of milliseconds, got '{value}'")]
    InvalidDuration { var: &'static str, value: String },

    #[error("{var} must be a boolean (true/false/1/0/yes/no), got '{value}'")]
    InvalidBool { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    pub api_base_url: String,
    pub request_timeout: Duration,
    pub bootstrap_timeout: Duration,
    pub session_file: PathBuf,
    pub coalesce_bootstrap: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            bootstrap_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            session_file: FileSessionStore::default_path(),
            coalesce_bootstrap: true,
        }
    }
}

impl ConsoleConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable source. Unset or blank variables fall
    /// back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        Ok(Self {
            api_base_url: get(ENV_API_BASE_URL).unwrap_or(defaults.api_base_url),
            request_timeout: match get(ENV_REQUEST_TIMEOUT_MS) {
                Some(raw) => parse_millis(ENV_REQUEST_TIMEOUT_MS, &raw)?,
                None => defaults.request_timeout,
            },
            bootstrap_timeout: match get(ENV_BOOTSTRAP_TIMEOUT_MS) {
                Some(raw) => parse_millis(ENV_BOOTSTRAP_TIMEOUT_MS, &raw)?,
                None => defaults.bootstrap_timeout,
            },
            session_file: get(ENV_SESSION_FILE)
                .map(PathBuf::from)
                .unwrap_or(defaults.session_file),
            coalesce_bootstrap: match get(ENV_COALESCE_BOOTSTRAP) {
                Some(raw) => parse_bool(ENV_COALESCE_BOOTSTRAP, &raw)?,
                None => defaults.coalesce_bootstrap,
            },
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::Empty {
                var: ENV_API_BASE_URL,
            });
        }
        if self.session_file.as_os_str().is_empty() {
            return Err(ConfigError::Empty {
                var: ENV_SESSION_FILE,
            });
        }
        Ok(())
    }

    pub fn rest_config(&self) -> RestConfig {
        RestConfig {
            base_url: self.api_base_url.clone(),
            request_timeout: self.request_timeout,
        }
    }
}

pub(crate) fn parse_millis(var: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    match raw.parse::<u64>() {
        Ok(ms) if ms > 0 => Ok(Duration::from_millis(ms)),
        _ => Err(ConfigError::InvalidDuration {
            var,
            value: raw.to_string(),
        }),
    }
}

pub(crate) fn parse_bool(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            var,
            value: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = ConsoleConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ConsoleConfig::default());
        assert_eq!(config.request_timeout, Duration::from_secs(15));
        assert!(config.coalesce_bootstrap);
    }

    #[test]
    fn variables_override_defaults() {
        let config = ConsoleConfig::from_lookup(lookup(&[
            (ENV_API_BASE_URL, "https://rbac.internal/api"),
            (ENV_REQUEST_TIMEOUT_MS, "2500"),
            (ENV_BOOTSTRAP_TIMEOUT_MS, " 900 "),
            (ENV_SESSION_FILE, "/tmp/s.json"),
            (ENV_COALESCE_BOOTSTRAP, "off"),
        ]))
        .unwrap();

        assert_eq!(config.api_base_url, "https://rbac.internal/api");
        assert_eq!(config.request_timeout, Duration::from_millis(2500));
        assert_eq!(config.bootstrap_timeout, Duration::from_millis(900));
        assert_eq!(config.session_file, PathBuf::from("/tmp/s.json"));
        assert!(!config.coalesce_bootstrap);
        assert_eq!(config.rest_config().request_timeout, Duration::from_millis(2500));
    }

    #[test]
    fn blank_values_fall_back() {
        let config = ConsoleConfig::from_lookup(lookup(&[(ENV_API_BASE_URL, "   ")])).unwrap();
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = ConsoleConfig::from_lookup(lookup(&[(ENV_REQUEST_TIMEOUT_MS, "soon")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidDuration {
                var: ENV_REQUEST_TIMEOUT_MS,
                value: "soon".into()
            }
        );

        let err = ConsoleConfig::from_lookup(lookup(&[(ENV_BOOTSTRAP_TIMEOUT_MS, "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDuration { .. }));

        let err = ConsoleConfig::from_lookup(lookup(&[(ENV_COALESCE_BOOTSTRAP, "maybe")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBool { .. }));
    }

    #[test]
    fn validate_catches_empty_overrides() {
        let config = ConsoleConfig {
            api_base_url: String::new(),
            ..ConsoleConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::Empty {
                var: ENV_API_BASE_URL
            })
        );
    }
}
