//! Application configuration.
//!
//! Values come from a TOML file (`<config_dir>/contas/config.toml` unless a path
//! is given) and are then overridden by environment variables:
//!
//! | Variable | Key |
//! |----------|-----|
//! | `CONTAS_BACKEND_URL` | `backend_url` |
//! | `CONTAS_ANON_KEY` | `anon_key` |
//! | `CONTAS_CONNECT_TIMEOUT_SECS` | `connect_timeout_secs` |
//! | `CONTAS_REQUEST_TIMEOUT_SECS` | `request_timeout_secs` |

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use contas_backend::{RestClientConfig, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_REQUEST_TIMEOUT_SECS};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ENV_BACKEND_URL: &str = "CONTAS_BACKEND_URL";
pub const ENV_ANON_KEY: &str = "CONTAS_ANON_KEY";
pub const ENV_CONNECT_TIMEOUT: &str = "CONTAS_CONNECT_TIMEOUT_SECS";
pub const ENV_REQUEST_TIMEOUT: &str = "CONTAS_REQUEST_TIMEOUT_SECS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },

    #[error("Missing required setting: {0}")]
    Missing(&'static str),
}

/// Connection settings for the hosted backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend_url: String,
    pub anon_key: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend_url: String::new(),
            anon_key: String::new(),
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl AppConfig {
    /// `<config_dir>/contas/config.toml`, when the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("contas").join("config.toml"))
    }

    /// Load from `path` (or the default location) and the process environment.
    ///
    /// An explicit `path` must exist; a missing default file is skipped.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, |key| std::env::var(key).ok())
    }

    /// Same as [`load`](Self::load) with a custom environment lookup.
    ///
    /// The merged result is validated before it is returned.
    pub fn load_with_env<F>(path: Option<&Path>, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(default) if default.exists() => Self::from_file(&default)?,
                _ => Self::default(),
            },
        };
        config.apply_env(env)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Override values with whatever `env` returns. Blank values are ignored.
    pub fn apply_env<F>(&mut self, env: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = lookup(ENV_BACKEND_URL) {
            self.backend_url = v;
        }
        if let Some(v) = lookup(ENV_ANON_KEY) {
            self.anon_key = v;
        }
        if let Some(v) = lookup(ENV_CONNECT_TIMEOUT) {
            self.connect_timeout_secs = parse_secs(ENV_CONNECT_TIMEOUT, &v)?;
        }
        if let Some(v) = lookup(ENV_REQUEST_TIMEOUT) {
            self.request_timeout_secs = parse_secs(ENV_REQUEST_TIMEOUT, &v)?;
        }
        Ok(())
    }

    /// Check that everything needed to reach the backend is present.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend_url.trim().is_empty() {
            return Err(ConfigError::Missing("backend_url"));
        }
        if !(self.backend_url.starts_with("https://") || self.backend_url.starts_with("http://")) {
            return Err(ConfigError::InvalidValue {
                key: "backend_url",
                reason: format!("expected an http(s) URL, got {:?}", self.backend_url),
            });
        }
        if self.anon_key.trim().is_empty() {
            return Err(ConfigError::Missing("anon_key"));
        }
        if self.connect_timeout_secs == 0 || self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "timeout",
                reason: "timeouts must be at least one second".to_string(),
            });
        }
        Ok(())
    }

    pub fn rest_client_config(&self) -> RestClientConfig {
        let mut config = RestClientConfig::new(self.backend_url.clone(), self.anon_key.clone());
        config.connect_timeout = Duration::from_secs(self.connect_timeout_secs);
        config.request_timeout = Duration::from_secs(self.request_timeout_secs);
        config
    }
}

fn parse_secs(key: &'static str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|e| ConfigError::InvalidValue {
            key,
            reason: format!("{value:?} is not a number of seconds ({e})"),
        })
}
