//! Runtime configuration.
//!
//! Values come from an optional YAML file (named by `CONFIG_FILE`) and are
//! then overridden by environment variables:
//!
//! | variable           | field               | default                 |
//! |--------------------|---------------------|-------------------------|
//! | `LISTEN`           | `server.listen_addr`| `127.0.0.1:3000`        |
//! | `BACKEND_URL`      | `backend.url`       | `http://localhost:5000` |
//! | `BODY_READ_POLICY` | `proxy.body_read`   | `best-effort`           |

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:5000";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("unknown body read policy {0:?} (expected \"best-effort\" or \"strict\")")]
    UnknownPolicy(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub backend: BackendConfig,
    pub proxy: ProxyConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
        }
    }
}

/// The origin every `/api/*` call is forwarded to.
///
/// Kept as a string: a malformed origin is not a startup error, it makes
/// every proxied call fail with the generic 500.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub url: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_BACKEND_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    pub body_read: BodyReadPolicy,
}

/// What to do when a POST/PUT body cannot be read as text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BodyReadPolicy {
    /// Forward the body with invalid UTF-8 replaced by U+FFFD.
    #[default]
    BestEffort,
    /// Fail the request with the generic 500.
    Strict,
}

impl FromStr for BodyReadPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "best-effort" | "best_effort" => Ok(BodyReadPolicy::BestEffort),
            "strict" => Ok(BodyReadPolicy::Strict),
            other => Err(ConfigError::UnknownPolicy(other.to_string())),
        }
    }
}

impl Config {
    /// Loads the process configuration: `CONFIG_FILE` if set, then env overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let base = match std::env::var("CONFIG_FILE") {
            Ok(path) if !path.is_empty() => Self::from_file(path)?,
            _ => Self::default(),
        };
        base.with_overrides(|key| std::env::var(key).ok())
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Applies environment-style overrides read through `lookup`.
    ///
    /// Empty values count as unset.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(addr) = get("LISTEN") {
            self.server.listen_addr = addr;
        }
        if let Some(url) = get("BACKEND_URL") {
            self.backend.url = url;
        }
        if let Some(policy) = get("BODY_READ_POLICY") {
            self.proxy.body_read = policy.parse()?;
        }
        Ok(self)
    }
}
