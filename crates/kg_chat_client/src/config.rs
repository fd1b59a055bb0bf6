//! Backend configuration: the per-request resolver plus the optional
//! `~/.kg-chat/config.yaml` file that seeds its defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable holding the default backend base URL.
pub const BACKEND_URL_ENV: &str = "BACKEND_URL";
/// Environment variable holding the default endpoint path.
pub const BACKEND_PATH_ENV: &str = "BACKEND_PATH";
/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "KG_CHAT_CONFIG";

pub const DEFAULT_PATH: &str = "/";
pub const DEFAULT_HEALTH_TTL_SECS: u64 = 30;
pub const DEFAULT_HEALTH_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 60;

/// Effective backend location for one request.
///
/// An empty `base_url` means the backend is not configured.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BackendConfig {
    pub base_url: String,
    pub path: String,
}

impl BackendConfig {
    pub fn is_configured(&self) -> bool {
        !self.base_url.is_empty()
    }

    /// `base_url + path`. Only meaningful when configured.
    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, self.path)
    }
}

/// Resolve raw user input into a [`BackendConfig`].
///
/// The URL loses surrounding whitespace and trailing slashes. A blank path
/// becomes `/`, and a path missing its leading slash gets one. No URL
/// validation happens here; bad URLs fail later as transport errors.
pub fn resolve(base_url: &str, path: &str) -> BackendConfig {
    let base_url = base_url.trim().trim_end_matches('/').to_string();
    let path = path.trim();
    let path = if path.is_empty() {
        DEFAULT_PATH.to_string()
    } else if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    };
    BackendConfig { base_url, path }
}

/// Backend section (url, path).
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct BackendSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Health section (ttl_secs, query_param).
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct HealthSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl_secs: Option<u64>,
    /// Append `?health=1` to the health check URL.
    #[serde(default)]
    pub query_param: bool,
}

/// Timeouts section (health_secs, query_secs).
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct TimeoutsSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_secs: Option<u64>,
}

/// Full config file.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendSection,
    #[serde(default)]
    pub health: HealthSection,
    #[serde(default)]
    pub timeouts: TimeoutsSection,
}

impl Config {
    pub fn health_ttl(&self) -> Duration {
        Duration::from_secs(self.health.ttl_secs.unwrap_or(DEFAULT_HEALTH_TTL_SECS))
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_secs(
            self.timeouts
                .health_secs
                .unwrap_or(DEFAULT_HEALTH_TIMEOUT_SECS),
        )
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.timeouts.query_secs.unwrap_or(DEFAULT_QUERY_TIMEOUT_SECS))
    }
}

/// Pre-filled values for the URL and path inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Defaults {
    pub base_url: String,
    pub path: String,
}

impl Defaults {
    /// Environment first, then the config file, then built-ins.
    pub fn from_env_and_config(config: &Config) -> Self {
        Self::from_lookup(config, |key| std::env::var(key).ok())
    }

    /// Same as [`Defaults::from_env_and_config`] with an injectable lookup.
    pub fn from_lookup<F>(config: &Config, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |v: String| {
            let t = v.trim().to_string();
            (!t.is_empty()).then_some(t)
        };
        let base_url = lookup(BACKEND_URL_ENV)
            .and_then(non_blank)
            .or_else(|| config.backend.url.clone().and_then(non_blank))
            .unwrap_or_default();
        let path = lookup(BACKEND_PATH_ENV)
            .and_then(non_blank)
            .or_else(|| config.backend.path.clone().and_then(non_blank))
            .unwrap_or_else(|| DEFAULT_PATH.to_string());
        Self { base_url, path }
    }
}

/// Returns the default config file path: `~/.kg-chat/config.yaml` (platform-specific).
pub fn default_config_path() -> Option<PathBuf> {
    let home = home_dir()?;
    Some(home.join(".kg-chat").join("config.yaml"))
}

/// `--config` override, then `KG_CHAT_CONFIG`, then the default path.
pub fn resolve_config_path(override_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = override_path {
        return Some(p.to_path_buf());
    }
    if let Some(val) = std::env::var_os(CONFIG_PATH_ENV) {
        return Some(PathBuf::from(val));
    }
    default_config_path()
}

#[cfg(unix)]
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

#[cfg(windows)]
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("USERPROFILE").map(PathBuf::from)
}

#[cfg(not(any(unix, windows)))]
fn home_dir() -> Option<PathBuf> {
    None
}

/// Load config from a YAML file.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load config, treating a missing file as the default config.
pub fn load_or_default(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Ok(Config::default());
    }
    load(path)
}

/// Save config to a YAML file. Creates parent directory if missing.
pub fn save(path: &Path, config: &Config) -> Result<(), ConfigError> {
    let io_err = |source: std::io::Error| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
    }
    let contents = serde_yaml::to_string(config).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, contents).map_err(io_err)
}

/// Config load/save error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}
