//! Run configuration loaded from `<root>/relay.yaml`.
//!
//! Every field has a default, so a missing file or a partial file is valid.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::layout::Layout;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Retention bound per task: at most this many archives are kept.
    pub max_builds: usize,
    pub aria2: Aria2Config,
    pub download: DownloadConfig,
    pub build: BuildConfig,
    pub tools: ToolsConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote: Option<RemoteConfig>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            max_builds: 3,
            aria2: Aria2Config::default(),
            download: DownloadConfig::default(),
            build: BuildConfig::default(),
            tools: ToolsConfig::default(),
            remote: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Aria2Config {
    pub host: String,
    pub port: u16,
    pub secret: String,
    /// Launch a local `aria2c --enable-rpc` for the lifetime of the batch.
    pub spawn: bool,
    pub binary: String,
}

impl Default for Aria2Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6800,
            secret: String::new(),
            spawn: false,
            binary: "aria2c".to_string(),
        }
    }
}

impl Aria2Config {
    pub fn endpoint(&self) -> String {
        format!("http://{}:{}/jsonrpc", self.host, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    pub poll_interval_ms: u64,
    /// Extra wait inserted while the daemon reports `waiting`.
    pub waiting_backoff_ms: u64,
    /// Upper bound on a single download; `0` disables the bound.
    pub timeout_secs: u64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
            waiting_backoff_ms: 1000,
            timeout_secs: 2 * 60 * 60,
        }
    }
}

impl DownloadConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn waiting_backoff(&self) -> Duration {
        Duration::from_millis(self.waiting_backoff_ms)
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    pub script_timeout_secs: u64,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            script_timeout_secs: 600,
        }
    }
}

impl BuildConfig {
    pub fn script_timeout(&self) -> Duration {
        Duration::from_secs(self.script_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub seven_zip: String,
    pub rclone: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            seven_zip: "7z".to_string(),
            rclone: "rclone".to_string(),
        }
    }
}

/// rclone destination: `<remote>:<path>/<category>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub remote: String,
    #[serde(default)]
    pub path: String,
}

/// Load `<root>/relay.yaml`, falling back to defaults when it is absent.
pub fn load(layout: &Layout) -> Result<RelayConfig, ConfigError> {
    let path = layout.config_path();
    if !path.exists() {
        return Ok(RelayConfig::default());
    }
    let contents = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    if contents.trim().is_empty() {
        return Ok(RelayConfig::default());
    }
    let config: RelayConfig =
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse { path: path.clone(), source })?;
    if config.max_builds < 1 {
        return Err(ConfigError::Invalid {
            path,
            message: format!("max_builds must be at least 1, got {}", config.max_builds),
        });
    }
    Ok(config)
}

/// Write `config` to `<root>/relay.yaml` unless a file is already present.
///
/// Returns `true` when a file was written.
pub fn write_default(layout: &Layout, config: &RelayConfig) -> Result<bool, ConfigError> {
    let path = layout.config_path();
    if path.exists() {
        return Ok(false);
    }
    let yaml = serde_yaml::to_string(config)?;
    std::fs::write(&path, yaml).map_err(|source| ConfigError::Io { path, source })?;
    Ok(true)
}
