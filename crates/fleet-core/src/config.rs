//! Configuration management for fleetops

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::types::Host;

/// Get the default configuration directory
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("fleetops")
}

/// Get the default configuration file path
pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.toml")
}

/// Top-level fleetops configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetConfig {
    /// Gateway connection settings
    pub gateway: GatewayConfig,

    /// Metrics API settings (health checks, installer)
    pub api: ApiConfig,

    /// Dispatch fan-out settings
    pub dispatch: DispatchConfig,

    /// Interactive session settings
    pub session: SessionLimits,

    /// The fleet inventory
    #[serde(rename = "hosts")]
    pub hosts: Vec<Host>,
}

/// Gateway connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Address of the fleet gateway
    pub address: String,

    /// Connect timeout in seconds
    #[serde(with = "secs")]
    pub connect_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:7200".to_string(),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Metrics API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the metrics API
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
        }
    }
}

/// Dispatch fan-out settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Overall deadline for a dispatch; hosts still pending at the
    /// deadline are reported as timed out
    #[serde(with = "secs")]
    pub timeout: Duration,

    /// Cap on simultaneous outbound invocations
    pub max_in_flight: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            max_in_flight: 50,
        }
    }
}

/// Bounds for interactive session buffers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionLimits {
    /// Recall history depth, oldest evicted first
    pub history_cap: usize,

    /// Scrollback ring capacity in normalized chunks
    pub scrollback_cap: usize,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            history_cap: 50,
            scrollback_cap: 4096,
        }
    }
}

/// Load configuration from a file
pub fn load_config(path: &Path) -> Result<FleetConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Invalid(format!("Failed to read config: {}", e)))?;

    let config: FleetConfig = toml::from_str(&content)?;
    tracing::debug!(path = %path.display(), hosts = config.hosts.len(), "config loaded");
    Ok(config)
}

/// Save configuration to a file
pub fn save_config(path: &Path, config: &FleetConfig) -> Result<(), ConfigError> {
    let content = toml::to_string_pretty(config)?;

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| ConfigError::Invalid(format!("Failed to create config dir: {}", e)))?;
    }

    std::fs::write(path, content)
        .map_err(|e| ConfigError::Invalid(format!("Failed to write config: {}", e)))?;

    tracing::debug!(path = %path.display(), "config saved");
    Ok(())
}

// Helper module for Duration fields stored as whole seconds
mod secs {
    use serde::{self, Deserialize, Deserializer, Serializer};
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
