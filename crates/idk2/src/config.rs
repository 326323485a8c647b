//! Plugin Configuration
//!
//! Read from `idk2.toml`:
//!
//! ```toml
//! [print]
//! overlay_gate = "print_to_screen"
//!
//! [http]
//! timeout_ms = 5000
//! user_agent = "idk2/0.1"
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, info};

use crate::print::PrintConfig;

/// Error type for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    TomlParseError(#[from] toml::de::Error),
}

/// Top-level configuration (idk2.toml)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Idk2Config {
    #[serde(default)]
    pub print: PrintConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

/// HTTP request settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout; unset waits indefinitely
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl HttpConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

impl Idk2Config {
    /// Load configuration from `path`. A missing file yields the defaults.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !fs::try_exists(path).await.unwrap_or(false) {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).await?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::print::OverlayGate;

    #[test]
    fn test_empty_config_is_default() {
        let config = Idk2Config::from_toml_str("").unwrap();
        assert_eq!(config, Idk2Config::default());
        assert_eq!(config.print.overlay_gate, OverlayGate::PrintToLog);
        assert_eq!(config.http.timeout(), None);
    }

    #[test]
    fn test_full_config() {
        let config = Idk2Config::from_toml_str(
            r#"
            [print]
            overlay_gate = "print_to_screen"

            [http]
            timeout_ms = 1500
            user_agent = "idk2-test"
            "#,
        )
        .unwrap();

        assert_eq!(config.print.overlay_gate, OverlayGate::PrintToScreen);
        assert_eq!(config.http.timeout(), Some(Duration::from_millis(1500)));
        assert_eq!(config.http.user_agent.as_deref(), Some("idk2-test"));
    }

    #[test]
    fn test_bad_gate_is_rejected() {
        let err = Idk2Config::from_toml_str("[print]\noverlay_gate = \"sometimes\"").unwrap_err();
        assert!(matches!(err, ConfigError::TomlParseError(_)));
    }

    #[tokio::test]
    async fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Idk2Config::load(dir.path().join("idk2.toml")).await.unwrap();
        assert_eq!(config, Idk2Config::default());
    }

    #[tokio::test]
    async fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("idk2.toml");
        std::fs::write(&path, "[http]\ntimeout_ms = 250\n").unwrap();

        let config = Idk2Config::load(&path).await.unwrap();
        assert_eq!(config.http.timeout_ms, Some(250));
    }
}
