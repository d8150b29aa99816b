//! Configuration management.
//!
//! Supports configuration from:
//! - TOML config files
//! - Environment variables (`CTXGUARD_*`)
//! - CLI arguments (for the harness binary)
//!
//! The `[policy]` section carries the scoring thresholds and weights; see
//! [`ScoringPolicy`] for the defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{GuardError, Result};
use crate::security::ScoringPolicy;

/// Main configuration struct
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Engine configuration
    #[serde(default)]
    pub engine: EngineConfig,

    /// Scoring thresholds and weights
    #[serde(default)]
    pub policy: ScoringPolicy,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| GuardError::Config(format!("Failed to read config file: {e}")))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| GuardError::Config(format!("Failed to parse config: {e}")))?;
        config.policy.validate()?;

        tracing::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Overlay `CTXGUARD_*` environment variables onto this config
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("CTXGUARD_MAX_CONTENT_CHARS") {
            if let Ok(val) = val.parse() {
                self.engine.max_content_chars = Some(val);
            }
        }
        if let Ok(val) = std::env::var("CTXGUARD_REJECT_THRESHOLD") {
            if let Ok(val) = val.parse() {
                self.policy.reject_threshold = val;
            }
        }
        if let Ok(val) = std::env::var("CTXGUARD_DISCARD_FLOOR") {
            if let Ok(val) = val.parse() {
                self.policy.discard_floor = val;
            }
        }

        self
    }

    /// Default config file location (`<config dir>/ctxguard/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("ctxguard").join("config.toml"))
    }

    /// Load from `path`, else the default location if it exists, else
    /// defaults; environment overrides apply last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => Self::from_file(path)?,
                None => Self::default(),
            },
        };

        let config = config.with_env_overrides();
        config.policy.validate()?;
        Ok(config)
    }

    /// Serialize to TOML
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Scan at most this many leading characters of each content item
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_content_chars: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.engine.max_content_chars, None);
        assert_eq!(config.policy, ScoringPolicy::default());
    }

    #[test]
    fn test_config_from_toml() {
        let toml = r#"
            [engine]
            max_content_chars = 65536

            [policy]
            version = "1-strict"
            reject_threshold = 0.75
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.engine.max_content_chars, Some(65536));
        assert_eq!(config.policy.version, "1-strict");
        assert_eq!(config.policy.reject_threshold, 0.75);
        assert_eq!(config.policy.natural_language_multiplier, 0.5);
    }

    #[test]
    fn test_from_file_rejects_bad_policy() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[policy]\nhigh_threshold = 2.0").unwrap();

        let err = Config::from_file(file.path()).unwrap_err();
        assert!(matches!(err, GuardError::Config(_)));
    }

    #[test]
    fn test_from_file_roundtrip() {
        let config = Config {
            engine: EngineConfig {
                max_content_chars: Some(1024),
            },
            ..Default::default()
        };
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", config.to_toml().unwrap()).unwrap();

        assert_eq!(Config::from_file(file.path()).unwrap(), config);
    }

    #[test]
    fn test_missing_file() {
        assert!(Config::from_file("/nonexistent/ctxguard.toml").is_err());
    }
}
