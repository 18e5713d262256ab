//! Configuration schema (schemata.toml)

use serde::{Deserialize, Serialize};

use crate::registry::DEFAULT_TAG_PREFIX;

/// Banner written ahead of multi-document output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BannerConfig {
    /// Emit the banner when dumping multiple documents
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Version of the schema model recorded in the banner
    #[serde(default = "default_model_version")]
    pub model_version: String,
}

impl Default for BannerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model_version: default_model_version(),
        }
    }
}

/// Rendering of timestamp fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimestampConfig {
    /// Fractional second digits written on output (1..=9)
    #[serde(default = "default_fraction_digits")]
    pub fraction_digits: u8,
}

impl Default for TimestampConfig {
    fn default() -> Self {
        Self {
            fraction_digits: default_fraction_digits(),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Prefix of every tag (`<prefix>.<ClassName>`)
    #[serde(default = "default_tag_prefix")]
    pub tag_prefix: String,

    /// Banner settings
    #[serde(default)]
    pub banner: BannerConfig,

    /// Timestamp settings
    #[serde(default)]
    pub timestamps: TimestampConfig,

    /// Directory the config was loaded from (for resolving relative paths)
    #[serde(skip)]
    pub project_root: std::path::PathBuf,
}

fn default_true() -> bool {
    true
}

fn default_model_version() -> String {
    "1".to_string()
}

fn default_fraction_digits() -> u8 {
    6
}

fn default_tag_prefix() -> String {
    DEFAULT_TAG_PREFIX.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tag_prefix: default_tag_prefix(),
            banner: BannerConfig::default(),
            timestamps: TimestampConfig::default(),
            project_root: std::env::current_dir().unwrap_or_default(),
        }
    }
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        let mut config = Self::from_toml(&contents)?;

        // Set project root to parent of config file
        if let Some(parent) = path.parent() {
            config.project_root = parent.to_path_buf();
        }

        Ok(config)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        config.check()?;
        Ok(config)
    }

    /// Save config to TOML file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        let toml = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, toml)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    fn check(&self) -> Result<(), ConfigError> {
        if !(1..=9).contains(&self.timestamps.fraction_digits) {
            return Err(ConfigError::ParseError(format!(
                "timestamps.fraction_digits must be between 1 and 9, got {}",
                self.timestamps.fraction_digits
            )));
        }

        if self.tag_prefix.is_empty() {
            return Err(ConfigError::ParseError("tag_prefix must not be empty".to_string()));
        }

        Ok(())
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.tag_prefix, "schemata");
        assert!(config.banner.enabled);
        assert_eq!(config.timestamps.fraction_digits, 6);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            tag_prefix = "Pyrocko"

            [banner]
            model_version = "3"
            "#,
        )
        .unwrap();

        assert_eq!(config.tag_prefix, "Pyrocko");
        assert!(config.banner.enabled);
        assert_eq!(config.banner.model_version, "3");
        assert_eq!(config.timestamps.fraction_digits, 6);
    }

    #[test]
    fn fraction_digits_out_of_range() {
        let err = Config::from_toml("[timestamps]\nfraction_digits = 12\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn config_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schemata.toml");

        let mut config = Config::default();
        config.timestamps.fraction_digits = 3;
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.timestamps.fraction_digits, 3);
        assert_eq!(loaded.project_root, dir.path());
    }
}
