//! Importer configuration.
//!
//! Supports TOML configuration files like:
//! ```toml
//! format = "alternate"
//! database = "bestiary.db"
//! extension = "txt"
//! ```

use crate::error::{BestiaryError, Result};
use crate::models::StatblockFormat;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_DATABASE: &str = "bestiary.db";
pub const DEFAULT_EXTENSION: &str = "txt";

/// Defaults for the importer; command-line flags take precedence.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ImporterConfig {
    pub format: StatblockFormat,
    pub database: PathBuf,
    pub extension: String,
}

impl Default for ImporterConfig {
    fn default() -> Self {
        Self {
            format: StatblockFormat::Native,
            database: PathBuf::from(DEFAULT_DATABASE),
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }
}

impl ImporterConfig {
    /// Load importer configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            BestiaryError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read importer config from {:?}: {}", path, e),
            ))
        })?;

        Self::from_str(&content)
    }

    /// Parse importer configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| {
            BestiaryError::Config(format!("Failed to parse importer config TOML: {}", e))
        })?;

        if config.extension.trim_start_matches('.').is_empty() {
            return Err(BestiaryError::Config("extension must not be empty".to_string()));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_importer_config() {
        let toml = r#"
format = "alternate"
database = "/tmp/monsters.db"
extension = "stat"
"#;

        let config = ImporterConfig::from_str(toml).unwrap();
        assert_eq!(config.format, StatblockFormat::Alternate);
        assert_eq!(config.database, PathBuf::from("/tmp/monsters.db"));
        assert_eq!(config.extension, "stat");
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config = ImporterConfig::from_str("").unwrap();
        assert_eq!(config, ImporterConfig::default());
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            ImporterConfig::from_str("format = \"yaml\""),
            Err(BestiaryError::Config(_))
        ));
        assert!(ImporterConfig::from_str("extension = \"\"").is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bestiary.toml");
        std::fs::write(&path, "extension = \"md\"\n").unwrap();
        let config = ImporterConfig::from_file(&path).unwrap();
        assert_eq!(config.extension, "md");
        assert!(ImporterConfig::from_file(&dir.path().join("missing.toml")).is_err());
    }
}
