//! Engine configuration and its JSON persistence.

use crate::engine::Indicator;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Default folder for processed tables.
pub const DEFAULT_OUTPUT_DIR: &str = "data/processed_stock_data";

/// Which indicators to compute and where processed tables go.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Indicators in run order
    pub indicators: Vec<Indicator>,
    /// Folder that receives processed tables
    pub output_dir: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            indicators: Indicator::defaults(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

impl EngineConfig {
    /// Load the configuration from the default path.
    ///
    /// Default path: `~/.pricelens/config.json`
    /// Can be overridden with `PRICELENS_CONFIG_FILE` environment variable.
    /// A missing file yields the built-in defaults.
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::default_path())
    }

    /// Get the default configuration file path.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var("PRICELENS_CONFIG_FILE") {
            return PathBuf::from(path);
        }

        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".pricelens/config.json"))
            .unwrap_or_else(|| PathBuf::from("pricelens.json"))
    }

    /// Load the configuration from a specific path.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;

        tracing::info!(
            path = %path.display(),
            indicators = config.indicators.len(),
            "loaded config"
        );
        Ok(config)
    }

    /// Save the configuration as pretty JSON, creating parent folders.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Reject empty indicator lists and invalid parameters.
    pub fn validate(&self) -> Result<()> {
        if self.indicators.is_empty() {
            return Err(Error::Config("no indicators configured".to_string()));
        }
        for indicator in &self.indicators {
            indicator.validate()?;
        }
        Ok(())
    }

    /// Path of the processed copy of `input` inside the output folder.
    ///
    /// The processed file keeps the input's file name.
    pub fn output_path_for(&self, input: &Path) -> Result<PathBuf> {
        let file_name = input.file_name().ok_or_else(|| {
            Error::Config(format!("input path has no file name: {}", input.display()))
        })?;
        Ok(self.output_dir.join(file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.indicators.len(), 6);
        assert_eq!(config.output_dir, PathBuf::from("data/processed_stock_data"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = EngineConfig::load_from_path(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_partial_json_overrides() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"indicators": [{"kind": "sma", "window": 50}, {"kind": "rsi"}]}"#,
        )
        .unwrap();

        let config = EngineConfig::load_from_path(&path).unwrap();
        assert_eq!(config.indicators, vec![Indicator::sma(50), Indicator::rsi(14)]);
        assert_eq!(config.output_dir, PathBuf::from(DEFAULT_OUTPUT_DIR));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"indicators": [{"kind": "bollinger", "window": 1}]}"#).unwrap();

        let result = EngineConfig::load_from_path(&path);
        assert!(matches!(result, Err(Error::InvalidParameter { .. })));
    }

    #[test]
    fn test_unknown_indicator_kind_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"indicators": [{"kind": "vwap"}]}"#).unwrap();

        assert!(matches!(
            EngineConfig::load_from_path(&path),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/config.json");
        let config = EngineConfig {
            indicators: vec![Indicator::macd(5, 35, 5)],
            output_dir: PathBuf::from("out"),
        };

        config.save(&path).unwrap();
        assert_eq!(EngineConfig::load_from_path(&path).unwrap(), config);
    }

    #[test]
    fn test_output_path_keeps_file_name() {
        let config = EngineConfig::default();
        let path = config
            .output_path_for(Path::new("stock_data/IOC.NS_2020-01-01_to_2025-02-24.csv"))
            .unwrap();
        assert_eq!(
            path,
            PathBuf::from("data/processed_stock_data/IOC.NS_2020-01-01_to_2025-02-24.csv")
        );
    }
}
