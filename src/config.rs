//! # Configuration Management Module
//!
//! Questo modulo gestisce tutta la configurazione dell'applicazione.
//!
//! ## Responsabilità:
//! - Definisce la struct `Config` con tutti i parametri di ottimizzazione
//! - Fornisce validazione robusta dei parametri di input
//! - Supporta caricamento/salvataggio configurazione da/verso file JSON
//! - Fornisce valori di default identici al comportamento storico del plugin
//!
//! ## Parametri di configurazione:
//! - `upload_root`: Directory radice degli upload (scansionata dallo sweep)
//! - `sweep_enabled`: Flag che abilita lo sweep periodico (default: false)
//! - `sweep_interval_secs`: Intervallo dello sweep (default: 86400 = giornaliero)
//! - `jpeg_max_quality`: Qualità massima jpegoptim (default: 80)
//! - `png_optimization_level`: Livello optipng `-oN` (0-7, default: 7)
//! - `png_quality_min` / `png_quality_max`: Range pngquant (default: 60-80)
//! - `png_speed`: Velocità pngquant (1-11, default: 1)
//! - `webp_quality`: Qualità del companion WebP (default: 90)
//! - `webp_max_height`: Altezza massima del companion (default: 1200)
//! - `tool_timeout_secs`: Timeout per ogni tool esterno (default: 120, 0 = nessuno)
//! - `tools_dir`: Directory con tool bundled (default: None = solo PATH)
//!
//! ## Esempio:
//! ```rust,ignore
//! let config = Config {
//!     upload_root: PathBuf::from("/srv/uploads"),
//!     sweep_enabled: true,
//!     ..Default::default()
//! };
//! config.validate()?;
//! ```

use crate::error::{OptimizeError, Result as OptimizeResult};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for upload optimization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the upload tree
    pub upload_root: PathBuf,
    /// Enables the periodic reconciliation sweep
    pub sweep_enabled: bool,
    /// Seconds between two sweeps
    pub sweep_interval_secs: u64,
    /// jpegoptim `--max` value (1-100)
    pub jpeg_max_quality: u8,
    /// optipng optimization level (0-7)
    pub png_optimization_level: u8,
    /// pngquant minimum quality (1-100)
    pub png_quality_min: u8,
    /// pngquant maximum quality (1-100)
    pub png_quality_max: u8,
    /// pngquant speed (1 = slowest/best, 11 = fastest)
    pub png_speed: u8,
    /// WebP companion quality (1-100)
    pub webp_quality: u8,
    /// Height ceiling for WebP companions; smaller sources are never upscaled
    pub webp_max_height: u32,
    /// Timeout for every external tool invocation, 0 disables it
    pub tool_timeout_secs: u64,
    /// Directory searched for bundled tools before PATH
    pub tools_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            upload_root: PathBuf::new(),
            sweep_enabled: false,
            sweep_interval_secs: 24 * 60 * 60,
            jpeg_max_quality: 80,
            png_optimization_level: 7,
            png_quality_min: 60,
            png_quality_max: 80,
            png_speed: 1,
            webp_quality: 90,
            webp_max_height: 1200,
            tool_timeout_secs: 120,
            tools_dir: None,
        }
    }
}

impl Config {
    /// Validate configuration parameters
    pub fn validate(&self) -> OptimizeResult<()> {
        let invalid = |msg: &str| Err(OptimizeError::Config(msg.to_string()));

        if !(1..=100).contains(&self.jpeg_max_quality) {
            return invalid("JPEG max quality must be between 1 and 100");
        }

        if self.png_optimization_level > 7 {
            return invalid("PNG optimization level must be between 0 and 7");
        }

        if !(1..=100).contains(&self.png_quality_min) || !(1..=100).contains(&self.png_quality_max) {
            return invalid("PNG quality range must be between 1 and 100");
        }

        if self.png_quality_min > self.png_quality_max {
            return invalid("PNG minimum quality must not exceed maximum quality");
        }

        if !(1..=11).contains(&self.png_speed) {
            return invalid("PNG speed must be between 1 and 11");
        }

        if !(1..=100).contains(&self.webp_quality) {
            return invalid("WebP quality must be between 1 and 100");
        }

        if self.webp_max_height == 0 {
            return invalid("WebP max height must be greater than 0");
        }

        if self.sweep_interval_secs == 0 {
            return invalid("Sweep interval must be greater than 0");
        }

        Ok(())
    }

    /// Timeout applied to external tools, `None` when disabled
    pub fn tool_timeout(&self) -> Option<Duration> {
        (self.tool_timeout_secs > 0).then(|| Duration::from_secs(self.tool_timeout_secs))
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Default location: `<config dir>/upload-optimizer/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("upload-optimizer").join("config.json"))
    }

    /// Load configuration from file
    pub async fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.jpeg_max_quality = 0;
        assert!(config.validate().is_err());

        config.jpeg_max_quality = 80;
        config.png_optimization_level = 8;
        assert!(config.validate().is_err());

        config.png_optimization_level = 7;
        config.png_quality_min = 90;
        assert!(config.validate().is_err());

        config.png_quality_min = 60;
        config.png_speed = 12;
        assert!(config.validate().is_err());

        config.png_speed = 1;
        config.webp_max_height = 0;
        assert!(matches!(config.validate(), Err(OptimizeError::Config(_))));
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(!config.sweep_enabled);
        assert_eq!(config.sweep_interval(), Duration::from_secs(86_400));
        assert_eq!(config.jpeg_max_quality, 80);
        assert_eq!(config.png_optimization_level, 7);
        assert_eq!((config.png_quality_min, config.png_quality_max), (60, 80));
        assert_eq!(config.png_speed, 1);
        assert_eq!(config.webp_quality, 90);
        assert_eq!(config.webp_max_height, 1200);
        assert_eq!(config.tool_timeout(), Some(Duration::from_secs(120)));
    }

    #[test]
    fn test_zero_timeout_disables_it() {
        let config = Config {
            tool_timeout_secs: 0,
            ..Default::default()
        };
        assert_eq!(config.tool_timeout(), None);
    }

    #[tokio::test]
    async fn test_config_save_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.json");

        let original_config = Config {
            upload_root: PathBuf::from("/srv/uploads"),
            sweep_enabled: true,
            webp_quality: 75,
            tools_dir: Some(PathBuf::from("/opt/tools")),
            ..Default::default()
        };

        original_config.save_to_file(&config_path).await.unwrap();
        let loaded_config = Config::from_file(&config_path).await.unwrap();

        assert_eq!(loaded_config, original_config);
    }

    #[tokio::test]
    async fn test_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        tokio::fs::write(&config_path, r#"{ "sweep_enabled": true }"#)
            .await
            .unwrap();

        let config = Config::from_file(&config_path).await.unwrap();
        assert!(config.sweep_enabled);
        assert_eq!(config.jpeg_max_quality, 80);
    }

    #[tokio::test]
    async fn test_missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::from_file(&temp_dir.path().join("absent.json"))
            .await
            .unwrap();
        assert_eq!(config, Config::default());
    }

    #[tokio::test]
    async fn test_invalid_file_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        tokio::fs::write(&config_path, r#"{ "webp_quality": 0 }"#)
            .await
            .unwrap();

        assert!(Config::from_file(&config_path).await.is_err());
    }
}
