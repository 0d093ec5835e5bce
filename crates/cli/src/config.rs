//! Command line configuration management

use anyhow::{Context, Result, anyhow};
use common::{LOG_LEVELS, is_valid_level};
use protocol::MAX_TEMPERATURE_LEVEL;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeatConfig {
    pub general: GeneralSettings,
    #[serde(default)]
    pub usb: UsbSettings,
    #[serde(default)]
    pub treatment: TreatmentSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralSettings {
    pub log_level: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsbSettings {
    /// Enable libusb's own debug output
    #[serde(default)]
    pub libusb_debug: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreatmentSettings {
    /// Temperature level used when only a time level is given (0-3)
    #[serde(default = "TreatmentSettings::default_temperature")]
    pub default_temperature: u8,
}

impl Default for TreatmentSettings {
    fn default() -> Self {
        Self {
            default_temperature: Self::default_temperature(),
        }
    }
}

impl TreatmentSettings {
    fn default_temperature() -> u8 {
        1
    }
}

impl Default for HeatConfig {
    fn default() -> Self {
        Self {
            general: GeneralSettings {
                log_level: "info".to_string(),
            },
            usb: UsbSettings::default(),
            treatment: TreatmentSettings::default(),
        }
    }
}

impl HeatConfig {
    /// Load configuration from file
    ///
    /// Without an explicit path, the default path and then
    /// `/etc/rust-heat-usb/config.toml` are tried.
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = if let Some(p) = path {
            p
        } else {
            let candidates = vec![
                Self::default_path(),
                PathBuf::from("/etc/rust-heat-usb/config.toml"),
            ];

            candidates
                .into_iter()
                .find(|p| p.exists())
                .ok_or_else(|| anyhow!("No configuration file found, using defaults"))?
        };

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: HeatConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

        config.validate()?;

        tracing::info!("Loaded configuration from: {}", config_path.display());
        Ok(config)
    }

    /// Load configuration or return defaults if not found
    pub fn load_or_default() -> Self {
        match Self::load(None) {
            Ok(config) => config,
            Err(e) => {
                tracing::debug!("Failed to load config: {}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Save configuration to the specified path
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::info!("Saved configuration to: {}", path.display());
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> PathBuf {
        if let Some(config_dir) = dirs::config_dir() {
            config_dir.join("rust-heat-usb").join("config.toml")
        } else {
            PathBuf::from(".config/rust-heat-usb/config.toml")
        }
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if !is_valid_level(&self.general.log_level) {
            return Err(anyhow!(
                "Invalid log level '{}', must be one of: {}",
                self.general.log_level,
                LOG_LEVELS.join(", ")
            ));
        }

        if self.treatment.default_temperature > MAX_TEMPERATURE_LEVEL {
            return Err(anyhow!(
                "Invalid default_temperature {}, must be at most {}",
                self.treatment.default_temperature,
                MAX_TEMPERATURE_LEVEL
            ));
        }

        Ok(())
    }
}

/// Expand a leading `~` in a user-supplied path
pub fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}
