//! Application configuration management.
//!
//! This module handles loading, validating and saving the JSON configuration
//! document, with support for runtime overrides from CLI arguments.

use crate::error::{ConfigError, Result};
use crate::slots::SlotList;
use config::{Config, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Poll cadence, restricted to the periods offered in the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub enum RefreshPeriod {
    TwoSeconds,
    OneSecond,
    HalfSecond,
    FifthSecond,
    TenthSecond,
}

impl RefreshPeriod {
    pub const ALL: [RefreshPeriod; 5] = [
        RefreshPeriod::TwoSeconds,
        RefreshPeriod::OneSecond,
        RefreshPeriod::HalfSecond,
        RefreshPeriod::FifthSecond,
        RefreshPeriod::TenthSecond,
    ];

    pub fn as_duration(self) -> Duration {
        Duration::from_millis(self.millis())
    }

    pub fn seconds(self) -> f64 {
        self.millis() as f64 / 1000.0
    }

    fn millis(self) -> u64 {
        match self {
            RefreshPeriod::TwoSeconds => 2000,
            RefreshPeriod::OneSecond => 1000,
            RefreshPeriod::HalfSecond => 500,
            RefreshPeriod::FifthSecond => 200,
            RefreshPeriod::TenthSecond => 100,
        }
    }

    /// Next period in UI order, wrapping around
    pub fn next(self) -> Self {
        let i = Self::ALL.iter().position(|p| *p == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }
}

impl TryFrom<f64> for RefreshPeriod {
    type Error = String;

    fn try_from(seconds: f64) -> std::result::Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|p| (p.seconds() - seconds).abs() < 1e-9)
            .ok_or_else(|| format!("unsupported refresh period {}s (expected 2, 1, 0.5, 0.2 or 0.1)", seconds))
    }
}

impl From<RefreshPeriod> for f64 {
    fn from(period: RefreshPeriod) -> Self {
        period.seconds()
    }
}

impl fmt::Display for RefreshPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.seconds())
    }
}

/// Top-level application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_serial_port")]
    pub serial_port: String,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    #[serde(default = "default_refresh_period")]
    pub refresh_period: RefreshPeriod,
    #[serde(default = "default_true")]
    pub minimize_to_tray: bool,
    #[serde(default)]
    pub launch_at_startup: bool,
    #[serde(default)]
    pub admin_only: bool,
    #[serde(default = "default_write_timeout")]
    pub write_timeout_ms: u64,
    #[serde(default = "default_line_ending")]
    pub line_ending: String,
    pub slots: SlotList,
}

// Default value functions
fn default_serial_port() -> String {
    if cfg!(windows) {
        "COM3".to_string()
    } else {
        "/dev/ttyUSB0".to_string()
    }
}

fn default_baud_rate() -> u32 {
    9600
}

fn default_refresh_period() -> RefreshPeriod {
    RefreshPeriod::OneSecond
}

fn default_true() -> bool {
    true
}

fn default_write_timeout() -> u64 {
    1000
}

fn default_line_ending() -> String {
    "\n".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            serial_port: default_serial_port(),
            baud_rate: default_baud_rate(),
            refresh_period: default_refresh_period(),
            minimize_to_tray: true,
            launch_at_startup: false,
            admin_only: false,
            write_timeout_ms: default_write_timeout(),
            line_ending: default_line_ending(),
            slots: SlotList::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::ReadError(format!("{} does not exist", path.display())).into());
        }

        let config: AppConfig = Config::builder()
            .add_source(File::from(path).format(FileFormat::Json))
            .build()
            .map_err(|e| ConfigError::ParseError(e.to_string()))?
            .try_deserialize()
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration, falling back to defaults when the file is missing,
    /// malformed, lacks a slot list, or fails validation
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::from_file(path) {
            Ok(config) => {
                tracing::info!("Loaded configuration from {}", path.display());
                config
            }
            Err(e) => {
                tracing::warn!("Using default configuration: {}", e);
                Self::default()
            }
        }
    }

    /// Write the whole document as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut json = serde_json::to_string_pretty(self).map_err(ConfigError::from)?;
        json.push('\n');
        std::fs::write(path, json).map_err(ConfigError::from)?;
        tracing::info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.serial_port.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "serial_port".to_string(),
                message: "cannot be empty".to_string(),
            }
            .into());
        }

        if self.baud_rate == 0 {
            return Err(ConfigError::InvalidValue {
                field: "baud_rate".to_string(),
                message: "must be greater than 0".to_string(),
            }
            .into());
        }

        if self.write_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "write_timeout_ms".to_string(),
                message: "must be greater than 0".to_string(),
            }
            .into());
        }

        Ok(())
    }

    /// Apply CLI argument overrides to configuration
    pub fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) -> Result<()> {
        if let Some(port) = &cli.port {
            self.serial_port = port.clone();
        }

        if let Some(baud) = cli.baud {
            self.baud_rate = baud;
        }

        if let Some(seconds) = cli.refresh {
            self.refresh_period = RefreshPeriod::try_from(seconds).map_err(|message| {
                ConfigError::InvalidValue {
                    field: "refresh".to_string(),
                    message,
                }
            })?;
        }

        self.validate()
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.refresh_period, RefreshPeriod::OneSecond);
        assert!(config.minimize_to_tray);
        assert!(!config.launch_at_startup);
        assert_eq!(config.slots.len(), 6);
        assert_eq!(config.slots.get(0), Some("#Time"));
    }

    #[test]
    fn test_from_file_fills_missing_fields() {
        let file = write_temp(
            r##"{"serial_port": "COM7", "refresh_period": 0.5, "slots": ["#Time", "CPU Total Load"]}"##,
        );
        let config = AppConfig::from_file(file.path()).unwrap();

        assert_eq!(config.serial_port, "COM7");
        assert_eq!(config.refresh_period, RefreshPeriod::HalfSecond);
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.write_timeout_ms, 1000);
        assert_eq!(config.slots.len(), 2);
    }

    #[test]
    fn test_missing_slots_falls_back_to_defaults() {
        let file = write_temp(r#"{"serial_port": "COM7", "baud_rate": 115200}"#);
        assert!(AppConfig::from_file(file.path()).is_err());
        assert_eq!(AppConfig::load_or_default(file.path()), AppConfig::default());
    }

    #[test]
    fn test_malformed_json_falls_back_to_defaults() {
        let file = write_temp("{ not json");
        assert_eq!(AppConfig::load_or_default(file.path()), AppConfig::default());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        assert_eq!(AppConfig::load_or_default(&path), AppConfig::default());
    }

    #[test]
    fn test_unsupported_refresh_period_rejected() {
        let file = write_temp(r##"{"refresh_period": 3, "slots": ["#Time"]}"##);
        assert!(AppConfig::from_file(file.path()).is_err());
    }

    #[test]
    fn test_save_load_save_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.json");
        let second = dir.path().join("second.json");

        let mut config = AppConfig::default();
        config.serial_port = "COM9".to_string();
        config.refresh_period = RefreshPeriod::FifthSecond;
        config.slots.assign(3, "RAM Load").unwrap();
        config.save(&first).unwrap();

        let loaded = AppConfig::from_file(&first).unwrap();
        assert_eq!(loaded, config);
        loaded.save(&second).unwrap();

        assert_eq!(
            std::fs::read(&first).unwrap(),
            std::fs::read(&second).unwrap()
        );
    }

    #[test]
    fn test_validate_zero_baud() {
        let mut config = AppConfig::default();
        config.baud_rate = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_refresh_period_cycle() {
        let mut period = RefreshPeriod::TwoSeconds;
        for _ in 0..RefreshPeriod::ALL.len() {
            period = period.next();
        }
        assert_eq!(period, RefreshPeriod::TwoSeconds);
        assert_eq!(RefreshPeriod::FifthSecond.as_duration(), Duration::from_millis(200));
        assert_eq!(RefreshPeriod::try_from(2.0), Ok(RefreshPeriod::TwoSeconds));
    }
}
