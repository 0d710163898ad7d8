//! Command-line interface argument parsing.
//!
//! This module defines the CLI structure and parsing logic using gumdrop,
//! supporting different run modes and configuration overrides.

use gumdrop::Options;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::service::RunMode;

/// Configuration file name inside the program directory
pub const DEFAULT_CONFIG_FILE: &str = "hw2serial.json";
/// Interactive-mode log file name inside the program directory
pub const DEFAULT_LOG_FILE: &str = "hw2serial.log";

impl FromStr for RunMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "interactive" => Ok(RunMode::Interactive),
            "daemon" => Ok(RunMode::Daemon),
            other => Err(format!("unknown mode `{}` (expected interactive or daemon)", other)),
        }
    }
}

/// Log level for the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Convert LogLevel to an EnvFilter directive
    pub fn to_filter_string(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level `{}`", other)),
        }
    }
}

/// hw2serial: stream hardware sensor readings to a serial display
#[derive(Debug, Options)]
pub struct Cli {
    #[options(help = "print help message")]
    pub help: bool,

    #[options(help = "run mode: interactive or daemon", default = "interactive")]
    pub mode: RunMode,

    #[options(help = "path to configuration file (default: hw2serial.json next to the executable)")]
    pub config: Option<PathBuf>,

    #[options(help = "log level: trace, debug, info, warn, error", default = "info")]
    pub log_level: LogLevel,

    #[options(no_short, help = "log file used in interactive mode (default: hw2serial.log next to the executable)")]
    pub log_file: Option<PathBuf>,

    #[options(no_short, help = "emit logs as JSON")]
    pub json_logs: bool,

    #[options(help = "serial port (overrides config file)")]
    pub port: Option<String>,

    #[options(help = "baud rate (overrides config file)")]
    pub baud: Option<u32>,

    #[options(short = "r", help = "refresh period in seconds: 2, 1, 0.5, 0.2 or 0.1")]
    pub refresh: Option<f64>,

    #[options(no_short, help = "log lines instead of writing to the serial port")]
    pub no_serial: bool,

    #[options(no_short, help = "run a single poll cycle, print the line and exit")]
    pub once: bool,

    #[options(no_short, help = "list available serial ports and exit")]
    pub list_ports: bool,

    #[options(no_short, help = "list available sensor keys and exit")]
    pub list_sensors: bool,

    #[options(no_short, meta = "CODE", help = "with --list-sensors, only list this sensor type code (0-11)")]
    pub sensor_type: Option<u8>,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse_args_default_or_exit()
    }

    /// Configuration file: `--config` made absolute, else the default file in `program_dir`.
    ///
    /// Launch at startup runs with an arbitrary working directory, so the
    /// result never depends on it.
    pub fn config_path(&self, program_dir: &Path) -> PathBuf {
        resolve(self.config.as_deref(), program_dir, DEFAULT_CONFIG_FILE)
    }

    pub fn log_path(&self, program_dir: &Path) -> PathBuf {
        resolve(self.log_file.as_deref(), program_dir, DEFAULT_LOG_FILE)
    }
}

fn resolve(explicit: Option<&Path>, program_dir: &Path, default_name: &str) -> PathBuf {
    match explicit {
        Some(path) => std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf()),
        None => program_dir.join(default_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(LogLevel::Info.to_filter_string(), "info");
        assert_eq!(LogLevel::Debug.to_filter_string(), "debug");
        assert_eq!("ERROR".parse::<LogLevel>(), Ok(LogLevel::Error));
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_default_values() {
        let cli = Cli::parse_args_default::<&str>(&[]).unwrap();
        assert_eq!(cli.mode, RunMode::Interactive);
        assert_eq!(cli.config, None);
        assert_eq!(cli.log_level, LogLevel::Info);
        assert_eq!(cli.log_file, None);
        assert!(!cli.no_serial);
        assert_eq!(cli.port, None);
    }

    #[test]
    fn test_overrides() {
        let cli = Cli::parse_args_default(&[
            "--mode", "daemon", "--port", "COM4", "--baud", "115200", "-r", "0.5", "--no-serial",
        ])
        .unwrap();
        assert_eq!(cli.mode, RunMode::Daemon);
        assert_eq!(cli.port.as_deref(), Some("COM4"));
        assert_eq!(cli.baud, Some(115200));
        assert_eq!(cli.refresh, Some(0.5));
        assert!(cli.no_serial);
    }

    #[test]
    fn test_default_paths_follow_program_dir() {
        let program_dir = Path::new("/opt/hw2serial");
        let cli = Cli::parse_args_default::<&str>(&[]).unwrap();
        assert_eq!(cli.config_path(program_dir), program_dir.join("hw2serial.json"));
        assert_eq!(cli.log_path(program_dir), program_dir.join("hw2serial.log"));
    }

    #[test]
    fn test_explicit_config_made_absolute() {
        let cli = Cli::parse_args_default(&["--config", "conf/hw2serial.json"]).unwrap();
        let path = cli.config_path(Path::new("/opt/hw2serial"));
        assert!(path.is_absolute());
        assert!(path.ends_with("conf/hw2serial.json"));
        assert_eq!(
            path,
            std::env::current_dir().unwrap().join("conf/hw2serial.json")
        );
    }

    #[test]
    fn test_sensor_type_filter() {
        let cli = Cli::parse_args_default(&["--list-sensors", "--sensor-type", "4"]).unwrap();
        assert!(cli.list_sensors);
        assert_eq!(cli.sensor_type, Some(4));
    }

    #[test]
    fn test_unknown_mode_rejected() {
        assert!(Cli::parse_args_default(&["--mode", "gui"]).is_err());
    }
}
