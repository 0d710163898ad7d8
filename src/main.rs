//! hw2serial: polls hardware sensors and streams the selected readings to a
//! serial-attached display as one space-separated ASCII line per cycle.
//!
//! Startup order:
//! 1. Parse the command line and set up logging.
//! 2. Load the JSON configuration (defaults on any problem) and apply overrides.
//! 3. Check privileges and sync the launch-at-startup entry.
//! 4. Run the interactive UI or the headless daemon loop until quit or signal.

use anyhow::{Context, Result};
use chrono::Local;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod error;
mod normalizer;
mod platform;
mod sensors;
mod service;
mod slots;
mod transmitter;
mod ui;

use cli::Cli;
use config::AppConfig;
use sensors::{SensorType, SysinfoSource};
use service::{MonitorService, RunMode};
use transmitter::{LoggingTransmitter, NoOpTransmitter, SerialTransmitter, Transmitter};

fn main() -> Result<()> {
    let cli = Cli::parse_args();
    let mode = effective_mode(&cli);
    let program_dir = platform::program_dir().unwrap_or_else(|_| PathBuf::from("."));
    init_logging(&cli, mode, &cli.log_path(&program_dir))?;

    if cli.list_ports {
        for port in transmitter::list_serial_ports()? {
            println!("{}", port);
        }
        return Ok(());
    }

    let config_path = cli.config_path(&program_dir);
    let mut config = AppConfig::load_or_default(&config_path);
    config
        .apply_cli_overrides(&cli)
        .context("Invalid command-line override")?;
    platform::ensure_privileges(config.admin_only)
        .context("Refusing to start without elevated privileges")?;

    let mut source = SysinfoSource::new();
    if cli.list_sensors {
        let filter = cli
            .sensor_type
            .map(SensorType::from_code)
            .transpose()
            .context("Invalid --sensor-type")?;
        let readings = sensors::filter_by_type(sensors::collect_readings(&mut source), filter);
        let table = normalizer::normalize(&readings, Local::now());
        for (key, entry) in table.iter() {
            println!("{:<40} {}", key, entry.display());
        }
        return Ok(());
    }

    let transmitter: Box<dyn Transmitter> = match (cli.no_serial, cli.once) {
        (true, true) => Box::new(NoOpTransmitter),
        (true, false) => Box::new(LoggingTransmitter),
        (false, _) => Box::new(SerialTransmitter),
    };
    let mut service = MonitorService::new(config, Box::new(source), transmitter);

    if cli.once {
        let report = service.poll_cycle();
        println!("{}", report.buffer.to_line());
        return Ok(());
    }

    let startup_command = platform::startup_command(&config_path).unwrap_or_else(|e| {
        tracing::warn!("{}", e);
        platform::format_startup_command(Path::new("hw2serial"), &config_path)
    });
    let mut registry = platform::default_registry();
    platform::sync_launch_at_startup(
        registry.as_mut(),
        service.config().launch_at_startup,
        &startup_command,
    );

    service::setup_signal_handler(service.get_stop_signal())
        .context("Failed to install signal handlers")?;

    match mode {
        RunMode::Interactive => ui::run_interactive(
            &mut service,
            registry.as_mut(),
            config_path,
            startup_command,
        )?,
        RunMode::Daemon => service.run_daemon()?,
    }

    Ok(())
}

/// Interactive mode needs a terminal; one-shot commands always behave like the daemon
fn effective_mode(cli: &Cli) -> RunMode {
    if cli.once || cli.list_ports || cli.list_sensors {
        return RunMode::Daemon;
    }
    if cli.mode == RunMode::Interactive && !atty::is(atty::Stream::Stdout) {
        return RunMode::Daemon;
    }
    cli.mode
}

/// Daemon logs go to stderr; the TUI owns the terminal, so interactive logs go to a file
fn init_logging(cli: &Cli, mode: RunMode, log_path: &Path) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level.to_filter_string()));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match mode {
        RunMode::Daemon => {
            let builder = builder.with_writer(std::io::stderr);
            if cli.json_logs {
                builder.json().init();
            } else {
                builder.init();
            }
        }
        RunMode::Interactive => {
            let file = open_log_file(log_path)?;
            let builder = builder.with_writer(Mutex::new(file)).with_ansi(false);
            if cli.json_logs {
                builder.json().init();
            } else {
                builder.init();
            }
        }
    }

    if cli.mode != mode && !(cli.once || cli.list_ports || cli.list_sensors) {
        tracing::warn!("stdout is not a terminal, running in daemon mode");
    }
    Ok(())
}

/// Append to `path`, or to `hw2serial.log` in the temp directory when that fails
fn open_log_file(path: &Path) -> Result<File> {
    let open = |p: &Path| OpenOptions::new().create(true).append(true).open(p);
    open(path).or_else(|first| {
        let fallback = std::env::temp_dir().join(cli::DEFAULT_LOG_FILE);
        open(&fallback).with_context(|| {
            format!(
                "Failed to open log file {} ({}) or {}",
                path.display(),
                first,
                fallback.display()
            )
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_falls_back_when_unwritable() {
        let dir = tempfile::tempdir().unwrap();
        let unwritable = dir.path().join("missing-dir").join("hw2serial.log");
        assert!(open_log_file(&unwritable).is_ok());
        assert!(!unwritable.exists());
    }

    #[test]
    fn test_log_file_created_at_requested_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hw2serial.log");
        assert!(open_log_file(&path).is_ok());
        assert!(path.exists());
    }
}
