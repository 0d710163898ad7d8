//! Transmitter abstraction for the transfer buffer.
//!
//! This module defines the Transmitter trait and concrete implementations
//! for sending each cycle's line to various destinations (serial port, logs).

use crate::config::AppConfig;
use crate::error::TransmitError;
use std::fmt;
use std::io::Write;
use std::time::Duration;

/// Where and how to send one line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSettings {
    pub port: String,
    pub baud_rate: u32,
    pub timeout: Duration,
    pub line_ending: String,
}

impl LinkSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            port: config.serial_port.clone(),
            baud_rate: config.baud_rate,
            timeout: config.write_timeout(),
            line_ending: config.line_ending.clone(),
        }
    }

    /// Bytes written for one line, terminator included
    pub fn frame(&self, line: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(line.len() + self.line_ending.len());
        bytes.extend_from_slice(line);
        bytes.extend_from_slice(self.line_ending.as_bytes());
        bytes
    }
}

/// Connectivity indicator shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    /// No transmission attempted yet
    Unknown,
    Connected,
    Disconnected,
    /// Transmission switched off by the user
    Paused,
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            LinkStatus::Unknown => "waiting",
            LinkStatus::Connected => "connected",
            LinkStatus::Disconnected => "disconnected",
            LinkStatus::Paused => "paused",
        };
        f.write_str(text)
    }
}

/// Trait for sending a transfer-buffer line
#[cfg_attr(test, mockall::automock)]
pub trait Transmitter {
    /// Send one line. Implementations must not retry.
    fn transmit(&mut self, link: &LinkSettings, line: &[u8]) -> Result<(), TransmitError>;
}

/// Serial port transmitter.
///
/// The port is opened, written and closed within each call, so an unplugged
/// device is picked up again on the next cycle.
pub struct SerialTransmitter;

impl Transmitter for SerialTransmitter {
    fn transmit(&mut self, link: &LinkSettings, line: &[u8]) -> Result<(), TransmitError> {
        let mut port = serialport::new(link.port.as_str(), link.baud_rate)
            .timeout(link.timeout)
            .open()
            .map_err(|e| TransmitError::OpenError {
                port: link.port.clone(),
                message: e.to_string(),
            })?;

        let write_error = |source| TransmitError::WriteError {
            port: link.port.clone(),
            source,
        };
        port.write_all(&link.frame(line)).map_err(write_error)?;
        port.flush().map_err(write_error)?;
        Ok(())
    }
}

/// Logging transmitter that logs each line instead of sending it
pub struct LoggingTransmitter;

impl Transmitter for LoggingTransmitter {
    fn transmit(&mut self, link: &LinkSettings, line: &[u8]) -> Result<(), TransmitError> {
        tracing::info!(
            port = %link.port,
            baud = link.baud_rate,
            "{}",
            String::from_utf8_lossy(line)
        );
        Ok(())
    }
}

/// Discards every line. Used by `--once --no-serial`, where the line goes to stdout.
pub struct NoOpTransmitter;

impl Transmitter for NoOpTransmitter {
    fn transmit(&mut self, _link: &LinkSettings, _line: &[u8]) -> Result<(), TransmitError> {
        Ok(())
    }
}

/// Names of the serial ports present on this machine
pub fn list_serial_ports() -> Result<Vec<String>, TransmitError> {
    let ports = serialport::available_ports()
        .map_err(|e| TransmitError::EnumerationError(e.to_string()))?;
    Ok(ports.into_iter().map(|p| p.port_name).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link() -> LinkSettings {
        LinkSettings {
            port: "COM3".to_string(),
            baud_rate: 9600,
            timeout: Duration::from_secs(1),
            line_ending: "\n".to_string(),
        }
    }

    #[test]
    fn test_frame_appends_line_ending() {
        assert_eq!(link().frame(b"10:00:00 55 0"), b"10:00:00 55 0\n".to_vec());

        let mut bare = link();
        bare.line_ending = String::new();
        assert_eq!(bare.frame(b"1 2"), b"1 2".to_vec());
    }

    #[test]
    fn test_link_from_config() {
        let mut config = AppConfig::default();
        config.serial_port = "COM5".to_string();
        config.baud_rate = 115200;
        config.write_timeout_ms = 250;

        let link = LinkSettings::from_config(&config);
        assert_eq!(link.port, "COM5");
        assert_eq!(link.baud_rate, 115200);
        assert_eq!(link.timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_missing_port_reports_open_error() {
        let mut missing = link();
        missing.port = "/dev/hw2serial-does-not-exist".to_string();
        let result = SerialTransmitter.transmit(&missing, b"1");
        assert!(matches!(result, Err(TransmitError::OpenError { .. })));
    }

    #[test]
    fn test_logging_transmitter_never_fails() {
        assert!(LoggingTransmitter.transmit(&link(), b"1 2 3").is_ok());
    }

    #[test]
    fn test_noop_transmitter_accepts_any_line() {
        let mut transmitter = NoOpTransmitter;
        assert!(transmitter.transmit(&link(), b"").is_ok());
        assert!(transmitter.transmit(&link(), b"42 0 3.300\n").is_ok());
    }
}
