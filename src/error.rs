//! Custom error types for hw2serial.
//!
//! This module defines domain-specific error types using thiserror,
//! providing clear error messages and proper error context propagation.

use thiserror::Error;

/// Errors raised by a sensor backend
#[derive(Debug, Error)]
pub enum SensorError {
    #[error("Unknown device id: {0}")]
    UnknownDevice(usize),

    #[error("Device refresh failed: {0}")]
    RefreshError(String),

    #[error("Sensor read failed: {0}")]
    ReadError(String),

    #[error("Unknown sensor type code: {0}")]
    UnknownType(u8),
}

/// Errors related to serial transmission
#[derive(Debug, Error)]
pub enum TransmitError {
    #[error("Failed to open serial port {port}: {message}")]
    OpenError { port: String, message: String },

    #[error("Failed to write to serial port {port}: {source}")]
    WriteError {
        port: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to enumerate serial ports: {0}")]
    EnumerationError(String),
}

/// Errors related to application configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("Failed to write config file: {0}")]
    WriteError(#[from] std::io::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] serde_json::Error),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

/// Errors raised by slot list editing
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlotError {
    #[error("Slot list must hold between {min} and {max} slots, got {len}")]
    InvalidLength { len: usize, min: usize, max: usize },

    #[error("Slot index {0} is out of range")]
    OutOfRange(usize),

    #[error("Slot list is full ({0} slots)")]
    Full(usize),

    #[error("Slot {0} cannot be removed")]
    Protected(usize),
}

/// Errors related to OS integration (startup entry, elevation)
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("Startup registry access failed: {0}")]
    RegistryError(#[from] std::io::Error),

    #[error("Could not determine executable path: {0}")]
    ExecutablePath(String),

    #[error("Launch at startup is not supported on this platform")]
    Unsupported,

    #[error("Administrator privileges are required (admin_only is set)")]
    NotElevated,
}

/// Errors related to the UI
#[derive(Debug, Error)]
pub enum UiError {
    #[error("Terminal initialization failed: {0}")]
    InitializationError(String),

    #[error("Terminal rendering failed: {0}")]
    RenderError(String),

    #[error("Input handling failed: {0}")]
    InputError(String),
}

/// Errors related to service/daemon operations
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Signal handling error: {0}")]
    SignalError(String),
}

/// Application-level errors that can wrap other error types
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Sensor error: {0}")]
    Sensor(#[from] SensorError),

    #[error("Transmit error: {0}")]
    Transmit(#[from] TransmitError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Slot error: {0}")]
    Slot(#[from] SlotError),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("UI error: {0}")]
    Ui(#[from] UiError),

    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results using AppError
pub type Result<T> = std::result::Result<T, AppError>;
