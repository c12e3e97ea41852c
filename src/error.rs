//! Unified error types for the intensity controller.
//!
//! Two layers: [`SinkError`] is what a hardware adapter reports for a single
//! call, [`ControlError`] is what a `set_intensity` caller sees.  Inside the
//! PWM loop a `SinkError` never becomes a `ControlError`; it is counted and
//! the loop keeps cycling.

use core::fmt;

// ---------------------------------------------------------------------------
// Hardware sink errors
// ---------------------------------------------------------------------------

/// Failure of one call into a [`HardwareSink`](crate::app::ports::HardwareSink).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    /// The device has no graduated strength control (or the call is not
    /// implemented by this sink).
    Unsupported,
    /// No device with this id is known to the sink.
    UnknownDevice(String),
    /// The underlying file / bus access failed.
    Io(String),
    /// The device rejected the command (busy, in use by another client, ...).
    Device(String),
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported => write!(f, "operation not supported by device"),
            Self::UnknownDevice(id) => write!(f, "unknown device '{id}'"),
            Self::Io(msg) => write!(f, "I/O error: {msg}"),
            Self::Device(msg) => write!(f, "device error: {msg}"),
        }
    }
}

impl std::error::Error for SinkError {}

impl From<std::io::Error> for SinkError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Controller errors
// ---------------------------------------------------------------------------

/// Every fallible `IntensityController` operation funnels into this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlError {
    /// Device resolution exhausted every selection tier.
    NoDeviceFound,
    /// Malformed request; the message names the offending field.
    InvalidRequest(&'static str),
    /// A direct hardware call failed after the allowed graduated->binary
    /// fallback.
    HardwareCallFailed { device_id: String, source: SinkError },
    /// The device probe itself failed.
    Probe(SinkError),
    /// The PWM worker thread could not be started.
    Worker(String),
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoDeviceFound => write!(f, "no torch device found"),
            Self::InvalidRequest(msg) => write!(f, "invalid request: {msg}"),
            Self::HardwareCallFailed { device_id, source } => {
                write!(f, "hardware call failed on '{device_id}': {source}")
            }
            Self::Probe(e) => write!(f, "device probe failed: {e}"),
            Self::Worker(msg) => write!(f, "PWM worker: {msg}"),
        }
    }
}

impl std::error::Error for ControlError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::HardwareCallFailed { source, .. } | Self::Probe(source) => Some(source),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    Io(std::io::Error),
    /// The config file is not valid JSON for [`ControllerConfig`](crate::config::ControllerConfig).
    Parse(serde_json::Error),
    /// A field failed range validation.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "config I/O: {e}"),
            Self::Parse(e) => write!(f, "config parse: {e}"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Parse(e) => Some(e),
            Self::ValidationFailed(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e)
    }
}

/// Controller-wide `Result` alias.
pub type Result<T> = core::result::Result<T, ControlError>;
