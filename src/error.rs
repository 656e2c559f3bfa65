//! Error types for trigger sending
//!
//! Every fallible library operation returns [`TriggerError`]. Argument
//! errors are raised before anything touches the wire; connection errors
//! are surfaced as-is and never retried.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the trigger sender, its registry and configuration
#[derive(Debug, Error)]
pub enum TriggerError {
    /// Trigger value outside `1..=254` or not an integer
    #[error("trigger must be an integer between 1 and 254, but was {0}")]
    InvalidArgument(String),

    /// Opening (or reopening) the serial port failed
    #[error("failed to open serial port {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: serialport::Error,
    },

    /// Writing a byte to the serial port failed
    #[error("failed to write to serial port {port}: {source}")]
    Write {
        port: String,
        #[source]
        source: io::Error,
    },

    /// Flushing the input/output buffers failed
    #[error("failed to clear buffers of serial port {port}: {source}")]
    Clear {
        port: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to enumerate serial ports: {0}")]
    Enumerate(#[source] serialport::Error),

    /// The handle was closed by `reset_port(true)` or `PortRegistry::close_all`
    #[error("serial port {port} is closed")]
    PortClosed { port: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to read config file {}: {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config file {}: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl TriggerError {
    /// Whether the error comes from the serial connection rather than from
    /// the caller's input
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            TriggerError::Open { .. }
                | TriggerError::Write { .. }
                | TriggerError::Clear { .. }
                | TriggerError::PortClosed { .. }
                | TriggerError::Enumerate(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, TriggerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_error_classification() {
        let closed = TriggerError::PortClosed {
            port: "COM8".to_string(),
        };
        assert!(closed.is_connection_error());
        assert_eq!(closed.to_string(), "serial port COM8 is closed");

        let open = TriggerError::Open {
            port: "/dev/ttyACM0".to_string(),
            source: serialport::Error::new(serialport::ErrorKind::NoDevice, "busy"),
        };
        assert!(open.is_connection_error());

        let invalid = TriggerError::InvalidArgument("255".to_string());
        assert!(!invalid.is_connection_error());
        assert!(invalid.to_string().contains("255"));
    }
}
