//! TriggerBox configuration
//!
//! Configuration is an immutable value handed to [`crate::TriggerBox`].
//! It can be built in code or loaded from a TOML file:
//!
//! ```toml
//! pulse_width = 0.005
//!
//! [serial]
//! port = "/dev/ttyACM0"
//! baudrate = 2000000
//! exclusive = true
//! # timeout = 0.5
//! ```
//!
//! Durations are written as seconds.

use crate::error::{Result, TriggerError};
use crate::serial::port::{PortConfig, TRIGGERBOX_BAUD};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Default pulse width of a trigger (5 ms)
pub const DEFAULT_PULSE_WIDTH: Duration = Duration::from_millis(5);

/// Complete configuration of a trigger sender
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerBoxConfig {
    /// How long a trigger byte stays on the line before the reset byte
    #[serde(with = "seconds")]
    pub pulse_width: Duration,
    /// Serial connection settings
    pub serial: PortConfig,
}

impl Default for TriggerBoxConfig {
    fn default() -> Self {
        Self {
            pulse_width: DEFAULT_PULSE_WIDTH,
            serial: PortConfig::default(),
        }
    }
}

impl TriggerBoxConfig {
    pub fn new(serial: PortConfig) -> Self {
        Self {
            serial,
            ..Default::default()
        }
    }

    /// Set the pulse width
    pub fn with_pulse_width(mut self, pulse_width: Duration) -> Self {
        self.pulse_width = pulse_width;
        self
    }

    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| TriggerError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| TriggerError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| TriggerError::Config(format!("cannot serialize configuration: {}", e)))
    }

    /// Reject configurations that cannot open a port, warn about ones the
    /// TriggerBox PLUS will not understand
    pub fn validate(&self) -> Result<()> {
        if self.serial.port.trim().is_empty() {
            return Err(TriggerError::Config("serial port name is empty".to_string()));
        }
        if self.serial.baudrate == 0 {
            return Err(TriggerError::Config("baudrate must be positive".to_string()));
        }
        if self.serial.baudrate != TRIGGERBOX_BAUD {
            warn!(
                "Baudrate {} on {}; TriggerBox PLUS expects {}",
                self.serial.baudrate, self.serial.port, TRIGGERBOX_BAUD
            );
        }
        if self.pulse_width.is_zero() {
            warn!(
                "Pulse width is zero on {}; triggers may not be registered",
                self.serial.port
            );
        }
        Ok(())
    }
}

/// `Duration` as floating point seconds
pub(crate) mod seconds {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs)
            .map_err(|e| D::Error::custom(format!("invalid duration {}: {}", secs, e)))
    }
}

/// `Option<Duration>` as floating point seconds, absent meaning none
pub(crate) mod optional_seconds {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_some(&d.as_secs_f64()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        #[derive(Deserialize)]
        struct Wrapper(#[serde(with = "super::seconds")] Duration);

        let value = Option::<Wrapper>::deserialize(deserializer)?;
        Ok(value.map(|Wrapper(d)| d))
    }
}
