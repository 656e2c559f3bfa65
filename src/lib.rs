//! TriggerBox
//!
//! Sends event triggers to a BrainProducts TriggerBox (PLUS) over its USB
//! serial port. A trigger is a single byte in `1..=254` held on the line
//! for a pulse width and then reset to `0`.
//!
//! ```no_run
//! use std::time::Duration;
//! use triggerbox::{PortConfig, PortRegistry, TriggerBoxConfig};
//!
//! # fn main() -> triggerbox::Result<()> {
//! let registry = PortRegistry::new();
//! let config = TriggerBoxConfig::new(PortConfig::new("COM8"))
//!     .with_pulse_width(Duration::from_millis(5));
//!
//! let mut trigger = registry.open(config)?;
//! trigger.send(1)?;
//! trigger.send(200)?;
//!
//! registry.close_all();
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod serial;
pub mod trigger;

pub use config::TriggerBoxConfig;
pub use error::{Result, TriggerError};
pub use serial::{Connector, PortConfig, SerialConnector, TriggerLine};
pub use trigger::{PortRegistry, TriggerBox, TriggerCode};
