//! Serial port communication module for the TriggerBox
//!
//! This module provides functionality for:
//! - Opening the TriggerBox port with its fixed line settings
//! - Listing available serial ports
//! - The `Connector`/`TriggerLine` seam trigger senders write through

#[cfg(test)]
pub(crate) mod mock;
pub mod port;

pub use port::{list_ports, Connector, PortConfig, SerialConnector, TriggerLine};
