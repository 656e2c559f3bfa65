//! Trigger pulses for the BrainProducts TriggerBox
//!
//! - [`TriggerCode`]: validated trigger values
//! - [`TriggerBox`]: one serial connection, one pulse per `send`
//! - [`PortRegistry`]: bulk teardown of open senders

pub mod code;
pub mod registry;
pub mod sender;

pub use code::{TriggerCode, RESET_BYTE};
pub use registry::PortRegistry;
pub use sender::TriggerBox;
