//! Trigger sender
//!
//! A [`TriggerBox`] owns one serial connection. Each trigger is a pulse:
//! the code byte is written, held for the pulse width, and followed by the
//! reset byte, so the line is back at zero whenever `send` returns.

use super::code::{TriggerCode, RESET_BYTE};
use super::registry::RegisteredLine;
use crate::config::TriggerBoxConfig;
use crate::error::{Result, TriggerError};
use crate::serial::port::{Connector, SerialConnector, TriggerLine};
use log::{debug, info};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

/// Connection state shared with the registry
pub(crate) struct LineSlot<L> {
    port: String,
    line: Option<L>,
}

impl<L: TriggerLine> RegisteredLine for Mutex<LineSlot<L>> {
    fn port_name(&self) -> String {
        lock(self).port.clone()
    }

    fn close(&self) -> bool {
        let mut slot = lock(self);
        match slot.line.take() {
            Some(line) => {
                drop(line);
                info!("Closed serial port {}", slot.port);
                true
            }
            None => false,
        }
    }
}

fn lock<L>(slot: &Mutex<LineSlot<L>>) -> MutexGuard<'_, LineSlot<L>> {
    // Only ever holds a whole line or none, so a poisoned lock is still usable
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

fn write_byte<L: TriggerLine>(line: &mut L, byte: u8, port: &str) -> Result<()> {
    line.write_all(&[byte])
        .and_then(|()| line.flush())
        .map_err(|source| TriggerError::Write {
            port: port.to_string(),
            source,
        })
}

/// Sends trigger pulses to a BrainProducts TriggerBox
pub struct TriggerBox<C: Connector = SerialConnector> {
    connector: C,
    config: TriggerBoxConfig,
    slot: Arc<Mutex<LineSlot<C::Line>>>,
}

impl TriggerBox<SerialConnector> {
    /// Open the configured serial port and pull the line low
    pub fn open(config: TriggerBoxConfig) -> Result<Self> {
        Self::with_connector(SerialConnector, config)
    }
}

impl<C: Connector> TriggerBox<C> {
    /// Open a line through `connector` and pull it low
    pub fn with_connector(connector: C, config: TriggerBoxConfig) -> Result<Self> {
        config.validate()?;

        let port = config.serial.port.clone();
        let mut line = connector.connect(&config.serial)?;
        write_byte(&mut line, RESET_BYTE, &port)?;

        info!(
            "Opened TriggerBox on {} at {} baud (pulse width {:?})",
            port, config.serial.baudrate, config.pulse_width
        );

        Ok(Self {
            connector,
            config,
            slot: Arc::new(Mutex::new(LineSlot {
                port,
                line: Some(line),
            })),
        })
    }

    /// Send one trigger pulse
    ///
    /// Values outside `1..=254` are rejected before anything is written.
    /// Blocks the calling thread for the pulse width.
    pub fn send(&mut self, value: impl Into<i64>) -> Result<()> {
        let code = TriggerCode::try_from(value.into())?;
        self.send_code(code)
    }

    /// Send one pulse for an already validated code
    pub fn send_code(&mut self, code: TriggerCode) -> Result<()> {
        let port = &self.config.serial.port;
        let mut slot = lock(&self.slot);
        let line = slot
            .line
            .as_mut()
            .ok_or_else(|| TriggerError::PortClosed { port: port.clone() })?;

        write_byte(line, code.get(), port)?;
        thread::sleep(self.config.pulse_width);
        write_byte(line, RESET_BYTE, port)?;

        debug!("Sent trigger {} on {}", code, port);
        Ok(())
    }

    /// Flush both buffers and close the port, reopening it unless
    /// `close_only` is set
    ///
    /// A closed port is opened first so its buffers can be flushed.
    pub fn reset_port(&mut self, close_only: bool) -> Result<()> {
        let port = &self.config.serial.port;
        let mut slot = lock(&self.slot);

        let mut line = match slot.line.take() {
            Some(line) => line,
            None => self.connector.connect(&self.config.serial)?,
        };
        let cleared = line.clear_buffers();
        drop(line);
        cleared.map_err(|source| TriggerError::Clear {
            port: port.clone(),
            source,
        })?;

        if close_only {
            info!("Closed serial port {}", port);
            return Ok(());
        }

        slot.line = Some(self.connector.connect(&self.config.serial)?);
        info!("Reopened serial port {}", port);
        Ok(())
    }

    /// Whether the serial handle is currently open
    pub fn is_open(&self) -> bool {
        lock(&self.slot).line.is_some()
    }

    pub fn port_name(&self) -> &str {
        &self.config.serial.port
    }

    pub fn pulse_width(&self) -> Duration {
        self.config.pulse_width
    }

    pub fn config(&self) -> &TriggerBoxConfig {
        &self.config
    }

    pub(crate) fn shared_line(&self) -> Arc<dyn RegisteredLine> {
        self.slot.clone()
    }
}

impl<C: Connector> fmt::Debug for TriggerBox<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriggerBox")
            .field("port", &self.config.serial.port)
            .field("pulse_width", &self.config.pulse_width)
            .field("open", &self.is_open())
            .finish()
    }
}
