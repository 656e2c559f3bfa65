//! Registry of open trigger senders
//!
//! Experiments that drive several TriggerBoxes register each sender here
//! so every port can be released in one call at teardown. The registry
//! never keeps a sender alive: it holds weak references and forgets
//! senders that were dropped.

use super::sender::TriggerBox;
use crate::config::TriggerBoxConfig;
use crate::error::Result;
use crate::serial::port::{Connector, SerialConnector};
use log::{debug, info};
use std::sync::{Arc, Mutex, PoisonError, Weak};

/// Connection a registry can close without knowing its line type
pub(crate) trait RegisteredLine: Send + Sync {
    fn port_name(&self) -> String;

    /// Close the handle, returning whether it was open
    fn close(&self) -> bool;
}

/// Tracks live senders for bulk teardown
///
/// Dropping the registry closes every port still registered.
#[derive(Default)]
pub struct PortRegistry {
    entries: Mutex<Vec<Weak<dyn RegisteredLine>>>,
}

impl PortRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `trigger` until it is dropped or `close_all` runs
    pub fn register<C: Connector>(&self, trigger: &TriggerBox<C>) {
        let line = trigger.shared_line();
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.retain(|entry| entry.strong_count() > 0);
        entries.push(Arc::downgrade(&line));
        debug!("Registered {} ({} live)", trigger.port_name(), entries.len());
    }

    /// Open a serial TriggerBox and register it
    pub fn open(&self, config: TriggerBoxConfig) -> Result<TriggerBox<SerialConnector>> {
        self.open_with(SerialConnector, config)
    }

    /// Open a TriggerBox through `connector` and register it
    pub fn open_with<C: Connector>(
        &self,
        connector: C,
        config: TriggerBoxConfig,
    ) -> Result<TriggerBox<C>> {
        let trigger = TriggerBox::with_connector(connector, config)?;
        self.register(&trigger);
        Ok(trigger)
    }

    /// Close every registered port that is still open
    ///
    /// Returns the number of handles closed. Closed senders fail their next
    /// `send` with `PortClosed` until `reset_port(false)` reopens them.
    pub fn close_all(&self) -> usize {
        let entries: Vec<_> = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();

        let mut closed = 0;
        for line in entries.iter().filter_map(Weak::upgrade) {
            if line.close() {
                closed += 1;
            } else {
                debug!("{} was already closed", line.port_name());
            }
        }

        if closed > 0 {
            info!("Closed {} serial port(s)", closed);
        }
        closed
    }

    /// Number of registered senders still alive
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|entry| entry.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for PortRegistry {
    fn drop(&mut self) {
        self.close_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TriggerError;
    use crate::serial::mock::MockConnector;
    use crate::serial::port::PortConfig;
    use std::time::Duration;

    fn config(port: &str) -> TriggerBoxConfig {
        TriggerBoxConfig::new(PortConfig::new(port)).with_pulse_width(Duration::ZERO)
    }

    #[test]
    fn test_close_all() {
        let registry = PortRegistry::new();
        let first = MockConnector::new();
        let second = MockConnector::new();

        let mut a = registry.open_with(first.clone(), config("COM8")).unwrap();
        let mut b = registry.open_with(second.clone(), config("COM9")).unwrap();
        assert_eq!(registry.len(), 2);

        assert_eq!(registry.close_all(), 2);
        assert!(registry.is_empty());
        assert!(!a.is_open());
        assert!(!b.is_open());

        assert!(matches!(a.send(1).unwrap_err(), TriggerError::PortClosed { .. }));
        assert!(matches!(b.send(1).unwrap_err(), TriggerError::PortClosed { .. }));
        assert_eq!(first.wire.bytes(), vec![0]);
        assert_eq!(second.wire.bytes(), vec![0]);
    }

    #[test]
    fn test_closed_sender_can_be_revived() {
        let registry = PortRegistry::new();
        let connector = MockConnector::new();
        let mut trigger = registry.open_with(connector.clone(), config("COM8")).unwrap();

        registry.close_all();
        trigger.reset_port(false).unwrap();
        trigger.send(9).unwrap();

        assert_eq!(connector.wire.bytes(), vec![0, 9, 0]);
    }

    #[test]
    fn test_dropped_senders_are_forgotten() {
        let registry = PortRegistry::new();
        let kept = registry.open_with(MockConnector::new(), config("COM8")).unwrap();
        let dropped = registry.open_with(MockConnector::new(), config("COM9")).unwrap();

        drop(dropped);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.close_all(), 1);
        assert!(!kept.is_open());
    }

    #[test]
    fn test_already_closed_not_counted() {
        let registry = PortRegistry::new();
        let mut trigger = registry.open_with(MockConnector::new(), config("COM8")).unwrap();

        trigger.reset_port(true).unwrap();
        assert_eq!(registry.close_all(), 0);
    }

    #[test]
    fn test_register_existing_sender() {
        let registry = PortRegistry::new();
        let trigger = TriggerBox::with_connector(MockConnector::new(), config("COM8")).unwrap();

        registry.register(&trigger);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_drop_closes_ports() {
        let registry = PortRegistry::new();
        let trigger = registry.open_with(MockConnector::new(), config("COM8")).unwrap();

        drop(registry);
        assert!(!trigger.is_open());
    }

    #[test]
    fn test_failed_open_not_registered() {
        let registry = PortRegistry::new();
        let connector = MockConnector::new();
        connector
            .wire
            .refuse_connect
            .store(true, std::sync::atomic::Ordering::SeqCst);

        assert!(registry.open_with(connector, config("COM8")).is_err());
        assert!(registry.is_empty());
    }
}
