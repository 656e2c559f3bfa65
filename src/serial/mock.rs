//! In-memory serial line for tests
//!
//! Records every byte written together with the time it was flushed, and
//! can be told to refuse connections or fail writes.

use super::port::{Connector, PortConfig, TriggerLine};
use crate::error::{Result, TriggerError};
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Shared view of everything the mock lines saw
#[derive(Debug, Default)]
pub struct Wire {
    writes: Mutex<Vec<(u8, Instant)>>,
    pub connects: AtomicUsize,
    pub clears: AtomicUsize,
    pub refuse_connect: AtomicBool,
    pub fail_writes: AtomicBool,
}

impl Wire {
    pub fn bytes(&self) -> Vec<u8> {
        self.writes().iter().map(|(b, _)| *b).collect()
    }

    pub fn writes(&self) -> Vec<(u8, Instant)> {
        self.writes.lock().unwrap().clone()
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockConnector {
    pub wire: Arc<Wire>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Connector for MockConnector {
    type Line = MockLine;

    fn connect(&self, config: &PortConfig) -> Result<MockLine> {
        if self.wire.refuse_connect.load(Ordering::SeqCst) {
            return Err(TriggerError::Open {
                port: config.port.clone(),
                source: serialport::Error::new(serialport::ErrorKind::NoDevice, "Device or resource busy"),
            });
        }
        self.wire.connects.fetch_add(1, Ordering::SeqCst);
        Ok(MockLine {
            wire: Arc::clone(&self.wire),
            pending: Vec::new(),
        })
    }
}

#[derive(Debug)]
pub struct MockLine {
    wire: Arc<Wire>,
    pending: Vec<u8>,
}

impl Write for MockLine {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.wire.fail_writes.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "device unplugged"));
        }
        self.pending.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let now = Instant::now();
        let mut writes = self.wire.writes.lock().unwrap();
        writes.extend(self.pending.drain(..).map(|b| (b, now)));
        Ok(())
    }
}

impl TriggerLine for MockLine {
    fn clear_buffers(&mut self) -> io::Result<()> {
        self.pending.clear();
        self.wire.clears.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
