//! Serial port configuration and connection management
//!
//! Handles USB serial port discovery and opening the TriggerBox port with
//! the fixed line settings the hardware expects.

use crate::config::optional_seconds;
use crate::error::{Result, TriggerError};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::{self, Write};
use std::time::Duration;

/// Baud rate required by the TriggerBox PLUS
pub const TRIGGERBOX_BAUD: u32 = 2_000_000;

/// Default serial port path for the platform
#[cfg(windows)]
pub const DEFAULT_PORT: &str = "COM8";
#[cfg(not(windows))]
pub const DEFAULT_PORT: &str = "/dev/ttyACM0";

// `serialport` has no "no timeout" setting; this is the longest wait the
// poll-based backends accept.
const BLOCKING_TIMEOUT: Duration = Duration::from_millis(i32::MAX as u64);

/// Configuration for the serial connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortConfig {
    /// Serial port path (e.g., COM8, /dev/ttyACM0)
    pub port: String,
    /// Baud rate (must be 2_000_000 for TriggerBox PLUS)
    pub baudrate: u32,
    /// I/O timeout, `None` blocks
    #[serde(with = "optional_seconds", skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Duration>,
    /// Open the port exclusively
    pub exclusive: bool,
}

impl Default for PortConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT.to_string(),
            baudrate: TRIGGERBOX_BAUD,
            timeout: None,
            exclusive: true,
        }
    }
}

impl PortConfig {
    /// Create a new configuration with default TriggerBox settings
    pub fn new(port: &str) -> Self {
        Self {
            port: port.to_string(),
            ..Default::default()
        }
    }

    /// Set the baud rate
    pub fn with_baud_rate(mut self, baudrate: u32) -> Self {
        self.baudrate = baudrate;
        self
    }

    /// Set the I/O timeout
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set whether the port is opened exclusively
    pub fn with_exclusive(mut self, exclusive: bool) -> Self {
        self.exclusive = exclusive;
        self
    }
}

/// Byte sink a trigger sender writes to
pub trait TriggerLine: Write + Send {
    /// Discard pending input and output
    fn clear_buffers(&mut self) -> io::Result<()>;
}

impl TriggerLine for Box<dyn SerialPort> {
    fn clear_buffers(&mut self) -> io::Result<()> {
        self.clear(ClearBuffer::All).map_err(io::Error::from)
    }
}

/// Opens trigger lines for a port configuration
pub trait Connector {
    type Line: TriggerLine + 'static;

    fn connect(&self, config: &PortConfig) -> Result<Self::Line>;
}

/// Connector backed by a real serial port
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialConnector;

impl Connector for SerialConnector {
    type Line = Box<dyn SerialPort>;

    fn connect(&self, config: &PortConfig) -> Result<Self::Line> {
        let builder = serialport::new(&config.port, config.baudrate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(config.timeout.unwrap_or(BLOCKING_TIMEOUT));

        open_port(builder, config.exclusive).map_err(|source| TriggerError::Open {
            port: config.port.clone(),
            source,
        })
    }
}

#[cfg(unix)]
fn open_port(
    builder: serialport::SerialPortBuilder,
    exclusive: bool,
) -> serialport::Result<Box<dyn SerialPort>> {
    let mut port = builder.open_native()?;
    port.set_exclusive(exclusive)?;
    Ok(Box::new(port))
}

#[cfg(not(unix))]
fn open_port(
    builder: serialport::SerialPortBuilder,
    exclusive: bool,
) -> serialport::Result<Box<dyn SerialPort>> {
    // COM ports cannot be shared
    if !exclusive {
        log::debug!("Ignoring non-exclusive open, COM ports are always exclusive");
    }
    builder.open()
}

/// Information about a detected serial port
#[derive(Debug, Clone)]
pub struct PortInfo {
    pub path: String,
    pub port_type: PortType,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
    pub serial_number: Option<String>,
    pub vid: Option<u16>,
    pub pid: Option<u16>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PortType {
    UsbSerial,
    PciSerial,
    Bluetooth,
    Unknown,
}

impl std::fmt::Display for PortType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortType::UsbSerial => write!(f, "USB Serial"),
            PortType::PciSerial => write!(f, "PCI Serial"),
            PortType::Bluetooth => write!(f, "Bluetooth"),
            PortType::Unknown => write!(f, "Unknown"),
        }
    }
}

impl From<serialport::SerialPortInfo> for PortInfo {
    fn from(p: serialport::SerialPortInfo) -> Self {
        let (port_type, manufacturer, product, serial_number, vid, pid) = match p.port_type {
            serialport::SerialPortType::UsbPort(info) => (
                PortType::UsbSerial,
                info.manufacturer,
                info.product,
                info.serial_number,
                Some(info.vid),
                Some(info.pid),
            ),
            serialport::SerialPortType::PciPort => (PortType::PciSerial, None, None, None, None, None),
            serialport::SerialPortType::BluetoothPort => {
                (PortType::Bluetooth, None, None, None, None, None)
            }
            serialport::SerialPortType::Unknown => (PortType::Unknown, None, None, None, None, None),
        };

        PortInfo {
            path: p.port_name,
            port_type,
            manufacturer,
            product,
            serial_number,
            vid,
            pid,
        }
    }
}

/// List all available serial ports
pub fn list_ports() -> Result<Vec<PortInfo>> {
    let ports = serialport::available_ports().map_err(TriggerError::Enumerate)?;

    Ok(ports.into_iter().map(PortInfo::from).collect())
}

/// Print formatted list of available serial ports
pub fn print_ports() -> Result<()> {
    let ports = list_ports()?;

    if ports.is_empty() {
        println!("{}", "No serial ports found".yellow());
        println!("\n{}", "Troubleshooting tips:".cyan().bold());
        println!("  1. Connect the TriggerBox via USB");
        println!("  2. Check if the device is recognized: ls -la /dev/ttyACM* /dev/ttyUSB*");
        println!("  3. Add your user to the 'dialout' group: sudo usermod -aG dialout $USER");
        return Ok(());
    }

    println!("{}", "Available Serial Ports:".green().bold());
    println!("{}", "=".repeat(60));

    for port in ports {
        println!("\n{}: {}", "Port".cyan(), port.path.white().bold());
        println!("  Type: {}", port.port_type);

        if let Some(ref mfg) = port.manufacturer {
            println!("  Manufacturer: {}", mfg);
        }
        if let Some(ref prod) = port.product {
            println!("  Product: {}", prod);
        }
        if let Some(ref sn) = port.serial_number {
            println!("  Serial: {}", sn);
        }
        if let (Some(vid), Some(pid)) = (port.vid, port.pid) {
            println!("  VID:PID: {:04x}:{:04x}", vid, pid);
        }
    }

    println!("\n{}", "=".repeat(60));
    println!(
        "{}",
        "Use: triggerbox send -p <PORT> <VALUE> to send a trigger".yellow()
    );

    Ok(())
}
