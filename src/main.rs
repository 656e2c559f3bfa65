//! TriggerBox command line tool
//!
//! Sends event triggers to a BrainProducts TriggerBox from the shell, for
//! checking the wiring of an EEG setup before an experiment.
//!
//! # Usage
//!
//! ```bash
//! # List available serial ports
//! triggerbox ports list
//!
//! # Send triggers 1 and 12, 500 ms apart
//! triggerbox send -p /dev/ttyACM0 --interval-ms 500 1 12
//!
//! # Run the three-trigger check (1, 200, 50)
//! triggerbox demo -p COM8
//!
//! # Write a config file and use it
//! triggerbox config init -o triggerbox.toml
//! triggerbox send -c triggerbox.toml 7
//! ```

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use triggerbox::serial::port::print_ports;
use triggerbox::{PortRegistry, TriggerBox, TriggerBoxConfig, TriggerCode};

/// Triggers sent by `demo`, matching the manual check on the lab PCs
const DEMO_SEQUENCE: [u8; 3] = [1, 200, 50];

/// TriggerBox
///
/// Send event triggers to a BrainProducts TriggerBox over USB serial
#[derive(Parser)]
#[command(name = "triggerbox")]
#[command(author = "Prasanna Gautam")]
#[command(version = "0.1.0")]
#[command(about = "Send event triggers to a BrainProducts TriggerBox")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Serial port operations
    #[command(subcommand)]
    Ports(PortCommands),

    /// Send one or more triggers
    Send {
        #[command(flatten)]
        connection: ConnectionArgs,

        /// Trigger values (1-254)
        #[arg(required = true)]
        values: Vec<TriggerCode>,

        /// Pause between consecutive triggers in milliseconds
        #[arg(long, default_value_t = 0)]
        interval_ms: u64,
    },

    /// Send triggers 1, 200 and 50 with a pause in between
    Demo {
        #[command(flatten)]
        connection: ConnectionArgs,

        /// Pause between triggers in seconds
        #[arg(long, default_value_t = 3.0)]
        delay_secs: f64,
    },

    /// Configuration file operations
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum PortCommands {
    /// List available serial ports
    List,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration
    Show {
        #[command(flatten)]
        connection: ConnectionArgs,
    },

    /// Write a default configuration file
    Init {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Connection settings shared by the commands that open a port
#[derive(Args)]
struct ConnectionArgs {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serial port path (e.g., COM8, /dev/ttyACM0)
    #[arg(short, long)]
    port: Option<String>,

    /// Baud rate (TriggerBox PLUS needs 2000000)
    #[arg(short, long)]
    baud: Option<u32>,

    /// Trigger pulse width in milliseconds
    #[arg(long)]
    pulse_width_ms: Option<u64>,

    /// I/O timeout in milliseconds (default: blocking)
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Do not open the port exclusively
    #[arg(long)]
    shared: bool,
}

impl ConnectionArgs {
    /// Config file (or defaults) overridden by command line flags
    fn resolve(&self) -> Result<TriggerBoxConfig> {
        let mut config = match &self.config {
            Some(path) => TriggerBoxConfig::load(path)?,
            None => TriggerBoxConfig::default(),
        };

        if let Some(ref port) = self.port {
            config.serial.port = port.clone();
        }
        if let Some(baud) = self.baud {
            config.serial.baudrate = baud;
        }
        if let Some(ms) = self.pulse_width_ms {
            config.pulse_width = Duration::from_millis(ms);
        }
        if let Some(ms) = self.timeout_ms {
            config.serial.timeout = Some(Duration::from_millis(ms));
        }
        if self.shared {
            config.serial.exclusive = false;
        }

        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logger
    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Commands::Ports(cmd) => handle_ports(cmd),
        Commands::Send {
            connection,
            values,
            interval_ms,
        } => handle_send(&connection, &values, Duration::from_millis(interval_ms)),
        Commands::Demo {
            connection,
            delay_secs,
        } => handle_demo(&connection, delay_secs),
        Commands::Config(cmd) => handle_config(cmd),
    }
}

fn handle_ports(cmd: PortCommands) -> Result<()> {
    match cmd {
        PortCommands::List => print_ports()?,
    }
    Ok(())
}

fn open_trigger(registry: &PortRegistry, connection: &ConnectionArgs) -> Result<TriggerBox> {
    let config = connection.resolve()?;
    let port = config.serial.port.clone();

    let trigger = registry
        .open(config)
        .with_context(|| format!("Failed to open TriggerBox on {}", port))?;

    println!(
        "{} Connected to {} at {} baud (pulse width {} ms)",
        "[OK]".green().bold(),
        port.white().bold(),
        trigger.config().serial.baudrate,
        trigger.pulse_width().as_millis()
    );
    Ok(trigger)
}

fn send_and_report(trigger: &mut TriggerBox, code: TriggerCode) -> Result<()> {
    trigger
        .send_code(code)
        .with_context(|| format!("Failed to send trigger {}", code))?;

    let timestamp = Local::now().format("%H:%M:%S%.3f");
    println!(
        "{} {} Trigger {}",
        timestamp.to_string().dimmed(),
        "[TX]".cyan().bold(),
        code.to_string().white().bold()
    );
    Ok(())
}

fn handle_send(connection: &ConnectionArgs, values: &[TriggerCode], interval: Duration) -> Result<()> {
    let registry = PortRegistry::new();
    let mut trigger = open_trigger(&registry, connection)?;

    for (i, code) in values.iter().enumerate() {
        if i > 0 {
            thread::sleep(interval);
        }
        send_and_report(&mut trigger, *code)?;
    }

    registry.close_all();
    println!("{}", "[OK] Triggers sent".green());
    Ok(())
}

fn handle_demo(connection: &ConnectionArgs, delay_secs: f64) -> Result<()> {
    let delay = Duration::try_from_secs_f64(delay_secs)
        .with_context(|| format!("Invalid delay: {} s", delay_secs))?;

    let registry = PortRegistry::new();
    let mut trigger = open_trigger(&registry, connection)?;

    for (i, value) in DEMO_SEQUENCE.into_iter().enumerate() {
        if i > 0 {
            thread::sleep(delay);
        }
        send_and_report(&mut trigger, TriggerCode::new(value)?)?;
    }

    registry.close_all();
    println!("{}", "[OK] Demo sequence complete".green());
    Ok(())
}

fn handle_config(cmd: ConfigCommands) -> Result<()> {
    match cmd {
        ConfigCommands::Show { connection } => {
            let config = connection.resolve()?;
            config.validate()?;
            print!("{}", config.to_toml()?);
        }

        ConfigCommands::Init { output } => {
            let content = TriggerBoxConfig::default().to_toml()?;

            if let Some(path) = output {
                std::fs::write(&path, &content)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                println!(
                    "{} Configuration written to {}",
                    "[OK]".green().bold(),
                    path.display()
                );
            } else {
                print!("{}", content);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_send() {
        let cli = Cli::try_parse_from([
            "triggerbox", "send", "-p", "COM3", "--pulse-width-ms", "10", "1", "254",
        ])
        .unwrap();

        match cli.command {
            Commands::Send {
                connection, values, ..
            } => {
                assert_eq!(values, vec![TriggerCode::new(1).unwrap(), TriggerCode::new(254).unwrap()]);
                let config = connection.resolve().unwrap();
                assert_eq!(config.serial.port, "COM3");
                assert_eq!(config.pulse_width, Duration::from_millis(10));
            }
            _ => panic!("expected send command"),
        }
    }

    #[test]
    fn test_cli_rejects_invalid_trigger() {
        assert!(Cli::try_parse_from(["triggerbox", "send", "255"]).is_err());
        assert!(Cli::try_parse_from(["triggerbox", "send", "1.5"]).is_err());
        assert!(Cli::try_parse_from(["triggerbox", "send"]).is_err());
    }

    #[test]
    fn test_connection_overrides() {
        let cli = Cli::try_parse_from([
            "triggerbox", "config", "show", "--baud", "115200", "--timeout-ms", "250", "--shared",
        ])
        .unwrap();

        match cli.command {
            Commands::Config(ConfigCommands::Show { connection }) => {
                let config = connection.resolve().unwrap();
                assert_eq!(config.serial.baudrate, 115200);
                assert_eq!(config.serial.timeout, Some(Duration::from_millis(250)));
                assert!(!config.serial.exclusive);
            }
            _ => panic!("expected config show command"),
        }
    }

    #[test]
    fn test_demo_sequence_is_valid() {
        for value in DEMO_SEQUENCE {
            assert!(TriggerCode::new(value).is_ok());
        }
    }
}
