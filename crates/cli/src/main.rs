//! rust-heat-usb command line
//!
//! Queries the status of a USB heat treatment device or starts a treatment.
//! All protocol work happens in the `driver` crate; this binary parses
//! arguments, loads configuration, renders results and picks the exit code.

mod config;
mod render;

use anyhow::{Context, Result};
use clap::Parser;
use common::setup_logging;
use config::{HeatConfig, expand_path};
use driver::{DriverError, open_device, request_status, start_treatment};
use protocol::{HEAT_DEVICE, HEAT_ENDPOINTS, ProtocolError, TreatmentRequest};
use std::process::ExitCode;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "heat-usb")]
#[command(
    author,
    version,
    about = "Query or start a USB heat treatment device"
)]
#[command(long_about = "
Talks to a USB heat treatment device (32f9:0001) over its bulk endpoints.
Without positional arguments the device status is printed. With a TIME
level a treatment is started; TEMP defaults to the configured level.

EXAMPLES:
    # Print device status
    heat-usb

    # Print device status as JSON
    heat-usb --json

    # Start a treatment with time level 2 and the default temperature
    heat-usb 2

    # Start a treatment with time level 1 and temperature level 3
    heat-usb 1 3

CONFIGURATION:
    The configuration file is looked up in the following order:
    1. Path specified with --config
    2. ~/.config/rust-heat-usb/config.toml
    3. /etc/rust-heat-usb/config.toml
    4. Built-in defaults
")]
struct Args {
    /// Treatment time level (0-2)
    #[arg(value_name = "TIME")]
    time: Option<u8>,

    /// Treatment temperature level (0-3)
    #[arg(value_name = "TEMP", requires = "time")]
    temp: Option<u8>,

    /// Path to configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Print status as JSON
    #[arg(long)]
    json: bool,

    /// Save default configuration to default location and exit
    #[arg(long)]
    save_config: bool,
}

/// What a single invocation does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Status,
    Treatment { temperature: u8, time: u8 },
}

impl Command {
    fn from_args(args: &Args, config: &HeatConfig) -> Self {
        match args.time {
            None => Command::Status,
            Some(time) => Command::Treatment {
                temperature: args.temp.unwrap_or(config.treatment.default_temperature),
                time,
            },
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code(&e))
        }
    }
}

fn run(args: Args) -> Result<()> {
    if args.save_config {
        let config = HeatConfig::default();
        let path = HeatConfig::default_path();
        config.save(&path).context("Failed to save configuration")?;
        println!("Configuration saved to: {}", path.display());
        return Ok(());
    }

    let config = if let Some(ref path) = args.config {
        HeatConfig::load(Some(expand_path(path))).context("Failed to load configuration")?
    } else {
        HeatConfig::load_or_default()
    };

    let log_level = args
        .log_level
        .as_deref()
        .unwrap_or(&config.general.log_level);
    setup_logging(log_level).context("Failed to setup logging")?;
    debug!("rust-heat-usb v{}", env!("CARGO_PKG_VERSION"));

    let command = Command::from_args(&args, &config);
    debug!("Command: {:?}", command);

    // Validate before touching the device
    let request = match command {
        Command::Treatment { temperature, time } => {
            Some(TreatmentRequest::new(temperature, time)?)
        }
        Command::Status => None,
    };

    let session = open_device(HEAT_DEVICE, HEAT_ENDPOINTS, config.usb.libusb_debug)
        .context("Failed to open device")?;

    match request {
        None => {
            let status = request_status(&session).context("Status request failed")?;
            let output = if args.json {
                render::status_json(&status).context("Failed to serialize status")?
            } else {
                render::status_text(&status)
            };
            println!("{}", output.trim_end());
        }
        Some(request) => {
            let ack = start_treatment(&session, request.temperature(), request.time())
                .context("Failed to start treatment")?;
            info!("Wrote {} bytes to the device", ack.bytes_written);
            println!(
                "Treatment started (temperature level {}, time level {})",
                request.temperature(),
                request.time()
            );
        }
    }

    Ok(())
}

/// Map a failure to the process exit code
///
/// 2 invalid argument, 3 device not found, 4 configuration rejected,
/// 5 transfer failure, 1 anything else.
fn exit_code(err: &anyhow::Error) -> u8 {
    if let Some(err) = err.downcast_ref::<DriverError>() {
        return match err {
            DriverError::Frame(ProtocolError::InvalidArgument { .. }) => 2,
            DriverError::DeviceNotFound { .. } | DriverError::Open { .. } => 3,
            DriverError::Configuration { .. } => 4,
            DriverError::Transport { .. } => 5,
            _ => 1,
        };
    }

    match err.downcast_ref::<ProtocolError>() {
        Some(ProtocolError::InvalidArgument { .. }) => 2,
        _ => 1,
    }
}
