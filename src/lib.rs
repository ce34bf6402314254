// Module declarations for the crate's core components
pub mod array;    // Count-prefixed per-cell register arrays
pub mod bitfield; // Boolean flag and 2-bit alarm decoding
pub mod capture;  // In-memory register image for replaying captures
pub mod client;   // RegisterClient trait and derived reads
pub mod config;   // Configuration management
pub mod error;    // Error handling and types
pub mod options;  // Command line options parsing
pub mod prelude;  // Common imports and types
pub mod profile;  // Battery and DCC50S register tables
pub mod register; // Scalar, version and ASCII register decoding
pub mod rtu;      // Modbus RTU framing over a serial port
pub mod snapshot; // Ordered decoded snapshots and JSON output

// Get the package version from Cargo.toml
const CARGO_PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

use crate::capture::RegisterImage;
use crate::config::Config;
use crate::options::Options;
use crate::profile::{Device, Profile};
use crate::rtu::RtuClient;
use crate::snapshot::SnapshotSet;

use log::{error, info};
use std::io::Write;

/// Opens the link a configured device asks for and wraps it in its profile.
pub fn connect(device: &config::Device) -> anyhow::Result<Device> {
    let client: profile::BoxedClient = match (device.port(), device.capture()) {
        (Some(port), _) => Box::new(RtuClient::open(
            port,
            device.slave(),
            device.baud_rate(),
            device.read_timeout(),
        )?),
        (None, Some(capture)) => Box::new(RegisterImage::from_file(capture)?),
        (None, None) => anyhow::bail!("device {} has no port or capture", device.name()),
    };

    Ok(Device::new(device.model(), client))
}

/// Snapshots every enabled device, optionally just the one named `only`.
///
/// A device that cannot be opened or read is logged and counted, and the
/// rest are still read.
pub fn snapshot_devices(config: &Config, only: Option<&str>) -> anyhow::Result<(SnapshotSet, usize)> {
    if let Some(name) = only {
        if config.device_with_name(name).is_none() {
            anyhow::bail!("no device named {} in configuration", name);
        }
    }

    let mut snapshots = SnapshotSet::default();
    let mut failures = 0;

    for device in config
        .enabled_devices()
        .filter(|device| only.map_or(true, |name| device.name() == name))
    {
        info!("reading {} ({})", device.name(), device.model());
        let result = connect(device).and_then(|mut profile| Ok(profile.snapshot()?));
        match result {
            Ok(snapshot) => {
                info!("{}: {} fields", device.name(), snapshot.len());
                snapshots.push(device.name().to_string(), snapshot);
            }
            Err(err) => {
                error!("{}: {:#}", device.name(), err);
                failures += 1;
            }
        }
    }

    Ok((snapshots, failures))
}

/// Installs the process-wide logger. Fails if one is already installed.
pub fn init_logger(level: &str) -> Result<(), log::SetLoggerError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {} {}] {}",
                chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"),
                record.level(),
                record.module_path().unwrap_or(""),
                record.args()
            )
        })
        .write_style(env_logger::WriteStyle::Never)
        .try_init()
}

/// Main application entry point
pub fn app(options: Options) -> anyhow::Result<()> {
    let config = Config::new(options.config_file.clone())?;

    if let Err(e) = init_logger(config.loglevel()) {
        error!("Failed to install logger: {}", e);
    }
    info!("renogy-snapshot {} using {}", CARGO_PKG_VERSION, options.config_file);
    config.log_summary();

    let (snapshots, failures) = snapshot_devices(&config, options.device.as_deref())?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "{}", snapshots.to_json(4)?)?;

    if failures > 0 {
        anyhow::bail!("{} device(s) could not be read", failures);
    }

    Ok(())
}
