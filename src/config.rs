use crate::file_error;
use crate::profile::Model;

use anyhow::{anyhow, bail, Result};
use log::info;
use serde::Deserialize;
use serde_with::{serde_as, DurationMilliSeconds};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub devices: Vec<Device>,

    #[serde(default = "Config::default_loglevel")]
    pub loglevel: String,
}

// Device {{{
#[serde_as]
#[derive(Clone, Debug, Deserialize)]
pub struct Device {
    #[serde(default = "Config::default_enabled")]
    pub enabled: bool,

    pub name: String,
    pub model: Model,

    /// Serial port the device hangs off, e.g. `/dev/ttyUSB0`.
    pub port: Option<String>,
    /// Register capture to replay instead of talking to hardware.
    pub capture: Option<PathBuf>,

    pub slave: u8,
    #[serde(default = "Config::default_baud_rate")]
    pub baud_rate: u32,

    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(default = "Config::default_read_timeout")]
    pub read_timeout: Duration,
}

impl Device {
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model(&self) -> Model {
        self.model
    }

    pub fn port(&self) -> Option<&str> {
        self.port.as_deref()
    }

    pub fn capture(&self) -> Option<&PathBuf> {
        self.capture.as_ref()
    }

    pub fn slave(&self) -> u8 {
        self.slave
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    fn source(&self) -> String {
        match (&self.port, &self.capture) {
            (Some(port), _) => port.clone(),
            (None, Some(capture)) => format!("capture {}", capture.display()),
            (None, None) => "nothing".to_string(),
        }
    }
} // }}}

impl Config {
    pub fn new(file: String) -> Result<Self> {
        info!("Reading configuration from {}", file);
        let content = std::fs::read_to_string(&file)
            .map_err(|err| anyhow!("config.rs:error reading {}: {}", file, err))?;

        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn enabled_devices(&self) -> impl Iterator<Item = &Device> {
        self.devices.iter().filter(|d| d.enabled())
    }

    pub fn device_with_name(&self, name: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.name() == name)
    }

    pub fn loglevel(&self) -> &str {
        &self.loglevel
    }

    pub fn log_summary(&self) {
        info!("Configuration loaded successfully:");
        info!(
            "  Devices: {} configured, {} enabled",
            self.devices.len(),
            self.enabled_devices().count()
        );
        for (i, device) in self.devices.iter().enumerate() {
            info!("    Device[{}]: {}", i, device.name);
            info!("      Enabled: {}", device.enabled);
            info!("      Model: {}", device.model);
            info!("      Source: {}", device.source());
            info!("      Slave: {}", device.slave);
            info!("      Baud Rate: {}", device.baud_rate);
            info!("      Read Timeout: {}ms", device.read_timeout.as_millis());
        }
        info!("  Log Level: {}", self.loglevel);
    }

    fn validate(&self) -> Result<()> {
        if self.devices.is_empty() {
            bail!("no devices configured");
        }

        let mut names = HashSet::new();
        for (i, device) in self.devices.iter().enumerate() {
            if device.name.is_empty() {
                bail!("device[{}].name cannot be empty", i);
            }
            if !names.insert(device.name.as_str()) {
                return Err(file_error!("duplicate device name {}", device.name));
            }
            match (&device.port, &device.capture) {
                (Some(_), Some(_)) => {
                    bail!("device {} has both a port and a capture", device.name)
                }
                (None, None) => bail!("device {} needs a port or a capture", device.name),
                _ => {}
            }
            if !(1..=247).contains(&device.slave) {
                bail!("device {}: slave must be between 1 and 247", device.name);
            }
            if device.baud_rate == 0 {
                return Err(file_error!("device {}: invalid baud rate 0", device.name));
            }
            if device.read_timeout.is_zero() {
                return Err(file_error!("device {}: invalid read timeout 0", device.name));
            }
        }

        Ok(())
    }

    fn default_enabled() -> bool {
        true
    }

    fn default_loglevel() -> String {
        "info".to_string()
    }

    fn default_baud_rate() -> u32 {
        9600
    }

    fn default_read_timeout() -> Duration {
        Duration::from_millis(200)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    const GOOD: &str = r#"
loglevel: debug
devices:
  - name: house
    model: battery
    port: /dev/ttyUSB0
    slave: 48
  - name: charger
    model: dcc50s
    capture: charger.yaml
    slave: 1
    baud_rate: 19200
    read_timeout: 500
    enabled: false
"#;

    #[test]
    fn parses_with_defaults() -> Result<()> {
        let config = Config::from_yaml(GOOD)?;
        assert_eq!(config.loglevel(), "debug");
        assert_eq!(config.devices().len(), 2);

        let house = config.device_with_name("house").ok_or_else(|| anyhow!("no house"))?;
        assert!(house.enabled());
        assert_eq!(house.model(), Model::Battery);
        assert_eq!(house.port(), Some("/dev/ttyUSB0"));
        assert_eq!(house.baud_rate(), 9600);
        assert_eq!(house.read_timeout(), Duration::from_millis(200));

        let charger = config.device_with_name("charger").ok_or_else(|| anyhow!("no charger"))?;
        assert!(!charger.enabled());
        assert_eq!(charger.model(), Model::Dcc50s);
        assert_eq!(charger.capture(), Some(&PathBuf::from("charger.yaml")));
        assert_eq!(charger.read_timeout(), Duration::from_millis(500));

        assert_eq!(config.enabled_devices().count(), 1);
        Ok(())
    }

    #[test]
    fn reads_file() -> Result<()> {
        let file = NamedTempFile::new()?;
        std::fs::write(file.path(), GOOD)?;
        let config = Config::new(file.path().display().to_string())?;
        assert_eq!(config.devices().len(), 2);
        Ok(())
    }

    #[test]
    fn missing_file() {
        assert!(Config::new("/nonexistent/config.yaml".to_string()).is_err());
    }

    fn rejects(yaml: &str, needle: &str) {
        let err = Config::from_yaml(yaml).unwrap_err().to_string();
        assert!(err.contains(needle), "{:?} does not mention {:?}", err, needle);
    }

    #[test]
    fn validation() {
        rejects("devices: []", "no devices");
        rejects(
            "devices:\n  - {name: '', model: battery, port: /dev/a, slave: 1}",
            "cannot be empty",
        );
        rejects(
            "devices:\n  - {name: a, model: battery, port: /dev/a, slave: 1}\n  - {name: a, model: dcc50s, port: /dev/b, slave: 2}",
            "duplicate",
        );
        rejects(
            "devices:\n  - {name: a, model: battery, port: /dev/a, capture: a.yaml, slave: 1}",
            "both",
        );
        rejects("devices:\n  - {name: a, model: battery, slave: 1}", "needs a port");
        rejects(
            "devices:\n  - {name: a, model: battery, port: /dev/a, slave: 0}",
            "between 1 and 247",
        );
        rejects(
            "devices:\n  - {name: a, model: battery, port: /dev/a, slave: 248}",
            "between 1 and 247",
        );
        rejects(
            "devices:\n  - {name: a, model: battery, port: /dev/a, slave: 1, baud_rate: 0}",
            "baud rate",
        );
        rejects(
            "devices:\n  - {name: a, model: battery, port: /dev/a, slave: 1, read_timeout: 0}",
            "read timeout",
        );
    }

    #[test]
    fn unknown_model() {
        assert!(Config::from_yaml("devices:\n  - {name: a, model: inverter, port: /dev/a, slave: 1}").is_err());
    }
}
