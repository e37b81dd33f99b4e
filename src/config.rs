//! Connection settings.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::errors::ConfigError;
use crate::protocol::{DEFAULT_PROTOCOL_VERSION, DEFAULT_TIMEOUT_MS, POLL_PERIOD_MS};

/// Everything needed to open and drive one SSP unit.
///
/// Can be built in code with [SspConfig::new] or loaded from TOML:
///
/// ```toml
/// port_name = "/dev/ttyACM0"
/// poll_period_ms = 200
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct SspConfig {
    #[serde(default)]
    pub port_name: String,
    #[serde(default = "SspConfig::default_baud_rate")]
    pub baud_rate: u32,
    #[serde(default)]
    pub address: u8,
    #[serde(default = "SspConfig::default_read_timeout_ms")]
    pub read_timeout_ms: u64,
    #[serde(default = "SspConfig::default_poll_period_ms")]
    pub poll_period_ms: u64,
    #[serde(default = "SspConfig::default_protocol_version")]
    pub protocol_version: u8,
}

impl SspConfig {
    fn default_baud_rate() -> u32 {
        9600
    }
    fn default_read_timeout_ms() -> u64 {
        DEFAULT_TIMEOUT_MS
    }
    fn default_poll_period_ms() -> u64 {
        POLL_PERIOD_MS
    }
    fn default_protocol_version() -> u8 {
        DEFAULT_PROTOCOL_VERSION
    }

    /// Default settings for the unit on `port_name`.
    pub fn new(port_name: impl Into<String>) -> Self {
        SspConfig {
            port_name: port_name.into(),
            baud_rate: Self::default_baud_rate(),
            address: 0,
            read_timeout_ms: Self::default_read_timeout_ms(),
            poll_period_ms: Self::default_poll_period_ms(),
            protocol_version: Self::default_protocol_version(),
        }
    }

    pub fn from_toml_str(txt: &str) -> Result<Self, ConfigError> {
        let cfg: SspConfig = toml::from_str(txt)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let txt = fs::read_to_string(path)?;
        Self::from_toml_str(&txt)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port_name.trim().is_empty() {
            return Err(ConfigError::Missing("port_name"));
        }
        if self.baud_rate == 0 {
            return Err(ConfigError::Invalid {
                field: "baud_rate",
                reason: "must be non-zero".to_string(),
            });
        }
        if self.address > 0x7F {
            return Err(ConfigError::Invalid {
                field: "address",
                reason: format!("{} does not fit in 7 bits", self.address),
            });
        }
        if self.read_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "read_timeout_ms",
                reason: "must be non-zero".to_string(),
            });
        }
        if self.poll_period_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "poll_period_ms",
                reason: "must be non-zero".to_string(),
            });
        }
        Ok(())
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn poll_period(&self) -> Duration {
        Duration::from_millis(self.poll_period_ms)
    }
}
