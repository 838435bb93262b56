//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every section and every field is optional; missing values fall back to
//! the defaults below.
//!
//! ```toml
//! [serial]
//! port = "/dev/ttyUSB0"
//! baud_rate = 420000
//!
//! [decoder]
//! address_filter = [0xC8, 0xEA]
//!
//! [output]
//! format = "text"
//! channel_units = "us"
//!
//! [logging]
//! level = "debug"
//! ```

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::crsf::sync::DecoderOptions;
use crate::error::{CrsfError, Result};
use crate::output::units::ChannelUnits;
use crate::output::OutputFormat;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub serial: SerialConfig,

    #[serde(default)]
    pub decoder: DecoderConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Serial port configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SerialConfig {
    #[serde(default = "default_serial_port")]
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    #[serde(default = "default_read_buffer_size")]
    pub read_buffer_size: usize,
}

/// Decoder configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct DecoderConfig {
    /// Destination addresses to decode; empty decodes every address
    #[serde(default)]
    pub address_filter: Vec<u8>,
}

/// Output configuration
#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,

    #[serde(default)]
    pub channel_units: ChannelUnits,

    #[serde(default = "default_true")]
    pub include_invalid: bool,

    #[serde(default = "default_true")]
    pub include_unrecognized: bool,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Write logs to this file instead of stderr
    #[serde(default)]
    pub file: Option<PathBuf>,
}

// Default value functions
fn default_serial_port() -> String { "/dev/ttyACM0".to_string() }
fn default_baud_rate() -> u32 { 420000 }
fn default_read_buffer_size() -> usize { 256 }

fn default_true() -> bool { true }

fn default_log_level() -> String { "info".to_string() }

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_serial_port(),
            baud_rate: default_baud_rate(),
            read_buffer_size: default_read_buffer_size(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            channel_units: ChannelUnits::default(),
            include_invalid: default_true(),
            include_unrecognized: default_true(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Baud rates used by CRSF devices
const SUPPORTED_BAUD_RATES: [u32; 7] = [115200, 400000, 416666, 420000, 921600, 1870000, 3750000];

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

fn invalid(message: impl std::fmt::Display) -> CrsfError {
    CrsfError::Config(toml::de::Error::custom(message))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use crsf_decoder::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Decoder options derived from the `[decoder]` section
    pub fn decoder_options(&self) -> DecoderOptions {
        DecoderOptions {
            address_filter: self.decoder.address_filter.clone(),
            ..DecoderOptions::default()
        }
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if self.serial.port.is_empty() {
            return Err(invalid("serial port cannot be empty"));
        }

        if !SUPPORTED_BAUD_RATES.contains(&self.serial.baud_rate) {
            return Err(invalid(format!(
                "baud_rate must be one of: {}",
                SUPPORTED_BAUD_RATES
                    .iter()
                    .map(|b| b.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        }

        if self.serial.read_buffer_size == 0 || self.serial.read_buffer_size > 4096 {
            return Err(invalid("read_buffer_size must be between 1 and 4096"));
        }

        // Duplicates are harmless but almost certainly a typo
        let mut seen = [false; 256];
        for &address in &self.decoder.address_filter {
            if std::mem::replace(&mut seen[address as usize], true) {
                return Err(invalid(format!(
                    "address_filter lists 0x{:02X} more than once",
                    address
                )));
            }
        }

        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(invalid("logging level must be one of: trace, debug, info, warn, error"));
        }

        if let Some(file) = &self.logging.file {
            if file.as_os_str().is_empty() || file.file_name().is_none() {
                return Err(invalid("logging file must name a file"));
            }
        }

        Ok(())
    }
}
