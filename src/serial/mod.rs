//! # Serial Communication Module
//!
//! Opens the serial device a CRSF link is captured from.
//!
//! This module handles:
//! - Opening the serial port as 8N1 at the configured baud rate
//! - Falling back through common device paths
//! - Handing the opened port to the capture loop as an async reader

use crate::config::SerialConfig;
use crate::error::{CrsfError, Result};
use tokio_serial::SerialPortBuilderExt;
use tracing::{debug, info, warn};

/// Standard CRSF baud rate (420,000 baud)
pub const CRSF_BAUD_RATE: u32 = 420_000;

/// Device paths tried after the configured one (in order of preference)
const DEFAULT_DEVICE_PATHS: &[&str] = &[
    "/dev/ttyACM0", // USB CDC devices
    "/dev/ttyUSB0", // USB-to-serial adapters
];

/// Serial port carrying a CRSF byte stream
pub struct CrsfSerial {
    /// Serial port handle
    port: tokio_serial::SerialStream,
    /// Device path (e.g., /dev/ttyACM0)
    device_path: String,
    baud_rate: u32,
}

impl std::fmt::Debug for CrsfSerial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrsfSerial")
            .field("device_path", &self.device_path)
            .field("baud_rate", &self.baud_rate)
            .finish_non_exhaustive()
    }
}

/// Configured path first, then the defaults it does not already name
fn candidate_paths(configured: &str) -> Vec<&str> {
    let mut paths = vec![configured];
    paths.extend(DEFAULT_DEVICE_PATHS.iter().copied().filter(|p| *p != configured));
    paths
}

impl CrsfSerial {
    /// Open the device named in the `[serial]` section
    ///
    /// Falls back to the default device paths when the configured one
    /// cannot be opened.
    ///
    /// # Errors
    ///
    /// Returns [`CrsfError::SerialPortNotFound`] if no candidate opens
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use crsf_decoder::config::Config;
    /// use crsf_decoder::serial::CrsfSerial;
    ///
    /// #[tokio::main]
    /// async fn main() -> anyhow::Result<()> {
    ///     let config = Config::default();
    ///     let serial = CrsfSerial::open(&config.serial)?;
    ///     println!("Capturing from {}", serial.device_path());
    ///     Ok(())
    /// }
    /// ```
    pub fn open(config: &SerialConfig) -> Result<Self> {
        Self::open_with_paths(&candidate_paths(&config.port), config.baud_rate)
    }

    /// Try each path in turn and keep the first that opens
    ///
    /// # Arguments
    ///
    /// * `paths` - Device paths to try (e.g., &["/dev/ttyACM0"])
    /// * `baud_rate` - Line speed
    pub fn open_with_paths(paths: &[&str], baud_rate: u32) -> Result<Self> {
        for path in paths {
            debug!("Trying to open serial port: {}", path);

            match Self::open_port(path, baud_rate) {
                Ok(port) => {
                    info!("Opened CRSF device at {} ({} baud)", path, baud_rate);
                    return Ok(Self {
                        port,
                        device_path: path.to_string(),
                        baud_rate,
                    });
                }
                Err(e) => {
                    warn!("Failed to open {}: {}", path, e);
                    continue;
                }
            }
        }

        Err(CrsfError::SerialPortNotFound(paths.join(", ")))
    }

    /// Open a specific serial port as 8N1 without flow control
    fn open_port(path: &str, baud_rate: u32) -> Result<tokio_serial::SerialStream> {
        let port = tokio_serial::new(path, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| CrsfError::Serial(format!("Failed to open {}: {}", path, e)))?;

        Ok(port)
    }

    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    /// Give up the wrapper and keep the async port for reading
    pub fn into_stream(self) -> tokio_serial::SerialStream {
        self.port
    }
}
