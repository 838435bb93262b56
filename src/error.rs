//! # Error Types
//!
//! Application error types for the CRSF decoder using `thiserror`.
//!
//! Frame-level problems are not errors at this level: they are reported in
//! the decoded stream as [`FrameKind::Invalid`](crate::crsf::FrameKind::Invalid).

use thiserror::Error;

/// Main error type for the CRSF decoder
#[derive(Debug, Error)]
pub enum CrsfError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serial port errors
    #[error("Serial port error: {0}")]
    Serial(String),

    /// None of the candidate serial devices could be opened
    #[error("No serial device found (tried: {0})")]
    SerialPortNotFound(String),

    /// Output serialization errors
    #[error("Output error: {0}")]
    Output(#[from] serde_json::Error),
}

/// Result type alias for the CRSF decoder
pub type Result<T> = std::result::Result<T, CrsfError>;
