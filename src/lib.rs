//! # CRSF Decoder Library
//!
//! Decode CRSF (Crossfire) byte streams into typed, position-tagged frames.
//!
//! The [`crsf`] module holds the protocol core: CRC, frame synchronization,
//! and per-type payload decoders. Everything else wires it to serial ports,
//! capture files, configuration, and output sinks.

pub mod capture;
pub mod config;
pub mod crsf;
pub mod error;
pub mod output;
pub mod serial;
