//! # CRSF Protocol Module
//!
//! Decoder for the Crossfire (CRSF) serial protocol used by TBS Crossfire and
//! ExpressLRS links.
//!
//! This module handles:
//! - CRC8-DVB-S2 checksum calculation
//! - Frame synchronization on an unframed byte stream
//! - Payload decoding for every registered frame type
//! - Stream offsets for every result
//!
//! It performs no I/O; bytes come from the caller.

pub mod bits;
pub mod crc;
pub mod decoder;
pub mod protocol;
pub mod registry;
pub mod stream;
pub mod sync;

#[cfg(test)]
pub(crate) mod testutil;

pub use protocol::{ByteSpan, DecodedFrame, FrameError, FrameKind, PayloadError};
pub use registry::{frame_type_name, FrameDescriptor, FrameRegistry, PayloadLength};
pub use stream::{DecodeReport, Incomplete, StreamDecoder, StreamStats};
pub use sync::{DecoderOptions, FrameSynchronizer, SyncState};
