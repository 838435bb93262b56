//! # CRSF Frame Synchronizer
//!
//! Byte-at-a-time state machine that recovers frame boundaries from a raw
//! stream using only the length prefix, validates the CRC and dispatches the
//! payload to the frame registry.
//!
//! ```text
//! AwaitAddress -> AwaitLength -> AwaitType -> AccumulatePayload -> AwaitCrc
//!      ^              |                                               |
//!      +--------------+----------- emit frame or error ---------------+
//! ```
//!
//! There is no scanning for a sync byte. A rejected length byte is re-read as
//! the next frame's address, so a stray byte between two frames costs one
//! error record. Losing a byte inside a frame surfaces as a CRC mismatch.

use serde::Serialize;
use tracing::{debug, trace};

use super::crc::frame_crc;
use super::protocol::*;
use super::registry::FrameRegistry;

/// Synchronizer state, named after what the next byte is expected to be
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    AwaitAddress,
    AwaitLength,
    AwaitType,
    AccumulatePayload,
    AwaitCrc,
}

/// Decoding options consumed by the synchronizer
#[derive(Debug, Clone, Default)]
pub struct DecoderOptions {
    /// Destination addresses to decode; empty means every address.
    /// Frames to other addresses are passed through as `Unrecognized`.
    pub address_filter: Vec<u8>,

    /// Frame types and their decoders
    pub registry: FrameRegistry,
}

/// A complete frame as read from the wire, before CRC check and dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawFrame<'a> {
    pub address: u8,
    pub declared_length: u8,
    pub frame_type: u8,
    pub payload: &'a [u8],
    pub crc: u8,
}

impl RawFrame<'_> {
    /// CRC over type + payload
    pub fn computed_crc(&self) -> u8 {
        frame_crc(self.frame_type, self.payload)
    }
}

/// Resumable frame synchronizer for one byte stream
#[derive(Debug, Clone)]
pub struct FrameSynchronizer {
    options: DecoderOptions,
    state: SyncState,

    /// Stream offset of the next byte
    position: u64,

    /// Stream offset of the current frame's address byte
    frame_start: u64,

    address: u8,
    declared_length: u8,
    frame_type: u8,
    payload: Vec<u8>,
}

impl Default for FrameSynchronizer {
    fn default() -> Self {
        Self::new(DecoderOptions::default())
    }
}

impl FrameSynchronizer {
    pub fn new(options: DecoderOptions) -> Self {
        Self {
            options,
            state: SyncState::AwaitAddress,
            position: 0,
            frame_start: 0,
            address: 0,
            declared_length: 0,
            frame_type: 0,
            payload: Vec::with_capacity(CRSF_MAX_PAYLOAD_SIZE),
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    /// Number of bytes pushed since creation or the last [`reset`](Self::reset)
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn options(&self) -> &DecoderOptions {
        &self.options
    }

    /// Declared total size of the frame in progress, once its length is known
    pub fn expected_frame_len(&self) -> Option<usize> {
        match self.state {
            SyncState::AwaitAddress | SyncState::AwaitLength => None,
            _ => Some(self.declared_length as usize + 2),
        }
    }

    /// Span of the bytes buffered for a frame that is not yet complete
    pub fn pending(&self) -> Option<ByteSpan> {
        if self.state == SyncState::AwaitAddress {
            return None;
        }
        Some(ByteSpan::new(self.frame_start, (self.position - self.frame_start) as usize))
    }

    /// Drop any partial frame and restart offsets at zero
    pub fn reset(&mut self) {
        self.state = SyncState::AwaitAddress;
        self.position = 0;
        self.frame_start = 0;
        self.payload.clear();
    }

    /// Drop any partial frame, keeping the stream offset
    pub fn discard_pending(&mut self) {
        self.state = SyncState::AwaitAddress;
        self.payload.clear();
    }

    /// Feed one byte. Returns a result when the byte completes a frame or
    /// causes a header to be rejected.
    pub fn push(&mut self, byte: u8) -> Option<DecodedFrame> {
        let offset = self.position;
        self.position += 1;

        match self.state {
            SyncState::AwaitAddress => {
                self.start_frame(offset, byte);
                None
            }

            SyncState::AwaitLength => {
                if (CRSF_MIN_DECLARED_LENGTH..=CRSF_MAX_DECLARED_LENGTH).contains(&byte) {
                    self.declared_length = byte;
                    self.state = SyncState::AwaitType;
                    return None;
                }

                let error = if byte < CRSF_MIN_DECLARED_LENGTH {
                    FrameError::FrameTooShort { declared: byte }
                } else {
                    FrameError::FrameTooLong { declared: byte, max: CRSF_MAX_DECLARED_LENGTH }
                };
                debug!(
                    "Rejected frame header at offset {}: {}, resyncing on next byte",
                    self.frame_start, error
                );

                let rejected = DecodedFrame {
                    address: self.address,
                    frame_type: None,
                    span: ByteSpan::new(self.frame_start, 1),
                    kind: FrameKind::Invalid(error),
                };

                // The rejected length byte is the next candidate address
                self.start_frame(offset, byte);
                Some(rejected)
            }

            SyncState::AwaitType => {
                self.frame_type = byte;
                self.payload.clear();
                self.state = if self.declared_length > CRSF_MIN_DECLARED_LENGTH {
                    SyncState::AccumulatePayload
                } else {
                    SyncState::AwaitCrc
                };
                None
            }

            SyncState::AccumulatePayload => {
                self.payload.push(byte);
                if self.payload.len() == (self.declared_length - CRSF_MIN_DECLARED_LENGTH) as usize {
                    self.state = SyncState::AwaitCrc;
                }
                None
            }

            SyncState::AwaitCrc => {
                self.state = SyncState::AwaitAddress;
                Some(self.complete_frame(byte, offset))
            }
        }
    }

    fn start_frame(&mut self, offset: u64, address: u8) {
        self.frame_start = offset;
        self.address = address;
        self.state = SyncState::AwaitLength;
    }

    fn complete_frame(&self, crc: u8, crc_offset: u64) -> DecodedFrame {
        let raw = RawFrame {
            address: self.address,
            declared_length: self.declared_length,
            frame_type: self.frame_type,
            payload: &self.payload,
            crc,
        };
        let span = ByteSpan::new(self.frame_start, (crc_offset - self.frame_start + 1) as usize);

        DecodedFrame {
            address: raw.address,
            frame_type: Some(raw.frame_type),
            span,
            kind: self.classify(&raw, span),
        }
    }

    fn accepts_address(&self, address: u8) -> bool {
        self.options.address_filter.is_empty() || self.options.address_filter.contains(&address)
    }

    fn classify(&self, raw: &RawFrame<'_>, span: ByteSpan) -> FrameKind {
        let computed = raw.computed_crc();
        if computed != raw.crc {
            debug!(
                "CRC mismatch for frame type 0x{:02X} at offset {}: computed 0x{:02X}, received 0x{:02X}",
                raw.frame_type, span.offset, computed, raw.crc
            );
            return FrameKind::Invalid(FrameError::CrcMismatch { computed, received: raw.crc });
        }

        if !self.accepts_address(raw.address) {
            trace!("Skipping frame to filtered address 0x{:02X}", raw.address);
            return FrameKind::Unrecognized { payload: raw.payload.to_vec() };
        }

        let Some(desc) = self.options.registry.lookup(raw.frame_type) else {
            trace!("No decoder for frame type 0x{:02X}", raw.frame_type);
            return FrameKind::Unrecognized { payload: raw.payload.to_vec() };
        };

        match desc.decode_payload(raw.payload) {
            Ok(kind) => kind,
            Err(e) => {
                debug!("{} frame at offset {} failed to decode: {}", desc.name, span.offset, e);
                FrameKind::Invalid(FrameError::PayloadDecode(e))
            }
        }
    }
}
