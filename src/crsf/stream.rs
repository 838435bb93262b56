//! # CRSF Stream Decoder
//!
//! Top-level entry point for decoding a byte stream delivered in chunks.
//!
//! ```
//! use crsf_decoder::crsf::stream::StreamDecoder;
//!
//! let mut decoder = StreamDecoder::default();
//! // Heartbeat frame split across two reads
//! let first = decoder.feed(&[0xC8, 0x04, 0x0B]).count();
//! assert_eq!(first, 0);
//! let frames: Vec<_> = decoder.feed(&[0x00, 0xEE, 0xC8]).collect();
//! assert_eq!(frames.len(), 1);
//! assert!(frames[0].is_valid());
//! assert!(decoder.finish().is_none());
//! ```

use serde::Serialize;
use tracing::debug;

use super::protocol::*;
use super::sync::{DecoderOptions, FrameSynchronizer, SyncState};

/// A frame cut off by the end of the input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Incomplete {
    /// Bytes buffered for the partial frame
    pub span: ByteSpan,

    /// What the synchronizer was waiting for
    pub state: SyncState,

    /// Full frame size, once the length byte has been read
    pub expected_len: Option<usize>,
}

/// Running totals for one stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StreamStats {
    /// Bytes fed so far
    pub bytes: u64,

    /// Frames decoded into a typed variant
    pub decoded: u64,

    /// Well-formed frames without a decoder, or filtered by address
    pub unrecognized: u64,

    /// Rejected headers, CRC mismatches and payload decode errors
    pub invalid: u64,
}

impl StreamStats {
    fn record(&mut self, frame: &DecodedFrame) {
        match frame.kind {
            FrameKind::Invalid(_) => self.invalid += 1,
            FrameKind::Unrecognized { .. } => self.unrecognized += 1,
            _ => self.decoded += 1,
        }
    }

    /// Every emitted record
    pub fn total(&self) -> u64 {
        self.decoded + self.unrecognized + self.invalid
    }
}

/// Result of decoding a complete buffer in one call
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeReport {
    pub frames: Vec<DecodedFrame>,
    pub incomplete: Option<Incomplete>,
}

/// Decoder for a single CRSF byte stream
///
/// Independent streams need independent decoders; an instance holds the
/// partial frame of its own stream between calls to [`feed`](Self::feed).
#[derive(Debug, Clone, Default)]
pub struct StreamDecoder {
    sync: FrameSynchronizer,
    stats: StreamStats,
}

impl StreamDecoder {
    pub fn new(options: DecoderOptions) -> Self {
        Self {
            sync: FrameSynchronizer::new(options),
            stats: StreamStats::default(),
        }
    }

    /// Feed the next chunk of the stream and iterate over the results it
    /// completes.
    ///
    /// Decoding is lazy: bytes are consumed as the iterator advances. Run it
    /// to the end before the next `feed`, or the unconsumed tail of the
    /// chunk is never seen by the decoder.
    pub fn feed<'a>(&'a mut self, chunk: &'a [u8]) -> Frames<'a> {
        Frames { decoder: self, chunk, pos: 0 }
    }

    /// Partial frame buffered right now, if any. More bytes may complete it.
    pub fn pending(&self) -> Option<Incomplete> {
        self.sync.pending().map(|span| Incomplete {
            span,
            state: self.sync.state(),
            expected_len: self.sync.expected_frame_len(),
        })
    }

    /// Mark the end of input. Returns the frame that was cut off, if any, and
    /// leaves the decoder ready for bytes that continue the same offsets.
    pub fn finish(&mut self) -> Option<Incomplete> {
        let incomplete = self.pending();
        if let Some(ref partial) = incomplete {
            debug!(
                "Input ended inside a frame at offset {} ({} bytes buffered, state {:?})",
                partial.span.offset, partial.span.len, partial.state
            );
        }
        self.sync.discard_pending();
        incomplete
    }

    /// Decode a whole buffer: feed it, then finish
    pub fn decode_all(&mut self, bytes: &[u8]) -> DecodeReport {
        let frames = self.feed(bytes).collect();
        let incomplete = self.finish();
        DecodeReport { frames, incomplete }
    }

    /// Start a new stream: drop partial state, offsets and statistics
    pub fn reset(&mut self) {
        self.sync.reset();
        self.stats = StreamStats::default();
    }

    pub fn stats(&self) -> StreamStats {
        self.stats
    }

    pub fn options(&self) -> &DecoderOptions {
        self.sync.options()
    }
}

/// Lazy iterator over the results completed by one chunk
#[derive(Debug)]
pub struct Frames<'a> {
    decoder: &'a mut StreamDecoder,
    chunk: &'a [u8],
    pos: usize,
}

impl Frames<'_> {
    /// Bytes of the chunk not yet consumed
    pub fn remaining(&self) -> usize {
        self.chunk.len() - self.pos
    }
}

impl Iterator for Frames<'_> {
    type Item = DecodedFrame;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(&byte) = self.chunk.get(self.pos) {
            self.pos += 1;
            self.decoder.stats.bytes += 1;

            if let Some(frame) = self.decoder.sync.push(byte) {
                self.decoder.stats.record(&frame);
                return Some(frame);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        // At most one result per byte
        (0, Some(self.remaining()))
    }
}
