//! # Capture Loop
//!
//! Moves bytes from an async source through a [`StreamDecoder`] into a
//! [`FrameSink`] until the source reaches end of input.

use bytes::BytesMut;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, trace};

use crate::crsf::stream::{Incomplete, StreamDecoder, StreamStats};
use crate::error::Result;
use crate::output::FrameSink;

/// Summary of one capture run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CaptureStats {
    /// Number of reads that returned data
    pub reads: u64,

    pub stream: StreamStats,

    /// Frame cut off by the end of input
    pub incomplete: Option<Incomplete>,
}

/// Decode everything `reader` produces
///
/// Each read is decoded and written to `sink` before the next read is
/// issued. At end of input the decoder is finished and a trailing partial
/// frame, if any, is reported to the sink.
///
/// # Errors
///
/// Returns the first read or sink error. Frames already written stay
/// written.
pub async fn pump<R>(
    reader: &mut R,
    buffer_size: usize,
    decoder: &mut StreamDecoder,
    sink: &mut dyn FrameSink,
) -> Result<CaptureStats>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut buffer = BytesMut::with_capacity(buffer_size.max(1));
    let mut reads: u64 = 0;

    loop {
        buffer.clear();
        let n = reader.read_buf(&mut buffer).await?;
        if n == 0 {
            debug!("End of input after {} reads", reads);
            break;
        }
        reads += 1;
        trace!("Read {} bytes", n);

        for frame in decoder.feed(&buffer) {
            sink.write_frame(&frame)?;
        }
        sink.flush()?;
    }

    let incomplete = decoder.finish();
    if let Some(ref partial) = incomplete {
        sink.write_incomplete(partial)?;
    }
    sink.flush()?;

    Ok(CaptureStats {
        reads,
        stream: decoder.stats(),
        incomplete,
    })
}
