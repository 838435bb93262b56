//! # Output Module
//!
//! Writes decoded frames as JSON Lines or as human-readable text.
//!
//! JSONL records carry a wall-clock timestamp next to the frame's stream
//! offsets:
//!
//! ```json
//! {"timestamp":"2026-10-18T09:12:44.120Z","type_name":"Heartbeat","address":200,"frame_type":11,"span":{"offset":0,"len":6},"kind":{"kind":"heartbeat","data":{"origin":238}}}
//! ```

pub mod text;
pub mod units;

use std::io::Write;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::OutputConfig;
use crate::crsf::protocol::{DecodedFrame, FrameKind};
use crate::crsf::stream::Incomplete;
use crate::error::Result;
use units::ChannelUnits;

/// Output record format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One JSON object per line
    #[default]
    Jsonl,

    /// One human-readable line per frame
    Text,
}

/// Destination for decoded frames
pub trait FrameSink {
    /// Write one decoded frame, unless the sink filters it out
    fn write_frame(&mut self, frame: &DecodedFrame) -> Result<()>;

    /// Report a frame cut off by the end of the input
    fn write_incomplete(&mut self, incomplete: &Incomplete) -> Result<()>;

    fn flush(&mut self) -> Result<()>;
}

/// Which non-decoded records reach the output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordFilter {
    pub include_invalid: bool,
    pub include_unrecognized: bool,
}

impl Default for RecordFilter {
    fn default() -> Self {
        Self {
            include_invalid: true,
            include_unrecognized: true,
        }
    }
}

impl RecordFilter {
    pub fn accepts(&self, frame: &DecodedFrame) -> bool {
        match frame.kind {
            FrameKind::Invalid(_) => self.include_invalid,
            FrameKind::Unrecognized { .. } => self.include_unrecognized,
            _ => true,
        }
    }
}

impl From<&OutputConfig> for RecordFilter {
    fn from(config: &OutputConfig) -> Self {
        Self {
            include_invalid: config.include_invalid,
            include_unrecognized: config.include_unrecognized,
        }
    }
}

#[derive(Serialize)]
struct FrameRecord<'a> {
    timestamp: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    type_name: Option<&'static str>,

    #[serde(flatten)]
    frame: &'a DecodedFrame,

    /// RC channels in the configured unit; omitted for raw output
    #[serde(skip_serializing_if = "Option::is_none")]
    channels: Option<Vec<f32>>,
}

#[derive(Serialize)]
struct IncompleteRecord<'a> {
    timestamp: String,
    incomplete: &'a Incomplete,
}

/// JSON Lines writer
pub struct JsonlSink<W: Write> {
    writer: W,
    units: ChannelUnits,
    filter: RecordFilter,
}

impl<W: Write> JsonlSink<W> {
    pub fn new(writer: W, units: ChannelUnits, filter: RecordFilter) -> Self {
        Self { writer, units, filter }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn converted_channels(&self, frame: &DecodedFrame) -> Option<Vec<f32>> {
        match (&frame.kind, self.units) {
            (_, ChannelUnits::Raw) => None,
            (FrameKind::RcChannelsPacked(rc), units) => {
                Some(rc.channels.iter().map(|&raw| units.convert(raw)).collect())
            }
            _ => None,
        }
    }
}

impl<W: Write> FrameSink for JsonlSink<W> {
    fn write_frame(&mut self, frame: &DecodedFrame) -> Result<()> {
        if !self.filter.accepts(frame) {
            return Ok(());
        }

        let record = FrameRecord {
            timestamp: Utc::now().to_rfc3339(),
            type_name: frame.type_name(),
            frame,
            channels: self.converted_channels(frame),
        };
        serde_json::to_writer(&mut self.writer, &record)?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_incomplete(&mut self, incomplete: &Incomplete) -> Result<()> {
        let record = IncompleteRecord {
            timestamp: Utc::now().to_rfc3339(),
            incomplete,
        };
        serde_json::to_writer(&mut self.writer, &record)?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Human-readable line writer
pub struct TextSink<W: Write> {
    writer: W,
    units: ChannelUnits,
    filter: RecordFilter,
}

impl<W: Write> TextSink<W> {
    pub fn new(writer: W, units: ChannelUnits, filter: RecordFilter) -> Self {
        Self { writer, units, filter }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> FrameSink for TextSink<W> {
    fn write_frame(&mut self, frame: &DecodedFrame) -> Result<()> {
        if self.filter.accepts(frame) {
            writeln!(self.writer, "{}", text::format_frame(frame, self.units))?;
        }
        Ok(())
    }

    fn write_incomplete(&mut self, incomplete: &Incomplete) -> Result<()> {
        writeln!(self.writer, "{}", text::format_incomplete(incomplete))?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Build the sink selected by the `[output]` section
pub fn build_sink<W>(config: &OutputConfig, writer: W) -> Box<dyn FrameSink + Send>
where
    W: Write + Send + 'static,
{
    let filter = RecordFilter::from(config);
    match config.format {
        OutputFormat::Jsonl => Box::new(JsonlSink::new(writer, config.channel_units, filter)),
        OutputFormat::Text => Box::new(TextSink::new(writer, config.channel_units, filter)),
    }
}
