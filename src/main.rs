//! # CRSF Decoder
//!
//! Decode a CRSF (Crossfire) byte stream from a serial port or a capture
//! file and print every frame, valid or not.
//!
//! # Examples
//!
//! Live decode from the configured serial device:
//! ```bash
//! crsf-decoder --config config/default.toml
//! ```
//!
//! Decode a recorded capture as text with channels in microseconds:
//! ```bash
//! crsf-decoder --input capture.bin --format text --units us
//! ```

use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::AsyncRead;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crsf_decoder::capture::{pump, CaptureStats};
use crsf_decoder::config::{Config, LoggingConfig};
use crsf_decoder::crsf::StreamDecoder;
use crsf_decoder::output::units::ChannelUnits;
use crsf_decoder::output::{build_sink, FrameSink, OutputFormat};
use crsf_decoder::serial::CrsfSerial;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Decode a capture file instead of a serial port
    #[arg(short, long, conflicts_with = "port")]
    input: Option<PathBuf>,

    /// Serial device, overrides the configuration
    #[arg(short, long)]
    port: Option<String>,

    /// Output format, overrides the configuration
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// RC channel units, overrides the configuration
    #[arg(short, long, value_enum)]
    units: Option<ChannelUnits>,
}

/// Load the configuration file, if any, and apply command line overrides
fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::default(),
    };

    if let Some(port) = &args.port {
        config.serial.port = port.clone();
    }
    if let Some(format) = args.format {
        config.output.format = format;
    }
    if let Some(units) = args.units {
        config.output.channel_units = units;
    }

    config.validate()?;
    Ok(config)
}

/// Install the tracing subscriber
///
/// `RUST_LOG` takes precedence over the configured level. Logs go to stderr
/// so they never mix with decoded output, or to a daily-rotated file when
/// one is configured. The returned guard must live until exit.
fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match &config.file {
        Some(path) => {
            let directory = path
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            let file_name = path.file_name().context("Log file path has no file name")?;

            let appender = tracing_appender::rolling::daily(directory, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
            Ok(None)
        }
    }
}

/// Run the capture loop until end of input or Ctrl+C
///
/// Returns `None` when interrupted.
async fn capture<R>(
    reader: &mut R,
    buffer_size: usize,
    decoder: &mut StreamDecoder,
    sink: &mut dyn FrameSink,
) -> Result<Option<CaptureStats>>
where
    R: AsyncRead + Unpin,
{
    tokio::select! {
        result = pump(reader, buffer_size, decoder, sink) => Ok(Some(result?)),
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
            Ok(None)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;
    let _log_guard = init_logging(&config.logging)?;

    info!("CRSF Decoder v{} starting...", env!("CARGO_PKG_VERSION"));

    let mut decoder = StreamDecoder::new(config.decoder_options());
    let mut sink = build_sink(&config.output, BufWriter::new(std::io::stdout()));
    let buffer_size = config.serial.read_buffer_size;

    let result = match &args.input {
        Some(path) => {
            let mut file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open {}", path.display()))?;
            info!("Decoding capture file {}", path.display());
            capture(&mut file, buffer_size, &mut decoder, sink.as_mut()).await?
        }
        None => {
            let serial = CrsfSerial::open(&config.serial)?;
            info!("Decoding serial stream from {}", serial.device_path());
            info!("Press Ctrl+C to exit");
            let mut port = serial.into_stream();
            capture(&mut port, buffer_size, &mut decoder, sink.as_mut()).await?
        }
    };

    if result.is_none() {
        if let Some(incomplete) = decoder.finish() {
            sink.write_incomplete(&incomplete)?;
        }
    }
    sink.flush()?;

    let stats = decoder.stats();
    info!(
        "Processed {} bytes: {} decoded, {} unrecognized, {} invalid",
        stats.bytes, stats.decoded, stats.unrecognized, stats.invalid
    );
    if let Some(CaptureStats { incomplete: Some(incomplete), .. }) = result {
        warn!(
            "Input ended inside a frame at offset {} ({} bytes)",
            incomplete.span.offset, incomplete.span.len
        );
    }

    Ok(())
}
