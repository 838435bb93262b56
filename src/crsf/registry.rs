//! # Frame Type Registry
//!
//! Table-driven mapping from a frame type byte to its payload constraints and
//! decoder. The builtin table is generated at compile time; supporting a new
//! frame type means adding one descriptor here and one decoder function.

use super::decoder;
use super::protocol::*;

/// Payload decoder signature
pub type PayloadDecoder = fn(&[u8]) -> std::result::Result<FrameKind, PayloadError>;

/// Accepted payload size for a frame type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadLength {
    Exact(usize),
    Range { min: usize, max: usize },
}

impl PayloadLength {
    pub fn bounds(self) -> (usize, usize) {
        match self {
            PayloadLength::Exact(n) => (n, n),
            PayloadLength::Range { min, max } => (min, max),
        }
    }

    pub fn accepts(self, len: usize) -> bool {
        let (min, max) = self.bounds();
        (min..=max).contains(&len)
    }
}

/// Registry entry for one frame type
#[derive(Debug, Clone, Copy)]
pub struct FrameDescriptor {
    pub type_byte: u8,
    pub name: &'static str,
    pub payload_len: PayloadLength,
    pub decode: PayloadDecoder,
}

impl FrameDescriptor {
    /// Check the payload length, then run the decoder
    pub fn decode_payload(&self, payload: &[u8]) -> std::result::Result<FrameKind, PayloadError> {
        if !self.payload_len.accepts(payload.len()) {
            let (min, max) = self.payload_len.bounds();
            return Err(PayloadError::UnexpectedLength { min, max, actual: payload.len() });
        }
        (self.decode)(payload)
    }
}

const fn descriptor(
    type_byte: u8,
    name: &'static str,
    payload_len: PayloadLength,
    decode: PayloadDecoder,
) -> Option<FrameDescriptor> {
    Some(FrameDescriptor { type_byte, name, payload_len, decode })
}

/// Frame types this crate decodes
const BUILTIN_DESCRIPTORS: [Option<FrameDescriptor>; 11] = [
    descriptor(
        CRSF_FRAMETYPE_GPS,
        "GPS",
        PayloadLength::Exact(CRSF_GPS_PAYLOAD_SIZE),
        decoder::decode_gps,
    ),
    descriptor(
        CRSF_FRAMETYPE_VARIO,
        "Vario",
        PayloadLength::Exact(CRSF_VARIO_PAYLOAD_SIZE),
        decoder::decode_vario,
    ),
    descriptor(
        CRSF_FRAMETYPE_BATTERY_SENSOR,
        "Battery sensor",
        PayloadLength::Exact(CRSF_BATTERY_SENSOR_PAYLOAD_SIZE),
        decoder::decode_battery_sensor,
    ),
    descriptor(
        CRSF_FRAMETYPE_BARO_ALTITUDE,
        "Baro altitude",
        PayloadLength::Range { min: 2, max: 4 },
        decoder::decode_baro_altitude,
    ),
    descriptor(
        CRSF_FRAMETYPE_HEARTBEAT,
        "Heartbeat",
        PayloadLength::Exact(CRSF_HEARTBEAT_PAYLOAD_SIZE),
        decoder::decode_heartbeat,
    ),
    descriptor(
        CRSF_FRAMETYPE_LINK_STATISTICS,
        "Link statistics",
        PayloadLength::Exact(CRSF_LINK_STATS_PAYLOAD_SIZE),
        decoder::decode_link_statistics,
    ),
    descriptor(
        CRSF_FRAMETYPE_RC_CHANNELS_PACKED,
        "RC channels packed",
        PayloadLength::Exact(CRSF_RC_CHANNELS_PAYLOAD_SIZE),
        decoder::decode_rc_channels,
    ),
    descriptor(
        CRSF_FRAMETYPE_ATTITUDE,
        "Attitude",
        PayloadLength::Exact(CRSF_ATTITUDE_PAYLOAD_SIZE),
        decoder::decode_attitude,
    ),
    descriptor(
        CRSF_FRAMETYPE_FLIGHT_MODE,
        "Flight mode",
        PayloadLength::Range { min: 1, max: CRSF_MAX_PAYLOAD_SIZE },
        decoder::decode_flight_mode,
    ),
    descriptor(
        CRSF_FRAMETYPE_DEVICE_PING,
        "Ping devices",
        PayloadLength::Exact(CRSF_EXT_HEADER_SIZE),
        decoder::decode_device_ping,
    ),
    descriptor(
        CRSF_FRAMETYPE_DEVICE_INFO,
        "Device info",
        PayloadLength::Range {
            min: CRSF_DEVICE_INFO_MIN_PAYLOAD_SIZE,
            max: CRSF_MAX_PAYLOAD_SIZE,
        },
        decoder::decode_device_info,
    ),
];

/// Types that are recognised by name but carried as `Unrecognized`
const NAMED_ONLY: [(u8, &str); 4] = [
    (CRSF_FRAMETYPE_OPENTX_SYNC, "OpenTX sync"),
    (CRSF_FRAMETYPE_REQUEST_SETTINGS, "Request settings"),
    (CRSF_FRAMETYPE_COMMAND, "Command"),
    (CRSF_FRAMETYPE_RADIO, "Radio"),
];

/// Generate the lookup table at compile time
const fn generate_builtin_table() -> [Option<FrameDescriptor>; 256] {
    let mut table: [Option<FrameDescriptor>; 256] = [None; 256];
    let mut i = 0;

    while i < BUILTIN_DESCRIPTORS.len() {
        if let Some(desc) = BUILTIN_DESCRIPTORS[i] {
            table[desc.type_byte as usize] = Some(desc);
        }
        i += 1;
    }

    table
}

const BUILTIN_TABLE: [Option<FrameDescriptor>; 256] = generate_builtin_table();

static BUILTIN_REGISTRY: FrameRegistry = FrameRegistry::builtin();

/// Human-readable name of a frame type byte
pub fn frame_type_name(type_byte: u8) -> Option<&'static str> {
    if let Some(desc) = BUILTIN_REGISTRY.lookup(type_byte) {
        return Some(desc.name);
    }
    NAMED_ONLY
        .iter()
        .find(|(t, _)| *t == type_byte)
        .map(|(_, name)| *name)
}

/// Lookup table of frame descriptors keyed by type byte
#[derive(Debug, Clone)]
pub struct FrameRegistry {
    table: [Option<FrameDescriptor>; 256],
}

impl FrameRegistry {
    /// Registry with every builtin decoder
    pub const fn builtin() -> Self {
        Self { table: BUILTIN_TABLE }
    }

    /// Registry with no decoders; every frame comes out `Unrecognized`
    pub const fn empty() -> Self {
        Self { table: [None; 256] }
    }

    pub fn lookup(&self, type_byte: u8) -> Option<&FrameDescriptor> {
        self.table[type_byte as usize].as_ref()
    }

    /// Add or replace the descriptor for `desc.type_byte`
    pub fn register(&mut self, desc: FrameDescriptor) -> Option<FrameDescriptor> {
        self.table[desc.type_byte as usize].replace(desc)
    }

    /// Number of registered frame types
    pub fn len(&self) -> usize {
        self.table.iter().filter(|d| d.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for FrameRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
