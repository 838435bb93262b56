//! # CRSF Protocol Constants and Types
//!
//! Core protocol definitions for CRSF (Crossfire) communication.
//!
//! ```text
//! +---------+--------+------+-----------------+-----+
//! | Address | Length | Type |     Payload     | CRC |
//! +---------+--------+------+-----------------+-----+
//! | 1 byte  | 1 byte | 1 b. | Length - 2 bytes| 1 b.|
//! ```
//!
//! `Length` counts every byte that follows it: type, payload and CRC.

use serde::Serialize;
use thiserror::Error;

/// Broadcast address
pub const CRSF_ADDRESS_BROADCAST: u8 = 0x00;

/// USB device address
pub const CRSF_ADDRESS_USB: u8 = 0x10;

/// Flight controller address (also the customary serial sync byte)
pub const CRSF_ADDRESS_FLIGHT_CONTROLLER: u8 = 0xC8;

/// Radio transmitter (handset) address
pub const CRSF_ADDRESS_RADIO_TRANSMITTER: u8 = 0xEA;

/// Receiver address
pub const CRSF_ADDRESS_RECEIVER: u8 = 0xEC;

/// Transmitter module address
pub const CRSF_ADDRESS_TRANSMITTER: u8 = 0xEE;

/// GPS packet type
pub const CRSF_FRAMETYPE_GPS: u8 = 0x02;

/// Variometer packet type
pub const CRSF_FRAMETYPE_VARIO: u8 = 0x07;

/// Battery Sensor packet type
pub const CRSF_FRAMETYPE_BATTERY_SENSOR: u8 = 0x08;

/// Barometric altitude packet type
pub const CRSF_FRAMETYPE_BARO_ALTITUDE: u8 = 0x09;

/// Heartbeat packet type
pub const CRSF_FRAMETYPE_HEARTBEAT: u8 = 0x0B;

/// OpenTX sync packet type (named only, not decoded)
pub const CRSF_FRAMETYPE_OPENTX_SYNC: u8 = 0x10;

/// Link Statistics packet type
pub const CRSF_FRAMETYPE_LINK_STATISTICS: u8 = 0x14;

/// RC Channels packet type
pub const CRSF_FRAMETYPE_RC_CHANNELS_PACKED: u8 = 0x16;

/// Attitude packet type
pub const CRSF_FRAMETYPE_ATTITUDE: u8 = 0x1E;

/// Flight Mode packet type
pub const CRSF_FRAMETYPE_FLIGHT_MODE: u8 = 0x21;

/// Device Ping packet type (extended header)
pub const CRSF_FRAMETYPE_DEVICE_PING: u8 = 0x28;

/// Device Info packet type (extended header)
pub const CRSF_FRAMETYPE_DEVICE_INFO: u8 = 0x29;

/// Parameter settings request type (named only, not decoded)
pub const CRSF_FRAMETYPE_REQUEST_SETTINGS: u8 = 0x2A;

/// Command packet type (named only, not decoded)
pub const CRSF_FRAMETYPE_COMMAND: u8 = 0x32;

/// Radio packet type (named only, not decoded)
pub const CRSF_FRAMETYPE_RADIO: u8 = 0x3A;

/// Maximum CRSF frame size on the wire
/// Frame structure: address(1) + length(1) + type(1) + payload(N) + crc(1)
pub const CRSF_MAX_FRAME_SIZE: usize = 64;

/// Smallest legal length field (type + crc, empty payload)
pub const CRSF_MIN_DECLARED_LENGTH: u8 = 2;

/// Largest legal length field (frame size minus address and length bytes)
pub const CRSF_MAX_DECLARED_LENGTH: u8 = (CRSF_MAX_FRAME_SIZE - 2) as u8;

/// Maximum CRSF payload size (64 - 4 = 60 bytes)
pub const CRSF_MAX_PAYLOAD_SIZE: usize = CRSF_MAX_FRAME_SIZE - 4;

/// RC channels payload size (22 bytes for 16 channels × 11 bits)
pub const CRSF_RC_CHANNELS_PAYLOAD_SIZE: usize = 22;

/// Number of RC channels
pub const CRSF_NUM_CHANNELS: usize = 16;

/// Width of one packed RC channel value
pub const CRSF_CHANNEL_BITS: u32 = 11;

/// Channel value range (11-bit: 0-2047)
pub const CRSF_CHANNEL_VALUE_MIN: u16 = 0;
pub const CRSF_CHANNEL_VALUE_MAX: u16 = 2047;

/// Calibrated stick range (988µs - 2012µs)
pub const CRSF_CHANNEL_VALUE_STICK_MIN: u16 = 172;
pub const CRSF_CHANNEL_VALUE_MID: u16 = 992;
pub const CRSF_CHANNEL_VALUE_STICK_MAX: u16 = 1811;

/// Link Statistics payload size
pub const CRSF_LINK_STATS_PAYLOAD_SIZE: usize = 10;

/// Battery Sensor payload size
pub const CRSF_BATTERY_SENSOR_PAYLOAD_SIZE: usize = 8;

/// GPS payload size
pub const CRSF_GPS_PAYLOAD_SIZE: usize = 15;

/// Heartbeat payload size
pub const CRSF_HEARTBEAT_PAYLOAD_SIZE: usize = 2;

/// Attitude payload size
pub const CRSF_ATTITUDE_PAYLOAD_SIZE: usize = 6;

/// Vario payload size
pub const CRSF_VARIO_PAYLOAD_SIZE: usize = 2;

/// Extended header size (destination + origin)
pub const CRSF_EXT_HEADER_SIZE: usize = 2;

/// Smallest Device Info payload: extended header, empty name, 3 × u32, 2 × u8
pub const CRSF_DEVICE_INFO_MIN_PAYLOAD_SIZE: usize = CRSF_EXT_HEADER_SIZE + 1 + 12 + 2;

/// GPS altitude is transmitted with this offset in metres
pub const CRSF_GPS_ALTITUDE_OFFSET: i32 = 1000;

/// RC channels array type (16 channels, 11-bit values)
pub type RcChannels = [u16; CRSF_NUM_CHANNELS];

/// Position of a decoded unit in the input stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ByteSpan {
    /// Offset of the first byte from the start of the stream
    pub offset: u64,

    /// Number of bytes covered
    pub len: usize,
}

impl ByteSpan {
    pub fn new(offset: u64, len: usize) -> Self {
        Self { offset, len }
    }

    /// Offset one past the last byte of the span
    pub fn end(&self) -> u64 {
        self.offset + self.len as u64
    }
}

/// Uplink transmit power setting reported in Link Statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TxPower {
    Mw0,
    Mw10,
    Mw25,
    Mw100,
    Mw500,
    Mw1000,
    Mw2000,
    Mw250,
    Mw50,
}

impl TxPower {
    /// Power in milliwatts
    pub fn milliwatts(self) -> u16 {
        match self {
            TxPower::Mw0 => 0,
            TxPower::Mw10 => 10,
            TxPower::Mw25 => 25,
            TxPower::Mw100 => 100,
            TxPower::Mw500 => 500,
            TxPower::Mw1000 => 1000,
            TxPower::Mw2000 => 2000,
            TxPower::Mw250 => 250,
            TxPower::Mw50 => 50,
        }
    }

    /// Wire enumerant
    pub fn index(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for TxPower {
    type Error = u8;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        Ok(match value {
            0 => TxPower::Mw0,
            1 => TxPower::Mw10,
            2 => TxPower::Mw25,
            3 => TxPower::Mw100,
            4 => TxPower::Mw500,
            5 => TxPower::Mw1000,
            6 => TxPower::Mw2000,
            7 => TxPower::Mw250,
            8 => TxPower::Mw50,
            other => return Err(other),
        })
    }
}

/// Link statistics telemetry data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LinkStatistics {
    /// Uplink RSSI (antenna 1) in dBm
    pub uplink_rssi_ant1: i16,

    /// Uplink RSSI (antenna 2) in dBm (diversity)
    pub uplink_rssi_ant2: i16,

    /// Uplink link quality (0-100%)
    pub uplink_link_quality: u8,

    /// Uplink SNR in dB
    pub uplink_snr: i8,

    /// Active antenna (0 or 1)
    pub active_antenna: u8,

    /// RF mode / packet rate enumerant
    pub rf_mode: u8,

    /// Uplink TX power
    pub uplink_tx_power: TxPower,

    /// Downlink RSSI in dBm
    pub downlink_rssi: i16,

    /// Downlink link quality (0-100%)
    pub downlink_link_quality: u8,

    /// Downlink SNR in dB
    pub downlink_snr: i8,
}

/// Sixteen raw 11-bit channel values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RcChannelsPacked {
    pub channels: RcChannels,
}

/// Battery sensor telemetry data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatterySensor {
    /// Battery voltage in 0.1 V units
    pub voltage: u16,

    /// Current draw in 0.1 A units
    pub current: u16,

    /// Capacity used in mAh (24-bit on the wire)
    pub capacity_used: u32,

    /// Battery remaining percentage (0-100%)
    pub remaining_percent: u8,
}

impl BatterySensor {
    pub fn voltage_volts(&self) -> f32 {
        self.voltage as f32 / 10.0
    }

    pub fn current_amps(&self) -> f32 {
        self.current as f32 / 10.0
    }
}

/// Flight controller mode string
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlightMode {
    pub mode: String,
}

/// GPS telemetry data, raw wire units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GpsData {
    /// Latitude in degrees × 10^7
    pub latitude: i32,

    /// Longitude in degrees × 10^7
    pub longitude: i32,

    /// Ground speed in km/h × 10
    pub ground_speed: u16,

    /// Heading in degrees × 100
    pub heading: u16,

    /// Altitude in metres + 1000
    pub altitude: u16,

    /// Number of satellites
    pub satellites: u8,
}

impl GpsData {
    pub fn latitude_degrees(&self) -> f64 {
        self.latitude as f64 / 10_000_000.0
    }

    pub fn longitude_degrees(&self) -> f64 {
        self.longitude as f64 / 10_000_000.0
    }

    pub fn ground_speed_kmh(&self) -> f32 {
        self.ground_speed as f32 / 10.0
    }

    pub fn heading_degrees(&self) -> f32 {
        self.heading as f32 / 100.0
    }

    pub fn altitude_metres(&self) -> i32 {
        self.altitude as i32 - CRSF_GPS_ALTITUDE_OFFSET
    }
}

/// Heartbeat from a device on the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Heartbeat {
    /// Origin device address
    pub origin: i16,
}

/// Device discovery request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DevicePing {
    pub destination: u8,
    pub origin: u8,
}

/// Device identification reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub destination: u8,
    pub origin: u8,
    pub name: String,
    pub serial_number: u32,
    pub hardware_version: u32,
    pub firmware_version: u32,
    pub parameter_count: u8,
    pub parameter_version: u8,
}

/// Vehicle attitude in 1/10000 radian units (nominal)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Attitude {
    pub pitch: i16,
    pub roll: i16,
    pub yaw: i16,
}

impl Attitude {
    /// Nominal scale of the raw attitude fields
    pub const RADIANS_PER_UNIT: f32 = 1.0e-4;

    pub fn pitch_radians(&self) -> f32 {
        self.pitch as f32 * Self::RADIANS_PER_UNIT
    }

    pub fn roll_radians(&self) -> f32 {
        self.roll as f32 * Self::RADIANS_PER_UNIT
    }

    pub fn yaw_radians(&self) -> f32 {
        self.yaw as f32 * Self::RADIANS_PER_UNIT
    }
}

/// Variometer vertical speed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Vario {
    /// Vertical speed in cm/s
    pub vertical_speed: i16,
}

/// Barometric altitude with optional vertical speed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BaroAltitude {
    /// Packed altitude, see [`BaroAltitude::altitude_decimetres`]
    pub altitude_packed: u16,

    /// Vertical speed in cm/s, when the sender includes it
    pub vertical_speed: Option<i16>,
}

impl BaroAltitude {
    /// Unpack the altitude.
    ///
    /// MSB clear: decimetres with a 10000 dm offset. MSB set: whole metres.
    pub fn altitude_decimetres(&self) -> i32 {
        if self.altitude_packed & 0x8000 == 0 {
            self.altitude_packed as i32 - 10_000
        } else {
            (self.altitude_packed & 0x7FFF) as i32 * 10
        }
    }
}

/// Why a payload could not be decoded
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadError {
    #[error("payload length {actual} outside {min}..={max}")]
    UnexpectedLength { min: usize, max: usize, actual: usize },

    #[error("{field} has no zero terminator")]
    MissingTerminator { field: &'static str },

    #[error("{field} contains non-printable byte 0x{byte:02X} at {position}")]
    NonPrintable { field: &'static str, byte: u8, position: usize },

    #[error("{field} value {value} out of range")]
    OutOfRange { field: &'static str, value: u32 },

    #[error("payload ends inside {field}")]
    Truncated { field: &'static str },
}

/// Why a frame was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameError {
    #[error("frame too short: declared length {declared}")]
    FrameTooShort { declared: u8 },

    #[error("frame too long: declared length {declared} (max: {max})")]
    FrameTooLong { declared: u8, max: u8 },

    #[error("CRC mismatch: computed 0x{computed:02X}, received 0x{received:02X}")]
    CrcMismatch { computed: u8, received: u8 },

    #[error("payload decode error: {0}")]
    PayloadDecode(#[from] PayloadError),
}

/// Decoded frame contents, one variant per frame type
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum FrameKind {
    LinkStatistics(LinkStatistics),
    RcChannelsPacked(RcChannelsPacked),
    BatterySensor(BatterySensor),
    FlightMode(FlightMode),
    Gps(GpsData),
    Heartbeat(Heartbeat),
    Ping(DevicePing),
    Attitude(Attitude),
    DeviceInfo(DeviceInfo),
    Vario(Vario),
    BaroAltitude(BaroAltitude),

    /// Well-formed frame of a type without a registered decoder, or addressed
    /// to a device outside the configured filter
    Unrecognized { payload: Vec<u8> },

    /// Rejected frame
    Invalid(FrameError),
}

/// One decoded unit of the input stream
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedFrame {
    /// Destination address byte
    pub address: u8,

    /// Raw type byte, absent when the header was rejected before it was read
    pub frame_type: Option<u8>,

    /// Bytes of the stream this unit consumed
    pub span: ByteSpan,

    pub kind: FrameKind,
}

impl DecodedFrame {
    /// True for every variant except `Invalid`
    pub fn is_valid(&self) -> bool {
        !matches!(self.kind, FrameKind::Invalid(_))
    }

    /// Rejection reason of an `Invalid` frame
    pub fn error(&self) -> Option<&FrameError> {
        match &self.kind {
            FrameKind::Invalid(e) => Some(e),
            _ => None,
        }
    }

    /// Human-readable name of the frame type, if known
    pub fn type_name(&self) -> Option<&'static str> {
        self.frame_type.and_then(crate::crsf::registry::frame_type_name)
    }
}
