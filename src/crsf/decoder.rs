//! # CRSF Payload Decoders
//!
//! One pure function per frame type. Each receives the payload bytes (type
//! and CRC already stripped, length already checked against the frame's
//! registry entry) and returns the typed record.
//!
//! Multi-byte integers are big-endian. RC channels are 11-bit fields packed
//! LSB-first and are read through [`BitReader`].

use bytes::Buf;

use super::bits::BitReader;
use super::protocol::*;

type DecodeResult = std::result::Result<FrameKind, PayloadError>;

/// Guard used by decoders that can also be called directly, outside the registry
fn expect_len(payload: &[u8], min: usize, max: usize) -> std::result::Result<(), PayloadError> {
    if payload.len() < min || payload.len() > max {
        return Err(PayloadError::UnexpectedLength { min, max, actual: payload.len() });
    }
    Ok(())
}

/// Split a zero-terminated printable ASCII string off the front of `payload`.
///
/// Returns the string and the bytes following its terminator.
fn take_cstr<'a>(
    payload: &'a [u8],
    field: &'static str,
) -> std::result::Result<(String, &'a [u8]), PayloadError> {
    let end = payload
        .iter()
        .position(|&b| b == 0)
        .ok_or(PayloadError::MissingTerminator { field })?;

    let text = &payload[..end];
    if let Some(position) = text.iter().position(|b| !(0x20..=0x7E).contains(b)) {
        return Err(PayloadError::NonPrintable { field, byte: text[position], position });
    }

    // Printable ASCII is always valid UTF-8
    let value = text.iter().map(|&b| b as char).collect();
    Ok((value, &payload[end + 1..]))
}

/// RSSI is sent as a positive magnitude of a negative dBm reading
fn rssi_dbm(raw: u8) -> i16 {
    -(raw as i16)
}

/// Decode RC Channels Packed payload (22 bytes, 16 × 11 bits)
pub fn decode_rc_channels(payload: &[u8]) -> DecodeResult {
    expect_len(payload, CRSF_RC_CHANNELS_PAYLOAD_SIZE, CRSF_RC_CHANNELS_PAYLOAD_SIZE)?;

    let mut reader = BitReader::new(payload);
    let mut channels: RcChannels = [0; CRSF_NUM_CHANNELS];

    for channel in channels.iter_mut() {
        *channel = reader
            .read(CRSF_CHANNEL_BITS)
            .ok_or(PayloadError::Truncated { field: "rc channels" })? as u16;
    }

    Ok(FrameKind::RcChannelsPacked(RcChannelsPacked { channels }))
}

/// Decode Link Statistics payload (10 bytes)
pub fn decode_link_statistics(payload: &[u8]) -> DecodeResult {
    expect_len(payload, CRSF_LINK_STATS_PAYLOAD_SIZE, CRSF_LINK_STATS_PAYLOAD_SIZE)?;
    let mut buf = payload;

    let uplink_rssi_ant1 = rssi_dbm(buf.get_u8());
    let uplink_rssi_ant2 = rssi_dbm(buf.get_u8());
    let uplink_link_quality = buf.get_u8();
    let uplink_snr = buf.get_i8();

    let active_antenna = buf.get_u8();
    if active_antenna > 1 {
        return Err(PayloadError::OutOfRange { field: "active antenna", value: active_antenna as u32 });
    }

    let rf_mode = buf.get_u8();

    let tx_power = buf.get_u8();
    let uplink_tx_power = TxPower::try_from(tx_power)
        .map_err(|value| PayloadError::OutOfRange { field: "uplink tx power", value: value as u32 })?;

    let downlink_rssi = rssi_dbm(buf.get_u8());
    let downlink_link_quality = buf.get_u8();
    let downlink_snr = buf.get_i8();

    Ok(FrameKind::LinkStatistics(LinkStatistics {
        uplink_rssi_ant1,
        uplink_rssi_ant2,
        uplink_link_quality,
        uplink_snr,
        active_antenna,
        rf_mode,
        uplink_tx_power,
        downlink_rssi,
        downlink_link_quality,
        downlink_snr,
    }))
}

/// Decode Battery Sensor payload (8 bytes)
pub fn decode_battery_sensor(payload: &[u8]) -> DecodeResult {
    expect_len(payload, CRSF_BATTERY_SENSOR_PAYLOAD_SIZE, CRSF_BATTERY_SENSOR_PAYLOAD_SIZE)?;
    let mut buf = payload;

    // Voltage: 2 bytes, decivolts
    let voltage = buf.get_u16();

    // Current: 2 bytes, deciamps
    let current = buf.get_u16();

    // Capacity: 3 bytes, mAh
    let capacity_used = buf.get_uint(3) as u32;

    let remaining_percent = buf.get_u8();
    if remaining_percent > 100 {
        return Err(PayloadError::OutOfRange {
            field: "battery remaining",
            value: remaining_percent as u32,
        });
    }

    Ok(FrameKind::BatterySensor(BatterySensor {
        voltage,
        current,
        capacity_used,
        remaining_percent,
    }))
}

/// Decode Flight Mode payload (zero-terminated string)
pub fn decode_flight_mode(payload: &[u8]) -> DecodeResult {
    expect_len(payload, 1, CRSF_MAX_PAYLOAD_SIZE)?;
    let (mode, _) = take_cstr(payload, "flight mode")?;
    Ok(FrameKind::FlightMode(FlightMode { mode }))
}

/// Decode GPS payload (15 bytes)
pub fn decode_gps(payload: &[u8]) -> DecodeResult {
    expect_len(payload, CRSF_GPS_PAYLOAD_SIZE, CRSF_GPS_PAYLOAD_SIZE)?;
    let mut buf = payload;

    Ok(FrameKind::Gps(GpsData {
        latitude: buf.get_i32(),
        longitude: buf.get_i32(),
        ground_speed: buf.get_u16(),
        heading: buf.get_u16(),
        altitude: buf.get_u16(),
        satellites: buf.get_u8(),
    }))
}

/// Decode Heartbeat payload (2 bytes)
pub fn decode_heartbeat(payload: &[u8]) -> DecodeResult {
    expect_len(payload, CRSF_HEARTBEAT_PAYLOAD_SIZE, CRSF_HEARTBEAT_PAYLOAD_SIZE)?;
    let mut buf = payload;
    Ok(FrameKind::Heartbeat(Heartbeat { origin: buf.get_i16() }))
}

/// Decode Device Ping payload (extended header only)
pub fn decode_device_ping(payload: &[u8]) -> DecodeResult {
    expect_len(payload, CRSF_EXT_HEADER_SIZE, CRSF_EXT_HEADER_SIZE)?;
    Ok(FrameKind::Ping(DevicePing {
        destination: payload[0],
        origin: payload[1],
    }))
}

/// Decode Device Info payload
///
/// ```text
/// dest(1) origin(1) name(N + \0) serial(4) hw(4) fw(4) params(1) param_ver(1)
/// ```
pub fn decode_device_info(payload: &[u8]) -> DecodeResult {
    expect_len(payload, CRSF_DEVICE_INFO_MIN_PAYLOAD_SIZE, CRSF_MAX_PAYLOAD_SIZE)?;

    let destination = payload[0];
    let origin = payload[1];
    let (name, mut rest) = take_cstr(&payload[CRSF_EXT_HEADER_SIZE..], "device name")?;

    if rest.remaining() < 14 {
        return Err(PayloadError::Truncated { field: "device info" });
    }

    Ok(FrameKind::DeviceInfo(DeviceInfo {
        destination,
        origin,
        name,
        serial_number: rest.get_u32(),
        hardware_version: rest.get_u32(),
        firmware_version: rest.get_u32(),
        parameter_count: rest.get_u8(),
        parameter_version: rest.get_u8(),
    }))
}

/// Decode Attitude payload (6 bytes)
pub fn decode_attitude(payload: &[u8]) -> DecodeResult {
    expect_len(payload, CRSF_ATTITUDE_PAYLOAD_SIZE, CRSF_ATTITUDE_PAYLOAD_SIZE)?;
    let mut buf = payload;

    Ok(FrameKind::Attitude(Attitude {
        pitch: buf.get_i16(),
        roll: buf.get_i16(),
        yaw: buf.get_i16(),
    }))
}

/// Decode Vario payload (2 bytes)
pub fn decode_vario(payload: &[u8]) -> DecodeResult {
    expect_len(payload, CRSF_VARIO_PAYLOAD_SIZE, CRSF_VARIO_PAYLOAD_SIZE)?;
    let mut buf = payload;
    Ok(FrameKind::Vario(Vario { vertical_speed: buf.get_i16() }))
}

/// Decode Barometric Altitude payload (2 to 4 bytes)
///
/// Senders disagree on the vertical speed field: some omit it, some send one
/// signed byte, some a big-endian i16.
pub fn decode_baro_altitude(payload: &[u8]) -> DecodeResult {
    expect_len(payload, 2, 4)?;
    let mut buf = payload;

    let altitude_packed = buf.get_u16();
    let vertical_speed = match buf.remaining() {
        0 => None,
        1 => Some(buf.get_i8() as i16),
        _ => Some(buf.get_i16()),
    };

    Ok(FrameKind::BaroAltitude(BaroAltitude { altitude_packed, vertical_speed }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crsf::testutil::encode_rc_channels_payload;

    #[test]
    fn test_decode_rc_channels_mid_stick() {
        let payload = encode_rc_channels_payload(&[CRSF_CHANNEL_VALUE_MID; CRSF_NUM_CHANNELS]);

        match decode_rc_channels(&payload).unwrap() {
            FrameKind::RcChannelsPacked(rc) => {
                assert_eq!(rc.channels, [992u16; 16]);
            }
            other => panic!("Expected RC channels, got: {:?}", other),
        }
    }

    #[test]
    fn test_decode_rc_channels_distinct_values() {
        let mut channels = [0u16; CRSF_NUM_CHANNELS];
        for (i, ch) in channels.iter_mut().enumerate() {
            *ch = (i as u16 * 131 + 7) & CRSF_CHANNEL_VALUE_MAX;
        }
        channels[5] = CRSF_CHANNEL_VALUE_MAX;
        channels[10] = CRSF_CHANNEL_VALUE_MIN;

        let payload = encode_rc_channels_payload(&channels);
        let FrameKind::RcChannelsPacked(rc) = decode_rc_channels(&payload).unwrap() else {
            panic!("Expected RC channels");
        };
        assert_eq!(rc.channels, channels);
    }

    #[test]
    fn test_decode_rc_channels_all_ones() {
        let FrameKind::RcChannelsPacked(rc) = decode_rc_channels(&[0xFF; 22]).unwrap() else {
            panic!("Expected RC channels");
        };
        assert_eq!(rc.channels, [CRSF_CHANNEL_VALUE_MAX; 16]);
    }

    #[test]
    fn test_decode_rc_channels_wrong_length() {
        let result = decode_rc_channels(&[0u8; 21]);
        assert_eq!(
            result,
            Err(PayloadError::UnexpectedLength { min: 22, max: 22, actual: 21 })
        );
    }

    #[test]
    fn test_decode_link_statistics() {
        let payload = [
            100u8, // uplink_rssi_1
            95,    // uplink_rssi_2
            80,    // uplink_lq (80%)
            10,    // uplink_snr
            0,     // active_antenna
            4,     // rf_mode
            2,     // uplink_tx_power (25 mW)
            90,    // downlink_rssi
            85,    // downlink_lq
            0xF4,  // downlink_snr (-12)
        ];

        let FrameKind::LinkStatistics(stats) = decode_link_statistics(&payload).unwrap() else {
            panic!("Expected link statistics");
        };
        assert_eq!(stats.uplink_rssi_ant1, -100);
        assert_eq!(stats.uplink_rssi_ant2, -95);
        assert_eq!(stats.uplink_link_quality, 80);
        assert_eq!(stats.uplink_snr, 10);
        assert_eq!(stats.active_antenna, 0);
        assert_eq!(stats.rf_mode, 4);
        assert_eq!(stats.uplink_tx_power, TxPower::Mw25);
        assert_eq!(stats.downlink_rssi, -90);
        assert_eq!(stats.downlink_link_quality, 85);
        assert_eq!(stats.downlink_snr, -12);
    }

    #[test]
    fn test_decode_link_statistics_too_short() {
        assert!(decode_link_statistics(&[100u8; 5]).is_err());
    }

    #[test]
    fn test_decode_link_statistics_bad_enumerants() {
        let mut payload = [100u8, 95, 80, 10, 0, 4, 2, 90, 85, 12];
        payload[6] = 9;
        assert_eq!(
            decode_link_statistics(&payload),
            Err(PayloadError::OutOfRange { field: "uplink tx power", value: 9 })
        );

        payload[6] = 2;
        payload[4] = 2;
        assert_eq!(
            decode_link_statistics(&payload),
            Err(PayloadError::OutOfRange { field: "active antenna", value: 2 })
        );
    }

    #[test]
    fn test_decode_battery_sensor() {
        let payload = [
            0x00, 0xA8, // Voltage: 168 dV
            0x00, 0x7D, // Current: 125 dA
            0x00, 0x03, 0xE8, // Capacity: 1000 mAh
            0x4B, // Remaining: 75%
        ];

        let FrameKind::BatterySensor(battery) = decode_battery_sensor(&payload).unwrap() else {
            panic!("Expected battery sensor");
        };
        assert_eq!(battery.voltage, 168);
        assert_eq!(battery.current, 125);
        assert_eq!(battery.capacity_used, 1000);
        assert_eq!(battery.remaining_percent, 75);
    }

    #[test]
    fn test_decode_battery_sensor_large_capacity() {
        let payload = [0x01, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 100];
        let FrameKind::BatterySensor(battery) = decode_battery_sensor(&payload).unwrap() else {
            panic!("Expected battery sensor");
        };
        assert_eq!(battery.capacity_used, 0x00FF_FFFF);
        assert_eq!(battery.remaining_percent, 100);
    }

    #[test]
    fn test_decode_battery_sensor_invalid_remaining() {
        let payload = [0, 0, 0, 0, 0, 0, 0, 101];
        assert!(matches!(
            decode_battery_sensor(&payload),
            Err(PayloadError::OutOfRange { value: 101, .. })
        ));
    }

    #[test]
    fn test_decode_battery_sensor_too_short() {
        assert!(decode_battery_sensor(&[0u8; 4]).is_err());
    }

    #[test]
    fn test_decode_flight_mode() {
        let FrameKind::FlightMode(mode) = decode_flight_mode(b"ACRO\0").unwrap() else {
            panic!("Expected flight mode");
        };
        assert_eq!(mode.mode, "ACRO");
    }

    #[test]
    fn test_decode_flight_mode_ignores_bytes_after_terminator() {
        let FrameKind::FlightMode(mode) = decode_flight_mode(b"ANGL\0\xFF").unwrap() else {
            panic!("Expected flight mode");
        };
        assert_eq!(mode.mode, "ANGL");
    }

    #[test]
    fn test_decode_flight_mode_missing_terminator() {
        assert_eq!(
            decode_flight_mode(b"ACRO"),
            Err(PayloadError::MissingTerminator { field: "flight mode" })
        );
    }

    #[test]
    fn test_decode_flight_mode_non_printable() {
        assert_eq!(
            decode_flight_mode(b"AC\x01O\0"),
            Err(PayloadError::NonPrintable { field: "flight mode", byte: 0x01, position: 2 })
        );
    }

    #[test]
    fn test_decode_flight_mode_empty_string() {
        let FrameKind::FlightMode(mode) = decode_flight_mode(b"\0").unwrap() else {
            panic!("Expected flight mode");
        };
        assert_eq!(mode.mode, "");
    }

    #[test]
    fn test_decode_gps() {
        let lat_raw: i32 = 377_749_000;
        let lon_raw: i32 = -1_224_194_000;

        let mut payload = Vec::new();
        payload.extend_from_slice(&lat_raw.to_be_bytes());
        payload.extend_from_slice(&lon_raw.to_be_bytes());
        payload.extend_from_slice(&255u16.to_be_bytes()); // 25.5 km/h
        payload.extend_from_slice(&9000u16.to_be_bytes()); // 90.00°
        payload.extend_from_slice(&1100u16.to_be_bytes()); // 100 m
        payload.push(12);

        let FrameKind::Gps(gps) = decode_gps(&payload).unwrap() else {
            panic!("Expected GPS");
        };
        assert_eq!(gps.latitude, lat_raw);
        assert_eq!(gps.longitude, lon_raw);
        assert_eq!(gps.ground_speed, 255);
        assert_eq!(gps.heading, 9000);
        assert_eq!(gps.altitude, 1100);
        assert_eq!(gps.altitude_metres(), 100);
        assert_eq!(gps.satellites, 12);
    }

    #[test]
    fn test_decode_gps_too_short() {
        assert!(decode_gps(&[0u8; 10]).is_err());
    }

    #[test]
    fn test_decode_heartbeat() {
        let FrameKind::Heartbeat(hb) = decode_heartbeat(&[0x00, 0xC8]).unwrap() else {
            panic!("Expected heartbeat");
        };
        assert_eq!(hb.origin, 0xC8);

        let FrameKind::Heartbeat(hb) = decode_heartbeat(&[0xFF, 0xFE]).unwrap() else {
            panic!("Expected heartbeat");
        };
        assert_eq!(hb.origin, -2);
    }

    #[test]
    fn test_decode_device_ping() {
        let FrameKind::Ping(ping) = decode_device_ping(&[0x00, 0xEA]).unwrap() else {
            panic!("Expected ping");
        };
        assert_eq!(ping.destination, CRSF_ADDRESS_BROADCAST);
        assert_eq!(ping.origin, CRSF_ADDRESS_RADIO_TRANSMITTER);
    }

    fn device_info_payload(name: &[u8]) -> Vec<u8> {
        let mut payload = vec![0xEA, 0xEE];
        payload.extend_from_slice(name);
        payload.extend_from_slice(&0x454C_5253u32.to_be_bytes());
        payload.extend_from_slice(&0x0001_0001u32.to_be_bytes());
        payload.extend_from_slice(&0x0003_0201u32.to_be_bytes());
        payload.push(42);
        payload.push(0);
        payload
    }

    #[test]
    fn test_decode_device_info() {
        let payload = device_info_payload(b"ELRS TX\0");

        let FrameKind::DeviceInfo(info) = decode_device_info(&payload).unwrap() else {
            panic!("Expected device info");
        };
        assert_eq!(info.destination, 0xEA);
        assert_eq!(info.origin, 0xEE);
        assert_eq!(info.name, "ELRS TX");
        assert_eq!(info.serial_number, 0x454C_5253);
        assert_eq!(info.hardware_version, 0x0001_0001);
        assert_eq!(info.firmware_version, 0x0003_0201);
        assert_eq!(info.parameter_count, 42);
        assert_eq!(info.parameter_version, 0);
    }

    #[test]
    fn test_decode_device_info_missing_terminator() {
        let mut payload = vec![0xEA, 0xEE];
        payload.extend_from_slice(&[b'X'; 20]);
        assert_eq!(
            decode_device_info(&payload),
            Err(PayloadError::MissingTerminator { field: "device name" })
        );
    }

    #[test]
    fn test_decode_device_info_truncated_after_name() {
        let mut payload = device_info_payload(b"ELRS TX\0");
        payload.truncate(payload.len() - 3);
        assert_eq!(
            decode_device_info(&payload),
            Err(PayloadError::Truncated { field: "device info" })
        );
    }

    #[test]
    fn test_decode_attitude() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&(-1571i16).to_be_bytes());
        payload.extend_from_slice(&785i16.to_be_bytes());
        payload.extend_from_slice(&31415i16.to_be_bytes());

        let FrameKind::Attitude(att) = decode_attitude(&payload).unwrap() else {
            panic!("Expected attitude");
        };
        assert_eq!(att.pitch, -1571);
        assert_eq!(att.roll, 785);
        assert_eq!(att.yaw, 31415);
        assert!((att.yaw_radians() - 3.1415).abs() < 0.0001);
    }

    #[test]
    fn test_decode_vario() {
        let FrameKind::Vario(vario) = decode_vario(&(-150i16).to_be_bytes()).unwrap() else {
            panic!("Expected vario");
        };
        assert_eq!(vario.vertical_speed, -150);
    }

    #[test]
    fn test_decode_baro_altitude_variants() {
        let FrameKind::BaroAltitude(baro) = decode_baro_altitude(&[0x2A, 0xF8]).unwrap() else {
            panic!("Expected baro altitude");
        };
        assert_eq!(baro.altitude_packed, 11_000);
        assert_eq!(baro.vertical_speed, None);

        let FrameKind::BaroAltitude(baro) = decode_baro_altitude(&[0x2A, 0xF8, 0xFB]).unwrap() else {
            panic!("Expected baro altitude");
        };
        assert_eq!(baro.vertical_speed, Some(-5));

        let FrameKind::BaroAltitude(baro) = decode_baro_altitude(&[0x2A, 0xF8, 0x01, 0x2C]).unwrap() else {
            panic!("Expected baro altitude");
        };
        assert_eq!(baro.vertical_speed, Some(300));

        assert!(decode_baro_altitude(&[0x2A]).is_err());
    }

    #[test]
    fn test_decoders_are_deterministic() {
        let payload = device_info_payload(b"RX\0");
        assert_eq!(decode_device_info(&payload), decode_device_info(&payload));
    }
}
