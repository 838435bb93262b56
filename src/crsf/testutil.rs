//! Frame builders for tests.
//!
//! The crate is decode-only; these exist so tests can produce CRC-correct
//! frames from known field values.

use super::crc::crc8;
use super::protocol::*;

/// Build a complete frame: address + length + type + payload + crc
pub fn build_frame(address: u8, frame_type: u8, payload: &[u8]) -> Vec<u8> {
    let mut checked = Vec::with_capacity(1 + payload.len());
    checked.push(frame_type);
    checked.extend_from_slice(payload);

    let mut frame = Vec::with_capacity(payload.len() + 4);
    frame.push(address);
    frame.push((payload.len() + 2) as u8);
    frame.extend_from_slice(&checked);
    frame.push(crc8(&checked));
    frame
}

/// Pack 16 channels (11 bits each, LSB first) into 22 bytes
pub fn encode_rc_channels_payload(channels: &RcChannels) -> Vec<u8> {
    let mut payload = vec![0u8; CRSF_RC_CHANNELS_PAYLOAD_SIZE];
    let mut bit_index = 0;

    for &channel in channels.iter() {
        let value = channel.min(CRSF_CHANNEL_VALUE_MAX);

        for bit in 0..CRSF_CHANNEL_BITS {
            if (value >> bit) & 1 == 1 {
                payload[bit_index / 8] |= 1 << (bit_index % 8);
            }
            bit_index += 1;
        }
    }

    payload
}

pub fn encode_link_statistics(stats: &LinkStatistics) -> Vec<u8> {
    vec![
        (-stats.uplink_rssi_ant1) as u8,
        (-stats.uplink_rssi_ant2) as u8,
        stats.uplink_link_quality,
        stats.uplink_snr as u8,
        stats.active_antenna,
        stats.rf_mode,
        stats.uplink_tx_power.index(),
        (-stats.downlink_rssi) as u8,
        stats.downlink_link_quality,
        stats.downlink_snr as u8,
    ]
}

pub fn encode_battery_sensor(battery: &BatterySensor) -> Vec<u8> {
    let mut payload = Vec::with_capacity(CRSF_BATTERY_SENSOR_PAYLOAD_SIZE);
    payload.extend_from_slice(&battery.voltage.to_be_bytes());
    payload.extend_from_slice(&battery.current.to_be_bytes());
    payload.extend_from_slice(&battery.capacity_used.to_be_bytes()[1..]);
    payload.push(battery.remaining_percent);
    payload
}

pub fn encode_gps(gps: &GpsData) -> Vec<u8> {
    let mut payload = Vec::with_capacity(CRSF_GPS_PAYLOAD_SIZE);
    payload.extend_from_slice(&gps.latitude.to_be_bytes());
    payload.extend_from_slice(&gps.longitude.to_be_bytes());
    payload.extend_from_slice(&gps.ground_speed.to_be_bytes());
    payload.extend_from_slice(&gps.heading.to_be_bytes());
    payload.extend_from_slice(&gps.altitude.to_be_bytes());
    payload.push(gps.satellites);
    payload
}

pub fn encode_attitude(attitude: &Attitude) -> Vec<u8> {
    let mut payload = Vec::with_capacity(CRSF_ATTITUDE_PAYLOAD_SIZE);
    payload.extend_from_slice(&attitude.pitch.to_be_bytes());
    payload.extend_from_slice(&attitude.roll.to_be_bytes());
    payload.extend_from_slice(&attitude.yaw.to_be_bytes());
    payload
}

pub fn encode_device_info(info: &DeviceInfo) -> Vec<u8> {
    let mut payload = vec![info.destination, info.origin];
    payload.extend_from_slice(info.name.as_bytes());
    payload.push(0);
    payload.extend_from_slice(&info.serial_number.to_be_bytes());
    payload.extend_from_slice(&info.hardware_version.to_be_bytes());
    payload.extend_from_slice(&info.firmware_version.to_be_bytes());
    payload.push(info.parameter_count);
    payload.push(info.parameter_version);
    payload
}

/// The Link Statistics sample used across tests
pub fn sample_link_statistics() -> LinkStatistics {
    LinkStatistics {
        uplink_rssi_ant1: -64,
        uplink_rssi_ant2: -71,
        uplink_link_quality: 100,
        uplink_snr: 9,
        active_antenna: 1,
        rf_mode: 5,
        uplink_tx_power: TxPower::Mw100,
        downlink_rssi: -58,
        downlink_link_quality: 98,
        downlink_snr: -3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_frame_structure() {
        let frame = build_frame(CRSF_ADDRESS_FLIGHT_CONTROLLER, CRSF_FRAMETYPE_HEARTBEAT, &[0x00, 0xEE]);

        assert_eq!(frame.len(), 6);
        assert_eq!(frame[0], 0xC8);
        assert_eq!(frame[1], 4); // type + 2 payload + crc
        assert_eq!(frame[2], CRSF_FRAMETYPE_HEARTBEAT);
        assert_eq!(frame[5], crc8(&frame[2..5]));
    }

    #[test]
    fn test_encode_rc_channels_all_max() {
        let payload = encode_rc_channels_payload(&[CRSF_CHANNEL_VALUE_MAX; CRSF_NUM_CHANNELS]);
        assert_eq!(payload, vec![0xFFu8; 22]);
    }

    #[test]
    fn test_encode_rc_channels_single_channel() {
        let mut channels = [0u16; CRSF_NUM_CHANNELS];
        channels[0] = 0x7FF;

        let payload = encode_rc_channels_payload(&channels);
        assert_eq!(payload[0], 0xFF);
        assert_eq!(payload[1], 0x07);
    }
}
