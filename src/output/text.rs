//! Human-readable one-line rendering of decoded frames.

use std::fmt::Write;

use super::units::ChannelUnits;
use crate::crsf::protocol::*;
use crate::crsf::stream::Incomplete;

/// Render the contents of a frame
pub fn describe_kind(kind: &FrameKind, units: ChannelUnits) -> String {
    match kind {
        FrameKind::LinkStatistics(s) => format!(
            "Uplink RSSI 1: {}dBm, Uplink RSSI 2: {}dBm, Uplink Link Quality: {}%, \
             Uplink SNR: {}dB, Active Antenna: {}, RF Mode: {}, Uplink TX Power: {}mW, \
             Downlink RSSI: {}dBm, Downlink Link Quality: {}%, Downlink SNR: {}dB",
            s.uplink_rssi_ant1,
            s.uplink_rssi_ant2,
            s.uplink_link_quality,
            s.uplink_snr,
            s.active_antenna,
            s.rf_mode,
            s.uplink_tx_power.milliwatts(),
            s.downlink_rssi,
            s.downlink_link_quality,
            s.downlink_snr,
        ),
        FrameKind::RcChannelsPacked(rc) => {
            let mut out = String::new();
            for (i, &raw) in rc.channels.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                match units {
                    ChannelUnits::Raw => {
                        let _ = write!(out, "CH{}: {}", i + 1, raw);
                    }
                    _ => {
                        let _ = write!(out, "CH{}: {} ({})", i + 1, raw, units.format(raw));
                    }
                }
            }
            out
        }
        FrameKind::BatterySensor(b) => format!(
            "Voltage: {:.1}V, Current: {:.1}A, Capacity: {}mAh, Remaining: {}%",
            b.voltage_volts(),
            b.current_amps(),
            b.capacity_used,
            b.remaining_percent,
        ),
        FrameKind::FlightMode(m) => format!("Mode: {}", m.mode),
        FrameKind::Gps(g) => format!(
            "Lat: {:.7}, Lon: {:.7}, Speed: {:.1}km/h, Heading: {:.2}°, Alt: {}m, Sats: {}",
            g.latitude_degrees(),
            g.longitude_degrees(),
            g.ground_speed_kmh(),
            g.heading_degrees(),
            g.altitude_metres(),
            g.satellites,
        ),
        FrameKind::Heartbeat(h) => format!("Origin: 0x{:02X}", h.origin),
        FrameKind::Ping(p) => format!("Destination: 0x{:02X}, Origin: 0x{:02X}", p.destination, p.origin),
        FrameKind::Attitude(a) => format!(
            "Pitch: {:.4}rad, Roll: {:.4}rad, Yaw: {:.4}rad",
            a.pitch_radians(),
            a.roll_radians(),
            a.yaw_radians(),
        ),
        FrameKind::DeviceInfo(d) => format!(
            "Name: {}, Serial: 0x{:08X}, Hardware: 0x{:08X}, Firmware: 0x{:08X}, Parameters: {} (v{})",
            d.name,
            d.serial_number,
            d.hardware_version,
            d.firmware_version,
            d.parameter_count,
            d.parameter_version,
        ),
        FrameKind::Vario(v) => format!("Vertical Speed: {}cm/s", v.vertical_speed),
        FrameKind::BaroAltitude(b) => match b.vertical_speed {
            Some(vs) => format!(
                "Altitude: {:.1}m, Vertical Speed: {}cm/s",
                b.altitude_decimetres() as f32 / 10.0,
                vs
            ),
            None => format!("Altitude: {:.1}m", b.altitude_decimetres() as f32 / 10.0),
        },
        FrameKind::Unrecognized { payload } => format!("Payload: {:02X?}", payload),
        FrameKind::Invalid(e) => format!("Error: {}", e),
    }
}

/// Render a frame as a single line
pub fn format_frame(frame: &DecodedFrame, units: ChannelUnits) -> String {
    let name = match (frame.type_name(), frame.frame_type) {
        (Some(name), _) => name.to_string(),
        (None, Some(t)) => format!("Type 0x{:02X}", t),
        (None, None) => "Header".to_string(),
    };

    format!(
        "@{:<8} len {:<2} addr 0x{:02X} {}: {}",
        frame.span.offset,
        frame.span.len,
        frame.address,
        name,
        describe_kind(&frame.kind, units)
    )
}

/// Render an end-of-input partial frame
pub fn format_incomplete(incomplete: &Incomplete) -> String {
    match incomplete.expected_len {
        Some(expected) => format!(
            "@{:<8} incomplete frame: {} of {} bytes",
            incomplete.span.offset, incomplete.span.len, expected
        ),
        None => format!(
            "@{:<8} incomplete frame: {} bytes, length not yet known",
            incomplete.span.offset, incomplete.span.len
        ),
    }
}
