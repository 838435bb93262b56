//! # CRC8-DVB-S2 Implementation
//!
//! CRC-8-DVB-S2 checksum calculation for CRSF protocol.
//!
//! **Polynomial**: 0xD5 (x^8 + x^7 + x^6 + x^4 + x^2 + 1)
//! **Initial Value**: 0x00
//! **Final XOR**: none
//!
//! On the wire the checksum covers the frame type byte and the payload.
//! The destination address and the length byte are not included.

/// CRC-8-DVB-S2 polynomial
const CRC8_POLY: u8 = 0xD5;

/// Precomputed CRC8 lookup table for fast calculation
const CRC8_TABLE: [u8; 256] = generate_crc8_table();

/// Generate CRC8 lookup table at compile time
const fn generate_crc8_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;

    while i < 256 {
        let mut crc = i as u8;
        let mut j = 0;

        while j < 8 {
            if (crc & 0x80) != 0 {
                crc = (crc << 1) ^ CRC8_POLY;
            } else {
                crc <<= 1;
            }
            j += 1;
        }

        table[i] = crc;
        i += 1;
    }

    table
}

/// Calculate CRC8-DVB-S2 checksum using lookup table
///
/// # Arguments
///
/// * `data` - Byte slice to calculate CRC for (Type + Payload)
///
/// # Returns
///
/// * `u8` - Calculated CRC8 checksum
///
/// # Examples
///
/// ```
/// use crsf_decoder::crsf::crc::crc8;
///
/// // Heartbeat frame: type 0x0B, origin 0x00C8
/// let crc = crc8(&[0x0B, 0x00, 0xC8]);
/// assert_eq!(crc, crc8(&[0x0B, 0x00, 0xC8]));
/// ```
pub fn crc8(data: &[u8]) -> u8 {
    data.iter()
        .fold(0u8, |crc, &byte| CRC8_TABLE[(crc ^ byte) as usize])
}

/// Checksum of a frame given its type byte and payload separately.
///
/// Avoids concatenating type and payload into a temporary buffer.
pub fn frame_crc(frame_type: u8, payload: &[u8]) -> u8 {
    let crc = CRC8_TABLE[frame_type as usize];
    payload
        .iter()
        .fold(crc, |crc, &byte| CRC8_TABLE[(crc ^ byte) as usize])
}

/// Bit-by-bit reference implementation, used to verify the table.
#[cfg(test)]
fn crc8_slow(data: &[u8]) -> u8 {
    let mut crc: u8 = 0;

    for &byte in data {
        crc ^= byte;

        for _ in 0..8 {
            if (crc & 0x80) != 0 {
                crc = (crc << 1) ^ CRC8_POLY;
            } else {
                crc <<= 1;
            }
        }
    }

    crc
}
