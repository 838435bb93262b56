//! # Bit Cursor
//!
//! Reads fixed-width unsigned fields from a tightly packed byte buffer.
//!
//! CRSF packs sub-byte fields LSB-first: the first field starts at bit 0 of
//! byte 0, and a field that runs past the end of a byte continues at bit 0 of
//! the next one.
//!
//! ```text
//! Byte 0: Ch1[0:7]
//! Byte 1: Ch1[8:10] | Ch2[0:4]
//! Byte 2: Ch2[5:10] | Ch3[0:1]
//! ...
//! ```

/// Cursor over a packed bit field buffer
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    bit_offset: usize,
}

impl<'a> BitReader<'a> {
    /// Create a cursor positioned at bit 0 of `data`
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, bit_offset: 0 }
    }

    /// Number of bits not yet consumed
    pub fn remaining_bits(&self) -> usize {
        self.data.len() * 8 - self.bit_offset
    }

    /// Current position in bits from the start of the buffer
    pub fn bit_offset(&self) -> usize {
        self.bit_offset
    }

    /// Read the next `width` bits (1..=32) as an unsigned value and advance.
    ///
    /// Returns `None` without advancing if fewer than `width` bits remain.
    pub fn read(&mut self, width: u32) -> Option<u32> {
        if width == 0 || width > 32 || (width as usize) > self.remaining_bits() {
            return None;
        }

        let mut value: u32 = 0;
        let mut filled: u32 = 0;

        while filled < width {
            let byte = self.data[self.bit_offset / 8];
            let shift = (self.bit_offset % 8) as u32;
            let available = 8 - shift;
            let take = available.min(width - filled);
            let mask = ((1u16 << take) - 1) as u8;

            value |= (((byte >> shift) & mask) as u32) << filled;

            filled += take;
            self.bit_offset += take as usize;
        }

        Some(value)
    }
}
