//! # Channel Units
//!
//! Display conversions for raw 11-bit RC channel values. Decoded frames
//! always carry the raw value; conversion happens only when output is
//! rendered.
//!
//! | Raw | µs | % |
//! |-----|------|------|
//! | 172 | 988 | -100 |
//! | 992 | 1500 | 0 |
//! | 1811 | 2012 | ~100 |

use serde::{Deserialize, Serialize};

use crate::crsf::protocol::{CRSF_CHANNEL_VALUE_MID, CRSF_CHANNEL_VALUE_STICK_MIN};

/// Unit used to display RC channel values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ChannelUnits {
    /// Raw 11-bit value (0-2047)
    #[default]
    Raw,

    /// Pulse width in microseconds
    #[serde(rename = "us")]
    #[value(name = "us")]
    Microseconds,

    /// Stick deflection, -100% to 100%
    Percent,
}

/// Convert a raw channel value to a pulse width in microseconds
pub fn channel_to_microseconds(raw: u16) -> u16 {
    (raw as u32 * 1024 / 1639 + 881) as u16
}

/// Convert a raw channel value to stick deflection in percent
pub fn channel_to_percent(raw: u16) -> f32 {
    let half_range = (CRSF_CHANNEL_VALUE_MID - CRSF_CHANNEL_VALUE_STICK_MIN) as f32;
    (raw as f32 - CRSF_CHANNEL_VALUE_MID as f32) * 100.0 / half_range
}

impl ChannelUnits {
    /// Convert a raw value to this unit
    pub fn convert(self, raw: u16) -> f32 {
        match self {
            ChannelUnits::Raw => raw as f32,
            ChannelUnits::Microseconds => channel_to_microseconds(raw) as f32,
            ChannelUnits::Percent => channel_to_percent(raw),
        }
    }

    /// Render a raw value with its unit suffix
    pub fn format(self, raw: u16) -> String {
        match self {
            ChannelUnits::Raw => raw.to_string(),
            ChannelUnits::Microseconds => format!("{}us", channel_to_microseconds(raw)),
            ChannelUnits::Percent => format!("{:.1}%", channel_to_percent(raw)),
        }
    }
}
