//! Color Encoding - Cell State to Hex
//!
//! Levels run from 0 (darkest) to 29 (brightest). Each channel quantizes
//! the level into buckets of three, 24 units per bucket.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A discrete brightness level from a rule table.
pub type CellState = i64;

// Channels are computed in i128 so every i64 level encodes without overflow.
const BUCKET: i128 = 3;
const STEP: i128 = 24;

/// Hex color derived from a [`CellState`].
///
/// For levels 0..=29 this is always six lowercase hex digits. Other levels
/// are encoded anyway and may yield wider or signed channels.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorHex(String);

impl ColorHex {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Uppercase form used in output file names.
    pub fn to_upper(&self) -> String {
        self.0.to_uppercase()
    }

    /// Opaque RGBA bytes, or `None` when the hex is not exactly six digits.
    pub fn to_rgba(&self) -> Option<[u8; 4]> {
        let s = self.0.as_str();
        if s.len() != 6 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&s[i..i + 2], 16).ok();
        Some([channel(0)?, channel(2)?, channel(4)?, 0xff])
    }
}

impl fmt::Display for ColorHex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<[u8; 3]> for ColorHex {
    fn from(rgb: [u8; 3]) -> Self {
        Self(format!("{:02x}{:02x}{:02x}", rgb[0], rgb[1], rgb[2]))
    }
}

/// Map a cell state to its color.
pub fn encode(level: CellState) -> ColorHex {
    let hex: String = (0..3).map(|offset| format_channel(channel(level, offset))).collect();
    ColorHex(hex)
}

fn channel(level: CellState, offset: i128) -> i128 {
    (i128::from(level) + BUCKET - offset).div_euclid(BUCKET) * STEP
}

fn format_channel(value: i128) -> String {
    if value < 0 {
        format!("-{:02x}", value.unsigned_abs())
    } else {
        format!("{:02x}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_levels() {
        assert_eq!(encode(0).as_str(), "180000");
        assert_eq!(encode(1).as_str(), "181800");
        assert_eq!(encode(2).as_str(), "181818");
        assert_eq!(encode(3).as_str(), "301818");
        assert_eq!(encode(29).as_str(), "f0f0f0");
    }

    #[test]
    fn test_domain_is_six_lowercase_hex_digits() {
        for level in 0..=29 {
            let hex = encode(level);
            assert_eq!(hex.as_str().len(), 6, "level {}", level);
            assert!(hex
                .as_str()
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
        }
    }

    #[test]
    fn test_channels_monotonic() {
        for level in 0..29 {
            let a = encode(level).to_rgba().unwrap();
            let b = encode(level + 1).to_rgba().unwrap();
            for c in 0..3 {
                assert!(a[c] <= b[c], "channel {} decreased at level {}", c, level);
            }
        }
    }

    #[test]
    fn test_distinct_levels_distinct_colors() {
        let seen: std::collections::HashSet<ColorHex> = (0..=29).map(encode).collect();
        assert_eq!(seen.len(), 30);
    }

    #[test]
    fn test_out_of_range_is_not_an_error() {
        assert_eq!(encode(40).as_str(), "150150138");
        assert_eq!(encode(-4).as_str(), "-18-18-18");
        assert!(encode(40).to_rgba().is_none());
    }

    #[test]
    fn test_extreme_levels_do_not_overflow() {
        assert_eq!(
            encode(i64::MAX).as_str(),
            "40000000000000008400000000000000083fffffffffffffff0"
        );
        assert_eq!(
            encode(i64::MIN).as_str(),
            "-3fffffffffffffff0-3fffffffffffffff0-40000000000000008"
        );
        assert!(encode(i64::MAX).to_rgba().is_none());
    }

    #[test]
    fn test_to_rgba() {
        assert_eq!(encode(29).to_rgba(), Some([0xf0, 0xf0, 0xf0, 0xff]));
        assert_eq!(ColorHex::from([0, 127, 255]).as_str(), "007fff");
        assert_eq!(encode(5).to_upper(), "303030");
    }
}
