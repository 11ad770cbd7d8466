//! Hex colors used by brushes and text blocks.

use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Error;

/// 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` or `rrggbb`.
    pub fn from_hex(s: &str) -> Result<Self, Error> {
        let re = Regex::new(r"^#?([0-9a-fA-F]{2})([0-9a-fA-F]{2})([0-9a-fA-F]{2})$")
            .map_err(|e| Error::Config(e.to_string()))?;
        let caps = re
            .captures(s.trim())
            .ok_or_else(|| Error::InvalidColor(s.to_string()))?;
        let channel = |i: usize| {
            u8::from_str_radix(&caps[i], 16).map_err(|_| Error::InvalidColor(s.to_string()))
        };
        Ok(Self::new(channel(1)?, channel(2)?, channel(3)?))
    }

    /// Components in `0.0..=1.0`, as PDF color operators expect.
    pub fn normalized(self) -> [f32; 3] {
        [
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
        ]
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Rgb {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Rgb::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_and_without_hash() {
        assert_eq!(Rgb::from_hex("#ef4444").unwrap(), Rgb::new(0xef, 0x44, 0x44));
        assert_eq!(Rgb::from_hex("3B82F6").unwrap(), Rgb::new(0x3b, 0x82, 0xf6));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(Rgb::from_hex("#fff"), Err(Error::InvalidColor(_))));
        assert!(Rgb::from_hex("#gg0000").is_err());
        assert!(Rgb::from_hex("").is_err());
    }

    #[test]
    fn test_normalized() {
        let [r, g, b] = Rgb::new(255, 0, 51).normalized();
        assert_eq!(r, 1.0);
        assert_eq!(g, 0.0);
        assert!((b - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_serde_as_hex_string() {
        let json = serde_json::to_string(&Rgb::new(0x22, 0xc5, 0x5e)).unwrap();
        assert_eq!(json, "\"#22c55e\"");
        let back: Rgb = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Rgb::new(0x22, 0xc5, 0x5e));
    }
}
