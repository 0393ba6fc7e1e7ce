//! RGB colours as tool callers give them

use std::fmt;

use serde::de::{self, Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{Error, Result};

/// An opaque RGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB` or `RRGGBB`
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::InvalidColor(format!(
                "expected #RRGGBB, got '{hex}'"
            )));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map_err(|_| Error::InvalidColor(hex.to_string()))
        };
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Parse a hex string or an `[r, g, b]` array
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::String(s) => Self::from_hex(s),
            Value::Array(items) if items.len() == 3 => {
                let mut channels = [0u8; 3];
                for (slot, item) in channels.iter_mut().zip(items) {
                    *slot = item
                        .as_u64()
                        .and_then(|n| u8::try_from(n).ok())
                        .ok_or_else(|| {
                            Error::InvalidColor(format!("channel {item} is not in 0..=255"))
                        })?;
                }
                Ok(Self::new(channels[0], channels[1], channels[2]))
            }
            other => Err(Error::InvalidColor(format!(
                "expected '#RRGGBB' or [r, g, b], got {other}"
            ))),
        }
    }

    /// Uppercase `RRGGBB` as DrawingML `srgbClr` wants it
    pub fn to_hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Automation `RGB()` long: red in the low byte
    pub fn to_ole(&self) -> i32 {
        self.r as i32 | (self.g as i32) << 8 | (self.b as i32) << 16
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Rgb::from_json(&value).map_err(de::Error::custom)
    }
}
