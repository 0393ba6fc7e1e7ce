//! User-supplied document and sheet identifiers

use std::fmt;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// A reference to a workbook, worksheet or presentation as a tool caller names it:
/// a 1-based position or a name.
///
/// Digit-only strings are positions, so `"2"` and `2` mean the same thing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identifier {
    /// 1-based position
    Index(usize),
    /// Name (or path, for documents)
    Name(String),
}

impl Identifier {
    /// Classify a string
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();
        if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(n) = trimmed.parse() {
                return Identifier::Index(n);
            }
        }
        Identifier::Name(text.to_string())
    }

    /// Classify a JSON argument; only integers and strings are identifiers
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_u64().map(|n| Identifier::Index(n as usize)),
            Value::String(s) => Some(Self::parse(s)),
            _ => None,
        }
    }

    /// 0-based position for an `Index` that fits in `len` items
    pub fn position_in(&self, len: usize) -> Option<usize> {
        match self {
            Identifier::Index(n) if *n >= 1 && *n <= len => Some(n - 1),
            _ => None,
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Index(n) => write!(f, "{n}"),
            Identifier::Name(s) => f.write_str(s),
        }
    }
}

impl From<usize> for Identifier {
    fn from(n: usize) -> Self {
        Identifier::Index(n)
    }
}

impl From<&str> for Identifier {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Identifier::from_json(&value).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "expected a 1-based index or a name, got {value}"
            ))
        })
    }
}
