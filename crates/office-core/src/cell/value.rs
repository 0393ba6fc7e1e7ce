//! Cell value types

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::{Number, Value};

/// Membership of a formula in a shared-formula group.
///
/// The group's anchor cell carries the formula text and the `range` it covers;
/// the other members only carry the group index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedFormula {
    pub index: u32,
    pub range: Option<String>,
}

/// The value stored in (or read from) a single cell
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    /// Blank cell
    #[default]
    Empty,
    Boolean(bool),
    Number(f64),
    Text(String),
    /// A value the application reported as a date/time
    DateTime(NaiveDateTime),
    /// Error literal such as `#DIV/0!`
    Error(String),
    /// Formula text (always starting with `=`) with the last computed value
    Formula {
        text: String,
        cached_value: Box<CellValue>,
        shared: Option<SharedFormula>,
    },
}

impl CellValue {
    /// Formula with no cached result yet
    pub fn formula(text: impl Into<String>) -> Self {
        let text = text.into();
        let text = if text.starts_with('=') {
            text
        } else {
            format!("={text}")
        };
        CellValue::Formula {
            text,
            cached_value: Box::new(CellValue::Empty),
            shared: None,
        }
    }

    /// Short name of the value's variant
    pub fn type_name(&self) -> &'static str {
        match self {
            CellValue::Empty => "empty",
            CellValue::Boolean(_) => "boolean",
            CellValue::Number(_) => "number",
            CellValue::Text(_) => "text",
            CellValue::DateTime(_) => "datetime",
            CellValue::Error(_) => "error",
            CellValue::Formula { .. } => "formula",
        }
    }

    /// The displayed value: a formula's cached result, otherwise itself
    pub fn effective(&self) -> &CellValue {
        match self {
            CellValue::Formula { cached_value, .. } => cached_value.effective(),
            other => other,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    pub fn is_formula(&self) -> bool {
        matches!(self, CellValue::Formula { .. })
    }

    /// Formula text if this is a formula
    pub fn formula_text(&self) -> Option<&str> {
        match self {
            CellValue::Formula { text, .. } => Some(text),
            _ => None,
        }
    }

    /// Numeric value of the effective value (booleans are not numbers)
    pub fn as_number(&self) -> Option<f64> {
        match self.effective() {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Text of the effective value
    pub fn as_text(&self) -> Option<&str> {
        match self.effective() {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Map a JSON scalar from a tool call onto a cell value.
    ///
    /// Strings starting with `=` become formulas; arrays and objects are stored
    /// as their JSON text.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => CellValue::Empty,
            Value::Bool(b) => CellValue::Boolean(*b),
            Value::Number(n) => n
                .as_f64()
                .map(CellValue::Number)
                .unwrap_or_else(|| CellValue::Text(n.to_string())),
            Value::String(s) if s.starts_with('=') && s.len() > 1 => CellValue::formula(s.clone()),
            Value::String(s) => CellValue::Text(s.clone()),
            other => CellValue::Text(other.to_string()),
        }
    }

    /// JSON form of the effective value.
    ///
    /// A formula that was never computed reports its text rather than `null`.
    pub fn to_json(&self) -> Value {
        if let CellValue::Formula { text, cached_value, .. } = self {
            if cached_value.is_empty() {
                return Value::String(text.clone());
            }
        }
        match self.effective() {
            CellValue::Empty => Value::Null,
            CellValue::Boolean(b) => Value::Bool(*b),
            CellValue::Number(n) => number_to_json(*n),
            CellValue::Text(s) => Value::String(s.clone()),
            CellValue::DateTime(dt) => Value::String(dt.format("%Y-%m-%dT%H:%M:%S").to_string()),
            CellValue::Error(code) => Value::String(code.clone()),
            CellValue::Formula { .. } => Value::Null,
        }
    }
}

/// Days since the 1900 date system's epoch (1899-12-30), with the time as a fraction
pub fn excel_serial(dt: &NaiveDateTime) -> f64 {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default();
    (*dt - epoch).num_seconds() as f64 / 86_400.0
}

/// Whole numbers serialize as integers so `42` does not come back as `42.0`
fn number_to_json(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 9.007_199_254_740_992e15 {
        Value::Number(Number::from(n as i64))
    } else {
        Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Boolean(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Text(s) => f.write_str(s),
            CellValue::DateTime(dt) => write!(f, "{dt}"),
            CellValue::Error(code) => f.write_str(code),
            CellValue::Formula { text, .. } => f.write_str(text),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}
