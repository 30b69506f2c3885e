use std::fmt;

use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Scalar value of one spreadsheet cell, as seen by a template placeholder.
///
/// The enum uses an explicit `{type, value}` tagged layout so JSON reports stay stable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    /// Empty / unset cell.
    Empty,
    /// Plain text (shared, inline or formula string, or an error literal like `#N/A`).
    Text(String),
    /// IEEE-754 double precision number.
    Number(f64),
    /// Boolean.
    Boolean(bool),
    /// Numeric cell rendered with a date (or date + time) number format.
    DateTime(NaiveDateTime),
    /// Numeric cell rendered with a time-only number format.
    Time(NaiveTime),
}

impl Default for FieldValue {
    fn default() -> Self {
        FieldValue::Empty
    }
}

impl FieldValue {
    /// Returns true if the value is [`FieldValue::Empty`].
    pub fn is_empty(&self) -> bool {
        matches!(self, FieldValue::Empty)
    }

    /// Returns true for values that do not satisfy a required field: empty cells and empty text.
    ///
    /// Unlike a plain truthiness test, `0`, `FALSE` and whitespace-only text count as present:
    /// a house number of 0 or a boolean column is still data the row provides.
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Empty => true,
            FieldValue::Text(text) => text.is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Empty => Ok(()),
            FieldValue::Text(text) => f.write_str(text),
            FieldValue::Number(n) => fmt_number(*n, f),
            FieldValue::Boolean(true) => f.write_str("True"),
            FieldValue::Boolean(false) => f.write_str("False"),
            FieldValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            FieldValue::Time(t) => write!(f, "{}", t.format("%H:%M:%S")),
        }
    }
}

// Spreadsheet numbers are doubles, but integral values are almost always typed as integers
// (postcodes, house numbers, ids) and must not grow a trailing `.0`.
fn fmt_number(n: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    const I64_LIMIT: f64 = 9_223_372_036_854_775_807.0;
    if n.is_finite() && n.fract() == 0.0 && n.abs() < I64_LIMIT {
        write!(f, "{}", n as i64)
    } else {
        write!(f, "{n}")
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<NaiveDateTime> for FieldValue {
    fn from(value: NaiveDateTime) -> Self {
        FieldValue::DateTime(value)
    }
}

impl From<NaiveTime> for FieldValue {
    fn from(value: NaiveTime) -> Self {
        FieldValue::Time(value)
    }
}
