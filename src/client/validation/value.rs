//! Tagged values fed to formula rules.
//!
//! Raw field text is coerced once, independently per field: empty text is
//! `0`, then a float, then a boolean literal, then a `YYYY-MM-DD` date as
//! Unix seconds, and anything else stays text.

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::shared::draft::FormValues;
use crate::shared::schema::FormField;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Bool(bool),
    Text(String),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Bool(_) => "bool",
            Value::Text(_) => "text",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Text(s) => f.write_str(s),
        }
    }
}

/// Parameters visible to a formula, by field id.
pub type Parameters = HashMap<String, Value>;

pub fn coerce(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::Number(0.0);
    }
    if let Some(n) = parse_number(raw) {
        return Value::Number(n);
    }
    match raw {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if let Some(timestamp) = parse_date(raw).and_then(unix_seconds) {
        return Value::Number(timestamp as f64);
    }
    Value::Text(raw.to_string())
}

pub fn parse_number(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok()
}

/// Strict `YYYY-MM-DD`; chrono alone would also take unpadded parts.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let bytes = raw.as_bytes();
    let shaped = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !shaped {
        return None;
    }
    NaiveDate::parse_from_str(raw, DATE_FORMAT).ok()
}

fn unix_seconds(date: NaiveDate) -> Option<i64> {
    date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().timestamp())
}

/// Coerce every field of the form, plus any extra submitted keys.
///
/// Fields without a submitted value count as empty text.
pub fn parameters(fields: &[FormField], values: &FormValues) -> Parameters {
    let mut raw: BTreeMap<&str, &str> = values
        .iter()
        .map(|(id, value)| (id.as_str(), value.as_str()))
        .collect();
    for field in fields {
        raw.entry(field.id.as_str()).or_insert("");
    }
    raw.into_iter()
        .map(|(id, value)| (id.to_string(), coerce(value)))
        .collect()
}
