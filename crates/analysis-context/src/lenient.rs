//! Forgiving readers for questionnaire fields.
//!
//! A value that cannot be read becomes `None` (or is left out of its list)
//! instead of failing the whole questionnaire. Sections report the raw values
//! they discarded so data quality can flag them.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Numbers, or numeric strings such as `"15,000,000"`, `"$2.5"` or `"12%"`.
fn read_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s
            .trim()
            .trim_start_matches('$')
            .trim_end_matches('%')
            .replace(',', "")
            .trim()
            .parse::<f64>()
            .ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

fn read_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

pub(crate) fn number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(read_number(&Value::deserialize(deserializer)?))
}

/// Whole, non-negative counts. Negative or fractional values are unreadable.
pub(crate) fn count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(read_number(&Value::deserialize(deserializer)?)
        .filter(|n| *n >= 0.0 && n.fract() == 0.0 && *n <= f64::from(u32::MAX))
        .map(|n| n as u32))
}

pub(crate) fn numbers<'de, D>(deserializer: D) -> Result<Vec<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items.iter().filter_map(read_number).collect(),
        _ => Vec::new(),
    })
}

pub(crate) fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(read_text(&Value::deserialize(deserializer)?))
}

/// A list of strings; a single string is read as a one-item list.
pub(crate) fn strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .iter()
            .filter(|v| v.is_string())
            .filter_map(read_text)
            .collect(),
        single @ Value::String(_) => read_text(&single).into_iter().collect(),
        _ => Vec::new(),
    })
}

pub(crate) fn flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => Some(b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "y" => Some(true),
            "false" | "no" | "n" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

/// A lowercase enum name, matched case-insensitively. Unknown names are unreadable.
pub(crate) fn choice<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => serde_json::from_value(Value::String(s.trim().to_lowercase())).ok(),
        _ => None,
    })
}

/// The top-level questionnaire object. Anything else reads as empty.
pub(crate) fn object(raw: Value, rejected: &mut Vec<String>) -> Map<String, Value> {
    match raw {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        _ => {
            rejected.push("questionnaire".to_string());
            Map::new()
        }
    }
}

/// Read one questionnaire section, recording `section` or `section.field`
/// for every raw value that had to be discarded.
pub(crate) fn section<T>(map: &Map<String, Value>, key: &str, rejected: &mut Vec<String>) -> Option<T>
where
    T: DeserializeOwned + Serialize,
{
    let raw = map.get(key).filter(|v| !v.is_null())?;
    let Some(fields) = raw.as_object() else {
        rejected.push(key.to_string());
        return None;
    };

    match serde_json::from_value::<T>(raw.clone()) {
        Ok(typed) => {
            if let Ok(read) = serde_json::to_value(&typed) {
                collect_discarded(key, fields, &read, rejected);
            }
            Some(typed)
        }
        Err(_) => {
            rejected.push(key.to_string());
            None
        }
    }
}

fn collect_discarded(section: &str, raw: &Map<String, Value>, read: &Value, rejected: &mut Vec<String>) {
    for (field, raw_value) in raw {
        if is_blank(raw_value) {
            continue;
        }
        // keys the schema does not know are ignored, not rejected
        let Some(read_value) = read.get(field) else {
            continue;
        };
        let discarded = match (raw_value, read_value) {
            (_, Value::Null) => true,
            (Value::Array(items), Value::Array(kept)) => {
                kept.len() < items.iter().filter(|v| !is_blank(v)).count()
            }
            (_, Value::Array(kept)) => kept.is_empty(),
            _ => false,
        };
        if discarded {
            rejected.push(format!("{}.{}", section, field));
        }
    }
}
