//! Schema-driven sanitiser for raw form payloads.
//!
//! Browser form posts arrive as loosely typed JSON: every answer is a string,
//! checkboxes with a single tick are scalars instead of lists, and blank
//! inputs are empty strings. [`sanitise`] walks the [`Schema`] and the payload
//! together and produces a document in the shape the schema describes:
//!
//! - keys the schema does not know are dropped
//! - strings are trimmed, and blank answers are treated as absent
//! - numeric and boolean strings are coerced
//! - dates in the accepted input formats are normalised to RFC3339 UTC
//! - scalars are wrapped where a list is expected
//!
//! Values that cannot be coerced are passed through unchanged so that
//! validation reports them rather than silently losing the answer.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use serde_json::{Map, Number, Value};

use crate::schema::{Field, Kind, Sanitiser, Schema};

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid regex pattern"));

/// Naive date-time input formats, tried in order after RFC3339.
const DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%d/%m/%Y %H:%M"];

/// Date-only input formats, taken as midnight UTC.
const DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%Y-%m-%d"];

/// Sanitise `input` according to `schema`.
///
/// Returns `Value::Null` when nothing of the input survives.
#[must_use]
pub fn sanitise(schema: &Schema, input: &Value) -> Value {
    walk(schema, input).unwrap_or(Value::Null)
}

fn walk(schema: &Schema, value: &Value) -> Option<Value> {
    if let Some(cond) = schema.conditional() {
        return walk(&cond.then, value);
    }

    let coerced = match schema.kind() {
        Kind::Any => (!value.is_null()).then(|| value.clone()),
        Kind::String => to_string(value),
        Kind::Number => to_number(schema, value),
        Kind::Boolean => to_boolean(value),
        Kind::Date => to_date(value),
        Kind::Object(fields) => to_object(fields, value),
        Kind::Array(item) => to_array(item, value),
    }?;

    Some(match schema.sanitiser_hint() {
        Some(hint) => apply_hint(hint, coerced),
        None => coerced,
    })
}

fn trimmed(value: &Value) -> Option<Option<&str>> {
    match value {
        Value::String(s) => {
            let t = s.trim();
            Some((!t.is_empty()).then_some(t))
        }
        _ => None,
    }
}

fn to_string(value: &Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::String(_) => trimmed(value).flatten().map(|t| Value::String(t.to_string())),
        Value::Number(n) => Some(Value::String(n.to_string())),
        other => Some(other.clone()),
    }
}

fn to_number(schema: &Schema, value: &Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::String(_) => {
            let t = trimmed(value).flatten()?;
            if let Ok(i) = t.parse::<i64>() {
                return Some(Value::from(i));
            }
            match t.parse::<f64>() {
                Ok(f) if schema.is_integer() => Some(
                    whole(f)
                        .map(Value::from)
                        .or_else(|| Number::from_f64(f).map(Value::Number))
                        .unwrap_or_else(|| Value::String(t.to_string())),
                ),
                Ok(f) => Number::from_f64(f)
                    .map(Value::Number)
                    .or_else(|| Some(Value::String(t.to_string()))),
                Err(_) => Some(Value::String(t.to_string())),
            }
        }
        Value::Number(n) if schema.is_integer() && n.is_f64() => Some(
            n.as_f64()
                .and_then(whole)
                .map_or_else(|| value.clone(), Value::from),
        ),
        other => Some(other.clone()),
    }
}

/// The integer an integral float stands for, within the exactly representable range.
fn whole(f: f64) -> Option<i64> {
    #[allow(clippy::cast_possible_truncation)]
    (f.fract() == 0.0 && f.abs() < 9.0e15).then(|| f as i64)
}

fn to_boolean(value: &Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::String(_) => {
            let t = trimmed(value).flatten()?;
            Some(match t.to_ascii_lowercase().as_str() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => Value::String(t.to_string()),
            })
        }
        other => Some(other.clone()),
    }
}

fn to_date(value: &Value) -> Option<Value> {
    let text = match value {
        Value::Null => return None,
        Value::String(_) => trimmed(value).flatten()?.to_string(),
        Value::Object(parts) => match join_date_parts(parts) {
            Some(joined) => joined,
            None => return Some(value.clone()),
        },
        other => return Some(other.clone()),
    };

    Some(Value::String(
        parse_date(&text).map_or(text, |date| date.to_rfc3339()),
    ))
}

/// Combine the `{date, time: {hour, minute}}` shape posted by the date picker.
fn join_date_parts(parts: &Map<String, Value>) -> Option<String> {
    let date = parts.get("date")?.as_str()?.trim();
    if date.is_empty() {
        return None;
    }
    let Some(time) = parts.get("time").and_then(Value::as_object) else {
        return Some(date.to_string());
    };
    let part = |key: &str| -> Option<u32> {
        match time.get(key)? {
            Value::String(s) => s.trim().parse().ok(),
            Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
            _ => None,
        }
    };
    Some(format!("{date} {:02}:{:02}", part("hour")?, part("minute")?))
}

/// Parse a date in any accepted input format.
#[must_use]
pub fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc3339(text) {
        return Some(date.with_timezone(&Utc));
    }
    for format in DATE_TIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }
    None
}

fn to_object(fields: &[Field], value: &Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::Object(map) => {
            let mut out = Map::new();
            for field in fields {
                if let Some(sanitised) = map.get(&field.name).and_then(|v| walk(&field.schema, v)) {
                    out.insert(field.name.clone(), sanitised);
                }
            }
            Some(Value::Object(out))
        }
        other => Some(other.clone()),
    }
}

fn to_array(item: &Schema, value: &Value) -> Option<Value> {
    let items = match value {
        Value::Null => return None,
        Value::Array(items) => items.iter().filter_map(|v| walk(item, v)).collect(),
        scalar => walk(item, scalar).into_iter().collect(),
    };
    Some(Value::Array(items))
}

fn apply_hint(hint: Sanitiser, value: Value) -> Value {
    match (hint, value) {
        (Sanitiser::UpperCase, Value::String(s)) => Value::String(s.to_uppercase()),
        (Sanitiser::CollapseWhitespace, Value::String(s)) => {
            Value::String(WHITESPACE.replace_all(&s, " ").into_owned())
        }
        (Sanitiser::RemoveEmptyObjects, Value::Array(items)) => Value::Array(
            items
                .into_iter()
                .filter(|v| !v.as_object().is_some_and(Map::is_empty))
                .collect(),
        ),
        (_, other) => other,
    }
}
