//! Field coercion utilities for flow records
//!
//! This module provides helper functions for coercing JSON values to the
//! semantic types declared by the flow schema. Every coercion is total:
//! a value that cannot be represented yields `None`.

use chrono::{DateTime, Utc};
use serde_json::Value;

/// Coerce a JSON value to a text field.
///
/// Ports are declared as strings in the schema but frequently arrive as
/// JSON numbers; integer values are rendered as their decimal string so the
/// downstream string-equality predicate treats `80` and `"80"` alike.
pub fn coerce_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Number(n) => n.as_i64().map(|i| i.to_string()),
        _ => None,
    }
}

/// Coerce a JSON value to an integer field
pub fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Coerce a JSON value to a timestamp field.
///
/// Accepts epoch seconds (the form produced by the flow log exporter) or
/// an RFC 3339 / `YYYY-MM-DD HH:MM:SS` string.
pub fn coerce_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n.as_i64().and_then(|secs| DateTime::from_timestamp(secs, 0)),
        Value::String(s) => {
            let trimmed = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
                Some(dt.with_timezone(&Utc))
            } else if let Ok(naive) =
                chrono::NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S")
            {
                Some(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc))
            } else {
                trimmed
                    .parse::<i64>()
                    .ok()
                    .and_then(|secs| DateTime::from_timestamp(secs, 0))
            }
        }
        _ => None,
    }
}
