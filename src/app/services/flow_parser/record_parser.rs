//! Individual JSON entry parsing for flow batch files
//!
//! This module handles the decoding of a single flow record entry,
//! including per-field type coercion and corrupt-entry isolation.

use serde_json::{Map, Value};
use tracing::debug;

use super::field_parsers::{coerce_integer, coerce_text, coerce_timestamp};
use crate::app::models::FlowRecord;
use crate::constants::fields;

/// Outcome of decoding one input line
#[derive(Debug)]
pub struct RecordOutcome {
    /// The decoded record; a corrupt marker if the line was structurally invalid
    pub record: FlowRecord,

    /// Fields that were present but failed to coerce to their declared type
    pub fields_nulled: usize,

    /// Decode error for a structurally invalid line
    pub error: Option<String>,
}

/// Parse a single line into a flow record.
///
/// A line that does not decode as a JSON object yields the reserved corrupt
/// marker record; a valid object with an uncoercible field nulls that field
/// only.
pub fn parse_flow_record(line: &str) -> RecordOutcome {
    let entry = match serde_json::from_str::<Value>(line) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            debug!("Entry is not a JSON object: {}", kind_of(&other));
            return RecordOutcome {
                record: FlowRecord::corrupt_marker(),
                fields_nulled: 0,
                error: Some(format!("expected JSON object, got {}", kind_of(&other))),
            };
        }
        Err(e) => {
            debug!("Failed to decode entry as JSON: {}", e);
            return RecordOutcome {
                record: FlowRecord::corrupt_marker(),
                fields_nulled: 0,
                error: Some(format!("invalid JSON: {}", e)),
            };
        }
    };

    let mut nulled = 0usize;

    let record = FlowRecord {
        time: coerce_field(&entry, fields::TIME, coerce_timestamp, &mut nulled),
        duration: coerce_field(&entry, fields::DURATION, coerce_integer, &mut nulled),
        src_device: coerce_field(&entry, fields::SRC_DEVICE, coerce_text, &mut nulled),
        dst_device: coerce_field(&entry, fields::DST_DEVICE, coerce_text, &mut nulled),
        protocol: coerce_field(&entry, fields::PROTOCOL, coerce_integer, &mut nulled),
        src_port: coerce_field(&entry, fields::SRC_PORT, coerce_text, &mut nulled),
        dst_port: coerce_field(&entry, fields::DST_PORT, coerce_text, &mut nulled),
        src_packets: coerce_field(&entry, fields::SRC_PACKETS, coerce_integer, &mut nulled),
        dst_packets: coerce_field(&entry, fields::DST_PACKETS, coerce_integer, &mut nulled),
        src_bytes: coerce_field(&entry, fields::SRC_BYTES, coerce_integer, &mut nulled),
        dst_bytes: coerce_field(&entry, fields::DST_BYTES, coerce_integer, &mut nulled),
        corrupt: false,
    };

    RecordOutcome {
        record,
        fields_nulled: nulled,
        error: None,
    }
}

/// Look up and coerce one schema field.
///
/// Absent or explicitly-null fields are `None` without being counted as a
/// coercion failure; only a present, non-null value that the coercer rejects
/// increments the nulled tally.
fn coerce_field<T>(
    entry: &Map<String, Value>,
    name: &str,
    coerce: impl Fn(&Value) -> Option<T>,
    nulled: &mut usize,
) -> Option<T> {
    let value = entry.get(name)?;
    if value.is_null() {
        return None;
    }

    match coerce(value) {
        Some(typed) => Some(typed),
        None => {
            debug!("Failed to coerce field '{}' = {}", name, value);
            *nulled += 1;
            None
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
