//! Timestamp normalization for response bodies
//!
//! The backend is not consistent about timestamp shapes: some fields come as
//! full RFC 3339, others as naive date-times or bare dates. Before a body is
//! decoded into typed records, every field named like a timestamp is parsed
//! and rewritten as canonical RFC 3339 so that `DateTime<Utc>` fields always
//! decode.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::Value;

/// Object keys treated as timestamps, at any depth
pub const DATE_FIELDS: &[&str] = &["createdAt", "updatedAt", "deletedAt", "date"];

/// Parse the timestamp shapes the backend emits.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Recursively rewrite timestamp fields in place.
///
/// Unparseable values are left untouched; typed decoding reports them.
pub fn normalize_dates(value: &mut Value) {
    match value {
        Value::Array(items) => items.iter_mut().for_each(normalize_dates),
        Value::Object(map) => {
            for (key, field) in map.iter_mut() {
                match field {
                    Value::String(raw) if DATE_FIELDS.contains(&key.as_str()) => {
                        if let Some(dt) = parse_timestamp(raw) {
                            *raw = dt.to_rfc3339_opts(SecondsFormat::Millis, true);
                        }
                    }
                    Value::Array(_) | Value::Object(_) => normalize_dates(field),
                    _ => {}
                }
            }
        }
        _ => {}
    }
}
