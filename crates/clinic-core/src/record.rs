//! Construction of new records.
//!
//! Both store backends call [`stamp_new_record`] so that generated ids, codes
//! and timestamps look identical regardless of where a record lives.

use serde_json::{Map, Value};
use time::OffsetDateTime;

use crate::error::{CoreError, Result};
use crate::kind::ResourceKind;
use crate::time::{format_timestamp, normalize_timestamp};

/// Fixed prefix of patient numbers (`2024-0001`).
pub const PATIENT_NO_PREFIX: &str = "2024";

/// Returns the generated code field for a kind, if it has one.
pub fn generated_code(
    kind: ResourceKind,
    seq: u64,
    now: OffsetDateTime,
) -> Option<(&'static str, String)> {
    match kind {
        ResourceKind::Equipment => Some(("code", format!("EQP{seq:03}"))),
        ResourceKind::Patients => Some(("patient_no", format!("{PATIENT_NO_PREFIX}-{seq:04}"))),
        ResourceKind::Consultations => Some((
            "consultation_no",
            format!("CONS-{}-{seq:04}", now.year()),
        )),
        _ => None,
    }
}

/// Builds a new record from caller-supplied fields.
///
/// Generated defaults (code, `is_active`, log `timestamp`) are laid down
/// first and the supplied fields are merged over them. The store-owned
/// fields `id`, `created_at` and `updated_at` are always written last.
///
/// A supplied log `timestamp` must be an RFC 3339 date-time and is stored
/// normalized, so logs order the same way on every backend.
pub fn stamp_new_record(
    kind: ResourceKind,
    seq: u64,
    now: OffsetDateTime,
    fields: Map<String, Value>,
) -> Result<Map<String, Value>> {
    let timestamp = format_timestamp(now)?;
    let mut record = Map::new();

    if let Some((field, code)) = generated_code(kind, seq, now) {
        record.insert(field.to_string(), Value::String(code));
    }
    if kind.has_active_flag() {
        record.insert("is_active".to_string(), Value::Bool(true));
    }
    if kind == ResourceKind::Logs {
        record.insert("timestamp".to_string(), Value::String(timestamp.clone()));
    }

    for (key, value) in fields {
        if is_store_field(&key) {
            continue;
        }
        if kind == ResourceKind::Logs && key == "timestamp" {
            record.insert(key, Value::String(log_timestamp(&value)?));
            continue;
        }
        record.insert(key, value);
    }

    record.insert("id".to_string(), Value::String(seq.to_string()));
    record.insert("created_at".to_string(), Value::String(timestamp.clone()));
    record.insert("updated_at".to_string(), Value::String(timestamp));

    Ok(record)
}

fn log_timestamp(value: &Value) -> Result<String> {
    value
        .as_str()
        .and_then(|s| normalize_timestamp(s).ok())
        .ok_or_else(|| {
            CoreError::invalid_record(format!(
                "timestamp must be an RFC 3339 date-time, got {value}"
            ))
        })
}

/// Fields only the store may write.
pub const STORE_FIELDS: [&str; 3] = ["id", "created_at", "updated_at"];

fn is_store_field(key: &str) -> bool {
    STORE_FIELDS.contains(&key)
}

/// Turns caller-supplied changes into the patch merged onto a record.
///
/// Store-owned fields are dropped and `updated_at` is set to `timestamp`.
pub fn update_patch(mut changes: Map<String, Value>, timestamp: String) -> Map<String, Value> {
    changes.retain(|key, _| !is_store_field(key));
    changes.insert("updated_at".to_string(), Value::String(timestamp));
    changes
}

/// Unwraps a JSON value that must be an object.
pub fn into_object(value: Value) -> Result<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(CoreError::invalid_record(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}
