//! Filter evaluation, ordering and paging over in-memory records.

use std::cmp::Ordering;

use clinic_core::parse_date;
use clinic_storage::{Filter, MAX_EXPIRY_DAYS, SortParam};
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::{Date, Duration, OffsetDateTime};

/// Text form of a scalar JSON value, the way filters compare it.
///
/// Strings compare as-is, booleans and numbers through their JSON spelling.
/// Arrays, objects and null have no text form.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Evaluates one filter against a record.
///
/// `today` anchors expiry windows.
pub fn matches(filter: &Filter, record: &Value, today: Date) -> bool {
    match filter {
        Filter::Equals { field, value } => {
            match (record.get(field).and_then(scalar_text), scalar_text(value)) {
                (Some(actual), Some(wanted)) => actual == wanted,
                _ => false,
            }
        }
        Filter::Contains { fields, needle } => {
            let needle = needle.to_lowercase();
            fields.iter().any(|field| {
                record
                    .get(field)
                    .and_then(scalar_text)
                    .is_some_and(|text| text.to_lowercase().contains(&needle))
            })
        }
        Filter::AtMost { field, limit_field } => {
            let value = record.get(field).and_then(Value::as_f64);
            let limit = record.get(limit_field).and_then(Value::as_f64);
            match (value, limit) {
                (Some(value), Some(limit)) => value <= limit,
                _ => false,
            }
        }
        Filter::ExpiresWithin { field, days } => {
            let Some(date) = record
                .get(field)
                .and_then(Value::as_str)
                .and_then(|s| parse_date(s).ok())
            else {
                return false;
            };
            let days = (*days).min(MAX_EXPIRY_DAYS);
            date <= today.saturating_add(Duration::days(i64::from(days)))
        }
    }
}

/// Returns `true` if the record satisfies every filter.
pub fn matches_all(filters: &[Filter], record: &Value, today: Date) -> bool {
    filters.iter().all(|filter| matches(filter, record, today))
}

/// Orders two records on a timestamp-like field.
///
/// Values that parse as RFC 3339 compare chronologically, anything else
/// falls back to string order. Records missing the field sort lowest.
fn compare_field(a: &Value, b: &Value, field: &str) -> Ordering {
    match (
        a.get(field).and_then(Value::as_str),
        b.get(field).and_then(Value::as_str),
    ) {
        (Some(a), Some(b)) => match (
            OffsetDateTime::parse(a, &Rfc3339),
            OffsetDateTime::parse(b, &Rfc3339),
        ) {
            (Ok(a), Ok(b)) => a.cmp(&b),
            _ => a.cmp(b),
        },
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

/// Sorts records that arrive in insertion order.
///
/// A descending sort breaks ties by putting later-inserted records first.
pub fn sort_records(records: &mut Vec<Value>, sort: &SortParam) {
    if sort.descending {
        records.reverse();
        records.sort_by(|a, b| compare_field(b, a, &sort.field));
    } else {
        records.sort_by(|a, b| compare_field(a, b, &sort.field));
    }
}

/// Cuts one page out of the filtered, sorted records.
pub fn paginate(records: Vec<Value>, offset: u64, limit: u32) -> Vec<Value> {
    let offset = usize::try_from(offset).unwrap_or(usize::MAX);
    records
        .into_iter()
        .skip(offset)
        .take(limit as usize)
        .collect()
}
