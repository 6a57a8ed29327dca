use crate::error::{CoreError, Result};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

/// Formats a timestamp the way records store it.
///
/// RFC 3339 in UTC with a fixed six-digit fraction, so stored timestamps
/// order the same way lexically and chronologically.
pub fn format_timestamp(datetime: OffsetDateTime) -> Result<String> {
    let format =
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:6]Z");
    Ok(datetime.to_offset(time::UtcOffset::UTC).format(&format)?)
}

/// Current time as a record timestamp.
pub fn now_timestamp() -> Result<String> {
    format_timestamp(OffsetDateTime::now_utc())
}

/// Re-renders an RFC 3339 date-time in the stored form.
///
/// Offsets are folded into UTC and the fraction padded to six digits, so
/// text order of normalized values matches their chronological order.
pub fn normalize_timestamp(s: &str) -> Result<String> {
    let parsed = OffsetDateTime::parse(s, &Rfc3339)
        .map_err(|e| CoreError::invalid_date(format!("Failed to parse timestamp '{s}': {e}")))?;
    format_timestamp(parsed)
}

/// Parses a calendar date from a record field.
///
/// Accepts plain `YYYY-MM-DD` as well as full RFC 3339 timestamps, in which
/// case the date part is used.
pub fn parse_date(s: &str) -> Result<Date> {
    let format = format_description!("[year]-[month]-[day]");
    if let Ok(date) = Date::parse(s, &format) {
        return Ok(date);
    }
    OffsetDateTime::parse(s, &Rfc3339)
        .map(|dt| dt.date())
        .map_err(|e| CoreError::invalid_date(format!("Failed to parse date '{s}': {e}")))
}
