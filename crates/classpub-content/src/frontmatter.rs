//! Helpers for interpreting loosely typed frontmatter values.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

/// Parse a frontmatter value as a UTC timestamp.
///
/// Accepts RFC 3339 strings, plain `YYYY-MM-DD` dates (interpreted as
/// midnight UTC), and integer Unix timestamps. Anything else is `None`.
#[must_use]
pub fn parse_date_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.with_timezone(&Utc));
            }
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        }
        Value::Number(n) => n.as_i64().and_then(|secs| DateTime::from_timestamp(secs, 0)),
        _ => None,
    }
}

/// Interpret a frontmatter flag with a default-enabled policy.
///
/// Only the literal false-ish values disable the flag: boolean `false`,
/// number `0`, or the strings `false`, `no`, `off`, `0` (case-insensitive).
/// Anything else, including a missing value, resolves to enabled.
#[must_use]
pub fn flag_enabled(value: Option<&Value>) -> bool {
    let Some(value) = value else {
        return true;
    };
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_i64() != Some(0) && n.as_f64() != Some(0.0),
        Value::String(s) => !matches!(
            s.trim().to_lowercase().as_str(),
            "false" | "no" | "off" | "0"
        ),
        _ => true,
    }
}
