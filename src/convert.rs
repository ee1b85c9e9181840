//! Unit conversion helpers shared by the tool families.
//!
//! Calendar endpoints take epoch milliseconds while callers speak ISO-8601.
//! Money is never converted on the way out: each endpoint keeps its own unit
//! (opportunities use integer cents, catalog and invoices decimal dollars).
//! The formatters here only render those values for human-readable messages.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use miette::Diagnostic;
use thiserror::Error;
use tracing::warn;

/// Epoch milliseconds between 2001-09-09 and 2286-11-20.
const EPOCH_MILLIS_DIGITS: usize = 13;

#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    #[error("'{input}' is not an ISO-8601 timestamp, a YYYY-MM-DD date, or 13-digit epoch milliseconds")]
    #[diagnostic(code(highlevel::convert::invalid_date))]
    InvalidDate { input: String },
}

/// An epoch-millisecond value plus the warning raised if it was a fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpochMillis {
    pub millis: i64,
    pub warning: Option<String>,
}

/// Parse an RFC 3339 timestamp, a naive timestamp (read as UTC), a date-only
/// string (start of day UTC), or a 13-digit epoch-millisecond integer.
///
/// Shorter digit strings such as `2025` or `20251020` are rejected rather
/// than read as milliseconds after 1970.
pub fn parse_epoch_millis(input: &str) -> Result<i64, ConvertError> {
    let trimmed = input.trim();
    let invalid = || ConvertError::InvalidDate {
        input: input.to_string(),
    };

    if trimmed.is_empty() {
        return Err(invalid());
    }

    if trimmed.bytes().all(|b| b.is_ascii_digit()) {
        if trimmed.len() != EPOCH_MILLIS_DIGITS {
            return Err(invalid());
        }
        return trimmed.parse::<i64>().map_err(|_| invalid());
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.timestamp_millis());
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(naive.and_utc().timestamp_millis());
        }
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().timestamp_millis())
        .ok_or_else(invalid)
}

/// Like [`parse_epoch_millis`] but falls back to the current time.
///
/// The fallback is never silent: it is logged and returned as a warning the
/// caller must surface in its result envelope.
pub fn epoch_millis_or_now(field: &str, input: &str) -> EpochMillis {
    match parse_epoch_millis(input) {
        Ok(millis) => EpochMillis {
            millis,
            warning: None,
        },
        Err(err) => {
            let millis = Utc::now().timestamp_millis();
            warn!(field, input, "unparseable date, falling back to current time");
            EpochMillis {
                millis,
                warning: Some(format!("{field}: {err}; used the current time instead")),
            }
        }
    }
}

/// Current time as an ISO-8601 string with millisecond precision.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Render integer cents as `$1,234.56`.
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}${}.{:02}", group_thousands(abs / 100), abs % 100)
}

/// Render decimal dollars as `$1,234.56`.
pub fn format_dollars(amount: f64) -> String {
    format_cents((amount * 100.0).round() as i64)
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
