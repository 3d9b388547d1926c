//! Time related utils.

use chrono::Utc;

/// DateTime in UTC.
pub type DateTime = chrono::DateTime<Utc>;

/// Get the current time in UTC.
pub fn now() -> DateTime {
    Utc::now()
}

/// Format a date stamp like `20220301`.
pub fn format_date(t: DateTime) -> String {
    t.format("%Y%m%d").to_string()
}

/// Format a compact ISO8601 timestamp like `20220301T165657Z`.
pub fn format_iso8601(t: DateTime) -> String {
    t.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Format an HTTP date like `Tue, 01 Mar 2022 16:56:57 GMT`, as carried
/// by the `Date` header.
pub fn format_http_date(t: DateTime) -> String {
    t.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
