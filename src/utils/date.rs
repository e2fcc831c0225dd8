//! HTTP-date handling for conditional requests.
//!
//! Browsers send `If-Modified-Since` in the IMF-fixdate form
//! (`Sun, 06 Nov 1994 08:49:37 GMT`), which is also what
//! `Date.prototype.toUTCString()` produces. The two obsolete forms from
//! RFC 9110 are accepted as well:
//!
//! ```text
//! Sun, 06 Nov 1994 08:49:37 GMT    ; IMF-fixdate
//! Sunday, 06-Nov-94 08:49:37 GMT   ; obsolete RFC 850 format
//! Sun Nov  6 08:49:37 1994         ; ANSI C's asctime() format
//! ```
//!
//! The live page knows its exact last update time and sends that back as an
//! RFC 3339 timestamp with nanoseconds, which an HTTP-date cannot carry.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

/// Parse an `If-Modified-Since` value: an HTTP-date or an RFC 3339 cursor.
pub fn parse_since(value: &str) -> Option<DateTime<Utc>> {
    parse_http_date(value).or_else(|| {
        DateTime::parse_from_rfc3339(value.trim())
            .ok()
            .map(|date| date.with_timezone(&Utc))
    })
}

/// Format as an RFC 3339 cursor, keeping every nanosecond.
pub fn format_cursor(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Parse an HTTP-date. Returns `None` for anything malformed.
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(date) = DateTime::parse_from_rfc2822(value) {
        return Some(date.with_timezone(&Utc));
    }

    ["%A, %d-%b-%y %H:%M:%S GMT", "%a %b %e %H:%M:%S %Y"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
}

/// Format as IMF-fixdate.
pub fn format_http_date(date: DateTime<Utc>) -> String {
    date.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(1994, 11, 6, 8, 49, 37).unwrap()
    }

    #[test]
    fn test_parse_imf_fixdate() {
        assert_eq!(
            parse_http_date("Sun, 06 Nov 1994 08:49:37 GMT"),
            Some(reference())
        );
    }

    #[test]
    fn test_parse_obsolete_formats() {
        assert_eq!(
            parse_http_date("Sunday, 06-Nov-94 08:49:37 GMT"),
            Some(reference())
        );
        assert_eq!(
            parse_http_date("Sun Nov  6 08:49:37 1994"),
            Some(reference())
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_http_date(""), None);
        assert_eq!(parse_http_date("yesterday"), None);
        assert_eq!(parse_http_date("1994-11-06T08:49:37Z"), None);
    }

    #[test]
    fn test_since_accepts_both_forms() {
        assert_eq!(parse_since("Sun, 06 Nov 1994 08:49:37 GMT"), Some(reference()));

        let precise = reference() + chrono::TimeDelta::nanoseconds(217_062_711);
        let cursor = format_cursor(precise);
        assert_eq!(cursor, "1994-11-06T08:49:37.217062711Z");
        assert_eq!(parse_since(&cursor), Some(precise));

        assert_eq!(parse_since("last tuesday"), None);
    }

    #[test]
    fn test_format_parses_back() {
        let formatted = format_http_date(reference());
        assert_eq!(formatted, "Sun, 06 Nov 1994 08:49:37 GMT");
        assert_eq!(parse_http_date(&formatted), Some(reference()));
    }
}
