//! IMF-fixdate parsing and formatting for `Date`, `Expires` and `Last-Modified`

use chrono::{DateTime, Utc};
use reqwest::header::HeaderValue;

/// Parse an HTTP date such as `Wed, 21 Oct 2015 07:28:00 GMT`
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|date| date.with_timezone(&Utc))
}

/// Parse a header value holding an HTTP date
pub fn parse_header_date(value: Option<&HeaderValue>) -> Option<DateTime<Utc>> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(parse_http_date)
}

/// Format `date` in IMF-fixdate form
pub fn format_http_date(date: DateTime<Utc>) -> String {
    date.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_round_trip_imf_fixdate() {
        let date = Utc.with_ymd_and_hms(2015, 10, 21, 7, 28, 0).unwrap();
        let text = format_http_date(date);
        assert_eq!(text, "Wed, 21 Oct 2015 07:28:00 GMT");
        assert_eq!(parse_http_date(&text), Some(date));
    }

    #[test]
    fn test_rejects_garbage() {
        assert_eq!(parse_http_date("yesterday"), None);
        assert_eq!(parse_header_date(None), None);
        assert_eq!(
            parse_header_date(Some(&HeaderValue::from_static("0"))),
            None
        );
    }
}
