//! Date parsing and formatting for `date` properties.
//!
//! Dates are stored on [`Content`](crate::content::Content) as epoch seconds
//! (`Value::Double`) so the query engine can compare them numerically. Input
//! strings are parsed with a `strftime`-style format: the property's own
//! format when the schema declares one, otherwise the project default.
//!
//! Parsing is tried from most to least specific so one format string can
//! describe zoned timestamps, naive timestamps (taken as UTC) or plain dates
//! (midnight UTC).

use crate::config::DateConfig;
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::fmt::Write;

#[derive(Debug, Clone)]
pub struct DateFormatter {
    input_format: String,
    output_format: String,
}

impl DateFormatter {
    pub fn new(input_format: impl Into<String>, output_format: impl Into<String>) -> Self {
        Self {
            input_format: input_format.into(),
            output_format: output_format.into(),
        }
    }

    pub fn from_config(config: &DateConfig) -> Self {
        Self::new(&config.input_format, &config.output_format)
    }

    /// Parse `input` to epoch seconds using `format`, or the default input format.
    pub fn parse(&self, input: &str, format: Option<&str>) -> Option<f64> {
        let format = format.unwrap_or(&self.input_format);
        let input = input.trim();
        if let Ok(zoned) = DateTime::parse_from_str(input, format) {
            return Some(zoned.timestamp_millis() as f64 / 1000.0);
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Some(naive.and_utc().timestamp_millis() as f64 / 1000.0);
        }
        let date = NaiveDate::parse_from_str(input, format).ok()?;
        let midnight = date.and_hms_opt(0, 0, 0)?;
        Some(midnight.and_utc().timestamp() as f64)
    }

    /// Format epoch seconds in UTC with `format`, or the default output format.
    ///
    /// Returns `None` for out-of-range timestamps or invalid format strings.
    pub fn format(&self, timestamp: f64, format: Option<&str>) -> Option<String> {
        let format = format.unwrap_or(&self.output_format);
        let secs = timestamp.floor();
        let nanos = ((timestamp - secs) * 1e9).round() as u32;
        let date = DateTime::from_timestamp(secs as i64, nanos.min(999_999_999))?;
        let mut out = String::new();
        write!(out, "{}", date.format(format)).ok()?;
        Some(out)
    }
}

/// Whether a `strftime` format string contains only recognised specifiers.
pub fn is_valid_format(format: &str) -> bool {
    !format.is_empty() && !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn formatter() -> DateFormatter {
        DateFormatter::new("%Y-%m-%d %H:%M:%S", "%Y-%m-%d")
    }

    #[test]
    fn parses_default_format_as_utc() {
        let ts = formatter().parse("2024-01-02 03:04:05", None).unwrap();
        assert_eq!(ts, 1_704_164_645.0);
    }

    #[test]
    fn parses_date_only_format_at_midnight() {
        let ts = formatter().parse("2024-01-02", Some("%Y-%m-%d")).unwrap();
        assert_eq!(ts, 1_704_153_600.0);
    }

    #[test]
    fn parses_zoned_format_with_offset() {
        let ts = formatter()
            .parse("2024-01-02T05:04:05+0200", Some("%Y-%m-%dT%H:%M:%S%z"))
            .unwrap();
        assert_eq!(ts, 1_704_164_645.0);
    }

    #[test]
    fn rejects_mismatched_input() {
        assert_eq!(formatter().parse("not a date", None), None);
        assert_eq!(formatter().parse("2024-13-45 00:00:00", None), None);
    }

    #[test]
    fn formats_with_default_output_format() {
        assert_eq!(
            formatter().format(1_704_164_645.0, None).as_deref(),
            Some("2024-01-02")
        );
    }

    #[test]
    fn formats_with_explicit_format() {
        assert_eq!(
            formatter()
                .format(1_704_164_645.0, Some("%H:%M"))
                .as_deref(),
            Some("03:04")
        );
    }

    #[test]
    fn validates_format_strings() {
        assert!(is_valid_format("%Y-%m-%d"));
        assert!(!is_valid_format("%Y-%"));
        assert!(!is_valid_format(""));
    }
}
