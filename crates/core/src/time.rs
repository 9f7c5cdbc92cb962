//! Timestamp formatting for log queries and log rendering.

use chrono::NaiveDateTime;

/// Format used in log query bodies (`startTime` / `endTime`).
pub const LOCAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Format used when showing timestamps to the operator.
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// `YYYY-MM-DDTHH:mm:ss`, or an empty string when there is no value.
pub fn format_local(value: Option<NaiveDateTime>) -> String {
    value
        .map(|dt| dt.format(LOCAL_FORMAT).to_string())
        .unwrap_or_default()
}

/// `YYYY-MM-DD HH:mm:ss`, or an empty string when there is no value.
pub fn format_display(value: Option<NaiveDateTime>) -> String {
    value
        .map(|dt| dt.format(DISPLAY_FORMAT).to_string())
        .unwrap_or_default()
}

/// Parse an operator-typed bound. Accepts both the local and the display form.
pub fn parse_local(input: &str) -> Option<NaiveDateTime> {
    let input = input.trim();
    NaiveDateTime::parse_from_str(input, LOCAL_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(input, DISPLAY_FORMAT))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 2)
            .unwrap()
            .and_hms_milli_opt(3, 4, 5, 678)
            .unwrap()
    }

    #[test]
    fn formats_drop_fractional_seconds() {
        assert_eq!(format_local(Some(sample())), "2025-01-02T03:04:05");
        assert_eq!(format_display(Some(sample())), "2025-01-02 03:04:05");
    }

    #[test]
    fn absent_values_render_empty() {
        assert_eq!(format_local(None), "");
        assert_eq!(format_display(None), "");
    }

    #[test]
    fn parse_accepts_both_forms() {
        let a = parse_local("2025-01-02T03:04:05").unwrap();
        let b = parse_local("2025-01-02 03:04:05").unwrap();
        assert_eq!(a, b);
        assert!(parse_local("yesterday").is_none());
    }
}
