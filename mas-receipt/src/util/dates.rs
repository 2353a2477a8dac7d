/*!
 Contains functions that parse and format the dates stored in receipts.
*/

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

/// Suffix used by legacy receipts instead of a numeric offset
const LEGACY_TIMEZONE_SUFFIX: &str = " Etc/GMT";
/// Format of legacy receipt dates once the timezone suffix is removed
const LEGACY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse a receipt date
///
/// Receipts store dates as `IA5String`s in [RFC 3339](https://datatracker.ietf.org/doc/html/rfc3339) format,
/// i.e. `2013-08-01T07:00:00Z`. Older receipts may use `2013-08-01 07:00:00 Etc/GMT` instead.
pub fn parse_receipt_date(date: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(date) {
        return Some(parsed.with_timezone(&Utc));
    }
    let naive = date.strip_suffix(LEGACY_TIMEZONE_SUFFIX)?;
    NaiveDateTime::parse_from_str(naive, LEGACY_FORMAT)
        .ok()
        .map(|parsed| parsed.and_utc())
}

/// Format a date the same way receipts store it
pub fn format_receipt_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use crate::util::dates::{format_receipt_date, parse_receipt_date};

    #[test]
    fn can_parse_rfc3339() {
        let expected = Utc.with_ymd_and_hms(2013, 8, 1, 7, 0, 0).unwrap();
        assert_eq!(parse_receipt_date("2013-08-01T07:00:00Z"), Some(expected));
    }

    #[test]
    fn can_parse_offset() {
        let expected = Utc.with_ymd_and_hms(2013, 8, 1, 5, 0, 0).unwrap();
        assert_eq!(
            parse_receipt_date("2013-08-01T07:00:00+02:00"),
            Some(expected)
        );
    }

    #[test]
    fn can_parse_legacy() {
        let expected = Utc.with_ymd_and_hms(2013, 8, 1, 7, 0, 0).unwrap();
        assert_eq!(
            parse_receipt_date("2013-08-01 07:00:00 Etc/GMT"),
            Some(expected)
        );
    }

    #[test]
    fn cant_parse_invalid() {
        assert!(parse_receipt_date("").is_none());
        assert!(parse_receipt_date("yesterday").is_none());
        assert!(parse_receipt_date("2013-08-01 07:00:00").is_none());
    }

    #[test]
    fn can_format() {
        let date = Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 1).unwrap();
        assert_eq!(format_receipt_date(&date), "2024-02-29T23:59:01Z");
    }
}
