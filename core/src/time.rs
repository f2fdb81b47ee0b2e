//! Time related utils.

use chrono::NaiveDateTime;
use chrono::Utc;

use crate::Error;
use crate::Result;

/// DateTime in UTC, the only time zone this crate speaks.
pub type DateTime = chrono::DateTime<Utc>;

/// Return the current time in UTC.
pub fn now() -> DateTime {
    Utc::now()
}

/// Date format: "20220313"
pub const DATE: &str = "%Y%m%d";

/// Time format for ISO 8601 basic: "20220313T072004Z"
pub const ISO8601: &str = "%Y%m%dT%H%M%SZ";

/// Format input time into a date string like `20220313`.
pub fn format_date(t: DateTime) -> String {
    t.format(DATE).to_string()
}

/// Format input time into an ISO 8601 basic timestamp like
/// `20220313T072004Z`.
pub fn format_iso8601(t: DateTime) -> String {
    t.format(ISO8601).to_string()
}

/// Parse an ISO 8601 basic timestamp like `20220313T072004Z`.
pub fn parse_iso8601(s: &str) -> Result<DateTime> {
    let t = NaiveDateTime::parse_from_str(s, ISO8601)
        .map_err(|e| Error::signing(format!("invalid timestamp: {s}")).with_source(e))?;
    Ok(t.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixture() -> DateTime {
        Utc.with_ymd_and_hms(2022, 3, 13, 7, 20, 4).unwrap()
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(fixture()), "20220313");
    }

    #[test]
    fn test_format_iso8601() {
        assert_eq!(format_iso8601(fixture()), "20220313T072004Z");
    }

    #[test]
    fn test_parse_iso8601_round_trips() {
        assert_eq!(parse_iso8601("20220313T072004Z").unwrap(), fixture());
    }

    #[test]
    fn test_parse_iso8601_rejects_garbage() {
        assert!(parse_iso8601("2022-03-13T07:20:04Z").is_err());
        assert!(parse_iso8601("").is_err());
    }
}
