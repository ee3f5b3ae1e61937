//! The date and date-time values accepted by every date-taking endpoint.

use crate::SolarEdgeError;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use std::fmt;

// Layouts carrying an offset, tried after RFC 3339.
const ZONED_LAYOUTS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%z",
];

const NAIVE_DATETIME_LAYOUTS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const NAIVE_DATE_LAYOUTS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%Y%m%d"];

/// A date or date-time supplied by the caller.
///
/// Text is kept verbatim until it is formatted, so a string that is already in
/// the layout an endpoint expects is sent unchanged. Structured values are
/// either naive (no zone, rendered as-is) or carry a fixed UTC offset, in which
/// case a target time zone is needed before they can be rendered.
///
/// Every `chrono::DateTime<Tz>` converts into [`DateInput::Zoned`], so
/// `DateTime<Utc>`, `DateTime<Local>` and `DateTime<chrono_tz::Tz>` can all be
/// passed directly.
///
/// # Examples
///
/// ```
/// use chrono::{NaiveDate, TimeZone, Utc};
/// use solaredge::DateInput;
///
/// let text: DateInput = "2021-01-01".into();
/// assert!(!text.is_zoned());
///
/// let date: DateInput = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap().into();
/// assert_eq!(date, DateInput::Date(NaiveDate::from_ymd_opt(2021, 1, 1).unwrap()));
///
/// let zoned: DateInput = Utc.with_ymd_and_hms(2021, 1, 1, 12, 0, 0).unwrap().into();
/// assert!(zoned.is_zoned());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DateInput {
    /// Free-form text, parsed only if it is not already in the target layout.
    Text(String),
    /// A calendar date. Renders as midnight when the layout has time fields.
    Date(NaiveDate),
    /// A wall-clock date-time without zone information.
    Naive(NaiveDateTime),
    /// A date-time with an explicit offset.
    Zoned(DateTime<FixedOffset>),
}

/// A [`DateInput`] after text has been parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ParsedDate {
    Naive(NaiveDateTime),
    Zoned(DateTime<FixedOffset>),
}

impl DateInput {
    /// Whether this value carries zone information.
    ///
    /// Text is only zone-aware if it parses to a value with an offset.
    pub fn is_zoned(&self) -> bool {
        match self {
            DateInput::Zoned(_) => true,
            DateInput::Text(text) => matches!(parse_text(text), Ok(ParsedDate::Zoned(_))),
            DateInput::Date(_) | DateInput::Naive(_) => false,
        }
    }

    pub(crate) fn parse(&self) -> Result<ParsedDate, SolarEdgeError> {
        match self {
            DateInput::Text(text) => parse_text(text),
            DateInput::Date(date) => Ok(ParsedDate::Naive(date.and_time(NaiveTime::MIN))),
            DateInput::Naive(naive) => Ok(ParsedDate::Naive(*naive)),
            DateInput::Zoned(zoned) => Ok(ParsedDate::Zoned(*zoned)),
        }
    }
}

/// Parses free-form date text, trying offset-carrying layouts first.
pub(crate) fn parse_text(text: &str) -> Result<ParsedDate, SolarEdgeError> {
    let text = text.trim();

    if let Ok(zoned) = DateTime::parse_from_rfc3339(text) {
        return Ok(ParsedDate::Zoned(zoned));
    }
    for layout in ZONED_LAYOUTS {
        if let Ok(zoned) = DateTime::parse_from_str(text, layout) {
            return Ok(ParsedDate::Zoned(zoned));
        }
    }
    for layout in NAIVE_DATETIME_LAYOUTS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, layout) {
            return Ok(ParsedDate::Naive(naive));
        }
    }
    for layout in NAIVE_DATE_LAYOUTS {
        if let Ok(date) = NaiveDate::parse_from_str(text, layout) {
            return Ok(ParsedDate::Naive(date.and_time(NaiveTime::MIN)));
        }
    }
    Err(SolarEdgeError::DateParse(text.to_string()))
}

impl fmt::Display for DateInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateInput::Text(text) => write!(f, "{}", text),
            DateInput::Date(date) => write!(f, "{}", date),
            DateInput::Naive(naive) => write!(f, "{}", naive),
            DateInput::Zoned(zoned) => write!(f, "{}", zoned.to_rfc3339()),
        }
    }
}

impl From<&str> for DateInput {
    fn from(value: &str) -> Self {
        DateInput::Text(value.to_string())
    }
}

impl From<String> for DateInput {
    fn from(value: String) -> Self {
        DateInput::Text(value)
    }
}

impl From<&String> for DateInput {
    fn from(value: &String) -> Self {
        DateInput::Text(value.clone())
    }
}

impl From<NaiveDate> for DateInput {
    fn from(value: NaiveDate) -> Self {
        DateInput::Date(value)
    }
}

impl From<NaiveDateTime> for DateInput {
    fn from(value: NaiveDateTime) -> Self {
        DateInput::Naive(value)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for DateInput {
    fn from(value: DateTime<Tz>) -> Self {
        DateInput::Zoned(value.fixed_offset())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_parse_rfc3339() {
        let parsed = parse_text("2021-03-04T05:06:07+02:00").unwrap();
        let expected = FixedOffset::east_opt(2 * 3600)
            .unwrap()
            .with_ymd_and_hms(2021, 3, 4, 5, 6, 7)
            .unwrap();
        assert_eq!(parsed, ParsedDate::Zoned(expected));
    }

    #[test]
    fn test_parse_space_separated_offset() {
        let parsed = parse_text("2021-03-04 05:06:07+0100").unwrap();
        assert!(matches!(parsed, ParsedDate::Zoned(dt) if dt.offset().local_minus_utc() == 3600));
    }

    #[test]
    fn test_parse_naive_layouts() {
        let expected = NaiveDate::from_ymd_opt(2021, 3, 4)
            .unwrap()
            .and_hms_opt(5, 6, 0)
            .unwrap();
        assert_eq!(
            parse_text("2021-03-04T05:06").unwrap(),
            ParsedDate::Naive(expected)
        );
        assert_eq!(
            parse_text("2021-03-04 05:06").unwrap(),
            ParsedDate::Naive(expected)
        );
    }

    #[test]
    fn test_parse_date_only_is_midnight() {
        let midnight = NaiveDate::from_ymd_opt(2021, 3, 4)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        for text in ["2021-03-04", "2021/03/04", "03/04/2021", "20210304"] {
            assert_eq!(parse_text(text).unwrap(), ParsedDate::Naive(midnight), "{}", text);
        }
    }

    #[test]
    fn test_parse_garbage_fails() {
        assert!(matches!(
            parse_text("next tuesday"),
            Err(SolarEdgeError::DateParse(text)) if text == "next tuesday"
        ));
    }

    #[test]
    fn test_from_conversions() {
        let utc = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
        assert!(matches!(DateInput::from(utc), DateInput::Zoned(_)));
        assert!(matches!(DateInput::from("x"), DateInput::Text(_)));
        assert!(!DateInput::from("2021-01-01 10:00:00").is_zoned());
        assert!(DateInput::from("2021-01-01T10:00:00Z").is_zoned());
    }
}
