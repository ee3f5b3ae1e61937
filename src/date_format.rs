//! Normalises caller-supplied dates into the text layouts the monitoring API expects.

use crate::types::date_input::{DateInput, ParsedDate};
use crate::SolarEdgeError;
use chrono::format::{parse, Parsed, StrftimeItems};
use chrono::{DateTime, LocalResult, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use std::fmt::Write;

/// Layout of `startDate`/`endDate` query parameters.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Layout of `startTime`/`endTime` query parameters.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Renders `value` in the strftime layout `format`.
///
/// Text that already matches `format` is returned unchanged, without any zone
/// conversion. Anything else is parsed into a structured value first. A value
/// carrying an offset is converted into `tz` before rendering, and fails with
/// [`SolarEdgeError::MissingTimeZone`] when no `tz` is given. Naive values are
/// rendered as-is and `tz` is ignored.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use solaredge::{format_date, DATETIME_FORMAT};
///
/// // Already in the target layout: passed through.
/// let text = format_date("2021-01-01 10:00:00", DATETIME_FORMAT, None).unwrap();
/// assert_eq!(text, "2021-01-01 10:00:00");
///
/// // Zone-aware values need a target zone.
/// let noon_utc = Utc.with_ymd_and_hms(2021, 6, 1, 12, 0, 0).unwrap();
/// assert!(format_date(noon_utc, DATETIME_FORMAT, None).is_err());
/// let brussels = format_date(noon_utc, DATETIME_FORMAT, Some(chrono_tz::Europe::Brussels)).unwrap();
/// assert_eq!(brussels, "2021-06-01 14:00:00");
/// ```
pub fn format_date(
    value: impl Into<DateInput>,
    format: &str,
    tz: Option<Tz>,
) -> Result<String, SolarEdgeError> {
    let value = value.into();

    if let DateInput::Text(text) = &value {
        if matches_format(text, format) {
            return Ok(text.clone());
        }
    }

    let mut out = String::new();
    let written = match value.parse()? {
        ParsedDate::Naive(naive) => write!(out, "{}", naive.format(format)),
        ParsedDate::Zoned(zoned) => {
            let tz = tz.ok_or_else(|| SolarEdgeError::MissingTimeZone(value.to_string()))?;
            write!(out, "{}", zoned.with_timezone(&tz).format(format))
        }
    };
    written.map_err(|_| SolarEdgeError::DateFormat {
        format: format.to_string(),
    })?;
    Ok(out)
}

/// Attaches `tz` to a wall-clock time reported by the API.
///
/// Times in a DST fold resolve to the earlier instant; times skipped by a DST
/// gap fail with [`SolarEdgeError::NonexistentLocalTime`].
pub(crate) fn localize(naive: NaiveDateTime, tz: Tz) -> Result<DateTime<Tz>, SolarEdgeError> {
    tz.from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| SolarEdgeError::NonexistentLocalTime {
            time: naive.to_string(),
            zone: tz.name().to_string(),
        })
}

/// Like [`localize`], but a time in a DST fold resolves to the later instant.
///
/// Used for the second reading at a repeated wall-clock time.
pub(crate) fn localize_repeated(
    naive: NaiveDateTime,
    tz: Tz,
) -> Result<DateTime<Tz>, SolarEdgeError> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Ambiguous(_, later) => Ok(later),
        _ => localize(naive, tz),
    }
}

/// Whether `text` is fully consumed by the items of `format` and names a real
/// calendar date (and time, when `format` has time fields).
fn matches_format(text: &str, format: &str) -> bool {
    let mut parsed = Parsed::new();
    if parse(&mut parsed, text, StrftimeItems::new(format)).is_err() {
        return false;
    }
    parsed.to_naive_datetime_with_offset(0).is_ok() || parsed.to_naive_date().is_ok()
}
