use crate::date_format::localize;
use crate::types::date_input::{parse_text, ParsedDate};
use crate::SolarEdgeError;
use chrono::DateTime;
use chrono_tz::Tz;
use serde_json::Value;

/// The range for which a site has recorded data, in the site's own time zone.
///
/// Obtained from [`crate::SolarEdge::data_period_parsed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataPeriod {
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
}

impl DataPeriod {
    /// Reads `dataPeriod.startDate` and `dataPeriod.endDate` from a data period response.
    ///
    /// Boundaries with an offset are converted into `tz`; naive boundaries are
    /// taken as wall-clock time in `tz`.
    pub(crate) fn from_json(json: &Value, tz: Tz) -> Result<Self, SolarEdgeError> {
        let boundary = |field: &str| -> Result<DateTime<Tz>, SolarEdgeError> {
            let text = json["dataPeriod"][field].as_str().ok_or_else(|| {
                SolarEdgeError::UnexpectedData {
                    message: format!("dataPeriod.{} is missing or not a string", field),
                }
            })?;
            match parse_text(text)? {
                ParsedDate::Zoned(zoned) => Ok(zoned.with_timezone(&tz)),
                ParsedDate::Naive(naive) => localize(naive, tz),
            }
        };
        Ok(DataPeriod {
            start: boundary("startDate")?,
            end: boundary("endDate")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::{Australia, Europe};
    use serde_json::json;

    #[test]
    fn test_naive_dates_are_site_local() -> Result<(), SolarEdgeError> {
        let json = json!({"dataPeriod": {"startDate": "2013-05-05", "endDate": "2021-01-31"}});
        let period = DataPeriod::from_json(&json, Australia::Sydney)?;
        assert_eq!(
            period.start,
            Australia::Sydney.with_ymd_and_hms(2013, 5, 5, 0, 0, 0).unwrap()
        );
        assert_eq!(
            period.end,
            Australia::Sydney.with_ymd_and_hms(2021, 1, 31, 0, 0, 0).unwrap()
        );
        Ok(())
    }

    #[test]
    fn test_offset_dates_are_converted() -> Result<(), SolarEdgeError> {
        let json = json!({"dataPeriod": {
            "startDate": "2020-01-01T00:00:00Z",
            "endDate": "2020-07-01T00:00:00Z"
        }});
        let period = DataPeriod::from_json(&json, Europe::Brussels)?;
        assert_eq!(period.start.naive_local().to_string(), "2020-01-01 01:00:00");
        assert_eq!(period.end.naive_local().to_string(), "2020-07-01 02:00:00");
        Ok(())
    }

    #[test]
    fn test_missing_boundary_is_unexpected_data() {
        // Sites without production report null boundaries
        let json = json!({"dataPeriod": {"startDate": null, "endDate": null}});
        assert!(matches!(
            DataPeriod::from_json(&json, Europe::Brussels),
            Err(SolarEdgeError::UnexpectedData { .. })
        ));
    }
}
