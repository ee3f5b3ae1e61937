//! Contains the `EnergyDetailsFrame` structure: the energy details payload as a
//! time-indexed, zone-localized Polars table.

use crate::date_format::{localize, localize_repeated};
use crate::types::date_input::{parse_text, ParsedDate};
use crate::{SolarEdgeError, TimeUnit};
use chrono::NaiveDateTime;
use chrono_tz::Tz;
use log::debug;
use polars::prelude::{
    Column, DataFrame, Expr, Int64Chunked, IntoLazy, IntoSeries, LazyFrame, NamedFrom,
    PlSmallStr, Series, TimeUnit as PolarsTimeUnit,
};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

/// Name of the timestamp column.
pub const DATE_COLUMN: &str = "date";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnergyDetailsResponse {
    energy_details: EnergyDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnergyDetails {
    time_unit: Option<String>,
    unit: Option<String>,
    meters: Vec<MeterReadings>,
}

#[derive(Debug, Deserialize)]
struct MeterReadings {
    #[serde(rename = "type")]
    meter_type: Option<String>,
    #[serde(default)]
    values: Vec<Reading>,
}

// `value` is left out by the API when no reading exists
#[derive(Debug, Deserialize)]
struct Reading {
    date: String,
    value: Option<f64>,
}

/// A wrapper around a Polars `LazyFrame` holding site energy details.
///
/// The frame has a `date` column (`Datetime[ms]` in the site's time zone)
/// followed by one `Float64` column per meter in the order the API reported
/// them (e.g. `Production`, `Consumption`). Rows are sorted by date; a meter
/// without a value at a timestamp is null.
///
/// Instances are obtained via [`crate::SolarEdge::energy_details_frame`], or
/// built from an already fetched payload with [`EnergyDetailsFrame::from_json`].
#[derive(Clone)]
pub struct EnergyDetailsFrame {
    /// The underlying Polars LazyFrame.
    pub frame: LazyFrame,
    /// Energy unit reported by the API, typically `"Wh"`.
    pub unit: Option<String>,
    /// Aggregation granularity reported by the API.
    pub time_unit: Option<TimeUnit>,
    meters: Vec<String>,
}

impl EnergyDetailsFrame {
    /// Parses an `energyDetails` response and localizes its timestamps to `tz`.
    ///
    /// # Errors
    ///
    /// Returns [`SolarEdgeError::UnexpectedData`] if the payload lacks the
    /// `energyDetails.meters` array, a meter lacks its `type` (or is named
    /// `date`), or a value lacks a `date`,
    /// [`SolarEdgeError::NonexistentLocalTime`] if a timestamp falls in a DST gap
    /// of `tz`, and [`SolarEdgeError::DataFrame`] if Polars rejects the columns.
    ///
    /// # Examples
    ///
    /// ```
    /// use solaredge::EnergyDetailsFrame;
    /// use serde_json::json;
    ///
    /// let payload = json!({"energyDetails": {
    ///     "timeUnit": "DAY",
    ///     "unit": "Wh",
    ///     "meters": [{"type": "Production", "values": [
    ///         {"date": "2021-01-01 00:00:00", "value": 5120.0},
    ///         {"date": "2021-01-02 00:00:00"}
    ///     ]}]
    /// }});
    /// let frame = EnergyDetailsFrame::from_json(&payload, chrono_tz::Europe::Brussels).unwrap();
    /// assert_eq!(frame.meter_columns(), ["Production"]);
    /// let df = frame.collect().unwrap();
    /// assert_eq!(df.height(), 2);
    /// ```
    pub fn from_json(json: &Value, tz: Tz) -> Result<Self, SolarEdgeError> {
        let response =
            EnergyDetailsResponse::deserialize(json).map_err(|e| SolarEdgeError::UnexpectedData {
                message: format!("malformed energyDetails payload: {}", e),
            })?;
        let details = response.energy_details;

        let mut names: Vec<String> = Vec::new();
        // timestamp (ms since epoch) -> value per meter column
        let mut rows: BTreeMap<i64, Vec<Option<f64>>> = BTreeMap::new();

        for meter in &details.meters {
            let name = meter.meter_type.clone().ok_or_else(|| SolarEdgeError::UnexpectedData {
                message: "energy details meter without a type".to_string(),
            })?;
            if name == DATE_COLUMN {
                return Err(SolarEdgeError::UnexpectedData {
                    message: format!("meter type '{}' collides with the date column", name),
                });
            }
            let index = match names.iter().position(|n| *n == name) {
                Some(index) => index,
                None => {
                    names.push(name);
                    names.len() - 1
                }
            };

            // wall-clock times already seen for this meter, to tell DST fold repeats apart
            let mut seen: HashSet<NaiveDateTime> = HashSet::new();
            for reading in &meter.values {
                let timestamp = Self::timestamp_millis(&reading.date, tz, &mut seen)?;
                let row = rows.entry(timestamp).or_default();
                if row.len() <= index {
                    row.resize(index + 1, None);
                }
                if let Some(v) = reading.value {
                    row[index] = Some(v);
                }
            }
        }
        debug!(
            "Parsed energy details: {} rows for meters {:?}",
            rows.len(),
            names
        );

        let timestamps: Vec<i64> = rows.keys().copied().collect();
        let date = Int64Chunked::from_vec(PlSmallStr::from_static(DATE_COLUMN), timestamps)
            .into_datetime(PolarsTimeUnit::Milliseconds, Some(tz.name().into()))
            .into_series();

        let mut columns = vec![Column::from(date)];
        for (index, name) in names.iter().enumerate() {
            let values: Vec<Option<f64>> = rows
                .values()
                .map(|row| row.get(index).copied().flatten())
                .collect();
            columns.push(Column::from(Series::new(name.as_str().into(), values)));
        }
        let df = DataFrame::new(columns)?;

        Ok(Self {
            frame: df.lazy(),
            unit: details.unit,
            time_unit: details.time_unit.as_deref().and_then(TimeUnit::from_api),
            meters: names,
        })
    }

    /// Resolves a reading's date in `tz`. The second reading at the same
    /// wall-clock time inside a DST fold maps to the later instant.
    fn timestamp_millis(
        text: &str,
        tz: Tz,
        seen: &mut HashSet<NaiveDateTime>,
    ) -> Result<i64, SolarEdgeError> {
        let instant = match parse_text(text)? {
            ParsedDate::Naive(naive) if !seen.insert(naive) => localize_repeated(naive, tz)?,
            ParsedDate::Naive(naive) => localize(naive, tz)?,
            ParsedDate::Zoned(zoned) => zoned.with_timezone(&tz),
        };
        Ok(instant.timestamp_millis())
    }

    /// Names of the meter columns, in payload order.
    pub fn meter_columns(&self) -> &[String] {
        &self.meters
    }

    /// Filters the rows based on a Polars predicate expression.
    ///
    /// Returns a *new* `EnergyDetailsFrame` with the filter applied lazily.
    pub fn filter(&self, predicate: Expr) -> EnergyDetailsFrame {
        EnergyDetailsFrame {
            frame: self.frame.clone().filter(predicate),
            ..self.clone()
        }
    }

    /// Executes the lazy plan.
    pub fn collect(&self) -> Result<DataFrame, SolarEdgeError> {
        Ok(self.frame.clone().collect()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::Europe;
    use polars::prelude::{col, lit, DataType};
    use serde_json::json;

    fn sample_payload() -> Value {
        json!({"energyDetails": {
            "timeUnit": "QUARTER_OF_AN_HOUR",
            "unit": "Wh",
            "meters": [
                {"type": "Production", "values": [
                    {"date": "2021-06-01 10:15:00", "value": 250.5},
                    {"date": "2021-06-01 10:00:00", "value": 200.0}
                ]},
                {"type": "Consumption", "values": [
                    {"date": "2021-06-01 10:00:00", "value": 90.0},
                    {"date": "2021-06-01 10:15:00"},
                    {"date": "2021-06-01 10:30:00", "value": 75.0}
                ]}
            ]
        }})
    }

    #[test]
    fn test_shape_and_metadata() -> Result<(), SolarEdgeError> {
        let frame = EnergyDetailsFrame::from_json(&sample_payload(), Europe::Brussels)?;
        assert_eq!(frame.meter_columns(), ["Production", "Consumption"]);
        assert_eq!(frame.unit.as_deref(), Some("Wh"));
        assert_eq!(frame.time_unit, Some(TimeUnit::QuarterOfAnHour));

        let df = frame.collect()?;
        assert_eq!(df.height(), 3);
        let names: Vec<&str> = df.get_column_names().iter().map(|n| n.as_str()).collect();
        assert_eq!(names, ["date", "Production", "Consumption"]);
        Ok(())
    }

    #[test]
    fn test_dates_are_sorted_and_localized() -> Result<(), SolarEdgeError> {
        let df = EnergyDetailsFrame::from_json(&sample_payload(), Europe::Brussels)?.collect()?;
        let date = df.column(DATE_COLUMN)?;
        assert_eq!(
            date.dtype(),
            &DataType::Datetime(PolarsTimeUnit::Milliseconds, Some("Europe/Brussels".into()))
        );

        let millis = date.as_materialized_series().cast(&DataType::Int64)?;
        let first = Europe::Brussels
            .with_ymd_and_hms(2021, 6, 1, 10, 0, 0)
            .unwrap()
            .timestamp_millis();
        assert_eq!(millis.i64()?.get(0), Some(first));
        assert_eq!(millis.i64()?.get(2), Some(first + 30 * 60 * 1000));
        Ok(())
    }

    #[test]
    fn test_missing_values_are_null() -> Result<(), SolarEdgeError> {
        let df = EnergyDetailsFrame::from_json(&sample_payload(), Europe::Brussels)?.collect()?;
        let production = df.column("Production")?.as_materialized_series().f64()?.clone();
        let consumption = df.column("Consumption")?.as_materialized_series().f64()?.clone();
        assert_eq!(production.get(0), Some(200.0));
        assert_eq!(production.get(1), Some(250.5));
        assert_eq!(production.get(2), None);
        assert_eq!(consumption.get(1), None);
        assert_eq!(consumption.get(2), Some(75.0));
        Ok(())
    }

    #[test]
    fn test_filter() -> Result<(), SolarEdgeError> {
        let frame = EnergyDetailsFrame::from_json(&sample_payload(), Europe::Brussels)?;
        let df = frame.filter(col("Production").gt(lit(210.0))).collect()?;
        assert_eq!(df.height(), 1);
        Ok(())
    }

    #[test]
    fn test_empty_meters() -> Result<(), SolarEdgeError> {
        let json = json!({"energyDetails": {"timeUnit": "DAY", "unit": "Wh", "meters": []}});
        let df = EnergyDetailsFrame::from_json(&json, Europe::Brussels)?.collect()?;
        assert_eq!(df.height(), 0);
        assert_eq!(df.width(), 1);
        Ok(())
    }

    #[test]
    fn test_dst_fold_keeps_both_readings() -> Result<(), SolarEdgeError> {
        let json = json!({"energyDetails": {
            "timeUnit": "HOUR",
            "unit": "Wh",
            "meters": [{"type": "Production", "values": [
                {"date": "2021-10-31 01:00:00", "value": 0.5},
                {"date": "2021-10-31 02:00:00", "value": 1.0},
                {"date": "2021-10-31 02:00:00", "value": 2.0},
                {"date": "2021-10-31 03:00:00", "value": 3.0}
            ]}]
        }});
        let df = EnergyDetailsFrame::from_json(&json, Europe::Brussels)?.collect()?;
        assert_eq!(df.height(), 4);

        let production = df.column("Production")?.as_materialized_series().f64()?.clone();
        let values: Vec<Option<f64>> = (0..4).map(|i| production.get(i)).collect();
        assert_eq!(values, [Some(0.5), Some(1.0), Some(2.0), Some(3.0)]);

        let millis = df
            .column(DATE_COLUMN)?
            .as_materialized_series()
            .cast(&DataType::Int64)?;
        let millis = millis.i64()?;
        let hour = 3600 * 1000;
        for i in 0..3 {
            assert_eq!(millis.get(i + 1).unwrap() - millis.get(i).unwrap(), hour);
        }
        Ok(())
    }

    #[test]
    fn test_meter_without_type_is_unexpected() {
        let json = json!({"energyDetails": {"meters": [
            {"values": [{"date": "2021-06-01 10:00:00", "value": 1.0}]}
        ]}});
        assert!(matches!(
            EnergyDetailsFrame::from_json(&json, Europe::Brussels),
            Err(SolarEdgeError::UnexpectedData { .. })
        ));
    }

    #[test]
    fn test_meter_named_date_is_unexpected() {
        let json = json!({"energyDetails": {"meters": [
            {"type": "date", "values": [{"date": "2021-06-01 10:00:00", "value": 1.0}]}
        ]}});
        assert!(matches!(
            EnergyDetailsFrame::from_json(&json, Europe::Brussels),
            Err(SolarEdgeError::UnexpectedData { message }) if message.contains("date column")
        ));
    }

    #[test]
    fn test_missing_meters_is_unexpected() {
        assert!(matches!(
            EnergyDetailsFrame::from_json(&json!({"energy": {}}), Europe::Brussels),
            Err(SolarEdgeError::UnexpectedData { .. })
        ));
    }
}
