//! Enumerations for the fixed-vocabulary query parameters of the monitoring API.

use std::fmt;

/// Aggregation granularity of an energy series.
///
/// The site energy endpoints accept `Day` through `Year`; the energy details
/// endpoint also accepts the finer `QuarterOfAnHour` and `Hour` units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TimeUnit {
    QuarterOfAnHour,
    Hour,
    #[default]
    Day,
    Week,
    Month,
    Year,
}

impl TimeUnit {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            TimeUnit::QuarterOfAnHour => "QUARTER_OF_AN_HOUR",
            TimeUnit::Hour => "HOUR",
            TimeUnit::Day => "DAY",
            TimeUnit::Week => "WEEK",
            TimeUnit::Month => "MONTH",
            TimeUnit::Year => "YEAR",
        }
    }

    /// Parses the wire representation, e.g. `"DAY"`.
    pub fn from_api(value: &str) -> Option<Self> {
        match value {
            "QUARTER_OF_AN_HOUR" => Some(TimeUnit::QuarterOfAnHour),
            "HOUR" => Some(TimeUnit::Hour),
            "DAY" => Some(TimeUnit::Day),
            "WEEK" => Some(TimeUnit::Week),
            "MONTH" => Some(TimeUnit::Month),
            "YEAR" => Some(TimeUnit::Year),
            _ => None,
        }
    }
}

/// Allows formatting a `TimeUnit` as the value sent in the `timeUnit` parameter.
///
/// # Examples
///
/// ```
/// use solaredge::TimeUnit;
///
/// assert_eq!(TimeUnit::QuarterOfAnHour.to_string(), "QUARTER_OF_AN_HOUR");
/// assert_eq!(TimeUnit::default().to_string(), "DAY");
/// ```
impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Sort direction for the site list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Ascending => write!(f, "ASC"),
            SortOrder::Descending => write!(f, "DESC"),
        }
    }
}

/// Site status used to filter the site list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SiteStatus {
    Active,
    Pending,
    Disabled,
    All,
}

impl SiteStatus {
    /// The filter applied when none is given: active and pending sites.
    pub const DEFAULT_FILTER: [SiteStatus; 2] = [SiteStatus::Active, SiteStatus::Pending];
}

impl fmt::Display for SiteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SiteStatus::Active => "Active",
            SiteStatus::Pending => "Pending",
            SiteStatus::Disabled => "Disabled",
            SiteStatus::All => "All",
        };
        write!(f, "{}", name)
    }
}

/// A meter reported by the power and energy details endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Meter {
    Production,
    Consumption,
    SelfConsumption,
    FeedIn,
    Purchased,
}

impl fmt::Display for Meter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Meter::Production => "Production",
            Meter::Consumption => "Consumption",
            Meter::SelfConsumption => "SelfConsumption",
            Meter::FeedIn => "FeedIn",
            Meter::Purchased => "Purchased",
        };
        write!(f, "{}", name)
    }
}

/// Joins list-valued parameters the way the API expects them: comma separated.
pub(crate) fn join_comma<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
