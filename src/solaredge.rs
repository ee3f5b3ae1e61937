//! This module provides the main entry point for the SolarEdge monitoring API client.
//! Every remote endpoint is one method on [`SolarEdge`]; each returns the decoded
//! JSON body, and a few convenience variants return typed values instead.

use crate::date_format::{format_date, DATETIME_FORMAT, DATE_FORMAT};
use crate::error::SolarEdgeError;
use crate::frames::energy_details_frame::EnergyDetailsFrame;
use crate::memo::{Memo, DEFAULT_CACHE_CAPACITY};
use crate::types::data_period::DataPeriod;
use crate::types::date_input::DateInput;
use crate::types::parameters::{join_comma, Meter, SiteStatus, SortOrder, TimeUnit};
use crate::utils::urljoin;
use bon::bon;
use chrono_tz::Tz;
use log::{debug, warn};
use reqwest::blocking::Client;
use serde_json::Value;

/// Host of the public monitoring API.
pub const BASE_URL: &str = "https://monitoringapi.solaredge.com";

type Params = Vec<(&'static str, String)>;

/// Site list filters after defaults are applied; the memo key of [`SolarEdge::list`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ListQuery {
    size: u32,
    start_index: u32,
    search_text: Option<String>,
    sort_property: Option<String>,
    sort_order: SortOrder,
    status: Vec<SiteStatus>,
}

impl ListQuery {
    fn params(&self) -> Params {
        let mut params = vec![
            ("size", self.size.to_string()),
            ("startIndex", self.start_index.to_string()),
            ("sortOrder", self.sort_order.to_string()),
            ("status", join_comma(&self.status)),
        ];
        if let Some(search_text) = &self.search_text {
            params.push(("searchText", search_text.clone()));
        }
        if let Some(sort_property) = &self.sort_property {
            params.push(("sortProperty", sort_property.clone()));
        }
        params
    }
}

// Optional parameters are sent only when they carry a value.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// The client for the SolarEdge monitoring API.
///
/// Holds the site token and issues one blocking GET per call. The list,
/// details and data period endpoints are memoized per client: repeating a call
/// with identical arguments returns the cached body (up to 128 argument
/// combinations per endpoint, least recently used evicted first). Use
/// [`SolarEdge::clear_cache`] to force fresh data.
///
/// # Examples
///
/// ```no_run
/// use solaredge::{SolarEdge, SolarEdgeError, TimeUnit};
///
/// # fn main() -> Result<(), SolarEdgeError> {
/// let client = SolarEdge::new("MY_SITE_TOKEN");
///
/// let energy = client.energy(12345, "2021-01-01", "2021-01-31", TimeUnit::Day)?;
/// println!("{}", energy["energy"]["values"]);
///
/// let frame = client
///     .energy_details_frame(12345)
///     .start_time("2021-01-01 00:00:00")
///     .end_time("2021-01-07 23:59:59")
///     .time_unit(TimeUnit::Hour)
///     .call()?;
/// println!("{}", frame.collect()?);
/// # Ok(())
/// # }
/// ```
pub struct SolarEdge {
    token: String,
    base_url: String,
    http: Client,
    list_memo: Memo<ListQuery, Value>,
    details_memo: Memo<u64, Value>,
    data_period_memo: Memo<u64, Value>,
}

#[bon]
impl SolarEdge {
    /// Creates a client for `token` against [`BASE_URL`] with default settings.
    pub fn new(token: impl Into<String>) -> Self {
        Self::builder().token(token).build()
    }

    /// Creates a client with custom settings.
    ///
    /// * `.token(..)`: **Required.** The site or account API key.
    /// * `.base_url(..)`: Optional. Overrides [`BASE_URL`], e.g. for a proxy.
    /// * `.http_client(..)`: Optional. A pre-configured `reqwest::blocking::Client`,
    ///   e.g. one with a timeout. No timeout is set by default.
    /// * `.cache_capacity(..)`: Optional. Entries kept per memoized endpoint (default 128).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use solaredge::SolarEdge;
    /// use std::time::Duration;
    ///
    /// let http = reqwest::blocking::Client::builder()
    ///     .timeout(Duration::from_secs(30))
    ///     .build()
    ///     .unwrap();
    /// let client = SolarEdge::builder()
    ///     .token("MY_SITE_TOKEN")
    ///     .http_client(http)
    ///     .cache_capacity(16)
    ///     .build();
    /// ```
    #[builder(start_fn = builder, finish_fn = build)]
    pub fn with_settings(
        #[builder(into)] token: String,
        #[builder(into)] base_url: Option<String>,
        http_client: Option<Client>,
        cache_capacity: Option<usize>,
    ) -> Self {
        let capacity = cache_capacity.unwrap_or(DEFAULT_CACHE_CAPACITY);
        Self {
            token,
            base_url: base_url.unwrap_or_else(|| BASE_URL.to_string()),
            http: http_client.unwrap_or_default(),
            list_memo: Memo::new("sites/list", capacity),
            details_memo: Memo::new("site details", capacity),
            data_period_memo: Memo::new("site data period", capacity),
        }
    }

    /// Drops every memoized response held by this client.
    pub fn clear_cache(&self) {
        self.list_memo.clear();
        self.details_memo.clear();
        self.data_period_memo.clear();
    }

    /// Issues `GET {base_url}/{path..}?api_key=..&params..` and decodes the JSON body.
    fn get(&self, path: &[&str], params: Params) -> Result<Value, SolarEdgeError> {
        let url = urljoin(std::iter::once(self.base_url.as_str()).chain(path.iter().copied()));
        debug!("GET {}", url);

        let mut query = vec![("api_key", self.token.clone())];
        query.extend(params);

        // without_url keeps the token out of error messages
        let response = self
            .http
            .get(&url)
            .query(&query)
            .send()
            .map_err(|e| SolarEdgeError::NetworkRequest(url.clone(), e.without_url()))?;
        let status = response.status();
        let body = response
            .text()
            .map_err(|e| SolarEdgeError::NetworkRequest(url.clone(), e.without_url()))?;

        if !status.is_success() {
            warn!("HTTP error for {}: {}", url, status);
            return Err(SolarEdgeError::HttpStatus { url, status, body });
        }
        serde_json::from_str(&body).map_err(|source| SolarEdgeError::JsonParse { url, source })
    }

    fn get_site(
        &self,
        site_id: u64,
        endpoint: &str,
        params: Params,
    ) -> Result<Value, SolarEdgeError> {
        let id = site_id.to_string();
        self.get(&["site", id.as_str(), endpoint], params)
    }

    /// Lists the sites visible to the token.
    ///
    /// Defaults: `size` 100, `start_index` 0, ascending order, status
    /// `Active,Pending`. `search_text` and `sort_property` are only sent when
    /// given and non-empty. Results are memoized by the resolved arguments.
    ///
    /// ```no_run
    /// # use solaredge::{SolarEdge, SolarEdgeError, SortOrder};
    /// # fn main() -> Result<(), SolarEdgeError> {
    /// let client = SolarEdge::new("MY_ACCOUNT_TOKEN");
    /// let sites = client
    ///     .list()
    ///     .size(10)
    ///     .search_text("Main Street")
    ///     .sort_order(SortOrder::Descending)
    ///     .call()?;
    /// # Ok(())
    /// # }
    /// ```
    #[builder]
    pub fn list(
        &self,
        size: Option<u32>,
        start_index: Option<u32>,
        #[builder(into)] search_text: Option<String>,
        #[builder(into)] sort_property: Option<String>,
        sort_order: Option<SortOrder>,
        status: Option<Vec<SiteStatus>>,
    ) -> Result<Value, SolarEdgeError> {
        let query = ListQuery {
            size: size.unwrap_or(100),
            start_index: start_index.unwrap_or(0),
            search_text: non_empty(search_text),
            sort_property: non_empty(sort_property),
            sort_order: sort_order.unwrap_or_default(),
            status: status.unwrap_or_else(|| SiteStatus::DEFAULT_FILTER.to_vec()),
        };
        self.list_memo
            .get_or_try_insert_with(query.clone(), || self.get(&["sites", "list"], query.params()))
    }

    /// Site details: name, location, peak power, installation date, ... Memoized.
    pub fn details(&self, site_id: u64) -> Result<Value, SolarEdgeError> {
        self.details_memo
            .get_or_try_insert_with(site_id, || self.get_site(site_id, "details", vec![]))
    }

    /// The period for which the site has recorded data, as returned by the API. Memoized.
    pub fn data_period(&self, site_id: u64) -> Result<Value, SolarEdgeError> {
        self.data_period_memo
            .get_or_try_insert_with(site_id, || self.get_site(site_id, "dataPeriod", vec![]))
    }

    /// The data period as zone-aware values in the site's time zone.
    ///
    /// # Errors
    ///
    /// Besides request failures, returns [`SolarEdgeError::UnexpectedData`] when a
    /// boundary is absent, which is the case for sites that never reported data.
    pub fn data_period_parsed(&self, site_id: u64) -> Result<DataPeriod, SolarEdgeError> {
        let json = self.data_period(site_id)?;
        let tz = self.timezone(site_id)?;
        DataPeriod::from_json(&json, tz)
    }

    /// The IANA time zone name from the site details, e.g. `"Europe/Brussels"`.
    pub fn timezone_name(&self, site_id: u64) -> Result<String, SolarEdgeError> {
        let details = self.details(site_id)?;
        details["details"]["location"]["timeZone"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| SolarEdgeError::UnexpectedData {
                message: format!("details.location.timeZone missing for site {}", site_id),
            })
    }

    /// The site's time zone.
    pub fn timezone(&self, site_id: u64) -> Result<Tz, SolarEdgeError> {
        let name = self.timezone_name(site_id)?;
        name.parse::<Tz>()
            .map_err(|_| SolarEdgeError::UnknownTimeZone(name.clone()))
    }

    /// Site energy between two dates, aggregated by `time_unit`.
    ///
    /// Dates are sent as `%Y-%m-%d`. Text already in that layout is passed
    /// through unchanged; zone-aware values fail with
    /// [`SolarEdgeError::MissingTimeZone`] before any request is made.
    pub fn energy(
        &self,
        site_id: u64,
        start_date: impl Into<DateInput>,
        end_date: impl Into<DateInput>,
        time_unit: TimeUnit,
    ) -> Result<Value, SolarEdgeError> {
        let params = date_range_params(start_date, end_date, time_unit)?;
        self.get_site(site_id, "energy", params)
    }

    /// Total energy produced over a period. Parameters as for [`SolarEdge::energy`].
    pub fn time_frame_energy(
        &self,
        site_id: u64,
        start_date: impl Into<DateInput>,
        end_date: impl Into<DateInput>,
        time_unit: TimeUnit,
    ) -> Result<Value, SolarEdgeError> {
        let params = date_range_params(start_date, end_date, time_unit)?;
        self.get_site(site_id, "timeFrameEnergy", params)
    }

    /// Site power in 15 minute resolution. Times are sent as `%Y-%m-%d %H:%M:%S`.
    pub fn power(
        &self,
        site_id: u64,
        start_time: impl Into<DateInput>,
        end_time: impl Into<DateInput>,
    ) -> Result<Value, SolarEdgeError> {
        let params = time_range_params(start_time, end_time)?;
        self.get_site(site_id, "power", params)
    }

    /// Lifetime, yearly, monthly and daily energy and the current power.
    pub fn overview(&self, site_id: u64) -> Result<Value, SolarEdgeError> {
        self.get_site(site_id, "overview", vec![])
    }

    /// Power per meter. `meters` limits the response to the given meters.
    #[builder]
    pub fn power_details(
        &self,
        #[builder(start_fn)] site_id: u64,
        #[builder(into)] start_time: DateInput,
        #[builder(into)] end_time: DateInput,
        meters: Option<Vec<Meter>>,
    ) -> Result<Value, SolarEdgeError> {
        let mut params = time_range_params(start_time, end_time)?;
        push_list(&mut params, "meters", meters.as_deref());
        self.get_site(site_id, "powerDetails", params)
    }

    /// Energy per meter, aggregated by `time_unit` (default [`TimeUnit::Day`]).
    #[builder]
    pub fn energy_details(
        &self,
        #[builder(start_fn)] site_id: u64,
        #[builder(into)] start_time: DateInput,
        #[builder(into)] end_time: DateInput,
        meters: Option<Vec<Meter>>,
        time_unit: Option<TimeUnit>,
    ) -> Result<Value, SolarEdgeError> {
        let mut params = time_range_params(start_time, end_time)?;
        params.push(("timeUnit", time_unit.unwrap_or_default().to_string()));
        push_list(&mut params, "meters", meters.as_deref());
        self.get_site(site_id, "energyDetails", params)
    }

    /// Energy details as a table localized to the site's time zone.
    ///
    /// Unlike [`SolarEdge::energy_details`], zone-aware `start_time`/`end_time`
    /// values are accepted: they are converted into the site's time zone first.
    #[builder]
    pub fn energy_details_frame(
        &self,
        #[builder(start_fn)] site_id: u64,
        #[builder(into)] start_time: DateInput,
        #[builder(into)] end_time: DateInput,
        meters: Option<Vec<Meter>>,
        time_unit: Option<TimeUnit>,
    ) -> Result<EnergyDetailsFrame, SolarEdgeError> {
        let tz = self.timezone(site_id)?;
        let start_time = format_date(start_time, DATETIME_FORMAT, Some(tz))?;
        let end_time = format_date(end_time, DATETIME_FORMAT, Some(tz))?;
        let json = self
            .energy_details(site_id)
            .start_time(start_time)
            .end_time(end_time)
            .maybe_meters(meters)
            .maybe_time_unit(time_unit)
            .call()?;
        EnergyDetailsFrame::from_json(&json, tz)
    }

    /// Instantaneous power flow between the site's components.
    pub fn current_power_flow(&self, site_id: u64) -> Result<Value, SolarEdgeError> {
        self.get_site(site_id, "currentPowerFlow", vec![])
    }

    /// Battery state of energy and power. `serials` limits the response to the
    /// given battery serial numbers.
    #[builder]
    pub fn storage_data(
        &self,
        #[builder(start_fn)] site_id: u64,
        #[builder(into)] start_time: DateInput,
        #[builder(into)] end_time: DateInput,
        serials: Option<Vec<String>>,
    ) -> Result<Value, SolarEdgeError> {
        let mut params = time_range_params(start_time, end_time)?;
        push_list(&mut params, "serials", serials.as_deref());
        self.get_site(site_id, "storageData", params)
    }

    /// Inverters, meters, sensors and batteries installed at the site.
    pub fn inventory(&self, site_id: u64) -> Result<Value, SolarEdgeError> {
        self.get_site(site_id, "inventory", vec![])
    }
}

fn date_range_params(
    start_date: impl Into<DateInput>,
    end_date: impl Into<DateInput>,
    time_unit: TimeUnit,
) -> Result<Params, SolarEdgeError> {
    Ok(vec![
        ("startDate", format_date(start_date, DATE_FORMAT, None)?),
        ("endDate", format_date(end_date, DATE_FORMAT, None)?),
        ("timeUnit", time_unit.to_string()),
    ])
}

fn time_range_params(
    start_time: impl Into<DateInput>,
    end_time: impl Into<DateInput>,
) -> Result<Params, SolarEdgeError> {
    Ok(vec![
        ("startTime", format_date(start_time, DATETIME_FORMAT, None)?),
        ("endTime", format_date(end_time, DATETIME_FORMAT, None)?),
    ])
}

fn push_list<T: std::fmt::Display>(params: &mut Params, name: &'static str, items: Option<&[T]>) {
    if let Some(items) = items.filter(|items| !items.is_empty()) {
        params.push((name, join_comma(items)));
    }
}
