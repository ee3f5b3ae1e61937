use polars::error::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SolarEdgeError {
    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}: {body}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Failed to parse JSON response from {url}")]
    JsonParse {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    // Raised before any request is sent
    #[error("Please supply a target timezone for zone-aware date '{0}'")]
    MissingTimeZone(String),

    #[error("Could not parse '{0}' as a date or date-time")]
    DateParse(String),

    #[error("Date format '{format}' cannot render the given value")]
    DateFormat { format: String },

    #[error("Unknown time zone '{0}'")]
    UnknownTimeZone(String),

    #[error("Local time {time} does not exist in time zone {zone}")]
    NonexistentLocalTime { time: String, zone: String },

    #[error("Unexpected response data: {message}")]
    UnexpectedData { message: String },

    #[error("Failed building DataFrame: {0}")]
    DataFrame(#[from] PolarsError),
}
