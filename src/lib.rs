mod date_format;
mod error;
mod frames;
mod memo;
mod solaredge;
mod types;
mod utils;

pub use error::SolarEdgeError;
pub use solaredge::*;

pub use date_format::{format_date, DATETIME_FORMAT, DATE_FORMAT};
pub use memo::DEFAULT_CACHE_CAPACITY;
pub use utils::urljoin;

pub use types::data_period::DataPeriod;
pub use types::date_input::DateInput;
pub use types::parameters::{Meter, SiteStatus, SortOrder, TimeUnit};

pub use frames::energy_details_frame::{EnergyDetailsFrame, DATE_COLUMN};
