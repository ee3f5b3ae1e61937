pub mod data_period;
pub mod date_input;
pub mod parameters;
