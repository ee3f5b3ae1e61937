pub mod energy_details_frame;
