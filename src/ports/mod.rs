//! Port traits: the seams between the pure domain and the outside world.

pub mod advisor_port;
pub mod config_port;
pub mod price_data_port;
pub mod result_port;
