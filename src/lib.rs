pub mod config;
pub mod draw;
pub mod load;

pub use traffic_core;
