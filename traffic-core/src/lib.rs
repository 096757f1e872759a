pub mod aggregate;
pub mod bucket;
pub mod controller;
pub mod data;
pub mod time;
pub mod window;

pub use aggregate::{annotate, annotate_subset, StationTraffic, TrafficCounts};
pub use bucket::{MinuteBuckets, TripIdx, TripIndex};
pub use controller::{FilterController, TrafficData, TrafficRenderer, TrafficSnapshot};
pub use data::{Station, StationId, Trip};
pub use time::{FilterRangeError, MinuteOfDay, TimeFilter, TimeFilterParseError, MINUTES_PER_DAY};
pub use window::{CircularWindow, WindowWidth, WindowWidthError};
