use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A station's `short_name`, which trips refer to as their start and end station ids
#[derive(Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StationId(Arc<str>);

impl StationId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StationId {
    fn from(id: &str) -> Self {
        StationId(id.into())
    }
}

impl From<String> for StationId {
    fn from(id: String) -> Self {
        StationId(id.into())
    }
}

impl Borrow<str> for StationId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One bike trip, timestamps are local wall clock time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trip {
    pub start_station_id: StationId,
    pub end_station_id: StationId,
    pub started_at: NaiveDateTime,
    pub ended_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Station {
    pub short_name: StationId,
    pub name: Option<String>,
    /// x is longitude, y is latitude
    pub location: geo::Point<f64>,
    pub capacity: Option<u32>,
}

impl Station {
    pub fn new(short_name: impl Into<StationId>, lon: f64, lat: f64) -> Station {
        Station {
            short_name: short_name.into(),
            name: None,
            location: geo::Point::new(lon, lat),
            capacity: None,
        }
    }

    pub fn lon(&self) -> f64 {
        self.location.x()
    }

    pub fn lat(&self) -> f64 {
        self.location.y()
    }

    /// Name to show to people, falling back to the short name
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or_else(|| self.short_name.as_str())
    }
}
