use std::sync::Arc;

use serde::Serialize;

use crate::aggregate::{annotate, StationTraffic, TrafficCounts};
use crate::bucket::TripIndex;
use crate::data::{Station, Trip};
use crate::time::{FilterRangeError, TimeFilter};
use crate::window::WindowWidth;

/// A loaded dataset, stations and the bucketed trips between them
#[derive(Debug)]
pub struct TrafficData {
    stations: Vec<Station>,
    index: TripIndex,
}

impl TrafficData {
    pub fn new(stations: Vec<Station>, trips: Vec<Trip>) -> TrafficData {
        TrafficData {
            stations,
            index: TripIndex::build(trips),
        }
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn index(&self) -> &TripIndex {
        &self.index
    }
}

/// Station traffic computed for one time filter, in the same order as the dataset's stations
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrafficSnapshot {
    pub filter: TimeFilter,
    pub stations: Vec<StationTraffic>,
}

impl TrafficSnapshot {
    pub fn compute(data: &TrafficData, filter: TimeFilter, width: WindowWidth) -> TrafficSnapshot {
        let counts = TrafficCounts::tally(
            data.index.departing(filter, width),
            data.index.arriving(filter, width),
        );
        TrafficSnapshot {
            filter,
            stations: annotate(&data.stations, &counts),
        }
    }

    pub fn get(&self, short_name: &str) -> Option<&StationTraffic> {
        self.stations
            .iter()
            .find(|station| station.short_name.as_str() == short_name)
    }

    pub fn max_total_traffic(&self) -> u32 {
        self.stations
            .iter()
            .map(|station| station.total_traffic)
            .max()
            .unwrap_or(0)
    }

    pub fn total_traffic(&self) -> u64 {
        self.stations
            .iter()
            .map(|station| u64::from(station.total_traffic))
            .sum()
    }
}

/// Draws station traffic, told about every recomputation
pub trait TrafficRenderer {
    fn render(&mut self, stations: &[Station], snapshot: &TrafficSnapshot);
}

impl<R: TrafficRenderer + ?Sized> TrafficRenderer for Box<R> {
    fn render(&mut self, stations: &[Station], snapshot: &TrafficSnapshot) {
        (**self).render(stations, snapshot)
    }
}

/// Holds the time filter chosen by the user and keeps a renderer up to date with the station
/// traffic for it. Starts unfiltered.
pub struct FilterController<R> {
    data: Arc<TrafficData>,
    width: WindowWidth,
    snapshot: TrafficSnapshot,
    renderer: R,
}

impl<R: TrafficRenderer> FilterController<R> {
    /// Computes the unfiltered traffic and renders it
    pub fn new(data: Arc<TrafficData>, width: WindowWidth, mut renderer: R) -> FilterController<R> {
        let snapshot = TrafficSnapshot::compute(&data, TimeFilter::Unfiltered, width);
        renderer.render(data.stations(), &snapshot);
        FilterController {
            data,
            width,
            snapshot,
            renderer,
        }
    }

    /// Takes the raw slider value, `-1` or a minute of the day. Out of range values are rejected
    /// and leave the current filter in place.
    pub fn set_time_filter(&mut self, value: i64) -> Result<&TrafficSnapshot, FilterRangeError> {
        let filter = TimeFilter::from_slider(value)?;
        Ok(self.set_filter(filter))
    }

    /// Recomputes station traffic for `filter` and renders it
    pub fn set_filter(&mut self, filter: TimeFilter) -> &TrafficSnapshot {
        self.snapshot = TrafficSnapshot::compute(&self.data, filter, self.width);
        log::debug!(
            "time filter {} counts {} station visits",
            filter,
            self.snapshot.total_traffic()
        );
        self.renderer.render(self.data.stations(), &self.snapshot);
        &self.snapshot
    }

    pub fn filter(&self) -> TimeFilter {
        self.snapshot.filter
    }

    pub fn snapshot(&self) -> &TrafficSnapshot {
        &self.snapshot
    }

    pub fn data(&self) -> &TrafficData {
        &self.data
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Access to the renderer for changes which don't depend on traffic, like moving the map
    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }
}
