use std::collections::HashMap;

use serde::Serialize;

use crate::data::{Station, StationId, Trip};

/// Number of trips leaving and arriving at each station
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TrafficCounts {
    departures: HashMap<StationId, u32>,
    arrivals: HashMap<StationId, u32>,
}

impl TrafficCounts {
    /// Counts `departing` trips by their start station and `arriving` trips by their end station
    pub fn tally<'t, D, A>(departing: D, arriving: A) -> TrafficCounts
    where
        D: IntoIterator<Item = &'t Trip>,
        A: IntoIterator<Item = &'t Trip>,
    {
        let mut counts = TrafficCounts::default();
        for trip in departing {
            *counts
                .departures
                .entry(trip.start_station_id.clone())
                .or_insert(0) += 1;
        }
        for trip in arriving {
            *counts
                .arrivals
                .entry(trip.end_station_id.clone())
                .or_insert(0) += 1;
        }
        counts
    }

    pub fn departures(&self, station: &str) -> u32 {
        self.departures.get(station).copied().unwrap_or(0)
    }

    pub fn arrivals(&self, station: &str) -> u32 {
        self.arrivals.get(station).copied().unwrap_or(0)
    }
}

/// Traffic through one station for the current time filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StationTraffic {
    pub short_name: StationId,
    pub arrivals: u32,
    pub departures: u32,
    pub total_traffic: u32,
}

impl StationTraffic {
    fn new(short_name: StationId, arrivals: u32, departures: u32) -> StationTraffic {
        StationTraffic {
            short_name,
            arrivals,
            departures,
            total_traffic: arrivals + departures,
        }
    }

    /// Tooltip text for the station's marker
    pub fn summary(&self) -> String {
        format!(
            "{} trips ({} departures, {} arrivals)",
            self.total_traffic, self.departures, self.arrivals
        )
    }
}

/// Traffic for every station, in the order of `stations`. Stations without any counted trips
/// get zeros.
pub fn annotate(stations: &[Station], counts: &TrafficCounts) -> Vec<StationTraffic> {
    stations
        .iter()
        .map(|station| {
            let id = station.short_name.as_str();
            StationTraffic::new(
                station.short_name.clone(),
                counts.arrivals(id),
                counts.departures(id),
            )
        })
        .collect()
}

/// Traffic for every station where the same trips are counted as both departures and arrivals
pub fn annotate_subset<'t, T>(stations: &[Station], trips: T) -> Vec<StationTraffic>
where
    T: IntoIterator<Item = &'t Trip>,
    T::IntoIter: Clone,
{
    let trips = trips.into_iter();
    annotate(stations, &TrafficCounts::tally(trips.clone(), trips))
}
