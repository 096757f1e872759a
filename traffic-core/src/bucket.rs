use std::convert::TryFrom;
use std::ops::{Index, Range};

use crate::data::Trip;
use crate::time::{MinuteOfDay, MINUTES_PER_DAY};

/// Refers to a trip held by a [`TripIndex`], only meaningful for the index which produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct TripIdx(u32);

impl TripIdx {
    fn new(idx: usize) -> TripIdx {
        TripIdx(u32::try_from(idx).expect("fewer than 2^32 trips in a dataset"))
    }

    pub fn get(self) -> usize {
        self.0 as usize
    }
}

/// One bucket per minute of the day, each holding the trips keyed to that minute
#[derive(Debug, Clone)]
pub struct MinuteBuckets {
    buckets: Vec<Vec<TripIdx>>,
}

impl MinuteBuckets {
    fn empty() -> MinuteBuckets {
        MinuteBuckets {
            buckets: vec![Vec::new(); MINUTES_PER_DAY.into()],
        }
    }

    fn push(&mut self, minute: MinuteOfDay, trip: TripIdx) {
        self.buckets[minute.index()].push(trip);
    }

    pub fn bucket(&self, minute: MinuteOfDay) -> &[TripIdx] {
        &self.buckets[minute.index()]
    }

    /// Number of minutes which have at least one trip
    pub fn filled(&self) -> usize {
        self.buckets.iter().filter(|bucket| !bucket.is_empty()).count()
    }

    /// Total number of trips across all buckets
    pub fn len(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(Vec::is_empty)
    }

    pub(crate) fn range(&self, minutes: Range<usize>) -> &[Vec<TripIdx>] {
        &self.buckets[minutes]
    }
}

/// Trips of a dataset, bucketed by the minute of day that they depart and arrive.
///
/// Built once when the dataset is loaded and read-only after that. Every trip is in exactly
/// one departure bucket, keyed by `started_at`, and one arrival bucket, keyed by `ended_at`.
#[derive(Debug, Clone)]
pub struct TripIndex {
    trips: Vec<Trip>,
    departures: MinuteBuckets,
    arrivals: MinuteBuckets,
}

impl TripIndex {
    pub fn build(trips: Vec<Trip>) -> TripIndex {
        let mut departures = MinuteBuckets::empty();
        let mut arrivals = MinuteBuckets::empty();
        for (idx, trip) in trips.iter().enumerate() {
            let idx = TripIdx::new(idx);
            departures.push(MinuteOfDay::of(&trip.started_at), idx);
            arrivals.push(MinuteOfDay::of(&trip.ended_at), idx);
        }
        TripIndex {
            trips,
            departures,
            arrivals,
        }
    }

    pub fn trips(&self) -> &[Trip] {
        &self.trips
    }

    pub fn len(&self) -> usize {
        self.trips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trips.is_empty()
    }

    /// Trips bucketed by the minute of `started_at`
    pub fn departures(&self) -> &MinuteBuckets {
        &self.departures
    }

    /// Trips bucketed by the minute of `ended_at`
    pub fn arrivals(&self) -> &MinuteBuckets {
        &self.arrivals
    }
}

impl Index<TripIdx> for TripIndex {
    type Output = Trip;

    #[inline]
    fn index(&self, idx: TripIdx) -> &Self::Output {
        &self.trips[idx.get()]
    }
}
