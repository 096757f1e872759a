use std::fmt;
use std::ops::Range;

use crate::bucket::{MinuteBuckets, TripIdx, TripIndex};
use crate::data::Trip;
use crate::time::{MinuteOfDay, TimeFilter, MINUTES_PER_DAY};

/// How far either side of the filter's centre minute trips are counted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowWidth {
    half_width: u16,
}

impl WindowWidth {
    /// The slider shows trips within an hour of the selected time
    pub const DEFAULT: WindowWidth = WindowWidth { half_width: 60 };

    /// A half-width of 720 or more would cover the whole day twice and collapse to an empty window
    pub fn half_width(minutes: u16) -> Result<WindowWidth, WindowWidthError> {
        if minutes == 0 || minutes >= MINUTES_PER_DAY / 2 {
            Err(WindowWidthError(minutes))
        } else {
            Ok(WindowWidth {
                half_width: minutes,
            })
        }
    }

    pub fn minutes(self) -> u16 {
        self.half_width
    }
}

impl Default for WindowWidth {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("window half-width must be between 1 and 719 minutes, got {0}")]
pub struct WindowWidthError(pub u16);

/// Minutes `lo` (inclusive) to `hi` (exclusive) going forwards around a 24 hour clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircularWindow {
    lo: MinuteOfDay,
    hi: MinuteOfDay,
}

impl CircularWindow {
    pub fn around(centre: MinuteOfDay, width: WindowWidth) -> CircularWindow {
        let half_width = i32::from(width.minutes());
        CircularWindow {
            lo: centre.wrapping_add(-half_width),
            hi: centre.wrapping_add(half_width),
        }
    }

    pub fn start(&self) -> MinuteOfDay {
        self.lo
    }

    pub fn end(&self) -> MinuteOfDay {
        self.hi
    }

    pub fn wraps_midnight(&self) -> bool {
        self.lo > self.hi
    }

    /// The bucket ranges covered, the second range is empty unless the window wraps midnight
    pub fn ranges(&self) -> (Range<usize>, Range<usize>) {
        let (lo, hi) = (self.lo.index(), self.hi.index());
        if lo <= hi {
            (lo..hi, 0..0)
        } else {
            (lo..MINUTES_PER_DAY.into(), 0..hi)
        }
    }

    /// Containership, inclusive of start, exclusive of end
    pub fn contains(&self, minute: MinuteOfDay) -> bool {
        if self.wraps_midnight() {
            minute >= self.lo || minute < self.hi
        } else {
            self.lo <= minute && minute < self.hi
        }
    }
}

impl fmt::Display for CircularWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}-{:?}", self.lo, self.hi)
    }
}

impl TimeFilter {
    /// The window of minutes selected by this filter, `None` for all day
    pub fn window(self, width: WindowWidth) -> Option<CircularWindow> {
        match self {
            TimeFilter::Unfiltered => None,
            TimeFilter::Windowed(centre) => Some(CircularWindow::around(centre, width)),
        }
    }
}

impl MinuteBuckets {
    /// All trips in the buckets selected by the filter, in bucket order
    pub fn select(
        &self,
        filter: TimeFilter,
        width: WindowWidth,
    ) -> impl Iterator<Item = TripIdx> + Clone + '_ {
        let (before, after) = match filter.window(width) {
            None => (0..MINUTES_PER_DAY.into(), 0..0),
            Some(window) => window.ranges(),
        };
        self.range(before)
            .iter()
            .chain(self.range(after).iter())
            .flatten()
            .copied()
    }
}

impl TripIndex {
    /// Trips that started within the filter's window
    pub fn departing(
        &self,
        filter: TimeFilter,
        width: WindowWidth,
    ) -> impl Iterator<Item = &Trip> + Clone + '_ {
        self.departures()
            .select(filter, width)
            .map(move |idx| &self[idx])
    }

    /// Trips that ended within the filter's window
    pub fn arriving(
        &self,
        filter: TimeFilter,
        width: WindowWidth,
    ) -> impl Iterator<Item = &Trip> + Clone + '_ {
        self.arrivals()
            .select(filter, width)
            .map(move |idx| &self[idx])
    }
}

#[cfg(test)]
mod test {
    use super::{CircularWindow, WindowWidth, WindowWidthError};
    use crate::bucket::test::trip;
    use crate::bucket::{TripIdx, TripIndex};
    use crate::time::{MinuteOfDay, TimeFilter};

    fn minute(m: u16) -> MinuteOfDay {
        MinuteOfDay::new(m).unwrap()
    }

    fn hhmm(m: u16) -> String {
        format!("{:02}:{:02}:00", m / 60, m % 60)
    }

    /// One trip departing and arriving at each of the given minutes
    fn index_of_minutes(minutes: &[u16]) -> TripIndex {
        TripIndex::build(
            minutes
                .iter()
                .map(|&m| trip("A", "B", &hhmm(m), &hhmm(m)))
                .collect(),
        )
    }

    fn selected_minutes(index: &TripIndex, filter: TimeFilter) -> Vec<u16> {
        let mut minutes: Vec<u16> = index
            .departing(filter, WindowWidth::DEFAULT)
            .map(|trip| MinuteOfDay::of(&trip.started_at).get())
            .collect();
        minutes.sort_unstable();
        minutes
    }

    #[test]
    fn window_bounds() {
        let window = CircularWindow::around(minute(600), WindowWidth::DEFAULT);
        assert_eq!(window.ranges(), (540..660, 0..0));
        assert!(!window.wraps_midnight());

        let window = CircularWindow::around(minute(0), WindowWidth::DEFAULT);
        assert_eq!(window.ranges(), (1380..1440, 0..60));
        assert!(window.wraps_midnight());

        let window = CircularWindow::around(minute(1439), WindowWidth::DEFAULT);
        assert_eq!(window.ranges(), (1379..1440, 0..59));

        // ends exactly on midnight
        let window = CircularWindow::around(minute(1380), WindowWidth::DEFAULT);
        assert_eq!(window.ranges(), (1320..1440, 0..0));
        let window = CircularWindow::around(minute(60), WindowWidth::DEFAULT);
        assert_eq!(window.ranges(), (0..120, 0..0));
    }

    #[test]
    fn window_is_always_twice_the_half_width() {
        for width in &[1, 15, 60, 719] {
            let width = WindowWidth::half_width(*width).unwrap();
            for centre in 0..1440 {
                let (a, b) = CircularWindow::around(minute(centre), width).ranges();
                assert_eq!(a.len() + b.len(), 2 * usize::from(width.minutes()));
            }
        }
    }

    #[test]
    fn half_width_limits() {
        assert_eq!(WindowWidth::half_width(0), Err(WindowWidthError(0)));
        assert_eq!(WindowWidth::half_width(720), Err(WindowWidthError(720)));
        assert_eq!(WindowWidth::half_width(60), Ok(WindowWidth::DEFAULT));
    }

    #[test]
    fn midnight_window_wraps() {
        let index = index_of_minutes(&[1439, 30, 500, 59, 60, 1379, 1380]);
        assert_eq!(
            selected_minutes(&index, TimeFilter::Windowed(MinuteOfDay::MIDNIGHT)),
            vec![30, 59, 1380, 1439]
        );
    }

    #[test]
    fn unfiltered_selects_everything() {
        let minutes = [0, 0, 1, 720, 1439, 1439, 1439];
        let index = index_of_minutes(&minutes);
        assert_eq!(
            selected_minutes(&index, TimeFilter::Unfiltered),
            minutes.to_vec()
        );
        let mut all: Vec<TripIdx> = index
            .arrivals()
            .select(TimeFilter::Unfiltered, WindowWidth::DEFAULT)
            .collect();
        all.sort();
        assert_eq!(all.len(), minutes.len());
        all.dedup();
        assert_eq!(all.len(), minutes.len());
    }

    #[test]
    fn selection_matches_circular_distance() {
        let every_minute: Vec<u16> = (0..1440).collect();
        let index = index_of_minutes(&every_minute);
        for centre in (0..1440).step_by(7).chain(vec![1439]) {
            let filter = TimeFilter::Windowed(minute(centre));
            let expected: Vec<u16> = every_minute
                .iter()
                .copied()
                .filter(|&m| {
                    // signed distance going forwards from the centre, in -720..720
                    let d = (i32::from(m) - i32::from(centre) + 720).rem_euclid(1440) - 720;
                    (-60..60).contains(&d)
                })
                .collect();
            assert_eq!(selected_minutes(&index, filter), expected, "centre {}", centre);

            let window = filter.window(WindowWidth::DEFAULT).unwrap();
            for &m in &every_minute {
                assert_eq!(window.contains(minute(m)), expected.binary_search(&m).is_ok());
            }
        }
    }

    #[test]
    fn departures_and_arrivals_select_independently() {
        let index = TripIndex::build(vec![
            trip("A", "B", "07:30:00", "09:45:00"),
            trip("B", "C", "09:10:00", "09:20:00"),
        ]);
        let filter = TimeFilter::Windowed(minute(9 * 60 + 30));
        let departing: Vec<_> = index
            .departing(filter, WindowWidth::DEFAULT)
            .map(|trip| trip.start_station_id.as_str())
            .collect();
        let arriving: Vec<_> = index
            .arriving(filter, WindowWidth::DEFAULT)
            .map(|trip| trip.end_station_id.as_str())
            .collect();
        assert_eq!(departing, vec!["B"]);
        assert_eq!(arriving, vec!["C", "B"]);
    }
}
