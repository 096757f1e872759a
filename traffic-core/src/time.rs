use std::convert::TryFrom;
use std::fmt;

use chrono::Timelike;
use serde::{de, ser, Deserialize};

/// Number of one-minute buckets in a day
pub const MINUTES_PER_DAY: u16 = 1440;

/// A minute within a day, `hours * 60 + minutes`, in `0..1440`. Seconds are discarded.
/// # Examples
/// ```rust
/// use traffic_core::time::MinuteOfDay;
/// let minute = MinuteOfDay::new(90).unwrap();
/// assert_eq!(minute.to_string(), "1:30 AM");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct MinuteOfDay(u16);

impl MinuteOfDay {
    pub const MIDNIGHT: MinuteOfDay = MinuteOfDay(0);

    /// `None` unless `minute < 1440`
    pub fn new(minute: u16) -> Option<MinuteOfDay> {
        if minute < MINUTES_PER_DAY {
            Some(MinuteOfDay(minute))
        } else {
            None
        }
    }

    /// The minute of day of a clock time, truncating any seconds
    pub fn of<T: Timelike>(time: &T) -> MinuteOfDay {
        // hour() < 24 and minute() < 60 so this always fits
        MinuteOfDay((time.hour() * 60 + time.minute()) as u16)
    }

    /// Moves around the clock by `delta` minutes, wrapping through midnight in either direction
    pub fn wrapping_add(self, delta: i32) -> MinuteOfDay {
        let day = i32::from(MINUTES_PER_DAY);
        MinuteOfDay((i32::from(self.0) + delta).rem_euclid(day) as u16)
    }

    pub fn get(self) -> u16 {
        self.0
    }

    pub fn index(self) -> usize {
        self.0.into()
    }

    /// 24-hour clock hour
    pub fn hour(self) -> u16 {
        self.0 / 60
    }

    /// minute of the hour
    pub fn minute(self) -> u16 {
        self.0 % 60
    }
}

impl fmt::Debug for MinuteOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

/// 12 hour clock with AM / PM, as shown next to the time slider
impl fmt::Display for MinuteOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hour = self.hour();
        let meridiem = if hour < 12 { "AM" } else { "PM" };
        let hour = match hour % 12 {
            0 => 12,
            h => h,
        };
        write!(f, "{}:{:02} {}", hour, self.minute(), meridiem)
    }
}

/// Which trips count towards station traffic.
///
/// On the wire and on the slider this is a single integer, `-1` for [`TimeFilter::Unfiltered`]
/// or the centre minute of the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeFilter {
    Unfiltered,
    Windowed(MinuteOfDay),
}

impl Default for TimeFilter {
    fn default() -> Self {
        TimeFilter::Unfiltered
    }
}

impl TimeFilter {
    /// Interprets a slider value, values outside `-1..=1439` are rejected rather than clamped
    pub fn from_slider(value: i64) -> Result<TimeFilter, FilterRangeError> {
        if value == -1 {
            return Ok(TimeFilter::Unfiltered);
        }
        u16::try_from(value)
            .ok()
            .and_then(MinuteOfDay::new)
            .map(TimeFilter::Windowed)
            .ok_or(FilterRangeError(value))
    }

    pub fn slider_value(self) -> i32 {
        match self {
            TimeFilter::Unfiltered => -1,
            TimeFilter::Windowed(minute) => minute.get().into(),
        }
    }

    /// Text for the time display, `None` when any time of day is shown
    pub fn label(self) -> Option<String> {
        match self {
            TimeFilter::Unfiltered => None,
            TimeFilter::Windowed(minute) => Some(minute.to_string()),
        }
    }
}

impl fmt::Display for TimeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeFilter::Unfiltered => f.write_str("any time"),
            TimeFilter::Windowed(minute) => fmt::Display::fmt(minute, f),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("time filter {0} is outside of -1..=1439")]
pub struct FilterRangeError(pub i64);

impl std::str::FromStr for TimeFilter {
    type Err = TimeFilterParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: i64 = s.trim().parse()?;
        Ok(TimeFilter::from_slider(value)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeFilterParseError {
    #[error("time filter should be an integer: {0}")]
    ParseIntError(#[from] std::num::ParseIntError),
    #[error(transparent)]
    Range(#[from] FilterRangeError),
}

impl ser::Serialize for TimeFilter {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: ser::Serializer,
    {
        ser::Serialize::serialize(&self.slider_value(), serializer)
    }
}

struct TimeFilterVisitor;

impl<'de> de::Visitor<'de> for TimeFilterVisitor {
    type Value = TimeFilter;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "-1 or a minute of the day from 0 to 1439")
    }

    fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        TimeFilter::from_slider(value).map_err(de::Error::custom)
    }

    fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        let value = i64::try_from(value).map_err(de::Error::custom)?;
        self.visit_i64(value)
    }

    fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        s.parse().map_err(de::Error::custom)
    }
}

impl<'de> Deserialize<'de> for TimeFilter {
    fn deserialize<D>(deserializer: D) -> Result<TimeFilter, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        deserializer.deserialize_i32(TimeFilterVisitor)
    }
}
