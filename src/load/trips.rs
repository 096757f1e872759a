use std::io;

use chrono::{DateTime, NaiveDateTime};
use chrono_tz::Tz;
use serde::Deserialize;
use traffic_core::Trip;

use super::LoadError;

/// A row of the trips CSV, other columns are ignored
#[derive(Debug, Deserialize)]
struct TripRecord {
    start_station_id: String,
    end_station_id: String,
    started_at: String,
    ended_at: String,
}

const LOCAL_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parses a trip timestamp to local wall clock time in `tz`. Timestamps without an offset are
/// taken to already be local.
pub fn parse_timestamp(s: &str, tz: Tz) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(date_time) = DateTime::parse_from_rfc3339(s) {
        return Some(date_time.with_timezone(&tz).naive_local());
    }
    LOCAL_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
}

/// Parses the trips CSV. Any row which can't be read fails the whole load.
pub fn parse_trips<R: io::Read>(reader: R, tz: Tz) -> Result<Vec<Trip>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut trips = Vec::new();
    for (row, result) in rdr.deserialize().enumerate() {
        let record: TripRecord = result?;
        // the header is line 1
        let line = row as u64 + 2;
        let timestamp = |s: &str| {
            parse_timestamp(s, tz).ok_or_else(|| LoadError::Timestamp {
                timestamp: s.to_owned(),
                line,
            })
        };
        trips.push(Trip {
            started_at: timestamp(&record.started_at)?,
            ended_at: timestamp(&record.ended_at)?,
            start_station_id: record.start_station_id.into(),
            end_station_id: record.end_station_id.into(),
        });
    }
    Ok(trips)
}

#[cfg(test)]
mod test {
    use super::{parse_timestamp, parse_trips};
    use crate::load::LoadError;
    use chrono::NaiveDate;
    use traffic_core::MinuteOfDay;

    const BOSTON: chrono_tz::Tz = chrono_tz::America::New_York;

    #[test]
    fn timestamp_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_milli_opt(0, 0, 6, 795)
            .unwrap();
        assert_eq!(parse_timestamp("2024-03-01 00:00:06.795", BOSTON), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T00:00:06.795", BOSTON), Some(expected));
        let whole_minute = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(17, 45, 0)
            .unwrap();
        assert_eq!(parse_timestamp("2024-03-01 17:45", BOSTON), Some(whole_minute));
        assert_eq!(parse_timestamp("2024-03-01 17:45:00", BOSTON), Some(whole_minute));
        assert_eq!(parse_timestamp("yesterday", BOSTON), None);
        assert_eq!(parse_timestamp("2024-03-01", BOSTON), None);
    }

    #[test]
    fn offsets_convert_to_local_time() {
        // 05:30 UTC is 00:30 in Boston before daylight saving starts
        let local = parse_timestamp("2024-03-01T05:30:10Z", BOSTON).unwrap();
        assert_eq!(MinuteOfDay::of(&local).get(), 30);
        let local = parse_timestamp("2024-07-01T12:00:00-04:00", BOSTON).unwrap();
        assert_eq!(MinuteOfDay::of(&local).get(), 12 * 60);
    }

    #[test]
    fn reads_trip_rows() {
        let csv = "\
ride_id,rideable_type,started_at,ended_at,start_station_name,start_station_id,end_station_name,end_station_id,member_casual
F1,classic_bike,2024-03-01 00:05:06.795,2024-03-01 00:10:59.001,Kendall,M32003,Fan Pier,A32000,member
F2,electric_bike,2024-03-01 23:58:00,2024-03-02 00:02:00,Fan Pier,A32000,Kendall,M32003,casual
";
        let trips = parse_trips(csv.as_bytes(), BOSTON).unwrap();
        assert_eq!(trips.len(), 2);
        assert_eq!(trips[0].start_station_id.as_str(), "M32003");
        assert_eq!(trips[0].end_station_id.as_str(), "A32000");
        assert_eq!(MinuteOfDay::of(&trips[0].started_at).get(), 5);
        assert_eq!(MinuteOfDay::of(&trips[0].ended_at).get(), 10);
        assert_eq!(MinuteOfDay::of(&trips[1].started_at).get(), 1438);
        assert_eq!(MinuteOfDay::of(&trips[1].ended_at).get(), 2);
    }

    #[test]
    fn bad_timestamps_fail_the_load() {
        let csv = "\
started_at,ended_at,start_station_id,end_station_id
2024-03-01 08:00:00,2024-03-01 08:10:00,A,B
2024-03-01 09:00:00,soon,B,A
";
        match parse_trips(csv.as_bytes(), BOSTON) {
            Err(LoadError::Timestamp { timestamp, line }) => {
                assert_eq!(timestamp, "soon");
                assert_eq!(line, 3);
            }
            other => panic!("expected a timestamp error, got {:?}", other),
        }
    }

    #[test]
    fn missing_columns_fail_the_load() {
        let csv = "started_at,ended_at,start_station_id\n2024-03-01 08:00:00,2024-03-01 08:10:00,A\n";
        assert!(matches!(
            parse_trips(csv.as_bytes(), BOSTON),
            Err(LoadError::Trips(_))
        ));
    }
}
