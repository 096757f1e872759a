use std::collections::HashSet;
use std::fmt;

use serde::{de, Deserialize, Deserializer};
use traffic_core::Station;

use super::LoadError;

#[derive(Debug, Deserialize)]
struct StationFeed {
    data: StationList,
}

#[derive(Debug, Deserialize)]
struct StationList {
    stations: Vec<StationRecord>,
}

/// A station as published in the station information feed, other fields are ignored
#[derive(Debug, Deserialize)]
struct StationRecord {
    short_name: Option<String>,
    name: Option<String>,
    #[serde(deserialize_with = "coordinate")]
    lon: f64,
    #[serde(deserialize_with = "coordinate")]
    lat: f64,
    capacity: Option<u32>,
}

/// Parses the station feed, `{ "data": { "stations": [...] } }`.
///
/// Stations without a short name can't be matched with trips and are skipped, as are repeats of
/// a short name which has already been seen.
pub fn parse_stations(json: &[u8]) -> Result<Vec<Station>, LoadError> {
    let feed: StationFeed = serde_json::from_slice(json)?;
    let mut seen = HashSet::new();
    let mut stations = Vec::with_capacity(feed.data.stations.len());
    for record in feed.data.stations {
        let short_name = match record.short_name {
            Some(short_name) if !short_name.trim().is_empty() => short_name,
            _ => {
                log::warn!("Skipping station {:?} without a short name", record.name);
                continue;
            }
        };
        if !seen.insert(short_name.clone()) {
            log::warn!("Skipping repeated station {}", short_name);
            continue;
        }
        let mut station = Station::new(short_name, record.lon, record.lat);
        station.name = record.name;
        station.capacity = record.capacity;
        stations.push(station);
    }
    Ok(stations)
}

struct CoordinateVisitor;

impl<'de> de::Visitor<'de> for CoordinateVisitor {
    type Value = f64;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "a coordinate in degrees, as a number or a string")
    }

    fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        if value.is_finite() {
            Ok(value)
        } else {
            Err(de::Error::custom("coordinate must be finite"))
        }
    }

    fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(value as f64)
    }

    fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(value as f64)
    }

    fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        let value: f64 = s.trim().parse().map_err(de::Error::custom)?;
        self.visit_f64(value)
    }
}

fn coordinate<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(CoordinateVisitor)
}
