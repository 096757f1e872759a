use std::fmt;
use std::io;
use std::path::PathBuf;

use chrono_tz::Tz;
use geo::MultiLineString;
use traffic_core::TrafficData;

mod lanes;
mod stations;
mod trips;

pub use lanes::parse_bike_lanes;
pub use stations::parse_stations;
pub use trips::{parse_timestamp, parse_trips};

/// Station information published by Bluebikes
pub const DEFAULT_STATIONS_URL: &str =
    "https://dsc106.com/labs/lab07/data/bluebikes-stations.json";
/// Bluebikes trips from March 2024
pub const DEFAULT_TRIPS_URL: &str =
    "https://dsc106.com/labs/lab07/data/bluebikes-traffic-2024-03.csv";
/// Boston and Cambridge bike networks, drawn under the stations
pub const DEFAULT_BIKE_LANE_URLS: &[&str] = &[
    "https://bostonopendata-boston.opendata.arcgis.com/datasets/boston::existing-bike-network-2022.geojson",
    "https://raw.githubusercontent.com/cambridgegis/cambridgegis_data/main/Transportation/Bike_Facilities/TRANSPORTATION_BikeFacilities.geojson",
];

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to fetch {url}: {error}")]
    Fetch {
        url: String,
        #[source]
        error: reqwest::Error,
    },
    #[error("failed to read {}: {error}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        error: io::Error,
    },
    #[error("invalid station data: {0}")]
    Stations(#[from] serde_json::Error),
    #[error("invalid bike lane data: {0}")]
    BikeLanes(#[source] serde_json::Error),
    #[error("invalid trip data: {0}")]
    Trips(#[from] csv::Error),
    #[error("invalid timestamp {timestamp:?} on line {line} of trip data")]
    Timestamp { timestamp: String, line: u64 },
}

/// Where a dataset is read from, a local file or an http(s) URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    File(PathBuf),
    Url(String),
}

impl std::str::FromStr for DataSource {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.starts_with("http://") || s.starts_with("https://") {
            Ok(DataSource::Url(s.to_owned()))
        } else {
            Ok(DataSource::File(PathBuf::from(s)))
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::File(path) => write!(f, "{}", path.display()),
            DataSource::Url(url) => f.write_str(url),
        }
    }
}

impl DataSource {
    pub async fn fetch(&self) -> Result<Vec<u8>, LoadError> {
        match self {
            DataSource::File(path) => tokio::fs::read(path).await.map_err(|error| LoadError::Io {
                path: path.clone(),
                error,
            }),
            DataSource::Url(url) => fetch_url(url).await.map_err(|error| LoadError::Fetch {
                url: url.clone(),
                error,
            }),
        }
    }
}

async fn fetch_url(url: &str) -> Result<Vec<u8>, reqwest::Error> {
    let response = reqwest::get(url).await?.error_for_status()?;
    Ok(response.bytes().await?.to_vec())
}

/// Loads the station list, then the trips, and buckets the trips. Nothing is returned unless
/// both datasets load completely.
pub async fn load_data(
    stations_source: &DataSource,
    trips_source: &DataSource,
    tz: Tz,
) -> Result<TrafficData, LoadError> {
    log::info!("Loading stations from {}", stations_source);
    let stations = parse_stations(&stations_source.fetch().await?)?;
    log::info!("Loaded {} stations", stations.len());

    log::info!("Loading trips from {}", trips_source);
    let trips = parse_trips(&trips_source.fetch().await?[..], tz)?;
    log::info!("Loaded {} trips", trips.len());

    let data = TrafficData::new(stations, trips);
    log::info!(
        "Departures in {} and arrivals in {} of 1440 minute buckets",
        data.index().departures().filled(),
        data.index().arrivals().filled()
    );
    Ok(data)
}

/// Loads every bike network, in order, into one set of lines
pub async fn load_bike_lanes(sources: &[DataSource]) -> Result<MultiLineString<f64>, LoadError> {
    let mut lines = Vec::new();
    for source in sources {
        log::info!("Loading bike lanes from {}", source);
        let lanes = parse_bike_lanes(&source.fetch().await?)?;
        log::info!("Loaded {} bike lane lines", lanes.0.len());
        lines.extend(lanes.0);
    }
    Ok(MultiLineString::new(lines))
}
