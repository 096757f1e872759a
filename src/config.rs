use std::path::PathBuf;
use std::str::FromStr;

use chrono_tz::Tz;
use traffic_core::WindowWidth;

use crate::draw::geometry::Viewport;
use crate::load::{DataSource, DEFAULT_BIKE_LANE_URLS, DEFAULT_STATIONS_URL, DEFAULT_TRIPS_URL};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {name}={value:?}: {reason}")]
pub struct ConfigError {
    pub name: &'static str,
    pub value: String,
    pub reason: String,
}

/// Server settings, read from the environment at start up
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub static_dir: PathBuf,
    pub stations_source: DataSource,
    pub trips_source: DataSource,
    /// GeoJSON bike networks drawn under the stations, may be empty
    pub bike_lane_sources: Vec<DataSource>,
    /// Zone that trip timestamps with an offset are converted to
    pub timezone: Tz,
    pub window: WindowWidth,
    /// Initial map position for new overlay sessions
    pub viewport: Viewport,
}

impl Config {
    pub fn from_env() -> Result<Config, ConfigError> {
        Config::from_vars(|name| std::env::var(name).ok())
    }

    /// Builds the config from a lookup of variable names, unset variables take their defaults
    pub fn from_vars<F>(var: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let or_default = |name: &str, default: &str| var(name).unwrap_or_else(|| default.to_owned());

        let default_viewport = Viewport::default();
        let center = default_viewport.center();
        let viewport = Viewport::new(
            geo::Point::new(
                parse_var(&var, "MAP_CENTER_LON", center.x())?,
                parse_var(&var, "MAP_CENTER_LAT", center.y())?,
            ),
            parse_var(&var, "MAP_ZOOM", default_viewport.zoom())?,
            parse_var(&var, "MAP_WIDTH", *default_viewport.width())?,
            parse_var(&var, "MAP_HEIGHT", *default_viewport.height())?,
        );

        let half_width: u16 = parse_var(&var, "WINDOW_HALF_WIDTH", WindowWidth::DEFAULT.minutes())?;
        let window = WindowWidth::half_width(half_width).map_err(|err| ConfigError {
            name: "WINDOW_HALF_WIDTH",
            value: half_width.to_string(),
            reason: err.to_string(),
        })?;

        let timezone = or_default("TIMEZONE", "America/New_York");
        let timezone = timezone.parse::<Tz>().map_err(|err| ConfigError {
            name: "TIMEZONE",
            value: timezone.clone(),
            reason: err.to_string(),
        })?;

        // comma separated, set to an empty string for no bike lanes
        let bike_lane_sources = match var("BIKE_LANE_SOURCES") {
            None => DEFAULT_BIKE_LANE_URLS
                .iter()
                .map(|url| DataSource::Url((*url).to_owned()))
                .collect(),
            Some(sources) => sources
                .split(',')
                .map(str::trim)
                .filter(|source| !source.is_empty())
                .map(|source| source.parse::<DataSource>())
                .collect::<Result<Vec<_>, _>>()?,
        };

        Ok(Config {
            port: parse_var(&var, "PORT", 8085)?,
            static_dir: or_default("STATIC_DIR", "frontend/build").into(),
            stations_source: parse_var(&var, "STATIONS_SOURCE", DEFAULT_STATIONS_URL.parse()?)?,
            trips_source: parse_var(&var, "TRIPS_SOURCE", DEFAULT_TRIPS_URL.parse()?)?,
            bike_lane_sources,
            timezone,
            window,
            viewport,
        })
    }
}

fn parse_var<F, T>(var: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match var(name) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|err: T::Err| ConfigError {
            name,
            reason: err.to_string(),
            value,
        }),
    }
}

impl From<std::convert::Infallible> for ConfigError {
    fn from(err: std::convert::Infallible) -> Self {
        match err {}
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;
    use std::path::PathBuf;

    use super::Config;
    use crate::load::DataSource;
    use approx::assert_relative_eq;

    fn config(vars: &[(&str, &str)]) -> Result<Config, super::ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_vars(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.port, 8085);
        assert_eq!(config.static_dir, PathBuf::from("frontend/build"));
        assert!(matches!(config.stations_source, DataSource::Url(_)));
        assert!(matches!(config.trips_source, DataSource::Url(_)));
        assert_eq!(config.bike_lane_sources.len(), 2);
        assert_eq!(config.timezone, chrono_tz::America::New_York);
        assert_eq!(config.window.minutes(), 60);
        assert_relative_eq!(config.viewport.zoom(), 12.);
    }

    #[test]
    fn overrides() {
        let config = config(&[
            ("PORT", "9000"),
            ("TRIPS_SOURCE", "data/trips.csv"),
            ("WINDOW_HALF_WIDTH", "30"),
            ("TIMEZONE", "Europe/Berlin"),
            ("MAP_ZOOM", "14.5"),
        ])
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.trips_source, DataSource::File("data/trips.csv".into()));
        assert_eq!(config.window.minutes(), 30);
        assert_eq!(config.timezone, chrono_tz::Europe::Berlin);
        assert_relative_eq!(config.viewport.zoom(), 14.5);
    }

    #[test]
    fn bike_lane_sources() {
        let cfg = config(&[(
            "BIKE_LANE_SOURCES",
            "data/boston.geojson, https://example.com/cambridge.geojson",
        )])
        .unwrap();
        assert_eq!(
            cfg.bike_lane_sources,
            vec![
                DataSource::File("data/boston.geojson".into()),
                DataSource::Url("https://example.com/cambridge.geojson".to_owned()),
            ]
        );
        assert!(config(&[("BIKE_LANE_SOURCES", "")])
            .unwrap()
            .bike_lane_sources
            .is_empty());
    }

    #[test]
    fn invalid_values() {
        let err = config(&[("PORT", "eighty")]).unwrap_err();
        assert_eq!(err.name, "PORT");
        assert_eq!(err.value, "eighty");
        assert_eq!(config(&[("WINDOW_HALF_WIDTH", "720")]).unwrap_err().name, "WINDOW_HALF_WIDTH");
        assert_eq!(config(&[("WINDOW_HALF_WIDTH", "0")]).unwrap_err().name, "WINDOW_HALF_WIDTH");
        assert_eq!(config(&[("TIMEZONE", "Mars/Olympus")]).unwrap_err().name, "TIMEZONE");
        assert_eq!(config(&[("MAP_CENTER_LAT", "north")]).unwrap_err().name, "MAP_CENTER_LAT");
    }
}
