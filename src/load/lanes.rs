use geo::{Coord, LineString, MultiLineString};
use geojson::{GeoJson, Geometry, Value};

use super::LoadError;

/// Reads the lines of a bike network GeoJSON document. Features may be `LineString`s,
/// `MultiLineString`s or collections of them; other geometries are skipped.
pub fn parse_bike_lanes(json: &[u8]) -> Result<MultiLineString<f64>, LoadError> {
    let geojson: GeoJson = serde_json::from_slice(json).map_err(LoadError::BikeLanes)?;
    let mut lines = Vec::new();
    let mut skipped = 0;
    match geojson {
        GeoJson::Geometry(geometry) => collect_lines(geometry, &mut lines, &mut skipped),
        GeoJson::Feature(feature) => {
            if let Some(geometry) = feature.geometry {
                collect_lines(geometry, &mut lines, &mut skipped);
            }
        }
        GeoJson::FeatureCollection(collection) => {
            for geometry in collection.features.into_iter().filter_map(|f| f.geometry) {
                collect_lines(geometry, &mut lines, &mut skipped);
            }
        }
    }
    if skipped > 0 {
        log::debug!("Skipped {} bike lane geometries which aren't lines", skipped);
    }
    Ok(MultiLineString::new(lines))
}

fn collect_lines(geometry: Geometry, lines: &mut Vec<LineString<f64>>, skipped: &mut usize) {
    match geometry.value {
        Value::LineString(positions) => lines.push(positions_to_linestring(&positions)),
        Value::MultiLineString(parts) => {
            lines.extend(parts.iter().map(|positions| positions_to_linestring(positions)))
        }
        Value::GeometryCollection(geometries) => {
            for geometry in geometries {
                collect_lines(geometry, lines, skipped);
            }
        }
        _ => *skipped += 1,
    }
}

fn positions_to_linestring(positions: &[Vec<f64>]) -> LineString<f64> {
    LineString::new(
        positions
            .iter()
            .filter(|position| position.len() >= 2)
            .map(|position| Coord {
                x: position[0],
                y: position[1],
            })
            .collect(),
    )
}
