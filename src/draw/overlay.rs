use std::io;
use std::sync::Arc;

use geo::MultiLineString;
use traffic_core::{Station, StationId, TimeFilter, TrafficRenderer, TrafficSnapshot};

use crate::write_xml;

use super::geometry::{Pixels, ProjectedLine, Projection, Viewport};
use super::scale::{SqrtScale, UNFILTERED_RADIUS, WINDOWED_RADIUS};

/// A station's circle on the map
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub short_name: StationId,
    pub name: String,
    location: geo::Point<f64>,
    pub radius: f64,
    pub tooltip: String,
    pub cx: Pixels,
    pub cy: Pixels,
}

/// SVG layer drawn over the map with one circle per station, sized by its traffic.
///
/// The radius scale's domain is taken from the first traffic drawn, which is the unfiltered
/// traffic, so that markers shrink as the time window narrows the trips counted.
pub struct StationOverlay {
    viewport: Viewport,
    scale: Option<SqrtScale>,
    filter: TimeFilter,
    markers: Vec<Marker>,
    bike_lanes: Arc<MultiLineString<f64>>,
}

impl StationOverlay {
    pub fn new(viewport: Viewport) -> StationOverlay {
        StationOverlay {
            viewport,
            scale: None,
            filter: TimeFilter::Unfiltered,
            markers: Vec::new(),
            bike_lanes: Arc::new(MultiLineString::new(Vec::new())),
        }
    }

    /// Bike lanes drawn beneath the stations, shared between sessions
    pub fn with_bike_lanes(mut self, bike_lanes: Arc<MultiLineString<f64>>) -> StationOverlay {
        self.bike_lanes = bike_lanes;
        self
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Moves markers after the map is panned, zoomed or resized, sizes stay the same
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        for marker in &mut self.markers {
            let (cx, cy) = viewport.project(marker.location);
            marker.cx = cx;
            marker.cy = cy;
        }
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn marker(&self, short_name: &str) -> Option<&Marker> {
        self.markers
            .iter()
            .find(|marker| marker.short_name.as_str() == short_name)
    }

    pub fn filter(&self) -> TimeFilter {
        self.filter
    }

    pub fn write_svg_to(&self, w: &mut dyn io::Write) -> io::Result<()> {
        let (width, height) = (self.viewport.width(), self.viewport.height());
        writeln!(
            w,
            r#"<svg version="1.1" xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">"#,
            width, height, width, height
        )?;
        write_xml!(w, <title>"Bluebikes station traffic"</title>)?;
        write_xml!(w, <style>{include_str!("Overlay.css")}</style>)?;

        let label = self.filter.label();
        write_xml!(w,
            <g id="time-filter">
                <text x="10" y="24">"Filter by time: "{label.as_deref().unwrap_or("(any time)")}</text>
            </g>
        )?;

        write_xml!(w, <g class="bike-lanes">)?;
        for line in self.bike_lanes.iter().filter(|line| line.0.len() >= 2) {
            let d = ProjectedLine {
                line,
                projection: &self.viewport,
            };
            write_xml!(w, <path d={d} />)?;
        }
        write_xml!(w, </g>)?;

        write_xml!(w, <g class="stations">)?;
        for marker in &self.markers {
            write_xml!(w,
                <circle data-station={&marker.short_name} cx={marker.cx} cy={marker.cy} r={Pixels::new(marker.radius)}>
                    <title>{&marker.name}{": "}{&marker.tooltip}</title>
                </circle>
            )?;
        }
        write_xml!(w, </g>)?;
        writeln!(w, "</svg>")
    }
}

impl TrafficRenderer for StationOverlay {
    fn render(&mut self, stations: &[Station], snapshot: &TrafficSnapshot) {
        let scale = self
            .scale
            .get_or_insert_with(|| SqrtScale::new(snapshot.max_total_traffic(), UNFILTERED_RADIUS));
        scale.set_range(match snapshot.filter {
            TimeFilter::Unfiltered => UNFILTERED_RADIUS,
            TimeFilter::Windowed(_) => WINDOWED_RADIUS,
        });
        let scale = *scale;
        let viewport = self.viewport;

        self.filter = snapshot.filter;
        self.markers = stations
            .iter()
            .zip(&snapshot.stations)
            .map(|(station, traffic)| {
                debug_assert_eq!(station.short_name, traffic.short_name);
                let (cx, cy) = viewport.project(station.location);
                Marker {
                    short_name: station.short_name.clone(),
                    name: station.display_name().to_owned(),
                    location: station.location,
                    radius: scale.scale(traffic.total_traffic),
                    tooltip: traffic.summary(),
                    cx,
                    cy,
                }
            })
            .collect();
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use geo::{LineString, MultiLineString};
    use traffic_core::{FilterController, Station, TrafficData, Trip, WindowWidth};

    use super::StationOverlay;
    use crate::draw::geometry::Viewport;

    fn trip(from: &str, to: &str, hour: u32) -> Trip {
        let day = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        Trip {
            start_station_id: from.into(),
            end_station_id: to.into(),
            started_at: day.and_hms_opt(hour, 0, 0).unwrap(),
            ended_at: day.and_hms_opt(hour, 20, 0).unwrap(),
        }
    }

    fn data() -> Arc<TrafficData> {
        let mut kendall = Station::new("M32003", -71.0865, 42.3625);
        kendall.name = Some("Kendall T & Main St".to_owned());
        let data = TrafficData::new(
            vec![kendall, Station::new("A32000", -71.10, 42.35)],
            vec![
                trip("M32003", "A32000", 8),
                trip("M32003", "A32000", 8),
                trip("A32000", "M32003", 17),
            ],
        );
        Arc::new(data)
    }

    fn controller() -> FilterController<StationOverlay> {
        FilterController::new(
            data(),
            WindowWidth::DEFAULT,
            StationOverlay::new(Viewport::default()),
        )
    }

    #[test]
    fn unfiltered_markers() {
        let controller = controller();
        let overlay = controller.renderer();
        let kendall = overlay.marker("M32003").unwrap();
        assert_eq!(kendall.tooltip, "3 trips (2 departures, 1 arrivals)");
        assert_relative_eq!(kendall.radius, 25.);
        let other = overlay.marker("A32000").unwrap();
        assert_relative_eq!(other.radius, 25.);
    }

    #[test]
    fn windowed_markers_keep_the_unfiltered_domain() {
        let mut controller = controller();
        controller.set_time_filter(8 * 60).unwrap();
        let overlay = controller.renderer();
        let kendall = overlay.marker("M32003").unwrap();
        assert_eq!(kendall.tooltip, "2 trips (2 departures, 0 arrivals)");
        assert_relative_eq!(kendall.radius, 3. + 47. * (2f64 / 3.).sqrt());

        controller.set_time_filter(3 * 60).unwrap();
        let kendall = controller.renderer().marker("M32003").unwrap();
        assert_eq!(kendall.tooltip, "0 trips (0 departures, 0 arrivals)");
        assert_relative_eq!(kendall.radius, 3.);
    }

    #[test]
    fn moving_the_map_moves_markers_only() {
        let mut controller = controller();
        let before = controller.renderer().marker("A32000").unwrap().clone();
        let mut viewport = *controller.renderer().viewport();
        viewport.pan_to(geo::Point::new(-71.10, 42.35));
        controller.renderer_mut().set_viewport(viewport);
        let after = controller.renderer().marker("A32000").unwrap();
        assert_relative_eq!(*after.cx, 512.);
        assert_relative_eq!(*after.cy, 384.);
        assert_relative_eq!(after.radius, before.radius);
        assert_eq!(after.tooltip, before.tooltip);
    }

    #[test]
    fn svg_document() {
        let mut controller = controller();
        controller.set_time_filter(90).unwrap();
        let mut svg = Vec::new();
        controller.renderer().write_svg_to(&mut svg).unwrap();
        let svg = String::from_utf8(svg).unwrap();
        assert!(svg.starts_with("<svg "));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(svg.contains("Filter by time: 1:30 AM"));
        assert!(svg.contains(
            "<title>Kendall T &amp; Main St: 0 trips (0 departures, 0 arrivals)</title>"
        ));
        assert!(svg.contains("data-station=\"A32000\""));
        assert_eq!(svg.matches("<circle ").count(), 2);

        controller.set_time_filter(-1).unwrap();
        let mut svg = Vec::new();
        controller.renderer().write_svg_to(&mut svg).unwrap();
        let svg = String::from_utf8(svg).unwrap();
        assert!(svg.contains("Filter by time: (any time)"));
        assert!(svg.contains("<g class=\"bike-lanes\">\n</g>"));
    }

    #[test]
    fn bike_lanes_under_stations() {
        let lanes = MultiLineString::new(vec![
            LineString::from(vec![(-71.09415, 42.36027), (-71.08, 42.36)]),
            LineString::from(vec![(-71.10, 42.35)]),
        ]);
        let overlay = StationOverlay::new(Viewport::default()).with_bike_lanes(Arc::new(lanes));
        let mut controller = FilterController::new(data(), WindowWidth::DEFAULT, overlay);
        controller.set_time_filter(600).unwrap();
        let mut svg = Vec::new();
        controller.renderer().write_svg_to(&mut svg).unwrap();
        let svg = String::from_utf8(svg).unwrap();
        // single point lines have nothing to draw
        assert_eq!(svg.matches("<path ").count(), 1);
        assert!(svg.contains("<path d=\"M 512.0 384.0 "));
        assert!(svg.find("class=\"bike-lanes\"").unwrap() < svg.find("class=\"stations\"").unwrap());
    }
}
