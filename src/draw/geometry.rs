use std::f64::consts::PI;
use std::{fmt, ops};

/// Screen distance, written with one decimal place
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Pixels(f64);

impl Pixels {
    pub const fn new(val: f64) -> Self {
        Self(val)
    }
}

impl ops::Deref for Pixels {
    type Target = f64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl ops::Sub for Pixels {
    type Output = Pixels;

    fn sub(self, rhs: Self) -> Self::Output {
        Pixels(self.0 - rhs.0)
    }
}

impl fmt::Display for Pixels {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

/// Maps a geographic position to a point on screen
pub trait Projection {
    fn project(&self, location: geo::Point<f64>) -> (Pixels, Pixels);
}

/// Size of a map tile at zoom 0, as used by the map library in the browser
const TILE_SIZE: f64 = 512.;
/// Web mercator is undefined at the poles, latitudes are clamped to this
const MAX_LATITUDE: f64 = 85.051_128_779_806_6;

pub const MIN_ZOOM: f64 = 5.;
pub const MAX_ZOOM: f64 = 18.;

/// The part of a web mercator map visible on screen, the centre of the map is the centre of the
/// screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    center: geo::Point<f64>,
    zoom: f64,
    width: f64,
    height: f64,
}

impl Default for Viewport {
    /// Cambridge and Boston
    fn default() -> Self {
        Viewport::new(geo::Point::new(-71.09415, 42.36027), 12., 1024., 768.)
    }
}

impl Viewport {
    pub fn new(center: geo::Point<f64>, zoom: f64, width: f64, height: f64) -> Viewport {
        Viewport {
            center,
            zoom: zoom.max(MIN_ZOOM).min(MAX_ZOOM),
            width,
            height,
        }
    }

    pub fn pan_to(&mut self, center: geo::Point<f64>) {
        self.center = center;
    }

    pub fn zoom_to(&mut self, zoom: f64) {
        self.zoom = zoom.max(MIN_ZOOM).min(MAX_ZOOM);
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    pub fn center(&self) -> geo::Point<f64> {
        self.center
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn width(&self) -> Pixels {
        Pixels(self.width)
    }

    pub fn height(&self) -> Pixels {
        Pixels(self.height)
    }

    /// Position on the whole world map at the current zoom, (0, 0) is the north west corner
    fn world_coords(&self, location: geo::Point<f64>) -> (f64, f64) {
        let world_size = TILE_SIZE * 2f64.powf(self.zoom);
        let x = (location.x() + 180.) / 360. * world_size;
        let sin_lat = location
            .y()
            .max(-MAX_LATITUDE)
            .min(MAX_LATITUDE)
            .to_radians()
            .sin();
        let y = (0.5 - ((1. + sin_lat) / (1. - sin_lat)).ln() / (4. * PI)) * world_size;
        (x, y)
    }
}

impl Projection for Viewport {
    fn project(&self, location: geo::Point<f64>) -> (Pixels, Pixels) {
        let (x, y) = self.world_coords(location);
        let (center_x, center_y) = self.world_coords(self.center);
        (
            Pixels(x - center_x + self.width / 2.),
            Pixels(y - center_y + self.height / 2.),
        )
    }
}

/// SVG path data for a line, projected onto the screen
pub struct ProjectedLine<'a, P> {
    pub line: &'a geo::LineString<f64>,
    pub projection: &'a P,
}

impl<P: Projection> fmt::Display for ProjectedLine<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, point) in self.line.points().enumerate() {
            let (x, y) = self.projection.project(point);
            if i == 0 {
                write!(f, "M {} {}", x, y)?;
            } else {
                write!(f, " {} {}", x, y)?;
            }
        }
        Ok(())
    }
}
