/// Marker radius range when all trips are shown
pub const UNFILTERED_RADIUS: (f64, f64) = (0., 25.);
/// Marker radius range for a time window, there are fewer trips so markers grow
pub const WINDOWED_RADIUS: (f64, f64) = (3., 50.);

/// Maps `0..=domain_max` onto a radius so that marker area is proportional to the value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SqrtScale {
    domain_max: u32,
    range: (f64, f64),
}

impl SqrtScale {
    pub fn new(domain_max: u32, range: (f64, f64)) -> SqrtScale {
        SqrtScale { domain_max, range }
    }

    pub fn set_range(&mut self, range: (f64, f64)) {
        self.range = range;
    }

    pub fn domain_max(&self) -> u32 {
        self.domain_max
    }

    /// Values above `domain_max` extrapolate beyond the range
    pub fn scale(&self, value: u32) -> f64 {
        let (low, high) = self.range;
        if self.domain_max == 0 {
            return low;
        }
        let t = (f64::from(value) / f64::from(self.domain_max)).sqrt();
        low + (high - low) * t
    }
}

#[cfg(test)]
mod test {
    use super::{SqrtScale, UNFILTERED_RADIUS, WINDOWED_RADIUS};
    use approx::assert_relative_eq;

    #[test]
    fn area_proportional_to_value() {
        let scale = SqrtScale::new(400, UNFILTERED_RADIUS);
        assert_relative_eq!(scale.scale(0), 0.);
        assert_relative_eq!(scale.scale(100), 12.5);
        assert_relative_eq!(scale.scale(400), 25.);
    }

    #[test]
    fn windowed_range_has_a_minimum_radius() {
        let mut scale = SqrtScale::new(400, UNFILTERED_RADIUS);
        scale.set_range(WINDOWED_RADIUS);
        assert_relative_eq!(scale.scale(0), 3.);
        assert_relative_eq!(scale.scale(100), 26.5);
        assert_relative_eq!(scale.scale(400), 50.);
    }

    #[test]
    fn empty_domain() {
        let scale = SqrtScale::new(0, WINDOWED_RADIUS);
        assert_relative_eq!(scale.scale(0), 3.);
        assert_relative_eq!(scale.scale(7), 3.);
    }
}
