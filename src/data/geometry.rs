//! Value → percentage mapping for thermometer fills, markers, labels and bands.

use crate::data::range::RangeTracker;

/// Clamp window for area fills.
pub const FILL_CLAMP: (f64, f64) = (0.0, 100.0);
/// Point markers never sit flush against the container edge.
pub const MARKER_CLAMP: (f64, f64) = (2.0, 98.0);
/// Text labels riding next to a marker need a little more room.
pub const LABEL_CLAMP: (f64, f64) = (6.0, 96.0);
/// Minimum drawn thickness of a two-sided band, in percent.
pub const MIN_BAND_THICKNESS: f64 = 1.5;

/// A band drawn between two percentages, `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub start: f64,
    pub end: f64,
}

impl Band {
    #[inline]
    pub fn thickness(&self) -> f64 {
        self.end - self.start
    }
}

/// Maps domain values onto a `low..high` axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryMapper {
    pub low: f64,
    pub high: f64,
}

impl GeometryMapper {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// Mapper over a fixed 0..100 scale (humidity, duty gauges).
    pub fn percent_scale() -> Self {
        Self::new(0.0, 100.0)
    }

    /// Unclamped-to-window position in `[0, 100]`, or `None` for non-finite input.
    pub fn to_percent(&self, value: f64) -> Option<f64> {
        if !value.is_finite() {
            return None;
        }
        let span = (self.high - self.low).max(1.0);
        let ratio = ((value - self.low) / span).clamp(0.0, 1.0);
        Some(ratio * 100.0)
    }

    pub fn fill(&self, value: f64) -> Option<f64> {
        self.to_percent(value).map(|p| p.clamp(FILL_CLAMP.0, FILL_CLAMP.1))
    }

    pub fn marker(&self, value: f64) -> Option<f64> {
        self.to_percent(value)
            .map(|p| p.clamp(MARKER_CLAMP.0, MARKER_CLAMP.1))
    }

    pub fn label(&self, value: f64) -> Option<f64> {
        self.to_percent(value).map(|p| p.clamp(LABEL_CLAMP.0, LABEL_CLAMP.1))
    }

    /// Band between `a` and `b` in either order, at least
    /// [`MIN_BAND_THICKNESS`] thick. Hidden when either bound is non-finite.
    pub fn band(&self, a: f64, b: f64) -> Option<Band> {
        let pa = self.to_percent(a)?;
        let pb = self.to_percent(b)?;
        let mut start = pa.min(pb);
        let mut end = pa.max(pb);
        if end - start < MIN_BAND_THICKNESS {
            let mid = (start + end) / 2.0;
            start = mid - MIN_BAND_THICKNESS / 2.0;
            end = mid + MIN_BAND_THICKNESS / 2.0;
            if start < 0.0 {
                end -= start;
                start = 0.0;
            }
            if end > 100.0 {
                start -= end - 100.0;
                end = 100.0;
            }
        }
        Some(Band { start, end })
    }
}

impl From<&RangeTracker> for GeometryMapper {
    fn from(r: &RangeTracker) -> Self {
        Self::new(r.low(), r.high())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_and_marker_clamp_differently() {
        let g = GeometryMapper::new(0.0, 80.0);
        assert_eq!(g.fill(-10.0), Some(0.0));
        assert_eq!(g.marker(-10.0), Some(2.0));
        assert_eq!(g.fill(200.0), Some(100.0));
        assert_eq!(g.marker(200.0), Some(98.0));
        assert_eq!(g.label(200.0), Some(96.0));
        assert_eq!(g.fill(40.0), Some(50.0));
    }

    #[test]
    fn degenerate_span_uses_unit_divisor() {
        let g = GeometryMapper::new(10.0, 10.0);
        assert_eq!(g.to_percent(10.5), Some(50.0));
    }

    #[test]
    fn non_finite_hides_element() {
        let g = GeometryMapper::new(0.0, 80.0);
        assert_eq!(g.fill(f64::NAN), None);
        assert_eq!(g.band(40.0, f64::INFINITY), None);
    }

    #[test]
    fn band_is_ordered_and_has_min_thickness() {
        let g = GeometryMapper::new(0.0, 100.0);
        let b = g.band(60.0, 40.0).unwrap();
        assert_eq!((b.start, b.end), (40.0, 60.0));

        let thin = g.band(50.0, 50.0).unwrap();
        assert!((thin.thickness() - MIN_BAND_THICKNESS).abs() < 1e-9);
        assert!(thin.start <= 50.0 && thin.end >= 50.0);

        let edge = g.band(100.0, 100.0).unwrap();
        assert_eq!(edge.end, 100.0);
        assert!((edge.thickness() - MIN_BAND_THICKNESS).abs() < 1e-9);
    }
}
