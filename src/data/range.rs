//! Adaptive range of the primary (temperature) axis.
//!
//! The range only ever grows. A transient spike widens the scale for the rest
//! of the session; the scale never shrinks back. This keeps the thermometer and
//! its tick labels visually stable while values wander inside the window.

use serde::{Deserialize, Serialize};

/// Tuning for [`RangeTracker`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangeSettings {
    /// Initial lower bound.
    pub low: f64,
    /// Initial upper bound.
    pub high: f64,
    /// Grid step bounds are aligned to.
    pub step: f64,
    /// Distance from a bound that triggers widening.
    pub margin: f64,
    /// Span forced when the bounds cross.
    pub min_span: f64,
}

impl Default for RangeSettings {
    fn default() -> Self {
        Self {
            low: 0.0,
            high: 80.0,
            step: 5.0,
            margin: 1.0,
            min_span: 10.0,
        }
    }
}

impl RangeSettings {
    /// Settings the tracker can work with. A non-positive or non-finite
    /// `step` or `min_span` falls back to the default, and `margin` is
    /// clamped to `0..=step`.
    pub fn sanitized(self) -> Self {
        let d = Self::default();
        let positive = |v: f64, fallback: f64| if v.is_finite() && v > 0.0 { v } else { fallback };
        let step = positive(self.step, d.step);
        let margin = if self.margin.is_finite() {
            self.margin.clamp(0.0, step)
        } else {
            d.margin
        };
        let (low, high) = if self.low.is_finite() && self.high.is_finite() {
            (self.low, self.high)
        } else {
            (d.low, d.high)
        };
        Self {
            low,
            high,
            step,
            margin,
            min_span: positive(self.min_span, d.min_span),
        }
    }
}

/// Fractions of the span at which the inner tick labels sit.
pub const TICK_FRACTIONS: [f64; 4] = [0.0, 0.33, 0.66, 1.0];

#[derive(Debug, Clone)]
pub struct RangeTracker {
    low: f64,
    high: f64,
    settings: RangeSettings,
    ticks: [i64; 4],
    revision: u64,
}

impl Default for RangeTracker {
    fn default() -> Self {
        Self::new(RangeSettings::default())
    }
}

impl RangeTracker {
    pub fn new(settings: RangeSettings) -> Self {
        let settings = settings.sanitized();
        let mut tracker = Self {
            low: settings.low,
            high: settings.high,
            settings,
            ticks: [0; 4],
            revision: 0,
        };
        if tracker.low >= tracker.high {
            tracker.high = tracker.low + settings.min_span;
        }
        tracker.recompute_ticks();
        tracker
    }

    #[inline]
    pub fn low(&self) -> f64 {
        self.low
    }

    #[inline]
    pub fn high(&self) -> f64 {
        self.high
    }

    #[inline]
    pub fn settings(&self) -> RangeSettings {
        self.settings
    }

    #[inline]
    pub fn span(&self) -> f64 {
        self.high - self.low
    }

    /// Bumped every time a bound moves.
    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Integer tick values: low, one third, two thirds, high.
    #[inline]
    pub fn ticks(&self) -> [i64; 4] {
        self.ticks
    }

    /// Tick labels with a unit suffix, lowest first.
    pub fn tick_labels(&self, unit: &str) -> [String; 4] {
        self.ticks.map(|t| format!("{t}{unit}"))
    }

    /// Widen the range to cover `values`. Non-finite values are skipped.
    ///
    /// Returns `true` when either bound changed.
    pub fn extend<I>(&mut self, values: I) -> bool
    where
        I: IntoIterator<Item = f64>,
    {
        let step = self.settings.step;
        let margin = self.settings.margin;
        let mut updated = false;

        for v in values.into_iter().filter(|v| v.is_finite()) {
            if v < self.low + margin {
                let low = self.low.min((v / step).floor() * step - step);
                updated |= low != self.low;
                self.low = low;
            }
            if v > self.high - margin {
                let high = self.high.max((v / step).ceil() * step + step);
                updated |= high != self.high;
                self.high = high;
            }
        }

        if self.low >= self.high {
            self.high = self.low + self.settings.min_span;
            updated = true;
        }

        if updated {
            self.recompute_ticks();
            self.revision += 1;
        }
        updated
    }

    fn recompute_ticks(&mut self) {
        let span = self.span();
        let low = self.low;
        self.ticks = TICK_FRACTIONS.map(|f| (low + span * f).round() as i64);
        self.ticks[3] = self.high.round() as i64;
    }
}
