//! Rolling OHLC aggregation of the primary value over wall-clock buckets.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Default bucket width: one minute.
pub const DEFAULT_BUCKET_MS: i64 = 60_000;
/// Default number of candles kept.
pub const DEFAULT_CANDLE_CAP: usize = 240;

/// One time bucket. Invariant: `low <= open, close <= high`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Bucket start, milliseconds since the Unix epoch.
    pub bucket_start_ms: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Candle {
    fn new(bucket_start_ms: i64, value: f64) -> Self {
        Self {
            bucket_start_ms,
            open: value,
            high: value,
            low: value,
            close: value,
        }
    }

    fn update(&mut self, value: f64) {
        self.high = self.high.max(value);
        self.low = self.low.min(value);
        self.close = value;
    }

    #[inline]
    pub fn is_rising(&self) -> bool {
        self.close >= self.open
    }
}

/// What a single [`CandleAggregator::ingest`] did to the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Value was not finite; nothing changed.
    Ignored,
    /// A new bucket was opened (the chart needs a full resync).
    Appended,
    /// The in-progress bucket was updated in place.
    Updated,
}

/// How the chart should be brought up to date after an ingest.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartUpdate {
    /// Replace the whole series.
    Resync(Vec<Candle>),
    /// Replace only the last point.
    Point(Candle),
}

#[derive(Debug, Clone)]
pub struct CandleAggregator {
    bucket_ms: i64,
    cap: usize,
    candles: VecDeque<Candle>,
}

impl Default for CandleAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_BUCKET_MS, DEFAULT_CANDLE_CAP)
    }
}

impl CandleAggregator {
    /// `bucket_ms` and `cap` are raised to at least 1.
    pub fn new(bucket_ms: i64, cap: usize) -> Self {
        let cap = cap.max(1);
        Self {
            bucket_ms: bucket_ms.max(1),
            cap,
            candles: VecDeque::with_capacity(cap + 1),
        }
    }

    #[inline]
    pub fn bucket_ms(&self) -> i64 {
        self.bucket_ms
    }

    #[inline]
    pub fn cap(&self) -> usize {
        self.cap
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.candles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    /// Start of the bucket containing `now_ms`.
    pub fn bucket_start(&self, now_ms: i64) -> i64 {
        now_ms.div_euclid(self.bucket_ms) * self.bucket_ms
    }

    /// Fold `value` observed at `now_ms` into the window.
    ///
    /// A timestamp that falls before the last bucket (wall clock stepped
    /// backwards) is folded into the last candle so bucket starts stay
    /// strictly increasing.
    pub fn ingest(&mut self, value: f64, now_ms: i64) -> IngestOutcome {
        if !value.is_finite() {
            return IngestOutcome::Ignored;
        }
        let start = self.bucket_start(now_ms);
        match self.candles.back_mut() {
            Some(last) if start <= last.bucket_start_ms => {
                last.update(value);
                IngestOutcome::Updated
            }
            _ => {
                self.candles.push_back(Candle::new(start, value));
                while self.candles.len() > self.cap {
                    self.candles.pop_front();
                }
                IngestOutcome::Appended
            }
        }
    }

    /// Ingest and describe the matching chart update.
    pub fn ingest_for_chart(&mut self, value: f64, now_ms: i64) -> Option<ChartUpdate> {
        match self.ingest(value, now_ms) {
            IngestOutcome::Ignored => None,
            IngestOutcome::Appended => Some(ChartUpdate::Resync(self.series())),
            IngestOutcome::Updated => self.latest().map(ChartUpdate::Point),
        }
    }

    /// Full in-window sequence, oldest first.
    pub fn series(&self) -> Vec<Candle> {
        self.candles.iter().copied().collect()
    }

    /// The in-progress (most recent) candle.
    pub fn latest(&self) -> Option<Candle> {
        self.candles.back().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candle> {
        self.candles.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINUTE: i64 = 60_000;

    #[test]
    fn same_bucket_updates_in_place() {
        let mut agg = CandleAggregator::default();
        let t0 = 1_700_000_000_000 - 1_700_000_000_000 % MINUTE;
        assert_eq!(agg.ingest(21.4, t0 + 1_000), IngestOutcome::Appended);
        assert_eq!(agg.ingest(22.1, t0 + 30_000), IngestOutcome::Updated);
        let c = agg.latest().unwrap();
        assert_eq!(agg.len(), 1);
        assert_eq!((c.open, c.high, c.low, c.close), (21.4, 22.1, 21.4, 22.1));
        assert_eq!(c.bucket_start_ms, t0);
    }

    #[test]
    fn open_is_immutable() {
        let mut agg = CandleAggregator::default();
        agg.ingest(10.0, 0);
        agg.ingest(5.0, 1);
        agg.ingest(12.0, 2);
        let c = agg.latest().unwrap();
        assert_eq!((c.open, c.high, c.low, c.close), (10.0, 12.0, 5.0, 12.0));
    }

    #[test]
    fn non_finite_is_ignored() {
        let mut agg = CandleAggregator::default();
        assert_eq!(agg.ingest(f64::NAN, 0), IngestOutcome::Ignored);
        assert!(agg.is_empty());
    }

    #[test]
    fn chart_update_kinds() {
        let mut agg = CandleAggregator::new(1_000, 10);
        assert!(matches!(
            agg.ingest_for_chart(1.0, 0),
            Some(ChartUpdate::Resync(v)) if v.len() == 1
        ));
        assert!(matches!(
            agg.ingest_for_chart(2.0, 500),
            Some(ChartUpdate::Point(c)) if c.close == 2.0
        ));
        assert_eq!(agg.ingest_for_chart(f64::NAN, 600), None);
    }

    #[test]
    fn clock_going_backwards_folds_into_last() {
        let mut agg = CandleAggregator::new(1_000, 10);
        agg.ingest(1.0, 5_000);
        assert_eq!(agg.ingest(3.0, 1_000), IngestOutcome::Updated);
        assert_eq!(agg.len(), 1);
        assert_eq!(agg.latest().unwrap().close, 3.0);
    }

    #[test]
    fn negative_timestamps_bucket_downwards() {
        let agg = CandleAggregator::new(1_000, 10);
        assert_eq!(agg.bucket_start(-1), -1_000);
    }
}
