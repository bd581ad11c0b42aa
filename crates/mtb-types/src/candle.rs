//! Candle and candle-series types.

use serde::{Deserialize, Serialize};

/// One OHLCV bar. Prices and volume are integer micros; `open_time` is UTC
/// epoch seconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: i64,
    pub open_micros: i64,
    pub high_micros: i64,
    pub low_micros: i64,
    pub close_micros: i64,
    pub volume_micros: i64,
}

impl Candle {
    pub fn new(
        open_time: i64,
        open_micros: i64,
        high_micros: i64,
        low_micros: i64,
        close_micros: i64,
        volume_micros: i64,
    ) -> Self {
        Self {
            open_time,
            open_micros,
            high_micros,
            low_micros,
            close_micros,
            volume_micros,
        }
    }
}

/// An ordered candle sequence.
///
/// Invariant: strictly increasing `open_time`, no duplicates. The only way
/// to build a non-empty series is [`CandleSeries::from_unsorted`], which
/// establishes the invariant; afterwards index order equals chronological
/// order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CandleSeries {
    candles: Vec<Candle>,
}

impl CandleSeries {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a series from possibly unsorted input.
    ///
    /// Stable-sorts by `open_time`, then drops duplicate-timestamp candles
    /// keeping the first occurrence (file order among equals is preserved by
    /// the stable sort). Dropped duplicates are logged; source data carrying
    /// them is malformed but must not change replay results between runs.
    pub fn from_unsorted(mut candles: Vec<Candle>) -> Self {
        candles.sort_by_key(|c| c.open_time);
        let before = candles.len();
        candles.dedup_by_key(|c| c.open_time);
        let dropped = before - candles.len();
        if dropped > 0 {
            tracing::warn!(dropped, "dropped duplicate-timestamp candles");
        }
        Self { candles }
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn first(&self) -> Option<&Candle> {
        self.candles.first()
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    pub fn get(&self, idx: usize) -> Option<&Candle> {
        self.candles.get(idx)
    }

    pub fn as_slice(&self) -> &[Candle] {
        &self.candles
    }

    pub fn into_vec(self) -> Vec<Candle> {
        self.candles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(open_time: i64, close_micros: i64) -> Candle {
        Candle::new(open_time, 1, 2, 1, close_micros, 100)
    }

    #[test]
    fn from_unsorted_sorts_by_open_time() {
        let series =
            CandleSeries::from_unsorted(vec![candle(300, 3), candle(100, 1), candle(200, 2)]);
        let times: Vec<i64> = series.as_slice().iter().map(|c| c.open_time).collect();
        assert_eq!(times, vec![100, 200, 300]);
    }

    #[test]
    fn duplicates_dropped_keeping_first_occurrence() {
        let series = CandleSeries::from_unsorted(vec![
            candle(100, 1),
            candle(200, 2),
            candle(100, 99), // duplicate timestamp, later in file order
        ]);
        assert_eq!(series.len(), 2);
        assert_eq!(series.first().unwrap().close_micros, 1);
    }

    #[test]
    fn from_unsorted_is_idempotent() {
        let input = vec![candle(300, 3), candle(100, 1), candle(100, 9), candle(200, 2)];
        let once = CandleSeries::from_unsorted(input);
        let twice = CandleSeries::from_unsorted(once.clone().into_vec());
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_series_accessors() {
        let series = CandleSeries::empty();
        assert!(series.is_empty());
        assert_eq!(series.len(), 0);
        assert!(series.first().is_none());
        assert!(series.last().is_none());
        assert!(series.get(0).is_none());
    }
}
