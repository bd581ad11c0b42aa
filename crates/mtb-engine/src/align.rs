//! Timeframe alignment.
//!
//! Reconciles independently-sampled timeframes into one shared alignment
//! instant: the earliest time at which every timeframe has a complete
//! warm-up window. Each timeframe's series stays immutable; the partition
//! into warm-up and replay portions is expressed as positions into it, and
//! replay progress is a cursor, not a mutation of the data.

use std::collections::BTreeMap;
use std::fmt;

use mtb_types::{Candle, CandleSeries, Timeframe};

/// Alignment failures. Fatal to the symbol's backtest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AlignError {
    /// No timeframe carries any series; nothing to align.
    NoTimeframes,
    /// A timeframe has fewer candles than the warm-up window needs.
    /// `actual` of 0 covers the no-data-at-all case.
    InsufficientWarmup {
        timeframe: Timeframe,
        required: usize,
        actual: usize,
    },
}

impl fmt::Display for AlignError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlignError::NoTimeframes => write!(f, "no timeframes to align"),
            AlignError::InsufficientWarmup {
                timeframe,
                required,
                actual,
            } => write!(
                f,
                "insufficient warm-up for {}: need {required} candles, have {actual}",
                timeframe.as_str()
            ),
        }
    }
}

impl std::error::Error for AlignError {}

/// One timeframe's aligned view: the full sorted series plus positions.
///
/// `series[init_start..replay_start]` is the warm-up window (exactly
/// `warmup_bars` candles, ending at or before the alignment instant);
/// `cursor` is the next unread replay position and only ever moves forward.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlignedChart {
    series: CandleSeries,
    init_start: usize,
    replay_start: usize,
    cursor: usize,
}

impl AlignedChart {
    /// The warm-up window, chronological order.
    pub fn init_slice(&self) -> &[Candle] {
        &self.series.as_slice()[self.init_start..self.replay_start]
    }

    /// Candles in the replay portion, read or not.
    pub fn replay_len(&self) -> usize {
        self.series.len() - self.replay_start
    }

    /// Candles already delivered.
    pub fn delivered(&self) -> usize {
        self.cursor - self.replay_start
    }

    /// Candles still awaiting delivery.
    pub fn remaining(&self) -> usize {
        self.series.len() - self.cursor
    }

    /// Pop the oldest undelivered candle, advancing the cursor.
    pub fn pop_next(&mut self) -> Option<Candle> {
        let candle = self.series.get(self.cursor).copied()?;
        self.cursor += 1;
        Some(candle)
    }

    /// Peek at the oldest undelivered candle without advancing.
    pub fn peek_next(&self) -> Option<&Candle> {
        self.series.get(self.cursor)
    }
}

/// The aligned state of one symbol across its required timeframes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Alignment {
    pub charts: BTreeMap<Timeframe, AlignedChart>,
    /// The alignment instant: latest warm-up-complete open time.
    pub global_start: i64,
    /// Latest open time across all timeframes; the clock stops past it.
    pub global_end: i64,
}

impl Alignment {
    /// Warm-up windows per timeframe, cloned out for delivery to a trader.
    pub fn init_charts(&self) -> BTreeMap<Timeframe, Vec<Candle>> {
        self.charts
            .iter()
            .map(|(tf, chart)| (*tf, chart.init_slice().to_vec()))
            .collect()
    }
}

/// Align each timeframe's series at a common instant.
///
/// Fails fast if any timeframe cannot fill a `warmup_bars` window. The
/// alignment instant is the max over timeframes of the warm-up-complete
/// open time, so no timeframe starts replaying with a short window. Pure
/// over its input: aligning the same series twice yields equal partitions.
pub fn align(
    series_by_tf: BTreeMap<Timeframe, CandleSeries>,
    warmup_bars: usize,
) -> Result<Alignment, AlignError> {
    if series_by_tf.is_empty() {
        return Err(AlignError::NoTimeframes);
    }
    for (tf, series) in &series_by_tf {
        if series.len() < warmup_bars {
            return Err(AlignError::InsufficientWarmup {
                timeframe: *tf,
                required: warmup_bars,
                actual: series.len(),
            });
        }
    }

    // Latest warm-up-complete instant across timeframes.
    let global_start = series_by_tf
        .values()
        .filter_map(|s| s.get(warmup_bars.saturating_sub(1)))
        .map(|c| c.open_time)
        .max()
        .unwrap_or(0);
    let global_end = series_by_tf
        .values()
        .filter_map(CandleSeries::last)
        .map(|c| c.open_time)
        .max()
        .unwrap_or(global_start);

    let mut charts = BTreeMap::new();
    for (tf, series) in series_by_tf {
        // Count of candles at or before the alignment instant; the warm-up
        // window is the most recent warmup_bars of them.
        let replay_start = series
            .as_slice()
            .partition_point(|c| c.open_time <= global_start);
        let init_start = replay_start - warmup_bars;
        charts.insert(
            tf,
            AlignedChart {
                series,
                init_start,
                replay_start,
                cursor: replay_start,
            },
        );
    }

    tracing::debug!(
        timeframes = charts.len(),
        global_start,
        global_end,
        "alignment established"
    );
    Ok(Alignment {
        charts,
        global_start,
        global_end,
    })
}
