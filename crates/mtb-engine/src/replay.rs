//! Replay scheduler: the virtual clock.
//!
//! One scalar clock per symbol, stepped in fixed 60-second increments from
//! the alignment instant. Each tick, every timeframe whose firing rule
//! matches the clock's (hour, minute) delivers at most one candle, in a
//! fixed coarsest-to-finest order. Delivery only happens at a bar's close
//! boundary, so a trader can never observe a candle early.

use std::collections::BTreeMap;

use mtb_types::{Timeframe, REPLAY_ORDER};

use crate::align::Alignment;
use crate::trader::Trader;

const TICK_SECS: i64 = 60;

/// Scheduler lifecycle. `Exhausted` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplayState {
    WarmedUp,
    Replaying,
    Exhausted,
}

/// What a finished replay did, for verification and reporting.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReplayStats {
    /// Clock ticks stepped.
    pub ticks: u64,
    /// Candles delivered per timeframe.
    pub delivered: BTreeMap<Timeframe, u64>,
}

impl ReplayStats {
    pub fn total_delivered(&self) -> u64 {
        self.delivered.values().sum()
    }
}

/// Steps one symbol's virtual clock over its aligned charts.
///
/// Holds exclusive access to the alignment for the duration of the run;
/// the clock only moves forward and each candle is delivered exactly once.
pub struct ReplayScheduler {
    clock: i64,
    global_end: i64,
    state: ReplayState,
    stats: ReplayStats,
}

impl ReplayScheduler {
    pub fn new(alignment: &Alignment) -> Self {
        Self {
            clock: alignment.global_start,
            global_end: alignment.global_end,
            state: ReplayState::WarmedUp,
            stats: ReplayStats::default(),
        }
    }

    pub fn state(&self) -> ReplayState {
        self.state
    }

    pub fn clock(&self) -> i64 {
        self.clock
    }

    /// Advance the clock one tick and deliver every candle due at it.
    ///
    /// Returns `false` once the clock has passed `global_end`; further calls
    /// keep returning `false` without side effects.
    pub fn step(&mut self, alignment: &mut Alignment, trader: &mut dyn Trader) -> bool {
        if self.clock > self.global_end || self.state == ReplayState::Exhausted {
            self.state = ReplayState::Exhausted;
            return false;
        }
        self.state = ReplayState::Replaying;
        self.clock += TICK_SECS;
        self.stats.ticks += 1;

        let hour = ((self.clock / 3_600) % 24) as u32;
        let minute = ((self.clock / 60) % 60) as u32;

        for tf in REPLAY_ORDER {
            let Some(chart) = alignment.charts.get_mut(&tf) else {
                continue;
            };
            let Some(rule) = tf.firing_rule() else {
                continue;
            };
            if !rule.matches(hour, minute) {
                continue;
            }
            // A matching rule over an empty chart is not an error: that
            // timeframe is simply exhausted ahead of the others.
            if let Some(candle) = chart.pop_next() {
                trader.on_kline(tf, &candle);
                *self.stats.delivered.entry(tf).or_insert(0) += 1;
            }
        }
        true
    }

    /// Run the clock from the alignment instant until it passes the end.
    pub fn run_to_end(&mut self, alignment: &mut Alignment, trader: &mut dyn Trader) -> ReplayStats {
        while self.step(alignment, trader) {}
        tracing::debug!(
            ticks = self.stats.ticks,
            delivered = self.stats.total_delivered(),
            "replay exhausted"
        );
        self.stats.clone()
    }
}
