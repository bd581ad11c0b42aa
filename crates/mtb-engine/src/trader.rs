//! The strategy collaborator boundary.

use std::collections::{BTreeMap, BTreeSet};

use mtb_types::{Candle, Timeframe};

use crate::report::StatsRow;

/// The strategy side of a backtest, seen from the replay engine.
///
/// The engine treats implementations as opaque: it feeds warm-up windows
/// and closed candles in, and pulls one statistics row out at the end.
/// Implementations must be object-safe so the session runner can hold a
/// `Box<dyn Trader>` per symbol.
pub trait Trader {
    /// The symbol this trader backtests.
    fn symbol(&self) -> &str;

    /// Timeframes this trader needs charts for. Only these are loaded,
    /// aligned, and replayed.
    fn required_tfs(&self) -> BTreeSet<Timeframe>;

    /// Receive the warm-up window per timeframe, once, before replay.
    fn init_chart(&mut self, init: &BTreeMap<Timeframe, Vec<Candle>>);

    /// Receive one closed candle. Called once per delivery, in virtual-clock
    /// order; never called for a candle before its close boundary.
    fn on_kline(&mut self, tf: Timeframe, candle: &Candle);

    /// Close any positions still open once replay is exhausted.
    fn close_opening_orders(&mut self);

    /// Produce the terminal statistics row for this symbol's run.
    fn statistic_trade(&self) -> StatsRow;
}
