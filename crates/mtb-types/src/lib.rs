//! mtb-types
//!
//! Core data model for the multi-timeframe backtest workspace.
//!
//! This crate owns the types every other crate agrees on: candles and candle
//! series, the fixed timeframe enumeration with its cron-like firing rules,
//! the declarative trading configuration, and the deterministic
//! decimal-string <-> integer-micros price conversion. It performs no I/O.

mod candle;
mod config;
mod price;
mod timeframe;

pub use candle::{Candle, CandleSeries};
pub use config::{RequiredFile, StrategySpec, StrategyTfs, SymbolBacktestConfig};
pub use price::{micros_to_decimal, price_to_micros, PriceError};
pub use timeframe::{FiringRule, ParseTimeframeError, Timeframe, REPLAY_ORDER};
