//! Declarative trading configuration and the required-file cache key.
//!
//! The symbols configuration is loaded externally (JSON) and deserialized
//! into these structs. Strategy parameters beyond the timeframe binding are
//! opaque to this workspace: they pass through to the external strategy
//! engine untouched.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::Timeframe;

/// Timeframe binding for one strategy entry (`"tfs": {"tf": "1h"}`).
///
/// `tf` is optional: a strategy entry without one contributes no timeframe
/// to the symbol's required set.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyTfs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tf: Option<Timeframe>,
}

/// One strategy entry under a symbol.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategySpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub tfs: StrategyTfs,
    /// Remaining strategy parameters, passed through verbatim.
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

/// One symbol entry of the trading configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SymbolBacktestConfig {
    pub symbol: String,
    pub year: i32,
    pub months: Vec<u32>,
    pub strategies: Vec<StrategySpec>,
}

impl SymbolBacktestConfig {
    /// The union of timeframes referenced by this symbol's strategies.
    ///
    /// Duplicate entries across strategies collapse; iteration order is
    /// deterministic (finest first).
    pub fn required_tfs(&self) -> BTreeSet<Timeframe> {
        self.strategies.iter().filter_map(|s| s.tfs.tf).collect()
    }

    /// Configured months, deduplicated and sorted ascending.
    pub fn sorted_months(&self) -> Vec<u32> {
        let set: BTreeSet<u32> = self.months.iter().copied().collect();
        set.into_iter().collect()
    }
}

/// Identifies one monthly cache unit: (symbol, interval, year, month).
///
/// `Ord` makes sets and iteration deterministic.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequiredFile {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub year: i32,
    pub month: u32,
}

impl RequiredFile {
    pub fn new(symbol: impl Into<String>, timeframe: Timeframe, year: i32, month: u32) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
            year,
            month,
        }
    }

    /// Monthly cache file name: `{symbol}-{tf}-{year}-{month:02}.csv`.
    pub fn file_name(&self) -> String {
        format!(
            "{}-{}-{}-{:02}.csv",
            self.symbol,
            self.timeframe.as_str(),
            self.year,
            self.month
        )
    }
}
