//! mtb-engine
//!
//! The replay/alignment engine: deterministic multi-timeframe backtest
//! replay over a single virtual clock.
//!
//! Pipeline per symbol: LOAD -> ALIGN -> INIT -> REPLAY -> CLOSE -> STATS

mod align;
mod replay;
mod report;
mod run;
mod trader;

pub use align::{align, AlignError, AlignedChart, Alignment};
pub use replay::{ReplayScheduler, ReplayState, ReplayStats};
pub use report::{render_table, summarize, StatsRow, SummaryReport};
pub use run::{
    load_alignment, run_session, run_symbol, EngineConfig, SessionReport, SymbolRunReport,
};
pub use trader::Trader;
