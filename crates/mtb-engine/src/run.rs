//! Per-symbol backtest orchestration and the bounded session runner.

use std::collections::BTreeMap;

use mtb_store::MonthlyStore;
use mtb_types::{CandleSeries, RequiredFile, SymbolBacktestConfig, Timeframe};

use crate::align::{align, AlignError, Alignment};
use crate::replay::{ReplayScheduler, ReplayStats};
use crate::report::{summarize, StatsRow, SummaryReport};
use crate::trader::Trader;

/// Engine knobs, threaded explicitly instead of read from the environment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Candles every timeframe must accumulate before replay may begin.
    pub warmup_bars: usize,
    /// Upper bound on symbols processed in one session.
    pub max_symbols_per_run: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            warmup_bars: 100,
            max_symbols_per_run: 2,
        }
    }
}

/// Everything one symbol's finished run produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SymbolRunReport {
    pub symbol: String,
    pub global_start: i64,
    pub global_end: i64,
    pub replay: ReplayStats,
    pub stats: StatsRow,
}

/// Load and align a symbol's charts for a set of timeframes. The real run
/// passes the trader's required set; the dry-run alignment report passes the
/// configuration's.
pub fn load_alignment(
    store: &MonthlyStore,
    cfg: &SymbolBacktestConfig,
    tfs: &std::collections::BTreeSet<Timeframe>,
    warmup_bars: usize,
) -> Result<Alignment, AlignError> {
    let mut series_by_tf: BTreeMap<Timeframe, CandleSeries> = BTreeMap::new();
    for &tf in tfs {
        let files = cfg
            .sorted_months()
            .into_iter()
            .map(|month| RequiredFile::new(cfg.symbol.clone(), tf, cfg.year, month));
        let candles = store.load_all(files);
        series_by_tf.insert(tf, CandleSeries::from_unsorted(candles));
    }
    align(series_by_tf, warmup_bars)
}

/// Run one symbol's backtest to completion.
///
/// Fail-fast: an alignment error aborts before the trader sees a single
/// candle, so a failed symbol retains no partial results.
pub fn run_symbol(
    store: &MonthlyStore,
    cfg: &SymbolBacktestConfig,
    trader: &mut dyn Trader,
    engine: &EngineConfig,
) -> Result<SymbolRunReport, AlignError> {
    let mut alignment = load_alignment(store, cfg, &trader.required_tfs(), engine.warmup_bars)?;
    tracing::info!(
        symbol = %cfg.symbol,
        timeframes = alignment.charts.len(),
        global_start = alignment.global_start,
        global_end = alignment.global_end,
        "starting replay"
    );

    trader.init_chart(&alignment.init_charts());
    let replay = ReplayScheduler::new(&alignment).run_to_end(&mut alignment, trader);
    trader.close_opening_orders();
    let stats = trader.statistic_trade();

    Ok(SymbolRunReport {
        symbol: cfg.symbol.clone(),
        global_start: alignment.global_start,
        global_end: alignment.global_end,
        replay,
        stats,
    })
}

/// A whole session's outcome: successful runs, per-symbol failures, and the
/// aggregated summary over the successes.
#[derive(Debug)]
pub struct SessionReport {
    pub reports: Vec<SymbolRunReport>,
    pub failures: Vec<(String, AlignError)>,
    pub summary: SummaryReport,
}

/// Run each configured symbol in order, at most `max_symbols_per_run` of
/// them. A symbol that fails alignment is recorded and skipped; it does not
/// stop the session.
pub fn run_session(
    store: &MonthlyStore,
    items: Vec<(SymbolBacktestConfig, Box<dyn Trader>)>,
    engine: &EngineConfig,
) -> SessionReport {
    let capped = items.len().min(engine.max_symbols_per_run);
    if capped < items.len() {
        tracing::warn!(
            configured = items.len(),
            cap = engine.max_symbols_per_run,
            "symbol cap reached, later symbols skipped"
        );
    }

    let mut reports = Vec::new();
    let mut failures = Vec::new();
    for (cfg, mut trader) in items.into_iter().take(capped) {
        match run_symbol(store, &cfg, trader.as_mut(), engine) {
            Ok(report) => reports.push(report),
            Err(err) => {
                tracing::error!(symbol = %cfg.symbol, %err, "symbol backtest aborted");
                failures.push((cfg.symbol, err));
            }
        }
    }

    let summary = summarize(reports.iter().map(|r| r.stats.clone()).collect());
    SessionReport {
        reports,
        failures,
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mtb_types::{Candle, StrategySpec, StrategyTfs};
    use std::collections::BTreeSet;

    /// Counts candles and books one fake winning trade per delivery.
    struct CountingTrader {
        symbol: String,
        tfs: BTreeSet<Timeframe>,
        init_lens: BTreeMap<Timeframe, usize>,
        klines: u64,
        closed: bool,
    }

    impl CountingTrader {
        fn new(symbol: &str, tfs: &[Timeframe]) -> Self {
            Self {
                symbol: symbol.to_string(),
                tfs: tfs.iter().copied().collect(),
                init_lens: BTreeMap::new(),
                klines: 0,
                closed: false,
            }
        }
    }

    impl Trader for CountingTrader {
        fn symbol(&self) -> &str {
            &self.symbol
        }

        fn required_tfs(&self) -> BTreeSet<Timeframe> {
            self.tfs.clone()
        }

        fn init_chart(&mut self, init: &BTreeMap<Timeframe, Vec<Candle>>) {
            self.init_lens = init.iter().map(|(tf, v)| (*tf, v.len())).collect();
        }

        fn on_kline(&mut self, _tf: Timeframe, _candle: &Candle) {
            self.klines += 1;
        }

        fn close_opening_orders(&mut self) {
            self.closed = true;
        }

        fn statistic_trade(&self) -> StatsRow {
            StatsRow {
                name: self.symbol.clone(),
                trades: self.klines,
                wins: self.klines,
                losses: 0,
                gross_profit_micros: self.klines as i64 * 1_000_000,
                gross_loss_micros: 0,
                net_profit_micros: self.klines as i64 * 1_000_000,
            }
        }
    }

    fn write_hourly_month(store: &MonthlyStore, symbol: &str, count: usize) {
        // January 2024, hourly bars from midnight on the 1st.
        let base = 1_704_067_200;
        let candles: Vec<Candle> = (0..count as i64)
            .map(|i| Candle::new(base + i * 3_600, 1_000_000, 2_000_000, 500_000, 1_500_000, 1))
            .collect();
        store
            .write(&RequiredFile::new(symbol, Timeframe::H1, 2024, 1), &candles)
            .unwrap();
    }

    fn config(symbol: &str) -> SymbolBacktestConfig {
        SymbolBacktestConfig {
            symbol: symbol.to_string(),
            year: 2024,
            months: vec![1],
            strategies: vec![StrategySpec {
                name: Some("test".to_string()),
                tfs: StrategyTfs {
                    tf: Some(Timeframe::H1),
                },
                params: Default::default(),
            }],
        }
    }

    fn engine(warmup: usize) -> EngineConfig {
        EngineConfig {
            warmup_bars: warmup,
            max_symbols_per_run: 2,
        }
    }

    #[test]
    fn run_symbol_delivers_init_then_replay() {
        let dir = tempfile::tempdir().unwrap();
        let store = MonthlyStore::new(dir.path());
        write_hourly_month(&store, "EURUSD", 10);

        let mut trader = CountingTrader::new("EURUSD", &[Timeframe::H1]);
        let report = run_symbol(&store, &config("EURUSD"), &mut trader, &engine(4)).unwrap();

        assert_eq!(trader.init_lens[&Timeframe::H1], 4);
        assert_eq!(trader.klines, 6);
        assert!(trader.closed);
        assert_eq!(report.replay.total_delivered(), 6);
        assert_eq!(report.stats.trades, 6);
    }

    #[test]
    fn insufficient_data_aborts_before_any_delivery() {
        let dir = tempfile::tempdir().unwrap();
        let store = MonthlyStore::new(dir.path());
        write_hourly_month(&store, "EURUSD", 3);

        let mut trader = CountingTrader::new("EURUSD", &[Timeframe::H1]);
        let err = run_symbol(&store, &config("EURUSD"), &mut trader, &engine(4)).unwrap_err();

        assert_eq!(
            err,
            AlignError::InsufficientWarmup {
                timeframe: Timeframe::H1,
                required: 4,
                actual: 3,
            }
        );
        assert!(trader.init_lens.is_empty());
        assert_eq!(trader.klines, 0);
        assert!(!trader.closed);
    }

    #[test]
    fn missing_month_fails_as_insufficient_not_empty_replay() {
        let dir = tempfile::tempdir().unwrap();
        let store = MonthlyStore::new(dir.path());

        let mut trader = CountingTrader::new("EURUSD", &[Timeframe::H1]);
        let err = run_symbol(&store, &config("EURUSD"), &mut trader, &engine(4)).unwrap_err();
        assert!(matches!(
            err,
            AlignError::InsufficientWarmup { actual: 0, .. }
        ));
    }

    #[test]
    fn session_caps_symbols_and_sums_totals() {
        let dir = tempfile::tempdir().unwrap();
        let store = MonthlyStore::new(dir.path());
        for symbol in ["AAAUSD", "BBBUSD", "CCCUSD"] {
            write_hourly_month(&store, symbol, 10);
        }

        let items: Vec<(SymbolBacktestConfig, Box<dyn Trader>)> = ["AAAUSD", "BBBUSD", "CCCUSD"]
            .iter()
            .map(|s| {
                (
                    config(s),
                    Box::new(CountingTrader::new(s, &[Timeframe::H1])) as Box<dyn Trader>,
                )
            })
            .collect();
        let session = run_session(&store, items, &engine(4));

        // Cap of 2: the third symbol never ran.
        assert_eq!(session.reports.len(), 2);
        assert!(session.failures.is_empty());
        assert_eq!(session.summary.rows.len(), 2);
        assert_eq!(session.summary.total.trades, 12);
    }

    #[test]
    fn session_records_failures_and_continues() {
        let dir = tempfile::tempdir().unwrap();
        let store = MonthlyStore::new(dir.path());
        write_hourly_month(&store, "GOODUSD", 10);
        // BADUSD has no data at all.

        let items: Vec<(SymbolBacktestConfig, Box<dyn Trader>)> = vec![
            (
                config("BADUSD"),
                Box::new(CountingTrader::new("BADUSD", &[Timeframe::H1])),
            ),
            (
                config("GOODUSD"),
                Box::new(CountingTrader::new("GOODUSD", &[Timeframe::H1])),
            ),
        ];
        let session = run_session(&store, items, &engine(4));

        assert_eq!(session.reports.len(), 1);
        assert_eq!(session.reports[0].symbol, "GOODUSD");
        assert_eq!(session.failures.len(), 1);
        assert_eq!(session.failures[0].0, "BADUSD");
    }

    #[test]
    fn repeated_runs_are_identical() {
        let dir = tempfile::tempdir().unwrap();
        let store = MonthlyStore::new(dir.path());
        write_hourly_month(&store, "EURUSD", 16);

        let mut t1 = CountingTrader::new("EURUSD", &[Timeframe::H1]);
        let mut t2 = CountingTrader::new("EURUSD", &[Timeframe::H1]);
        let r1 = run_symbol(&store, &config("EURUSD"), &mut t1, &engine(4)).unwrap();
        let r2 = run_symbol(&store, &config("EURUSD"), &mut t2, &engine(4)).unwrap();
        assert_eq!(r1, r2);
    }
}
