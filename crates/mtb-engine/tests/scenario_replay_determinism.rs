use std::collections::{BTreeMap, BTreeSet};

use mtb_engine::{run_symbol, EngineConfig, StatsRow, Trader};
use mtb_store::MonthlyStore;
use mtb_types::{Candle, RequiredFile, StrategySpec, StrategyTfs, SymbolBacktestConfig, Timeframe};

/// Records the full delivery transcript so two runs can be diffed.
struct TranscriptTrader {
    deliveries: Vec<(Timeframe, i64)>,
    init: BTreeMap<Timeframe, Vec<Candle>>,
}

impl TranscriptTrader {
    fn new() -> Self {
        Self {
            deliveries: Vec::new(),
            init: BTreeMap::new(),
        }
    }
}

impl Trader for TranscriptTrader {
    fn symbol(&self) -> &str {
        "EURUSD"
    }

    fn required_tfs(&self) -> BTreeSet<Timeframe> {
        [Timeframe::M5, Timeframe::H1].into_iter().collect()
    }

    fn init_chart(&mut self, init: &BTreeMap<Timeframe, Vec<Candle>>) {
        self.init = init.clone();
    }

    fn on_kline(&mut self, tf: Timeframe, candle: &Candle) {
        self.deliveries.push((tf, candle.open_time));
    }

    fn close_opening_orders(&mut self) {}

    fn statistic_trade(&self) -> StatsRow {
        let mut row = StatsRow::named("EURUSD");
        row.trades = self.deliveries.len() as u64;
        row
    }
}

// Midnight UTC, 2024-01-01.
const BASE: i64 = 1_704_067_200;

fn seed_store(store: &MonthlyStore) {
    let candle = |t: i64| Candle::new(t, 1_000_000, 2_000_000, 500_000, 1_500_000, 1);
    let h1: Vec<Candle> = (0..24).map(|i| candle(BASE + i * 3_600)).collect();
    let m5: Vec<Candle> = (0..288).map(|i| candle(BASE + i * 300)).collect();
    store
        .write(&RequiredFile::new("EURUSD", Timeframe::H1, 2024, 1), &h1)
        .unwrap();
    store
        .write(&RequiredFile::new("EURUSD", Timeframe::M5, 2024, 1), &m5)
        .unwrap();
}

fn config() -> SymbolBacktestConfig {
    SymbolBacktestConfig {
        symbol: "EURUSD".to_string(),
        year: 2024,
        months: vec![1],
        strategies: vec![StrategySpec {
            name: Some("transcript".to_string()),
            tfs: StrategyTfs {
                tf: Some(Timeframe::H1),
            },
            params: Default::default(),
        }],
    }
}

#[test]
fn two_runs_over_the_same_store_are_identical() {
    let dir = tempfile::tempdir().unwrap();
    let store = MonthlyStore::new(dir.path());
    seed_store(&store);
    let engine = EngineConfig {
        warmup_bars: 6,
        max_symbols_per_run: 2,
    };

    let mut t1 = TranscriptTrader::new();
    let mut t2 = TranscriptTrader::new();
    let r1 = run_symbol(&store, &config(), &mut t1, &engine).unwrap();
    let r2 = run_symbol(&store, &config(), &mut t2, &engine).unwrap();

    assert_eq!(r1, r2);
    assert_eq!(t1.deliveries, t2.deliveries);
    assert_eq!(t1.init, t2.init);
    assert!(!t1.deliveries.is_empty());
}

#[test]
fn coarse_candles_never_arrive_after_a_finer_candle_past_their_close() {
    let dir = tempfile::tempdir().unwrap();
    let store = MonthlyStore::new(dir.path());
    seed_store(&store);
    let engine = EngineConfig {
        warmup_bars: 6,
        max_symbols_per_run: 2,
    };

    let mut trader = TranscriptTrader::new();
    run_symbol(&store, &config(), &mut trader, &engine).unwrap();

    // With aligned regular data, an H1 candle closing at minute M must be
    // delivered before any M5 candle that closes after minute M.
    let mut max_m5_open = i64::MIN;
    for (tf, open_time) in &trader.deliveries {
        match tf {
            Timeframe::M5 => max_m5_open = max_m5_open.max(*open_time),
            Timeframe::H1 => {
                // The H1 bar covering [open, open+1h) closes at open+1h; no
                // M5 bar closing after that may already have been seen.
                assert!(
                    max_m5_open + 300 <= open_time + 3_600,
                    "h1 bar at {open_time} arrived after m5 bar at {max_m5_open}"
                );
            }
            _ => {}
        }
    }
}

#[test]
fn warmup_windows_have_exactly_the_configured_length() {
    let dir = tempfile::tempdir().unwrap();
    let store = MonthlyStore::new(dir.path());
    seed_store(&store);
    let engine = EngineConfig {
        warmup_bars: 6,
        max_symbols_per_run: 2,
    };

    let mut trader = TranscriptTrader::new();
    let report = run_symbol(&store, &config(), &mut trader, &engine).unwrap();

    for (tf, window) in &trader.init {
        assert_eq!(window.len(), 6, "{tf:?} warm-up window");
        assert!(window.last().unwrap().open_time <= report.global_start);
    }
    // H1 completes warm-up last (6th hourly bar at 05:00), so it pins the
    // alignment instant.
    assert_eq!(report.global_start, BASE + 5 * 3_600);
}
