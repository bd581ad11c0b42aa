//! `mtb align-report`: dry-run alignment without running any strategy.

use anyhow::Result;
use chrono::DateTime;

use mtb_engine::load_alignment;
use mtb_store::MonthlyStore;

use super::load_symbols_config;

fn fmt_ts(secs: i64) -> String {
    DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| secs.to_string())
}

/// Align every configured symbol's charts and print the partition each one
/// would replay with. Alignment failures are reported per symbol exactly as
/// a real run would surface them; any failure makes the command exit
/// non-zero after the full pass.
pub fn align_report(symbols_config: &str, data_dir: &str, warmup: usize) -> Result<()> {
    let configs = load_symbols_config(symbols_config)?;
    let store = MonthlyStore::new(data_dir);

    let mut failures = 0usize;
    for cfg in &configs {
        match load_alignment(&store, cfg, &cfg.required_tfs(), warmup) {
            Ok(alignment) => {
                println!(
                    "{}: global_start={} global_end={}",
                    cfg.symbol,
                    fmt_ts(alignment.global_start),
                    fmt_ts(alignment.global_end)
                );
                for (tf, chart) in &alignment.charts {
                    println!(
                        "  {:>3}: init={} replay={}",
                        tf.as_str(),
                        chart.init_slice().len(),
                        chart.replay_len()
                    );
                }
            }
            Err(err) => {
                println!("{}: alignment failed: {err}", cfg.symbol);
                failures += 1;
            }
        }
    }

    anyhow::ensure!(failures == 0, "{failures} symbol(s) failed alignment");
    Ok(())
}
