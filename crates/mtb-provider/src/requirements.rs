//! Requirement resolution: configuration -> set of monthly cache files.

use std::collections::BTreeSet;

use mtb_types::{RequiredFile, SymbolBacktestConfig};

/// Resolve the distinct monthly files a set of symbol configurations needs.
///
/// The set is the cross product of each symbol's required timeframes and its
/// configured months. Duplicate timeframes across strategies and duplicate
/// months collapse; the result is deterministic regardless of configuration
/// order.
pub fn required_files(configs: &[SymbolBacktestConfig]) -> BTreeSet<RequiredFile> {
    let mut files = BTreeSet::new();
    for cfg in configs {
        let tfs = cfg.required_tfs();
        for tf in &tfs {
            for month in cfg.sorted_months() {
                files.insert(RequiredFile::new(cfg.symbol.clone(), *tf, cfg.year, month));
            }
        }
    }
    files
}
