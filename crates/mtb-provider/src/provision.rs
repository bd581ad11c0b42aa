//! The provisioner: make the monthly cache complete before a run.

use std::collections::BTreeMap;
use std::fmt;

use mtb_store::MonthlyStore;
use mtb_types::{RequiredFile, SymbolBacktestConfig};

use crate::provider::MarketDataProvider;
use crate::requirements::required_files;

/// Failure to bring the cache to a complete state.
#[derive(Debug)]
pub enum ProvisionError {
    /// Files are missing and no provider is configured to fetch them.
    NoProvider { missing: Vec<RequiredFile> },
    /// Some fetches failed; the cache is still incomplete.
    FetchIncomplete { failed: usize, total: usize },
}

impl fmt::Display for ProvisionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProvisionError::NoProvider { missing } => write!(
                f,
                "{} monthly file(s) missing and no data provider is configured",
                missing.len()
            ),
            ProvisionError::FetchIncomplete { failed, total } => {
                write!(f, "{failed} of {total} monthly fetches failed")
            }
        }
    }
}

impl std::error::Error for ProvisionError {}

/// Ensures every monthly file a configuration requires is present on disk,
/// fetching gaps through an optional upstream provider.
pub struct Provisioner {
    store: MonthlyStore,
    provider: Option<Box<dyn MarketDataProvider>>,
}

impl Provisioner {
    pub fn new(store: MonthlyStore, provider: Option<Box<dyn MarketDataProvider>>) -> Self {
        Self { store, provider }
    }

    pub fn store(&self) -> &MonthlyStore {
        &self.store
    }

    /// The required files not currently present in the cache, grouped by
    /// symbol for reporting.
    pub fn missing_files(
        &self,
        configs: &[SymbolBacktestConfig],
    ) -> BTreeMap<String, Vec<RequiredFile>> {
        let mut by_symbol: BTreeMap<String, Vec<RequiredFile>> = BTreeMap::new();
        for file in required_files(configs) {
            if !self.store.exists(&file) {
                by_symbol.entry(file.symbol.clone()).or_default().push(file);
            }
        }
        by_symbol
    }

    /// Bring the cache to a complete state for `configs`.
    ///
    /// Fetching is best effort: every missing file is attempted even after
    /// earlier failures, so one bad month does not block the rest. Only
    /// after the full pass does an incomplete cache become an error.
    pub fn ensure_data_files(
        &self,
        configs: &[SymbolBacktestConfig],
    ) -> Result<(), ProvisionError> {
        let by_symbol = self.missing_files(configs);
        let total: usize = by_symbol.values().map(Vec::len).sum();
        if total == 0 {
            tracing::debug!("monthly cache already complete");
            return Ok(());
        }

        let Some(provider) = self.provider.as_deref() else {
            let missing: Vec<RequiredFile> = by_symbol.into_values().flatten().collect();
            return Err(ProvisionError::NoProvider { missing });
        };

        let mut failed = 0usize;
        for (symbol, files) in &by_symbol {
            tracing::info!(
                symbol = %symbol,
                missing = files.len(),
                provider = provider.name(),
                "fetching missing monthly files"
            );
            for file in files {
                match provider.fetch_month(file) {
                    Ok(candles) => {
                        if let Err(err) = self.store.write(file, &candles) {
                            tracing::warn!(file = %file.file_name(), %err, "failed to write month");
                            failed += 1;
                        }
                    }
                    Err(err) => {
                        tracing::warn!(file = %file.file_name(), %err, "failed to fetch month");
                        failed += 1;
                    }
                }
            }
        }

        if failed > 0 {
            return Err(ProvisionError::FetchIncomplete { failed, total });
        }
        Ok(())
    }
}
