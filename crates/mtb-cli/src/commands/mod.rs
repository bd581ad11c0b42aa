pub mod align;
pub mod data;

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use mtb_provider::{BinanceKlinesProvider, MarketDataProvider};
use mtb_types::SymbolBacktestConfig;

/// Load the symbols configuration: a JSON array of symbol entries.
pub fn load_symbols_config(path: &str) -> Result<Vec<SymbolBacktestConfig>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read symbols config failed: {path}"))?;
    serde_json::from_str(&raw).with_context(|| format!("parse symbols config failed: {path}"))
}

/// Exchange configuration: which provider to build and where it points.
#[derive(Debug, Deserialize)]
pub struct ExchangeConfig {
    pub provider: String,
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Build a provider from an optional exchange config path.
pub fn build_provider(path: Option<&str>) -> Result<Option<Box<dyn MarketDataProvider>>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let raw = fs::read_to_string(Path::new(path))
        .with_context(|| format!("read exchange config failed: {path}"))?;
    let cfg: ExchangeConfig = serde_json::from_str(&raw)
        .with_context(|| format!("parse exchange config failed: {path}"))?;
    match cfg.provider.as_str() {
        "binance" => {
            let provider = match cfg.base_url {
                Some(url) => BinanceKlinesProvider::with_base_url(url),
                None => BinanceKlinesProvider::new(),
            }
            .context("build binance provider failed")?;
            Ok(Some(Box::new(provider)))
        }
        other => anyhow::bail!("unknown provider '{other}' in {path}"),
    }
}
