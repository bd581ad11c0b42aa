//! Data-pipeline command handlers: `mtb ensure-data` and `mtb fetch`.

use anyhow::{Context, Result};

use mtb_provider::{required_files, MarketDataProvider, Provisioner};
use mtb_store::MonthlyStore;
use mtb_types::{RequiredFile, Timeframe};

use super::{build_provider, load_symbols_config};

/// Execute `mtb ensure-data`: diff the required monthly files against the
/// cache and fetch the gaps.
pub fn ensure_data(symbols_config: &str, data_dir: &str, exchange_config: Option<&str>) -> Result<()> {
    let configs = load_symbols_config(symbols_config)?;
    let store = MonthlyStore::new(data_dir);
    let provider = build_provider(exchange_config)?;

    let required = required_files(&configs);
    let provisioner = Provisioner::new(store, provider);
    let missing: usize = provisioner.missing_files(&configs).values().map(Vec::len).sum();

    provisioner
        .ensure_data_files(&configs)
        .context("ensure-data failed")?;

    println!(
        "ensure_data_ok=true required={} fetched={}",
        required.len(),
        missing
    );
    Ok(())
}

/// Execute `mtb fetch`: download explicit months for one symbol/timeframe,
/// replacing any cached copies.
pub fn fetch(
    symbol: &str,
    timeframe: &str,
    year: i32,
    months: &str,
    data_dir: &str,
    exchange_config: Option<&str>,
) -> Result<()> {
    let tf: Timeframe = timeframe
        .parse()
        .with_context(|| format!("unknown timeframe '{timeframe}'"))?;
    let months = parse_months(months)?;
    let provider = build_provider(exchange_config)?
        .context("fetch requires an exchange config (--exchange-config)")?;
    let store = MonthlyStore::new(data_dir);

    for month in months {
        let file = RequiredFile::new(symbol, tf, year, month);
        let candles = provider
            .fetch_month(&file)
            .with_context(|| format!("fetch failed for {}", file.file_name()))?;
        store
            .write(&file, &candles)
            .with_context(|| format!("write failed for {}", file.file_name()))?;
        println!("fetched {} candles={}", file.file_name(), candles.len());
    }
    Ok(())
}

fn parse_months(raw: &str) -> Result<Vec<u32>> {
    let mut months = Vec::new();
    for part in raw.split(',') {
        let month: u32 = part
            .trim()
            .parse()
            .with_context(|| format!("bad month '{part}'"))?;
        anyhow::ensure!((1..=12).contains(&month), "month out of range: {month}");
        months.push(month);
    }
    anyhow::ensure!(!months.is_empty(), "no months given");
    Ok(months)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_months_accepts_comma_list() {
        assert_eq!(parse_months("1,2,3").unwrap(), vec![1, 2, 3]);
        assert_eq!(parse_months(" 11 , 12 ").unwrap(), vec![11, 12]);
    }

    #[test]
    fn parse_months_rejects_garbage() {
        assert!(parse_months("").is_err());
        assert!(parse_months("0").is_err());
        assert!(parse_months("13").is_err());
        assert!(parse_months("jan").is_err());
    }
}
