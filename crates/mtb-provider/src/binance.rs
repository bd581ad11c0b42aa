//! Binance klines provider.
//!
//! Fetches one calendar month of OHLCV candles from the public
//! `/api/v3/klines` endpoint, paginating in batches of 1000. Prices arrive
//! as decimal strings and are converted straight to integer micros; no
//! floating point touches the data path.

use mtb_types::{price_to_micros, Candle, RequiredFile, Timeframe};

use crate::provider::{month_bounds, MarketDataProvider, ProviderError};

const DEFAULT_BASE_URL: &str = "https://api.binance.com";
const BATCH_LIMIT: usize = 1000;

pub struct BinanceKlinesProvider {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl BinanceKlinesProvider {
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Build a provider against a non-default endpoint (tests, mirrors).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, ProviderError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn fetch_batch(
        &self,
        symbol: &str,
        interval: &str,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<Candle>, ProviderError> {
        let url = format!("{}/api/v3/klines", self.base_url);
        let start = start_ms.to_string();
        let end = end_ms.to_string();
        let limit = BATCH_LIMIT.to_string();
        let response = self
            .client
            .get(&url)
            .query(&[
                ("symbol", symbol),
                ("interval", interval),
                ("startTime", start.as_str()),
                ("endTime", end.as_str()),
                ("limit", limit.as_str()),
            ])
            .send()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;
        if !status.is_success() {
            return Err(ProviderError::Api {
                status: Some(status.as_u16()),
                message: body.chars().take(200).collect(),
            });
        }

        let value: serde_json::Value =
            serde_json::from_str(&body).map_err(|e| ProviderError::Decode(e.to_string()))?;
        parse_klines(&value)
    }
}

/// Binance interval string for a timeframe. Differs from the canonical
/// timeframe string only for the monthly interval (`1mn` vs `1M`).
pub(crate) fn binance_interval(tf: Timeframe) -> &'static str {
    match tf {
        Timeframe::Mn1 => "1M",
        other => other.as_str(),
    }
}

/// Decode a klines response payload: an array of arrays where index 0 is the
/// open time in epoch milliseconds and indexes 1 through 5 are decimal
/// strings for open, high, low, close, and volume.
fn parse_klines(value: &serde_json::Value) -> Result<Vec<Candle>, ProviderError> {
    let rows = value
        .as_array()
        .ok_or_else(|| ProviderError::Decode("klines payload is not an array".to_string()))?;
    let mut candles = Vec::with_capacity(rows.len());
    for row in rows {
        candles.push(parse_kline_row(row)?);
    }
    Ok(candles)
}

fn parse_kline_row(row: &serde_json::Value) -> Result<Candle, ProviderError> {
    let cells = row
        .as_array()
        .filter(|c| c.len() >= 6)
        .ok_or_else(|| ProviderError::Decode("kline row too short".to_string()))?;
    let open_time_ms = cells[0]
        .as_i64()
        .ok_or_else(|| ProviderError::Decode("kline open time is not an integer".to_string()))?;
    let price = |idx: usize, field: &'static str| -> Result<i64, ProviderError> {
        let raw = cells[idx]
            .as_str()
            .ok_or_else(|| ProviderError::Decode(format!("kline {field} is not a string")))?;
        price_to_micros(raw, field).map_err(|e| ProviderError::Decode(e.to_string()))
    };
    Ok(Candle::new(
        open_time_ms / 1000,
        price(1, "open")?,
        price(2, "high")?,
        price(3, "low")?,
        price(4, "close")?,
        price(5, "volume")?,
    ))
}

impl MarketDataProvider for BinanceKlinesProvider {
    fn name(&self) -> &'static str {
        "binance"
    }

    fn fetch_month(&self, file: &RequiredFile) -> Result<Vec<Candle>, ProviderError> {
        let (start_secs, end_secs) = month_bounds(file.year, file.month)?;
        let interval = binance_interval(file.timeframe);
        let end_ms = end_secs * 1000 + 999;
        let mut cursor_ms = start_secs * 1000;
        let mut candles = Vec::new();

        while cursor_ms <= end_ms {
            let batch = self.fetch_batch(&file.symbol, interval, cursor_ms, end_ms)?;
            let batch_len = batch.len();
            let last_open = batch.last().map(|c| c.open_time);
            candles.extend(batch);
            let Some(last_open) = last_open else {
                break;
            };
            if batch_len < BATCH_LIMIT {
                break;
            }
            // Next batch starts one bar after the last one received.
            let next_ms = (last_open + file.timeframe.duration_secs()) * 1000;
            if next_ms <= cursor_ms {
                return Err(ProviderError::Decode(
                    "kline pagination did not advance".to_string(),
                ));
            }
            cursor_ms = next_ms;
        }

        tracing::debug!(
            file = %file.file_name(),
            candles = candles.len(),
            "fetched month from binance"
        );
        Ok(candles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn interval_mapping_matches_binance() {
        assert_eq!(binance_interval(Timeframe::M1), "1m");
        assert_eq!(binance_interval(Timeframe::H4), "4h");
        assert_eq!(binance_interval(Timeframe::W1), "1w");
        assert_eq!(binance_interval(Timeframe::Mn1), "1M");
    }

    #[test]
    fn parses_kline_payload() {
        let payload = json!([
            [1704067200000i64, "1.1", "1.2", "1.0", "1.15", "1000", 1704070799999i64, "0", 1, "0", "0", "0"],
            [1704070800000i64, "1.15", "1.3", "1.1", "1.25", "900", 1704074399999i64, "0", 1, "0", "0", "0"]
        ]);
        let candles = parse_klines(&payload).unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].open_time, 1_704_067_200);
        assert_eq!(candles[0].high_micros, 1_200_000);
        assert_eq!(candles[1].volume_micros, 900_000_000);
    }

    #[test]
    fn rejects_non_array_payload() {
        let err = parse_klines(&json!({"code": -1121})).unwrap_err();
        assert!(matches!(err, ProviderError::Decode(_)));
    }

    #[test]
    fn rejects_short_row() {
        let err = parse_klines(&json!([[1704067200000i64, "1.1"]])).unwrap_err();
        assert!(matches!(err, ProviderError::Decode(_)));
    }

    #[test]
    fn rejects_numeric_price_cell() {
        let payload = json!([[1704067200000i64, 1.1, "1.2", "1.0", "1.15", "1000"]]);
        assert!(parse_klines(&payload).is_err());
    }
}
