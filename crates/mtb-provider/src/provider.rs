//! Upstream provider boundary.
//!
//! This module defines only the provider trait, its error type, and the
//! month-window arithmetic shared by implementations. Concrete providers
//! and cache logic live elsewhere in the crate.

use std::fmt;

use chrono::{Duration, NaiveDate};

use mtb_types::{Candle, RequiredFile};

/// Errors that a [`MarketDataProvider`] implementation may return.
#[derive(Debug)]
pub enum ProviderError {
    /// Network or transport failure.
    Transport(String),
    /// The upstream API returned an application-level error.
    Api { status: Option<u16>, message: String },
    /// A response payload could not be decoded.
    Decode(String),
    /// The requested month window is invalid (e.g. month 13).
    Window { year: i32, month: u32 },
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::Transport(msg) => write!(f, "transport error: {msg}"),
            ProviderError::Api {
                status: Some(s),
                message,
            } => write!(f, "provider api error status={s}: {message}"),
            ProviderError::Api {
                status: None,
                message,
            } => write!(f, "provider api error: {message}"),
            ProviderError::Decode(msg) => write!(f, "decode error: {msg}"),
            ProviderError::Window { year, month } => {
                write!(f, "invalid month window {year}-{month:02}")
            }
        }
    }
}

impl std::error::Error for ProviderError {}

/// Upstream candle source contract.
///
/// Implementations must be object-safe so the provisioner can hold a
/// `Box<dyn MarketDataProvider>` without knowing the concrete type.
pub trait MarketDataProvider: Send + Sync {
    /// Human-readable name identifying this provider (e.g. `"binance"`).
    fn name(&self) -> &'static str;

    /// Fetch one calendar month of candles for the given cache unit.
    ///
    /// The returned candles must cover at most the month window; order and
    /// deduplication are the caller's responsibility.
    fn fetch_month(&self, file: &RequiredFile) -> Result<Vec<Candle>, ProviderError>;
}

/// Inclusive UTC epoch-second bounds of one calendar month: the first day at
/// `00:00:00` through the last day at `23:59:59`.
pub fn month_bounds(year: i32, month: u32) -> Result<(i64, i64), ProviderError> {
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or(ProviderError::Window { year, month })?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or(ProviderError::Window { year, month })?;
    let start = first.and_hms_opt(0, 0, 0).ok_or(ProviderError::Window { year, month })?;
    let end = (next - Duration::days(1))
        .and_hms_opt(23, 59, 59)
        .ok_or(ProviderError::Window { year, month })?;
    Ok((start.and_utc().timestamp(), end.and_utc().timestamp()))
}
