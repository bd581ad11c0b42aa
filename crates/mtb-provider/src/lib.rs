//! mtb-provider
//!
//! Data provisioning for the backtest cache: resolving which monthly files a
//! configuration requires, the upstream provider boundary, and the
//! provisioner that fills cache gaps before a run.

mod binance;
mod provider;
mod provision;
mod requirements;

pub use binance::BinanceKlinesProvider;
pub use provider::{month_bounds, MarketDataProvider, ProviderError};
pub use provision::{ProvisionError, Provisioner};
pub use requirements::required_files;
