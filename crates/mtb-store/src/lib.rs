//! mtb-store
//!
//! Monthly Data Store: one CSV file per (symbol, interval, year, month).
//!
//! The read side never fails: a missing file, an empty file, or unreadable
//! content all yield an empty candle vector plus a warning, because "no
//! data for that month" is an expected state that the alignment layer turns
//! into a hard error only when the total falls below the warm-up minimum.
//! The write side (used by the provisioner after a fetch) reports real I/O
//! errors.

mod csv;
mod store;

pub use csv::{parse_csv_candles, render_csv_candles, CsvError, CSV_HEADER};
pub use store::{MonthlyStore, StoreError};
