//! Hand-rolled CSV codec for the monthly candle files.
//!
//! The on-disk contract is a fixed six-column layout. Header matching is
//! case-insensitive and whitespace-tolerant; anything else in the header is
//! a hard error because it means the file is not one of ours. Data rows are
//! lenient: a malformed row is skipped with a warning so a single bad line
//! cannot erase an otherwise good month.

use std::fmt;

use chrono::{DateTime, NaiveDateTime};

use mtb_types::{micros_to_decimal, price_to_micros, Candle};

/// Canonical header line written by the store.
pub const CSV_HEADER: &str = "Open time,Open,High,Low,Close,Volume";

const COLUMNS: [&str; 6] = ["open time", "open", "high", "low", "close", "volume"];

/// Structural errors that invalidate a whole file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CsvError {
    /// The input had no lines at all.
    Empty,
    /// The first line is not the expected six-column header.
    Header { found: String },
}

impl fmt::Display for CsvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CsvError::Empty => write!(f, "csv input is empty"),
            CsvError::Header { found } => {
                write!(f, "csv header mismatch, expected '{CSV_HEADER}', found '{found}'")
            }
        }
    }
}

impl std::error::Error for CsvError {}

fn header_matches(line: &str) -> bool {
    let cells: Vec<String> = line
        .split(',')
        .map(|c| c.trim().to_ascii_lowercase())
        .collect();
    cells.len() == COLUMNS.len() && cells.iter().zip(COLUMNS).all(|(got, want)| got == want)
}

/// Parse an open-time cell to UTC epoch seconds.
///
/// Accepts the store's own `%Y-%m-%d %H:%M:%S` format first, then RFC 3339
/// for files produced by other exporters.
fn parse_open_time(raw: &str) -> Option<i64> {
    let s = raw.trim();
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc().timestamp());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp());
    }
    None
}

fn parse_row(line: &str) -> Result<Candle, String> {
    let cells: Vec<&str> = line.split(',').collect();
    if cells.len() != COLUMNS.len() {
        return Err(format!("expected 6 columns, found {}", cells.len()));
    }
    let open_time =
        parse_open_time(cells[0]).ok_or_else(|| format!("unparseable open time '{}'", cells[0].trim()))?;
    let open = price_to_micros(cells[1], "open").map_err(|e| e.to_string())?;
    let high = price_to_micros(cells[2], "high").map_err(|e| e.to_string())?;
    let low = price_to_micros(cells[3], "low").map_err(|e| e.to_string())?;
    let close = price_to_micros(cells[4], "close").map_err(|e| e.to_string())?;
    let volume = price_to_micros(cells[5], "volume").map_err(|e| e.to_string())?;
    Ok(Candle::new(open_time, open, high, low, close, volume))
}

/// Parse a monthly candle file.
///
/// Returns the candles in file order. Rows that fail to parse are skipped
/// with a warning; only a missing or wrong header fails the whole input.
pub fn parse_csv_candles(src: &str) -> Result<Vec<Candle>, CsvError> {
    let mut lines = src.lines();
    let header = loop {
        match lines.next() {
            None => return Err(CsvError::Empty),
            Some(l) if l.trim().is_empty() => continue,
            Some(l) => break l,
        }
    };
    if !header_matches(header) {
        return Err(CsvError::Header {
            found: header.trim().to_string(),
        });
    }

    let mut candles = Vec::new();
    for (idx, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_row(line) {
            Ok(candle) => candles.push(candle),
            Err(reason) => {
                // Header is line 1, first data row is line 2.
                tracing::warn!(line = idx + 2, %reason, "skipping malformed csv row");
            }
        }
    }
    Ok(candles)
}

/// Render candles to the canonical on-disk format, header included.
pub fn render_csv_candles(candles: &[Candle]) -> String {
    let mut out = String::with_capacity(64 * (candles.len() + 1));
    out.push_str(CSV_HEADER);
    out.push('\n');
    for c in candles {
        let when = DateTime::from_timestamp(c.open_time, 0)
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| c.open_time.to_string());
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            when,
            micros_to_decimal(c.open_micros),
            micros_to_decimal(c.high_micros),
            micros_to_decimal(c.low_micros),
            micros_to_decimal(c.close_micros),
            micros_to_decimal(c.volume_micros),
        ));
    }
    out
}
