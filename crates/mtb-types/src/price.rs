//! Deterministic decimal-string <-> integer-micros price conversion.
//!
//! Prices are integer micros everywhere past the storage boundary
//! (1 unit = 1_000_000 micros). Conversion never goes through floating
//! point: strings with more than 6 decimal places are rejected rather than
//! rounded, so a value either converts exactly or not at all.

use std::fmt;

/// Errors produced by price conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The input string was empty or whitespace.
    Empty { field: &'static str },
    /// The input string is not a plain decimal number.
    Invalid { field: &'static str, raw: String },
    /// More than 6 decimal places: an exact micro conversion is impossible.
    TooPrecise { field: &'static str, raw: String },
    /// The converted value overflows `i64` micros.
    Overflow { field: &'static str, raw: String },
}

impl fmt::Display for PriceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceError::Empty { field } => write!(f, "price field '{field}' is empty"),
            PriceError::Invalid { field, raw } => {
                write!(f, "price field '{field}' is not a decimal number: '{raw}'")
            }
            PriceError::TooPrecise { field, raw } => write!(
                f,
                "price field '{field}' has more than 6 decimal places: '{raw}'"
            ),
            PriceError::Overflow { field, raw } => {
                write!(f, "price field '{field}' overflows micros: '{raw}'")
            }
        }
    }
}

impl std::error::Error for PriceError {}

/// Convert a decimal string (e.g. `"1.0935"`) to integer micros.
///
/// Accepts an optional leading sign and an optional fractional part. The
/// fractional part may have at most 6 digits; both parts must be pure ASCII
/// digits. No floating point is involved at any stage.
pub fn price_to_micros(raw: &str, field: &'static str) -> Result<i64, PriceError> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(PriceError::Empty { field });
    }

    let invalid = || PriceError::Invalid {
        field,
        raw: s.to_string(),
    };

    let (negative, body) = match s.as_bytes()[0] {
        b'-' => (true, &s[1..]),
        b'+' => (false, &s[1..]),
        _ => (false, s),
    };

    let (int_part, frac_part) = body.split_once('.').unwrap_or((body, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(invalid());
    }
    if !int_part.bytes().all(|b| b.is_ascii_digit()) || !frac_part.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(invalid());
    }
    if frac_part.len() > 6 {
        return Err(PriceError::TooPrecise {
            field,
            raw: s.to_string(),
        });
    }

    let int_val: i64 = if int_part.is_empty() {
        0
    } else {
        int_part.parse().map_err(|_| PriceError::Overflow {
            field,
            raw: s.to_string(),
        })?
    };

    let mut frac_val: i64 = 0;
    if !frac_part.is_empty() {
        // Scale e.g. "34" -> 340_000 by right-padding to 6 digits.
        frac_val = frac_part.parse::<i64>().map_err(|_| invalid())?;
        for _ in frac_part.len()..6 {
            frac_val *= 10;
        }
    }

    let micros = int_val
        .checked_mul(1_000_000)
        .and_then(|v| v.checked_add(frac_val))
        .ok_or(PriceError::Overflow {
            field,
            raw: s.to_string(),
        })?;

    Ok(if negative { -micros } else { micros })
}

/// Render integer micros back to a decimal string with trailing fractional
/// zeros trimmed (`1_100_000` -> `"1.1"`, `2_000_000` -> `"2"`).
///
/// Inverse of [`price_to_micros`] up to trailing-zero normalization.
pub fn micros_to_decimal(micros: i64) -> String {
    let sign = if micros < 0 { "-" } else { "" };
    let abs = micros.unsigned_abs();
    let int_part = abs / 1_000_000;
    let frac_part = abs % 1_000_000;
    if frac_part == 0 {
        return format!("{sign}{int_part}");
    }
    let mut frac = format!("{frac_part:06}");
    while frac.ends_with('0') {
        frac.pop();
    }
    format!("{sign}{int_part}.{frac}")
}
