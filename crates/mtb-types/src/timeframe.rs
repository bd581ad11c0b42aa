//! The fixed timeframe enumeration and its firing rules.
//!
//! A firing rule is the set of wall-clock (hour, minute) values at which a
//! bar of that timeframe is considered closed and ready for delivery. A rule
//! with an absent field matches every value of that field. `1w` and `1mn`
//! carry no rule: week and month boundaries cannot be expressed as a fixed
//! {hour, minute} set, so those timeframes are never replayed on the minute
//! clock (they remain valid for loading and fetching).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Supported candle sampling intervals.
///
/// Declaration order is finest to coarsest; `Ord` follows it, which keeps
/// `BTreeSet<Timeframe>` iteration deterministic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1m")]
    M1,
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "30m")]
    M30,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "1d")]
    D1,
    #[serde(rename = "1w")]
    W1,
    #[serde(rename = "1mn")]
    Mn1,
}

/// Within-tick delivery order: coarsest first.
///
/// Only replayable timeframes appear here (those with a firing rule).
pub const REPLAY_ORDER: [Timeframe; 7] = [
    Timeframe::D1,
    Timeframe::H4,
    Timeframe::H1,
    Timeframe::M30,
    Timeframe::M15,
    Timeframe::M5,
    Timeframe::M1,
];

const MINUTES_EVERY_5: &[u32] = &[0, 5, 10, 15, 20, 25, 30, 35, 40, 45, 50, 55];
const MINUTES_EVERY_15: &[u32] = &[0, 15, 30, 45];
const MINUTES_EVERY_30: &[u32] = &[0, 30];
const MINUTE_ZERO: &[u32] = &[0];
const HOURS_EVERY_4: &[u32] = &[0, 4, 8, 12, 16, 20];
const HOUR_ZERO: &[u32] = &[0];

/// Cron-like firing rule: the {hour, minute} values at which a timeframe's
/// bar closes. An absent field always matches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FiringRule {
    pub hours: Option<&'static [u32]>,
    pub minutes: Option<&'static [u32]>,
}

impl FiringRule {
    pub fn matches(&self, hour: u32, minute: u32) -> bool {
        let hour_ok = match self.hours {
            Some(hs) => hs.contains(&hour),
            None => true,
        };
        let minute_ok = match self.minutes {
            Some(ms) => ms.contains(&minute),
            None => true,
        };
        hour_ok && minute_ok
    }
}

impl Timeframe {
    /// Canonical user-facing string (also the serde representation).
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::M1 => "1m",
            Timeframe::M5 => "5m",
            Timeframe::M15 => "15m",
            Timeframe::M30 => "30m",
            Timeframe::H1 => "1h",
            Timeframe::H4 => "4h",
            Timeframe::D1 => "1d",
            Timeframe::W1 => "1w",
            Timeframe::Mn1 => "1mn",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ParseTimeframeError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1m" => Ok(Timeframe::M1),
            "5m" => Ok(Timeframe::M5),
            "15m" => Ok(Timeframe::M15),
            "30m" => Ok(Timeframe::M30),
            "1h" => Ok(Timeframe::H1),
            "4h" => Ok(Timeframe::H4),
            "1d" => Ok(Timeframe::D1),
            "1w" => Ok(Timeframe::W1),
            "1mn" => Ok(Timeframe::Mn1),
            other => Err(ParseTimeframeError(other.to_string())),
        }
    }
}

impl std::str::FromStr for Timeframe {
    type Err = ParseTimeframeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Timeframe::parse(s)
    }
}

impl Timeframe {

    /// Nominal bar duration in seconds.
    ///
    /// `1mn` uses 30 days; calendar months vary and no replay math depends
    /// on this value for non-replayable timeframes.
    pub fn duration_secs(&self) -> i64 {
        match self {
            Timeframe::M1 => 60,
            Timeframe::M5 => 5 * 60,
            Timeframe::M15 => 15 * 60,
            Timeframe::M30 => 30 * 60,
            Timeframe::H1 => 3_600,
            Timeframe::H4 => 4 * 3_600,
            Timeframe::D1 => 86_400,
            Timeframe::W1 => 7 * 86_400,
            Timeframe::Mn1 => 30 * 86_400,
        }
    }

    /// Firing rule for the minute-stepping replay clock, or `None` when the
    /// timeframe cannot be scheduled on a {hour, minute} rule.
    pub fn firing_rule(&self) -> Option<FiringRule> {
        match self {
            Timeframe::M1 => Some(FiringRule {
                hours: None,
                minutes: None,
            }),
            Timeframe::M5 => Some(FiringRule {
                hours: None,
                minutes: Some(MINUTES_EVERY_5),
            }),
            Timeframe::M15 => Some(FiringRule {
                hours: None,
                minutes: Some(MINUTES_EVERY_15),
            }),
            Timeframe::M30 => Some(FiringRule {
                hours: None,
                minutes: Some(MINUTES_EVERY_30),
            }),
            Timeframe::H1 => Some(FiringRule {
                hours: None,
                minutes: Some(MINUTE_ZERO),
            }),
            Timeframe::H4 => Some(FiringRule {
                hours: Some(HOURS_EVERY_4),
                minutes: Some(MINUTE_ZERO),
            }),
            Timeframe::D1 => Some(FiringRule {
                hours: Some(HOUR_ZERO),
                minutes: Some(MINUTE_ZERO),
            }),
            Timeframe::W1 | Timeframe::Mn1 => None,
        }
    }

    pub fn is_replayable(&self) -> bool {
        self.firing_rule().is_some()
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unrecognized timeframe string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTimeframeError(pub String);

impl fmt::Display for ParseTimeframeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid timeframe '{}'. expected one of: 1m | 5m | 15m | 30m | 1h | 4h | 1d | 1w | 1mn",
            self.0
        )
    }
}

impl std::error::Error for ParseTimeframeError {}
