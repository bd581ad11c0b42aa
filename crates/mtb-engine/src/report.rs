//! Session aggregation: per-symbol statistics rows and the summary table.
//!
//! Purely functional over already-produced rows; no replay logic.

use serde::{Deserialize, Serialize};

use mtb_types::micros_to_decimal;

/// One terminal statistics row, produced by a trader after its run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsRow {
    pub name: String,
    pub trades: u64,
    pub wins: u64,
    pub losses: u64,
    pub gross_profit_micros: i64,
    pub gross_loss_micros: i64,
    pub net_profit_micros: i64,
}

impl StatsRow {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    fn add(&mut self, other: &StatsRow) {
        self.trades += other.trades;
        self.wins += other.wins;
        self.losses += other.losses;
        self.gross_profit_micros += other.gross_profit_micros;
        self.gross_loss_micros += other.gross_loss_micros;
        self.net_profit_micros += other.net_profit_micros;
    }
}

/// Per-symbol rows plus the column-wise sum row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryReport {
    pub rows: Vec<StatsRow>,
    pub total: StatsRow,
}

/// Aggregate per-symbol rows into a summary with a `TOTAL` sum row.
pub fn summarize(rows: Vec<StatsRow>) -> SummaryReport {
    let mut total = StatsRow::named("TOTAL");
    for row in &rows {
        total.add(row);
    }
    SummaryReport { rows, total }
}

const HEADERS: [&str; 7] = [
    "name",
    "trades",
    "wins",
    "losses",
    "gross profit",
    "gross loss",
    "net profit",
];

fn cells(row: &StatsRow) -> [String; 7] {
    [
        row.name.clone(),
        row.trades.to_string(),
        row.wins.to_string(),
        row.losses.to_string(),
        micros_to_decimal(row.gross_profit_micros),
        micros_to_decimal(row.gross_loss_micros),
        micros_to_decimal(row.net_profit_micros),
    ]
}

/// Render a summary as a fixed-width plain-text table for CLI/log output.
pub fn render_table(report: &SummaryReport) -> String {
    let mut widths: Vec<usize> = HEADERS.iter().map(|h| h.len()).collect();
    let all_cells: Vec<[String; 7]> = report
        .rows
        .iter()
        .chain(std::iter::once(&report.total))
        .map(cells)
        .collect();
    for row in &all_cells {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.len());
        }
    }

    let render_row = |row: &[String]| -> String {
        let joined: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!("{cell:>width$}", width = *w))
            .collect();
        joined.join("  ")
    };

    let header: Vec<String> = HEADERS.iter().map(|h| h.to_string()).collect();
    let mut out = render_row(&header);
    out.push('\n');
    out.push_str(&"-".repeat(widths.iter().sum::<usize>() + 2 * (widths.len() - 1)));
    for row in &all_cells {
        out.push('\n');
        out.push_str(&render_row(row.as_slice()));
    }
    out
}
