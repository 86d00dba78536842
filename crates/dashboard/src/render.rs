//! Plain-text rendering of a [`Snapshot`].

use amp::{Diagnostic, TimeWindow};
use primitives::format::{format_address, format_eth_amount, format_gwei, format_with_commas};

use crate::{FetchStatus, Snapshot};

/// Rows shown in the transfer table.
pub const MAX_TABLE_ROWS: usize = 50;

/// Rows shown in the top sender bar chart.
const MAX_BAR_ROWS: usize = 10;

const BAR_WIDTH: usize = 40;

/// Render the whole dashboard.
pub fn render(snapshot: &Snapshot) -> String {
    let mut out = Vec::new();
    let params = &snapshot.params;

    out.push("🐋 Ethereum Whale Tracker".to_owned());
    out.push(format!(
        "Transfers of at least {} over the {} ({})",
        format_eth_amount(params.min_eth),
        TimeWindow::Hours(params.window_hours),
        snapshot.source.label(),
    ));
    out.push(String::new());

    match &snapshot.transfers_status {
        FetchStatus::Failed { diagnostic } => out.extend(failure(diagnostic)),
        FetchStatus::NoData => {
            out.push("No whale transfers found.".to_owned());
            out.push(
                "Try lowering the minimum ETH amount or widening the time window.".to_owned(),
            );
        }
        FetchStatus::Ok { .. } => {
            out.extend(metrics(snapshot));
            out.extend(distribution(snapshot));
            out.extend(transfer_table(snapshot));
        }
    }

    out.push(String::new());
    out.extend(senders(snapshot));

    out.push(String::new());
    out.push(format!(
        "Powered by Amp · last updated {}",
        snapshot.refreshed_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    out.join("\n")
}

fn failure(diagnostic: &Diagnostic) -> Vec<String> {
    vec![
        format!("✗ {}", diagnostic.kind.title()),
        format!("  {}", diagnostic.message),
        format!("  {}", diagnostic.kind.hint()),
    ]
}

fn heading(title: &str) -> String {
    format!("── {title} ──")
}

fn metrics(snapshot: &Snapshot) -> Vec<String> {
    let summary = &snapshot.summary;
    table(
        &["Whale transfers", "Total ETH moved", "Average transfer", "Largest transfer"],
        vec![vec![
            format_with_commas(summary.count as f64, 0),
            format_eth_amount(summary.total_eth),
            format_eth_amount(summary.average_eth),
            format_eth_amount(summary.largest_eth),
        ]],
    )
}

fn distribution(snapshot: &Snapshot) -> Vec<String> {
    let mut out = vec![String::new(), heading("Transfer size distribution")];
    let max = snapshot.histogram.iter().map(|b| b.count).max().unwrap_or(0);
    let labels: Vec<String> = snapshot
        .histogram
        .iter()
        .map(|b| format!("{} - {}", format_eth_amount(b.lower), format_eth_amount(b.upper)))
        .collect();
    let width = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    for (label, bin) in labels.iter().zip(&snapshot.histogram) {
        out.push(format!("{label:>width$} │{} {}", bar(bin.count as f64, max as f64), bin.count));
    }
    out
}

fn transfer_table(snapshot: &Snapshot) -> Vec<String> {
    let mut out = vec![String::new(), heading("Recent whale transfers")];
    let rows = snapshot
        .transfers
        .iter()
        .take(MAX_TABLE_ROWS)
        .map(|t| {
            vec![
                t.block_time().map_or_else(
                    || t.timestamp.clone().unwrap_or_else(|| "-".to_owned()),
                    |time| time.format("%b %d %H:%M:%S").to_string(),
                ),
                format_with_commas(t.block_num as f64, 0),
                format_eth_amount(t.eth_amount),
                format_address(&t.from_address),
                format_address(&t.to_address),
                t.gas_gwei.map_or_else(|| "-".to_owned(), format_gwei),
                format_address(&t.transaction_hash),
            ]
        })
        .collect();
    out.extend(table(&["Time", "Block", "Amount", "From", "To", "Gas", "Tx"], rows));
    if snapshot.transfers.len() > MAX_TABLE_ROWS {
        out.push(format!("… and {} more", snapshot.transfers.len() - MAX_TABLE_ROWS));
    }
    out
}

fn senders(snapshot: &Snapshot) -> Vec<String> {
    let mut out = vec![heading("Top whale addresses")];
    match &snapshot.top_senders_status {
        FetchStatus::Failed { diagnostic } => {
            out.extend(failure(diagnostic));
            return out;
        }
        FetchStatus::NoData => {
            out.push("No repeat whale senders in this window.".to_owned());
            return out;
        }
        FetchStatus::Ok { .. } => {}
    }

    let top = &snapshot.top_senders;
    let max = top.iter().map(|s| s.total_eth_sent).fold(0.0, f64::max);
    for sender in top.iter().take(MAX_BAR_ROWS) {
        out.push(format!(
            "{} │{} {}",
            format_address(&sender.from_address),
            bar(sender.total_eth_sent, max),
            format_eth_amount(sender.total_eth_sent),
        ));
    }

    out.push(String::new());
    out.push(heading("Whale leaderboard"));
    let rows = top
        .iter()
        .enumerate()
        .map(|(rank, s)| {
            vec![
                format!("#{}", rank + 1),
                format_address(&s.from_address),
                s.transfer_count.to_string(),
                format_eth_amount(s.total_eth_sent),
                format_eth_amount(s.avg_eth_per_transfer),
                format_eth_amount(s.largest_transfer),
            ]
        })
        .collect();
    out.extend(table(&["Rank", "Address", "Transfers", "Total", "Average", "Largest"], rows));
    out
}

fn bar(value: f64, max: f64) -> String {
    if max <= 0.0 || value <= 0.0 {
        return String::new();
    }
    let len = ((value / max) * BAR_WIDTH as f64).round().max(1.0) as usize;
    "█".repeat(len.min(BAR_WIDTH))
}

/// Left aligned columns separated by two spaces.
fn table(headers: &[&str], rows: Vec<Vec<String>>) -> Vec<String> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: Vec<&str>| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_owned()
    };

    let mut out = vec![line(headers.to_vec())];
    let rule: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
    out.push(line(rule.iter().map(String::as_str).collect()));
    out.extend(rows.iter().map(|row| line(row.iter().map(String::as_str).collect())));
    out
}
