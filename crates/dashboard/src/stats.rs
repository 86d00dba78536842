//! Summary statistics computed over fetched transfers.

use std::collections::BTreeMap;

use amp::{TransferRecord, WhaleAggregate};
use serde::Serialize;
use utoipa::ToSchema;

/// Number of histogram bins on the dashboard.
pub const DEFAULT_HISTOGRAM_BINS: usize = 20;

/// Headline numbers over a transfer list.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, ToSchema)]
pub struct TransferSummary {
    /// Number of transfers
    pub count: usize,
    /// Total ETH moved
    pub total_eth: f64,
    /// Average transfer in ETH
    pub average_eth: f64,
    /// Largest transfer in ETH
    pub largest_eth: f64,
}

impl TransferSummary {
    /// Summarise `transfers`. All zero when empty.
    pub fn from_transfers(transfers: &[TransferRecord]) -> Self {
        if transfers.is_empty() {
            return Self::default();
        }
        let total_eth: f64 = transfers.iter().map(|t| t.eth_amount).sum();
        let largest_eth = transfers.iter().map(|t| t.eth_amount).fold(f64::MIN, f64::max);
        Self {
            count: transfers.len(),
            total_eth,
            average_eth: total_eth / transfers.len() as f64,
            largest_eth,
        }
    }
}

/// One bar of the size distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct HistogramBin {
    /// Inclusive lower edge in ETH
    pub lower: f64,
    /// Upper edge in ETH, inclusive for the last bin only
    pub upper: f64,
    /// Transfers in this bin
    pub count: usize,
}

/// Equal-width histogram of `amounts`.
///
/// Empty input gives no bins; identical amounts give a single bin.
pub fn histogram(amounts: &[f64], bins: usize) -> Vec<HistogramBin> {
    let amounts: Vec<f64> = amounts.iter().copied().filter(|a| a.is_finite()).collect();
    if amounts.is_empty() || bins == 0 {
        return Vec::new();
    }
    let min = amounts.iter().copied().fold(f64::MAX, f64::min);
    let max = amounts.iter().copied().fold(f64::MIN, f64::max);
    if max <= min {
        return vec![HistogramBin { lower: min, upper: max, count: amounts.len() }];
    }

    let width = (max - min) / bins as f64;
    let mut counts = vec![0usize; bins];
    for amount in &amounts {
        let idx = (((amount - min) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            lower: min + width * i as f64,
            upper: if i + 1 == bins { max } else { min + width * (i + 1) as f64 },
            count,
        })
        .collect()
}

/// Group transfers by sender.
///
/// Senders with fewer than `min_transfers` transfers are dropped; the rest are
/// ranked by total ETH sent and cut to `limit`.
pub fn aggregate_senders(
    transfers: &[TransferRecord],
    min_transfers: u32,
    limit: u32,
) -> Vec<WhaleAggregate> {
    let mut by_sender: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for transfer in transfers {
        by_sender.entry(transfer.from_address.as_str()).or_default().push(transfer.eth_amount);
    }

    let mut senders: Vec<WhaleAggregate> = by_sender
        .into_iter()
        .filter(|(_, amounts)| amounts.len() as u64 >= u64::from(min_transfers.max(1)))
        .map(|(address, amounts)| {
            let total: f64 = amounts.iter().sum();
            WhaleAggregate {
                from_address: address.to_owned(),
                transfer_count: amounts.len() as u64,
                total_eth_sent: total,
                avg_eth_per_transfer: total / amounts.len() as f64,
                largest_transfer: amounts.iter().copied().fold(f64::MIN, f64::max),
            }
        })
        .collect();

    senders.sort_by(|a, b| b.total_eth_sent.total_cmp(&a.total_eth_sent));
    senders.truncate(limit as usize);
    senders
}
