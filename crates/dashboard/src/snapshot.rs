//! One refresh of the dashboard.

use std::time::Instant;

use amp::{Diagnostic, QueryError, TransferRecord, WhaleAggregate};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::{
    DashboardParams, QueryPlan, SourceKind, WhaleSource,
    stats::{DEFAULT_HISTOGRAM_BINS, HistogramBin, TransferSummary, histogram},
};

/// How one fetch of a snapshot went.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FetchStatus {
    /// Rows were returned
    Ok {
        /// Number of rows
        rows: usize,
    },
    /// The query succeeded without rows
    NoData,
    /// The query failed
    Failed {
        /// What went wrong
        diagnostic: Diagnostic,
    },
}

impl FetchStatus {
    fn split<T>(result: Result<Vec<T>, QueryError>) -> (Vec<T>, Self) {
        match result {
            Ok(rows) if rows.is_empty() => (rows, Self::NoData),
            Ok(rows) => {
                let status = Self::Ok { rows: rows.len() };
                (rows, status)
            }
            Err(e) => (Vec::new(), Self::Failed { diagnostic: Diagnostic::from(e) }),
        }
    }

    /// Whether the fetch failed.
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Failure details, if any.
    pub const fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            Self::Failed { diagnostic } => Some(diagnostic),
            _ => None,
        }
    }
}

/// Everything the dashboard shows after one refresh.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Snapshot {
    /// Where the rows came from
    pub source: SourceKind,
    /// Parameters used for this refresh
    pub params: DashboardParams,
    /// Whale transfers
    pub transfers: Vec<TransferRecord>,
    /// Outcome of the transfer query
    pub transfers_status: FetchStatus,
    /// Top senders
    pub top_senders: Vec<WhaleAggregate>,
    /// Outcome of the top senders query
    pub top_senders_status: FetchStatus,
    /// Headline numbers over `transfers`
    pub summary: TransferSummary,
    /// Distribution of transfer sizes
    pub histogram: Vec<HistogramBin>,
    /// When the refresh finished
    pub refreshed_at: DateTime<Utc>,
}

impl Snapshot {
    /// Whether any fetch failed.
    pub const fn has_failures(&self) -> bool {
        self.transfers_status.is_failed() || self.top_senders_status.is_failed()
    }
}

/// Fetch transfers, then top senders, and summarise them.
///
/// Failures end up in the per-fetch [`FetchStatus`]; this never fails.
pub async fn refresh<S: WhaleSource + ?Sized>(source: &S, plan: &QueryPlan) -> Snapshot {
    let start = Instant::now();

    let (transfers, transfers_status) = FetchStatus::split(source.transfers(plan).await);
    let (top_senders, top_senders_status) = FetchStatus::split(source.top_senders(plan).await);

    let summary = TransferSummary::from_transfers(&transfers);
    let amounts: Vec<f64> = transfers.iter().map(|t| t.eth_amount).collect();
    let snapshot = Snapshot {
        source: source.kind(),
        params: plan.params().clone(),
        histogram: histogram(&amounts, DEFAULT_HISTOGRAM_BINS),
        transfers,
        transfers_status,
        top_senders,
        top_senders_status,
        summary,
        refreshed_at: Utc::now(),
    };

    let duration_ms = start.elapsed().as_millis();
    if snapshot.has_failures() {
        warn!(
            source = ?snapshot.source,
            transfers = snapshot.transfers.len(),
            senders = snapshot.top_senders.len(),
            duration_ms,
            "Dashboard refreshed with failures"
        );
    } else {
        info!(
            source = ?snapshot.source,
            transfers = snapshot.transfers.len(),
            senders = snapshot.top_senders.len(),
            total_eth = snapshot.summary.total_eth,
            duration_ms,
            "Dashboard refreshed"
        );
    }
    snapshot
}
