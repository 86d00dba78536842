//! Dashboard parameters and their validation.

use amp::{
    Threshold, ThresholdError, TimeWindow, TopSendersQuery, TransferOrder, TransfersQuery,
    queries::{MAX_SENDER_LIMIT, MAX_TRANSFER_LIMIT},
};
use config::WhaleOpts;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Everything that shapes one dashboard refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct DashboardParams {
    /// Minimum transfer value in ETH
    pub min_eth: f64,
    /// Transfer window in hours
    pub window_hours: u32,
    /// Maximum number of transfers
    pub transfer_limit: u32,
    /// Maximum number of top senders
    pub sender_limit: u32,
    /// Minimum number of transfers for a sender to be ranked
    pub min_sender_transfers: u32,
    /// Top senders look back this many times the transfer window
    pub sender_window_factor: u32,
    /// List the largest transfers first instead of the newest
    pub largest_first: bool,
}

impl Default for DashboardParams {
    fn default() -> Self {
        Self {
            min_eth: 50.0,
            window_hours: 6,
            transfer_limit: TransfersQuery::DEFAULT_LIMIT,
            sender_limit: TopSendersQuery::DEFAULT_LIMIT,
            min_sender_transfers: TopSendersQuery::DEFAULT_MIN_TRANSFERS,
            sender_window_factor: 2,
            largest_first: false,
        }
    }
}

impl From<&WhaleOpts> for DashboardParams {
    fn from(opts: &WhaleOpts) -> Self {
        Self {
            min_eth: opts.min_eth,
            window_hours: opts.window_hours,
            transfer_limit: opts.transfer_limit,
            sender_limit: opts.sender_limit,
            min_sender_transfers: opts.min_sender_transfers,
            ..Self::default()
        }
    }
}

/// Rejected [`DashboardParams`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamsError {
    /// Threshold is not a positive finite amount.
    #[error(transparent)]
    Threshold(#[from] ThresholdError),
    /// Window outside `1..=MAX_HOURS`.
    #[error("window must be between 1 and {max} hours, got {0}", max = TimeWindow::MAX_HOURS)]
    Window(u32),
    /// A count that must be at least one is zero.
    #[error("{0} must be at least 1")]
    Zero(&'static str),
    /// Transfer limit above what one query may return.
    #[error("transfer limit must be at most {max}, got {0}", max = MAX_TRANSFER_LIMIT)]
    TransferLimit(u32),
    /// Sender limit above what one query may return.
    #[error("sender limit must be at most {max}, got {0}", max = MAX_SENDER_LIMIT)]
    SenderLimit(u32),
}

impl DashboardParams {
    /// Check every field and build the queries they describe.
    pub fn plan(&self) -> Result<QueryPlan, ParamsError> {
        let threshold = Threshold::from_eth(self.min_eth)?;
        if self.window_hours == 0 || self.window_hours > TimeWindow::MAX_HOURS {
            return Err(ParamsError::Window(self.window_hours));
        }
        for (name, value) in [
            ("transfer limit", self.transfer_limit),
            ("sender limit", self.sender_limit),
            ("minimum sender transfers", self.min_sender_transfers),
            ("sender window factor", self.sender_window_factor),
        ] {
            if value == 0 {
                return Err(ParamsError::Zero(name));
            }
        }
        if self.transfer_limit > MAX_TRANSFER_LIMIT {
            return Err(ParamsError::TransferLimit(self.transfer_limit));
        }
        if self.sender_limit > MAX_SENDER_LIMIT {
            return Err(ParamsError::SenderLimit(self.sender_limit));
        }

        let window = TimeWindow::Hours(self.window_hours);
        let transfers = TransfersQuery {
            window,
            order: if self.largest_first { TransferOrder::Largest } else { TransferOrder::Recent },
            limit: self.transfer_limit,
            include_gas: true,
            ..TransfersQuery::new(threshold)
        };
        let top_senders = TopSendersQuery {
            window: window.scaled(self.sender_window_factor),
            min_transfers: self.min_sender_transfers,
            limit: self.sender_limit,
            ..TopSendersQuery::new(threshold)
        };
        Ok(QueryPlan { params: self.clone(), threshold, transfers, top_senders })
    }

    /// Shorthand for `self.plan().map(|_| ())`.
    pub fn validate(&self) -> Result<(), ParamsError> {
        self.plan().map(|_| ())
    }
}

/// Validated parameters together with the queries built from them.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    params: DashboardParams,
    threshold: Threshold,
    transfers: TransfersQuery,
    top_senders: TopSendersQuery,
}

impl QueryPlan {
    /// Parameters the plan was built from.
    pub const fn params(&self) -> &DashboardParams {
        &self.params
    }

    /// Minimum transfer value.
    pub const fn threshold(&self) -> Threshold {
        self.threshold
    }

    /// Transfer list query.
    pub const fn transfers(&self) -> &TransfersQuery {
        &self.transfers
    }

    /// Top senders query.
    pub const fn top_senders(&self) -> &TopSendersQuery {
        &self.top_senders
    }
}
