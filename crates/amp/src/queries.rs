//! SQL templates for whale queries.
//!
//! Only typed numeric parameters and a validated [`Dataset`] are interpolated.
//! Free-text parameters must never be formatted into these strings.

mod dataset;


use std::fmt;

use alloy_primitives::U256;
use primitives::units::{WEI_PER_ETH_SQL, WEI_PER_GWEI_SQL, eth_to_wei};
use thiserror::Error;

pub use dataset::{DEFAULT_DATASET, Dataset, DatasetError};

/// Statement used to check that the endpoint answers at all.
pub const PROBE_SQL: &str = "SELECT 1 AS test";

/// Upper bound for the number of transfers returned by one query.
pub const MAX_TRANSFER_LIMIT: u32 = 500;

/// Upper bound for the number of senders returned by one query.
pub const MAX_SENDER_LIMIT: u32 = 50;

const TRANSACTIONS: &str = "transactions";

/// Minimum transfer value, kept both in whole ETH and in raw wei.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Threshold {
    eth: f64,
    wei: U256,
}

/// Invalid [`Threshold`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ThresholdError {
    /// NaN or infinite.
    #[error("threshold must be finite, got {0}")]
    NotFinite(f64),
    /// Zero or negative.
    #[error("threshold must be positive, got {0}")]
    NotPositive(f64),
    /// Not representable with 18 decimals.
    #[error("threshold {0} cannot be converted to wei: {1}")]
    Units(f64, String),
}

impl Threshold {
    /// Build a threshold from whole ETH.
    ///
    /// The raw value is `eth × 10^18`, computed exactly.
    pub fn from_eth(eth: f64) -> Result<Self, ThresholdError> {
        if !eth.is_finite() {
            return Err(ThresholdError::NotFinite(eth));
        }
        if eth <= 0.0 {
            return Err(ThresholdError::NotPositive(eth));
        }
        let wei = eth_to_wei(eth).map_err(|e| ThresholdError::Units(eth, e.to_string()))?;
        if wei.is_zero() {
            return Err(ThresholdError::NotPositive(eth));
        }
        Ok(Self { eth, wei })
    }

    /// Threshold in whole ETH.
    pub const fn eth(&self) -> f64 {
        self.eth
    }

    /// Threshold in raw wei.
    pub const fn wei(&self) -> U256 {
        self.wei
    }
}

/// How far back a query looks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeWindow {
    /// Rows with a timestamp within the last `n` hours.
    Hours(u32),
    /// No timestamp filter; the newest rows up to the limit.
    Latest,
}

impl TimeWindow {
    /// Longest supported window (30 days).
    pub const MAX_HOURS: u32 = 30 * 24;

    /// Window of `hours`, clamped to [`Self::MAX_HOURS`].
    pub fn hours(hours: u32) -> Self {
        Self::Hours(hours.clamp(1, Self::MAX_HOURS))
    }

    /// This window stretched by `factor`, still clamped.
    pub fn scaled(self, factor: u32) -> Self {
        match self {
            Self::Hours(h) => Self::hours(h.saturating_mul(factor.max(1))),
            Self::Latest => Self::Latest,
        }
    }

    /// Length in hours, `None` for [`Self::Latest`].
    pub const fn as_hours(self) -> Option<u32> {
        match self {
            Self::Hours(h) => Some(h),
            Self::Latest => None,
        }
    }

    fn filter(self) -> Option<String> {
        match self {
            Self::Hours(h) => Some(format!("timestamp > NOW() - INTERVAL '{h} hours'")),
            Self::Latest => None,
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hours(1) => write!(f, "last hour"),
            Self::Hours(h) => write!(f, "last {h} hours"),
            Self::Latest => write!(f, "latest blocks"),
        }
    }
}

/// Ordering of the transfer list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferOrder {
    /// Newest block first
    #[default]
    Recent,
    /// Largest amount first
    Largest,
}

impl TransferOrder {
    const fn order_by(self) -> &'static str {
        match self {
            Self::Recent => "block_num DESC",
            Self::Largest => "eth_amount DESC",
        }
    }
}

/// Large transfers above a threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransfersQuery {
    /// Minimum transfer value
    pub min_value: Threshold,
    /// Time window
    pub window: TimeWindow,
    /// Ordering
    pub order: TransferOrder,
    /// Maximum number of rows, clamped to `1..=MAX_TRANSFER_LIMIT`
    pub limit: u32,
    /// Also select gas price, gas used and the derived fee
    pub include_gas: bool,
}

impl TransfersQuery {
    /// Default row limit.
    pub const DEFAULT_LIMIT: u32 = 200;

    /// Recent transfers of at least `min_value` over the last hour.
    pub const fn new(min_value: Threshold) -> Self {
        Self {
            min_value,
            window: TimeWindow::Hours(1),
            order: TransferOrder::Recent,
            limit: Self::DEFAULT_LIMIT,
            include_gas: false,
        }
    }

    /// Render the statement against `dataset`.
    pub fn to_sql(&self, dataset: &Dataset) -> String {
        format!(
            "SELECT\n{columns}\nFROM {table}\n{filter}\nORDER BY {order}\nLIMIT {limit}",
            columns = transfer_columns(self.include_gas),
            table = dataset.table(TRANSACTIONS),
            filter = whale_filter(&self.min_value, self.window),
            order = self.order.order_by(),
            limit = self.limit.clamp(1, MAX_TRANSFER_LIMIT),
        )
    }
}

/// Senders ranked by total value moved in transfers above a threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TopSendersQuery {
    /// Minimum value of each counted transfer
    pub min_value: Threshold,
    /// Time window
    pub window: TimeWindow,
    /// Senders with fewer qualifying transfers are left out
    pub min_transfers: u32,
    /// Maximum number of rows, clamped to `1..=MAX_SENDER_LIMIT`
    pub limit: u32,
}

impl TopSendersQuery {
    /// Default row limit.
    pub const DEFAULT_LIMIT: u32 = 20;
    /// Default minimum number of transfers per sender.
    pub const DEFAULT_MIN_TRANSFERS: u32 = 2;

    /// Top senders of transfers of at least `min_value` over the last day.
    pub const fn new(min_value: Threshold) -> Self {
        Self {
            min_value,
            window: TimeWindow::Hours(24),
            min_transfers: Self::DEFAULT_MIN_TRANSFERS,
            limit: Self::DEFAULT_LIMIT,
        }
    }

    /// Render the statement against `dataset`.
    pub fn to_sql(&self, dataset: &Dataset) -> String {
        let value = eth_value("value");
        format!(
            "SELECT\n    \"from\" AS from_address,\n    COUNT(*) AS transfer_count,\n    \
             SUM({value}) AS total_eth_sent,\n    AVG({value}) AS avg_eth_per_transfer,\n    \
             MAX({value}) AS largest_transfer\n\
             FROM {table}\n{filter}\n\
             GROUP BY \"from\"\n\
             HAVING COUNT(*) >= {min_transfers}\n\
             ORDER BY total_eth_sent DESC\n\
             LIMIT {limit}",
            table = dataset.table(TRANSACTIONS),
            filter = whale_filter(&self.min_value, self.window),
            min_transfers = self.min_transfers.max(1),
            limit = self.limit.clamp(1, MAX_SENDER_LIMIT),
        )
    }
}

/// Count, maximum and average of transfers above a threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WhaleStatsQuery {
    /// Minimum transfer value
    pub min_value: Threshold,
    /// Time window
    pub window: TimeWindow,
}

impl WhaleStatsQuery {
    /// Render the statement against `dataset`.
    pub fn to_sql(&self, dataset: &Dataset) -> String {
        let value = eth_value("value");
        format!(
            "SELECT\n    COUNT(*) AS whale_count,\n    MAX({value}) AS largest_transfer,\n    \
             AVG({value}) AS avg_transfer\n\
             FROM {table}\n{filter}",
            table = dataset.table(TRANSACTIONS),
            filter = whale_filter(&self.min_value, self.window),
        )
    }
}

/// Latest transactions of any size, used to check that data is indexed.
pub fn sample_transactions(dataset: &Dataset, limit: u32) -> String {
    format!(
        "SELECT\n{columns}\nFROM {table}\nWHERE \"to\" IS NOT NULL\nORDER BY block_num DESC\n\
         LIMIT {limit}",
        columns = transfer_columns(false),
        table = dataset.table(TRANSACTIONS),
        limit = limit.clamp(1, MAX_TRANSFER_LIMIT),
    )
}

/// `column` converted from wei to ETH.
fn eth_value(column: &str) -> String {
    format!("CAST({column} AS DOUBLE) / {WEI_PER_ETH_SQL}")
}

fn transfer_columns(include_gas: bool) -> String {
    let mut columns = vec![
        "    block_num".to_owned(),
        "    timestamp".to_owned(),
        "    tx_hash AS transaction_hash".to_owned(),
        "    \"from\" AS from_address".to_owned(),
        "    \"to\" AS to_address".to_owned(),
        format!("    {} AS eth_amount", eth_value("value")),
    ];
    if include_gas {
        columns.push(format!("    CAST(gas_price AS DOUBLE) / {WEI_PER_GWEI_SQL} AS gas_gwei"));
        columns.push("    gas_used".to_owned());
        columns.push(format!(
            "    CAST(gas_price AS DOUBLE) * CAST(gas_used AS DOUBLE) / {WEI_PER_ETH_SQL} AS gas_fee_eth"
        ));
    }
    columns.join(",\n")
}

/// Shared `WHERE` clause: recipient present, raw value at or above the
/// threshold (inclusive), optional time window.
fn whale_filter(min_value: &Threshold, window: TimeWindow) -> String {
    let mut sql =
        format!("WHERE \"to\" IS NOT NULL\n  AND CAST(value AS DOUBLE) >= {}", min_value.wei());
    if let Some(filter) = window.filter() {
        sql.push_str("\n  AND ");
        sql.push_str(&filter);
    }
    sql
}
