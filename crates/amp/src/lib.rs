//! Client for the Amp SQL endpoint.
//!
//! [`AmpClient`] posts a SQL statement as plain text and normalizes the
//! newline-delimited JSON response into a [`QueryResult`]. The [`queries`]
//! module holds the whale templates and [`WhaleReader`] ties both together
//! into typed fetches.

mod client;
mod error;
mod models;
pub mod queries;
mod reader;
mod table;

pub use client::{
    AmpClient, DEFAULT_AMP_URL, DEFAULT_QUERY_TIMEOUT, PROBE_TIMEOUT, QueryOutcome, QueryStatus,
};
pub use error::{Diagnostic, ErrorKind, QueryError};
pub use models::{TransferRecord, WhaleAggregate, WhaleStats};
pub use queries::{
    Dataset, DatasetError, Threshold, ThresholdError, TimeWindow, TopSendersQuery, TransferOrder,
    TransfersQuery, WhaleStatsQuery,
};
pub use reader::WhaleReader;
pub use table::{QueryResult, Row};
