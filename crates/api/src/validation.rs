//! Validation of API query parameters
//!
//! Parameters are checked and turned into a [`QueryPlan`] before any SQL is
//! built.

use api_types::ErrorResponse;
use dashboard::{DashboardParams, QueryPlan};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

/// Query parameters shared by the whale endpoints
#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct WhaleQuery {
    /// Minimum transfer value in ETH
    pub min_eth: Option<f64>,
    /// Look back this many hours
    pub hours: Option<u32>,
    /// Maximum number of rows
    pub limit: Option<u32>,
    /// Minimum number of transfers per sender (top senders only)
    pub min_transfers: Option<u32>,
    /// List the largest transfers first (transfers only)
    pub largest_first: Option<bool>,
}

/// Plan for the transfer list.
pub fn transfers_plan(
    defaults: &DashboardParams,
    query: &WhaleQuery,
) -> Result<QueryPlan, ErrorResponse> {
    let params = DashboardParams {
        min_eth: query.min_eth.unwrap_or(defaults.min_eth),
        window_hours: query.hours.unwrap_or(defaults.window_hours),
        transfer_limit: query.limit.unwrap_or(defaults.transfer_limit),
        largest_first: query.largest_first.unwrap_or(defaults.largest_first),
        ..defaults.clone()
    };
    plan(&params)
}

/// Plan for the top senders ranking.
///
/// An explicit `hours` is the ranking window itself; otherwise the default
/// transfer window is stretched as usual.
pub fn top_senders_plan(
    defaults: &DashboardParams,
    query: &WhaleQuery,
) -> Result<QueryPlan, ErrorResponse> {
    let (window_hours, sender_window_factor) = match query.hours {
        Some(hours) => (hours, 1),
        None => (defaults.window_hours, defaults.sender_window_factor),
    };
    let params = DashboardParams {
        min_eth: query.min_eth.unwrap_or(defaults.min_eth),
        window_hours,
        sender_window_factor,
        sender_limit: query.limit.unwrap_or(defaults.sender_limit),
        min_sender_transfers: query.min_transfers.unwrap_or(defaults.min_sender_transfers),
        ..defaults.clone()
    };
    plan(&params)
}

/// Validate a full parameter set.
pub fn plan(params: &DashboardParams) -> Result<QueryPlan, ErrorResponse> {
    params.plan().map_err(|e| {
        tracing::warn!(error = %e, "Rejected whale query parameters");
        ErrorResponse::invalid_params(e.to_string())
    })
}
