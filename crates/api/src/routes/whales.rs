//! Ad-hoc whale queries

use crate::{
    state::ApiState,
    validation::{WhaleQuery, top_senders_plan, transfers_plan},
};
use amp::{Diagnostic, QueryError};
use api_types::{ErrorResponse, TopSendersResponse, TransfersResponse};
use axum::{
    Json,
    extract::{Query, State},
};

fn upstream_error(what: &str, err: &QueryError) -> ErrorResponse {
    tracing::error!(error = %err, kind = ?err.kind(), "Failed to get {what}");
    ErrorResponse::upstream(&Diagnostic::from(err))
}

#[utoipa::path(
    get,
    path = "/transfers",
    params(WhaleQuery),
    responses(
        (status = 200, description = "Whale transfers, possibly empty", body = TransfersResponse),
        (status = 400, description = "Invalid parameters", body = ErrorResponse),
        (status = 502, description = "Amp query failed", body = ErrorResponse)
    ),
    tag = "whalescope"
)]
/// Transfers at or above `min_eth` within the last `hours`.
pub async fn transfers(
    Query(query): Query<WhaleQuery>,
    State(state): State<ApiState>,
) -> Result<Json<TransfersResponse>, ErrorResponse> {
    let plan = transfers_plan(state.defaults(), &query)?;
    let transfers =
        state.source().transfers(&plan).await.map_err(|e| upstream_error("transfers", &e))?;

    tracing::info!(count = transfers.len(), "Returning whale transfers");
    Ok(Json(TransfersResponse {
        min_eth: plan.threshold().eth(),
        hours: plan.params().window_hours,
        transfers,
    }))
}

#[utoipa::path(
    get,
    path = "/top-senders",
    params(WhaleQuery),
    responses(
        (status = 200, description = "Senders ranked by ETH moved, possibly empty", body = TopSendersResponse),
        (status = 400, description = "Invalid parameters", body = ErrorResponse),
        (status = 502, description = "Amp query failed", body = ErrorResponse)
    ),
    tag = "whalescope"
)]
/// Senders ranked by total ETH moved in whale transfers.
pub async fn top_senders(
    Query(query): Query<WhaleQuery>,
    State(state): State<ApiState>,
) -> Result<Json<TopSendersResponse>, ErrorResponse> {
    let plan = top_senders_plan(state.defaults(), &query)?;
    let senders =
        state.source().top_senders(&plan).await.map_err(|e| upstream_error("top senders", &e))?;

    tracing::info!(count = senders.len(), "Returning top senders");
    Ok(Json(TopSendersResponse {
        min_eth: plan.threshold().eth(),
        hours: plan.top_senders().window.as_hours().unwrap_or_default(),
        senders,
    }))
}
