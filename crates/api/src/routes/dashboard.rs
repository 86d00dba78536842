//! Dashboard snapshot endpoints

use crate::state::ApiState;
use api_types::{ErrorResponse, RefreshResponse};
use axum::{Json, extract::State, http::StatusCode};
use dashboard::{DashboardParams, Snapshot};

#[utoipa::path(
    get,
    path = "/dashboard",
    responses(
        (status = 200, description = "Latest dashboard snapshot", body = Snapshot)
    ),
    tag = "whalescope"
)]
/// Latest snapshot produced by the background refresher.
///
/// Query failures are reported per section inside the snapshot.
pub async fn dashboard_snapshot(State(state): State<ApiState>) -> Json<Snapshot> {
    Json(state.refresher().latest().as_ref().clone())
}

#[utoipa::path(
    post,
    path = "/dashboard/refresh",
    responses(
        (status = 202, description = "Refresh scheduled", body = RefreshResponse)
    ),
    tag = "whalescope"
)]
/// Refresh the dashboard without waiting for the next tick.
pub async fn refresh_dashboard(
    State(state): State<ApiState>,
) -> (StatusCode, Json<RefreshResponse>) {
    state.refresher().refresh_now();
    (StatusCode::ACCEPTED, Json(RefreshResponse { status: "scheduled".to_owned() }))
}

#[utoipa::path(
    put,
    path = "/dashboard/params",
    request_body = DashboardParams,
    responses(
        (status = 202, description = "Parameters accepted, refresh scheduled", body = DashboardParams),
        (status = 400, description = "Invalid parameters", body = ErrorResponse)
    ),
    tag = "whalescope"
)]
/// Replace the dashboard parameters. Missing fields take their defaults.
pub async fn update_dashboard_params(
    State(state): State<ApiState>,
    Json(params): Json<DashboardParams>,
) -> Result<(StatusCode, Json<DashboardParams>), ErrorResponse> {
    state.refresher().update_params(params.clone()).map_err(|e| {
        tracing::warn!(error = %e, "Rejected dashboard parameters");
        ErrorResponse::invalid_params(e.to_string())
    })?;
    tracing::info!(?params, "Dashboard parameters updated");
    Ok((StatusCode::ACCEPTED, Json(params)))
}
