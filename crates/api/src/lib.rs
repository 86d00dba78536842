//! Thin HTTP API over the whale queries and the live dashboard

pub mod routes;
pub mod state;
pub mod validation;

use amp::{Diagnostic, ErrorKind, TransferRecord, WhaleAggregate};
use api_types::{ErrorResponse, RefreshResponse, TopSendersResponse, TransfersResponse};
use dashboard::{
    DashboardParams, FetchStatus, Snapshot, SourceKind,
    stats::{HistogramBin, TransferSummary},
};
use utoipa::OpenApi;
use validation::WhaleQuery;

pub use routes::router;
pub use state::ApiState;

use routes::{dashboard::*, sse::*, whales::*};

/// `OpenAPI` document for the whale endpoints.
#[derive(Debug, OpenApi)]
#[openapi(
    paths(
        transfers,
        top_senders,
        dashboard_snapshot,
        refresh_dashboard,
        update_dashboard_params,
        sse_dashboard
    ),
    components(
        schemas(
            WhaleQuery,
            TransferRecord,
            WhaleAggregate,
            TransfersResponse,
            TopSendersResponse,
            RefreshResponse,
            DashboardParams,
            Snapshot,
            FetchStatus,
            SourceKind,
            TransferSummary,
            HistogramBin,
            Diagnostic,
            ErrorKind,
            ErrorResponse
        )
    ),
    tags(
        (name = "whalescope", description = "Ethereum whale transfer endpoints")
    ),
    info(
        title = "Whalescope API",
        description = "Large Ethereum transfers served from an Amp SQL endpoint",
        version = "0.1.0"
    )
)]
pub struct ApiDoc;
