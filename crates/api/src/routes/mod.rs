//! API route definitions

pub mod dashboard;
pub mod sse;
pub mod whales;

use crate::{ApiDoc, state::ApiState};
use axum::{
    Router,
    routing::{get, post, put},
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use self::{dashboard::*, sse::*, whales::*};

/// Build the router with all API endpoints.
pub fn router(state: ApiState) -> Router {
    let api_routes = Router::new()
        .route("/transfers", get(transfers))
        .route("/top-senders", get(top_senders))
        .route("/dashboard", get(dashboard_snapshot))
        .route("/dashboard/refresh", post(refresh_dashboard))
        .route("/dashboard/params", put(update_dashboard_params))
        .route("/sse/dashboard", get(sse_dashboard));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .merge(api_routes)
        .with_state(state)
}
