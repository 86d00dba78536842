//! Helper utilities to launch the Whalescope API server.

use std::{net::SocketAddr, sync::Arc};

use api::{self, ApiState};
use axum::{
    Router,
    http::{HeaderValue, Method},
};
use eyre::Result;
use runtime::{health, shutdown::ShutdownSignal};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, info};

/// Version prefix for all API routes.
pub const API_VERSION: &str = "v1";

/// Build the API router with CORS and tracing layers.
pub fn router(state: ApiState, allowed_origins: Vec<String>) -> Router {
    let allowed = Arc::new(allowed_origins);
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::predicate({
            let allowed = Arc::clone(&allowed);
            move |origin: &HeaderValue, _| match origin.to_str() {
                Ok(origin) => {
                    allowed.iter().any(|o| o == origin)
                        || origin.starts_with("http://localhost:")
                        || origin.starts_with("http://127.0.0.1:")
                }
                Err(_) => false,
            }
        }))
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers(Any)
        .expose_headers(Any);
    let trace = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .merge(health::router())
        .nest(&format!("/{API_VERSION}"), api::router(state))
        .layer(cors)
        .layer(trace)
}

/// Run the API server on the given address until `shutdown` fires.
pub async fn run(
    addr: SocketAddr,
    state: ApiState,
    allowed_origins: Vec<String>,
    shutdown: ShutdownSignal,
) -> Result<()> {
    let app = router(state, allowed_origins);

    info!("Starting API server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).with_graceful_shutdown(shutdown).await?;
    info!("API server stopped");
    Ok(())
}
