//! Server-Sent Events endpoints

use crate::state::ApiState;
use async_stream::stream;
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use dashboard::Snapshot;
use futures::stream::Stream;
use std::{convert::Infallible, time::Duration as StdDuration};

#[utoipa::path(
    get,
    path = "/sse/dashboard",
    responses(
        (status = 200, description = "Stream of `snapshot` events, the current snapshot first", body = Snapshot, content_type = "text/event-stream")
    ),
    tag = "whalescope"
)]
/// Stream every dashboard snapshot as a `snapshot` event, starting with the
/// current one.
pub async fn sse_dashboard(
    State(state): State<ApiState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut snapshots = state.refresher().subscribe();

    let stream = stream! {
        loop {
            let snapshot = snapshots.borrow_and_update().clone();
            match Event::default().event("snapshot").json_data(snapshot.as_ref()) {
                Ok(event) => yield Ok(event),
                Err(e) => tracing::error!(error = %e, "Failed to encode dashboard snapshot"),
            }

            if snapshots.changed().await.is_err() {
                tracing::debug!("Dashboard refresher stopped, closing SSE stream");
                break;
            }
        }
    };

    let keep_alive = KeepAlive::new().interval(StdDuration::from_secs(15)).text("keepalive");

    Sse::new(stream).keep_alive(keep_alive)
}
