//! Server-Sent Events endpoint
//!
//! Streams engine events (comparison lifecycle, merges, sync results) to
//! connected review UIs.

use axum::extract::State;
use axum::response::sse::{Event, Sse};
use futures::stream::Stream;
use std::convert::Infallible;

use crate::AppState;

/// GET /events
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    nexus_common::sse::create_event_sse_stream(state.event_bus.clone(), "nexus-er")
}
