//! Server-Sent Events (SSE) utilities
//!
//! Shared SSE implementations for Nexus microservices.

use crate::events::EventBus;
use axum::response::sse::{Event, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

/// Create an SSE stream that forwards EventBus events to the client
///
/// Each event is framed with its type name and carries the serialized
/// event as JSON data. Heartbeat comments keep idle connections alive.
///
/// # Example
/// ```rust,ignore
/// pub async fn event_stream(
///     State(state): State<AppState>,
/// ) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
///     nexus_common::sse::create_event_sse_stream(state.event_bus.clone(), "nexus-er")
/// }
/// ```
pub fn create_event_sse_stream(
    event_bus: EventBus,
    service_name: &'static str,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!("New SSE client connected to {} events", service_name);

    let mut rx = event_bus.subscribe();

    let stream = async_stream::stream! {
        // Send initial connected status
        yield Ok(Event::default()
            .event("ConnectionStatus")
            .data("connected"));

        loop {
            match rx.recv().await {
                Ok(event) => {
                    let data = match serde_json::to_string(&event) {
                        Ok(data) => data,
                        Err(e) => {
                            warn!("SSE: failed to serialize event: {}", e);
                            continue;
                        }
                    };
                    yield Ok(Event::default().event(event.event_type()).data(data));
                }
                Err(RecvError::Lagged(missed)) => {
                    debug!("SSE: {} client lagged, {} events dropped", service_name, missed);
                    continue;
                }
                Err(RecvError::Closed) => {
                    debug!("SSE: {} event bus closed, ending stream", service_name);
                    break;
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("heartbeat"),
    )
}
