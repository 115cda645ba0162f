//! HTTP API for nexus-er
//!
//! Thin envelope over the engine: handlers validate nothing the engine
//! validates itself, they only translate between JSON and engine calls.

mod comparisons;
mod health;
mod merges;
mod sse;
mod sync;

pub use comparisons::comparison_routes;
pub use health::health_routes;
pub use merges::merge_routes;
pub use sse::event_stream;
pub use sync::sync_routes;
