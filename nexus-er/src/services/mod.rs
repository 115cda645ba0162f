//! Service layer for nexus-er
//!
//! Pure heuristics (similarity, profile_url), external service clients
//! (scorer, graph_client, import_client) and the ingestion-time
//! canonicalization sync.

pub mod graph_client;
pub mod import_client;
pub mod profile_url;
pub mod scorer;
pub mod similarity;
pub mod sync;
