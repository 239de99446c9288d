//! Service layer: one module per concern, orchestrated by the routes.

/// Per-game server-authoritative clock tick task.
pub mod clock_ticker;
/// OpenAPI documentation generation.
pub mod documentation;
/// Broadcast event naming and publication.
pub mod events;
/// Game scheduling and read-only queries.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Live scoring mutations and the journal edit paths.
pub mod scoring_service;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Score and statistics aggregation over the action journal.
pub mod stats_service;
/// Storage connection supervisor with reconnect backoff.
pub mod storage_supervisor;
