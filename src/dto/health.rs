//! Health check response body.

use serde::Serialize;
use utoipa::ToSchema;

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Number of games currently being scored.
    pub live_games: usize,
}

impl HealthResponse {
    /// Create a health response indicating the system is operational.
    pub fn ok(live_games: usize) -> Self {
        Self {
            status: "ok".to_string(),
            live_games,
        }
    }

    /// Create a health response indicating the system is in degraded mode.
    pub fn degraded(live_games: usize) -> Self {
        Self {
            status: "degraded".to_string(),
            live_games,
        }
    }
}
