//! Payloads carried on the per-game event streams.

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dto::scoring::{ActionSummary, LiveStateSnapshot};

#[derive(Clone, Debug)]
/// Dispatched payload carried across a game's SSE channel.
pub struct ServerEvent {
    /// SSE event name.
    pub event: Option<String>,
    /// Serialized JSON body.
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to an SSE client when it connects.
///
/// `last_sequence` lets the client detect whether it missed events and needs
/// a resync; events that follow carry consecutive sequence numbers.
pub struct Handshake {
    /// Game the stream is scoped to.
    pub game_id: Uuid,
    /// Highest sequence number published so far for this game.
    pub last_sequence: u64,
    /// Whether the backend is running without a storage backend connection.
    pub degraded: bool,
    /// Current state, so the client can render before the first event.
    pub snapshot: LiveStateSnapshot,
}

#[derive(Debug, Serialize, ToSchema, Clone)]
/// Envelope broadcast for every live game event.
pub struct GameEventPayload {
    /// Event name, e.g. `game.action_added`.
    pub event_type: String,
    /// Game the event belongs to.
    pub game_id: Uuid,
    /// Per-game monotonically increasing sequence number.
    pub sequence_number: u64,
    /// RFC 3339 timestamp of when the event was published.
    pub occurred_at: String,
    /// Full snapshot after the mutation, so a single event is enough to render.
    pub state_snapshot: LiveStateSnapshot,
    /// Journal entry the event refers to, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<ActionSummary>,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the backend enters or leaves degraded mode.
pub struct SystemStatus {
    /// Whether the backend is running without storage.
    pub degraded: bool,
}
