//! Naming and publication of the per-game broadcast events.

use std::time::SystemTime;

use tracing::warn;

use crate::{
    dto::{
        format_system_time,
        scoring::{ActionSummary, LiveStateSnapshot},
        sse::{GameEventPayload, ServerEvent},
    },
    state::{LiveGame, LiveGameState},
};

/// A game left the scheduled state and is now accepting actions.
pub const GAME_STARTED: &str = "game.started";
/// A journal entry was appended.
pub const ACTION_ADDED: &str = "game.action_added";
/// A journal entry was corrected in place.
pub const ACTION_CORRECTED: &str = "game.action_corrected";
/// A journal entry was soft-deleted.
pub const ACTION_DELETED: &str = "game.action_deleted";
/// The score changed as a result of a journal mutation.
pub const SCORE_UPDATED: &str = "game.score_updated";
/// The game clock, shot clock or period advanced.
pub const CLOCK_UPDATED: &str = "game.clock_updated";
/// A team timeout started.
pub const TIMEOUT_STARTED: &str = "game.timeout_started";
/// The running timeout ended.
pub const TIMEOUT_ENDED: &str = "game.timeout_ended";
/// The on-court lineup of a team changed.
pub const ROSTER_UPDATED: &str = "game.roster_updated";
/// The game reached its final state.
pub const FINISHED: &str = "game.finished";

/// Publish a sequence-numbered event on the game's channel.
///
/// Publication is fire-and-forget: a serialisation failure or the absence of
/// subscribers never affects the journal write that triggered the event.
pub fn publish(
    live: &LiveGame,
    event_type: &str,
    state: &LiveGameState,
    action: Option<ActionSummary>,
) {
    let payload = GameEventPayload {
        event_type: event_type.to_string(),
        game_id: live.game_id,
        sequence_number: live.next_sequence(),
        occurred_at: format_system_time(SystemTime::now()),
        state_snapshot: LiveStateSnapshot::from_state(live.game_id, state),
        delta: action,
    };

    match ServerEvent::json(Some(event_type.to_string()), &payload) {
        Ok(event) => live.publish(event),
        Err(err) => warn!(
            game_id = %live.game_id,
            event_type,
            error = %err,
            "failed to serialise broadcast event"
        ),
    }
}
