//! Server-authoritative clock tick.
//!
//! One task per live game decrements the period and shot clocks once per
//! second and broadcasts the result, so every client renders the same time.
//! The task holds only a weak reference: when the game is dropped from the
//! registry the ticker stops on its own.

use std::{
    sync::{Arc, Weak},
    time::Duration,
};

use tokio::time::{MissedTickBehavior, interval};
use tracing::debug;

use crate::{
    config::GameRules,
    services::events,
    state::{ClockEvent, ClockPhase, LiveGame, clock},
};

/// Spawn the tick task for a freshly started game.
pub fn spawn(live: &Arc<LiveGame>, rules: GameRules) {
    let weak: Weak<LiveGame> = Arc::downgrade(live);

    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(1));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            let Some(live) = weak.upgrade() else {
                break;
            };

            let mut state = live.state().write().await;
            match state.phase {
                ClockPhase::Finished => {
                    debug!(game_id = %live.game_id, "clock ticker stopping");
                    break;
                }
                ClockPhase::TimeoutActive => {
                    let expired = state.active_timeout.as_ref().is_some_and(|timeout| {
                        timeout
                            .started_at
                            .elapsed()
                            .map(|elapsed| elapsed.as_secs() >= u64::from(timeout.duration_seconds))
                            .unwrap_or(false)
                    });
                    if expired && clock::apply(&mut state, ClockEvent::EndTimeout, &rules).is_ok() {
                        events::publish(&live, events::TIMEOUT_ENDED, &state, None);
                    }
                }
                ClockPhase::PeriodActive if state.clock_running => {
                    state.clock_remaining = state.clock_remaining.saturating_sub(1);
                    if let Some(shot) = state.shot_clock_remaining {
                        state.shot_clock_remaining = Some(shot.saturating_sub(1));
                    }
                    if state.clock_remaining == 0 {
                        // Buzzer: stop the clock and wait for the scorer to
                        // close the period.
                        state.clock_running = false;
                    }
                    events::publish(&live, events::CLOCK_UPDATED, &state, None);
                }
                _ => {}
            }
        }
    });
}
