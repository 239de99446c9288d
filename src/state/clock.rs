//! Clock/period/timeout state machine owning transition legality.

use std::time::SystemTime;

use thiserror::Error;

use crate::{
    config::GameRules,
    dao::models::TeamSide,
    state::live::{ActiveTimeout, LiveGameState},
};

/// Phase of the live game clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockPhase {
    /// Live state exists but the first period has not started.
    NotStarted,
    /// A period is in progress and the clock is running.
    PeriodActive,
    /// A period is in progress and the clock is stopped.
    PeriodPaused,
    /// A timeout is in progress; the main clock is stopped.
    TimeoutActive,
    /// The period ended; the next one has not started yet.
    PeriodEnded,
    /// The game is over; the live state is read-only.
    Finished,
}

/// Events that can be applied to the clock state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClockEvent {
    /// Begin the first or the next period.
    StartPeriod,
    /// Stop the clock. Idempotent when already paused.
    Pause,
    /// Restart a stopped clock.
    Resume,
    /// Force the clock to zero and close the current period.
    EndPeriod,
    /// Begin a timeout for one team.
    StartTimeout {
        /// Team taking the timeout.
        side: TeamSide,
        /// Timeout length in seconds.
        duration_seconds: u32,
    },
    /// Clear the active timeout. Does not restart the clock.
    EndTimeout,
    /// Close the game. `force` overrides the period-complete precondition.
    Finish {
        /// Allow finishing before the final period has been played out.
        force: bool,
    },
}

/// Errors raised when an event cannot be applied to the current state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClockError {
    /// The event is not legal from the current phase. State is untouched.
    #[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
    InvalidTransition {
        /// Phase the state machine was in when the event was received.
        from: ClockPhase,
        /// Event that cannot be applied from this phase.
        event: ClockEvent,
    },
    /// A timeout was requested with an exhausted pool.
    #[error("no timeouts remaining for {side:?}")]
    TimeoutsExhausted {
        /// Team whose pool is empty.
        side: TeamSide,
    },
}

/// Apply a clock event to the live state, mutating it only when the
/// transition is legal from the current phase.
pub fn apply(
    state: &mut LiveGameState,
    event: ClockEvent,
    rules: &GameRules,
) -> Result<ClockPhase, ClockError> {
    let next = compute_transition(state, &event)?;

    match event {
        ClockEvent::StartPeriod | ClockEvent::Resume => {
            state.clock_running = true;
        }
        ClockEvent::Pause => {
            state.clock_running = false;
        }
        ClockEvent::EndPeriod => {
            close_period(state, rules);
        }
        ClockEvent::StartTimeout {
            side,
            duration_seconds,
        } => {
            let pool = &mut state.team_mut(side).timeouts_remaining;
            *pool -= 1;
            state.clock_running = false;
            state.active_timeout = Some(ActiveTimeout {
                side,
                started_at: SystemTime::now(),
                duration_seconds,
            });
        }
        ClockEvent::EndTimeout => {
            state.active_timeout = None;
        }
        ClockEvent::Finish { .. } => {
            state.clock_running = false;
            state.game_over = true;
        }
    }

    state.phase = next;
    Ok(next)
}

/// Validate that `event` can be applied from the current state without
/// mutating anything.
fn compute_transition(state: &LiveGameState, event: &ClockEvent) -> Result<ClockPhase, ClockError> {
    let next = match (state.phase, event) {
        (ClockPhase::NotStarted, ClockEvent::StartPeriod) => ClockPhase::PeriodActive,
        (ClockPhase::PeriodEnded, ClockEvent::StartPeriod) if !state.game_over => {
            ClockPhase::PeriodActive
        }
        (ClockPhase::PeriodActive | ClockPhase::PeriodPaused, ClockEvent::Pause) => {
            ClockPhase::PeriodPaused
        }
        (ClockPhase::PeriodPaused, ClockEvent::Resume) => ClockPhase::PeriodActive,
        (ClockPhase::PeriodActive | ClockPhase::PeriodPaused, ClockEvent::EndPeriod) => {
            ClockPhase::PeriodEnded
        }
        (
            ClockPhase::PeriodActive | ClockPhase::PeriodPaused,
            ClockEvent::StartTimeout { side, .. },
        ) => {
            if state.team(*side).timeouts_remaining == 0 {
                return Err(ClockError::TimeoutsExhausted { side: *side });
            }
            ClockPhase::TimeoutActive
        }
        (ClockPhase::TimeoutActive, ClockEvent::EndTimeout) => ClockPhase::PeriodPaused,
        (ClockPhase::PeriodEnded, ClockEvent::Finish { force }) if state.game_over || *force => {
            ClockPhase::Finished
        }
        (
            ClockPhase::NotStarted | ClockPhase::PeriodActive | ClockPhase::PeriodPaused,
            ClockEvent::Finish { force: true },
        ) => ClockPhase::Finished,
        (from, event) => {
            return Err(ClockError::InvalidTransition {
                from,
                event: event.clone(),
            });
        }
    };

    Ok(next)
}

/// Record the period score split and either advance to the next period or
/// mark the game as over when regulation is complete with a winner.
fn close_period(state: &mut LiveGameState, rules: &GameRules) {
    state.record_period_score();
    state.clock_remaining = 0;
    state.clock_running = false;

    let regulation_done = state.period >= rules.regulation_periods;
    let tied = state.home_score == state.away_score;

    if regulation_done && !tied {
        state.game_over = true;
    } else {
        state.period += 1;
        state.clock_remaining = rules.period_clock(state.period);
        state.shot_clock_remaining = Some(rules.shot_clock_seconds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn live_state() -> (LiveGameState, GameRules) {
        let rules = GameRules::default();
        (LiveGameState::new(&rules), rules)
    }

    fn apply_ok(state: &mut LiveGameState, event: ClockEvent, rules: &GameRules) -> ClockPhase {
        apply(state, event, rules).unwrap()
    }

    #[test]
    fn initial_state_is_not_started() {
        let (state, _) = live_state();
        assert_eq!(state.phase, ClockPhase::NotStarted);
        assert_eq!(state.period, 1);
        assert_eq!(state.clock_remaining, 600);
    }

    #[test]
    fn full_happy_path_through_game() {
        let (mut state, rules) = live_state();

        for _ in 0..rules.regulation_periods {
            assert_eq!(
                apply_ok(&mut state, ClockEvent::StartPeriod, &rules),
                ClockPhase::PeriodActive
            );
            // Home pulls ahead so regulation ends with a winner.
            state.home_score += 2;
            assert_eq!(
                apply_ok(&mut state, ClockEvent::EndPeriod, &rules),
                ClockPhase::PeriodEnded
            );
        }

        assert!(state.game_over);
        assert_eq!(state.period, rules.regulation_periods);
        assert_eq!(
            apply_ok(&mut state, ClockEvent::Finish { force: false }, &rules),
            ClockPhase::Finished
        );
    }

    #[test]
    fn tied_regulation_advances_to_overtime() {
        let (mut state, rules) = live_state();
        state.period = rules.regulation_periods;
        state.phase = ClockPhase::PeriodActive;

        apply_ok(&mut state, ClockEvent::EndPeriod, &rules);

        assert!(!state.game_over);
        assert_eq!(state.period, rules.regulation_periods + 1);
        assert_eq!(state.clock_remaining, rules.overtime_seconds);
    }

    #[test]
    fn pause_is_idempotent() {
        let (mut state, rules) = live_state();
        apply_ok(&mut state, ClockEvent::StartPeriod, &rules);
        apply_ok(&mut state, ClockEvent::Pause, &rules);
        let snapshot = state.clone();

        apply_ok(&mut state, ClockEvent::Pause, &rules);

        assert_eq!(state, snapshot);
    }

    #[test]
    fn timeout_rejected_when_pool_empty() {
        let (mut state, rules) = live_state();
        apply_ok(&mut state, ClockEvent::StartPeriod, &rules);
        state.team_mut(TeamSide::Home).timeouts_remaining = 0;

        let err = apply(
            &mut state,
            ClockEvent::StartTimeout {
                side: TeamSide::Home,
                duration_seconds: 60,
            },
            &rules,
        )
        .unwrap_err();

        assert_eq!(err, ClockError::TimeoutsExhausted {
            side: TeamSide::Home
        });
        assert_eq!(state.phase, ClockPhase::PeriodActive);
        assert_eq!(state.team(TeamSide::Home).timeouts_remaining, 0);
    }

    #[test]
    fn timeout_decrements_pool_and_stops_clock() {
        let (mut state, rules) = live_state();
        apply_ok(&mut state, ClockEvent::StartPeriod, &rules);

        apply_ok(
            &mut state,
            ClockEvent::StartTimeout {
                side: TeamSide::Away,
                duration_seconds: 30,
            },
            &rules,
        );

        assert_eq!(state.phase, ClockPhase::TimeoutActive);
        assert!(!state.clock_running);
        assert_eq!(
            state.team(TeamSide::Away).timeouts_remaining,
            rules.timeouts_per_team - 1
        );
        assert_eq!(state.active_timeout.as_ref().unwrap().side, TeamSide::Away);
    }

    #[test]
    fn end_timeout_requires_active_timeout_and_does_not_resume() {
        let (mut state, rules) = live_state();
        apply_ok(&mut state, ClockEvent::StartPeriod, &rules);

        let err = apply(&mut state, ClockEvent::EndTimeout, &rules).unwrap_err();
        assert!(matches!(err, ClockError::InvalidTransition { .. }));

        apply_ok(
            &mut state,
            ClockEvent::StartTimeout {
                side: TeamSide::Home,
                duration_seconds: 60,
            },
            &rules,
        );
        apply_ok(&mut state, ClockEvent::EndTimeout, &rules);

        assert_eq!(state.phase, ClockPhase::PeriodPaused);
        assert!(!state.clock_running);
        assert!(state.active_timeout.is_none());
    }

    #[test]
    fn finish_rejected_mid_timeout_even_with_force() {
        let (mut state, rules) = live_state();
        apply_ok(&mut state, ClockEvent::StartPeriod, &rules);
        apply_ok(
            &mut state,
            ClockEvent::StartTimeout {
                side: TeamSide::Home,
                duration_seconds: 60,
            },
            &rules,
        );

        let err = apply(&mut state, ClockEvent::Finish { force: true }, &rules).unwrap_err();
        assert!(matches!(err, ClockError::InvalidTransition { .. }));
        assert_eq!(state.phase, ClockPhase::TimeoutActive);
    }

    #[test]
    fn force_finish_allowed_mid_period() {
        let (mut state, rules) = live_state();
        apply_ok(&mut state, ClockEvent::StartPeriod, &rules);

        let err = apply(&mut state, ClockEvent::Finish { force: false }, &rules).unwrap_err();
        assert!(matches!(err, ClockError::InvalidTransition { .. }));

        assert_eq!(
            apply_ok(&mut state, ClockEvent::Finish { force: true }, &rules),
            ClockPhase::Finished
        );
    }

    #[test]
    fn start_period_rejected_once_game_over() {
        let (mut state, rules) = live_state();
        state.period = rules.regulation_periods;
        state.phase = ClockPhase::PeriodActive;
        state.home_score = 50;
        state.away_score = 48;
        apply_ok(&mut state, ClockEvent::EndPeriod, &rules);

        let err = apply(&mut state, ClockEvent::StartPeriod, &rules).unwrap_err();
        assert!(matches!(err, ClockError::InvalidTransition { .. }));
    }

    #[test]
    fn end_period_records_cumulative_split() {
        let (mut state, rules) = live_state();
        apply_ok(&mut state, ClockEvent::StartPeriod, &rules);
        state.home_score = 20;
        state.away_score = 18;

        apply_ok(&mut state, ClockEvent::EndPeriod, &rules);

        assert_eq!(state.period_scores.len(), 1);
        let split = state.period_scores[0];
        assert_eq!((split.period, split.home, split.away), (1, 20, 18));
    }
}
