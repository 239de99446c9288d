//! Per-game live state and the serialized mutation entry that owns it.

use std::{sync::Arc, time::SystemTime};

use tokio::sync::{Mutex, MutexGuard, RwLock, broadcast};
use uuid::Uuid;

use crate::{
    config::{GameRules, MutationPolicy},
    dao::models::{PeriodScoreEntity, TeamSide},
    dto::sse::ServerEvent,
    error::ServiceError,
    state::{broadcast::GameHub, clock::ClockPhase},
};

/// Timeout currently in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveTimeout {
    /// Team that took the timeout.
    pub side: TeamSide,
    /// Wall-clock time the timeout started.
    pub started_at: SystemTime,
    /// Timeout length in seconds.
    pub duration_seconds: u32,
}

/// Mutable per-team live data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamLive {
    /// Timeouts the team may still take.
    pub timeouts_remaining: u8,
    /// Player ids currently on the court. Exactly 5 while a period is active.
    pub on_court: Vec<Uuid>,
}

/// Authoritative state of one in-progress game.
///
/// Owned exclusively by the game's [`LiveGame`] entry and mutated only while
/// the mutation gate is held; scores are always recomputed from the action
/// journal, never incremented in place by callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveGameState {
    /// Current phase of the clock state machine.
    pub phase: ClockPhase,
    /// Current period number, 1-based. Values past regulation are overtime.
    pub period: u8,
    /// Seconds remaining on the period clock.
    pub clock_remaining: u32,
    /// Whether the period clock is counting down.
    pub clock_running: bool,
    /// Seconds remaining on the shot clock, when tracked.
    pub shot_clock_remaining: Option<u8>,
    /// Home score derived from the journal.
    pub home_score: i32,
    /// Away score derived from the journal.
    pub away_score: i32,
    /// Home team live data.
    pub home: TeamLive,
    /// Away team live data.
    pub away: TeamLive,
    /// Cumulative score splits recorded at each period end.
    pub period_scores: Vec<PeriodScoreEntity>,
    /// Timeout currently in progress, if any.
    pub active_timeout: Option<ActiveTimeout>,
    /// True once the final period has been closed with a winner (or the game
    /// was finished by override); no further period may start.
    pub game_over: bool,
}

impl LiveGameState {
    /// Seed a fresh live state from the rule set: period 1, full clock, full
    /// timeout pools, zero score, empty lineups.
    pub fn new(rules: &GameRules) -> Self {
        let team = TeamLive {
            timeouts_remaining: rules.timeouts_per_team,
            on_court: Vec::new(),
        };
        Self {
            phase: ClockPhase::NotStarted,
            period: 1,
            clock_remaining: rules.period_seconds,
            clock_running: false,
            shot_clock_remaining: Some(rules.shot_clock_seconds),
            home_score: 0,
            away_score: 0,
            home: team.clone(),
            away: team,
            period_scores: Vec::new(),
            active_timeout: None,
            game_over: false,
        }
    }

    /// Borrow one team's live data.
    pub fn team(&self, side: TeamSide) -> &TeamLive {
        match side {
            TeamSide::Home => &self.home,
            TeamSide::Away => &self.away,
        }
    }

    /// Mutably borrow one team's live data.
    pub fn team_mut(&mut self, side: TeamSide) -> &mut TeamLive {
        match side {
            TeamSide::Home => &mut self.home,
            TeamSide::Away => &mut self.away,
        }
    }

    /// Score of one team.
    pub fn score(&self, side: TeamSide) -> i32 {
        match side {
            TeamSide::Home => self.home_score,
            TeamSide::Away => self.away_score,
        }
    }

    /// Overwrite both derived scores after a journal recomputation.
    pub fn set_scores(&mut self, home: i32, away: i32) {
        self.home_score = home;
        self.away_score = away;
    }

    /// Append the cumulative score split for the current period.
    pub fn record_period_score(&mut self) {
        self.period_scores.push(PeriodScoreEntity {
            period: self.period,
            home: self.home_score,
            away: self.away_score,
        });
    }

    /// Whether a period is currently in progress (active or paused).
    pub fn period_in_progress(&self) -> bool {
        matches!(
            self.phase,
            ClockPhase::PeriodActive | ClockPhase::PeriodPaused | ClockPhase::TimeoutActive
        )
    }
}

/// Registry entry for one live game: the state, its mutation gate, and the
/// broadcast hub assigning per-game sequence numbers.
pub struct LiveGame {
    /// Game this entry belongs to.
    pub game_id: Uuid,
    state: RwLock<LiveGameState>,
    gate: Mutex<()>,
    hub: GameHub,
}

impl LiveGame {
    /// Broadcast channel capacity per game; slow subscribers lag and resync.
    const EVENT_CAPACITY: usize = 64;

    /// Create the live entry for a freshly started game.
    pub fn new(game_id: Uuid, rules: &GameRules) -> Arc<Self> {
        Arc::new(Self {
            game_id,
            state: RwLock::new(LiveGameState::new(rules)),
            gate: Mutex::new(()),
            hub: GameHub::new(Self::EVENT_CAPACITY),
        })
    }

    /// Acquire the mutation gate according to the configured policy.
    ///
    /// Holding the returned guard makes the caller the game's single writer.
    pub async fn acquire(&self, policy: MutationPolicy) -> Result<MutexGuard<'_, ()>, ServiceError> {
        match policy {
            MutationPolicy::Block => Ok(self.gate.lock().await),
            MutationPolicy::Reject => self
                .gate
                .try_lock()
                .map_err(|_| ServiceError::ConcurrentModification(self.game_id)),
        }
    }

    /// Shared access to the live state.
    pub fn state(&self) -> &RwLock<LiveGameState> {
        &self.state
    }

    /// Clone the current live state.
    pub async fn snapshot(&self) -> LiveGameState {
        self.state.read().await.clone()
    }

    /// Sequence number of the most recently published event.
    pub fn current_sequence(&self) -> u64 {
        self.hub.current_sequence()
    }

    /// Reserve the next sequence number for an event about to be published.
    pub fn next_sequence(&self) -> u64 {
        self.hub.next_sequence()
    }

    /// Register a new subscriber for this game's event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.hub.subscribe()
    }

    /// Publish an event to all current subscribers.
    pub fn publish(&self, event: ServerEvent) {
        self.hub.publish(event);
    }
}
