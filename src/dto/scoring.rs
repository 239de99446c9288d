//! Request and response bodies for the live scoring endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{ActionType, GameActionEntity, TeamSide},
    dto::{format_system_time, game::PeriodScoreDto},
    state::{ClockPhase, LiveGameState},
};

/// Payload appending a new action to a live game's journal.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ActionInput {
    /// Team the action is recorded for.
    pub team: TeamSide,
    /// What happened.
    pub action_type: ActionType,
    /// Player credited with the action. Required for player-attributed actions.
    #[serde(default)]
    pub player_id: Option<Uuid>,
    /// Optional assist credit on a made shot.
    #[serde(default)]
    pub assisted_by_player_id: Option<Uuid>,
}

/// Legacy quick-score payload: records a made shot worth the given points.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateScoreRequest {
    /// Team credited with the points.
    pub team: TeamSide,
    /// Player credited with the shot.
    pub player_id: Uuid,
    /// Point value of the made shot.
    #[validate(range(min = 1, max = 3))]
    pub points: u8,
    /// Optional assist credit.
    #[serde(default)]
    pub assisted_by_player_id: Option<Uuid>,
}

/// Clock command issued by the scoring console.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ClockCommand {
    /// Begin the next period.
    Start,
    /// Stop the running clock inside a period.
    Pause,
    /// Restart a paused clock.
    Resume,
    /// Close the current period and bank its score split.
    EndPeriod,
}

/// Payload controlling the period clock.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ClockControlRequest {
    /// Command to apply to the clock.
    pub command: ClockCommand,
}

/// Payload requesting a team timeout.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct TimeoutRequest {
    /// Team charged with the timeout.
    pub team: TeamSide,
    /// Timeout length override in seconds.
    #[serde(default)]
    #[validate(range(min = 10, max = 300))]
    pub duration_seconds: Option<u32>,
}

/// Payload performing an atomic player substitution.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SubstitutionRequest {
    /// Team performing the substitution.
    pub team: TeamSide,
    /// Player entering the court.
    pub player_in: Uuid,
    /// Player leaving the court.
    pub player_out: Uuid,
    /// Optional note, e.g. an injury.
    #[serde(default)]
    #[validate(length(max = 255))]
    pub reason: Option<String>,
}

/// Payload correcting a previously recorded action in place.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CorrectActionRequest {
    /// Replacement action type, when the wrong one was recorded.
    #[serde(default)]
    pub action_type: Option<ActionType>,
    /// Replacement player credit.
    #[serde(default)]
    pub player_id: Option<Uuid>,
    /// Replacement assist credit.
    #[serde(default)]
    pub assisted_by_player_id: Option<Uuid>,
    /// Why the entry is being corrected. Required for the audit trail.
    #[validate(length(min = 1, max = 255))]
    pub reason: String,
}

/// Payload soft-deleting an action.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct DeleteActionRequest {
    /// Optional note for the audit trail.
    #[serde(default)]
    #[validate(length(max = 255))]
    pub reason: Option<String>,
}

/// Payload resetting the shot clock.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ResetShotClockRequest {
    /// Seconds to reset to. Defaults to the full shot clock.
    #[serde(default)]
    #[validate(range(min = 1, max = 24))]
    pub seconds: Option<u8>,
}

/// Payload replacing a full five-player lineup.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct PlayersOnCourtRequest {
    /// Team whose lineup is replaced.
    pub team: TeamSide,
    /// The exact five players taking the floor.
    #[validate(length(equal = 5))]
    pub players: Vec<Uuid>,
}

/// Payload closing out a game.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct FinishGameRequest {
    /// Finish even though the final period has not ended.
    #[serde(default)]
    pub force: bool,
}

/// Journal entry as returned by the API.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct ActionSummary {
    /// Journal entry identifier.
    pub id: Uuid,
    /// Game the entry belongs to.
    pub game_id: Uuid,
    /// Team the action was recorded for.
    pub team: TeamSide,
    /// Player credited with the action.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_id: Option<Uuid>,
    /// Assist credit on a made shot.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assisted_by_player_id: Option<Uuid>,
    /// What happened.
    pub action_type: ActionType,
    /// Point value the entry contributes.
    pub points: i32,
    /// Period the action was recorded in.
    pub period: u8,
    /// Game clock reading when the action was recorded.
    pub game_clock_seconds: u32,
    /// Other half of a substitution pair.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paired_player_id: Option<Uuid>,
    /// Note attached to a substitution.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub substitution_reason: Option<String>,
    /// When the entry was first recorded. Corrections never change it.
    pub recorded_at: String,
    /// Whether the entry has been corrected.
    pub corrected: bool,
    /// Why the entry was corrected or deleted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correction_reason: Option<String>,
    /// Whether the entry is soft-deleted.
    pub deleted: bool,
}

impl From<&GameActionEntity> for ActionSummary {
    fn from(action: &GameActionEntity) -> Self {
        Self {
            id: action.id,
            game_id: action.game_id,
            team: action.team,
            player_id: action.player_id,
            assisted_by_player_id: action.assisted_by_player_id,
            action_type: action.action_type,
            points: action.points,
            period: action.period,
            game_clock_seconds: action.game_clock_seconds,
            paired_player_id: action.paired_player_id,
            substitution_reason: action.substitution_reason.clone(),
            recorded_at: format_system_time(action.recorded_at),
            corrected: action.corrected,
            correction_reason: action.correction_reason.clone(),
            deleted: action.deleted_at.is_some(),
        }
    }
}

/// Clock phase as exposed on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PhaseDto {
    NotStarted,
    PeriodActive,
    PeriodPaused,
    TimeoutActive,
    PeriodEnded,
    Finished,
}

impl From<ClockPhase> for PhaseDto {
    fn from(phase: ClockPhase) -> Self {
        match phase {
            ClockPhase::NotStarted => PhaseDto::NotStarted,
            ClockPhase::PeriodActive => PhaseDto::PeriodActive,
            ClockPhase::PeriodPaused => PhaseDto::PeriodPaused,
            ClockPhase::TimeoutActive => PhaseDto::TimeoutActive,
            ClockPhase::PeriodEnded => PhaseDto::PeriodEnded,
            ClockPhase::Finished => PhaseDto::Finished,
        }
    }
}

/// Per-team slice of the live snapshot.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct TeamLiveSnapshot {
    /// Current total.
    pub score: i32,
    /// Timeouts left in the pool.
    pub timeouts_remaining: u8,
    /// The five players on the floor.
    pub on_court: Vec<Uuid>,
}

/// Running timeout as exposed on the wire.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct ActiveTimeoutDto {
    /// Team that called the timeout.
    pub team: TeamSide,
    /// Requested timeout length.
    pub duration_seconds: u32,
}

/// Full snapshot of a live game, attached to every broadcast event.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct LiveStateSnapshot {
    /// Game identifier.
    pub game_id: Uuid,
    /// Current clock phase.
    pub phase: PhaseDto,
    /// One-based period number, continuing into overtime.
    pub period: u8,
    /// Seconds left on the period clock.
    pub clock_remaining: u32,
    /// Whether the period clock is counting down.
    pub clock_running: bool,
    /// Seconds left on the shot clock, when one is running.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shot_clock_remaining: Option<u8>,
    /// Home team slice.
    pub home: TeamLiveSnapshot,
    /// Away team slice.
    pub away: TeamLiveSnapshot,
    /// Running totals banked at each period end.
    pub period_scores: Vec<PeriodScoreDto>,
    /// The timeout currently in progress, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_timeout: Option<ActiveTimeoutDto>,
    /// Whether the final period has ended with a winner.
    pub game_over: bool,
}

impl LiveStateSnapshot {
    /// Build the wire snapshot from the in-memory live state.
    pub fn from_state(game_id: Uuid, state: &LiveGameState) -> Self {
        Self {
            game_id,
            phase: state.phase.into(),
            period: state.period,
            clock_remaining: state.clock_remaining,
            clock_running: state.clock_running,
            shot_clock_remaining: state.shot_clock_remaining,
            home: TeamLiveSnapshot {
                score: state.home_score,
                timeouts_remaining: state.home.timeouts_remaining,
                on_court: state.home.on_court.clone(),
            },
            away: TeamLiveSnapshot {
                score: state.away_score,
                timeouts_remaining: state.away.timeouts_remaining,
                on_court: state.away.on_court.clone(),
            },
            period_scores: state
                .period_scores
                .iter()
                .copied()
                .map(PeriodScoreDto::from)
                .collect(),
            active_timeout: state.active_timeout.as_ref().map(|timeout| ActiveTimeoutDto {
                team: timeout.side,
                duration_seconds: timeout.duration_seconds,
            }),
            game_over: state.game_over,
        }
    }
}

/// Shot, rebound and foul counters shared by team and player lines.
#[derive(Debug, Serialize, ToSchema, Clone, Copy, Default)]
pub struct StatLine {
    /// Two- and three-point field goals made.
    pub field_goals_made: u32,
    /// Field goal attempts, made shots included.
    pub field_goals_attempted: u32,
    /// Three-point shots made.
    pub three_points_made: u32,
    /// Three-point attempts.
    pub three_points_attempted: u32,
    /// Free throws made.
    pub free_throws_made: u32,
    /// Free throw attempts.
    pub free_throws_attempted: u32,
    /// Rebounds.
    pub rebounds: u32,
    /// Assists.
    pub assists: u32,
    /// Steals.
    pub steals: u32,
    /// Blocks.
    pub blocks: u32,
    /// Turnovers.
    pub turnovers: u32,
    /// Personal fouls.
    pub fouls: u32,
}

/// Aggregated per-player line in the boxscore.
#[derive(Debug, Serialize, ToSchema, Clone, Default)]
pub struct PlayerStats {
    /// Player identifier.
    pub player_id: Uuid,
    /// Player display name.
    pub name: String,
    /// Jersey number.
    pub jersey_number: u8,
    /// Points scored.
    pub points: i32,
    /// Counting stats.
    #[serde(flatten)]
    pub line: StatLine,
}

/// Aggregated team totals in the boxscore.
#[derive(Debug, Serialize, ToSchema, Clone, Default)]
pub struct TeamStats {
    /// Team total.
    pub points: i32,
    /// Counting stats summed over the roster.
    #[serde(flatten)]
    pub line: StatLine,
    /// Per-player lines.
    pub players: Vec<PlayerStats>,
}

/// Boxscore derived by replaying the non-deleted journal.
#[derive(Debug, Serialize, ToSchema)]
pub struct GameStatistics {
    /// Game identifier.
    pub game_id: Uuid,
    /// Home boxscore.
    pub home: TeamStats,
    /// Away boxscore.
    pub away: TeamStats,
}
