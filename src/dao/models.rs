//! Entities persisted by the storage layer and shared across layers.

use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle status of a game. Monotonic except for explicit cancellation;
/// `Finished` is terminal for mutation purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    /// Created but not yet started.
    Scheduled,
    /// Live; control operations are accepted.
    InProgress,
    /// Over; only corrections and deletions of recorded actions remain legal.
    Finished,
    /// Called off before or during play.
    Cancelled,
}

/// Which of the two participating teams an action or operation refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TeamSide {
    /// The home team.
    Home,
    /// The away team.
    Away,
}

impl TeamSide {
    /// The opposing side.
    pub fn opponent(self) -> Self {
        match self {
            TeamSide::Home => TeamSide::Away,
            TeamSide::Away => TeamSide::Home,
        }
    }
}

/// Closed set of atomic game events a scorer can record.
///
/// Point values are derived from the variant, never inferred from free-form
/// input, so scoring is unambiguous by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum ActionType {
    /// Made two-point field goal.
    #[serde(rename = "made_2pt")]
    Made2Pt,
    /// Missed two-point field goal.
    #[serde(rename = "missed_2pt")]
    Missed2Pt,
    /// Made three-point field goal.
    #[serde(rename = "made_3pt")]
    Made3Pt,
    /// Missed three-point field goal.
    #[serde(rename = "missed_3pt")]
    Missed3Pt,
    /// Made free throw.
    #[serde(rename = "made_ft")]
    MadeFt,
    /// Missed free throw.
    #[serde(rename = "missed_ft")]
    MissedFt,
    /// Rebound.
    #[serde(rename = "rebound")]
    Rebound,
    /// Assist.
    #[serde(rename = "assist")]
    Assist,
    /// Steal.
    #[serde(rename = "steal")]
    Steal,
    /// Block.
    #[serde(rename = "block")]
    Block,
    /// Turnover.
    #[serde(rename = "turnover")]
    Turnover,
    /// Personal foul.
    #[serde(rename = "foul")]
    Foul,
    /// Player entering the court as half of a substitution pair.
    #[serde(rename = "substitution_in")]
    SubstitutionIn,
    /// Player leaving the court as half of a substitution pair.
    #[serde(rename = "substitution_out")]
    SubstitutionOut,
}

impl ActionType {
    /// Table-driven point value of the action.
    pub fn points(self) -> i32 {
        match self {
            ActionType::Made2Pt => 2,
            ActionType::Made3Pt => 3,
            ActionType::MadeFt => 1,
            _ => 0,
        }
    }

    /// Whether the action is half of a substitution pair.
    pub fn is_substitution(self) -> bool {
        matches!(self, ActionType::SubstitutionIn | ActionType::SubstitutionOut)
    }

    /// Whether recording the action hands out a fresh shot clock: made field
    /// goals, rebounds and fouls all restart the possession.
    pub fn resets_shot_clock(self) -> bool {
        matches!(
            self,
            ActionType::Made2Pt | ActionType::Made3Pt | ActionType::Rebound | ActionType::Foul
        )
    }
}

/// Player entry on a team roster.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct PlayerEntity {
    /// Stable identifier for the player.
    pub id: Uuid,
    /// Display name of the player.
    pub name: String,
    /// Jersey number, unique within the team.
    pub jersey_number: u8,
}

/// One of the two participating teams of a game.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct GameTeamEntity {
    /// Display name of the team.
    pub name: String,
    /// True when the team is not modeled internally (e.g. a visiting club).
    pub external: bool,
    /// Roster the on-court lineup is drawn from.
    pub players: Vec<PlayerEntity>,
}

/// Score split recorded when a period ends.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct PeriodScoreEntity {
    /// Period number the split belongs to.
    pub period: u8,
    /// Home score accumulated up to the end of that period.
    pub home: i32,
    /// Away score accumulated up to the end of that period.
    pub away: i32,
}

/// Aggregate game entity persisted by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameEntity {
    /// Primary key of the game.
    pub id: Uuid,
    /// Home team definition.
    pub home: GameTeamEntity,
    /// Away team definition.
    pub away: GameTeamEntity,
    /// When the game is scheduled to tip off.
    pub scheduled_at: SystemTime,
    /// Lifecycle status.
    pub status: GameStatus,
    /// Wall-clock time the game actually started, once live.
    pub started_at: Option<SystemTime>,
    /// Wall-clock time the game finished.
    pub finished_at: Option<SystemTime>,
    /// Home score derived from the action journal.
    pub home_score: i32,
    /// Away score derived from the action journal.
    pub away_score: i32,
    /// Per-period score splits recorded at each period end.
    pub period_scores: Vec<PeriodScoreEntity>,
    /// Creation timestamp for auditing/debugging.
    pub created_at: SystemTime,
    /// Last time the game entity was updated.
    pub updated_at: SystemTime,
}

impl GameEntity {
    /// Borrow the team definition for a side.
    pub fn team(&self, side: TeamSide) -> &GameTeamEntity {
        match side {
            TeamSide::Home => &self.home,
            TeamSide::Away => &self.away,
        }
    }
}

/// Prior values of an action preserved when a correction is applied.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct ActionRevisionEntity {
    /// Action type before the correction.
    pub action_type: ActionType,
    /// Point value before the correction.
    pub points: i32,
    /// Player reference before the correction.
    pub player_id: Option<Uuid>,
    /// Assisting player reference before the correction.
    pub assisted_by_player_id: Option<Uuid>,
}

/// One row of the action journal.
///
/// Rows are never physically removed: corrections retain prior values and
/// deletions only set `deleted_at`, preserving the audit trail.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameActionEntity {
    /// Immutable identifier of the journal row.
    pub id: Uuid,
    /// Game the action belongs to.
    pub game_id: Uuid,
    /// Side the action is attributed to.
    pub team: TeamSide,
    /// Player the action is attributed to, when applicable.
    pub player_id: Option<Uuid>,
    /// Assisting player, for made shots credited with an assist.
    pub assisted_by_player_id: Option<Uuid>,
    /// What happened.
    pub action_type: ActionType,
    /// Derived point value (0 unless a made-shot variant).
    pub points: i32,
    /// Period the action was recorded in.
    pub period: u8,
    /// Seconds remaining on the period clock when the action was recorded.
    pub game_clock_seconds: u32,
    /// Other half of a substitution pair, for substitution rows.
    pub paired_player_id: Option<Uuid>,
    /// Optional reason supplied with a substitution.
    pub substitution_reason: Option<String>,
    /// Wall-clock time the scorer recorded the action.
    pub recorded_at: SystemTime,
    /// True once the action has been corrected at least once.
    pub corrected: bool,
    /// Reason supplied with the latest correction.
    pub correction_reason: Option<String>,
    /// Values the action held before the latest correction.
    pub prior: Option<ActionRevisionEntity>,
    /// Soft-delete marker; deleted rows are excluded from recomputation.
    pub deleted_at: Option<SystemTime>,
}

impl GameActionEntity {
    /// Whether the row still participates in score and stat recomputation.
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_table_matches_action_variants() {
        assert_eq!(ActionType::Made2Pt.points(), 2);
        assert_eq!(ActionType::Made3Pt.points(), 3);
        assert_eq!(ActionType::MadeFt.points(), 1);
        assert_eq!(ActionType::Missed3Pt.points(), 0);
        assert_eq!(ActionType::Rebound.points(), 0);
        assert_eq!(ActionType::Foul.points(), 0);
    }

    #[test]
    fn action_type_serializes_with_wire_names() {
        let json = serde_json::to_string(&ActionType::Made3Pt).unwrap();
        assert_eq!(json, r#""made_3pt""#);
        let back: ActionType = serde_json::from_str(r#""substitution_in""#).unwrap();
        assert_eq!(back, ActionType::SubstitutionIn);
    }
}
