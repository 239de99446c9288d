//! Game scheduling and summary bodies.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{GameEntity, GameStatus, GameTeamEntity, PeriodScoreEntity, PlayerEntity},
    dto::{format_system_time, validation::validate_unique_jerseys},
};

/// Payload used to schedule a brand-new game.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ScheduleGameRequest {
    /// Home team definition.
    #[validate(nested)]
    pub home: TeamInput,
    /// Away team definition.
    #[validate(nested)]
    pub away: TeamInput,
    /// Tip-off time as an RFC 3339 timestamp. Defaults to now.
    #[serde(default)]
    pub scheduled_at: Option<String>,
}

/// Incoming team definition when scheduling a game.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct TeamInput {
    /// Team display name.
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    /// True when the team is a visiting club not managed by this club.
    #[serde(default)]
    pub external: bool,
    /// Full roster, at least five players with distinct jersey numbers.
    #[validate(
        length(min = 5, message = "a roster needs at least five players"),
        custom(function = validate_unique_jerseys)
    )]
    pub players: Vec<PlayerInput>,
}

/// A single roster entry when scheduling a game.
///
/// Serialize is required: the roster length validation on [`TeamInput`]
/// attaches the offending value to its [`validator::ValidationError`].
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct PlayerInput {
    /// Player display name.
    pub name: String,
    /// Jersey number, unique within the team.
    pub jersey_number: u8,
}

impl TeamInput {
    /// Materialise the team definition, assigning fresh player identifiers.
    pub fn into_entity(self) -> GameTeamEntity {
        GameTeamEntity {
            name: self.name,
            external: self.external,
            players: self
                .players
                .into_iter()
                .map(|player| PlayerEntity {
                    id: Uuid::new_v4(),
                    name: player.name,
                    jersey_number: player.jersey_number,
                })
                .collect(),
        }
    }
}

/// Roster entry as returned by the API.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct PlayerSummary {
    /// Server-assigned player identifier.
    pub id: Uuid,
    /// Player display name.
    pub name: String,
    /// Jersey number, unique within the team.
    pub jersey_number: u8,
}

/// Team description as returned by the API.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct TeamSummary {
    /// Team display name.
    pub name: String,
    /// True when the team is a visiting club not managed by this club.
    pub external: bool,
    /// Full roster.
    pub players: Vec<PlayerSummary>,
}

impl From<&GameTeamEntity> for TeamSummary {
    fn from(team: &GameTeamEntity) -> Self {
        Self {
            name: team.name.clone(),
            external: team.external,
            players: team
                .players
                .iter()
                .map(|player| PlayerSummary {
                    id: player.id,
                    name: player.name.clone(),
                    jersey_number: player.jersey_number,
                })
                .collect(),
        }
    }
}

/// Score split banked at a period end: the running total as it stood when
/// that period closed.
#[derive(Debug, Serialize, ToSchema, Clone, Copy)]
pub struct PeriodScoreDto {
    /// One-based period number.
    pub period: u8,
    /// Home score when the period ended.
    pub home: i32,
    /// Away score when the period ended.
    pub away: i32,
}

impl From<PeriodScoreEntity> for PeriodScoreDto {
    fn from(split: PeriodScoreEntity) -> Self {
        Self {
            period: split.period,
            home: split.home,
            away: split.away,
        }
    }
}

/// Stored game as returned by the API.
#[derive(Debug, Serialize, ToSchema)]
pub struct GameSummary {
    /// Game identifier.
    pub id: Uuid,
    /// Home team.
    pub home: TeamSummary,
    /// Away team.
    pub away: TeamSummary,
    /// Lifecycle status.
    pub status: GameStatus,
    /// Tip-off time as an RFC 3339 timestamp.
    pub scheduled_at: String,
    /// When live scoring actually opened.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    /// When the game was closed out.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<String>,
    /// Stored home total.
    pub home_score: i32,
    /// Stored away total.
    pub away_score: i32,
    /// Running totals banked at each period end.
    pub period_scores: Vec<PeriodScoreDto>,
}

impl From<&GameEntity> for GameSummary {
    fn from(game: &GameEntity) -> Self {
        Self {
            id: game.id,
            home: TeamSummary::from(&game.home),
            away: TeamSummary::from(&game.away),
            status: game.status,
            scheduled_at: format_system_time(game.scheduled_at),
            started_at: game.started_at.map(format_system_time),
            finished_at: game.finished_at.map(format_system_time),
            home_score: game.home_score,
            away_score: game.away_score,
            period_scores: game
                .period_scores
                .iter()
                .copied()
                .map(PeriodScoreDto::from)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster(count: u8) -> Vec<PlayerInput> {
        (0..count)
            .map(|index| PlayerInput {
                name: format!("Player {index}"),
                jersey_number: index + 4,
            })
            .collect()
    }

    #[test]
    fn short_rosters_fail_the_derive_validation() {
        let team = TeamInput {
            name: "Home".into(),
            external: false,
            players: roster(3),
        };

        let report = team.validate().unwrap_err();
        assert!(report.field_errors().contains_key("players"));
    }

    #[test]
    fn full_rosters_pass_the_derive_validation() {
        let team = TeamInput {
            name: "Home".into(),
            external: false,
            players: roster(5),
        };

        assert!(team.validate().is_ok());
    }
}
