//! Roster guard enforcing on-court constraints before roster-affecting
//! mutations are admitted.

use std::collections::{HashMap, HashSet};

use thiserror::Error;
use uuid::Uuid;

use crate::{
    dao::models::{GameTeamEntity, TeamSide},
    state::live::LiveGameState,
};

/// Number of players each team fields while a period is active.
pub const ON_COURT_SIZE: usize = 5;

/// Violations of the on-court constraints. State is never touched when one is raised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    /// The referenced player is not currently on the court.
    #[error("player {player} is not on the court")]
    NotOnCourt {
        /// Offending player id.
        player: Uuid,
    },
    /// The incoming player is already on the court.
    #[error("player {player} is already on the court")]
    AlreadyOnCourt {
        /// Offending player id.
        player: Uuid,
    },
    /// The referenced player does not belong to the team roster.
    #[error("player {player} is not on the team roster")]
    NotOnRoster {
        /// Offending player id.
        player: Uuid,
    },
    /// A lineup does not contain exactly five players.
    #[error("a lineup must contain exactly {ON_COURT_SIZE} players (got {got})")]
    WrongLineupSize {
        /// Submitted lineup size.
        got: usize,
    },
    /// A lineup lists the same player more than once.
    #[error("lineup contains duplicate player ids")]
    DuplicatePlayers,
    /// The player has reached the personal foul limit and may not enter.
    #[error("player {player} has fouled out ({fouls} fouls)")]
    FouledOut {
        /// Offending player id.
        player: Uuid,
        /// Personal fouls on record.
        fouls: u32,
    },
    /// A roster assigns the same jersey number twice.
    #[error("jersey number {number} is assigned twice")]
    DuplicateJersey {
        /// Duplicated jersey number.
        number: u8,
    },
    /// A team has not fielded a full lineup yet.
    #[error("lineup for {side:?} is incomplete")]
    LineupIncomplete {
        /// Team whose lineup is missing players.
        side: TeamSide,
    },
}

/// Validate a team definition at scheduling time: distinct player ids and
/// unique jersey numbers.
pub fn validate_team_roster(team: &GameTeamEntity) -> Result<(), RosterError> {
    let mut ids = HashSet::new();
    let mut jerseys = HashSet::new();
    for player in &team.players {
        if !ids.insert(player.id) {
            return Err(RosterError::DuplicatePlayers);
        }
        if !jerseys.insert(player.jersey_number) {
            return Err(RosterError::DuplicateJersey {
                number: player.jersey_number,
            });
        }
    }
    Ok(())
}

/// Validate a full lineup submission: exactly five distinct roster members,
/// none of them fouled out.
pub fn validate_lineup(
    team: &GameTeamEntity,
    lineup: &[Uuid],
    foul_counts: &HashMap<Uuid, u32>,
    foul_limit: u8,
) -> Result<(), RosterError> {
    if lineup.len() != ON_COURT_SIZE {
        return Err(RosterError::WrongLineupSize { got: lineup.len() });
    }

    let distinct: HashSet<_> = lineup.iter().collect();
    if distinct.len() != lineup.len() {
        return Err(RosterError::DuplicatePlayers);
    }

    for &player in lineup {
        require_on_roster(team, player)?;
        require_not_fouled_out(player, foul_counts, foul_limit)?;
    }

    Ok(())
}

/// Validate an atomic substitution: the outgoing player must be on the court,
/// the incoming one must not be, and must be an eligible roster member.
pub fn validate_substitution(
    team: &GameTeamEntity,
    on_court: &[Uuid],
    player_in: Uuid,
    player_out: Uuid,
    foul_counts: &HashMap<Uuid, u32>,
    foul_limit: u8,
) -> Result<(), RosterError> {
    if !on_court.contains(&player_out) {
        return Err(RosterError::NotOnCourt { player: player_out });
    }
    if on_court.contains(&player_in) {
        return Err(RosterError::AlreadyOnCourt { player: player_in });
    }
    require_on_roster(team, player_in)?;
    require_not_fouled_out(player_in, foul_counts, foul_limit)?;
    Ok(())
}

/// Require that a player referenced by an action is currently on the court.
pub fn require_on_court(on_court: &[Uuid], player: Uuid) -> Result<(), RosterError> {
    if on_court.contains(&player) {
        Ok(())
    } else {
        Err(RosterError::NotOnCourt { player })
    }
}

/// Require that both lineups are complete before the clock may run.
pub fn lineups_ready(state: &LiveGameState) -> Result<(), RosterError> {
    for side in [TeamSide::Home, TeamSide::Away] {
        if state.team(side).on_court.len() != ON_COURT_SIZE {
            return Err(RosterError::LineupIncomplete { side });
        }
    }
    Ok(())
}

fn require_on_roster(team: &GameTeamEntity, player: Uuid) -> Result<(), RosterError> {
    if team.players.iter().any(|entry| entry.id == player) {
        Ok(())
    } else {
        Err(RosterError::NotOnRoster { player })
    }
}

fn require_not_fouled_out(
    player: Uuid,
    foul_counts: &HashMap<Uuid, u32>,
    foul_limit: u8,
) -> Result<(), RosterError> {
    let fouls = foul_counts.get(&player).copied().unwrap_or(0);
    if fouls >= u32::from(foul_limit) {
        Err(RosterError::FouledOut { player, fouls })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::PlayerEntity;

    fn team_of(count: usize) -> (GameTeamEntity, Vec<Uuid>) {
        let players: Vec<PlayerEntity> = (0..count)
            .map(|index| PlayerEntity {
                id: Uuid::new_v4(),
                name: format!("Player {index}"),
                jersey_number: index as u8 + 4,
            })
            .collect();
        let ids = players.iter().map(|player| player.id).collect();
        (
            GameTeamEntity {
                name: "Test BC".into(),
                external: false,
                players,
            },
            ids,
        )
    }

    #[test]
    fn roster_rejects_duplicate_jerseys() {
        let (mut team, _) = team_of(2);
        team.players[1].jersey_number = team.players[0].jersey_number;
        assert!(matches!(
            validate_team_roster(&team),
            Err(RosterError::DuplicateJersey { .. })
        ));
    }

    #[test]
    fn lineup_must_have_exactly_five_distinct_roster_members() {
        let (team, ids) = team_of(7);
        let fouls = HashMap::new();

        assert!(validate_lineup(&team, &ids[..5], &fouls, 5).is_ok());
        assert!(matches!(
            validate_lineup(&team, &ids[..4], &fouls, 5),
            Err(RosterError::WrongLineupSize { got: 4 })
        ));

        let mut duplicated = ids[..5].to_vec();
        duplicated[4] = duplicated[0];
        assert_eq!(
            validate_lineup(&team, &duplicated, &fouls, 5),
            Err(RosterError::DuplicatePlayers)
        );

        let mut stranger = ids[..5].to_vec();
        stranger[0] = Uuid::new_v4();
        assert!(matches!(
            validate_lineup(&team, &stranger, &fouls, 5),
            Err(RosterError::NotOnRoster { .. })
        ));
    }

    #[test]
    fn substitution_rejects_player_already_on_court() {
        let (team, ids) = team_of(6);
        let on_court = &ids[..5];
        let fouls = HashMap::new();

        let err =
            validate_substitution(&team, on_court, ids[1], ids[0], &fouls, 5).unwrap_err();
        assert_eq!(err, RosterError::AlreadyOnCourt { player: ids[1] });

        assert!(validate_substitution(&team, on_court, ids[5], ids[0], &fouls, 5).is_ok());
    }

    #[test]
    fn substitution_rejects_fouled_out_player() {
        let (team, ids) = team_of(6);
        let on_court = &ids[..5];
        let mut fouls = HashMap::new();
        fouls.insert(ids[5], 5);

        let err =
            validate_substitution(&team, on_court, ids[5], ids[0], &fouls, 5).unwrap_err();
        assert!(matches!(err, RosterError::FouledOut { fouls: 5, .. }));
    }
}
