//! Score and statistics aggregation.
//!
//! Everything here is a pure fold over the action journal. Scores are always
//! recomputed from scratch from the non-deleted entries, never adjusted
//! incrementally, so corrections and deletions cannot leave drift behind.

use std::collections::HashMap;

use indexmap::IndexMap;
use uuid::Uuid;

use crate::{
    dao::models::{
        ActionType, GameActionEntity, GameEntity, PeriodScoreEntity, TeamSide,
    },
    dto::scoring::{GameStatistics, PlayerStats, StatLine, TeamStats},
};

/// Scores recomputed from the journal.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecomputedScores {
    /// Home total over the non-deleted journal.
    pub home: i32,
    /// Away total over the non-deleted journal.
    pub away: i32,
    /// One split per period that has at least one recorded action, ordered by
    /// period number.
    pub splits: Vec<PeriodScoreEntity>,
}

/// Recompute both team totals and per-period splits from the journal,
/// ignoring soft-deleted entries.
pub fn recompute_scores(actions: &[GameActionEntity]) -> RecomputedScores {
    let mut totals = RecomputedScores::default();
    let mut by_period: IndexMap<u8, PeriodScoreEntity> = IndexMap::new();

    for action in actions.iter().filter(|action| action.is_active()) {
        if action.points == 0 {
            continue;
        }

        let split = by_period
            .entry(action.period)
            .or_insert_with(|| PeriodScoreEntity {
                period: action.period,
                home: 0,
                away: 0,
            });

        match action.team {
            TeamSide::Home => {
                totals.home += action.points;
                split.home += action.points;
            }
            TeamSide::Away => {
                totals.away += action.points;
                split.away += action.points;
            }
        }
    }

    by_period.sort_unstable_keys();
    totals.splits = by_period.into_values().collect();
    totals
}

/// Count personal fouls per player from the non-deleted journal entries.
pub fn foul_counts(actions: &[GameActionEntity]) -> HashMap<Uuid, u32> {
    let mut counts = HashMap::new();
    for action in actions.iter().filter(|action| action.is_active()) {
        if action.action_type == ActionType::Foul {
            if let Some(player) = action.player_id {
                *counts.entry(player).or_insert(0) += 1;
            }
        }
    }
    counts
}

/// Build the full boxscore for a game by replaying its journal.
pub fn boxscore(game: &GameEntity, actions: &[GameActionEntity]) -> GameStatistics {
    GameStatistics {
        game_id: game.id,
        home: team_stats(game, TeamSide::Home, actions),
        away: team_stats(game, TeamSide::Away, actions),
    }
}

fn team_stats(game: &GameEntity, side: TeamSide, actions: &[GameActionEntity]) -> TeamStats {
    let roster = game.team(side);

    // Keep roster order in the player lines so the boxscore reads like the
    // scoresheet.
    let mut players: IndexMap<Uuid, PlayerStats> = roster
        .players
        .iter()
        .map(|player| {
            (
                player.id,
                PlayerStats {
                    player_id: player.id,
                    name: player.name.clone(),
                    jersey_number: player.jersey_number,
                    ..PlayerStats::default()
                },
            )
        })
        .collect();

    let mut totals = TeamStats::default();

    for action in actions
        .iter()
        .filter(|action| action.is_active() && action.team == side)
    {
        totals.points += action.points;
        tally(&mut totals.line, action.action_type);

        if let Some(player_id) = action.player_id
            && let Some(line) = players.get_mut(&player_id)
        {
            line.points += action.points;
            tally(&mut line.line, action.action_type);
        }

        // A made shot may carry an assist credit for a teammate.
        if action.points > 0
            && let Some(assist_id) = action.assisted_by_player_id
        {
            totals.line.assists += 1;
            if let Some(line) = players.get_mut(&assist_id) {
                line.line.assists += 1;
            }
        }
    }

    totals.players = players.into_values().collect();
    totals
}

fn tally(stats: &mut StatLine, action_type: ActionType) {
    match action_type {
        ActionType::Made2Pt => {
            stats.field_goals_made += 1;
            stats.field_goals_attempted += 1;
        }
        ActionType::Missed2Pt => stats.field_goals_attempted += 1,
        ActionType::Made3Pt => {
            stats.field_goals_made += 1;
            stats.field_goals_attempted += 1;
            stats.three_points_made += 1;
            stats.three_points_attempted += 1;
        }
        ActionType::Missed3Pt => {
            stats.field_goals_attempted += 1;
            stats.three_points_attempted += 1;
        }
        ActionType::MadeFt => {
            stats.free_throws_made += 1;
            stats.free_throws_attempted += 1;
        }
        ActionType::MissedFt => stats.free_throws_attempted += 1,
        ActionType::Rebound => stats.rebounds += 1,
        // Standalone assist entries; assists attached to made shots are
        // credited where the shot is folded in.
        ActionType::Assist => stats.assists += 1,
        ActionType::Steal => stats.steals += 1,
        ActionType::Block => stats.blocks += 1,
        ActionType::Turnover => stats.turnovers += 1,
        ActionType::Foul => stats.fouls += 1,
        ActionType::SubstitutionIn | ActionType::SubstitutionOut => {}
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;

    fn action(
        team: TeamSide,
        action_type: ActionType,
        period: u8,
        player_id: Option<Uuid>,
    ) -> GameActionEntity {
        GameActionEntity {
            id: Uuid::new_v4(),
            game_id: Uuid::new_v4(),
            team,
            player_id,
            assisted_by_player_id: None,
            action_type,
            points: action_type.points(),
            period,
            game_clock_seconds: 300,
            paired_player_id: None,
            substitution_reason: None,
            recorded_at: SystemTime::now(),
            corrected: false,
            correction_reason: None,
            prior: None,
            deleted_at: None,
        }
    }

    #[test]
    fn recompute_ignores_deleted_entries() {
        let mut journal = vec![
            action(TeamSide::Home, ActionType::Made3Pt, 1, None),
            action(TeamSide::Home, ActionType::Made2Pt, 1, None),
            action(TeamSide::Away, ActionType::MadeFt, 2, None),
        ];
        journal[0].deleted_at = Some(SystemTime::now());

        let totals = recompute_scores(&journal);
        assert_eq!(totals.home, 2);
        assert_eq!(totals.away, 1);
        assert_eq!(totals.splits.len(), 2);
        assert_eq!(totals.splits[0].home, 2);
        assert_eq!(totals.splits[1].away, 1);
    }

    #[test]
    fn recompute_reflects_corrections_fully() {
        let mut journal = vec![action(TeamSide::Home, ActionType::Made3Pt, 1, None)];
        assert_eq!(recompute_scores(&journal).home, 3);

        journal[0].action_type = ActionType::Missed3Pt;
        journal[0].points = ActionType::Missed3Pt.points();
        assert_eq!(recompute_scores(&journal).home, 0);
    }

    #[test]
    fn foul_counts_per_player() {
        let player = Uuid::new_v4();
        let mut journal = vec![
            action(TeamSide::Home, ActionType::Foul, 1, Some(player)),
            action(TeamSide::Home, ActionType::Foul, 2, Some(player)),
            action(TeamSide::Home, ActionType::Foul, 2, None),
        ];
        journal[1].deleted_at = Some(SystemTime::now());

        let counts = foul_counts(&journal);
        assert_eq!(counts.get(&player), Some(&1));
    }
}
