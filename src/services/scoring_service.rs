//! Live scoring operations.
//!
//! Every mutation of a live game runs with the game's gate held, so at most
//! one writer per game is in flight at any time. The order inside each
//! operation is fixed: validate against a snapshot, persist to the journal,
//! apply to the in-memory state, then broadcast. A broadcast failure never
//! rolls back a committed journal write.

use std::{sync::Arc, time::SystemTime};

use tracing::info;
use uuid::Uuid;

use crate::{
    dao::models::{
        ActionRevisionEntity, ActionType, GameActionEntity, GameStatus, PeriodScoreEntity,
    },
    dto::scoring::{
        ActionInput, ActionSummary, ClockCommand, CorrectActionRequest, FinishGameRequest,
        LiveStateSnapshot, PlayersOnCourtRequest, ResetShotClockRequest, SubstitutionRequest,
        TimeoutRequest, UpdateScoreRequest,
    },
    error::ServiceError,
    services::{clock_ticker, events, game_service, stats_service},
    state::{ClockEvent, ClockPhase, LiveGame, LiveGameState, SharedState, roster},
};

/// Open a scheduled game for live scoring.
pub async fn start_game(
    state: &SharedState,
    game_id: Uuid,
) -> Result<LiveStateSnapshot, ServiceError> {
    let store = state.require_game_store().await?;
    let mut game = game_service::find_game(state, game_id).await?;

    match game.status {
        GameStatus::Scheduled => {}
        GameStatus::InProgress => {
            return Err(ServiceError::GameNotLive(format!(
                "game {game_id} is already live"
            )));
        }
        GameStatus::Finished | GameStatus::Cancelled => {
            return Err(ServiceError::GameNotLive(format!(
                "game {game_id} is already over"
            )));
        }
    }

    // Single-flight point for concurrent starts: only the caller that claims
    // the registry slot goes on to persist the transition.
    let live = LiveGame::new(game_id, state.rules());
    if !state.register_live(live.clone()) {
        return Err(ServiceError::GameNotLive(format!(
            "game {game_id} is already live"
        )));
    }

    game.status = GameStatus::InProgress;
    game.started_at = Some(SystemTime::now());
    game.updated_at = SystemTime::now();
    if let Err(err) = store.save_game(game).await {
        state.remove_live(game_id);
        return Err(err.into());
    }

    clock_ticker::spawn(&live, state.rules().clone());

    let snapshot = live.snapshot().await;
    events::publish(&live, events::GAME_STARTED, &snapshot, None);
    info!(%game_id, "game opened for live scoring");

    Ok(LiveStateSnapshot::from_state(game_id, &snapshot))
}

/// Append a new action to a live game's journal.
pub async fn add_action(
    state: &SharedState,
    game_id: Uuid,
    input: ActionInput,
) -> Result<ActionSummary, ServiceError> {
    if input.action_type.is_substitution() {
        return Err(ServiceError::InvalidInput(
            "substitutions go through the substitution endpoint".into(),
        ));
    }

    let live = require_live(state, game_id)?;
    let _guard = live.acquire(state.rules().mutation_policy).await?;

    let store = state.require_game_store().await?;
    let snapshot = live.snapshot().await;
    if !snapshot.period_in_progress() {
        return Err(ServiceError::GameNotLive(format!(
            "no period in progress for game {game_id}"
        )));
    }

    // Player-attributed actions must reference someone currently on the court.
    let on_court = &snapshot.team(input.team).on_court;
    if let Some(player) = input.player_id {
        roster::require_on_court(on_court, player)?;
    }
    if let Some(assist) = input.assisted_by_player_id {
        roster::require_on_court(on_court, assist)?;
    }

    let action = GameActionEntity {
        id: Uuid::new_v4(),
        game_id,
        team: input.team,
        player_id: input.player_id,
        assisted_by_player_id: input.assisted_by_player_id,
        action_type: input.action_type,
        points: input.action_type.points(),
        period: snapshot.period,
        game_clock_seconds: snapshot.clock_remaining,
        paired_player_id: None,
        substitution_reason: None,
        recorded_at: SystemTime::now(),
        corrected: false,
        correction_reason: None,
        prior: None,
        deleted_at: None,
    };
    store.append_action(action.clone()).await?;

    let journal = store.load_actions(game_id).await?;
    let summary = ActionSummary::from(&action);
    {
        let mut guard = live.state().write().await;
        apply_recompute(&mut guard, &journal);
        if action.action_type.resets_shot_clock() {
            guard.shot_clock_remaining = Some(state.rules().shot_clock_seconds);
        }
        events::publish(&live, events::ACTION_ADDED, &guard, Some(summary.clone()));
        if action.points != 0 {
            events::publish(&live, events::SCORE_UPDATED, &guard, Some(summary.clone()));
        }
    }

    if action.action_type == ActionType::Foul
        && let Some(player) = action.player_id
    {
        let fouls = stats_service::foul_counts(&journal)
            .get(&player)
            .copied()
            .unwrap_or(0);
        if fouls >= u32::from(state.rules().foul_limit) {
            info!(%game_id, %player, fouls, "player reached the foul limit");
        }
    }

    Ok(summary)
}

/// Record a made shot from a bare point value.
pub async fn update_score(
    state: &SharedState,
    game_id: Uuid,
    request: UpdateScoreRequest,
) -> Result<ActionSummary, ServiceError> {
    let action_type = match request.points {
        1 => ActionType::MadeFt,
        2 => ActionType::Made2Pt,
        3 => ActionType::Made3Pt,
        other => {
            return Err(ServiceError::InvalidInput(format!(
                "a made shot is worth 1, 2 or 3 points, not {other}"
            )));
        }
    };

    add_action(
        state,
        game_id,
        ActionInput {
            team: request.team,
            action_type,
            player_id: Some(request.player_id),
            assisted_by_player_id: request.assisted_by_player_id,
        },
    )
    .await
}

/// Drive the period clock: start, pause, resume or end the current period.
pub async fn control_clock(
    state: &SharedState,
    game_id: Uuid,
    command: ClockCommand,
) -> Result<LiveStateSnapshot, ServiceError> {
    let live = require_live(state, game_id)?;
    let _guard = live.acquire(state.rules().mutation_policy).await?;

    let event = match command {
        ClockCommand::Start => ClockEvent::StartPeriod,
        ClockCommand::Pause => ClockEvent::Pause,
        ClockCommand::Resume => ClockEvent::Resume,
        ClockCommand::EndPeriod => ClockEvent::EndPeriod,
    };

    let snapshot = {
        let mut guard = live.state().write().await;

        // The clock only runs with five players a side on the floor.
        if matches!(command, ClockCommand::Start | ClockCommand::Resume) {
            roster::lineups_ready(&guard)?;
        }

        let mut next = guard.clone();
        crate::state::clock::apply(&mut next, event, state.rules())?;

        // The split is banked before the in-memory period advances, so a
        // storage failure leaves the live state exactly where it was and the
        // command can simply be retried.
        if matches!(command, ClockCommand::EndPeriod) {
            persist_scores(state, game_id, &next).await?;
        }

        *guard = next;
        events::publish(&live, events::CLOCK_UPDATED, &guard, None);
        guard.clone()
    };

    Ok(LiveStateSnapshot::from_state(game_id, &snapshot))
}

/// Start a team timeout, charging it against the team's pool.
pub async fn start_timeout(
    state: &SharedState,
    game_id: Uuid,
    request: TimeoutRequest,
) -> Result<LiveStateSnapshot, ServiceError> {
    let live = require_live(state, game_id)?;
    let _guard = live.acquire(state.rules().mutation_policy).await?;

    let duration = request
        .duration_seconds
        .unwrap_or(state.rules().default_timeout_seconds);

    let mut guard = live.state().write().await;
    crate::state::clock::apply(
        &mut guard,
        ClockEvent::StartTimeout {
            side: request.team,
            duration_seconds: duration,
        },
        state.rules(),
    )?;
    events::publish(&live, events::TIMEOUT_STARTED, &guard, None);

    Ok(LiveStateSnapshot::from_state(game_id, &guard))
}

/// End the running timeout, returning the game to a paused clock.
pub async fn end_timeout(
    state: &SharedState,
    game_id: Uuid,
) -> Result<LiveStateSnapshot, ServiceError> {
    let live = require_live(state, game_id)?;
    let _guard = live.acquire(state.rules().mutation_policy).await?;

    let mut guard = live.state().write().await;
    crate::state::clock::apply(&mut guard, ClockEvent::EndTimeout, state.rules())?;
    events::publish(&live, events::TIMEOUT_ENDED, &guard, None);

    Ok(LiveStateSnapshot::from_state(game_id, &guard))
}

/// Swap one player for another, recording both halves in the journal.
pub async fn substitution(
    state: &SharedState,
    game_id: Uuid,
    request: SubstitutionRequest,
) -> Result<Vec<ActionSummary>, ServiceError> {
    let live = require_live(state, game_id)?;
    let _guard = live.acquire(state.rules().mutation_policy).await?;

    let store = state.require_game_store().await?;
    let game = game_service::find_game(state, game_id).await?;
    let snapshot = live.snapshot().await;

    if matches!(
        snapshot.phase,
        ClockPhase::NotStarted | ClockPhase::PeriodEnded | ClockPhase::Finished
    ) {
        return Err(ServiceError::GameNotLive(format!(
            "game {game_id} is not in a phase that allows substitutions"
        )));
    }

    let journal = store.load_actions(game_id).await?;
    let fouls = stats_service::foul_counts(&journal);
    roster::validate_substitution(
        game.team(request.team),
        &snapshot.team(request.team).on_court,
        request.player_in,
        request.player_out,
        &fouls,
        state.rules().foul_limit,
    )?;

    let now = SystemTime::now();
    let half = |action_type: ActionType, player: Uuid, paired: Uuid| GameActionEntity {
        id: Uuid::new_v4(),
        game_id,
        team: request.team,
        player_id: Some(player),
        assisted_by_player_id: None,
        action_type,
        points: 0,
        period: snapshot.period,
        game_clock_seconds: snapshot.clock_remaining,
        paired_player_id: Some(paired),
        substitution_reason: request.reason.clone(),
        recorded_at: now,
        corrected: false,
        correction_reason: None,
        prior: None,
        deleted_at: None,
    };

    let out = half(
        ActionType::SubstitutionOut,
        request.player_out,
        request.player_in,
    );
    let incoming = half(
        ActionType::SubstitutionIn,
        request.player_in,
        request.player_out,
    );
    // The pair only makes sense whole: one batched write, so a storage
    // failure never journals an exit without its matching entry.
    store
        .append_actions(vec![out.clone(), incoming.clone()])
        .await?;

    {
        let mut guard = live.state().write().await;
        let on_court = &mut guard.team_mut(request.team).on_court;
        if let Some(slot) = on_court.iter().position(|id| *id == request.player_out) {
            on_court[slot] = request.player_in;
        }
        events::publish(
            &live,
            events::ACTION_ADDED,
            &guard,
            Some(ActionSummary::from(&out)),
        );
        events::publish(
            &live,
            events::ACTION_ADDED,
            &guard,
            Some(ActionSummary::from(&incoming)),
        );
        events::publish(&live, events::ROSTER_UPDATED, &guard, None);
    }

    Ok(vec![ActionSummary::from(&out), ActionSummary::from(&incoming)])
}

/// Replace a team's full five-player lineup.
pub async fn update_players_on_court(
    state: &SharedState,
    game_id: Uuid,
    request: PlayersOnCourtRequest,
) -> Result<LiveStateSnapshot, ServiceError> {
    let live = require_live(state, game_id)?;
    let _guard = live.acquire(state.rules().mutation_policy).await?;

    let store = state.require_game_store().await?;
    let game = game_service::find_game(state, game_id).await?;
    let journal = store.load_actions(game_id).await?;
    let fouls = stats_service::foul_counts(&journal);

    roster::validate_lineup(
        game.team(request.team),
        &request.players,
        &fouls,
        state.rules().foul_limit,
    )?;

    let mut guard = live.state().write().await;
    if guard.phase == ClockPhase::Finished {
        return Err(ServiceError::GameNotLive(format!(
            "game {game_id} is finished"
        )));
    }
    guard.team_mut(request.team).on_court = request.players;
    events::publish(&live, events::ROSTER_UPDATED, &guard, None);

    Ok(LiveStateSnapshot::from_state(game_id, &guard))
}

/// Reset the shot clock, typically after a change of possession.
pub async fn reset_shot_clock(
    state: &SharedState,
    game_id: Uuid,
    request: ResetShotClockRequest,
) -> Result<LiveStateSnapshot, ServiceError> {
    let live = require_live(state, game_id)?;
    let _guard = live.acquire(state.rules().mutation_policy).await?;

    let seconds = request.seconds.unwrap_or(state.rules().shot_clock_seconds);
    if seconds > state.rules().shot_clock_seconds {
        return Err(ServiceError::InvalidInput(format!(
            "shot clock cannot exceed {} seconds",
            state.rules().shot_clock_seconds
        )));
    }

    let mut guard = live.state().write().await;
    if !guard.period_in_progress() {
        return Err(ServiceError::GameNotLive(format!(
            "no period in progress for game {game_id}"
        )));
    }
    guard.shot_clock_remaining = Some(seconds);
    events::publish(&live, events::CLOCK_UPDATED, &guard, None);

    Ok(LiveStateSnapshot::from_state(game_id, &guard))
}

/// Correct a journal entry in place, then recompute every derived figure.
pub async fn correct_action(
    state: &SharedState,
    game_id: Uuid,
    action_id: Uuid,
    request: CorrectActionRequest,
) -> Result<ActionSummary, ServiceError> {
    let store = state.require_game_store().await?;
    let live = state.live(game_id);
    // The guard must borrow from an Arc that outlives the move into
    // reconcile_after_edit below.
    let gate_owner = live.clone();
    let _guard = match gate_owner.as_deref() {
        Some(live) => Some(live.acquire(state.rules().mutation_policy).await?),
        None => None,
    };

    let mut action = find_action(store.as_ref(), game_id, action_id).await?;
    if action.deleted_at.is_some() {
        return Err(ServiceError::InvalidInput(format!(
            "action {action_id} is deleted and cannot be corrected"
        )));
    }
    if action.action_type.is_substitution()
        || request
            .action_type
            .is_some_and(|action_type| action_type.is_substitution())
    {
        return Err(ServiceError::InvalidInput(
            "substitution entries cannot be corrected; delete and re-enter them".into(),
        ));
    }

    // The first correction keeps the original revision for the audit trail.
    if action.prior.is_none() {
        action.prior = Some(ActionRevisionEntity {
            action_type: action.action_type,
            points: action.points,
            player_id: action.player_id,
            assisted_by_player_id: action.assisted_by_player_id,
        });
    }

    if let Some(action_type) = request.action_type {
        action.action_type = action_type;
        action.points = action_type.points();
    }
    if let Some(player) = request.player_id {
        action.player_id = Some(player);
    }
    if let Some(assist) = request.assisted_by_player_id {
        action.assisted_by_player_id = Some(assist);
    }
    action.corrected = true;
    action.correction_reason = Some(request.reason);

    store.update_action(action.clone()).await?;
    let summary = ActionSummary::from(&action);

    reconcile_after_edit(state, game_id, live, events::ACTION_CORRECTED, &summary).await?;
    Ok(summary)
}

/// Soft-delete a journal entry, then recompute every derived figure.
pub async fn delete_action(
    state: &SharedState,
    game_id: Uuid,
    action_id: Uuid,
    reason: Option<String>,
) -> Result<ActionSummary, ServiceError> {
    let store = state.require_game_store().await?;
    let live = state.live(game_id);
    let gate_owner = live.clone();
    let _guard = match gate_owner.as_deref() {
        Some(live) => Some(live.acquire(state.rules().mutation_policy).await?),
        None => None,
    };

    let mut action = find_action(store.as_ref(), game_id, action_id).await?;
    if action.deleted_at.is_some() {
        return Err(ServiceError::InvalidInput(format!(
            "action {action_id} is already deleted"
        )));
    }

    action.deleted_at = Some(SystemTime::now());
    if reason.is_some() {
        action.correction_reason = reason;
    }

    store.update_action(action.clone()).await?;
    let summary = ActionSummary::from(&action);

    reconcile_after_edit(state, game_id, live, events::ACTION_DELETED, &summary).await?;
    Ok(summary)
}

/// Close out a game, persisting the final score.
pub async fn finish_game(
    state: &SharedState,
    game_id: Uuid,
    request: FinishGameRequest,
) -> Result<LiveStateSnapshot, ServiceError> {
    let live = require_live(state, game_id)?;
    let _guard = live.acquire(state.rules().mutation_policy).await?;

    let store = state.require_game_store().await?;
    let mut game = game_service::find_game(state, game_id).await?;

    let snapshot = {
        let mut guard = live.state().write().await;

        // Validate and persist the final state before committing it to the
        // live session: a storage failure must leave the game resumable, not
        // wedged in a finished-but-unpersisted phase.
        let mut next = guard.clone();
        crate::state::clock::apply(
            &mut next,
            ClockEvent::Finish {
                force: request.force,
            },
            state.rules(),
        )?;

        game.status = GameStatus::Finished;
        game.finished_at = Some(SystemTime::now());
        game.updated_at = SystemTime::now();
        game.home_score = next.home_score;
        game.away_score = next.away_score;
        game.period_scores = next.period_scores.clone();
        store.save_game(game).await?;

        *guard = next;
        events::publish(&live, events::FINISHED, &guard, None);
        guard.clone()
    };

    state.remove_live(game_id);
    info!(%game_id, home = snapshot.home_score, away = snapshot.away_score, "game finished");

    Ok(LiveStateSnapshot::from_state(game_id, &snapshot))
}

/// Recompute scores from the journal after a correction or deletion, either
/// into the live state (then broadcast) or into the stored final figures for
/// a game that is already over.
async fn reconcile_after_edit(
    state: &SharedState,
    game_id: Uuid,
    live: Option<Arc<LiveGame>>,
    event_type: &str,
    summary: &ActionSummary,
) -> Result<(), ServiceError> {
    let store = state.require_game_store().await?;
    let journal = store.load_actions(game_id).await?;

    match live {
        Some(live) => {
            let mut guard = live.state().write().await;
            let before = (guard.home_score, guard.away_score);
            apply_recompute(&mut guard, &journal);
            events::publish(&live, event_type, &guard, Some(summary.clone()));
            if before != (guard.home_score, guard.away_score) {
                events::publish(&live, events::SCORE_UPDATED, &guard, Some(summary.clone()));
            }
        }
        None => {
            // Post-game bookkeeping edit: fix the stored result quietly.
            let totals = stats_service::recompute_scores(&journal);
            let mut game = game_service::find_game(state, game_id).await?;
            let last_completed = game
                .period_scores
                .last()
                .map(|split| split.period)
                .unwrap_or(0);
            game.home_score = totals.home;
            game.away_score = totals.away;
            game.period_scores = cumulative_splits(&totals.splits, last_completed);
            game.updated_at = SystemTime::now();
            store.save_game(game).await?;
        }
    }

    Ok(())
}

/// Rebuild scores and banked period splits of the live state from the journal.
fn apply_recompute(state: &mut LiveGameState, journal: &[GameActionEntity]) {
    let totals = stats_service::recompute_scores(journal);
    state.set_scores(totals.home, totals.away);

    let last_completed = if state.game_over {
        state.period
    } else {
        state.period.saturating_sub(1)
    };
    state.period_scores = cumulative_splits(&totals.splits, last_completed);
}

/// Banked splits are running totals: the split for period N is the score as
/// it stood when period N ended.
fn cumulative_splits(splits: &[PeriodScoreEntity], last_completed: u8) -> Vec<PeriodScoreEntity> {
    let mut home = 0;
    let mut away = 0;
    (1..=last_completed)
        .map(|period| {
            if let Some(split) = splits.iter().find(|split| split.period == period) {
                home += split.home;
                away += split.away;
            }
            PeriodScoreEntity { period, home, away }
        })
        .collect()
}

/// Persist the current score snapshot onto the stored game record.
async fn persist_scores(
    state: &SharedState,
    game_id: Uuid,
    snapshot: &LiveGameState,
) -> Result<(), ServiceError> {
    let store = state.require_game_store().await?;
    let mut game = game_service::find_game(state, game_id).await?;
    game.home_score = snapshot.home_score;
    game.away_score = snapshot.away_score;
    game.period_scores = snapshot.period_scores.clone();
    game.updated_at = SystemTime::now();
    store.save_game(game).await?;
    Ok(())
}

fn require_live(state: &SharedState, game_id: Uuid) -> Result<Arc<LiveGame>, ServiceError> {
    state
        .live(game_id)
        .ok_or_else(|| ServiceError::GameNotLive(format!("game {game_id} is not live")))
}

async fn find_action(
    store: &dyn crate::dao::game_store::GameStore,
    game_id: Uuid,
    action_id: Uuid,
) -> Result<GameActionEntity, ServiceError> {
    let action = store
        .find_action(action_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("action {action_id} not found")))?;
    if action.game_id != game_id {
        return Err(ServiceError::NotFound(format!(
            "action {action_id} does not belong to game {game_id}"
        )));
    }
    Ok(action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::GameRules,
        dao::{game_store::memory::MemoryGameStore, models::TeamSide},
        dto::game::{PlayerInput, ScheduleGameRequest, TeamInput},
        state::AppState,
    };

    fn team(name: &str) -> TeamInput {
        TeamInput {
            name: name.into(),
            external: false,
            players: (0..6)
                .map(|index| PlayerInput {
                    name: format!("{name} {index}"),
                    jersey_number: index + 4,
                })
                .collect(),
        }
    }

    async fn scheduled_state() -> (SharedState, Uuid, Vec<Uuid>, Vec<Uuid>) {
        let state = AppState::new(GameRules::default());
        state
            .install_game_store(std::sync::Arc::new(MemoryGameStore::new()))
            .await;

        let summary = game_service::schedule_game(
            &state,
            ScheduleGameRequest {
                home: team("Home"),
                away: team("Away"),
                scheduled_at: None,
            },
        )
        .await
        .unwrap();

        let home: Vec<Uuid> = summary.home.players.iter().map(|player| player.id).collect();
        let away: Vec<Uuid> = summary.away.players.iter().map(|player| player.id).collect();
        (state, summary.id, home, away)
    }

    async fn live_state() -> (SharedState, Uuid, Vec<Uuid>, Vec<Uuid>) {
        let (state, game_id, home, away) = scheduled_state().await;
        start_game(&state, game_id).await.unwrap();

        for (side, players) in [(TeamSide::Home, &home), (TeamSide::Away, &away)] {
            update_players_on_court(
                &state,
                game_id,
                PlayersOnCourtRequest {
                    team: side,
                    players: players[..5].to_vec(),
                },
            )
            .await
            .unwrap();
        }

        control_clock(&state, game_id, ClockCommand::Start)
            .await
            .unwrap();
        (state, game_id, home, away)
    }

    fn shot(team: TeamSide, action_type: ActionType, player: Uuid) -> ActionInput {
        ActionInput {
            team,
            action_type,
            player_id: Some(player),
            assisted_by_player_id: None,
        }
    }

    #[tokio::test]
    async fn made_shots_accumulate_into_the_score() {
        let (state, game_id, home, away) = live_state().await;

        add_action(&state, game_id, shot(TeamSide::Home, ActionType::Made2Pt, home[0]))
            .await
            .unwrap();
        add_action(&state, game_id, shot(TeamSide::Home, ActionType::Made3Pt, home[1]))
            .await
            .unwrap();
        add_action(&state, game_id, shot(TeamSide::Away, ActionType::MadeFt, away[0]))
            .await
            .unwrap();
        add_action(&state, game_id, shot(TeamSide::Home, ActionType::Missed3Pt, home[2]))
            .await
            .unwrap();

        let snapshot = game_service::get_live_state(&state, game_id).await.unwrap();
        assert_eq!(snapshot.home.score, 5);
        assert_eq!(snapshot.away.score, 1);
    }

    #[tokio::test]
    async fn sequence_numbers_increase_with_every_event() {
        let (state, game_id, home, _) = live_state().await;
        let live = state.live(game_id).unwrap();

        let before = live.current_sequence();
        add_action(&state, game_id, shot(TeamSide::Home, ActionType::Made2Pt, home[0]))
            .await
            .unwrap();
        assert!(live.current_sequence() > before);
    }

    #[tokio::test]
    async fn correction_recomputes_instead_of_adjusting() {
        let (state, game_id, home, _) = live_state().await;

        let three = add_action(
            &state,
            game_id,
            shot(TeamSide::Home, ActionType::Made3Pt, home[0]),
        )
        .await
        .unwrap();
        add_action(&state, game_id, shot(TeamSide::Home, ActionType::Made2Pt, home[1]))
            .await
            .unwrap();

        let corrected = correct_action(
            &state,
            game_id,
            three.id,
            CorrectActionRequest {
                action_type: Some(ActionType::Missed3Pt),
                player_id: None,
                assisted_by_player_id: None,
                reason: "shot was short".into(),
            },
        )
        .await
        .unwrap();

        assert!(corrected.corrected);
        assert_eq!(corrected.points, 0);
        // Recording timestamp survives the correction.
        assert_eq!(corrected.recorded_at, three.recorded_at);

        let snapshot = game_service::get_live_state(&state, game_id).await.unwrap();
        assert_eq!(snapshot.home.score, 2);
    }

    #[tokio::test]
    async fn deletion_is_soft_and_single_shot() {
        let (state, game_id, home, _) = live_state().await;

        let three = add_action(
            &state,
            game_id,
            shot(TeamSide::Home, ActionType::Made3Pt, home[0]),
        )
        .await
        .unwrap();

        let deleted = delete_action(&state, game_id, three.id, Some("wrong team".into()))
            .await
            .unwrap();
        assert!(deleted.deleted);

        let snapshot = game_service::get_live_state(&state, game_id).await.unwrap();
        assert_eq!(snapshot.home.score, 0);

        // The entry is still in the journal, only flagged.
        let journal = game_service::get_actions(&state, game_id, None).await.unwrap();
        assert_eq!(journal.len(), 1);

        let again = delete_action(&state, game_id, three.id, None).await;
        assert!(matches!(again, Err(ServiceError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn actions_require_the_player_on_court() {
        let (state, game_id, home, _) = live_state().await;

        // home[5] is on the roster but on the bench.
        let err = add_action(
            &state,
            game_id,
            shot(TeamSide::Home, ActionType::Made2Pt, home[5]),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::RosterViolation(_)));
    }

    #[tokio::test]
    async fn substitution_swaps_the_lineup_and_journals_both_halves() {
        let (state, game_id, home, _) = live_state().await;

        let halves = substitution(
            &state,
            game_id,
            SubstitutionRequest {
                team: TeamSide::Home,
                player_in: home[5],
                player_out: home[0],
                reason: Some("rest".into()),
            },
        )
        .await
        .unwrap();

        assert_eq!(halves.len(), 2);
        assert_eq!(halves[0].paired_player_id, Some(home[5]));
        assert_eq!(halves[1].paired_player_id, Some(home[0]));

        let snapshot = game_service::get_live_state(&state, game_id).await.unwrap();
        assert!(snapshot.home.on_court.contains(&home[5]));
        assert!(!snapshot.home.on_court.contains(&home[0]));

        // The outgoing player can no longer score.
        let err = add_action(
            &state,
            game_id,
            shot(TeamSide::Home, ActionType::Made2Pt, home[0]),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::RosterViolation(_)));
    }

    #[tokio::test]
    async fn timeout_pool_is_enforced() {
        let (state, game_id, _, _) = live_state().await;

        for _ in 0..GameRules::default().timeouts_per_team {
            start_timeout(
                &state,
                game_id,
                TimeoutRequest {
                    team: TeamSide::Home,
                    duration_seconds: Some(30),
                },
            )
            .await
            .unwrap();
            end_timeout(&state, game_id).await.unwrap();
        }

        let err = start_timeout(
            &state,
            game_id,
            TimeoutRequest {
                team: TeamSide::Home,
                duration_seconds: Some(30),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn finish_is_rejected_during_a_timeout() {
        let (state, game_id, _, _) = live_state().await;

        start_timeout(
            &state,
            game_id,
            TimeoutRequest {
                team: TeamSide::Away,
                duration_seconds: Some(60),
            },
        )
        .await
        .unwrap();

        let err = finish_game(&state, game_id, FinishGameRequest { force: true })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn forced_finish_persists_the_final_score() {
        let (state, game_id, home, _) = live_state().await;

        add_action(&state, game_id, shot(TeamSide::Home, ActionType::Made2Pt, home[0]))
            .await
            .unwrap();
        finish_game(&state, game_id, FinishGameRequest { force: true })
            .await
            .unwrap();

        assert!(state.live(game_id).is_none());
        let stored = game_service::get_game(&state, game_id).await.unwrap();
        assert_eq!(stored.home_score, 2);
        assert_eq!(stored.status, GameStatus::Finished);
    }

    #[tokio::test]
    async fn concurrent_actions_are_both_journaled() {
        let (state, game_id, home, away) = live_state().await;

        let first = add_action(
            &state,
            game_id,
            shot(TeamSide::Home, ActionType::Made2Pt, home[0]),
        );
        let second = add_action(
            &state,
            game_id,
            shot(TeamSide::Away, ActionType::Made3Pt, away[0]),
        );
        let (first, second) = tokio::join!(first, second);
        first.unwrap();
        second.unwrap();

        let journal = game_service::get_actions(&state, game_id, None).await.unwrap();
        assert_eq!(journal.len(), 2);

        let snapshot = game_service::get_live_state(&state, game_id).await.unwrap();
        assert_eq!((snapshot.home.score, snapshot.away.score), (2, 3));
    }

    #[tokio::test]
    async fn degraded_mode_fails_mutations_but_keeps_live_reads() {
        let (state, game_id, home, _) = live_state().await;
        state.clear_game_store().await;

        let err = add_action(
            &state,
            game_id,
            shot(TeamSide::Home, ActionType::Made2Pt, home[0]),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Degraded));

        // The in-memory snapshot stays readable while storage is gone.
        assert!(game_service::get_live_state(&state, game_id).await.is_ok());
    }

    #[tokio::test]
    async fn failed_finish_leaves_the_game_resumable() {
        let (state, game_id, home, _) = live_state().await;
        add_action(&state, game_id, shot(TeamSide::Home, ActionType::Made2Pt, home[0]))
            .await
            .unwrap();
        let store = state.require_game_store().await.unwrap();

        state.clear_game_store().await;
        let err = finish_game(&state, game_id, FinishGameRequest { force: true })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Degraded));

        // The live session survives the failure and is not parked in a
        // finished phase it never persisted.
        assert!(state.live(game_id).is_some());
        let snapshot = game_service::get_live_state(&state, game_id).await.unwrap();
        assert!(!snapshot.game_over);

        state.install_game_store(store).await;
        finish_game(&state, game_id, FinishGameRequest { force: true })
            .await
            .unwrap();
        let stored = game_service::get_game(&state, game_id).await.unwrap();
        assert_eq!(stored.status, GameStatus::Finished);
        assert_eq!(stored.home_score, 2);
    }

    #[tokio::test]
    async fn failed_end_period_does_not_advance_the_period() {
        let (state, game_id, _, _) = live_state().await;
        let store = state.require_game_store().await.unwrap();

        state.clear_game_store().await;
        let err = control_clock(&state, game_id, ClockCommand::EndPeriod)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Degraded));

        let snapshot = game_service::get_live_state(&state, game_id).await.unwrap();
        assert_eq!(snapshot.period, 1);

        // A retry once storage is back advances exactly one period.
        state.install_game_store(store).await;
        let snapshot = control_clock(&state, game_id, ClockCommand::EndPeriod)
            .await
            .unwrap();
        assert_eq!(snapshot.period, 2);
    }

    #[tokio::test]
    async fn starting_an_already_claimed_game_is_rejected() {
        let (state, game_id, _, _) = scheduled_state().await;

        // A competing start already holds the live session slot.
        assert!(state.register_live(LiveGame::new(game_id, state.rules())));

        let err = start_game(&state, game_id).await.unwrap_err();
        assert!(matches!(err, ServiceError::GameNotLive(_)));

        // The loser never persisted anything.
        let stored = game_service::get_game(&state, game_id).await.unwrap();
        assert_eq!(stored.status, GameStatus::Scheduled);
    }

    #[tokio::test]
    async fn failed_substitution_journals_neither_half() {
        let (state, game_id, home, _) = live_state().await;
        let store = state.require_game_store().await.unwrap();

        state.clear_game_store().await;
        let err = substitution(
            &state,
            game_id,
            SubstitutionRequest {
                team: TeamSide::Home,
                player_in: home[5],
                player_out: home[0],
                reason: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Degraded));

        state.install_game_store(store).await;
        let journal = game_service::get_actions(&state, game_id, None).await.unwrap();
        assert!(journal.is_empty());

        let snapshot = game_service::get_live_state(&state, game_id).await.unwrap();
        assert!(snapshot.home.on_court.contains(&home[0]));
    }

    #[tokio::test]
    async fn made_field_goal_hands_out_a_fresh_shot_clock() {
        let (state, game_id, home, _) = live_state().await;

        reset_shot_clock(&state, game_id, ResetShotClockRequest { seconds: Some(7) })
            .await
            .unwrap();
        add_action(&state, game_id, shot(TeamSide::Home, ActionType::Made2Pt, home[0]))
            .await
            .unwrap();

        let snapshot = game_service::get_live_state(&state, game_id).await.unwrap();
        assert_eq!(
            snapshot.shot_clock_remaining,
            Some(GameRules::default().shot_clock_seconds)
        );

        // A missed shot leaves the running possession alone.
        reset_shot_clock(&state, game_id, ResetShotClockRequest { seconds: Some(7) })
            .await
            .unwrap();
        add_action(&state, game_id, shot(TeamSide::Home, ActionType::Missed3Pt, home[1]))
            .await
            .unwrap();

        let snapshot = game_service::get_live_state(&state, game_id).await.unwrap();
        assert_eq!(snapshot.shot_clock_remaining, Some(7));
    }

    #[tokio::test]
    async fn substitution_halves_ride_the_journal_event_stream() {
        let (state, game_id, home, _) = live_state().await;
        let live = state.live(game_id).unwrap();
        let mut receiver = live.subscribe();

        substitution(
            &state,
            game_id,
            SubstitutionRequest {
                team: TeamSide::Home,
                player_in: home[5],
                player_out: home[0],
                reason: None,
            },
        )
        .await
        .unwrap();

        let mut seen = Vec::new();
        while let Ok(event) = receiver.try_recv() {
            seen.push(event.event.unwrap_or_default());
        }
        let appended = seen
            .iter()
            .filter(|event_type| *event_type == events::ACTION_ADDED)
            .count();
        assert_eq!(appended, 2);
        assert!(seen.iter().any(|event_type| event_type == events::ROSTER_UPDATED));
    }

    #[tokio::test]
    async fn correcting_a_finished_game_updates_the_stored_result() {
        let (state, game_id, home, _) = live_state().await;

        let three = add_action(
            &state,
            game_id,
            shot(TeamSide::Home, ActionType::Made3Pt, home[0]),
        )
        .await
        .unwrap();
        finish_game(&state, game_id, FinishGameRequest { force: true })
            .await
            .unwrap();

        correct_action(
            &state,
            game_id,
            three.id,
            CorrectActionRequest {
                action_type: Some(ActionType::Made2Pt),
                player_id: None,
                assisted_by_player_id: None,
                reason: "scoresheet review".into(),
            },
        )
        .await
        .unwrap();

        let stored = game_service::get_game(&state, game_id).await.unwrap();
        assert_eq!(stored.home_score, 2);
    }
}
