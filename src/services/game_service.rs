//! Game lifecycle outside the live scoring path: scheduling and read-only
//! queries against the stored journal.

use std::time::SystemTime;

use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use uuid::Uuid;

use crate::{
    dao::models::{GameEntity, GameStatus},
    dto::{
        game::{GameSummary, ScheduleGameRequest},
        scoring::{ActionSummary, GameStatistics, LiveStateSnapshot},
    },
    error::ServiceError,
    services::stats_service,
    state::{SharedState, roster},
};

/// Create a new scheduled game with both rosters.
pub async fn schedule_game(
    state: &SharedState,
    request: ScheduleGameRequest,
) -> Result<GameSummary, ServiceError> {
    let store = state.require_game_store().await?;

    let scheduled_at = match request.scheduled_at.as_deref() {
        Some(raw) => parse_timestamp(raw)?,
        None => SystemTime::now(),
    };

    let now = SystemTime::now();
    let game = GameEntity {
        id: Uuid::new_v4(),
        home: request.home.into_entity(),
        away: request.away.into_entity(),
        scheduled_at,
        status: GameStatus::Scheduled,
        started_at: None,
        finished_at: None,
        home_score: 0,
        away_score: 0,
        period_scores: Vec::new(),
        created_at: now,
        updated_at: now,
    };

    roster::validate_team_roster(&game.home)?;
    roster::validate_team_roster(&game.away)?;

    store.save_game(game.clone()).await?;
    Ok(GameSummary::from(&game))
}

/// List all stored games, ordered by tip-off time.
pub async fn list_games(state: &SharedState) -> Result<Vec<GameSummary>, ServiceError> {
    let store = state.require_game_store().await?;
    let games = store.list_games().await?;
    Ok(games.iter().map(GameSummary::from).collect())
}

/// Fetch a single stored game.
pub async fn get_game(state: &SharedState, game_id: Uuid) -> Result<GameSummary, ServiceError> {
    let game = find_game(state, game_id).await?;
    Ok(GameSummary::from(&game))
}

/// Current in-memory snapshot of a game being scored.
pub async fn get_live_state(
    state: &SharedState,
    game_id: Uuid,
) -> Result<LiveStateSnapshot, ServiceError> {
    let live = state
        .live(game_id)
        .ok_or_else(|| ServiceError::NotFound(format!("game {game_id} is not live")))?;
    let snapshot = live.snapshot().await;
    Ok(LiveStateSnapshot::from_state(game_id, &snapshot))
}

/// Journal of a game in recording order, optionally limited to the most
/// recent entries. Soft-deleted entries are included and flagged so
/// correction UIs can show them.
pub async fn get_actions(
    state: &SharedState,
    game_id: Uuid,
    limit: Option<usize>,
) -> Result<Vec<ActionSummary>, ServiceError> {
    let store = state.require_game_store().await?;
    find_game(state, game_id).await?;
    let actions = store.load_actions(game_id).await?;
    let skip = limit.map_or(0, |limit| actions.len().saturating_sub(limit));
    Ok(actions[skip..].iter().map(ActionSummary::from).collect())
}

/// Boxscore derived by replaying the non-deleted journal.
pub async fn get_statistics(
    state: &SharedState,
    game_id: Uuid,
) -> Result<GameStatistics, ServiceError> {
    let store = state.require_game_store().await?;
    let game = find_game(state, game_id).await?;
    let actions = store.load_actions(game_id).await?;
    Ok(stats_service::boxscore(&game, &actions))
}

/// Fetch a game entity, mapping absence to [`ServiceError::NotFound`].
pub(crate) async fn find_game(
    state: &SharedState,
    game_id: Uuid,
) -> Result<GameEntity, ServiceError> {
    let store = state.require_game_store().await?;
    store
        .find_game(game_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("game {game_id} not found")))
}

fn parse_timestamp(raw: &str) -> Result<SystemTime, ServiceError> {
    OffsetDateTime::parse(raw, &Rfc3339)
        .map(SystemTime::from)
        .map_err(|err| ServiceError::InvalidInput(format!("invalid scheduled_at: {err}")))
}
