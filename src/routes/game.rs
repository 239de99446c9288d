//! Game scheduling and read-only query endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        game::{GameSummary, ScheduleGameRequest},
        scoring::{ActionSummary, GameStatistics, LiveStateSnapshot},
    },
    error::AppError,
    services::game_service,
    state::SharedState,
};

/// Routes handling game scheduling and read-only queries.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/games", post(schedule_game).get(list_games))
        .route("/games/{id}", get(get_game))
        .route("/games/{id}/live", get(get_live_state))
        .route("/games/{id}/actions", get(get_actions))
        .route("/games/{id}/statistics", get(get_statistics))
}

/// Schedule a new game with both rosters.
#[utoipa::path(
    post,
    path = "/games",
    tag = "games",
    request_body = ScheduleGameRequest,
    responses(
        (status = 200, description = "Game scheduled", body = GameSummary),
        (status = 400, description = "Invalid rosters")
    )
)]
pub async fn schedule_game(
    State(state): State<SharedState>,
    Json(payload): Json<ScheduleGameRequest>,
) -> Result<Json<GameSummary>, AppError> {
    payload.validate()?;
    let summary = game_service::schedule_game(&state, payload).await?;
    Ok(Json(summary))
}

/// List every stored game.
#[utoipa::path(
    get,
    path = "/games",
    tag = "games",
    responses((status = 200, description = "Stored games", body = [GameSummary]))
)]
pub async fn list_games(
    State(state): State<SharedState>,
) -> Result<Json<Vec<GameSummary>>, AppError> {
    let games = game_service::list_games(&state).await?;
    Ok(Json(games))
}

/// Fetch one stored game.
#[utoipa::path(
    get,
    path = "/games/{id}",
    tag = "games",
    params(("id" = Uuid, Path, description = "Game identifier")),
    responses(
        (status = 200, description = "Stored game", body = GameSummary),
        (status = 404, description = "Unknown game")
    )
)]
pub async fn get_game(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GameSummary>, AppError> {
    let summary = game_service::get_game(&state, id).await?;
    Ok(Json(summary))
}

/// Current in-memory snapshot of a live game.
#[utoipa::path(
    get,
    path = "/games/{id}/live",
    tag = "games",
    params(("id" = Uuid, Path, description = "Game identifier")),
    responses(
        (status = 200, description = "Live snapshot", body = LiveStateSnapshot),
        (status = 404, description = "Game is not live")
    )
)]
pub async fn get_live_state(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<LiveStateSnapshot>, AppError> {
    let snapshot = game_service::get_live_state(&state, id).await?;
    Ok(Json(snapshot))
}

/// Query string accepted by the action journal endpoint.
#[derive(Debug, Deserialize)]
pub struct ActionsQuery {
    /// Return only the most recent `limit` entries.
    pub limit: Option<usize>,
}

/// Action journal of a game in recording order, most recent last.
#[utoipa::path(
    get,
    path = "/games/{id}/actions",
    tag = "games",
    params(
        ("id" = Uuid, Path, description = "Game identifier"),
        ("limit" = Option<usize>, Query, description = "Return only the most recent entries")
    ),
    responses((status = 200, description = "Action journal", body = [ActionSummary]))
)]
pub async fn get_actions(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ActionsQuery>,
) -> Result<Json<Vec<ActionSummary>>, AppError> {
    let actions = game_service::get_actions(&state, id, query.limit).await?;
    Ok(Json(actions))
}

/// Boxscore derived from the non-deleted journal entries.
#[utoipa::path(
    get,
    path = "/games/{id}/statistics",
    tag = "games",
    params(("id" = Uuid, Path, description = "Game identifier")),
    responses((status = 200, description = "Boxscore", body = GameStatistics))
)]
pub async fn get_statistics(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GameStatistics>, AppError> {
    let statistics = game_service::get_statistics(&state, id).await?;
    Ok(Json(statistics))
}
