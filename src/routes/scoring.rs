//! Live scoring mutation endpoints. Every handler funnels into the scoring
//! service, which serialises writes per game.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{patch, post},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::scoring::{
        ActionInput, ActionSummary, ClockControlRequest, CorrectActionRequest,
        DeleteActionRequest, FinishGameRequest, LiveStateSnapshot, PlayersOnCourtRequest,
        ResetShotClockRequest, SubstitutionRequest, TimeoutRequest, UpdateScoreRequest,
    },
    error::AppError,
    services::scoring_service,
    state::SharedState,
};

/// Routes handling live scoring mutations.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/games/{id}/start", post(start_game))
        .route("/games/{id}/actions", post(add_action))
        .route("/games/{id}/score", post(update_score))
        .route("/games/{id}/clock", post(control_clock))
        .route("/games/{id}/timeout", post(start_timeout).delete(end_timeout))
        .route("/games/{id}/substitution", post(substitution))
        .route("/games/{id}/players-on-court", post(update_players_on_court))
        .route("/games/{id}/shot-clock", post(reset_shot_clock))
        .route(
            "/games/{id}/actions/{action_id}",
            patch(correct_action).delete(delete_action),
        )
        .route("/games/{id}/finish", post(finish_game))
}

/// Open a scheduled game for live scoring.
#[utoipa::path(
    post,
    path = "/games/{id}/start",
    tag = "scoring",
    params(("id" = Uuid, Path, description = "Game identifier")),
    responses(
        (status = 200, description = "Game is live", body = LiveStateSnapshot),
        (status = 409, description = "Game already started or finished")
    )
)]
pub async fn start_game(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<LiveStateSnapshot>, AppError> {
    let snapshot = scoring_service::start_game(&state, id).await?;
    Ok(Json(snapshot))
}

/// Append an action to the journal.
#[utoipa::path(
    post,
    path = "/games/{id}/actions",
    tag = "scoring",
    params(("id" = Uuid, Path, description = "Game identifier")),
    request_body = ActionInput,
    responses(
        (status = 200, description = "Action recorded", body = ActionSummary),
        (status = 409, description = "Game not live or roster constraint violated")
    )
)]
pub async fn add_action(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ActionInput>,
) -> Result<Json<ActionSummary>, AppError> {
    payload.validate()?;
    let summary = scoring_service::add_action(&state, id, payload).await?;
    Ok(Json(summary))
}

/// Record a made shot from a bare point value.
#[utoipa::path(
    post,
    path = "/games/{id}/score",
    tag = "scoring",
    params(("id" = Uuid, Path, description = "Game identifier")),
    request_body = UpdateScoreRequest,
    responses((status = 200, description = "Shot recorded", body = ActionSummary))
)]
pub async fn update_score(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateScoreRequest>,
) -> Result<Json<ActionSummary>, AppError> {
    payload.validate()?;
    let summary = scoring_service::update_score(&state, id, payload).await?;
    Ok(Json(summary))
}

/// Drive the period clock.
#[utoipa::path(
    post,
    path = "/games/{id}/clock",
    tag = "scoring",
    params(("id" = Uuid, Path, description = "Game identifier")),
    request_body = ClockControlRequest,
    responses(
        (status = 200, description = "Clock updated", body = LiveStateSnapshot),
        (status = 409, description = "Transition not legal from the current phase")
    )
)]
pub async fn control_clock(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ClockControlRequest>,
) -> Result<Json<LiveStateSnapshot>, AppError> {
    let snapshot = scoring_service::control_clock(&state, id, payload.command).await?;
    Ok(Json(snapshot))
}

/// Start a team timeout.
#[utoipa::path(
    post,
    path = "/games/{id}/timeout",
    tag = "scoring",
    params(("id" = Uuid, Path, description = "Game identifier")),
    request_body = TimeoutRequest,
    responses(
        (status = 200, description = "Timeout started", body = LiveStateSnapshot),
        (status = 409, description = "Timeout pool exhausted or clock not running")
    )
)]
pub async fn start_timeout(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TimeoutRequest>,
) -> Result<Json<LiveStateSnapshot>, AppError> {
    payload.validate()?;
    let snapshot = scoring_service::start_timeout(&state, id, payload).await?;
    Ok(Json(snapshot))
}

/// End the running timeout.
#[utoipa::path(
    delete,
    path = "/games/{id}/timeout",
    tag = "scoring",
    params(("id" = Uuid, Path, description = "Game identifier")),
    responses((status = 200, description = "Timeout ended", body = LiveStateSnapshot))
)]
pub async fn end_timeout(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<LiveStateSnapshot>, AppError> {
    let snapshot = scoring_service::end_timeout(&state, id).await?;
    Ok(Json(snapshot))
}

/// Swap one player for another.
#[utoipa::path(
    post,
    path = "/games/{id}/substitution",
    tag = "scoring",
    params(("id" = Uuid, Path, description = "Game identifier")),
    request_body = SubstitutionRequest,
    responses(
        (status = 200, description = "Substitution recorded", body = [ActionSummary]),
        (status = 409, description = "Roster constraint violated")
    )
)]
pub async fn substitution(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SubstitutionRequest>,
) -> Result<Json<Vec<ActionSummary>>, AppError> {
    payload.validate()?;
    let summaries = scoring_service::substitution(&state, id, payload).await?;
    Ok(Json(summaries))
}

/// Replace a team's full five-player lineup.
#[utoipa::path(
    post,
    path = "/games/{id}/players-on-court",
    tag = "scoring",
    params(("id" = Uuid, Path, description = "Game identifier")),
    request_body = PlayersOnCourtRequest,
    responses(
        (status = 200, description = "Lineup updated", body = LiveStateSnapshot),
        (status = 409, description = "Lineup violates roster constraints")
    )
)]
pub async fn update_players_on_court(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PlayersOnCourtRequest>,
) -> Result<Json<LiveStateSnapshot>, AppError> {
    payload.validate()?;
    let snapshot = scoring_service::update_players_on_court(&state, id, payload).await?;
    Ok(Json(snapshot))
}

/// Reset the shot clock.
#[utoipa::path(
    post,
    path = "/games/{id}/shot-clock",
    tag = "scoring",
    params(("id" = Uuid, Path, description = "Game identifier")),
    request_body = ResetShotClockRequest,
    responses((status = 200, description = "Shot clock reset", body = LiveStateSnapshot))
)]
pub async fn reset_shot_clock(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ResetShotClockRequest>,
) -> Result<Json<LiveStateSnapshot>, AppError> {
    payload.validate()?;
    let snapshot = scoring_service::reset_shot_clock(&state, id, payload).await?;
    Ok(Json(snapshot))
}

/// Correct a journal entry in place.
#[utoipa::path(
    patch,
    path = "/games/{id}/actions/{action_id}",
    tag = "scoring",
    params(
        ("id" = Uuid, Path, description = "Game identifier"),
        ("action_id" = Uuid, Path, description = "Journal entry identifier")
    ),
    request_body = CorrectActionRequest,
    responses(
        (status = 200, description = "Action corrected", body = ActionSummary),
        (status = 404, description = "Unknown action")
    )
)]
pub async fn correct_action(
    State(state): State<SharedState>,
    Path((id, action_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<CorrectActionRequest>,
) -> Result<Json<ActionSummary>, AppError> {
    payload.validate()?;
    let summary = scoring_service::correct_action(&state, id, action_id, payload).await?;
    Ok(Json(summary))
}

/// Soft-delete a journal entry.
#[utoipa::path(
    delete,
    path = "/games/{id}/actions/{action_id}",
    tag = "scoring",
    params(
        ("id" = Uuid, Path, description = "Game identifier"),
        ("action_id" = Uuid, Path, description = "Journal entry identifier")
    ),
    request_body = DeleteActionRequest,
    responses(
        (status = 200, description = "Action deleted", body = ActionSummary),
        (status = 404, description = "Unknown action")
    )
)]
pub async fn delete_action(
    State(state): State<SharedState>,
    Path((id, action_id)): Path<(Uuid, Uuid)>,
    payload: Option<Json<DeleteActionRequest>>,
) -> Result<Json<ActionSummary>, AppError> {
    let reason = payload.and_then(|Json(body)| body.reason);
    let summary = scoring_service::delete_action(&state, id, action_id, reason).await?;
    Ok(Json(summary))
}

/// Close out a game and persist the final score.
#[utoipa::path(
    post,
    path = "/games/{id}/finish",
    tag = "scoring",
    params(("id" = Uuid, Path, description = "Game identifier")),
    request_body = FinishGameRequest,
    responses(
        (status = 200, description = "Game finished", body = LiveStateSnapshot),
        (status = 409, description = "Game cannot finish from the current phase")
    )
)]
pub async fn finish_game(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    payload: Option<Json<FinishGameRequest>>,
) -> Result<Json<LiveStateSnapshot>, AppError> {
    let request = payload.map(|Json(body)| body).unwrap_or_default();
    let snapshot = scoring_service::finish_game(&state, id, request).await?;
    Ok(Json(snapshot))
}
