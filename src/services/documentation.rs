//! OpenAPI document assembly.

use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Courtside Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::game::schedule_game,
        crate::routes::game::list_games,
        crate::routes::game::get_game,
        crate::routes::game::get_live_state,
        crate::routes::game::get_actions,
        crate::routes::game::get_statistics,
        crate::routes::scoring::start_game,
        crate::routes::scoring::add_action,
        crate::routes::scoring::update_score,
        crate::routes::scoring::control_clock,
        crate::routes::scoring::start_timeout,
        crate::routes::scoring::end_timeout,
        crate::routes::scoring::substitution,
        crate::routes::scoring::update_players_on_court,
        crate::routes::scoring::reset_shot_clock,
        crate::routes::scoring::correct_action,
        crate::routes::scoring::delete_action,
        crate::routes::scoring::finish_game,
        crate::routes::sse::game_stream,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::game::ScheduleGameRequest,
            crate::dto::game::GameSummary,
            crate::dto::scoring::ActionInput,
            crate::dto::scoring::UpdateScoreRequest,
            crate::dto::scoring::ClockControlRequest,
            crate::dto::scoring::TimeoutRequest,
            crate::dto::scoring::SubstitutionRequest,
            crate::dto::scoring::CorrectActionRequest,
            crate::dto::scoring::DeleteActionRequest,
            crate::dto::scoring::ResetShotClockRequest,
            crate::dto::scoring::PlayersOnCourtRequest,
            crate::dto::scoring::FinishGameRequest,
            crate::dto::scoring::ActionSummary,
            crate::dto::scoring::LiveStateSnapshot,
            crate::dto::scoring::GameStatistics,
            crate::dto::sse::Handshake,
            crate::dto::sse::GameEventPayload,
            crate::dao::models::ActionType,
            crate::dao::models::TeamSide,
            crate::dao::models::GameStatus,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "games", description = "Game scheduling and read-only queries"),
        (name = "scoring", description = "Live scoring mutations"),
        (name = "sse", description = "Server-sent event streams"),
    )
)]
pub struct ApiDoc;
