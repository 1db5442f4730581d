//! Host-facing routes: game creation and the phase controller.

use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use axum_valid::Valid;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::game::{CreateGameRequest, GameSnapshot, TransitionResponse},
    error::AppError,
    services::game_service::{self, Transition},
    state::{SharedState, state_machine::GamePhase},
};

/// Optional knob for timer-driven advancing after a reveal.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct RevealRequest {
    /// When true, arm a timer that advances the question automatically.
    #[serde(default)]
    pub auto_advance: bool,
}

/// Routes handling game bootstrap and phase transitions.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/games", post(create_game))
        .route("/games/{id}", get(get_game))
        .route("/games/{id}/start", post(start_game))
        .route("/games/{id}/reveal", post(reveal_answer))
        .route("/games/{id}/advance", post(advance_question))
}

#[utoipa::path(
    post,
    path = "/games",
    tag = "game",
    request_body = CreateGameRequest,
    responses((status = 200, description = "Game created", body = GameSnapshot))
)]
/// Create a fresh game session in the lobby phase.
pub async fn create_game(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CreateGameRequest>>,
) -> Result<Json<GameSnapshot>, AppError> {
    let game = game_service::create_game(state.store(), payload).await?;
    Ok(Json(game.into()))
}

#[utoipa::path(
    get,
    path = "/games/{id}",
    tag = "game",
    params(("id" = Uuid, Path, description = "Game identifier")),
    responses((status = 200, description = "Current game record", body = GameSnapshot))
)]
/// Point-read the shared game record.
pub async fn get_game(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GameSnapshot>, AppError> {
    let Some(game) = state
        .store()
        .find_game(id)
        .await
        .map_err(crate::error::ServiceError::from)?
    else {
        return Err(AppError::NotFound(format!("game `{id}`")));
    };
    Ok(Json(game.into()))
}

#[utoipa::path(
    post,
    path = "/games/{id}/start",
    tag = "game",
    params(("id" = Uuid, Path, description = "Game identifier")),
    responses((status = 200, description = "Transition outcome", body = TransitionResponse))
)]
/// Start the quiz; a redundant start is an idempotent no-op.
pub async fn start_game(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TransitionResponse>, AppError> {
    let transition = game_service::start_game(state.store(), id).await?;
    Ok(Json(to_response(transition)))
}

#[utoipa::path(
    post,
    path = "/games/{id}/reveal",
    tag = "game",
    params(("id" = Uuid, Path, description = "Game identifier")),
    request_body = RevealRequest,
    responses((status = 200, description = "Transition outcome", body = TransitionResponse))
)]
/// Reveal the answer of the live question, optionally arming auto-advance.
pub async fn reveal_answer(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    payload: Option<Json<RevealRequest>>,
) -> Result<Json<TransitionResponse>, AppError> {
    let transition = game_service::reveal_answer(state.store(), id).await?;

    let auto_advance = payload.map(|Json(p)| p.auto_advance).unwrap_or(false);
    if auto_advance
        && transition.is_applied()
        && let GamePhase::Quiz { sequence, .. } = transition.phase()
    {
        let delay = Duration::from_millis(state.config().auto_advance_delay_ms);
        game_service::schedule_auto_advance(state.clone(), id, sequence, delay);
    }

    Ok(Json(to_response(transition)))
}

#[utoipa::path(
    post,
    path = "/games/{id}/advance",
    tag = "game",
    params(("id" = Uuid, Path, description = "Game identifier")),
    responses((status = 200, description = "Transition outcome", body = TransitionResponse))
)]
/// Advance to the next question (or the results); stale triggers no-op.
pub async fn advance_question(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TransitionResponse>, AppError> {
    let transition = game_service::advance_question(state.store(), id).await?;
    Ok(Json(to_response(transition)))
}

fn to_response(transition: Transition) -> TransitionResponse {
    TransitionResponse {
        applied: transition.is_applied(),
        phase: transition.phase().into(),
    }
}
