//! Participant-facing routes: join, team selection, questions, answers.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post, put},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::{
        answer::{AnswerAck, SubmitAnswerRequest},
        game::{JoinGameRequest, ParticipantSummary, QuestionView, SelectTeamRequest},
    },
    error::AppError,
    services::{
        answer_service::{self, AnswerOutcome},
        play_service,
    },
    state::SharedState,
};

/// Routes handling participant registration and play.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route(
            "/games/{id}/participants",
            post(join_game).get(list_participants),
        )
        .route(
            "/games/{id}/participants/{participant_id}/team",
            put(select_team),
        )
        .route("/games/{id}/questions", get(game_questions))
        .route("/games/{id}/answers", post(submit_answer))
}

#[utoipa::path(
    post,
    path = "/games/{id}/participants",
    tag = "play",
    params(("id" = Uuid, Path, description = "Game identifier")),
    request_body = JoinGameRequest,
    responses((status = 200, description = "Registered participant", body = ParticipantSummary))
)]
/// Register a device as participant; a duplicate join returns the existing row.
pub async fn join_game(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<JoinGameRequest>>,
) -> Result<Json<ParticipantSummary>, AppError> {
    let participant = play_service::join_game(state.store(), id, payload).await?;
    Ok(Json(participant.into()))
}

#[utoipa::path(
    get,
    path = "/games/{id}/participants",
    tag = "play",
    params(("id" = Uuid, Path, description = "Game identifier")),
    responses((status = 200, description = "Participants in join order", body = [ParticipantSummary]))
)]
/// List the participants of a game in join order.
pub async fn list_participants(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ParticipantSummary>>, AppError> {
    let participants = state
        .store()
        .list_participants(id)
        .await
        .map_err(crate::error::ServiceError::from)?;
    Ok(Json(participants.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    put,
    path = "/games/{id}/participants/{participant_id}/team",
    tag = "play",
    params(
        ("id" = Uuid, Path, description = "Game identifier"),
        ("participant_id" = Uuid, Path, description = "Participant identifier")
    ),
    request_body = SelectTeamRequest,
    responses((status = 204, description = "Team updated"))
)]
/// Pick or clear a team slot while the game sits in the lobby.
pub async fn select_team(
    State(state): State<SharedState>,
    Path((id, participant_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<SelectTeamRequest>,
) -> Result<axum::http::StatusCode, AppError> {
    play_service::select_team(state.store(), id, participant_id, payload.team_id).await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/games/{id}/questions",
    tag = "play",
    params(("id" = Uuid, Path, description = "Game identifier")),
    responses((status = 200, description = "Ordered question set", body = [QuestionView]))
)]
/// Serve the full ordered question set of a game.
pub async fn game_questions(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<QuestionView>>, AppError> {
    let questions = play_service::game_questions(state.store(), id).await?;
    Ok(Json(questions.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/games/{id}/answers",
    tag = "play",
    params(("id" = Uuid, Path, description = "Game identifier")),
    request_body = SubmitAnswerRequest,
    responses((status = 200, description = "Submission acknowledgement", body = AnswerAck))
)]
/// Record an answer; resubmissions acknowledge without overwriting.
pub async fn submit_answer(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<SubmitAnswerRequest>>,
) -> Result<Json<AnswerAck>, AppError> {
    let outcome =
        answer_service::submit_answer(state.store(), state.config().answer_window_ms, id, payload)
            .await?;
    let ack = match outcome {
        AnswerOutcome::Recorded { score } => AnswerAck::Recorded { score },
        AnswerOutcome::AlreadyAnswered => AnswerAck::AlreadyAnswered,
    };
    Ok(Json(ack))
}
