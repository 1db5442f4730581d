//! Quiz generation passthrough route.

use axum::{Json, Router, extract::State, routing::post};
use axum_valid::Valid;

use crate::{
    dto::generation::{GenerateQuizRequest, GeneratedQuizSummary},
    error::AppError,
    services::generation_service,
    state::SharedState,
};

/// Routes handling AI quiz generation.
pub fn router() -> Router<SharedState> {
    Router::new().route("/quiz-sets/generate", post(generate_quiz_set))
}

#[utoipa::path(
    post,
    path = "/quiz-sets/generate",
    tag = "generation",
    request_body = GenerateQuizRequest,
    responses(
        (status = 200, description = "Generated quiz set accepted", body = GeneratedQuizSummary),
        (status = 502, description = "Generation service failed or returned an invalid set")
    )
)]
/// Ask the generation service for a quiz set, validate it, and store it whole.
pub async fn generate_quiz_set(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<GenerateQuizRequest>>,
) -> Result<Json<GeneratedQuizSummary>, AppError> {
    let summary = generation_service::generate_quiz_set(&state, payload).await?;
    Ok(Json(summary))
}
