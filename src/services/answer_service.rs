use std::sync::Arc;

use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use crate::{
    dao::{
        game_store::GameStore,
        models::{AnswerEntity, QuestionEntity},
        storage::Constraint,
    },
    dto::answer::SubmitAnswerRequest,
    error::ServiceError,
    services::scoring,
};

/// Outcome of an answer submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// The answer was recorded with the given score.
    Recorded {
        /// Score awarded at write time.
        score: u32,
    },
    /// An answer for this (participant, question) pair already exists.
    ///
    /// Not an error: the uniqueness constraint at the store is the only
    /// coordination between racing submissions, and losing the race means
    /// the question is already answered.
    AlreadyAnswered,
}

/// Record exactly one scoring event for a participant on a question.
///
/// Late submissions are scored (down to zero), never rejected for lateness;
/// the clamp in the scoring engine handles skewed elapsed values.
pub async fn submit_answer(
    store: &Arc<dyn GameStore>,
    answer_window_ms: u32,
    game_id: Uuid,
    request: SubmitAnswerRequest,
) -> Result<AnswerOutcome, ServiceError> {
    let Some(game) = store.find_game(game_id).await? else {
        return Err(ServiceError::NotFound(format!("game `{game_id}`")));
    };

    let questions = store.list_questions(game.quiz_set_id).await?;
    let Some(question) = questions.iter().find(|q| q.id == request.question_id) else {
        return Err(ServiceError::NotFound(format!(
            "question `{}` in quiz set `{}`",
            request.question_id, game.quiz_set_id
        )));
    };

    let score = score_choice(question, request.choice_id, request.elapsed_ms, answer_window_ms)?;

    let answer = AnswerEntity {
        participant_id: request.participant_id,
        question_id: request.question_id,
        choice_id: request.choice_id,
        score,
        created_at: OffsetDateTime::now_utc(),
    };

    match store.insert_answer(answer).await {
        Ok(()) => Ok(AnswerOutcome::Recorded { score }),
        Err(err) if err.is_conflict(Constraint::AnswerPerQuestion) => {
            debug!(
                participant_id = %request.participant_id,
                question_id = %request.question_id,
                "duplicate answer submission ignored"
            );
            Ok(AnswerOutcome::AlreadyAnswered)
        }
        Err(err) => Err(err.into()),
    }
}

/// Validate the choice belongs to the question and score it.
pub fn score_choice(
    question: &QuestionEntity,
    choice_id: Uuid,
    elapsed_ms: i64,
    answer_window_ms: u32,
) -> Result<u32, ServiceError> {
    let Some(choice) = question.choices.iter().find(|c| c.id == choice_id) else {
        return Err(ServiceError::InvalidInput(format!(
            "choice `{choice_id}` does not belong to question `{}`",
            question.id
        )));
    };

    Ok(scoring::compute_score(
        choice.is_correct,
        elapsed_ms,
        answer_window_ms,
        question.points,
    ))
}
