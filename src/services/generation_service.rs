//! Client for the external quiz-generation service, plus the shape
//! validation that gates generated questions before insertion.

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::models::{ChoiceEntity, QuestionEntity},
    dto::generation::{GenerateQuizRequest, GeneratedQuestion, GeneratedQuizSummary, GenerationResponse},
    error::ServiceError,
    state::SharedState,
};

/// Bounds the generation service promises for each question.
const CHOICES_PER_QUESTION: usize = 4;
const TIME_LIMIT_RANGE: std::ops::RangeInclusive<u32> = 10..=30;
const POINTS_RANGE: std::ops::RangeInclusive<u32> = 500..=2000;
const MAX_QUESTIONS: usize = 10;

/// Call the generation service and, if the whole response validates, insert
/// the questions as a fresh quiz set.
///
/// Validation is all-or-nothing: a single malformed question fails the whole
/// attempt and nothing is inserted.
pub async fn generate_quiz_set(
    state: &SharedState,
    request: GenerateQuizRequest,
) -> Result<GeneratedQuizSummary, ServiceError> {
    let Some(config) = state.config().generation.as_ref() else {
        return Err(ServiceError::InvalidState(
            "quiz generation is not configured".into(),
        ));
    };

    let mut call = state.http().post(&config.url).json(&request);
    if let Some(key) = config.api_key.as_deref() {
        call = call.bearer_auth(key);
    }

    let response = call
        .send()
        .await
        .map_err(|err| ServiceError::Upstream(err.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ServiceError::Upstream(format!(
            "generation service answered {status}"
        )));
    }

    let payload: GenerationResponse = response
        .json()
        .await
        .map_err(|err| ServiceError::Upstream(format!("malformed response body: {err}")))?;

    if !payload.success {
        let message = payload.error.unwrap_or_else(|| "unknown failure".into());
        warn!(error = %message, "generation service reported failure");
        return Err(ServiceError::Upstream(message));
    }

    validate_generated(&payload.questions)?;

    let quiz_set_id = Uuid::new_v4();
    let questions = into_question_set(quiz_set_id, payload.questions);
    let question_count = questions.len() as u32;
    state.store().insert_question_set(questions).await?;

    info!(%quiz_set_id, question_count, "generated quiz set accepted");
    Ok(GeneratedQuizSummary {
        quiz_set_id,
        question_count,
    })
}

/// Validate the exact shape the generation contract promises.
pub fn validate_generated(questions: &[GeneratedQuestion]) -> Result<(), ServiceError> {
    if questions.is_empty() {
        return Err(ServiceError::InvalidInput(
            "generation returned no questions".into(),
        ));
    }
    if questions.len() > MAX_QUESTIONS {
        return Err(ServiceError::InvalidInput(format!(
            "generation returned {} questions (limit {MAX_QUESTIONS})",
            questions.len()
        )));
    }

    for (index, question) in questions.iter().enumerate() {
        validate_question(question).map_err(|message| {
            ServiceError::InvalidInput(format!("question {}: {message}", index + 1))
        })?;
    }

    Ok(())
}

fn validate_question(question: &GeneratedQuestion) -> Result<(), String> {
    if question.body.trim().is_empty() {
        return Err("body is empty".into());
    }

    if question.choices.len() != CHOICES_PER_QUESTION {
        return Err(format!(
            "expected {CHOICES_PER_QUESTION} choices, got {}",
            question.choices.len()
        ));
    }

    if question.choices.iter().any(|c| c.body.trim().is_empty()) {
        return Err("a choice body is empty".into());
    }

    let correct_count = question.choices.iter().filter(|c| c.is_correct).count();
    if correct_count != 1 {
        return Err(format!(
            "expected exactly 1 correct choice, got {correct_count}"
        ));
    }

    if !TIME_LIMIT_RANGE.contains(&question.time_limit) {
        return Err(format!(
            "time limit {}s outside {}-{}s",
            question.time_limit,
            TIME_LIMIT_RANGE.start(),
            TIME_LIMIT_RANGE.end()
        ));
    }

    if !POINTS_RANGE.contains(&question.points) {
        return Err(format!(
            "points {} outside {}-{}",
            question.points,
            POINTS_RANGE.start(),
            POINTS_RANGE.end()
        ));
    }

    Ok(())
}

fn into_question_set(quiz_set_id: Uuid, questions: Vec<GeneratedQuestion>) -> Vec<QuestionEntity> {
    questions
        .into_iter()
        .enumerate()
        .map(|(order, question)| QuestionEntity {
            id: Uuid::new_v4(),
            quiz_set_id,
            body: question.body,
            order: order as u32,
            time_limit_secs: question.time_limit,
            points: question.points,
            choices: question
                .choices
                .into_iter()
                .map(|choice| ChoiceEntity {
                    id: Uuid::new_v4(),
                    body: choice.body,
                    is_correct: choice.is_correct,
                })
                .collect(),
        })
        .collect()
}
