use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Payload submitted when a participant locks in a choice.
///
/// `elapsed_ms` is measured on the submitting client from the moment the
/// choices became visible; the scoring engine clamps it, so skewed clocks
/// cannot produce out-of-range scores.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SubmitAnswerRequest {
    /// Participant submitting the answer.
    pub participant_id: Uuid,
    /// Question being answered.
    pub question_id: Uuid,
    /// Choice picked.
    pub choice_id: Uuid,
    /// Milliseconds since the choices became visible to this participant.
    pub elapsed_ms: i64,
}

/// Acknowledgement of an answer submission.
#[derive(Debug, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnswerAck {
    /// The answer was recorded with the given score.
    Recorded {
        /// Score awarded at write time.
        score: u32,
    },
    /// An answer for this (participant, question) pair already exists; the
    /// submission was ignored.
    AlreadyAnswered,
}
