use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dto::game::GamePhaseSnapshot;

#[derive(Clone, Debug)]
/// Dispatched payload carried across the per-game SSE stream.
pub struct ServerEvent {
    /// Optional SSE event name.
    pub event: Option<String>,
    /// Serialized JSON data field.
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to an SSE client when it connects.
pub struct Handshake {
    /// Game whose events this stream carries.
    pub game_id: Uuid,
    /// Human-readable message confirming the subscription.
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast whenever the shared game record changes.
pub struct GameChangedEvent {
    /// Game identifier.
    pub game_id: Uuid,
    /// Phase fields after the change.
    #[serde(flatten)]
    pub phase: GamePhaseSnapshot,
    /// Row version after the change.
    pub version: u64,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when an answer row is inserted; scores stay private until reveal.
pub struct AnswerSubmittedEvent {
    /// Participant who answered.
    pub participant_id: Uuid,
    /// Question answered.
    pub question_id: Uuid,
}
