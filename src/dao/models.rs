use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::state::state_machine::GamePhase;

/// Persisted game row: the single shared mutable record of a session.
///
/// Written only by the host's phase controller; read by every player session
/// and by the change feed. `version` increments on every phase write and is
/// the compare-and-swap token for atomic updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameEntity {
    /// Primary key of the game.
    pub id: Uuid,
    /// Quiz set played in this session.
    pub quiz_set_id: Uuid,
    /// Current phase including question sequence and reveal flag.
    pub phase: GamePhase,
    /// Whether participants group into teams.
    pub team_mode: bool,
    /// Number of selectable teams when `team_mode` is on (2-4).
    pub max_teams: u8,
    /// Monotonic write counter backing atomic phase updates.
    pub version: u64,
    /// Creation timestamp.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// One joining device in one game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantEntity {
    /// Primary key of the participant.
    pub id: Uuid,
    /// Game this participant belongs to.
    pub game_id: Uuid,
    /// Stable per-device identity; unique within a game.
    pub user_id: Uuid,
    /// Display name.
    pub nickname: String,
    /// Chosen or assigned avatar.
    pub avatar_id: String,
    /// Team slot (1-based) when the game runs in team mode.
    pub team_id: Option<u8>,
    /// Registration timestamp; also the leaderboard tie-breaker.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Immutable question of a quiz set, with its four choices inline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionEntity {
    /// Primary key of the question.
    pub id: Uuid,
    /// Quiz set this question belongs to.
    pub quiz_set_id: Uuid,
    /// Question text.
    pub body: String,
    /// 0-based position within the quiz set.
    pub order: u32,
    /// Configured think time in seconds (authoring-level, not the answer window).
    pub time_limit_secs: u32,
    /// Maximum score awarded for an instant correct answer.
    pub points: u32,
    /// The four answer choices; exactly one is correct.
    pub choices: Vec<ChoiceEntity>,
}

/// One of the four answer choices of a question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoiceEntity {
    /// Primary key of the choice.
    pub id: Uuid,
    /// Choice text.
    pub body: String,
    /// Whether this is the correct choice.
    pub is_correct: bool,
}

impl QuestionEntity {
    /// The single correct choice, if the invariant holds.
    pub fn correct_choice(&self) -> Option<&ChoiceEntity> {
        self.choices.iter().find(|choice| choice.is_correct)
    }
}

/// The atomic unit of player action; inserted once, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerEntity {
    /// Participant who answered.
    pub participant_id: Uuid,
    /// Question answered.
    pub question_id: Uuid,
    /// Choice picked.
    pub choice_id: Uuid,
    /// Score computed at write time.
    pub score: u32,
    /// Insertion timestamp.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
