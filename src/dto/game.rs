use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{ChoiceEntity, GameEntity, ParticipantEntity, QuestionEntity},
    dto::{format_timestamp, validation::validate_nickname},
    state::state_machine::GamePhase,
};

/// Payload used by a host to open a new game session on a quiz set.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateGameRequest {
    /// Quiz set the session will play.
    pub quiz_set_id: Uuid,
    /// Whether participants group into teams.
    #[serde(default)]
    pub team_mode: bool,
    /// Number of selectable teams (2-4); only meaningful in team mode.
    #[serde(default)]
    #[validate(range(min = 2, max = 4))]
    pub max_teams: Option<u8>,
}

/// Flat wire rendering of [`GamePhase`], mirroring the shared game record.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GamePhaseSnapshot {
    /// One of `lobby`, `quiz`, `results`.
    pub phase: &'static str,
    /// 0-based index of the live question; 0 outside the quiz phase.
    pub current_question_sequence: u32,
    /// Whether the live question's answer is revealed.
    pub is_answer_revealed: bool,
}

impl From<GamePhase> for GamePhaseSnapshot {
    fn from(phase: GamePhase) -> Self {
        match phase {
            GamePhase::Lobby => Self {
                phase: "lobby",
                current_question_sequence: 0,
                is_answer_revealed: false,
            },
            GamePhase::Quiz { sequence, revealed } => Self {
                phase: "quiz",
                current_question_sequence: sequence,
                is_answer_revealed: revealed,
            },
            GamePhase::Results => Self {
                phase: "results",
                current_question_sequence: 0,
                is_answer_revealed: false,
            },
        }
    }
}

/// Full public projection of a game row.
#[derive(Debug, Serialize, ToSchema)]
pub struct GameSnapshot {
    /// Game identifier.
    pub id: Uuid,
    /// Quiz set played in this session.
    pub quiz_set_id: Uuid,
    /// Current phase fields.
    #[serde(flatten)]
    pub phase: GamePhaseSnapshot,
    /// Whether team mode is enabled.
    pub team_mode: bool,
    /// Number of selectable teams.
    pub max_teams: u8,
    /// Write counter of the game row.
    pub version: u64,
    /// Creation timestamp, RFC 3339.
    pub created_at: String,
}

impl From<GameEntity> for GameSnapshot {
    fn from(game: GameEntity) -> Self {
        Self {
            id: game.id,
            quiz_set_id: game.quiz_set_id,
            phase: game.phase.into(),
            team_mode: game.team_mode,
            max_teams: game.max_teams,
            version: game.version,
            created_at: format_timestamp(game.created_at),
        }
    }
}

/// Outcome of a phase-transition request.
///
/// `applied: false` means the precondition no longer held (double click or
/// stale timer) and the call was an idempotent no-op.
#[derive(Debug, Serialize, ToSchema)]
pub struct TransitionResponse {
    /// Whether the transition was actually applied by this call.
    pub applied: bool,
    /// Phase of the game after the call, applied or not.
    #[serde(flatten)]
    pub phase: GamePhaseSnapshot,
}

/// Registration payload for a joining device.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct JoinGameRequest {
    /// Stable per-device identity.
    pub user_id: Uuid,
    /// Display name (1-20 characters).
    #[validate(custom(function = "validate_nickname"))]
    pub nickname: String,
    /// Chosen avatar; a random one is assigned when omitted.
    #[serde(default)]
    pub avatar_id: Option<String>,
}

/// Team selection payload; `null` leaves the team.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SelectTeamRequest {
    /// 1-based team slot, or `null` to clear.
    pub team_id: Option<u8>,
}

/// Public projection of a participant.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ParticipantSummary {
    /// Participant identifier.
    pub id: Uuid,
    /// Display name.
    pub nickname: String,
    /// Avatar identifier.
    pub avatar_id: String,
    /// Team slot, if any.
    pub team_id: Option<u8>,
    /// Registration timestamp, RFC 3339.
    pub created_at: String,
}

impl From<ParticipantEntity> for ParticipantSummary {
    fn from(participant: ParticipantEntity) -> Self {
        Self {
            id: participant.id,
            nickname: participant.nickname,
            avatar_id: participant.avatar_id,
            team_id: participant.team_id,
            created_at: format_timestamp(participant.created_at),
        }
    }
}

/// One question as served to registered sessions, choices inline.
#[derive(Debug, Serialize, ToSchema)]
pub struct QuestionView {
    /// Question identifier.
    pub id: Uuid,
    /// Question text.
    pub body: String,
    /// 0-based position within the quiz set.
    pub order: u32,
    /// Authored think time in seconds.
    pub time_limit_secs: u32,
    /// Maximum score for an instant correct answer.
    pub points: u32,
    /// The four choices.
    pub choices: Vec<ChoiceView>,
}

/// One answer choice.
#[derive(Debug, Serialize, ToSchema)]
pub struct ChoiceView {
    /// Choice identifier.
    pub id: Uuid,
    /// Choice text.
    pub body: String,
    /// Whether this choice is the correct one.
    pub is_correct: bool,
}

impl From<ChoiceEntity> for ChoiceView {
    fn from(choice: ChoiceEntity) -> Self {
        Self {
            id: choice.id,
            body: choice.body,
            is_correct: choice.is_correct,
        }
    }
}

impl From<QuestionEntity> for QuestionView {
    fn from(question: QuestionEntity) -> Self {
        Self {
            id: question.id,
            body: question.body,
            order: question.order,
            time_limit_secs: question.time_limit_secs,
            points: question.points,
            choices: question.choices.into_iter().map(Into::into).collect(),
        }
    }
}
