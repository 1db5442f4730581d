pub mod memory;

use futures::future::BoxFuture;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::dao::changes::ChangeEvent;
use crate::dao::models::{AnswerEntity, GameEntity, ParticipantEntity, QuestionEntity};
use crate::dao::storage::StorageResult;
use crate::state::state_machine::GamePhase;

/// Abstraction over the persistence layer for games, participants, questions
/// and answers, plus the per-game change feed.
///
/// Two contracts carry the engine's whole concurrency story: uniqueness on
/// `(participant, question)` answers and `(game, user)` participants, and the
/// version-checked atomic phase update. Everything else is plain filtered
/// reads and writes.
pub trait GameStore: Send + Sync {
    /// Persist a freshly created game row.
    fn insert_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Point-read a game row.
    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>>;
    /// Atomically move a game to `next` if its version still equals
    /// `expected_version`; returns the updated row or a version conflict.
    fn update_game_phase(
        &self,
        id: Uuid,
        expected_version: u64,
        next: GamePhase,
    ) -> BoxFuture<'static, StorageResult<GameEntity>>;

    /// Insert a participant, enforcing one row per `(game_id, user_id)`.
    fn insert_participant(
        &self,
        participant: ParticipantEntity,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Look a participant up by its stable device identity.
    fn find_participant_by_user(
        &self,
        game_id: Uuid,
        user_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<ParticipantEntity>>>;
    /// All participants of a game.
    fn list_participants(
        &self,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<ParticipantEntity>>>;
    /// Update the team slot of a participant; the only mutable field.
    fn set_participant_team(
        &self,
        participant_id: Uuid,
        team_id: Option<u8>,
    ) -> BoxFuture<'static, StorageResult<()>>;

    /// Insert a whole quiz set at once.
    fn insert_question_set(
        &self,
        questions: Vec<QuestionEntity>,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Ordered question list of a quiz set.
    fn list_questions(
        &self,
        quiz_set_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>>;

    /// Insert an answer, enforcing one row per `(participant_id, question_id)`.
    fn insert_answer(&self, answer: AnswerEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// All answers written by participants of a game.
    fn list_answers(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<AnswerEntity>>>;

    /// Subscribe to mutations of one game row.
    fn watch_game(&self, game_id: Uuid) -> broadcast::Receiver<ChangeEvent<GameEntity>>;
    /// Subscribe to answer inserts within one game.
    fn watch_answers(&self, game_id: Uuid) -> broadcast::Receiver<ChangeEvent<AnswerEntity>>;

    /// Probe that the backend is reachable.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}
