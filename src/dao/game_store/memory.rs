//! In-memory [`GameStore`] backend.
//!
//! Tables are `DashMap`s and the change feed is a per-game broadcast hub.
//! The backend honours the same contracts a database would: uniqueness
//! constraints surface as [`StorageError::Conflict`] instead of overwriting,
//! and phase updates are version-checked compare-and-swap operations.

use std::sync::Arc;

use dashmap::{DashMap, mapref::entry::Entry};
use futures::future::BoxFuture;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::dao::changes::{ChangeEvent, ChangeKind, FeedHub};
use crate::dao::game_store::GameStore;
use crate::dao::models::{AnswerEntity, GameEntity, ParticipantEntity, QuestionEntity};
use crate::dao::storage::{Constraint, StorageError, StorageResult};
use crate::state::state_machine::GamePhase;

/// Capacity of each per-game change feed channel.
const FEED_CAPACITY: usize = 64;

/// In-memory store; clones share the same tables.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

struct Inner {
    games: DashMap<Uuid, GameEntity>,
    participants: DashMap<Uuid, ParticipantEntity>,
    // Identity index backing the (game_id, user_id) uniqueness constraint.
    participant_identities: DashMap<(Uuid, Uuid), Uuid>,
    question_sets: DashMap<Uuid, Vec<QuestionEntity>>,
    answers: DashMap<(Uuid, Uuid), AnswerEntity>,
    game_feeds: DashMap<Uuid, Arc<FeedHub<GameEntity>>>,
    answer_feeds: DashMap<Uuid, Arc<FeedHub<AnswerEntity>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                games: DashMap::new(),
                participants: DashMap::new(),
                participant_identities: DashMap::new(),
                question_sets: DashMap::new(),
                answers: DashMap::new(),
                game_feeds: DashMap::new(),
                answer_feeds: DashMap::new(),
            }),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Inner {
    fn game_feed(&self, game_id: Uuid) -> Arc<FeedHub<GameEntity>> {
        self.game_feeds
            .entry(game_id)
            .or_insert_with(|| Arc::new(FeedHub::new(FEED_CAPACITY)))
            .clone()
    }

    fn answer_feed(&self, game_id: Uuid) -> Arc<FeedHub<AnswerEntity>> {
        self.answer_feeds
            .entry(game_id)
            .or_insert_with(|| Arc::new(FeedHub::new(FEED_CAPACITY)))
            .clone()
    }

    fn game_of_participant(&self, participant_id: Uuid) -> Option<Uuid> {
        self.participants
            .get(&participant_id)
            .map(|participant| participant.game_id)
    }
}

impl GameStore for MemoryStore {
    fn insert_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let id = game.id;
            let feed = inner.game_feed(id);
            inner.games.insert(id, game.clone());
            feed.publish(ChangeKind::Insert, game);
            Ok(())
        })
    }

    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.games.get(&id).map(|game| game.clone())) })
    }

    fn update_game_phase(
        &self,
        id: Uuid,
        expected_version: u64,
        next: GamePhase,
    ) -> BoxFuture<'static, StorageResult<GameEntity>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let updated = {
                let Some(mut game) = inner.games.get_mut(&id) else {
                    return Err(StorageError::NotFound(format!("game `{id}`")));
                };

                if game.version != expected_version {
                    return Err(StorageError::Conflict(Constraint::GameVersion));
                }

                game.phase = next;
                game.version += 1;
                game.clone()
            };

            inner
                .game_feed(id)
                .publish(ChangeKind::Update, updated.clone());
            Ok(updated)
        })
    }

    fn insert_participant(
        &self,
        participant: ParticipantEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let identity = (participant.game_id, participant.user_id);
            match inner.participant_identities.entry(identity) {
                Entry::Occupied(_) => Err(StorageError::Conflict(Constraint::ParticipantPerGame)),
                Entry::Vacant(slot) => {
                    slot.insert(participant.id);
                    inner.participants.insert(participant.id, participant);
                    Ok(())
                }
            }
        })
    }

    fn find_participant_by_user(
        &self,
        game_id: Uuid,
        user_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<ParticipantEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let Some(id) = inner
                .participant_identities
                .get(&(game_id, user_id))
                .map(|entry| *entry.value())
            else {
                return Ok(None);
            };
            Ok(inner.participants.get(&id).map(|p| p.clone()))
        })
    }

    fn list_participants(
        &self,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<ParticipantEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut participants: Vec<ParticipantEntity> = inner
                .participants
                .iter()
                .filter(|entry| entry.game_id == game_id)
                .map(|entry| entry.clone())
                .collect();
            participants.sort_by_key(|p| (p.created_at, p.id));
            Ok(participants)
        })
    }

    fn set_participant_team(
        &self,
        participant_id: Uuid,
        team_id: Option<u8>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let Some(mut participant) = inner.participants.get_mut(&participant_id) else {
                return Err(StorageError::NotFound(format!(
                    "participant `{participant_id}`"
                )));
            };
            participant.team_id = team_id;
            Ok(())
        })
    }

    fn insert_question_set(
        &self,
        questions: Vec<QuestionEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let Some(quiz_set_id) = questions.first().map(|q| q.quiz_set_id) else {
                return Ok(());
            };
            let mut ordered = questions;
            ordered.sort_by_key(|q| q.order);
            inner.question_sets.insert(quiz_set_id, ordered);
            Ok(())
        })
    }

    fn list_questions(
        &self,
        quiz_set_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            Ok(inner
                .question_sets
                .get(&quiz_set_id)
                .map(|set| set.clone())
                .unwrap_or_default())
        })
    }

    fn insert_answer(&self, answer: AnswerEntity) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let Some(game_id) = inner.game_of_participant(answer.participant_id) else {
                return Err(StorageError::NotFound(format!(
                    "participant `{}`",
                    answer.participant_id
                )));
            };

            let key = (answer.participant_id, answer.question_id);
            match inner.answers.entry(key) {
                Entry::Occupied(_) => Err(StorageError::Conflict(Constraint::AnswerPerQuestion)),
                Entry::Vacant(slot) => {
                    slot.insert(answer.clone());
                    inner
                        .answer_feed(game_id)
                        .publish(ChangeKind::Insert, answer);
                    Ok(())
                }
            }
        })
    }

    fn list_answers(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<AnswerEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut answers: Vec<AnswerEntity> = inner
                .answers
                .iter()
                .filter(|entry| inner.game_of_participant(entry.participant_id) == Some(game_id))
                .map(|entry| entry.clone())
                .collect();
            answers.sort_by_key(|a| (a.created_at, a.participant_id));
            Ok(answers)
        })
    }

    fn watch_game(&self, game_id: Uuid) -> broadcast::Receiver<ChangeEvent<GameEntity>> {
        self.inner.game_feed(game_id).subscribe()
    }

    fn watch_answers(&self, game_id: Uuid) -> broadcast::Receiver<ChangeEvent<AnswerEntity>> {
        self.inner.answer_feed(game_id).subscribe()
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;

    use super::*;

    fn game(id: Uuid) -> GameEntity {
        GameEntity {
            id,
            quiz_set_id: Uuid::new_v4(),
            phase: GamePhase::Lobby,
            team_mode: false,
            max_teams: 2,
            version: 0,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    fn participant(game_id: Uuid, user_id: Uuid) -> ParticipantEntity {
        ParticipantEntity {
            id: Uuid::new_v4(),
            game_id,
            user_id,
            nickname: "ada".into(),
            avatar_id: "cat".into(),
            team_id: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[tokio::test]
    async fn phase_update_is_version_checked() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();
        store.insert_game(game(id)).await.unwrap();

        let next = GamePhase::Quiz {
            sequence: 0,
            revealed: false,
        };
        let updated = store.update_game_phase(id, 0, next).await.unwrap();
        assert_eq!(updated.version, 1);
        assert_eq!(updated.phase, next);

        // Re-running the same CAS must conflict, not double-apply.
        let err = store.update_game_phase(id, 0, next).await.unwrap_err();
        assert!(err.is_conflict(Constraint::GameVersion));
    }

    #[tokio::test]
    async fn duplicate_participant_identity_conflicts() {
        let store = MemoryStore::new();
        let game_id = Uuid::new_v4();
        store.insert_game(game(game_id)).await.unwrap();

        let user_id = Uuid::new_v4();
        store
            .insert_participant(participant(game_id, user_id))
            .await
            .unwrap();
        let err = store
            .insert_participant(participant(game_id, user_id))
            .await
            .unwrap_err();
        assert!(err.is_conflict(Constraint::ParticipantPerGame));

        // Same identity in a different game is a different row.
        let other_game = Uuid::new_v4();
        store.insert_game(game(other_game)).await.unwrap();
        store
            .insert_participant(participant(other_game, user_id))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn duplicate_answer_conflicts_and_keeps_first_row() {
        let store = MemoryStore::new();
        let game_id = Uuid::new_v4();
        store.insert_game(game(game_id)).await.unwrap();
        let p = participant(game_id, Uuid::new_v4());
        let participant_id = p.id;
        store.insert_participant(p).await.unwrap();

        let question_id = Uuid::new_v4();
        let first = AnswerEntity {
            participant_id,
            question_id,
            choice_id: Uuid::new_v4(),
            score: 900,
            created_at: OffsetDateTime::now_utc(),
        };
        store.insert_answer(first.clone()).await.unwrap();

        let second = AnswerEntity {
            score: 1000,
            ..first.clone()
        };
        let err = store.insert_answer(second).await.unwrap_err();
        assert!(err.is_conflict(Constraint::AnswerPerQuestion));

        let answers = store.list_answers(game_id).await.unwrap();
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].score, 900);
    }

    #[tokio::test]
    async fn game_feed_delivers_updates_to_subscribers() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();
        store.insert_game(game(id)).await.unwrap();

        let mut feed = store.watch_game(id);
        let next = GamePhase::Quiz {
            sequence: 0,
            revealed: false,
        };
        store.update_game_phase(id, 0, next).await.unwrap();

        let event = feed.recv().await.unwrap();
        assert_eq!(event.kind, ChangeKind::Update);
        assert_eq!(event.row.phase, next);
    }
}
