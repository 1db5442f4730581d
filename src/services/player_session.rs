//! Player-side reactive session.
//!
//! A session is a deterministic function of (local answer history, latest
//! game record): every feed event, lag, or reconnect re-derives the screen
//! from the newest snapshot instead of replaying deltas. Missing any number
//! of intermediate events is therefore harmless, which is exactly what the
//! change feed's at-least-once, unordered delivery requires.

use std::{collections::HashSet, sync::Arc, time::Duration};

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time::{Instant, sleep};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dao::{
        changes::ChangeEvent,
        game_store::GameStore,
        models::{GameEntity, ParticipantEntity, QuestionEntity},
    },
    dto::{answer::SubmitAnswerRequest, game::JoinGameRequest},
    error::ServiceError,
    services::{answer_service, answer_service::AnswerOutcome, play_service},
    state::state_machine::GamePhase,
};

/// Bounded retry policy for the one up-front question fetch.
const FETCH_ATTEMPTS: u32 = 5;
const FETCH_BACKOFF_BASE: Duration = Duration::from_millis(100);

/// What the client renders, derived purely from the latest game snapshot and
/// the local answer history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    /// Waiting for the host to start.
    Lobby,
    /// A question is live.
    Question {
        /// 0-based index of the live question.
        sequence: u32,
        /// Identifier of the live question.
        question_id: Uuid,
        /// Whether this session has already answered it.
        answered: bool,
        /// Whether the correct choice is revealed.
        revealed: bool,
    },
    /// Final standings.
    Results,
}

/// Pure reducer from (game snapshot, question set, local answers) to a screen.
pub fn derive_screen(
    game: &GameEntity,
    questions: &[QuestionEntity],
    answered: &HashSet<Uuid>,
) -> Screen {
    match game.phase {
        GamePhase::Lobby => Screen::Lobby,
        GamePhase::Quiz { sequence, revealed } => match questions.get(sequence as usize) {
            Some(question) => Screen::Question {
                sequence,
                question_id: question.id,
                answered: answered.contains(&question.id),
                revealed,
            },
            // Sequence past the fetched set only happens if the store lost
            // questions under us; render the terminal screen.
            None => Screen::Results,
        },
        GamePhase::Results => Screen::Results,
    }
}

/// One client's view of a live game, kept consistent with the shared record.
pub struct PlayerSession {
    store: Arc<dyn GameStore>,
    participant: ParticipantEntity,
    game_id: Uuid,
    questions: Vec<QuestionEntity>,
    answered: HashSet<Uuid>,
    feed: broadcast::Receiver<ChangeEvent<GameEntity>>,
    answer_window_ms: u32,
    choice_reveal_delay: Duration,
    screen: Screen,
    choices_visible_since: Option<Instant>,
}

impl PlayerSession {
    /// Join a game: register the participant, fetch the full question set
    /// once, subscribe to the change feed, and derive the initial screen.
    ///
    /// The question fetch retries with bounded exponential backoff and then
    /// fails with a typed error; it never loops forever.
    pub async fn join(
        store: Arc<dyn GameStore>,
        config: &AppConfig,
        game_id: Uuid,
        request: JoinGameRequest,
    ) -> Result<Self, ServiceError> {
        let participant = play_service::join_game(&store, game_id, request).await?;

        // Subscribe before the snapshot read so no update can slip between.
        let feed = store.watch_game(game_id);

        let questions = fetch_questions_with_retry(&store, game_id).await?;
        let Some(game) = store.find_game(game_id).await? else {
            return Err(ServiceError::NotFound(format!("game `{game_id}`")));
        };

        // A rejoining device resolves to its existing participant row, so its
        // prior answers are part of the local history from the start.
        let answered: HashSet<Uuid> = store
            .list_answers(game_id)
            .await?
            .into_iter()
            .filter(|answer| answer.participant_id == participant.id)
            .map(|answer| answer.question_id)
            .collect();
        let screen = derive_screen(&game, &questions, &answered);
        let mut session = Self {
            store,
            participant,
            game_id,
            questions,
            answered,
            feed,
            answer_window_ms: config.answer_window_ms,
            choice_reveal_delay: Duration::from_millis(u64::from(config.choice_reveal_delay_ms)),
            screen: Screen::Lobby,
            choices_visible_since: None,
        };
        session.set_screen(screen);
        Ok(session)
    }

    /// The participant row this session registered as.
    pub fn participant(&self) -> &ParticipantEntity {
        &self.participant
    }

    /// The screen currently derived for this session.
    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    /// The question set fetched at join time.
    pub fn questions(&self) -> &[QuestionEntity] {
        &self.questions
    }

    /// Re-read the game record and re-derive the screen.
    ///
    /// This is the whole reconnect story: a session that was away for any
    /// amount of time resumes from the current snapshot, no history needed.
    pub async fn refresh(&mut self) -> Result<Screen, ServiceError> {
        let Some(game) = self.store.find_game(self.game_id).await? else {
            return Err(ServiceError::NotFound(format!("game `{}`", self.game_id)));
        };
        let screen = derive_screen(&game, &self.questions, &self.answered);
        self.set_screen(screen);
        Ok(self.screen.clone())
    }

    /// Wait for the next change-feed event and re-derive the screen from it.
    ///
    /// A lagged receiver falls back to a snapshot refresh: dropped events
    /// carry no information the latest record does not. A closed feed gets a
    /// fresh subscription before the refresh, so the session keeps receiving
    /// future changes.
    pub async fn next_screen(&mut self) -> Result<Screen, ServiceError> {
        match self.feed.recv().await {
            Ok(event) => {
                let screen = derive_screen(&event.row, &self.questions, &self.answered);
                self.set_screen(screen);
                Ok(self.screen.clone())
            }
            Err(RecvError::Lagged(skipped)) => {
                debug!(game_id = %self.game_id, skipped, "feed lagged; refreshing snapshot");
                self.refresh().await
            }
            Err(RecvError::Closed) => {
                warn!(game_id = %self.game_id, "change feed closed; resubscribing");
                self.feed = self.store.watch_game(self.game_id);
                self.refresh().await
            }
        }
    }

    /// Submit the given choice for the live question, measuring elapsed time
    /// from when the choices became visible to this session.
    pub async fn submit(&mut self, choice_id: Uuid) -> Result<AnswerOutcome, ServiceError> {
        let elapsed_ms = self
            .choices_visible_since
            .map(|since| since.elapsed().as_millis() as i64)
            .unwrap_or(0);
        self.submit_with_elapsed(choice_id, elapsed_ms).await
    }

    /// Submit with an explicit elapsed time; the scoring clamp handles any
    /// out-of-range value.
    pub async fn submit_with_elapsed(
        &mut self,
        choice_id: Uuid,
        elapsed_ms: i64,
    ) -> Result<AnswerOutcome, ServiceError> {
        let Screen::Question { question_id, .. } = self.screen else {
            return Err(ServiceError::InvalidState(
                "no question is live for this session".into(),
            ));
        };

        let request = SubmitAnswerRequest {
            participant_id: self.participant.id,
            question_id,
            choice_id,
            elapsed_ms,
        };
        let outcome = answer_service::submit_answer(
            &self.store,
            self.answer_window_ms,
            self.game_id,
            request,
        )
        .await?;

        // Both outcomes mean the question is answered; the local UI state
        // must never claim otherwise after a duplicate submission.
        self.answered.insert(question_id);
        if let Screen::Question { answered, .. } = &mut self.screen {
            *answered = true;
        }
        Ok(outcome)
    }

    fn set_screen(&mut self, screen: Screen) {
        let entered_new_question = match (&self.screen, &screen) {
            (
                Screen::Question {
                    sequence: old_sequence,
                    ..
                },
                Screen::Question { sequence, .. },
            ) => sequence != old_sequence,
            (_, Screen::Question { .. }) => true,
            _ => false,
        };

        if entered_new_question {
            // Choices only become visible once the pre-question countdown
            // runs out; elapsed time (and thus the score) counts from there.
            self.choices_visible_since = Some(Instant::now() + self.choice_reveal_delay);
        }
        self.screen = screen;
    }
}

async fn fetch_questions_with_retry(
    store: &Arc<dyn GameStore>,
    game_id: Uuid,
) -> Result<Vec<QuestionEntity>, ServiceError> {
    let mut delay = FETCH_BACKOFF_BASE;
    let mut last_error = String::new();

    for attempt in 1..=FETCH_ATTEMPTS {
        match play_service::game_questions(store, game_id).await {
            Ok(questions) if !questions.is_empty() => return Ok(questions),
            Ok(_) => last_error = "question set is empty".into(),
            Err(err @ ServiceError::NotFound(_)) => return Err(err),
            Err(err) => last_error = err.to_string(),
        }

        if attempt < FETCH_ATTEMPTS {
            debug!(game_id = %game_id, attempt, error = %last_error, "question fetch failed; backing off");
            sleep(delay).await;
            delay *= 2;
        }
    }

    Err(ServiceError::RetriesExhausted {
        attempts: FETCH_ATTEMPTS,
        message: format!("fetching questions for game `{game_id}`: {last_error}"),
    })
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;

    use crate::dao::models::ChoiceEntity;

    use super::*;

    fn game(phase: GamePhase) -> GameEntity {
        GameEntity {
            id: Uuid::new_v4(),
            quiz_set_id: Uuid::new_v4(),
            phase,
            team_mode: false,
            max_teams: 2,
            version: 0,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    fn questions(count: u32) -> Vec<QuestionEntity> {
        (0..count)
            .map(|order| QuestionEntity {
                id: Uuid::new_v4(),
                quiz_set_id: Uuid::new_v4(),
                body: format!("q{order}"),
                order,
                time_limit_secs: 20,
                points: 1000,
                choices: vec![ChoiceEntity {
                    id: Uuid::new_v4(),
                    body: "a".into(),
                    is_correct: true,
                }],
            })
            .collect()
    }

    #[test]
    fn lobby_and_results_map_directly() {
        let qs = questions(2);
        let answered = HashSet::new();
        assert_eq!(
            derive_screen(&game(GamePhase::Lobby), &qs, &answered),
            Screen::Lobby
        );
        assert_eq!(
            derive_screen(&game(GamePhase::Results), &qs, &answered),
            Screen::Results
        );
    }

    #[test]
    fn quiz_phase_indexes_into_the_local_question_set() {
        let qs = questions(3);
        let answered = HashSet::from([qs[1].id]);

        let screen = derive_screen(
            &game(GamePhase::Quiz {
                sequence: 1,
                revealed: true,
            }),
            &qs,
            &answered,
        );
        assert_eq!(
            screen,
            Screen::Question {
                sequence: 1,
                question_id: qs[1].id,
                answered: true,
                revealed: true,
            }
        );
    }

    #[test]
    fn reducer_only_depends_on_the_latest_snapshot() {
        // A session that saw every intermediate record and one that only saw
        // the final record must render identically.
        let qs = questions(4);
        let answered = HashSet::new();

        let mut phase = GamePhase::Lobby;
        let mut stepped = derive_screen(&game(phase), &qs, &answered);
        for event in [
            crate::state::state_machine::GameEvent::StartGame,
            crate::state::state_machine::GameEvent::RevealAnswer,
            crate::state::state_machine::GameEvent::AdvanceQuestion { total_questions: 4 },
            crate::state::state_machine::GameEvent::RevealAnswer,
            crate::state::state_machine::GameEvent::AdvanceQuestion { total_questions: 4 },
        ] {
            phase = phase.apply(event).unwrap();
            stepped = derive_screen(&game(phase), &qs, &answered);
        }

        let jumped = derive_screen(&game(phase), &qs, &answered);
        assert_eq!(stepped, jumped);
    }

    #[test]
    fn sequence_past_the_set_renders_results() {
        let qs = questions(1);
        let screen = derive_screen(
            &game(GamePhase::Quiz {
                sequence: 9,
                revealed: false,
            }),
            &qs,
            &HashSet::new(),
        );
        assert_eq!(screen, Screen::Results);
    }
}
