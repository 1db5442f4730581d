//! Host-side game lifecycle: creation and the phase controller.
//!
//! Every transition is a read -> validate -> compare-and-swap cycle against
//! the shared game record. A CAS conflict means another trigger won the race;
//! the controller re-reads and, if the precondition no longer holds, reports
//! a no-op instead of an error. That makes redundant triggers (double clicks,
//! stale timers) harmless by construction.

use std::{sync::Arc, time::Duration};

use time::OffsetDateTime;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dao::{game_store::GameStore, models::GameEntity, storage::Constraint},
    dto::game::CreateGameRequest,
    error::ServiceError,
    state::{
        SharedState,
        state_machine::{GameEvent, GamePhase},
    },
};

/// How often a transition retries its CAS before giving up as stale.
const MAX_CAS_ATTEMPTS: u32 = 3;

/// Result of a phase-transition attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The transition was applied; the game is now in this phase.
    Applied(GamePhase),
    /// The precondition no longer held; the game stayed in this phase.
    Stale(GamePhase),
}

impl Transition {
    /// Phase of the game after the call, applied or not.
    pub fn phase(self) -> GamePhase {
        match self {
            Transition::Applied(phase) | Transition::Stale(phase) => phase,
        }
    }

    /// Whether this call actually changed the game record.
    pub fn is_applied(self) -> bool {
        matches!(self, Transition::Applied(_))
    }
}

/// Open a new game session in the lobby phase on an existing quiz set.
pub async fn create_game(
    store: &Arc<dyn GameStore>,
    request: CreateGameRequest,
) -> Result<GameEntity, ServiceError> {
    let questions = store.list_questions(request.quiz_set_id).await?;
    if questions.is_empty() {
        return Err(ServiceError::NotFound(format!(
            "quiz set `{}` is empty or unknown",
            request.quiz_set_id
        )));
    }

    let game = GameEntity {
        id: Uuid::new_v4(),
        quiz_set_id: request.quiz_set_id,
        phase: GamePhase::Lobby,
        team_mode: request.team_mode,
        max_teams: request.max_teams.unwrap_or(2),
        version: 0,
        created_at: OffsetDateTime::now_utc(),
    };

    store.insert_game(game.clone()).await?;
    info!(game_id = %game.id, quiz_set_id = %game.quiz_set_id, "game created");
    Ok(game)
}

/// Start the quiz: lobby -> first question.
///
/// Requires at least one registered participant; that failure surfaces as an
/// error, unlike a redundant start which is a no-op.
pub async fn start_game(
    store: &Arc<dyn GameStore>,
    game_id: Uuid,
) -> Result<Transition, ServiceError> {
    if store.find_game(game_id).await?.is_none() {
        return Err(ServiceError::NotFound(format!("game `{game_id}`")));
    }

    let participants = store.list_participants(game_id).await?;
    if participants.is_empty() {
        return Err(ServiceError::InvalidState(
            "cannot start a game with no participants".into(),
        ));
    }

    run_transition(store, game_id, |_| Some(GameEvent::StartGame)).await
}

/// Reveal the correct choice of the live question, unlocking the leaderboard
/// computation for it.
pub async fn reveal_answer(
    store: &Arc<dyn GameStore>,
    game_id: Uuid,
) -> Result<Transition, ServiceError> {
    run_transition(store, game_id, |_| Some(GameEvent::RevealAnswer)).await
}

/// Move to the next question, or to the results past the last one.
pub async fn advance_question(
    store: &Arc<dyn GameStore>,
    game_id: Uuid,
) -> Result<Transition, ServiceError> {
    let Some(game) = store.find_game(game_id).await? else {
        return Err(ServiceError::NotFound(format!("game `{game_id}`")));
    };
    let total_questions = store.list_questions(game.quiz_set_id).await?.len() as u32;

    run_transition(store, game_id, move |_| {
        Some(GameEvent::AdvanceQuestion { total_questions })
    })
    .await
}

/// Arm a timer that advances past `armed_sequence` after `delay`.
///
/// The fired timer only acts while the game still shows that exact question,
/// revealed. If the host already moved on (manually or via a newer timer),
/// the trigger is a no-op even when a later question happens to be revealed
/// again by then; the armed sequence is what distinguishes the two.
pub fn schedule_auto_advance(
    state: SharedState,
    game_id: Uuid,
    armed_sequence: u32,
    delay: Duration,
) {
    tokio::spawn(async move {
        sleep(delay).await;
        match auto_advance(state.store(), game_id, armed_sequence).await {
            Ok(transition) if transition.is_applied() => {
                info!(game_id = %game_id, "auto-advance applied");
            }
            Ok(_) => {
                debug!(game_id = %game_id, "auto-advance fired stale; ignored");
            }
            Err(err) => {
                warn!(game_id = %game_id, error = %err, "auto-advance failed");
            }
        }
    });
}

/// The timer-driven advance: only fires while the armed question is still the
/// revealed one.
async fn auto_advance(
    store: &Arc<dyn GameStore>,
    game_id: Uuid,
    armed_sequence: u32,
) -> Result<Transition, ServiceError> {
    let Some(game) = store.find_game(game_id).await? else {
        return Err(ServiceError::NotFound(format!("game `{game_id}`")));
    };
    let total_questions = store.list_questions(game.quiz_set_id).await?.len() as u32;

    run_transition(store, game_id, move |game| {
        matches!(
            game.phase,
            GamePhase::Quiz { sequence, revealed: true } if sequence == armed_sequence
        )
        .then_some(GameEvent::AdvanceQuestion { total_questions })
    })
    .await
}

/// Read the game record, compute the next phase, and CAS it in.
///
/// `event_for` may return `None` to report that the trigger is no longer
/// armed for the record it just read; that surfaces as a stale no-op.
async fn run_transition<F>(
    store: &Arc<dyn GameStore>,
    game_id: Uuid,
    event_for: F,
) -> Result<Transition, ServiceError>
where
    F: Fn(&GameEntity) -> Option<GameEvent>,
{
    for attempt in 0..MAX_CAS_ATTEMPTS {
        let Some(game) = store.find_game(game_id).await? else {
            return Err(ServiceError::NotFound(format!("game `{game_id}`")));
        };

        let Some(event) = event_for(&game) else {
            debug!(
                game_id = %game_id,
                phase = ?game.phase,
                "trigger no longer armed for this record; treating as no-op"
            );
            return Ok(Transition::Stale(game.phase));
        };
        let next = match game.phase.apply(event) {
            Ok(next) => next,
            Err(invalid) => {
                debug!(
                    game_id = %game_id,
                    from = ?invalid.from,
                    event = ?invalid.event,
                    "stale transition trigger; treating as no-op"
                );
                return Ok(Transition::Stale(game.phase));
            }
        };

        match store.update_game_phase(game_id, game.version, next).await {
            Ok(updated) => {
                info!(game_id = %game_id, phase = ?updated.phase, "phase transition applied");
                return Ok(Transition::Applied(updated.phase));
            }
            Err(err) if err.is_conflict(Constraint::GameVersion) => {
                // Another trigger won the race; re-read and re-validate.
                debug!(game_id = %game_id, attempt, "phase CAS conflict; re-reading");
                continue;
            }
            Err(err) => return Err(err.into()),
        }
    }

    // Conflicting writers on every attempt: report the latest phase as stale.
    let Some(game) = store.find_game(game_id).await? else {
        return Err(ServiceError::NotFound(format!("game `{game_id}`")));
    };
    Ok(Transition::Stale(game.phase))
}
