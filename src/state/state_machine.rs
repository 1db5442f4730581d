use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse-grained phase of a game session.
///
/// The quiz phase carries the per-question progress so that a single value
/// describes everything a client needs to render: which question is live and
/// whether its answer has been revealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum GamePhase {
    /// Players are registering; the host has not started the quiz yet.
    Lobby,
    /// A question is live.
    Quiz {
        /// 0-based index of the current question.
        sequence: u32,
        /// Whether the correct choice has been revealed for this question.
        revealed: bool,
    },
    /// Final standings are displayed; terminal.
    Results,
}

/// Events the host-side phase controller can apply to a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    /// Leave the lobby and show the first question.
    StartGame,
    /// Reveal the correct choice for the current question.
    RevealAnswer,
    /// Move to the next question, or to the results past the last one.
    AdvanceQuestion {
        /// Total number of questions in the quiz set.
        total_questions: u32,
    },
}

/// Error returned when an event cannot be applied from the current phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the game was in when the invalid event was received.
    pub from: GamePhase,
    /// The event that cannot be applied from this phase.
    pub event: GameEvent,
}

impl GamePhase {
    /// Compute the phase that follows `event`, rejecting illegal transitions.
    ///
    /// The table is monotonic: lobby -> quiz -> results, the question
    /// sequence never decreases, and [`GamePhase::Results`] is terminal.
    pub fn apply(self, event: GameEvent) -> Result<GamePhase, InvalidTransition> {
        let next = match (self, event) {
            (GamePhase::Lobby, GameEvent::StartGame) => GamePhase::Quiz {
                sequence: 0,
                revealed: false,
            },
            (
                GamePhase::Quiz {
                    sequence,
                    revealed: false,
                },
                GameEvent::RevealAnswer,
            ) => GamePhase::Quiz {
                sequence,
                revealed: true,
            },
            (
                GamePhase::Quiz {
                    sequence,
                    revealed: true,
                },
                GameEvent::AdvanceQuestion { total_questions },
            ) => {
                if sequence + 1 < total_questions {
                    GamePhase::Quiz {
                        sequence: sequence + 1,
                        revealed: false,
                    }
                } else {
                    GamePhase::Results
                }
            }
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }

    /// Whether the game has reached its terminal phase.
    pub fn is_terminal(self) -> bool {
        matches!(self, GamePhase::Results)
    }

    /// Rank used to assert phase monotonicity; later phases rank higher.
    pub fn rank(self) -> u8 {
        match self {
            GamePhase::Lobby => 0,
            GamePhase::Quiz { .. } => 1,
            GamePhase::Results => 2,
        }
    }
}
