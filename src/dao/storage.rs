use std::error::Error;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Uniqueness or compare-and-swap constraints a backend can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    /// One answer per (participant, question) pair.
    AnswerPerQuestion,
    /// One participant per (game, user) pair.
    ParticipantPerGame,
    /// The game row changed since it was read (version mismatch).
    GameVersion,
}

/// Error raised by storage backends regardless of the underlying database.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be reached or failed internally.
    #[error("storage unavailable: {message}")]
    Unavailable {
        /// Human-readable description of the failure.
        message: String,
        /// Underlying backend error.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// A uniqueness constraint or atomic update precondition was violated.
    ///
    /// Expected and recoverable: duplicate answers and duplicate joins are
    /// detected through this variant, never by overwriting rows.
    #[error("constraint violated: {0:?}")]
    Conflict(Constraint),
    /// The referenced row does not exist.
    #[error("not found: {0}")]
    NotFound(String),
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }

    /// Whether this error is a violation of `constraint`.
    pub fn is_conflict(&self, constraint: Constraint) -> bool {
        matches!(self, StorageError::Conflict(c) if *c == constraint)
    }
}
