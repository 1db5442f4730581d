//! Wire-facing payloads, separate from storage entities.

pub mod answer;
pub mod game;
pub mod generation;
pub mod health;
pub mod leaderboard;
pub mod sse;
pub mod validation;

use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Format a timestamp for DTOs, falling back to a debug rendering if RFC 3339
/// formatting fails.
pub fn format_timestamp(timestamp: OffsetDateTime) -> String {
    timestamp
        .format(&Rfc3339)
        .unwrap_or_else(|_| format!("{timestamp:?}"))
}
