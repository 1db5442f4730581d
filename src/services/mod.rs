//! Business logic of the game engine.

/// Answer recording with the store-enforced idempotency contract.
pub mod answer_service;
/// Aggregated OpenAPI documentation.
pub mod documentation;
/// Host-side game lifecycle and the phase controller.
pub mod game_service;
/// Quiz-generation client and response validation.
pub mod generation_service;
/// On-demand standings aggregation and export.
pub mod leaderboard_service;
/// Participant registration and question serving.
pub mod play_service;
/// Player-side reactive session loop.
pub mod player_session;
/// Pure per-question scoring.
pub mod scoring;
/// Server-Sent Events bridging of the change feed.
pub mod sse_service;
