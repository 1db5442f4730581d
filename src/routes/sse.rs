//! SSE route exposing the per-game change feed.

use std::convert::Infallible;

use axum::{
    Router,
    extract::{Path, State},
    response::sse::{Event, Sse},
    routing::get,
};
use futures::Stream;
use uuid::Uuid;

use crate::{services::sse_service, state::SharedState};

/// Routes streaming live game events.
pub fn router() -> Router<SharedState> {
    Router::new().route("/games/{id}/events", get(game_events))
}

#[utoipa::path(
    get,
    path = "/games/{id}/events",
    tag = "sse",
    params(("id" = Uuid, Path, description = "Game identifier")),
    responses((status = 200, description = "SSE stream of game-record updates and answer inserts"))
)]
/// Open an SSE stream re-broadcasting the game's change feed.
pub async fn game_events(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    sse_service::game_event_stream(&state, id)
}
