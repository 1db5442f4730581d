//! Per-game SSE stream: the HTTP face of the change feed.

use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dto::sse::{AnswerSubmittedEvent, GameChangedEvent, Handshake, ServerEvent},
    state::SharedState,
};

const EVENT_HANDSHAKE: &str = "handshake";
const EVENT_GAME_CHANGED: &str = "game.changed";
const EVENT_ANSWER_SUBMITTED: &str = "answer.submitted";

/// Subscribe to a game's change feeds and forward them as one SSE response.
///
/// Lagged broadcast receivers skip ahead instead of closing: clients are
/// snapshot-driven, so dropped intermediate events are harmless to them.
pub fn game_event_stream(
    state: &SharedState,
    game_id: Uuid,
) -> Sse<impl Stream<Item = Result<Event, Infallible>> + use<>> {
    Sse::new(change_event_stream(state, game_id)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

// `use<>`: the returned stream owns its receivers and must not capture the
// `&SharedState` borrow.
fn change_event_stream(
    state: &SharedState,
    game_id: Uuid,
) -> impl Stream<Item = Result<Event, Infallible>> + use<> {
    let mut games = state.store().watch_game(game_id);
    let mut answers = state.store().watch_answers(game_id);

    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    send_handshake(&tx, game_id);

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv = games.recv() => {
                    match recv {
                        Ok(change) => {
                            let payload = GameChangedEvent {
                                game_id,
                                phase: change.row.phase.into(),
                                version: change.row.version,
                            };
                            if forward(&tx, EVENT_GAME_CHANGED, &payload).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Lagged(_)) => continue,
                        Err(RecvError::Closed) => break,
                    }
                }
                recv = answers.recv() => {
                    match recv {
                        Ok(change) => {
                            let payload = AnswerSubmittedEvent {
                                participant_id: change.row.participant_id,
                                question_id: change.row.question_id,
                            };
                            if forward(&tx, EVENT_ANSWER_SUBMITTED, &payload).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Lagged(_)) => continue,
                        Err(RecvError::Closed) => break,
                    }
                }
            }
        }
        info!(game_id = %game_id, "game SSE stream disconnected");
    });

    ReceiverStream::new(rx)
}

fn send_handshake(tx: &mpsc::Sender<Result<Event, Infallible>>, game_id: Uuid) {
    let handshake = Handshake {
        game_id,
        message: "game stream connected".into(),
    };
    match ServerEvent::json(Some(EVENT_HANDSHAKE.to_string()), &handshake) {
        Ok(event) => {
            let _ = tx.try_send(Ok(to_sse_event(event)));
        }
        Err(err) => warn!(error = %err, "failed to serialize SSE handshake"),
    }
}

async fn forward(
    tx: &mpsc::Sender<Result<Event, Infallible>>,
    name: &str,
    payload: &impl serde::Serialize,
) -> Result<(), ()> {
    match ServerEvent::json(Some(name.to_string()), payload) {
        Ok(event) => tx.send(Ok(to_sse_event(event))).await.map_err(|_| ()),
        Err(err) => {
            warn!(event = name, error = %err, "failed to serialize SSE payload");
            Ok(())
        }
    }
}

fn to_sse_event(payload: ServerEvent) -> Event {
    let mut event = Event::default().data(payload.data);
    if let Some(name) = payload.event {
        event = event.event(name);
    }
    event
}
