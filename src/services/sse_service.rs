use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::watch;
use uuid::Uuid;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::{
    dto::{
        scoring::LiveStateSnapshot,
        sse::{Handshake, ServerEvent, SystemStatus},
    },
    error::ServiceError,
    state::SharedState,
};

/// Subscribe to the event stream of a live game.
///
/// The returned handshake carries the current snapshot and the last published
/// sequence number, so the client can render immediately and later detect
/// gaps in the numbered events that follow.
pub async fn subscribe_game(
    state: &SharedState,
    game_id: Uuid,
) -> Result<(broadcast::Receiver<ServerEvent>, Handshake), ServiceError> {
    let live = state
        .live(game_id)
        .ok_or_else(|| ServiceError::NotFound(format!("game {game_id} is not live")))?;

    // Subscribe before snapshotting so nothing published in between is lost;
    // at worst the client sees an event older than the snapshot again.
    let receiver = live.subscribe();
    let snapshot = live.snapshot().await;

    let handshake = Handshake {
        game_id,
        last_sequence: live.current_sequence(),
        degraded: state.is_degraded(),
        snapshot: LiveStateSnapshot::from_state(game_id, &snapshot),
    };

    Ok((receiver, handshake))
}

/// Convert a broadcast receiver into an SSE response, sending the handshake
/// first and forwarding events until the client disconnects. Degraded-mode
/// transitions are interleaved as `system.status` events.
pub fn to_sse_stream(
    mut receiver: broadcast::Receiver<ServerEvent>,
    mut degraded: watch::Receiver<bool>,
    handshake: Handshake,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    // forwarder task: reads from broadcast and pushes into mpsc
    tokio::spawn(async move {
        let game_id = handshake.game_id;
        if let Ok(opening) = ServerEvent::json(Some("handshake".to_string()), &handshake) {
            let mut event = Event::default().data(opening.data);
            if let Some(name) = opening.event {
                event = event.event(name);
            }
            if tx.send(Ok(event)).await.is_err() {
                return;
            }
        }

        loop {
            tokio::select! {
                _ = tx.closed() => break,
                changed = degraded.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let status = SystemStatus {
                        degraded: *degraded.borrow_and_update(),
                    };
                    if let Ok(payload) = ServerEvent::json(Some("system.status".to_string()), &status) {
                        let mut event = Event::default().data(payload.data);
                        if let Some(name) = payload.event {
                            event = event.event(name);
                        }
                        if tx.send(Ok(event)).await.is_err() {
                            break;
                        }
                    }
                }
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            let mut event = Event::default().data(payload.data);
                            if let Some(name) = payload.event {
                                event = event.event(name);
                            }

                            if tx.send(Ok(event)).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(skipped)) => {
                            // The sequence numbers expose the gap; the client
                            // resyncs from the next snapshot-bearing event.
                            tracing::debug!(%game_id, skipped, "SSE subscriber lagged");
                            continue;
                        }
                    }
                }
            }
        }

        tracing::info!(%game_id, "game SSE stream disconnected");
    });

    // response stream reads from mpsc; when client disconnects axum drops this stream
    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
