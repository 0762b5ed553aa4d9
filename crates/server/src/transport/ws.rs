// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket transport: one task per connection owning the socket and the
//! session's bounded outbound queue.
//!
//! Inbound frames are processed FIFO per connection. Malformed or unknown
//! frames, messages sent before a join, and repeat joins are dropped with a
//! debug log — never an error to the peer, never a reason to close the
//! connection. All exits from the loop (explicit leave, close frame, socket
//! error, shutdown) funnel into the same teardown path, which is idempotent
//! against a racing delivery-failure teardown. A teardown that starts off
//! this task cancels the session's close signal, which ends the loop here
//! and shuts the socket.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::protocol::{parse_frame, Broadcast, InboundFrame, PresenceKind};
use crate::registry::Session;
use crate::state::AppState;

/// `GET /ws` — WebSocket upgrade for a chat connection.
pub async fn ws_handler(
    State(state): State<Arc<AppState>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_connection(state, socket))
}

/// What to do after processing one inbound frame.
#[derive(Debug, PartialEq, Eq)]
enum FrameOutcome {
    Continue,
    /// Explicit leave: close the connection.
    Close,
}

/// Per-connection event loop.
async fn handle_connection(state: Arc<AppState>, socket: WebSocket) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<Broadcast>(state.config.send_queue);

    // Cancelled by the registry when this connection's session is removed,
    // including removals initiated off this task (delivery failure).
    let closed = CancellationToken::new();

    // None until a valid join frame arrives.
    let mut session: Option<Arc<Session>> = None;

    loop {
        tokio::select! {
            _ = state.shutdown.cancelled() => break,

            _ = closed.cancelled() => break,

            // Broadcasts queued for this member.
            frame = outbound_rx.recv() => {
                // The sender side lives in the registry; it only drops once
                // the session is gone, so a closed queue means torn down.
                let Some(frame) = frame else { break };
                let Ok(json) = serde_json::to_string(&frame) else { continue };
                if ws_tx.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }

            // Inbound frames from the peer.
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let outcome =
                            handle_frame(&state, &outbound_tx, &closed, &mut session, &text).await;
                        if outcome == FrameOutcome::Close {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    _ => {}
                }
            }
        }
    }

    if let Some(ref session) = session {
        state.router.teardown(session).await;
    }
}

/// Process one inbound text frame against the current session state.
async fn handle_frame(
    state: &AppState,
    outbound_tx: &mpsc::Sender<Broadcast>,
    closed: &CancellationToken,
    session: &mut Option<Arc<Session>>,
    text: &str,
) -> FrameOutcome {
    match parse_frame(text) {
        InboundFrame::Join(data) => {
            if let Some(ref existing) = session {
                tracing::debug!(session = %existing.id, "repeat join on live connection, dropping");
                return FrameOutcome::Continue;
            }
            let join =
                state.registry.join(&data.room, &data.name, outbound_tx.clone(), closed.clone());
            match join.await {
                Ok(joined) => {
                    tracing::info!(
                        room = %joined.room,
                        name = %joined.name,
                        session = %joined.id,
                        "session joined"
                    );
                    state.router.route_presence(&joined, PresenceKind::Joined).await;
                    *session = Some(joined);
                }
                Err(e) => {
                    // The legacy protocol has no error frame; log and drop.
                    tracing::debug!(room = %data.room, err = %e, "join rejected");
                }
            }
            FrameOutcome::Continue
        }
        InboundFrame::Message(data) => {
            let Some(ref sender) = session else {
                tracing::debug!("message before join, dropping");
                return FrameOutcome::Continue;
            };
            if sender.has_left() {
                tracing::debug!(session = %sender.id, "message from torn-down session, dropping");
                return FrameOutcome::Close;
            }
            let text = data.message.trim();
            if text.is_empty() {
                tracing::debug!(session = %sender.id, "empty message, dropping");
                return FrameOutcome::Continue;
            }
            state.router.route_message(sender, text, &data.receiver).await;
            FrameOutcome::Continue
        }
        InboundFrame::Leave(_) => {
            if session.is_some() {
                FrameOutcome::Close
            } else {
                tracing::debug!("leave before join, dropping");
                FrameOutcome::Continue
            }
        }
        InboundFrame::Unknown => {
            tracing::debug!(len = text.len(), "unparsable frame, dropping");
            FrameOutcome::Continue
        }
    }
}
