// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket connection actor.
//!
//! One task owns the socket and exposes a narrow interface to the rest of the
//! client: commands in ([`ConnectionCommand`]), events out
//! ([`ConnectionEvent`]). Transport concerns — framing, JSON parsing, close
//! detection — stay here; the session state machine never sees the socket.
//!
//! Inbound frames that fail to parse as a broadcast are dropped with a debug
//! log; the connection stays up.

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use huddle_server::protocol::{Broadcast, ClientFrame};

/// Commands accepted by the connection actor.
#[derive(Debug)]
pub enum ConnectionCommand {
    /// Serialize and send one protocol frame.
    Send(ClientFrame),
    /// Close the socket and stop the actor.
    Close,
}

/// Events emitted by the connection actor.
#[derive(Debug)]
pub enum ConnectionEvent {
    /// A parsed server broadcast.
    Frame(Broadcast),
    /// The connection ended. `reason` is set for unexpected closures and
    /// absent for a locally requested close.
    Closed { reason: Option<String> },
}

/// Cheap cloneable handle to a connection actor.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    commands: mpsc::Sender<ConnectionCommand>,
}

impl ConnectionHandle {
    /// Build a handle over a raw command channel. Used by the real actor and
    /// by test doubles standing in for it.
    pub fn new(commands: mpsc::Sender<ConnectionCommand>) -> Self {
        Self { commands }
    }

    /// Queue a frame for sending. Best-effort: returns false if the actor is
    /// gone or its queue is full.
    pub fn send(&self, frame: ClientFrame) -> bool {
        self.commands.try_send(ConnectionCommand::Send(frame)).is_ok()
    }

    /// Ask the actor to close the socket. Best-effort.
    pub fn close(&self) {
        let _ = self.commands.try_send(ConnectionCommand::Close);
    }
}

/// A live connection: the actor's handle plus its event stream.
#[derive(Debug)]
pub struct Link {
    pub handle: ConnectionHandle,
    pub events: mpsc::Receiver<ConnectionEvent>,
}

/// Command/event queue depth per connection.
const CHANNEL_CAPACITY: usize = 64;

/// Open a WebSocket to `url` and spawn the connection actor.
///
/// This is the client's only suspension point: once the link is returned,
/// all I/O is event-driven.
pub async fn connect(url: &str) -> anyhow::Result<Link> {
    let (stream, _resp) = tokio_tungstenite::connect_async(url).await?;

    let (commands_tx, commands_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let (events_tx, events_rx) = mpsc::channel(CHANNEL_CAPACITY);

    tokio::spawn(run(stream, commands_rx, events_tx));

    Ok(Link { handle: ConnectionHandle::new(commands_tx), events: events_rx })
}

/// Actor loop: owns the socket until close or error.
async fn run(
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    mut commands: mpsc::Receiver<ConnectionCommand>,
    events: mpsc::Sender<ConnectionEvent>,
) {
    let (mut ws_tx, mut ws_rx) = stream.split();
    let mut reason: Option<String> = None;

    loop {
        tokio::select! {
            cmd = commands.recv() => {
                match cmd {
                    Some(ConnectionCommand::Send(frame)) => {
                        let Ok(json) = serde_json::to_string(&frame) else { continue };
                        if let Err(e) = ws_tx.send(Message::Text(json.into())).await {
                            reason = Some(e.to_string());
                            break;
                        }
                    }
                    // Handle dropped counts as a close request.
                    Some(ConnectionCommand::Close) | None => {
                        let _ = ws_tx.send(Message::Close(None)).await;
                        break;
                    }
                }
            }
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<Broadcast>(&text) {
                            Ok(frame) => {
                                if events.send(ConnectionEvent::Frame(frame)).await.is_err() {
                                    break;
                                }
                            }
                            Err(e) => {
                                tracing::debug!(err = %e, "unparsable server frame, dropping");
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        reason = Some("closed by server".to_owned());
                        break;
                    }
                    Some(Err(e)) => {
                        reason = Some(e.to_string());
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    let _ = events.send(ConnectionEvent::Closed { reason }).await;
}
