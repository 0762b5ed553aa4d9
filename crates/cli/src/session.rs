// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client session state machine: Disconnected → Joining → Joined → Left.
//!
//! `submit` validates locally, opens the connection, and sends the join frame
//! — there is no join acknowledgement in the protocol, so a successful open
//! moves straight to Joined. `send` appends an optimistic local copy of the
//! message; the server excludes the sender from fan-out, so the copy is never
//! duplicated by an echo. Explicit leave and unexpected connection close both
//! funnel into one teardown path, so the leave frame is emitted at most once
//! no matter how the session ends.

use std::fmt;

use tokio::sync::mpsc;

use huddle_server::protocol::{ClientFrame, MessageData, RoomData, EVERYONE};

use crate::connection::{self, ConnectionEvent, ConnectionHandle, Link};
use crate::log::{LogEntry, MessageLog};

/// Connection lifecycle states visible to the rendering layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Disconnected,
    Joining,
    Joined,
    Left,
}

/// Errors surfaced to the caller. All are non-fatal: validation errors are
/// recovered locally and a failed connect leaves the session Disconnected
/// so the caller may retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Empty name, room, or message text after trimming. Nothing was sent.
    InvalidInput,
    /// The connection could not be opened.
    Connection(String),
    /// `send` outside the Joined state.
    NotJoined,
    /// `submit` on a session that already ran.
    AlreadyJoined,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput => f.write_str("invalid input"),
            Self::Connection(reason) => write!(f, "connection failed: {reason}"),
            Self::NotJoined => f.write_str("not in a room"),
            Self::AlreadyJoined => f.write_str("session already used"),
        }
    }
}

impl std::error::Error for SessionError {}

/// Events surfaced by [`ClientSession::recv`].
#[derive(Debug)]
pub enum SessionEvent {
    /// A broadcast was appended to the log (chat or presence).
    Message(LogEntry),
    /// The connection ended; the session is now Left. `reason` is set for
    /// unexpected closures.
    ConnectionClosed { reason: Option<String> },
}

/// Seam between the session state machine and the transport, so tests can
/// drive the machine over in-memory channels.
pub trait Connect {
    fn connect(&self, url: &str) -> impl std::future::Future<Output = anyhow::Result<Link>> + Send;
}

/// Production connector: real WebSocket via [`connection::connect`].
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

impl Connect for WsConnector {
    async fn connect(&self, url: &str) -> anyhow::Result<Link> {
        connection::connect(url).await
    }
}

/// Client session over a WebSocket connection.
pub type WsSession = ClientSession<WsConnector>;

/// The client-side session: one join lifecycle over one connection.
pub struct ClientSession<C: Connect> {
    connector: C,
    server_url: String,
    state: ClientState,
    name: String,
    room: String,
    log: MessageLog,
    connection: Option<ConnectionHandle>,
    events: Option<mpsc::Receiver<ConnectionEvent>>,
    leave_sent: bool,
}

impl<C: Connect> ClientSession<C> {
    pub fn new(connector: C, server_url: impl Into<String>) -> Self {
        Self {
            connector,
            server_url: server_url.into(),
            state: ClientState::Disconnected,
            name: String::new(),
            room: String::new(),
            log: MessageLog::new(),
            connection: None,
            events: None,
            leave_sent: false,
        }
    }

    pub fn state(&self) -> ClientState {
        self.state
    }

    /// Display name, set on a successful submit.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Normalized room code, set on a successful submit.
    pub fn room(&self) -> &str {
        &self.room
    }

    /// Read-only view of the ordered message log.
    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    /// Validate, connect, and join `room` as `name`.
    ///
    /// Empty (after trim) name or room is rejected before any network I/O.
    /// A connect failure reverts to Disconnected; the caller may retry.
    pub async fn submit(&mut self, name: &str, room: &str) -> Result<(), SessionError> {
        if self.state != ClientState::Disconnected {
            return Err(SessionError::AlreadyJoined);
        }

        let name = name.trim();
        let room = room.trim().to_uppercase();
        if name.is_empty() || room.is_empty() {
            return Err(SessionError::InvalidInput);
        }

        self.state = ClientState::Joining;
        let link = match self.connector.connect(&self.server_url).await {
            Ok(link) => link,
            Err(e) => {
                self.state = ClientState::Disconnected;
                return Err(SessionError::Connection(format!("{e:#}")));
            }
        };

        self.name = name.to_owned();
        self.room = room;
        link.handle.send(ClientFrame::Join(RoomData::new(&self.name, &self.room)));
        self.connection = Some(link.handle);
        self.events = Some(link.events);
        self.state = ClientState::Joined;

        tracing::debug!(room = %self.room, name = %self.name, "joined");
        Ok(())
    }

    /// Send a chat message and append its optimistic local copy to the log.
    pub fn send(&mut self, text: &str) -> Result<LogEntry, SessionError> {
        if self.state != ClientState::Joined {
            return Err(SessionError::NotJoined);
        }
        let text = text.trim();
        if text.is_empty() {
            return Err(SessionError::InvalidInput);
        }
        let Some(ref conn) = self.connection else {
            return Err(SessionError::NotJoined);
        };

        conn.send(ClientFrame::Message(MessageData {
            message: text.to_owned(),
            name: self.name.clone(),
            receiver: EVERYONE.to_owned(),
        }));

        let sender = self.name.clone();
        Ok(self.log.append_local(&sender, text, EVERYONE))
    }

    /// Leave the room and close the connection. Idempotent: a second call
    /// (or a racing connection close) produces no further leave frame.
    pub fn leave(&mut self) {
        self.teardown();
    }

    /// Wait for the next session event. Returns None once the session has
    /// reached Left and the event stream is drained.
    pub async fn recv(&mut self) -> Option<SessionEvent> {
        let events = self.events.as_mut()?;
        match events.recv().await {
            Some(ConnectionEvent::Frame(frame)) => {
                Some(SessionEvent::Message(self.log.append_remote(frame)))
            }
            Some(ConnectionEvent::Closed { reason }) => {
                self.teardown();
                Some(SessionEvent::ConnectionClosed { reason })
            }
            None => {
                self.teardown();
                Some(SessionEvent::ConnectionClosed { reason: None })
            }
        }
    }

    /// Single teardown path for explicit leave and connection-close
    /// detection: best-effort leave frame at most once, close the actor,
    /// land in Left.
    fn teardown(&mut self) {
        if self.state == ClientState::Left {
            return;
        }
        if let Some(conn) = self.connection.take() {
            if self.state == ClientState::Joined && !self.leave_sent {
                self.leave_sent = true;
                conn.send(ClientFrame::Leave(RoomData::new(&self.name, &self.room)));
            }
            conn.close();
        }
        self.events = None;
        self.state = ClientState::Left;
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
