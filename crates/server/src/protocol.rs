// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire protocol for the huddle chat session.
//!
//! Client-to-server frames are adjacently-tagged JSON objects
//! (`{"type": "join", "data": {...}}`), one per WebSocket text frame.
//! Server-to-client broadcasts are flat `{"sender", "message", "receiver"}`
//! objects; presence broadcasts add an `"event"` field that legacy clients
//! ignore. Every inbound frame is untrusted: anything that fails to parse
//! becomes [`InboundFrame::Unknown`] and is dropped by the transport rather
//! than tearing down the connection.

use serde::{Deserialize, Serialize};

/// Default receiver label when a frame omits one.
pub const EVERYONE: &str = "Everyone";

fn everyone() -> String {
    EVERYONE.to_owned()
}

// ---------------------------------------------------------------------------
// Client -> Server
// ---------------------------------------------------------------------------

/// Payload of a `join` or `leave` frame.
///
/// The `message` array is part of the legacy envelope; it is always empty in
/// practice and ignored on receipt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomData {
    pub name: String,
    #[serde(default)]
    pub message: Vec<serde_json::Value>,
    pub room: String,
}

impl RoomData {
    pub fn new(name: impl Into<String>, room: impl Into<String>) -> Self {
        Self { name: name.into(), message: Vec::new(), room: room.into() }
    }
}

/// Payload of a `message` frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageData {
    pub message: String,
    pub name: String,
    #[serde(default = "everyone")]
    pub receiver: String,
}

/// A client-to-server frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum ClientFrame {
    Join(RoomData),
    Message(MessageData),
    Leave(RoomData),
}

/// Inbound frame after tolerant parsing.
#[derive(Debug, Clone)]
pub enum InboundFrame {
    Join(RoomData),
    Message(MessageData),
    Leave(RoomData),
    /// Unrecognized type tag or unparsable payload.
    Unknown,
}

/// Parse one inbound text frame. Never fails: malformed input maps to
/// [`InboundFrame::Unknown`].
pub fn parse_frame(text: &str) -> InboundFrame {
    match serde_json::from_str::<ClientFrame>(text) {
        Ok(ClientFrame::Join(data)) => InboundFrame::Join(data),
        Ok(ClientFrame::Message(data)) => InboundFrame::Message(data),
        Ok(ClientFrame::Leave(data)) => InboundFrame::Leave(data),
        Err(_) => InboundFrame::Unknown,
    }
}

// ---------------------------------------------------------------------------
// Server -> Client
// ---------------------------------------------------------------------------

/// Presence event kind carried on join/leave broadcasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceKind {
    Joined,
    Left,
}

/// A server-to-client broadcast frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Broadcast {
    pub sender: String,
    pub message: String,
    #[serde(default = "everyone")]
    pub receiver: String,
    /// Set on presence broadcasts, absent on chat messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<PresenceKind>,
}

impl Broadcast {
    /// A chat message broadcast.
    pub fn message(sender: impl Into<String>, text: impl Into<String>, receiver: impl Into<String>) -> Self {
        Self { sender: sender.into(), message: text.into(), receiver: receiver.into(), event: None }
    }

    /// A presence broadcast announcing a join or leave.
    pub fn presence(sender: impl Into<String>, kind: PresenceKind) -> Self {
        let sender = sender.into();
        let verb = match kind {
            PresenceKind::Joined => "joined",
            PresenceKind::Left => "left",
        };
        Self {
            message: format!("{sender} {verb} the room"),
            sender,
            receiver: everyone(),
            event: Some(kind),
        }
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
