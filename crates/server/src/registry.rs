// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Room registry: process-wide mapping from room id to active members.
//!
//! Rooms are created lazily on first join and removed when their last member
//! leaves — a room exists in the registry iff it has at least one active
//! session. The registry is constructor-injected shared state (one per
//! [`crate::state::AppState`]), guarded by an async `RwLock`; join and leave
//! are read-modify-write under the write lock, membership snapshots take the
//! read lock.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;
use tokio::sync::{mpsc, RwLock};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::JoinError;
use crate::protocol::Broadcast;

/// Maximum room id length after normalization, in characters.
pub const MAX_ROOM_LEN: usize = 32;

/// Normalized room identifier: trimmed, uppercased, 1..=32 characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomId(String);

impl RoomId {
    /// Normalize a raw room string. Room codes are case-insensitive on the
    /// wire; the uppercase form is canonical.
    pub fn parse(raw: &str) -> Result<Self, JoinError> {
        let normalized = raw.trim().to_uppercase();
        if normalized.is_empty() || normalized.chars().count() > MAX_ROOM_LEN {
            return Err(JoinError::InvalidRoom);
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Server-side per-connection session: one connection bound to one room and
/// display name for its active lifetime.
pub struct Session {
    /// Server-issued identity. Teardown and membership are keyed by this id,
    /// never by the display name (two members may share a name).
    pub id: Uuid,
    pub name: String,
    pub room: RoomId,
    /// Bounded outbound queue owned by the connection task.
    pub outbound: mpsc::Sender<Broadcast>,
    /// Cancelled on removal from the registry. The connection task selects on
    /// this so a teardown initiated elsewhere (delivery failure) also closes
    /// the socket.
    closed: CancellationToken,
    left: AtomicBool,
}

impl Session {
    /// Flip the session to Left. Returns true exactly once, no matter how
    /// many times an explicit leave and a socket close race each other.
    fn mark_left(&self) -> bool {
        !self.left.swap(true, Ordering::SeqCst)
    }

    pub fn has_left(&self) -> bool {
        self.left.load(Ordering::SeqCst)
    }
}

/// Process-wide room membership map.
pub struct RoomRegistry {
    rooms: RwLock<HashMap<RoomId, IndexMap<Uuid, Arc<Session>>>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self { rooms: RwLock::new(HashMap::new()) }
    }

    /// Validate and register a new session in `room`.
    ///
    /// Creates the room entry if absent. The caller is responsible for
    /// broadcasting the join presence event to the members that were already
    /// present.
    pub async fn join(
        &self,
        room: &str,
        name: &str,
        outbound: mpsc::Sender<Broadcast>,
        closed: CancellationToken,
    ) -> Result<Arc<Session>, JoinError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(JoinError::InvalidName);
        }
        let room = RoomId::parse(room)?;

        let session = Arc::new(Session {
            id: Uuid::new_v4(),
            name: name.to_owned(),
            room: room.clone(),
            outbound,
            closed,
            left: AtomicBool::new(false),
        });

        let mut rooms = self.rooms.write().await;
        rooms.entry(room).or_default().insert(session.id, Arc::clone(&session));

        Ok(session)
    }

    /// Remove a session from its room; drop the room if it is now empty.
    /// Cancels the session's close signal so its connection task shuts the
    /// socket even when the teardown started elsewhere.
    ///
    /// Idempotent: returns true for the call that performed the removal,
    /// false for every later call.
    pub async fn leave(&self, session: &Session) -> bool {
        if !session.mark_left() {
            return false;
        }

        let mut rooms = self.rooms.write().await;
        if let Some(members) = rooms.get_mut(&session.room) {
            members.shift_remove(&session.id);
            if members.is_empty() {
                rooms.remove(&session.room);
            }
        }
        drop(rooms);

        session.closed.cancel();
        true
    }

    /// Snapshot of the active membership of `room`, in join order. Empty for
    /// an unknown room (not an error).
    pub async fn members(&self, room: &RoomId) -> Vec<Arc<Session>> {
        let rooms = self.rooms.read().await;
        rooms.get(room).map(|m| m.values().cloned().collect()).unwrap_or_default()
    }

    /// Number of live rooms.
    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    /// Number of active sessions across all rooms.
    pub async fn session_count(&self) -> usize {
        self.rooms.read().await.values().map(IndexMap::len).sum()
    }

    /// Snapshot of every room and its member names, for the HTTP surface.
    pub async fn snapshot(&self) -> Vec<(String, Vec<String>)> {
        let rooms = self.rooms.read().await;
        let mut out: Vec<(String, Vec<String>)> = rooms
            .iter()
            .map(|(room, members)| {
                (room.to_string(), members.values().map(|s| s.name.clone()).collect())
            })
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
