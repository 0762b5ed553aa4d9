// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Broadcast router: fans one event out to the members of the originating
//! session's room.
//!
//! The originator is always excluded — the client keeps an optimistic local
//! copy of its own messages, and a joining/leaving member already knows about
//! its own presence. Delivery is fire-and-forget per member over each
//! connection's bounded queue: one member's failure never aborts delivery to
//! the rest, it schedules that member's teardown instead.
//!
//! Ordering: frames from one connection are delivered in the order sent
//! (FIFO per connection). There is no ordering guarantee across connections;
//! two members' messages may reach a third in either relative order.

use std::sync::Arc;

use crate::protocol::{Broadcast, PresenceKind, EVERYONE};
use crate::registry::{RoomRegistry, Session};

/// Fan-out router over a shared [`RoomRegistry`].
#[derive(Clone)]
pub struct BroadcastRouter {
    registry: Arc<RoomRegistry>,
}

impl BroadcastRouter {
    pub fn new(registry: Arc<RoomRegistry>) -> Self {
        Self { registry }
    }

    /// Broadcast a chat message from `from` to the rest of its room.
    ///
    /// The receiver label is advisory, display-only: delivery is always
    /// room-wide regardless of its value.
    pub async fn route_message(&self, from: &Arc<Session>, text: &str, receiver: &str) {
        // A session torn down by the reaper may still have frames in flight.
        if from.has_left() {
            tracing::debug!(session = %from.id, "message from left session, dropping");
            return;
        }
        let receiver = receiver.trim();
        let receiver = if receiver.is_empty() { EVERYONE } else { receiver };
        let frame = Broadcast::message(&from.name, text, receiver);
        let failed = self.deliver(from, frame).await;
        self.reap(failed);
    }

    /// Broadcast a join/leave presence event to the other members of the
    /// originator's room.
    pub async fn route_presence(&self, from: &Arc<Session>, kind: PresenceKind) {
        if from.has_left() {
            return;
        }
        let frame = Broadcast::presence(&from.name, kind);
        let failed = self.deliver(from, frame).await;
        self.reap(failed);
    }

    /// Idempotent session teardown: remove the session from the registry and
    /// announce the departure to the remaining members. Invoked by explicit
    /// leave, socket close, and delivery failure alike; only the first caller
    /// does any work.
    ///
    /// Iterative rather than recursive: members that fail during the leave
    /// announcement are pushed onto the same work list.
    pub async fn teardown(&self, session: &Arc<Session>) {
        let mut pending = vec![Arc::clone(session)];
        while let Some(s) = pending.pop() {
            if self.registry.leave(&s).await {
                tracing::info!(room = %s.room, name = %s.name, session = %s.id, "session left");
                let frame = Broadcast::presence(&s.name, PresenceKind::Left);
                pending.extend(self.deliver(&s, frame).await);
            }
        }
    }

    /// Deliver one frame to every member of `from`'s room except `from`.
    /// Returns the members whose queues rejected the frame.
    async fn deliver(&self, from: &Session, frame: Broadcast) -> Vec<Arc<Session>> {
        let members = self.registry.members(&from.room).await;
        let mut failed = Vec::new();
        for member in members {
            if member.id == from.id {
                continue;
            }
            if let Err(e) = member.outbound.try_send(frame.clone()) {
                tracing::debug!(
                    room = %from.room,
                    member = %member.name,
                    session = %member.id,
                    err = %e,
                    "delivery failed, scheduling teardown"
                );
                failed.push(member);
            }
        }
        failed
    }

    /// Tear down failed members off the delivery path.
    fn reap(&self, failed: Vec<Arc<Session>>) {
        for member in failed {
            let router = self.clone();
            tokio::spawn(async move {
                router.teardown(&member).await;
            });
        }
    }
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;
