// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only client message log.
//!
//! Entries are ordered by local receipt time; there is no resequencing and no
//! global order across clients. Whether an entry is "mine" is decided at
//! append time (optimistic sends are own, received broadcasts are not) — the
//! server never echoes a sender's own message back, and display-name equality
//! is never used for identity, so two members sharing a name cannot
//! misattribute each other's messages.

use huddle_server::protocol::{Broadcast, PresenceKind};

/// One log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub text: String,
    pub sender: String,
    pub receiver: String,
    /// Local receipt time, epoch millis.
    pub timestamp_ms: u64,
    /// True for the optimistic copy of a locally sent message.
    pub own: bool,
    /// Set for presence broadcasts, absent for chat messages.
    pub event: Option<PresenceKind>,
}

impl LogEntry {
    /// Sender label for display: "You" for own entries.
    pub fn display_sender(&self) -> &str {
        if self.own {
            "You"
        } else {
            &self.sender
        }
    }
}

/// Append-only ordered message log.
#[derive(Debug, Default)]
pub struct MessageLog {
    entries: Vec<LogEntry>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the optimistic local copy of a sent message.
    pub fn append_local(&mut self, sender: &str, text: &str, receiver: &str) -> LogEntry {
        let entry = LogEntry {
            text: text.to_owned(),
            sender: sender.to_owned(),
            receiver: receiver.to_owned(),
            timestamp_ms: epoch_ms(),
            own: true,
            event: None,
        };
        self.entries.push(entry.clone());
        entry
    }

    /// Append a received broadcast (chat or presence).
    pub fn append_remote(&mut self, frame: Broadcast) -> LogEntry {
        let entry = LogEntry {
            text: frame.message,
            sender: frame.sender,
            receiver: frame.receiver,
            timestamp_ms: epoch_ms(),
            own: false,
            event: frame.event,
        };
        self.entries.push(entry.clone());
        entry
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Return current epoch millis.
pub fn epoch_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
