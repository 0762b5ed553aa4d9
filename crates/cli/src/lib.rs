// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Huddle client library: UI-independent session state machine for the
//! room-chat protocol, plus the WebSocket connection actor it drives.
//!
//! The rendering layer (the `huddle` binary's terminal loop, or anything
//! else) consumes the [`session::ClientSession`] surface — `submit`, `send`,
//! `leave`, `recv` — and reads the append-only [`log::MessageLog`]. It never
//! touches the socket or the log internals directly.

pub mod code;
pub mod connection;
pub mod log;
pub mod session;
