// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client-side room code generation.
//!
//! Codes are 6 uppercase alphanumeric characters. There is no server-side
//! uniqueness check: generating a code that already names a live room simply
//! attaches the joiner to that room.

use rand::Rng;

/// Room code length in characters.
pub const ROOM_CODE_LEN: usize = 6;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generate a random 6-character room code.
pub fn generate_room_code() -> String {
    let mut rng = rand::rng();
    (0..ROOM_CODE_LEN).map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char).collect()
}

#[cfg(test)]
#[path = "code_tests.rs"]
mod tests;
