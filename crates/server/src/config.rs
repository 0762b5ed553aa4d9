// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

/// Configuration for the huddle server.
#[derive(Debug, Clone, clap::Parser)]
#[command(name = "huddle-server", about = "Room-based chat relay over WebSockets.")]
pub struct ServerConfig {
    /// Host to bind on.
    #[arg(long, default_value = "127.0.0.1", env = "HUDDLE_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 8080, env = "HUDDLE_PORT")]
    pub port: u16,

    /// Per-connection outbound queue capacity, in frames. A member whose
    /// queue fills up (or whose connection has closed) is torn down rather
    /// than allowed to stall delivery to the rest of its room.
    #[arg(long, default_value_t = 64, env = "HUDDLE_SEND_QUEUE")]
    pub send_queue: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_owned(), port: 8080, send_queue: 64 }
    }
}
