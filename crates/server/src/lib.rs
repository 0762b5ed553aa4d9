// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Huddle server: room-based real-time message relay over WebSockets.
//!
//! Clients connect to `/ws`, send a `join` frame naming a room, and from then
//! on every `message` frame is fanned out to the other members of that room.
//! Rooms are created lazily on first join and dropped when the last member
//! leaves. There is no persistence: a room's history dies with its members.

pub mod config;
pub mod error;
pub mod protocol;
pub mod registry;
pub mod router;
pub mod state;
pub mod transport;

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::config::ServerConfig;
use crate::state::AppState;
use crate::transport::build_router;

/// Run the huddle server until shutdown (Ctrl+C).
pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await?;

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                shutdown.cancel();
            }
        });
    }

    serve(listener, config, shutdown).await
}

/// Serve on an already-bound listener until `shutdown` is cancelled.
///
/// Split out from [`run`] so tests can bind port 0 and drive the real router
/// in-process.
pub async fn serve(
    listener: TcpListener,
    config: ServerConfig,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let state = Arc::new(AppState::new(config, shutdown.clone()));

    tracing::info!(addr = %listener.local_addr()?, "huddle-server listening");

    let router = build_router(state);
    axum::serve(listener, router).with_graceful_shutdown(shutdown.cancelled_owned()).await?;

    Ok(())
}
