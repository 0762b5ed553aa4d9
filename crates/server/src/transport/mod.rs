// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP + WebSocket transport for the huddle server.

pub mod http;
pub mod ws;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the axum `Router` with all server routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Operational surface
        .route("/api/v1/health", get(http::health))
        .route("/api/v1/rooms", get(http::list_rooms))
        // Chat protocol
        .route("/ws", get(ws::ws_handler))
        .fallback(http::not_found)
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
