// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP handlers for the operational surface.

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub rooms: usize,
    pub sessions: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RoomInfo {
    pub room: String,
    pub members: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RoomsResponse {
    pub rooms: Vec<RoomInfo>,
}

/// `GET /api/v1/health`
pub async fn health(State(s): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "running".to_owned(),
        rooms: s.registry.room_count().await,
        sessions: s.registry.session_count().await,
    })
}

/// `GET /api/v1/rooms` — live rooms and their member names, in join order.
pub async fn list_rooms(State(s): State<Arc<AppState>>) -> impl IntoResponse {
    let rooms = s
        .registry
        .snapshot()
        .await
        .into_iter()
        .map(|(room, members)| RoomInfo { room, members })
        .collect();
    Json(RoomsResponse { rooms })
}

/// Fallback for unknown paths.
pub async fn not_found() -> impl IntoResponse {
    ApiError::NotFound.to_http_response("no such route")
}
