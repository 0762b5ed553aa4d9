// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::ServerConfig;
use crate::registry::RoomRegistry;
use crate::router::BroadcastRouter;

/// Shared server state passed to all handlers via axum `State` extractor.
pub struct AppState {
    pub registry: Arc<RoomRegistry>,
    pub router: BroadcastRouter,
    pub config: ServerConfig,
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(config: ServerConfig, shutdown: CancellationToken) -> Self {
        let registry = Arc::new(RoomRegistry::new());
        let router = BroadcastRouter::new(Arc::clone(&registry));
        Self { registry, router, config, shutdown }
    }
}
