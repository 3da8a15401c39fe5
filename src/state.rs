//! Application state shared across all handlers

use std::sync::Arc;

use crate::config::ArenaConfig;
use crate::notify::BroadcastNotifier;
use crate::render::{PngRenderer, Renderer};
use crate::session::SessionRegistry;

/// Shared application state
pub struct AppState {
    /// Running sessions, one per channel at most
    pub registry: SessionRegistry,
    /// Feeds that WebSocket clients subscribe to
    pub notifier: Arc<BroadcastNotifier>,
    pub config: ArenaConfig,
}

impl AppState {
    /// Create state with the in-memory notifier and PNG renderer
    pub fn new(config: ArenaConfig) -> Self {
        let notifier = Arc::new(BroadcastNotifier::with_capacity(
            config.server.broadcast_capacity,
        ));
        let renderer = Arc::new(PngRenderer::new(config.render.cell_size));
        Self::with_parts(config, renderer, notifier)
    }

    /// Create with a custom renderer (for testing)
    pub fn with_parts(
        config: ArenaConfig,
        renderer: Arc<dyn Renderer>,
        notifier: Arc<BroadcastNotifier>,
    ) -> Self {
        let registry = SessionRegistry::new(config.game.clone(), renderer, notifier.clone());
        Self {
            registry,
            notifier,
            config,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(ArenaConfig::default())
    }
}
