//! Snake Arena server
//!
//! Hosts channel-scoped Snake games over HTTP and WebSocket.

use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use snake_arena::{http, AppState, ArenaConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "snake_arena=debug,tower_http=debug".into()),
        )
        .init();

    let config = ArenaConfig::from_env().context("failed to load configuration")?;
    info!(
        "Grid {}x{}, {} ticks per second",
        config.game.grid_size, config.game.grid_size, config.game.fps
    );

    let addr = config.server.listen;
    let state = Arc::new(AppState::new(config));
    let app = http::router(state.clone());

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!("Snake arena running on http://{}", addr);
    info!("   WebSocket endpoint: ws://{}/ws/{{channel}}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    state.registry.shutdown().await;
    info!("All sessions stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
