//! Hextris WebSocket game server.

use hextris_core::GameConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod protocol;
mod server;
mod session;

use server::ServerState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr: SocketAddr = std::env::var("SERVER_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:8080".into())
        .parse()?;

    let config = match std::env::var("HEXTRIS_CONFIG") {
        Ok(path) => {
            info!("Loading game config from {}", path);
            GameConfig::from_path(&path)?
        }
        Err(_) => GameConfig::default(),
    };

    info!(board_width = config.board_width, "Starting Hextris server...");

    let state = Arc::new(ServerState::new(config));

    server::run_server(addr, state).await
}
