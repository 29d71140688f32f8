//! moneta-server: HTTP front end for the local replica and the Zenith sync
//! job.

mod api;
mod config;
mod error;
mod scheduler;
mod state;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env();
    info!(
        "Starting moneta-server (data dir: {}, bind: {})",
        config.data_dir, config.bind_addr
    );
    if config.admin_token.is_none() {
        info!("MONETA_ADMIN_TOKEN is not set; API authentication is disabled");
    }

    let bind_addr = config.bind_addr.clone();
    let state = AppState::build(config)?;

    scheduler::spawn(state.clone());

    let app = api::router().with_state(state);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Listening on {}", bind_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        return;
    }
    info!("Shutdown signal received");
}
