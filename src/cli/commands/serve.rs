use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use crate::ai::GroqClient;
use crate::cli::open_store;
use crate::config::AppConfig;
use crate::state::AppState;
use crate::storage::LocalObjectStore;

pub async fn handle(mut config: AppConfig, port: Option<u16>) -> anyhow::Result<()> {
    if let Some(port) = port {
        config.api.port = port;
    }

    let store = open_store(&config).await?;
    let ai = GroqClient::new(&config.ai).context("failed to build AI client")?;
    if config.ai.api_key.is_none() {
        warn!("GROQ_API_KEY not set; AI endpoints will answer 503");
    }
    let objects = LocalObjectStore::new(&config.storage);

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let state = AppState::new(config, store, Arc::new(ai), Arc::new(objects));
    let app = crate::app(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!("Workforce API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
