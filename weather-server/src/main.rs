//! Binary crate for the `weather-server` HTTP API.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use weather_core::{OpenWeatherProvider, QueryService, ServerConfig, store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    let config = ServerConfig::from_env()?;
    let store = store::open(&config.database_url)?;
    let provider = Arc::new(OpenWeatherProvider::from_config(&config));
    let service = QueryService::new(provider.clone(), provider, store);

    let app = weather_server::app(service, &config.allowed_origin)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    tracing::info!(%addr, origin = %config.allowed_origin, "server running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server failed")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {e}");
    }
    tracing::info!("shutting down");
}
