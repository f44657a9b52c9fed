use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{fmt, EnvFilter};

use cinematch::{
    api::{create_router, AppState},
    config::Config,
    services::{loader, providers::tmdb::TmdbProvider},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    install_tracing_subscriber();

    let config = Config::from_env()?;

    // Parsing a full-size similarity matrix takes a while; keep it off the runtime threads
    let movies_path = config.movies_path.clone();
    let similarity_path = config.similarity_path.clone();
    let index = tokio::task::spawn_blocking(move || loader::load_index(movies_path, similarity_path))
        .await
        .context("artifact loader task failed")?
        .map_err(|e| {
            tracing::error!(error = %e, "Required data could not be loaded, refusing to start");
            e
        })?;

    let provider = TmdbProvider::from_config(&config)?;

    let state = AppState::new(
        Arc::new(index),
        Arc::new(provider),
        config.recommendation_count,
        config.max_recommendations,
    );

    let app = create_router(state);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {}", address))?;
    tracing::info!(address = %address, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

fn install_tracing_subscriber() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(err) => tracing::error!(?err, "failed to listen for shutdown signal"),
    }
}
