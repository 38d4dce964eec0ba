//! PageFlow blog backend: paginated post listings, archives and post detail pages.

mod config;
mod handlers;
mod markdown;
mod read_stats;
mod request_context;
mod routes;
mod state;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Default to info-level logs; override via RUST_LOG if needed.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = config::AppConfig::from_env()?;

    tracing::info!("Starting PageFlow backend server");
    tracing::info!("Content directory: {}", config.content_dir.display());
    tracing::info!("Page size: {}", config.page_size);

    let app_state = state::AppState::load(&config)
        .await
        .context("failed to load blog content")?;

    // Build router
    let app = routes::create_router(app_state);

    let addr = config.listen_addr();
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}
