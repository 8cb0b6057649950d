use crate::config::settings::AppConfig;
use crate::infrastructure::http::fetcher::HttpFetcher;
use crate::infrastructure::storage::s3::StorageService;
use crate::state::AppState;
use dotenvy::dotenv;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod app;
mod common;
mod config;
mod docs;
mod infrastructure;
mod modules;
mod routes;
mod state;
mod workers;

#[cfg(test)]
mod test_support;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting server...");

    let config = AppConfig::new()?;

    let storage = StorageService::new(
        &config.minio_url,
        &config.minio_public_url,
        &config.minio_bucket,
        &config.minio_access_key,
        &config.minio_secret_key,
    )
    .await;
    let fetcher = HttpFetcher::new(config.transcoder.download_timeout)?;

    tokio::fs::create_dir_all(&config.transcoder.temp_root).await?;
    info!(
        "🎞️ ffmpeg at {} ({} execution slots, {} download slots, scratch in {})",
        config.transcoder.binary_path.display(),
        config.transcoder.execution_concurrency,
        config.transcoder.download_concurrency,
        config.transcoder.temp_root.display()
    );

    let addr = format!("0.0.0.0:{}", config.server_port);
    let state = AppState::new(config, Arc::new(storage), Arc::new(fetcher));
    let app = app::create_app(state).await;

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server running on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
