use dotenvy::dotenv;
use tracing::info;

mod app;
mod common;
mod config;
mod docs;
mod infrastructure;
mod modules;
mod routes;
mod state;
mod workers;

use crate::config::settings::AppConfig;
use crate::infrastructure::storage::s3::StorageService;
use crate::state::AppState;

#[tokio::main]
async fn main() {
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting reels transcoder...");

    let config = AppConfig::new().expect("Missing required environment configuration");

    tokio::fs::create_dir_all(&config.scratch_dir)
        .await
        .expect("Failed to create scratch directory");

    let storage = StorageService::new(
        &config.s3_endpoint,
        &config.s3_bucket,
        &config.s3_access_key,
        &config.s3_secret_key,
    )
    .await;

    let port = config.server_port;
    let state = AppState::new(config, storage);

    // One process-wide shutdown listener. Every running encoder subprocess is
    // registered in the process registry, so a single ctrl-c fans out to all
    // of them instead of re-registering a handler per encode.
    let processes = state.processes.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received, terminating active encoder processes");
            processes.shutdown_all().await;
        }
    });

    let app = app::create_app(state).await;

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    info!("Server running on http://{}", addr);

    axum::serve(listener, app).await.unwrap();
}
