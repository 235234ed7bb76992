// API Server Binary Entry Point
//
// Purpose: Start the Axum API server around the yield engine
// Usage: cargo run --features api --bin api_server

use crop_yield_engine::{create_router, AppState, ServerConfig};
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing (structured logging)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    // Default log level: info for our crate, warn for others
                    "crop_yield_engine=info,tower_http=debug,axum=debug,warn".into()
                }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting API server...");

    let config = ServerConfig::from_env();

    tracing::info!("Configuration:");
    tracing::info!("  MODEL_PATH: {:?}", config.model_path);
    tracing::info!("  CANDIDATE_ITEMS_PATH: {:?}", config.candidate_items_path);
    tracing::info!("  PORT: {}", config.port);
    tracing::info!("  INFERENCE_TIMEOUT_MS: {}", config.inference_timeout.as_millis());

    // Model is loaded exactly once here and shared read-only afterwards
    let state = AppState::new(&config)?;

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
