use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use giastylez_web::api::{HttpApi, ImageApi};
use giastylez_web::config::{Cli, Config};
use giastylez_web::routes;
use giastylez_web::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse CLI args and load config
    let cli = Cli::parse();
    let config = Config::load(&cli)?;

    let api = HttpApi::new(&config.api)?;
    tracing::info!("Image API at {}", api.base_url());
    if let Err(e) = api.health().await {
        tracing::warn!("Image API not reachable yet: {}", e);
    }

    let state = AppState {
        api: Arc::new(api),
        config: config.clone(),
    };
    let app = routes::router(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
