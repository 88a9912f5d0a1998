use clap::Parser;
use papercut_server::{router, Cli, ServerConfig, Studio};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new("papercut_server=debug,ai_pipeline=debug,tower_http=info")
            }),
        )
        .init();

    let cli = Cli::parse();
    let config = ServerConfig::from_cli(&cli)?;

    info!("Starting Papercut Server...");
    info!("Data directory: {}", config.data_dir.display());
    info!("Scene assets: {}", config.assets_dir.display());

    let addr = config.addr.clone();
    let studio = Arc::new(Studio::from_config(config)?);

    if studio.placeholder_forced() {
        info!("Placeholder mode forced, ComfyUI will not be called");
    } else if studio.comfyui_available().await {
        info!("ComfyUI reachable at {}", studio.config.comfyui.api_url);
    } else {
        warn!(
            "ComfyUI not reachable at {}, generations will use the placeholder image",
            studio.config.comfyui.api_url
        );
    }

    let app = router(studio);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Papercut server listening on http://{}", addr);
    info!("API endpoints:");
    info!("  GET  /api/health                         - Backend status");
    info!("  POST /api/generate                       - Generate a papercut");
    info!("  GET  /api/generations                    - List generations");
    info!("  GET  /api/generations/:id               - Generation details");
    info!("  GET  /api/generations/:id/image         - Processed PNG");
    info!("  GET  /api/generations/:id/raw           - Raw PNG");
    info!("  GET  /api/generations/:id/download      - Download processed PNG");
    info!("  GET  /api/generations/:id/scenes/:scene - Scene mock-up");
    info!("  GET  /api/effects                        - Effect metadata");

    axum::serve(listener, app).await?;

    Ok(())
}
