use anyhow::Result;
use clap::Parser;
use mockview::{create_router, AppState, Config};
use mockview::store::LocalStore;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "mockview", about = "Live behavioral interview practice service")]
struct Cli {
    /// Path to the configuration file (without extension)
    #[arg(long, default_value = "config/mockview")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("Mockview v0.1.0");
    info!("Loaded config: {}", cfg.service.name);
    info!("Scoring endpoint: {}", cfg.scoring.endpoint_url);
    info!("Backend proxy target: {}", cfg.backend.base_url);

    let store = LocalStore::open(&cfg.storage.data_path)?;
    let bind = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);

    let state = AppState::new(cfg, store);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!("HTTP server listening on {}", bind);

    axum::serve(listener, app).await?;

    Ok(())
}
