use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use backend_lib::{config::Settings, logging, router, storage::SqliteStore, AppState};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

/// Vikasana admin API server
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Config file (defaults to ./config.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the bind address
    #[arg(long)]
    bind: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut settings = match &cli.config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };
    if let Some(bind) = cli.bind {
        settings.bind_addr = bind;
    }

    logging::init(&settings)?;

    let store = SqliteStore::connect(&settings.database_url).await?;
    let addr = settings.bind_addr;
    let state = Arc::new(AppState::new(store, settings)?);
    let sweeper = state.spawn_sweeper();

    let app = router::create_router(state);

    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, "listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    sweeper.abort();
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    info!("shutdown requested");
}
