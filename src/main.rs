use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use siem_log_pipeline::config::PipelineConfig;
use siem_log_pipeline::router::create_router;
use siem_log_pipeline::state::AppState;
use siem_log_pipeline::storage::PgStorage;

#[derive(Debug, Parser)]
#[command(name = "siem-log-pipeline", about = "SIEM log ingestion and reporting service")]
struct Args {
    /// Path to a YAML configuration file
    #[arg(long, env = "PIPELINE_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address override, e.g. 0.0.0.0:8080
    #[arg(long, env = "LISTEN_ADDR")]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let config = PipelineConfig::load(args.config.as_deref())?;

    let storage = PgStorage::connect(&config.database).await?;
    storage.migrate().await?;

    let state = AppState::new(Arc::new(storage));
    let app = create_router(state);

    let addr = args.listen.unwrap_or_else(|| config.listen_addr());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "log pipeline listening");
    axum::serve(listener, app).await?;
    Ok(())
}
