//! tmk-svc - Test Monkey platform service
//!
//! Feedback-collection missions, gacha voucher rewards, and
//! AI-generated mission reports behind one HTTP API.

use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use tmk_common::config::{CliOverrides, ServiceConfig};
use tmk_svc::services::anthropic_client::AnthropicClient;
use tmk_svc::services::notifier::LogNotifier;
use tmk_svc::services::summarizer;
use tmk_svc::AppState;

#[derive(Parser, Debug)]
#[command(name = "tmk-svc", version, about = "Test Monkey platform service")]
struct Args {
    /// Path to a TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Listen port (overrides config file and environment)
    #[arg(long)]
    port: Option<u16>,

    /// SQLite database path (overrides config file and environment)
    #[arg(long)]
    database: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();
    let config = ServiceConfig::resolve(&CliOverrides {
        config_file: args.config,
        port: args.port,
        database_path: args.database,
    })?;

    info!("Starting tmk-svc (Test Monkey platform service)");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Database: {}", config.database_path);

    let pool = tmk_svc::db::connect(Path::new(&config.database_path)).await?;

    let api_key = config.require_anthropic_api_key()?.to_string();
    let textgen: Arc<dyn tmk_svc::services::anthropic_client::TextGenerator> =
        Arc::new(AnthropicClient::new(api_key, config.model.clone())?);
    let notifier = Arc::new(LogNotifier);

    // Background summarization sweep over active missions.
    tokio::spawn(summarizer::run_interval_loop(
        pool.clone(),
        Arc::clone(&textgen),
        config.summarize_interval_secs,
    ));
    info!(
        "Summarization sweep scheduled every {} seconds",
        config.summarize_interval_secs
    );

    let state = AppState::new(pool, textgen, notifier);
    let app = tmk_svc::build_router(state);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", config.port)).await?;
    info!("Listening on http://127.0.0.1:{}", config.port);
    info!("Health check: http://127.0.0.1:{}/health", config.port);

    axum::serve(listener, app).await?;

    Ok(())
}
