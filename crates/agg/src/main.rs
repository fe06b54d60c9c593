mod config;
mod telemetry;

use agg_core::{Aggregator, DedupStore};
use agg_db::SqliteDedupStore;
use clap::{Parser, Subcommand};
use config::ServeConfig;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "agg", about = "Deduplicating event aggregator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP service.
    Serve(ServeConfig),
    /// Print the OpenAPI document.
    Openapi,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match cli.command {
        Command::Serve(config) => {
            telemetry::init();
            match serve(config).await {
                Ok(()) => ExitCode::SUCCESS,
                Err(err) => {
                    error!(error = %err, "aggregator failed");
                    ExitCode::FAILURE
                }
            }
        }
        Command::Openapi => {
            println!("{}", agg_serve::openapi::generate_spec());
            ExitCode::SUCCESS
        }
    }
}

async fn serve(config: ServeConfig) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    info!(path = %config.db_path.display(), durability = ?config.durability(), "initializing dedup store");
    let store: Arc<dyn DedupStore> =
        Arc::new(SqliteDedupStore::open(&config.db_path, config.durability())?);

    let (aggregator, worker) = Aggregator::start(store, config.pipeline());
    let state = agg_serve::AppState::new(aggregator);
    let served = agg_serve::serve(state, config.bind, shutdown_signal()).await;

    let report = worker.shutdown().await?;
    info!(
        processed = report.processed,
        admitted = report.admitted,
        duplicates = report.duplicates,
        store_failures = report.store_failures,
        abandoned = report.abandoned,
        "shutdown complete"
    );
    served?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
