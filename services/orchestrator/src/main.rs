//! Sentinel service entry point

use anyhow::{Context, Result};
use clap::Parser;
use config::AppConfig;
use sentinel_orchestrator::{init_logging, log_metrics, CycleOrchestrator, LogEmoji};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about = "Market alert sentinel", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Runtime environment (development, staging, production)
    #[arg(short, long)]
    environment: Option<String>,

    /// Run a single cycle and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = AppConfig::load(args.config.as_deref(), args.environment.as_deref())
        .context("Failed to load configuration")?;
    init_logging(&config.logging)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        instruments = ?config.monitoring.instruments,
        "🚀 Starting Sentinel"
    );

    let orchestrator = CycleOrchestrator::from_config(&config).await?;

    if !orchestrator.dispatcher().test_connectivity().await {
        error!("{} Email transport unreachable, alerts may not be delivered", LogEmoji::ERROR);
    }

    if args.once {
        let report = orchestrator.run_cycle(&orchestrator.instruments()).await;
        orchestrator.shutdown().await;
        log_metrics!(
            "Single cycle finished: {} emitted, {} failed fetches",
            report.alerts_emitted,
            report.instruments_failed
        );
        return Ok(());
    }

    orchestrator.run(shutdown_signal()).await;

    let metrics = orchestrator.metrics();
    log_metrics!(
        "Final: {} cycles, {} alerts emitted, {} suppressed, health {:?}",
        metrics.cycles,
        metrics.alerts_emitted,
        metrics.alerts_suppressed,
        orchestrator.health().status
    );
    if let Some(totals) = orchestrator.request_totals() {
        log_metrics!(
            "Exchange requests: {} total, {} failed, {} rate limited",
            totals.total,
            totals.failed,
            totals.rate_limited
        );
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
