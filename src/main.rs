//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `lead_audit` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - Dispatching to the audit, batch, sequential and serve entry points
//!
//! All core functionality is implemented in the library crate.

use std::process;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;

use lead_audit::initialization::{init_engine, init_logger_with};
use lead_audit::server::{start_server, AppState};
use lead_audit::storage::SqliteLeadStore;
use lead_audit::{cancel_on_ctrl_c, print_batch_statistics, BatchReport, Command, Config, Opt};

fn print_report_summary(report: &BatchReport) {
    println!(
        "✅ Audited {} lead{} ({} completed, {} without website, {} failed) in {:.1}s",
        report.total,
        if report.total == 1 { "" } else { "s" },
        report.completed,
        report.no_website,
        report.failed,
        report.elapsed_seconds
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file (if it exists)
    // This allows setting PAGESPEED_API_KEY / SERPAPI_API_KEY in .env without exporting them
    if dotenvy::dotenv().is_err() {
        // If .env not found in current dir, try next to the executable
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let env_path = exe_dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                }
            }
        }
    }

    // Parse command-line arguments into Config
    let opt = Opt::parse();
    let config = Config::from(&opt);

    // Initialize logger based on config
    init_logger_with(config.log_level.clone().into(), config.log_format.clone())
        .context("Failed to initialize logger")?;

    let store = SqliteLeadStore::open(&config.db_path)
        .await
        .with_context(|| format!("Failed to open lead database {}", config.db_path.display()))?;
    let engine = Arc::new(
        init_engine(&config, Arc::new(store)).context("Failed to initialize audit engine")?,
    );

    match opt.command {
        Command::Audit { lead_id } => match engine.audit_lead(lead_id).await {
            Ok(outcome) => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&outcome).context("Failed to encode outcome")?
                );
            }
            Err(e) => {
                eprintln!("lead_audit error: {:#}", e);
                process::exit(1);
            }
        },
        Command::Batch {
            search_id,
            lead_ids,
        } => {
            let ids = engine
                .resolve_batch(lead_ids, search_id)
                .await
                .context("Failed to resolve batch leads")?;
            if ids.is_empty() {
                println!("No leads to audit");
                return Ok(());
            }
            let report = engine.run_batch(ids, config.max_concurrency).await;
            print_batch_statistics(&report, engine.stats());
            print_report_summary(&report);
        }
        Command::Sequential { lead_ids } => {
            let delay = Duration::from_millis(config.inter_audit_delay_ms);
            let report = engine.run_sequential(lead_ids, delay).await;
            print_batch_statistics(&report, engine.stats());
            print_report_summary(&report);
        }
        Command::Serve { port } => {
            let state = AppState {
                engine,
                max_concurrency: config.max_concurrency,
            };
            let shutdown = CancellationToken::new();
            cancel_on_ctrl_c(shutdown.clone());
            start_server(port, state, shutdown).await?;
        }
    }

    Ok(())
}
