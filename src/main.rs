//! toolgate-monitor - health monitor for MCP tool servers
//!
//! Runs one check cycle and prints the summary, or monitors until Ctrl-C.

#![allow(missing_docs)]

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use toolgate_rs::{Config, HealthMonitor, OverallStatus, build_info};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "toolgate-monitor", version, about)]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(short, long, env = "TOOLGATE_CONFIG", default_value = "config/toolgate.yaml")]
    config: PathBuf,

    /// Run a single check cycle, print the summary as JSON and exit
    #[arg(long)]
    once: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    let build = build_info();
    info!(version = build.version, git = build.git_hash, "toolgate-monitor starting");

    let config = Config::from_file(&cli.config)
        .await
        .with_context(|| format!("loading {}", cli.config.display()))?;
    let monitor = HealthMonitor::new(config.monitor)?;

    if cli.once {
        let results = monitor.check_all_now().await;
        let summary = monitor.summary();
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(results
            .iter()
            .all(|r| r.overall_status != OverallStatus::Unhealthy));
    }

    monitor.start().await?;
    tokio::signal::ctrl_c()
        .await
        .context("waiting for Ctrl-C")?;
    info!("interrupt received");
    monitor.shutdown().await;
    Ok(true)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_json);

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
