//! batchd - priority-ordered, rate-limited batch ingestion daemon

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use batchd::cli::{Cli, Command, OutputFormat};
use batchd::client::ApiClient;
use batchd::config::Config;
use batchd::server::Server;

const WATCH_INTERVAL: Duration = Duration::from_secs(1);

fn setup_logging(verbose: bool) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("batchd")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Write to the log file, stdout belongs to command output
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    let log_file = fs::File::create(log_dir.join("batchd.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (verbose: {})", verbose);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    info!(
        "batchd loaded config: bind={}, batch-size={}, min-spacing-ms={}",
        config.server.bind, config.scheduler.batch_size, config.scheduler.min_spacing_ms
    );

    match cli.command {
        Command::Serve { bind } => cmd_serve(config, bind).await,
        Command::Submit { priority, ids } => cmd_submit(&config, ids, &priority).await,
        Command::Status {
            ingestion_id,
            format,
            watch,
        } => cmd_status(&config, &ingestion_id, format, watch).await,
        Command::Config => cmd_config(&config),
    }
}

async fn cmd_serve(mut config: Config, bind: Option<String>) -> Result<()> {
    if let Some(bind) = bind {
        config.server.bind = bind;
    }
    let address = config.server.bind_addr()?;

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .context(format!("Failed to bind {}", address))?;

    println!("{} batchd listening on {}", "✓".green(), address.to_string().cyan());
    println!(
        "  batch size {}, min spacing {}ms",
        config.scheduler.batch_size, config.scheduler.min_spacing_ms
    );

    let ct = CancellationToken::new();
    let signal_ct = ct.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl_c received, initiating shutdown");
            signal_ct.cancel();
        }
    });

    Server::new(&config).run(listener, ct).await?;
    println!("batchd stopped");
    Ok(())
}

async fn cmd_submit(config: &Config, ids: Vec<i64>, priority: &str) -> Result<()> {
    // Reject locally before touching the network
    let priority: batchd::Priority = priority.parse()?;

    let client = ApiClient::new(&config.client)?;
    let ingestion_id = client.submit(ids, priority.as_str()).await?;
    println!("{} Submitted ingestion: {}", "✓".green(), ingestion_id.cyan());
    Ok(())
}

async fn cmd_status(config: &Config, ingestion_id: &str, format: OutputFormat, watch: bool) -> Result<()> {
    let client = ApiClient::new(&config.client)?;

    loop {
        let report = client.status(ingestion_id).await?;
        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
            OutputFormat::Text => print_report(&report),
        }

        let status = report["status"].as_str().unwrap_or_default();
        if !watch || matches!(status, "completed" | "failed") {
            return Ok(());
        }
        debug!(%ingestion_id, %status, "cmd_status: waiting for terminal status");
        tokio::time::sleep(WATCH_INTERVAL).await;
        println!();
    }
}

fn print_report(report: &Value) {
    let status = report["status"].as_str().unwrap_or("unknown");
    println!("Ingestion: {}", report["ingestion_id"].as_str().unwrap_or_default().cyan());
    println!("Priority:  {}", report["priority"].as_str().unwrap_or_default());
    if let Some(created) = report["created_at"]
        .as_i64()
        .and_then(chrono::DateTime::from_timestamp_millis)
    {
        println!("Created:   {}", created.to_rfc3339());
    }
    println!("Status:    {}", colorize_status(status));

    if let Some(batches) = report["batches"].as_array() {
        println!("Batches:");
        for batch in batches {
            let ids = batch["ids"].as_array().map(|ids| {
                ids.iter()
                    .map(|id| id.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            });
            let batch_status = batch["status"].as_str().unwrap_or("unknown");
            print!(
                "  {}  [{}]  {}",
                batch["batch_id"].as_str().unwrap_or_default(),
                ids.unwrap_or_default(),
                colorize_status(batch_status)
            );
            match batch["error"].as_str() {
                Some(error) => println!("  {}", error.red()),
                None => println!(),
            }
        }
    }
}

fn colorize_status(status: &str) -> ColoredString {
    match status {
        "completed" => status.green(),
        "failed" => status.red(),
        "triggered" | "partial" => status.yellow(),
        _ => status.normal(),
    }
}

fn cmd_config(config: &Config) -> Result<()> {
    print!("{}", serde_yaml::to_string(config).context("Failed to serialize config")?);
    Ok(())
}
