//! Conservation API entry point.

use std::net::SocketAddr;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use conservation_api::api::{create_router, AppState};
use conservation_api::config::Config;
use conservation_api::conservation::get_diagnostics;
use conservation_api::error::AppError;
use conservation_api::metrics;
use conservation_api::utils::shutdown_signal;

/// Species and country occurrence service over GBIF and REST Countries.
#[derive(Parser, Debug)]
#[command(name = "conservation-api")]
#[command(about = "Species lookup and per-country occurrence listings")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default).
    Serve,

    /// Check configuration validity.
    CheckConfig,

    /// Ping both upstreams once and print the diagnostics report.
    Diag,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Load configuration before logging so LOG_FORMAT applies; report
    // failures once the subscriber is up.
    let config = Config::load();
    let json_logs = config.as_ref().map(Config::json_logs).unwrap_or(false);

    init_logging(args.verbose, json_logs);

    let config = config.map_err(|e| {
        error!("Failed to load configuration: {}", e);
        AppError::Config(e)
    })?;

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(AppError::InvalidConfig(e).into());
    }

    match args.command {
        Some(Command::CheckConfig) => cmd_check_config(&config),
        Some(Command::Diag) => cmd_diag(&config).await,
        Some(Command::Serve) | None => cmd_serve(config).await,
    }
}

fn init_logging(verbose: bool, json: bool) {
    let filter = if verbose {
        EnvFilter::new("conservation_api=debug,tower_http=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

/// Print a configuration summary.
fn cmd_check_config(config: &Config) -> anyhow::Result<()> {
    println!("======================================================================");
    println!("CONSERVATION API - CONFIGURATION CHECK");
    println!("======================================================================");
    println!("  Port: {}", config.port);
    println!("  GBIF: {}", config.gbif_base_url);
    println!("  REST Countries: {}", config.rest_countries_base_url);
    println!("  HTTP timeout: {}ms (connect {}ms)", config.http_timeout_ms, config.http_connect_timeout_ms);
    println!("  Country lookup concurrency: {}", config.country_lookup_concurrency);
    match config.metrics_port {
        Some(port) => println!("  Metrics: enabled on port {}", port),
        None => println!("  Metrics: disabled"),
    }
    println!("  Log format: {}", config.log_format);
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Ping both upstreams and print the report.
async fn cmd_diag(config: &Config) -> anyhow::Result<()> {
    let state = AppState::new(config)?;
    let report = get_diagnostics(&state.client, state.started_at).await;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Run the HTTP server until a shutdown signal arrives.
async fn cmd_serve(config: Config) -> anyhow::Result<()> {
    metrics::init_metrics();
    if let Some(metrics_port) = config.metrics_port {
        metrics::install_exporter(metrics_port)?;
    }

    let state = AppState::new(&config)?;

    info!("GBIF upstream: {}", state.client.gbif_url());
    info!("REST Countries upstream: {}", state.client.rest_countries_url());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await.map_err(AppError::Io)?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Io)?;

    info!("HTTP server stopped");
    Ok(())
}
