//! Relayer Keepalive - Entry Point
//!
//! Keeps a channel's clients fresh and serves health gauges for Prometheus.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info};

use relayer_keepalive::ledger::{CommandLedgerClient, LedgerClient};
use relayer_keepalive::metrics::{Exporter, MetricsRegistry};
use relayer_keepalive::supervisor::Schedule;
use relayer_keepalive::{Config, Supervisor, VERSION};

/// Relayer Keepalive - keeps an inter-chain channel alive
#[derive(Parser)]
#[command(name = "relayer-keepalive")]
#[command(version = VERSION)]
#[command(about = "Keeps an inter-chain channel alive and exports its health")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, default_value = "keepalive.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Regularly sends client updates to keep a channel alive
    ///
    /// Without a client ID both ends' clients are updated. With one, only the
    /// client on the path's source chain is.
    #[command(name = "keep-alive", alias = "keepAlive")]
    KeepAlive {
        /// Name of the configured path
        path: String,
        /// Client to update on the source chain
        client_id: Option<String>,
        /// Seconds between client updates
        #[arg(short, long, default_value_t = 5390)]
        interval: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::KeepAlive {
            path,
            client_id,
            interval,
        } => keep_alive(cli.config, path, client_id, interval).await,
    }
}

async fn keep_alive(
    config_path: PathBuf,
    path_name: String,
    client_id: Option<String>,
    interval: u64,
) -> Result<()> {
    // Load configuration
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Initialize tracing/logging
    relayer_keepalive::util::init_tracing(&config.logging)?;

    if interval == 0 {
        anyhow::bail!("--interval must be > 0");
    }
    let path = config.paths.get(&path_name)?;

    info!(
        version = VERSION,
        config_path = ?config_path,
        path = %path.name,
        client_id = ?client_id,
        interval_secs = interval,
        "Starting Relayer Keepalive"
    );

    let registry = Arc::new(MetricsRegistry::new(
        &config.metrics.namespace,
        &config.metrics.subsystem,
    ));
    let exporter = Exporter::bind(config.metrics.bind_addr, registry.clone())?;

    let client: Arc<dyn LedgerClient> =
        Arc::new(CommandLedgerClient::new(&config.relayer, config.chain_ids()));

    let schedule = Schedule {
        update_interval: Duration::from_secs(interval),
        channel_interval: config.probes.channel_interval(),
        unrelayed_interval: config.probes.unrelayed_interval(),
        restart_delay: config.probes.restart_delay(),
    };
    let supervisor = Supervisor::keep_alive(
        client,
        &registry,
        &path,
        client_id.as_deref(),
        &schedule,
    );

    tokio::select! {
        result = exporter.serve() => {
            if let Err(e) = result {
                error!(error = %e, "Metrics endpoint error");
                return Err(e);
            }
        }
        _ = supervisor.run() => {
            error!("All probe tasks exited");
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    info!("Relayer Keepalive stopped");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
