//! SignalSim entry point
//!
//! Wires the message source, monitor, trade store and dashboard API together.

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use signalsim::config::AppConfig;
use signalsim::dashboard::{self, DashboardContext};
use signalsim::monitor::{replay_file_source, ChannelMonitor};
use signalsim::repository::TradeStore;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;
    info!(config = %config.digest(), "SignalSim starting");

    let store = Arc::new(
        TradeStore::open(&config.persistence.data_dir).context("Failed to open trade store")?,
    );

    let (message_tx, message_rx) = mpsc::channel(256);
    let monitor = ChannelMonitor::new(&config, store.clone())?;
    let monitor_task = tokio::spawn(monitor.run(message_rx));

    match config.monitor.replay_file.clone() {
        Some(replay_path) => {
            tokio::spawn(async move {
                if let Err(e) = replay_file_source(&replay_path, message_tx).await {
                    warn!(error = %e, "Replay source failed");
                }
            });
        }
        None => {
            // No live source wired in: dashboard serves recorded history only
            info!("No replay file configured, serving recorded history");
            drop(message_tx);
        }
    }

    let context = Arc::new(DashboardContext { store, config });
    let server_task = tokio::spawn(dashboard::start_server(context));

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        result = server_task => {
            result.context("Dashboard task failed")??;
        }
    }

    monitor_task.abort();
    info!("SignalSim stopped");
    Ok(())
}
