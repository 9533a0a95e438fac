//! Configuration management for SignalSim
//!
//! Loads from config files + environment variables via .env

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub monitor: MonitorConfig,
    pub trading: TradingConfig,
    pub persistence: PersistenceConfig,
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    /// Channel identifier being monitored (for status reporting)
    pub channel: String,
    /// Optional JSON-lines capture file to replay messages from
    pub replay_file: Option<String>,
    /// Max stored chars of source message text per trade
    pub message_text_limit: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TradingConfig {
    /// Take-profit threshold as a percentage of entry price
    pub take_profit_pct: f64,
    /// Stop-loss threshold as a percentage of entry price
    pub stop_loss_pct: f64,
    /// Risk/reward ratio implied by the thresholds (for status reporting)
    pub risk_reward_ratio: f64,
    /// Starting capital, used only for percentage normalization in statistics
    pub initial_capital: f64,
    /// Capital committed per simulated trade
    pub position_size: f64,
    /// Probability that a simulated trade hits take-profit
    pub simulated_win_rate: f64,
    /// Entry price assumed when a signal carries no price
    pub default_entry_price: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PersistenceConfig {
    /// Data directory for the CSV trade journal
    pub data_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    /// Bind address for the HTTP API
    pub host: String,
    /// Port for the HTTP API
    pub port: u16,
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self> {
        // Load .env file first
        dotenvy::dotenv().ok();

        let config = Config::builder()
            // Monitor defaults
            .set_default("monitor.channel", "t.me/trendingssol")?
            .set_default("monitor.replay_file", None::<String>)?
            .set_default("monitor.message_text_limit", 500)?
            // Trading defaults: 10% TP against 6.67% SL is a 1.5:1 risk/reward
            .set_default("trading.take_profit_pct", 10.0)?
            .set_default("trading.stop_loss_pct", 6.67)?
            .set_default("trading.risk_reward_ratio", 1.5)?
            .set_default("trading.initial_capital", 10_000.0)?
            .set_default("trading.position_size", 100.0)?
            .set_default("trading.simulated_win_rate", 0.6)?
            .set_default("trading.default_entry_price", 0.001)?
            // Persistence defaults
            .set_default("persistence.data_dir", "./data")?
            // Dashboard defaults
            .set_default("dashboard.host", "0.0.0.0")?
            .set_default("dashboard.port", 5000)?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Override with environment variables (SIGNALSIM_*)
            .add_source(Environment::with_prefix("SIGNALSIM").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        let app_config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        Ok(app_config)
    }

    /// Generate a digest of the config for logging
    pub fn digest(&self) -> String {
        format!(
            "channel={} tp={:.2}% sl={:.2}% capital={:.2} position={:.2}",
            self.monitor.channel,
            self.trading.take_profit_pct,
            self.trading.stop_loss_pct,
            self.trading.initial_capital,
            self.trading.position_size
        )
    }
}

impl std::fmt::Display for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.digest())
    }
}
