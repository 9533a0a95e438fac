//! Channel Monitor
//!
//! Consumes the opaque message stream from the monitored channel, dedupes by
//! message id, extracts token signals and runs each one through the trade
//! simulator into the repository. Channel connectivity lives outside this
//! module: anything able to push `ChannelMessage` values into the mpsc sender
//! can drive it, including the JSON-lines replay source below.

use anyhow::{Context, Result};
use chrono::Utc;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::AppConfig;
use crate::extractor::SignalExtractor;
use crate::repository::TradeStore;
use crate::simulator::TradeSimulator;
use crate::types::{ChannelMessage, TradeRecord};

pub struct ChannelMonitor {
    extractor: SignalExtractor,
    simulator: TradeSimulator,
    store: Arc<TradeStore>,
    channel: String,
    message_text_limit: usize,
    processed: HashSet<i64>,
    rng: SmallRng,
}

impl ChannelMonitor {
    pub fn new(config: &AppConfig, store: Arc<TradeStore>) -> Result<Self> {
        Self::with_rng(config, store, SmallRng::from_entropy())
    }

    /// Construct with an explicit RNG so outcomes are reproducible in tests
    /// and replays.
    pub fn with_rng(config: &AppConfig, store: Arc<TradeStore>, rng: SmallRng) -> Result<Self> {
        Ok(Self {
            extractor: SignalExtractor::new()?,
            simulator: TradeSimulator::new(config.trading.clone()),
            store,
            channel: config.monitor.channel.clone(),
            message_text_limit: config.monitor.message_text_limit,
            processed: HashSet::new(),
            rng,
        })
    }

    /// Drain the message stream until the sender side closes.
    ///
    /// A failed message never stops the stream; it is logged and the monitor
    /// moves on.
    pub async fn run(mut self, mut rx: mpsc::Receiver<ChannelMessage>) -> Result<()> {
        info!(channel = %self.channel, "Monitor started");
        while let Some(message) = rx.recv().await {
            if let Err(e) = self.process_message(&message).await {
                error!(message_id = message.id, error = %e, "Failed to process message");
            }
        }
        info!(channel = %self.channel, "Message stream ended");
        Ok(())
    }

    /// Process one message: dedupe, extract, simulate, persist.
    pub async fn process_message(&mut self, message: &ChannelMessage) -> Result<()> {
        if !self.processed.insert(message.id) {
            debug!(message_id = message.id, "Duplicate message skipped");
            return Ok(());
        }

        let Some(signal) = self.extractor.extract(&message.text) else {
            debug!(message_id = message.id, "No signal in message");
            return Ok(());
        };
        info!(
            message_id = message.id,
            symbol = %signal.symbol,
            price = ?signal.price,
            "New token detected"
        );

        let new_trade = self.simulator.prepare_trade(
            &signal,
            message,
            &self.channel,
            self.message_text_limit,
        );
        let id = self
            .store
            .insert(new_trade.clone())
            .await
            .context("Failed to save trade")?;

        // Local copy of the open record for outcome resolution
        let open = TradeRecord::open(id, new_trade);
        let exit = self.simulator.resolve(&open, Utc::now(), &mut self.rng);
        let closed = self
            .store
            .close(id, exit)
            .await
            .context("Failed to close trade")?;

        info!(
            trade_id = closed.id,
            symbol = %closed.token_symbol,
            exit_type = %exit.exit_type,
            pnl = exit.pnl,
            "Trade completed"
        );
        Ok(())
    }
}

/// Replay a JSON-lines capture of channel messages into the monitor's queue.
///
/// Malformed lines are logged and skipped so one bad capture row never kills
/// a replay.
pub async fn replay_file_source(path: &str, tx: mpsc::Sender<ChannelMessage>) -> Result<()> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read replay file {path}"))?;

    let mut sent = 0usize;
    for (line_no, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<ChannelMessage>(line) {
            Ok(message) => {
                if tx.send(message).await.is_err() {
                    break;
                }
                sent += 1;
            }
            Err(e) => {
                warn!(line = line_no + 1, error = %e, "Skipping malformed replay line");
            }
        }
    }

    info!(path, sent, "Replay finished");
    Ok(())
}
