//! Trade Simulator
//!
//! Turns an extracted signal into an OPEN trade with fixed take-profit /
//! stop-loss thresholds, then resolves the outcome. Outcome resolution is a
//! stochastic stand-in for real price movement: the RNG is injected so tests
//! and replays stay deterministic.

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::config::TradingConfig;
use crate::types::{ChannelMessage, ExitType, ExtractedSignal, NewTrade, TradeExit, TradeRecord};

pub struct TradeSimulator {
    config: TradingConfig,
}

impl TradeSimulator {
    pub fn new(config: TradingConfig) -> Self {
        Self { config }
    }

    /// Build the new-trade fields for a signal: entry at the extracted price
    /// (or the configured default), thresholds derived from the TP/SL
    /// percentages.
    pub fn prepare_trade(
        &self,
        signal: &ExtractedSignal,
        message: &ChannelMessage,
        channel: &str,
        message_text_limit: usize,
    ) -> NewTrade {
        let entry_price = signal.price.unwrap_or(self.config.default_entry_price);
        let take_profit_price = entry_price * (1.0 + self.config.take_profit_pct / 100.0);
        let stop_loss_price = entry_price * (1.0 - self.config.stop_loss_pct / 100.0);

        let message_text = if message.text.is_empty() {
            None
        } else {
            Some(message.text.chars().take(message_text_limit).collect())
        };

        NewTrade {
            token_symbol: signal.symbol.clone(),
            token_address: signal.address.clone(),
            entry_price,
            entry_time: message.timestamp,
            position_size: self.config.position_size,
            take_profit_price,
            stop_loss_price,
            message_id: Some(message.id),
            message_text,
            channel: Some(channel.to_string()),
        }
    }

    /// Resolve an open trade to its final outcome.
    ///
    /// With probability `simulated_win_rate` the take-profit threshold is hit,
    /// otherwise the stop-loss. PnL is the committed position size scaled by
    /// the threshold percentage; pnl_percentage is the raw price move.
    pub fn resolve<R: Rng + ?Sized>(
        &self,
        trade: &TradeRecord,
        exit_time: DateTime<Utc>,
        rng: &mut R,
    ) -> TradeExit {
        let take_profit_hit = rng.gen::<f64>() < self.config.simulated_win_rate;

        let (exit_price, exit_type, pnl) = if take_profit_hit {
            (
                trade.take_profit_price,
                ExitType::TakeProfit,
                trade.position_size * (self.config.take_profit_pct / 100.0),
            )
        } else {
            (
                trade.stop_loss_price,
                ExitType::StopLoss,
                -trade.position_size * (self.config.stop_loss_pct / 100.0),
            )
        };

        let pnl_percentage = (exit_price - trade.entry_price) / trade.entry_price * 100.0;

        TradeExit {
            exit_price,
            exit_time,
            exit_type,
            pnl,
            pnl_percentage,
        }
    }
}
