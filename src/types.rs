//! Core types used throughout SignalSim
//!
//! Defines the trade record, signal and message structures shared by the
//! monitor, simulator, repository and statistics engine.

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Trade lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeStatus {
    Open,
    Closed,
}

impl Default for TradeStatus {
    fn default() -> Self {
        TradeStatus::Open
    }
}

impl fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeStatus::Open => write!(f, "OPEN"),
            TradeStatus::Closed => write!(f, "CLOSED"),
        }
    }
}

/// Why a trade was closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitType {
    TakeProfit,
    StopLoss,
    Manual,
}

impl fmt::Display for ExitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitType::TakeProfit => write!(f, "TAKE_PROFIT"),
            ExitType::StopLoss => write!(f, "STOP_LOSS"),
            ExitType::Manual => write!(f, "MANUAL"),
        }
    }
}

/// Raw message from the monitored channel.
///
/// Connectivity is out of scope: messages arrive on a channel as an opaque
/// `(id, text, timestamp)` stream regardless of the transport behind it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelMessage {
    /// Message id, unique within the channel
    pub id: i64,
    /// Full message text
    pub text: String,
    /// When the message was posted
    pub timestamp: DateTime<Utc>,
}

/// Token signal heuristically extracted from a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedSignal {
    /// Sanitized uppercase token symbol
    pub symbol: String,
    /// Contract address, if one was found in the text
    pub address: Option<String>,
    /// Entry price, if one was found in the text
    pub price: Option<f64>,
}

/// Fields required to open a new trade; the repository assigns the id.
#[derive(Debug, Clone)]
pub struct NewTrade {
    pub token_symbol: String,
    pub token_address: Option<String>,
    pub entry_price: f64,
    pub entry_time: DateTime<Utc>,
    pub position_size: f64,
    pub take_profit_price: f64,
    pub stop_loss_price: f64,
    pub message_id: Option<i64>,
    pub message_text: Option<String>,
    pub channel: Option<String>,
}

/// Final outcome applied to an open trade.
///
/// Closing is a single typed transition: there is no free-form field patching
/// of a trade record.
#[derive(Debug, Clone, Copy)]
pub struct TradeExit {
    pub exit_price: f64,
    pub exit_time: DateTime<Utc>,
    pub exit_type: ExitType,
    pub pnl: f64,
    pub pnl_percentage: f64,
}

/// One simulated trade, immutable once closed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    /// Repository-assigned id
    pub id: u64,
    /// Token symbol (not unique across trades)
    pub token_symbol: String,
    /// Contract address, if known
    pub token_address: Option<String>,
    /// Entry price
    pub entry_price: f64,
    /// Exit price (set on close)
    pub exit_price: Option<f64>,
    /// Entry timestamp
    pub entry_time: DateTime<Utc>,
    /// Exit timestamp (set on close)
    pub exit_time: Option<DateTime<Utc>>,
    /// Capital committed to the trade
    pub position_size: f64,
    /// Computed take-profit threshold
    pub take_profit_price: f64,
    /// Computed stop-loss threshold
    pub stop_loss_price: f64,
    /// Exit reason (set on close)
    pub exit_type: Option<ExitType>,
    /// Profit/loss in currency units (set on close)
    pub pnl: Option<f64>,
    /// Profit/loss as a percentage of entry price (set on close)
    pub pnl_percentage: Option<f64>,
    /// Lifecycle status
    pub status: TradeStatus,
    /// Source message id
    pub message_id: Option<i64>,
    /// Source message text (truncated)
    pub message_text: Option<String>,
    /// Source channel identifier
    pub channel: Option<String>,
}

impl TradeRecord {
    /// Build an OPEN record from new-trade fields and an assigned id.
    pub fn open(id: u64, new: NewTrade) -> Self {
        Self {
            id,
            token_symbol: new.token_symbol,
            token_address: new.token_address,
            entry_price: new.entry_price,
            exit_price: None,
            entry_time: new.entry_time,
            exit_time: None,
            position_size: new.position_size,
            take_profit_price: new.take_profit_price,
            stop_loss_price: new.stop_loss_price,
            exit_type: None,
            pnl: None,
            pnl_percentage: None,
            status: TradeStatus::Open,
            message_id: new.message_id,
            message_text: new.message_text,
            channel: new.channel,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == TradeStatus::Open
    }

    pub fn is_closed(&self) -> bool {
        self.status == TradeStatus::Closed
    }

    /// Apply the open -> closed transition exactly once.
    ///
    /// Closed records are terminal; a second close is rejected, as is an exit
    /// timestamp before the entry timestamp.
    pub fn close(&mut self, exit: TradeExit) -> Result<()> {
        if self.is_closed() {
            bail!("trade {} is already closed", self.id);
        }
        if exit.exit_time < self.entry_time {
            bail!(
                "trade {}: exit_time {} precedes entry_time {}",
                self.id,
                exit.exit_time,
                self.entry_time
            );
        }

        self.exit_price = Some(exit.exit_price);
        self.exit_time = Some(exit.exit_time);
        self.exit_type = Some(exit.exit_type);
        self.pnl = Some(exit.pnl);
        self.pnl_percentage = Some(exit.pnl_percentage);
        self.status = TradeStatus::Closed;
        Ok(())
    }
}
