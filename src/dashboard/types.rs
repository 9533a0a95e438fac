//! Dashboard API Types
//!
//! DTOs for HTTP communication with the dashboard frontend.

use serde::{Deserialize, Serialize};

use crate::types::TradeRecord;

/// One trade row as rendered by the frontend. Prices carry four decimals so
/// sub-cent token entries stay readable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRow {
    pub id: u64,
    pub token_symbol: String,
    pub token_address: Option<String>,
    pub entry_price: f64,
    pub exit_price: Option<f64>,
    pub entry_time: String,
    pub exit_time: Option<String>,
    pub position_size: f64,
    pub exit_type: Option<String>,
    pub pnl: Option<f64>,
    pub pnl_percentage: Option<f64>,
    pub status: String,
}

impl From<&TradeRecord> for TradeRow {
    fn from(trade: &TradeRecord) -> Self {
        Self {
            id: trade.id,
            token_symbol: trade.token_symbol.clone(),
            token_address: trade.token_address.clone(),
            entry_price: round4(trade.entry_price),
            exit_price: trade.exit_price.map(round4),
            entry_time: trade.entry_time.format("%Y-%m-%d %H:%M:%S").to_string(),
            exit_time: trade
                .exit_time
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string()),
            position_size: trade.position_size,
            exit_type: trade.exit_type.map(|e| e.to_string()),
            pnl: trade.pnl.map(round2),
            pnl_percentage: trade.pnl_percentage.map(round2),
            status: trade.status.to_string(),
        }
    }
}

/// GET /api/system-status payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemStatusResponse {
    pub running: bool,
    pub channel: String,
    pub total_trades: usize,
    pub open_trades: usize,
    pub take_profit_pct: f64,
    pub stop_loss_pct: f64,
    pub risk_reward_ratio: f64,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
