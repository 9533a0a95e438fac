//! Statistics Engine
//!
//! Turns the append-only trade log into derived performance metrics:
//! - Summary statistics (win rate, profit factor, drawdown, Sharpe-like ratio)
//! - Cumulative-PnL equity curve for charting
//! - Per-token performance rollup
//!
//! All operations are pure functions over a trade slice: the engine holds no
//! state, reads nothing, mutates nothing. Degenerate numeric cases (empty
//! input, zero variance, zero losses, non-positive capital) resolve to an
//! explicit 0 sentinel, never to NaN/Infinity or a division panic.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::TradeRecord;

/// Fixed trading-day annualization constant for the simplified Sharpe ratio.
const ANNUALIZATION_FACTOR: f64 = 252.0;

/// Summary performance statistics over the full trade set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStatistics {
    pub total_trades: u64,
    pub winning_trades: u64,
    pub losing_trades: u64,
    pub win_rate: f64,
    pub total_pnl: f64,
    pub avg_win: f64,
    /// Average losing-trade magnitude (always non-negative)
    pub avg_loss: f64,
    pub profit_factor: f64,
    /// Largest decline of cumulative PnL from its running peak (always <= 0)
    pub max_drawdown: f64,
    pub max_drawdown_pct: f64,
    pub sharpe_ratio: f64,
    pub expected_value: f64,
    pub roi: f64,
    pub initial_capital: f64,
    pub ending_capital: f64,
    pub trading_days: i64,
    pub trades_per_day: f64,
    pub gross_profit: f64,
    pub gross_loss: f64,
}

impl SummaryStatistics {
    /// Zero-value summary for an empty trade set.
    ///
    /// A distinct branch rather than a degenerate run of the general formulas,
    /// so no division by zero is ever attempted.
    pub fn empty(initial_capital: f64) -> Self {
        Self {
            total_trades: 0,
            winning_trades: 0,
            losing_trades: 0,
            win_rate: 0.0,
            total_pnl: 0.0,
            avg_win: 0.0,
            avg_loss: 0.0,
            profit_factor: 0.0,
            max_drawdown: 0.0,
            max_drawdown_pct: 0.0,
            sharpe_ratio: 0.0,
            expected_value: 0.0,
            roi: 0.0,
            initial_capital,
            ending_capital: initial_capital,
            trading_days: 0,
            trades_per_day: 0.0,
            gross_profit: 0.0,
            gross_loss: 0.0,
        }
    }
}

/// Time-ordered cumulative PnL series for charting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityCurve {
    /// Human-readable entry timestamps, second precision
    pub labels: Vec<String>,
    pub cumulative_pnl: Vec<f64>,
    pub trade_pnl: Vec<f64>,
}

impl EquityCurve {
    pub fn empty() -> Self {
        Self {
            labels: Vec::new(),
            cumulative_pnl: Vec::new(),
            trade_pnl: Vec::new(),
        }
    }
}

/// Per-token performance rollup row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenStats {
    pub token_symbol: String,
    pub total_pnl: f64,
    pub avg_pnl: f64,
    pub trade_count: u64,
    pub avg_pnl_pct: f64,
    pub win_rate: f64,
}

/// Round to 2 decimal places at the output boundary.
/// Intermediate math stays full precision.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Compute summary statistics over the full trade set.
///
/// Order of `trades` is irrelevant: the drawdown and return series are
/// re-sorted by `entry_time` internally. Records missing `pnl` (still open)
/// contribute 0 to the aggregates instead of failing the computation.
pub fn compute_summary(trades: &[TradeRecord], initial_capital: f64) -> SummaryStatistics {
    if trades.is_empty() {
        return SummaryStatistics::empty(initial_capital);
    }

    let total_trades = trades.len() as u64;
    let winning: Vec<f64> = trades
        .iter()
        .filter_map(|t| t.pnl)
        .filter(|p| *p > 0.0)
        .collect();
    let losing: Vec<f64> = trades
        .iter()
        .filter_map(|t| t.pnl)
        .filter(|p| *p < 0.0)
        .collect();

    let winning_trades = winning.len() as u64;
    let losing_trades = losing.len() as u64;
    let win_rate = winning_trades as f64 / total_trades as f64 * 100.0;

    let total_pnl: f64 = trades.iter().filter_map(|t| t.pnl).sum();

    let gross_profit: f64 = winning.iter().sum();
    let gross_loss: f64 = losing.iter().map(|p| p.abs()).sum();

    let avg_win = if winning.is_empty() {
        0.0
    } else {
        gross_profit / winning.len() as f64
    };
    // Magnitude of the mean losing trade, never negative
    let avg_loss = if losing.is_empty() {
        0.0
    } else {
        gross_loss / losing.len() as f64
    };

    // 0 is the sentinel for "no losses to compare against", not infinite edge
    let profit_factor = if gross_loss > 0.0 {
        gross_profit / gross_loss
    } else {
        0.0
    };

    // Ascending entry-time order for the cumulative scans, independent of the
    // order the trades arrived in
    let mut ordered: Vec<&TradeRecord> = trades.iter().collect();
    ordered.sort_by_key(|t| t.entry_time);

    let max_drawdown = max_drawdown(ordered.iter().map(|t| t.pnl.unwrap_or(0.0)));
    let max_drawdown_pct = if initial_capital > 0.0 {
        max_drawdown / initial_capital * 100.0
    } else {
        0.0
    };

    let returns: Vec<f64> = ordered
        .iter()
        .filter_map(|t| t.pnl_percentage)
        .map(|pct| pct / 100.0)
        .collect();
    let sharpe_ratio = sharpe_ratio(&returns);

    let expected_value = (win_rate / 100.0 * avg_win) - ((1.0 - win_rate / 100.0) * avg_loss);

    let first_entry = ordered.first().map(|t| t.entry_time);
    let last_entry = ordered.last().map(|t| t.entry_time);
    let trading_days = match (first_entry, last_entry) {
        (Some(first), Some(last)) => ((last - first).num_days() + 1).max(1),
        _ => 0,
    };
    let trades_per_day = if trading_days > 0 {
        total_trades as f64 / trading_days as f64
    } else {
        0.0
    };

    let ending_capital = initial_capital + total_pnl;
    let roi = if initial_capital > 0.0 {
        total_pnl / initial_capital * 100.0
    } else {
        0.0
    };

    SummaryStatistics {
        total_trades,
        winning_trades,
        losing_trades,
        win_rate: round2(win_rate),
        total_pnl: round2(total_pnl),
        avg_win: round2(avg_win),
        avg_loss: round2(avg_loss),
        profit_factor: round2(profit_factor),
        max_drawdown: round2(max_drawdown),
        max_drawdown_pct: round2(max_drawdown_pct),
        sharpe_ratio: round2(sharpe_ratio),
        expected_value: round2(expected_value),
        roi: round2(roi),
        initial_capital,
        ending_capital: round2(ending_capital),
        trading_days,
        trades_per_day: round2(trades_per_day),
        gross_profit: round2(gross_profit),
        gross_loss: round2(gross_loss),
    }
}

/// Largest decline of the running cumulative sum from its running peak.
///
/// Returns a non-positive value; 0 when the series is empty, a single point,
/// or monotonically non-decreasing.
fn max_drawdown(pnls: impl Iterator<Item = f64>) -> f64 {
    let mut cumulative = 0.0;
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;

    for pnl in pnls {
        cumulative += pnl;
        if cumulative > peak {
            peak = cumulative;
        }
        let drawdown = cumulative - peak;
        if drawdown < max_dd {
            max_dd = drawdown;
        }
    }

    max_dd
}

/// Simplified annualized Sharpe-like ratio over per-trade fractional returns.
///
/// Uses the sample standard deviation and a fixed 252 trading-day constant
/// regardless of actual trade frequency. 0 when the variance is zero or
/// undefined (fewer than two returns).
fn sharpe_ratio(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let std_dev = variance.sqrt();

    if std_dev > 0.0 {
        mean / std_dev * ANNUALIZATION_FACTOR.sqrt()
    } else {
        0.0
    }
}

/// Build the time-ordered equity curve for charting.
///
/// Trades are stably sorted ascending by `entry_time`; labels are the entry
/// timestamps truncated to second precision. Empty input yields three empty
/// vectors.
pub fn compute_equity_curve(trades: &[TradeRecord]) -> EquityCurve {
    if trades.is_empty() {
        return EquityCurve::empty();
    }

    let mut ordered: Vec<&TradeRecord> = trades.iter().collect();
    ordered.sort_by_key(|t| t.entry_time);

    let mut labels = Vec::with_capacity(ordered.len());
    let mut cumulative_pnl = Vec::with_capacity(ordered.len());
    let mut trade_pnl = Vec::with_capacity(ordered.len());

    let mut cumulative = 0.0;
    for trade in ordered {
        let pnl = trade.pnl.unwrap_or(0.0);
        cumulative += pnl;
        labels.push(trade.entry_time.format("%Y-%m-%d %H:%M:%S").to_string());
        cumulative_pnl.push(cumulative);
        trade_pnl.push(pnl);
    }

    EquityCurve {
        labels,
        cumulative_pnl,
        trade_pnl,
    }
}

/// Roll trades up by token symbol.
///
/// Grouping key is the literal symbol string; rows come back sorted by symbol
/// so the output is deterministic for a given input set. Empty input yields
/// an empty vector.
pub fn compute_token_breakdown(trades: &[TradeRecord]) -> Vec<TokenStats> {
    let mut groups: BTreeMap<&str, Vec<&TradeRecord>> = BTreeMap::new();
    for trade in trades {
        groups.entry(&trade.token_symbol).or_default().push(trade);
    }

    groups
        .into_iter()
        .map(|(symbol, group)| {
            let trade_count = group.len() as u64;
            let pnls: Vec<f64> = group.iter().filter_map(|t| t.pnl).collect();
            let pcts: Vec<f64> = group.iter().filter_map(|t| t.pnl_percentage).collect();

            let total_pnl: f64 = pnls.iter().sum();
            let avg_pnl = if pnls.is_empty() {
                0.0
            } else {
                total_pnl / pnls.len() as f64
            };
            let avg_pnl_pct = if pcts.is_empty() {
                0.0
            } else {
                pcts.iter().sum::<f64>() / pcts.len() as f64
            };
            let wins = pnls.iter().filter(|p| **p > 0.0).count();
            let win_rate = wins as f64 / trade_count as f64 * 100.0;

            TokenStats {
                token_symbol: symbol.to_string(),
                total_pnl: round2(total_pnl),
                avg_pnl: round2(avg_pnl),
                trade_count,
                avg_pnl_pct: round2(avg_pnl_pct),
                win_rate: round2(win_rate),
            }
        })
        .collect()
}
