//! Trade Repository
//!
//! Durable store of trade records: an in-memory snapshot fronting an
//! append-only CSV journal of closed trades. Open trades live in memory only;
//! a record reaches the journal exactly once, at the moment it closes, so
//! journal rows are immutable by construction.

use chrono::Utc;
use csv::{ReaderBuilder, WriterBuilder};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::types::{NewTrade, TradeExit, TradeRecord};

/// Repository failure taxonomy. The dashboard boundary downgrades these to
/// empty results; everything else propagates.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("trade {0} not found")]
    NotFound(u64),
    #[error("trade {id}: {reason}")]
    InvalidTransition { id: u64, reason: String },
    #[error("journal I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("journal encoding error: {0}")]
    Csv(#[from] csv::Error),
}

struct StoreInner {
    trades: Vec<TradeRecord>,
    next_id: u64,
}

/// CSV-journaled trade store
pub struct TradeStore {
    inner: RwLock<StoreInner>,
    journal: RwLock<csv::Writer<std::fs::File>>,
}

impl TradeStore {
    /// Open the store under `data_dir`, replaying any existing journal files
    /// to rebuild trade history.
    pub fn open(data_dir: &str) -> Result<Self, StoreError> {
        let trades_dir = PathBuf::from(data_dir).join("trades");
        fs::create_dir_all(&trades_dir)?;

        let trades = Self::replay_journal(&trades_dir)?;
        let next_id = trades.iter().map(|t| t.id).max().map_or(1, |id| id + 1);
        info!(
            dir = %trades_dir.display(),
            replayed = trades.len(),
            next_id,
            "Trade store opened"
        );

        let filename = format!("trades_{}.csv", Utc::now().format("%Y-%m-%d"));
        let journal = Self::create_writer(&trades_dir, &filename)?;

        Ok(Self {
            inner: RwLock::new(StoreInner { trades, next_id }),
            journal: RwLock::new(journal),
        })
    }

    fn create_writer(dir: &Path, filename: &str) -> Result<csv::Writer<std::fs::File>, StoreError> {
        let path = dir.join(filename);
        let file_has_data =
            path.exists() && fs::metadata(&path).map(|m| m.len() > 0).unwrap_or(false);

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .append(true)
            .open(&path)?;

        let writer = WriterBuilder::new()
            .has_headers(!file_has_data)
            .from_writer(file);

        Ok(writer)
    }

    fn replay_journal(trades_dir: &Path) -> Result<Vec<TradeRecord>, StoreError> {
        let mut records = Vec::new();

        let mut paths: Vec<PathBuf> = fs::read_dir(trades_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.is_file()
                    && p.file_name()
                        .and_then(|n| n.to_str())
                        .map(|n| n.starts_with("trades_") && n.ends_with(".csv"))
                        .unwrap_or(false)
            })
            .collect();
        paths.sort();

        for path in paths {
            let file = std::fs::File::open(&path)?;
            let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);
            for result in reader.deserialize() {
                match result {
                    Ok(record) => records.push(record),
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Skipping malformed journal row");
                    }
                }
            }
        }

        records.sort_by_key(|r: &TradeRecord| r.id);
        Ok(records)
    }

    /// Append a new OPEN trade and return its assigned id.
    pub async fn insert(&self, new: NewTrade) -> Result<u64, StoreError> {
        let mut inner = self.inner.write().await;
        let id = inner.next_id;
        inner.next_id += 1;
        inner.trades.push(TradeRecord::open(id, new));
        Ok(id)
    }

    /// Close an open trade: the single open -> closed point update. The
    /// closed record is appended to the journal.
    pub async fn close(&self, id: u64, exit: TradeExit) -> Result<TradeRecord, StoreError> {
        let closed = {
            let mut inner = self.inner.write().await;
            let trade = inner
                .trades
                .iter_mut()
                .find(|t| t.id == id)
                .ok_or(StoreError::NotFound(id))?;
            trade.close(exit).map_err(|e| StoreError::InvalidTransition {
                id,
                reason: e.to_string(),
            })?;
            trade.clone()
        };

        let mut journal = self.journal.write().await;
        journal.serialize(&closed)?;
        journal.flush()?;
        Ok(closed)
    }

    /// Full trade set, any order.
    pub async fn all_trades(&self) -> Result<Vec<TradeRecord>, StoreError> {
        Ok(self.inner.read().await.trades.clone())
    }

    /// Trades still open, for status reporting.
    pub async fn open_trades(&self) -> Result<Vec<TradeRecord>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .trades
            .iter()
            .filter(|t| t.is_open())
            .cloned()
            .collect())
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.trades.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ExitType;
    use chrono::TimeZone;

    fn temp_data_dir(test_name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "signalsim_store_{}_{}",
            test_name,
            uuid::Uuid::new_v4()
        ))
    }

    fn sample_new_trade(symbol: &str) -> NewTrade {
        NewTrade {
            token_symbol: symbol.to_string(),
            token_address: Some("DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263".to_string()),
            entry_price: 1.0,
            entry_time: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            position_size: 100.0,
            take_profit_price: 1.1,
            stop_loss_price: 0.9333,
            message_id: Some(1),
            message_text: Some("$BONK".to_string()),
            channel: Some("t.me/test".to_string()),
        }
    }

    fn sample_exit(pnl: f64) -> TradeExit {
        TradeExit {
            exit_price: 1.1,
            exit_time: Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap(),
            exit_type: ExitType::TakeProfit,
            pnl,
            pnl_percentage: 10.0,
        }
    }

    #[tokio::test]
    async fn insert_assigns_sequential_ids() {
        let dir = temp_data_dir("ids");
        let store = TradeStore::open(dir.to_str().unwrap()).unwrap();

        let first = store.insert(sample_new_trade("BONK")).await.unwrap();
        let second = store.insert(sample_new_trade("WIF")).await.unwrap();
        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert_eq!(store.len().await, 2);

        fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn close_moves_trade_to_closed_and_journals_it() {
        let dir = temp_data_dir("close");
        let store = TradeStore::open(dir.to_str().unwrap()).unwrap();

        let id = store.insert(sample_new_trade("BONK")).await.unwrap();
        let closed = store.close(id, sample_exit(10.0)).await.unwrap();
        assert!(closed.is_closed());
        assert_eq!(closed.pnl, Some(10.0));
        assert!(store.open_trades().await.unwrap().is_empty());

        // Journal replay rebuilds the closed trade
        let reopened = TradeStore::open(dir.to_str().unwrap()).unwrap();
        let trades = reopened.all_trades().await.unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].id, id);
        assert_eq!(trades[0].pnl, Some(10.0));
        assert_eq!(trades[0].exit_type, Some(ExitType::TakeProfit));

        fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn replay_continues_id_sequence() {
        let dir = temp_data_dir("sequence");
        {
            let store = TradeStore::open(dir.to_str().unwrap()).unwrap();
            let id = store.insert(sample_new_trade("BONK")).await.unwrap();
            store.close(id, sample_exit(10.0)).await.unwrap();
        }

        let store = TradeStore::open(dir.to_str().unwrap()).unwrap();
        let next = store.insert(sample_new_trade("WIF")).await.unwrap();
        assert_eq!(next, 2);

        fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn closing_unknown_or_closed_trade_fails() {
        let dir = temp_data_dir("errors");
        let store = TradeStore::open(dir.to_str().unwrap()).unwrap();

        assert!(matches!(
            store.close(99, sample_exit(10.0)).await,
            Err(StoreError::NotFound(99))
        ));

        let id = store.insert(sample_new_trade("BONK")).await.unwrap();
        store.close(id, sample_exit(10.0)).await.unwrap();
        assert!(matches!(
            store.close(id, sample_exit(10.0)).await,
            Err(StoreError::InvalidTransition { .. })
        ));

        fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn open_trades_are_not_journaled() {
        let dir = temp_data_dir("open_only");
        {
            let store = TradeStore::open(dir.to_str().unwrap()).unwrap();
            store.insert(sample_new_trade("BONK")).await.unwrap();
        }

        let reopened = TradeStore::open(dir.to_str().unwrap()).unwrap();
        assert!(reopened.is_empty().await);

        fs::remove_dir_all(&dir).ok();
    }
}
