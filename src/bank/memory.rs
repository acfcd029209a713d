//! In-memory ledger driver.
//!
//! A key-value map of `admin-bank:<game id>` to the JSON form of the deposit.
//! The existence check and the write happen under one write lock.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{Currency, GameId, Money};

use super::{fold_balance, record_key, Bank, BankError, BankResult, KEY};

#[derive(Debug)]
pub struct MemoryBank {
    records: RwLock<HashMap<String, String>>,
    currency: Currency,
}

impl MemoryBank {
    /// Create an empty ledger folding in `currency`
    pub fn new(currency: Currency) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            currency,
        }
    }
}

#[async_trait]
impl Bank for MemoryBank {
    async fn deposit(&self, game_id: GameId, money: &Money) -> BankResult<()> {
        let key = record_key(game_id);
        let mut records = self.records.write().await;
        if records.contains_key(&key) {
            return Err(BankError::DuplicateRecord(game_id));
        }

        records.insert(key, serde_json::to_string(money)?);
        tracing::debug!(game_id = %game_id, amount = money.amount(), "Ledger deposit recorded");
        Ok(())
    }

    async fn get_balance(&self) -> BankResult<Money> {
        let records = self.records.read().await;
        let values = records
            .iter()
            .filter(|(key, _)| key.contains(KEY))
            .map(|(_, value)| serde_json::from_str::<Money>(value))
            .collect::<Result<Vec<_>, _>>()?;

        fold_balance(&self.currency, &values)
    }
}
