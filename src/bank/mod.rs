//! Admin Bank
//!
//! Append-only ledger holding one deposit per game. The balance is never
//! stored; every query re-reads all records and folds them from zero in the
//! ledger's reference currency.

pub mod log;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::domain::{money, Currency, GameId, Money, MoneyError};

pub use log::LogBank;
pub use memory::MemoryBank;
pub use postgres::PgBank;

/// Key namespace for ledger records
pub const KEY: &str = "admin-bank";

/// Default reference currency of the ledger fold
pub const DEFAULT_CURRENCY: &str = "FAKE";

/// Errors raised by a ledger driver
#[derive(Debug, thiserror::Error)]
pub enum BankError {
    /// A record already exists for the game
    #[error("Record for Game {0} already exists")]
    DuplicateRecord(GameId),

    /// Stored currencies could not be folded together
    #[error(transparent)]
    Money(#[from] MoneyError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type BankResult<T> = Result<T, BankError>;

/// Ledger of per-game funds
#[async_trait]
pub trait Bank: Send + Sync {
    /// Record `money` against `game_id`. A game can only be deposited once.
    async fn deposit(&self, game_id: GameId, money: &Money) -> BankResult<()>;

    /// Sum of every recorded deposit
    async fn get_balance(&self) -> BankResult<Money>;
}

/// Record key for a game, `admin-bank:<game id>`
pub fn record_key(game_id: GameId) -> String {
    format!("{}:{}", KEY, game_id)
}

/// Fold stored records from zero in the reference currency.
fn fold_balance<'a, I>(currency: &Currency, records: I) -> BankResult<Money>
where
    I: IntoIterator<Item = &'a Money>,
{
    Ok(money::sum(currency.clone(), records)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_key() {
        let id: GameId = "5a095ea0-bc3f-4534-a0ee-074e731a5892".parse().unwrap();
        assert_eq!(record_key(id), "admin-bank:5a095ea0-bc3f-4534-a0ee-074e731a5892");
    }

    #[test]
    fn test_duplicate_message() {
        let id: GameId = "5a095ea0-bc3f-4534-a0ee-074e731a5892".parse().unwrap();
        assert_eq!(
            BankError::DuplicateRecord(id).to_string(),
            "Record for Game 5a095ea0-bc3f-4534-a0ee-074e731a5892 already exists"
        );
    }

    #[test]
    fn test_fold_rejects_foreign_currency() {
        let fake = Currency::new(DEFAULT_CURRENCY).unwrap();
        let gbp = Money::new(10, Currency::new("GBP").unwrap());
        assert!(matches!(
            fold_balance(&fake, [&gbp]),
            Err(BankError::Money(MoneyError::CurrencyMismatch { .. }))
        ));
    }
}
