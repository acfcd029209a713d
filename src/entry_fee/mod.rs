//! Entry fees
//!
//! Record of the buy-in each user paid to enter a game. At most one fee is
//! held per (game, user) pair; a fee is removed again only when the entry it
//! paid for is rolled back.

pub mod log;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::{GameId, Money, MoneyError, UserId};

pub use log::LogEntryFeeStore;
pub use memory::MemoryEntryFeeStore;
pub use postgres::PgEntryFeeStore;

/// Key namespace for fee records
pub const KEY: &str = "entry-fee";

/// A fee paid by one user for one game
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryFee {
    pub game_id: GameId,
    pub user_id: UserId,
    pub fee: Money,
}

/// Errors raised by a fee store driver
#[derive(Debug, thiserror::Error)]
pub enum EntryFeeError {
    #[error("Entry fee for User {user_id} in Game {game_id} already exists")]
    DuplicateRecord { game_id: GameId, user_id: UserId },

    #[error("Entry fee for User {user_id} in Game {game_id} does not exist")]
    NotFound { game_id: GameId, user_id: UserId },

    #[error(transparent)]
    Money(#[from] MoneyError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type EntryFeeResult<T> = Result<T, EntryFeeError>;

/// Store of paid entry fees
#[async_trait]
pub trait EntryFeeStore: Send + Sync {
    /// Record `fee` for the pair. A pair can only be charged once.
    async fn record(&self, game_id: GameId, user_id: UserId, fee: &Money) -> EntryFeeResult<()>;

    /// Fees paid for a game, in the order they were recorded
    async fn fees_for_game(&self, game_id: GameId) -> EntryFeeResult<Vec<EntryFee>>;

    /// Drop the fee for the pair
    async fn remove(&self, game_id: GameId, user_id: UserId) -> EntryFeeResult<()>;
}

/// Record key for a pair, `entry-fee:<game id>:<user id>`
pub fn record_key(game_id: GameId, user_id: UserId) -> String {
    format!("{}:{}:{}", KEY, game_id, user_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_key() {
        let game_id: GameId = "5a095ea0-bc3f-4534-a0ee-074e731a5892".parse().unwrap();
        let user_id: UserId = "b1d2c7e4-1f3a-4c5e-9a8b-2d6f0e1c3b4a".parse().unwrap();
        assert_eq!(
            record_key(game_id, user_id),
            "entry-fee:5a095ea0-bc3f-4534-a0ee-074e731a5892:b1d2c7e4-1f3a-4c5e-9a8b-2d6f0e1c3b4a"
        );
    }
}
