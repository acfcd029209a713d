//! Logging fee driver.
//!
//! Charges are emitted as tracing events only. Nothing is retained, so no
//! game ever lists a fee and duplicates cannot be detected.

use async_trait::async_trait;

use crate::domain::{GameId, Money, UserId};

use super::{EntryFee, EntryFeeResult, EntryFeeStore};

#[derive(Debug, Clone, Default)]
pub struct LogEntryFeeStore;

impl LogEntryFeeStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EntryFeeStore for LogEntryFeeStore {
    async fn record(&self, game_id: GameId, user_id: UserId, fee: &Money) -> EntryFeeResult<()> {
        tracing::info!(
            game_id = %game_id,
            user_id = %user_id,
            amount = fee.amount(),
            currency = %fee.currency(),
            "Entry fee charged"
        );
        Ok(())
    }

    async fn fees_for_game(&self, _game_id: GameId) -> EntryFeeResult<Vec<EntryFee>> {
        Ok(Vec::new())
    }

    async fn remove(&self, game_id: GameId, user_id: UserId) -> EntryFeeResult<()> {
        tracing::info!(game_id = %game_id, user_id = %user_id, "Entry fee refunded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Currency;

    #[tokio::test]
    async fn test_log_store_keeps_nothing() {
        let store = LogEntryFeeStore::new();
        let (game_id, user_id) = (GameId::new(), UserId::new());
        let fee = Money::new(500, Currency::new("GBP").unwrap());

        store.record(game_id, user_id, &fee).await.unwrap();
        store.record(game_id, user_id, &fee).await.unwrap();

        assert!(store.fees_for_game(game_id).await.unwrap().is_empty());
        store.remove(game_id, user_id).await.unwrap();
    }
}
