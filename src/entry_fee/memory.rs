//! In-memory fee driver.
//!
//! Records are kept in the order they were charged. The duplicate check and
//! the write happen under one write lock.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{GameId, Money, UserId};

use super::{EntryFee, EntryFeeError, EntryFeeResult, EntryFeeStore};

#[derive(Debug, Default)]
pub struct MemoryEntryFeeStore {
    fees: RwLock<Vec<EntryFee>>,
}

impl MemoryEntryFeeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EntryFeeStore for MemoryEntryFeeStore {
    async fn record(&self, game_id: GameId, user_id: UserId, fee: &Money) -> EntryFeeResult<()> {
        let mut fees = self.fees.write().await;
        if fees
            .iter()
            .any(|f| f.game_id == game_id && f.user_id == user_id)
        {
            return Err(EntryFeeError::DuplicateRecord { game_id, user_id });
        }

        fees.push(EntryFee {
            game_id,
            user_id,
            fee: fee.clone(),
        });
        tracing::debug!(game_id = %game_id, user_id = %user_id, amount = fee.amount(), "Entry fee recorded");
        Ok(())
    }

    async fn fees_for_game(&self, game_id: GameId) -> EntryFeeResult<Vec<EntryFee>> {
        let fees = self.fees.read().await;
        Ok(fees.iter().filter(|f| f.game_id == game_id).cloned().collect())
    }

    async fn remove(&self, game_id: GameId, user_id: UserId) -> EntryFeeResult<()> {
        let mut fees = self.fees.write().await;
        let before = fees.len();
        fees.retain(|f| !(f.game_id == game_id && f.user_id == user_id));
        if fees.len() == before {
            return Err(EntryFeeError::NotFound { game_id, user_id });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Currency;

    fn gbp(amount: i64) -> Money {
        Money::new(amount, Currency::new("GBP").unwrap())
    }

    #[tokio::test]
    async fn test_fees_listed_in_charge_order() {
        let store = MemoryEntryFeeStore::new();
        let game_id = GameId::new();
        let (a, b) = (UserId::new(), UserId::new());

        store.record(game_id, b, &gbp(500)).await.unwrap();
        store.record(GameId::new(), a, &gbp(100)).await.unwrap();
        store.record(game_id, a, &gbp(500)).await.unwrap();

        let users: Vec<UserId> = store
            .fees_for_game(game_id)
            .await
            .unwrap()
            .iter()
            .map(|f| f.user_id)
            .collect();
        assert_eq!(users, vec![b, a]);
    }

    #[tokio::test]
    async fn test_second_fee_for_pair_rejected() {
        let store = MemoryEntryFeeStore::new();
        let (game_id, user_id) = (GameId::new(), UserId::new());
        store.record(game_id, user_id, &gbp(500)).await.unwrap();

        let err = store.record(game_id, user_id, &gbp(1)).await.unwrap_err();
        assert!(matches!(err, EntryFeeError::DuplicateRecord { .. }));
        assert_eq!(store.fees_for_game(game_id).await.unwrap()[0].fee, gbp(500));
    }

    #[tokio::test]
    async fn test_remove() {
        let store = MemoryEntryFeeStore::new();
        let (game_id, user_id) = (GameId::new(), UserId::new());
        store.record(game_id, user_id, &gbp(500)).await.unwrap();

        store.remove(game_id, user_id).await.unwrap();
        assert!(store.fees_for_game(game_id).await.unwrap().is_empty());
        assert!(matches!(
            store.remove(game_id, user_id).await,
            Err(EntryFeeError::NotFound { .. })
        ));
    }
}
