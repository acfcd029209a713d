//! Purse Orchestrator
//!
//! One balance per user. Balance changes are applied by the store as a single
//! atomic delta, so concurrent credits and debits never overwrite each other.

use std::sync::Arc;

use crate::aggregate::UserPurse;
use crate::domain::{DomainError, Money, MoneyError, UserId};
use crate::error::AppResult;
use crate::store::{PurseReader, PurseWriter};

pub struct PurseOrchestrator {
    reader: Arc<dyn PurseReader>,
    writer: Arc<dyn PurseWriter>,
}

impl PurseOrchestrator {
    pub fn new(reader: Arc<dyn PurseReader>, writer: Arc<dyn PurseWriter>) -> Self {
        Self { reader, writer }
    }

    /// Fails with a duplicate record error if the user already has a purse
    pub async fn create_user_purse(&self, purse: &UserPurse) -> AppResult<UserPurse> {
        let purse = self.writer.insert(purse).await?;
        tracing::info!(user_id = %purse.user_id(), currency = %purse.balance().currency(), "Purse created");
        Ok(purse)
    }

    pub async fn get_user_purse(&self, user_id: UserId) -> AppResult<UserPurse> {
        Ok(self.reader.get(user_id).await?)
    }

    /// Add `amount` to the user's balance
    pub async fn credit(&self, user_id: UserId, amount: &Money) -> AppResult<UserPurse> {
        ensure_not_negative(amount)?;
        let purse = self.writer.apply_delta(user_id, amount).await?;

        tracing::info!(user_id = %user_id, amount = amount.amount(), "Purse credited");
        Ok(purse)
    }

    /// Take `amount` from the user's balance; fails if the balance is too low
    pub async fn debit(&self, user_id: UserId, amount: &Money) -> AppResult<UserPurse> {
        ensure_not_negative(amount)?;
        let delta = Money::new(-amount.amount(), amount.currency().clone());
        let purse = match self.writer.apply_delta(user_id, &delta).await {
            Ok(purse) => purse,
            Err(e) => {
                tracing::debug!(user_id = %user_id, error = %e, "Debit rejected");
                return Err(e.into());
            }
        };

        tracing::info!(user_id = %user_id, amount = amount.amount(), "Purse debited");
        Ok(purse)
    }
}

fn ensure_not_negative(amount: &Money) -> Result<(), DomainError> {
    if amount.is_negative() {
        return Err(MoneyError::Negative(amount.amount()).into());
    }
    Ok(())
}
