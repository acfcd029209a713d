//! Logging ledger driver.
//!
//! Records deposits as tracing events only. Nothing is retained, so the
//! balance is always zero and duplicates cannot be detected.

use async_trait::async_trait;

use crate::domain::{Currency, GameId, Money};

use super::{Bank, BankResult};

#[derive(Debug, Clone)]
pub struct LogBank {
    currency: Currency,
}

impl LogBank {
    pub fn new(currency: Currency) -> Self {
        Self { currency }
    }
}

#[async_trait]
impl Bank for LogBank {
    async fn deposit(&self, game_id: GameId, money: &Money) -> BankResult<()> {
        tracing::info!(
            game_id = %game_id,
            amount = money.amount(),
            currency = %money.currency(),
            "Admin bank deposit"
        );
        Ok(())
    }

    async fn get_balance(&self) -> BankResult<Money> {
        Ok(Money::zero(self.currency.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_bank_keeps_nothing() {
        let fake = Currency::new("FAKE").unwrap();
        let bank = LogBank::new(fake.clone());
        let game_id = GameId::new();

        bank.deposit(game_id, &Money::new(500, fake.clone())).await.unwrap();
        bank.deposit(game_id, &Money::new(500, fake.clone())).await.unwrap();

        assert_eq!(bank.get_balance().await.unwrap(), Money::zero(fake));
    }
}
