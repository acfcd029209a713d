//! PostgreSQL ledger driver.
//!
//! The primary key on `admin_bank.game_id` makes the deposit an atomic
//! insert-if-absent.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::{Currency, GameId, Money};

use super::{fold_balance, Bank, BankError, BankResult};

#[derive(Debug, Clone)]
pub struct PgBank {
    pool: PgPool,
    currency: Currency,
}

impl PgBank {
    pub fn new(pool: PgPool, currency: Currency) -> Self {
        Self { pool, currency }
    }
}

#[async_trait]
impl Bank for PgBank {
    async fn deposit(&self, game_id: GameId, money: &Money) -> BankResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO admin_bank (game_id, amount, currency)
            VALUES ($1, $2, $3)
            ON CONFLICT (game_id) DO NOTHING
            "#,
        )
        .bind(game_id.as_uuid())
        .bind(money.amount())
        .bind(money.currency().code())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(BankError::DuplicateRecord(game_id));
        }
        Ok(())
    }

    async fn get_balance(&self) -> BankResult<Money> {
        let rows: Vec<(i64, String)> =
            sqlx::query_as("SELECT amount, currency FROM admin_bank ORDER BY created_at ASC")
                .fetch_all(&self.pool)
                .await?;

        let values = rows
            .into_iter()
            .map(|(amount, currency)| Ok(Money::new(amount, Currency::new(currency)?)))
            .collect::<BankResult<Vec<_>>>()?;

        fold_balance(&self.currency, &values)
    }
}
