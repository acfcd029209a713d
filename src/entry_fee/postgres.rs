//! PostgreSQL fee driver.
//!
//! The primary key on `entry_fees (game_id, user_id)` makes the charge an
//! atomic insert-if-absent.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{Currency, GameId, Money, UserId};

use super::{EntryFee, EntryFeeError, EntryFeeResult, EntryFeeStore};

#[derive(Debug, Clone)]
pub struct PgEntryFeeStore {
    pool: PgPool,
}

impl PgEntryFeeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntryFeeStore for PgEntryFeeStore {
    async fn record(&self, game_id: GameId, user_id: UserId, fee: &Money) -> EntryFeeResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO entry_fees (game_id, user_id, amount, currency)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (game_id, user_id) DO NOTHING
            "#,
        )
        .bind(game_id.as_uuid())
        .bind(user_id.as_uuid())
        .bind(fee.amount())
        .bind(fee.currency().code())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(EntryFeeError::DuplicateRecord { game_id, user_id });
        }
        Ok(())
    }

    async fn fees_for_game(&self, game_id: GameId) -> EntryFeeResult<Vec<EntryFee>> {
        let rows: Vec<(Uuid, i64, String)> = sqlx::query_as(
            "SELECT user_id, amount, currency FROM entry_fees WHERE game_id = $1 ORDER BY seq ASC",
        )
        .bind(game_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(user_id, amount, currency)| -> EntryFeeResult<EntryFee> {
                Ok(EntryFee {
                    game_id,
                    user_id: user_id.into(),
                    fee: Money::new(amount, Currency::new(currency)?),
                })
            })
            .collect()
    }

    async fn remove(&self, game_id: GameId, user_id: UserId) -> EntryFeeResult<()> {
        let result = sqlx::query("DELETE FROM entry_fees WHERE game_id = $1 AND user_id = $2")
            .bind(game_id.as_uuid())
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(EntryFeeError::NotFound { game_id, user_id });
        }
        Ok(())
    }
}
