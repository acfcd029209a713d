//! PostgreSQL store implementation.
//!
//! Unique and foreign key constraints in `migrations/` back up every
//! uniqueness rule the orchestrators check. The bounded entry insert locks the
//! game row so that the capacity count and the insert cannot interleave with
//! another entry for the same game.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::aggregate::{Aggregate, Game, GameEntry, GameStatus, GameType, User, UserPurse};
use crate::domain::{Currency, DomainError, GameId, Money, MoneyError, PasswordHash, UserId};

use super::{
    duplicate_entry, game_not_found, missing_entry, GameEntryRepository, GameReader, GameWriter,
    PurseReader, PurseWriter, StoreError, StoreResult, UserReader, UserWriter,
};

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const NUMERIC_OUT_OF_RANGE: &str = "22003";

/// Check whether a database error was raised by a unique constraint
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    has_code(err, UNIQUE_VIOLATION)
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    has_code(err, FOREIGN_KEY_VIOLATION)
}

fn has_code(err: &sqlx::Error, code: &str) -> bool {
    match err {
        sqlx::Error::Database(db) => db.code().as_deref() == Some(code),
        _ => false,
    }
}

fn violated_constraint(err: &sqlx::Error) -> Option<&str> {
    match err {
        sqlx::Error::Database(db) => db.constraint(),
        _ => None,
    }
}

fn money(amount: i64, currency: &str) -> StoreResult<Money> {
    let currency =
        Currency::new(currency).map_err(|e| StoreError::invalid_data(e.to_string()))?;
    Ok(Money::new(amount, currency))
}

// =========================================================================
// Row mapping
// =========================================================================

type UserRow = (Uuid, String, String, String, DateTime<Utc>, DateTime<Utc>);

type PurseRow = (Uuid, i64, String, DateTime<Utc>);

type GameRow = (
    Uuid,
    String,
    String,
    String,
    i64,
    i64,
    i64,
    DateTime<Utc>,
    i32,
    DateTime<Utc>,
    DateTime<Utc>,
);

type EntryRow = (Uuid, Uuid, Uuid, DateTime<Utc>);

const USER_COLUMNS: &str = "id, email, username, password_hash, created_at, updated_at";
const PURSE_COLUMNS: &str = "user_id, amount, currency, created_at";
const GAME_COLUMNS: &str = "id, game_type, status, currency, buy_in, max_stake, min_stake, \
                            start_at, players, created_at, updated_at";
const ENTRY_COLUMNS: &str = "id, game_id, user_id, created_at";

fn user_from_row(row: UserRow) -> StoreResult<User> {
    let (id, email, username, password_hash, created_at, updated_at) = row;
    let password_hash: PasswordHash = password_hash
        .parse()
        .map_err(|_| StoreError::invalid_data(format!("password hash of User {}", id)))?;

    Ok(User::new(UserId::from(id), email, username, password_hash)
        .with_timestamps(created_at, updated_at))
}

fn purse_from_row(row: PurseRow) -> StoreResult<UserPurse> {
    let (user_id, amount, currency, created_at) = row;
    Ok(UserPurse::new(UserId::from(user_id), money(amount, &currency)?).with_created_at(created_at))
}

fn game_from_row(row: GameRow) -> StoreResult<Game> {
    let (
        id,
        game_type,
        status,
        currency,
        buy_in,
        max_stake,
        min_stake,
        start_at,
        players,
        created_at,
        updated_at,
    ) = row;

    let game_type = game_type
        .parse::<GameType>()
        .map_err(|e| StoreError::invalid_data(e.to_string()))?;
    let status = status
        .parse::<GameStatus>()
        .map_err(|e| StoreError::invalid_data(e.to_string()))?;
    let players = u32::try_from(players)
        .map_err(|_| StoreError::invalid_data(format!("player capacity {}", players)))?;

    Ok(Game::new(
        GameId::from(id),
        game_type,
        status,
        money(buy_in, &currency)?,
        money(max_stake, &currency)?,
        money(min_stake, &currency)?,
        start_at,
        players,
    )
    .with_timestamps(created_at, updated_at))
}

fn entry_from_row(row: EntryRow) -> GameEntry {
    let (id, game_id, user_id, created_at) = row;
    GameEntry {
        id: id.into(),
        game_id: game_id.into(),
        user_id: user_id.into(),
        created_at,
    }
}

fn user_write_error(err: sqlx::Error, user: &User) -> StoreError {
    if !is_unique_violation(&err) {
        return err.into();
    }
    match violated_constraint(&err) {
        Some(c) if c.contains("email") => StoreError::duplicate("User", "email", user.email()),
        Some(c) if c.contains("username") => {
            StoreError::duplicate("User", "username", user.username())
        }
        _ => StoreError::duplicate("User", "ID", user.id().to_string()),
    }
}

fn entry_write_error(err: sqlx::Error, game_id: GameId, user_id: UserId) -> StoreError {
    if is_unique_violation(&err) {
        return duplicate_entry(game_id, user_id);
    }
    if is_foreign_key_violation(&err) {
        return match violated_constraint(&err) {
            Some(c) if c.contains("user_id") => StoreError::not_found("User", "ID", user_id),
            _ => game_not_found(game_id),
        };
    }
    err.into()
}

// =========================================================================
// Store
// =========================================================================

/// PostgreSQL-backed store for every aggregate
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn find_user_where(&self, column: &str, value: &str) -> StoreResult<Option<User>> {
        let query = format!("SELECT {} FROM users WHERE {} = $1", USER_COLUMNS, column);
        let row: Option<UserRow> = sqlx::query_as(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        row.map(user_from_row).transpose()
    }

    async fn game_exists(&self, game_id: GameId) -> StoreResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM games WHERE id = $1)")
            .bind(game_id.as_uuid())
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }
}

#[async_trait]
impl UserReader for PgStore {
    async fn find_by_id(&self, id: UserId) -> StoreResult<Option<User>> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let row: Option<UserRow> = sqlx::query_as(&query)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(user_from_row).transpose()
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.find_user_where("email", email).await
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        self.find_user_where("username", username).await
    }

    async fn get_users(&self) -> StoreResult<Vec<User>> {
        let query = format!(
            "SELECT {} FROM users ORDER BY created_at ASC, seq ASC",
            USER_COLUMNS
        );
        let rows: Vec<UserRow> = sqlx::query_as(&query).fetch_all(&self.pool).await?;
        rows.into_iter().map(user_from_row).collect()
    }
}

#[async_trait]
impl UserWriter for PgStore {
    async fn insert(&self, user: &User) -> StoreResult<User> {
        let query = format!(
            r#"
            INSERT INTO users (id, email, username, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        let row: UserRow = sqlx::query_as(&query)
            .bind(user.id().as_uuid())
            .bind(user.email())
            .bind(user.username())
            .bind(user.password_hash().as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| user_write_error(e, user))?;
        user_from_row(row)
    }

    async fn update(&self, user: &User) -> StoreResult<User> {
        let query = format!(
            r#"
            UPDATE users
            SET email = $2, username = $3, password_hash = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        let row: Option<UserRow> = sqlx::query_as(&query)
            .bind(user.id().as_uuid())
            .bind(user.email())
            .bind(user.username())
            .bind(user.password_hash().as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| user_write_error(e, user))?;

        match row {
            Some(row) => user_from_row(row),
            None => Err(StoreError::not_found("User", "ID", user.id())),
        }
    }

    async fn delete(&self, id: UserId) -> StoreResult<()> {
        // user_purses and game_entries cascade
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("User", "ID", id));
        }
        Ok(())
    }
}

#[async_trait]
impl PurseReader for PgStore {
    async fn find(&self, user_id: UserId) -> StoreResult<Option<UserPurse>> {
        let query = format!("SELECT {} FROM user_purses WHERE user_id = $1", PURSE_COLUMNS);
        let row: Option<PurseRow> = sqlx::query_as(&query)
            .bind(user_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(purse_from_row).transpose()
    }
}

#[async_trait]
impl PurseWriter for PgStore {
    async fn insert(&self, purse: &UserPurse) -> StoreResult<UserPurse> {
        let query = format!(
            r#"
            INSERT INTO user_purses (user_id, amount, currency)
            VALUES ($1, $2, $3)
            RETURNING {}
            "#,
            PURSE_COLUMNS
        );
        let row: PurseRow = sqlx::query_as(&query)
            .bind(purse.user_id().as_uuid())
            .bind(purse.balance().amount())
            .bind(purse.balance().currency().code())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::already_exists(format!(
                        "Purse for User '{}' already exists",
                        purse.user_id()
                    ))
                } else if is_foreign_key_violation(&e) {
                    StoreError::not_found("User", "ID", purse.user_id())
                } else {
                    e.into()
                }
            })?;
        purse_from_row(row)
    }

    async fn apply_delta(&self, user_id: UserId, delta: &Money) -> StoreResult<UserPurse> {
        let query = format!(
            r#"
            UPDATE user_purses
            SET amount = amount + $2
            WHERE user_id = $1 AND currency = $3 AND amount + $2 >= 0
            RETURNING {}
            "#,
            PURSE_COLUMNS
        );
        let row: Option<PurseRow> = sqlx::query_as(&query)
            .bind(user_id.as_uuid())
            .bind(delta.amount())
            .bind(delta.currency().code())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                if has_code(&e, NUMERIC_OUT_OF_RANGE) {
                    StoreError::Rejected(MoneyError::Overflow.into())
                } else {
                    e.into()
                }
            })?;

        if let Some(row) = row {
            return purse_from_row(row);
        }

        // Nothing matched: work out which guard refused the change
        let current = PurseReader::get(self, user_id).await?;
        Err(StoreError::Rejected(
            current.apply_delta(delta).err().unwrap_or_else(|| {
                DomainError::InsufficientFunds {
                    required: delta.amount().saturating_neg(),
                    available: current.balance().amount(),
                }
            }),
        ))
    }

    async fn delete(&self, user_id: UserId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM user_purses WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Purse for User", "ID", user_id));
        }
        Ok(())
    }
}

#[async_trait]
impl GameReader for PgStore {
    async fn find_by_id(&self, id: GameId) -> StoreResult<Option<Game>> {
        let query = format!("SELECT {} FROM games WHERE id = $1", GAME_COLUMNS);
        let row: Option<GameRow> = sqlx::query_as(&query)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(game_from_row).transpose()
    }

    async fn get_games(&self) -> StoreResult<Vec<Game>> {
        let query = format!(
            "SELECT {} FROM games ORDER BY start_at ASC, created_at ASC",
            GAME_COLUMNS
        );
        let rows: Vec<GameRow> = sqlx::query_as(&query).fetch_all(&self.pool).await?;
        rows.into_iter().map(game_from_row).collect()
    }
}

#[async_trait]
impl GameWriter for PgStore {
    async fn insert(&self, game: &Game) -> StoreResult<Game> {
        let query = format!(
            r#"
            INSERT INTO games (
                id, game_type, status, currency,
                buy_in, max_stake, min_stake, start_at, players
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            GAME_COLUMNS
        );
        let players = i32::try_from(game.players())
            .map_err(|_| StoreError::invalid_data(format!("player capacity {}", game.players())))?;

        let row: GameRow = sqlx::query_as(&query)
            .bind(game.id().as_uuid())
            .bind(game.game_type().as_str())
            .bind(game.status().as_str())
            .bind(game.buy_in().currency().code())
            .bind(game.buy_in().amount())
            .bind(game.max().amount())
            .bind(game.min().amount())
            .bind(game.start())
            .bind(players)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::already_exists(format!(
                        "Game with ID {} already exists",
                        game.id()
                    ))
                } else {
                    e.into()
                }
            })?;
        game_from_row(row)
    }

    async fn update(&self, game: &Game) -> StoreResult<Game> {
        let query = format!(
            r#"
            UPDATE games
            SET game_type = $2, status = $3, currency = $4, buy_in = $5,
                max_stake = $6, min_stake = $7, start_at = $8, players = $9,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            GAME_COLUMNS
        );
        let players = i32::try_from(game.players())
            .map_err(|_| StoreError::invalid_data(format!("player capacity {}", game.players())))?;

        let row: Option<GameRow> = sqlx::query_as(&query)
            .bind(game.id().as_uuid())
            .bind(game.game_type().as_str())
            .bind(game.status().as_str())
            .bind(game.buy_in().currency().code())
            .bind(game.buy_in().amount())
            .bind(game.max().amount())
            .bind(game.min().amount())
            .bind(game.start())
            .bind(players)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => game_from_row(row),
            None => Err(game_not_found(game.id())),
        }
    }
}

#[async_trait]
impl GameEntryRepository for PgStore {
    async fn insert(&self, game_id: GameId, user_id: UserId) -> StoreResult<GameEntry> {
        let query = format!(
            r#"
            INSERT INTO game_entries (id, game_id, user_id)
            VALUES ($1, $2, $3)
            RETURNING {}
            "#,
            ENTRY_COLUMNS
        );
        let row: EntryRow = sqlx::query_as(&query)
            .bind(Uuid::new_v4())
            .bind(game_id.as_uuid())
            .bind(user_id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| entry_write_error(e, game_id, user_id))?;
        Ok(entry_from_row(row))
    }

    async fn insert_within_capacity(
        &self,
        game_id: GameId,
        user_id: UserId,
        capacity: u32,
    ) -> StoreResult<GameEntry> {
        let mut tx = self.pool.begin().await?;

        // Serializes every bounded insert for this game
        let locked: Option<Uuid> = sqlx::query_scalar("SELECT id FROM games WHERE id = $1 FOR UPDATE")
            .bind(game_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            return Err(game_not_found(game_id));
        }

        let already_entered: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM game_entries WHERE game_id = $1 AND user_id = $2)",
        )
        .bind(game_id.as_uuid())
        .bind(user_id.as_uuid())
        .fetch_one(&mut *tx)
        .await?;
        if already_entered {
            return Err(duplicate_entry(game_id, user_id));
        }

        let taken: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM game_entries WHERE game_id = $1")
            .bind(game_id.as_uuid())
            .fetch_one(&mut *tx)
            .await?;
        if taken >= i64::from(capacity) {
            return Err(StoreError::CapacityReached {
                entity: Game::aggregate_type(),
                id: game_id.to_string(),
                capacity,
            });
        }

        let query = format!(
            r#"
            INSERT INTO game_entries (id, game_id, user_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (game_id, user_id) DO NOTHING
            RETURNING {}
            "#,
            ENTRY_COLUMNS
        );
        let row: Option<EntryRow> = sqlx::query_as(&query)
            .bind(Uuid::new_v4())
            .bind(game_id.as_uuid())
            .bind(user_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| entry_write_error(e, game_id, user_id))?;

        let Some(row) = row else {
            return Err(duplicate_entry(game_id, user_id));
        };

        tx.commit().await?;
        Ok(entry_from_row(row))
    }

    async fn get(&self, game_id: GameId) -> StoreResult<Vec<GameEntry>> {
        if !self.game_exists(game_id).await? {
            return Err(game_not_found(game_id));
        }

        let query = format!(
            "SELECT {} FROM game_entries WHERE game_id = $1 ORDER BY seq ASC",
            ENTRY_COLUMNS
        );
        let rows: Vec<EntryRow> = sqlx::query_as(&query)
            .bind(game_id.as_uuid())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(entry_from_row).collect())
    }

    async fn exists(&self, game_id: GameId, user_id: UserId) -> StoreResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM game_entries WHERE game_id = $1 AND user_id = $2)",
        )
        .bind(game_id.as_uuid())
        .bind(user_id.as_uuid())
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn delete(&self, game_id: GameId, user_id: UserId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM game_entries WHERE game_id = $1 AND user_id = $2")
            .bind(game_id.as_uuid())
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(missing_entry(game_id, user_id));
        }
        Ok(())
    }
}
