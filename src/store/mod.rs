//! Store module
//!
//! Persistence ports for each aggregate and the adapters that implement them.
//! Orchestrators depend only on the traits; the storage technology is chosen
//! at startup.

mod error;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::aggregate::{Game, GameEntry, User, UserPurse};
use crate::domain::{GameId, Money, UserId};

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use postgres::{is_unique_violation, PgStore};

/// Message used whenever a game lookup misses
pub fn game_not_found(id: impl std::fmt::Display) -> StoreError {
    StoreError::NotFound(format!("Game with ID {} does not exist", id))
}

fn duplicate_entry(game_id: GameId, user_id: UserId) -> StoreError {
    StoreError::already_exists(format!(
        "Entry for User {} in Game {} already exists",
        user_id, game_id
    ))
}

fn missing_entry(game_id: GameId, user_id: UserId) -> StoreError {
    StoreError::NotFound(format!(
        "Entry for User {} in Game {} does not exist",
        user_id, game_id
    ))
}

// =========================================================================
// Users
// =========================================================================

/// Read side of the user registry.
///
/// `find_*` queries report absence as `None`; the `get_*` variants turn
/// absence into [`StoreError::NotFound`].
#[async_trait]
pub trait UserReader: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> StoreResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    /// All users ordered by creation time ascending
    async fn get_users(&self) -> StoreResult<Vec<User>>;

    async fn get_by_id(&self, id: UserId) -> StoreResult<User> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| StoreError::not_found("User", "ID", id))
    }

    async fn get_by_email(&self, email: &str) -> StoreResult<User> {
        self.find_by_email(email)
            .await?
            .ok_or_else(|| StoreError::not_found("User", "email", email))
    }

    async fn get_by_username(&self, username: &str) -> StoreResult<User> {
        self.find_by_username(username)
            .await?
            .ok_or_else(|| StoreError::not_found("User", "username", username))
    }
}

/// Write side of the user registry.
#[async_trait]
pub trait UserWriter: Send + Sync {
    /// Persist a new user, returning it with store-assigned timestamps.
    ///
    /// Adapters reject a duplicate id, email or username with
    /// [`StoreError::Duplicate`].
    async fn insert(&self, user: &User) -> StoreResult<User>;

    async fn update(&self, user: &User) -> StoreResult<User>;

    async fn delete(&self, id: UserId) -> StoreResult<()>;
}

// =========================================================================
// Purses
// =========================================================================

#[async_trait]
pub trait PurseReader: Send + Sync {
    async fn find(&self, user_id: UserId) -> StoreResult<Option<UserPurse>>;

    async fn get(&self, user_id: UserId) -> StoreResult<UserPurse> {
        self.find(user_id)
            .await?
            .ok_or_else(|| StoreError::not_found("Purse for User", "ID", user_id))
    }
}

#[async_trait]
pub trait PurseWriter: Send + Sync {
    /// Create the purse; a second purse for the same user is rejected.
    async fn insert(&self, purse: &UserPurse) -> StoreResult<UserPurse>;

    /// Add a signed amount to the balance as one atomic step.
    ///
    /// Negative deltas debit. A change that would take the balance below zero
    /// or mix currencies is refused with [`StoreError::Rejected`] and leaves
    /// the purse untouched.
    async fn apply_delta(&self, user_id: UserId, delta: &Money) -> StoreResult<UserPurse>;

    async fn delete(&self, user_id: UserId) -> StoreResult<()>;
}

// =========================================================================
// Games
// =========================================================================

#[async_trait]
pub trait GameReader: Send + Sync {
    async fn find_by_id(&self, id: GameId) -> StoreResult<Option<Game>>;

    /// All games ordered by scheduled start ascending
    async fn get_games(&self) -> StoreResult<Vec<Game>>;

    async fn get_by_id(&self, id: GameId) -> StoreResult<Game> {
        self.find_by_id(id).await?.ok_or_else(|| game_not_found(id))
    }
}

#[async_trait]
pub trait GameWriter: Send + Sync {
    async fn insert(&self, game: &Game) -> StoreResult<Game>;

    async fn update(&self, game: &Game) -> StoreResult<Game>;
}

// =========================================================================
// Game entries
// =========================================================================

/// Repository of (game, user) participation records.
///
/// Pair uniqueness is enforced here, atomically, whatever the callers checked
/// beforehand.
#[async_trait]
pub trait GameEntryRepository: Send + Sync {
    /// Insert a new entry; fails with [`StoreError::AlreadyExists`] if the
    /// pair is already present.
    async fn insert(&self, game_id: GameId, user_id: UserId) -> StoreResult<GameEntry>;

    /// Insert a new entry only while the game holds fewer than `capacity`
    /// entries. The count and the insert are one atomic step.
    async fn insert_within_capacity(
        &self,
        game_id: GameId,
        user_id: UserId,
        capacity: u32,
    ) -> StoreResult<GameEntry>;

    /// All entries for a game in insertion order; fails with
    /// [`StoreError::NotFound`] if the game itself is unknown.
    async fn get(&self, game_id: GameId) -> StoreResult<Vec<GameEntry>>;

    async fn exists(&self, game_id: GameId, user_id: UserId) -> StoreResult<bool>;

    /// Withdraw an entry; used to roll back an entry whose fee could not be
    /// recorded.
    async fn delete(&self, game_id: GameId, user_id: UserId) -> StoreResult<()>;
}
