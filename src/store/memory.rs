//! In-memory store implementation.
//!
//! Backs every store port with tokio `RwLock`s. Used by the test suites and by
//! the server when `STORE_DRIVER=memory`.
//!
//! Locks are always taken in the order users, purses, games, entries.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::aggregate::{Aggregate, Game, GameEntry, User, UserPurse};
use crate::clock::{system_clock, SharedClock};
use crate::domain::{GameId, Money, UserId};

use super::{
    duplicate_entry, game_not_found, missing_entry, GameEntryRepository, GameReader, GameWriter,
    PurseReader, PurseWriter, StoreError, StoreResult, UserReader, UserWriter,
};

/// In-memory store for every aggregate.
pub struct MemoryStore {
    /// Kept in insertion order, which is creation order
    users: Arc<RwLock<Vec<User>>>,
    purses: Arc<RwLock<HashMap<UserId, UserPurse>>>,
    games: Arc<RwLock<HashMap<GameId, Game>>>,
    /// Kept in insertion order
    entries: Arc<RwLock<Vec<GameEntry>>>,
    clock: SharedClock,
}

impl MemoryStore {
    pub fn new(clock: SharedClock) -> Self {
        Self {
            users: Arc::default(),
            purses: Arc::default(),
            games: Arc::default(),
            entries: Arc::default(),
            clock,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(system_clock())
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore").finish_non_exhaustive()
    }
}

/// Reject a user whose id, email or username is taken by someone else.
fn ensure_user_unique(users: &[User], candidate: &User, allow_same_id: bool) -> StoreResult<()> {
    for existing in users {
        if existing.id() == candidate.id() {
            if allow_same_id {
                continue;
            }
            return Err(StoreError::duplicate("User", "ID", candidate.id().to_string()));
        }
        if existing.email() == candidate.email() {
            return Err(StoreError::duplicate("User", "email", candidate.email()));
        }
        if existing.username() == candidate.username() {
            return Err(StoreError::duplicate("User", "username", candidate.username()));
        }
    }
    Ok(())
}

#[async_trait]
impl UserReader for MemoryStore {
    async fn find_by_id(&self, id: UserId) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id() == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.email() == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.username() == username).cloned())
    }

    async fn get_users(&self) -> StoreResult<Vec<User>> {
        Ok(self.users.read().await.clone())
    }
}

#[async_trait]
impl UserWriter for MemoryStore {
    async fn insert(&self, user: &User) -> StoreResult<User> {
        let mut users = self.users.write().await;
        ensure_user_unique(&users, user, false)?;

        let now = self.clock.utc();
        let stored = user.clone().with_timestamps(now, now);
        users.push(stored.clone());
        Ok(stored)
    }

    async fn update(&self, user: &User) -> StoreResult<User> {
        let mut users = self.users.write().await;
        ensure_user_unique(&users, user, true)?;

        let slot = users
            .iter_mut()
            .find(|u| u.id() == user.id())
            .ok_or_else(|| StoreError::not_found("User", "ID", user.id()))?;

        let created_at = slot.created_at().unwrap_or_else(|| self.clock.utc());
        *slot = user.clone().with_timestamps(created_at, self.clock.utc());
        Ok(slot.clone())
    }

    async fn delete(&self, id: UserId) -> StoreResult<()> {
        let mut users = self.users.write().await;
        let before = users.len();
        users.retain(|u| u.id() != id);
        if users.len() == before {
            return Err(StoreError::not_found("User", "ID", id));
        }

        // Mirror the relational cascade
        self.purses.write().await.remove(&id);
        self.entries.write().await.retain(|e| e.user_id != id);
        Ok(())
    }
}

#[async_trait]
impl PurseReader for MemoryStore {
    async fn find(&self, user_id: UserId) -> StoreResult<Option<UserPurse>> {
        let purses = self.purses.read().await;
        Ok(purses.get(&user_id).cloned())
    }
}

#[async_trait]
impl PurseWriter for MemoryStore {
    async fn insert(&self, purse: &UserPurse) -> StoreResult<UserPurse> {
        let users = self.users.read().await;
        if !users.iter().any(|u| u.id() == purse.user_id()) {
            return Err(StoreError::not_found("User", "ID", purse.user_id()));
        }

        let mut purses = self.purses.write().await;
        if purses.contains_key(&purse.user_id()) {
            return Err(StoreError::already_exists(format!(
                "Purse for User '{}' already exists",
                purse.user_id()
            )));
        }

        let stored = purse.clone().with_created_at(self.clock.utc());
        purses.insert(stored.user_id(), stored.clone());
        Ok(stored)
    }

    async fn apply_delta(&self, user_id: UserId, delta: &Money) -> StoreResult<UserPurse> {
        let mut purses = self.purses.write().await;
        let slot = purses
            .get_mut(&user_id)
            .ok_or_else(|| StoreError::not_found("Purse for User", "ID", user_id))?;

        let updated = slot.apply_delta(delta)?;
        *slot = updated.clone();
        Ok(updated)
    }

    async fn delete(&self, user_id: UserId) -> StoreResult<()> {
        let mut purses = self.purses.write().await;
        purses
            .remove(&user_id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found("Purse for User", "ID", user_id))
    }
}

#[async_trait]
impl GameReader for MemoryStore {
    async fn find_by_id(&self, id: GameId) -> StoreResult<Option<Game>> {
        let games = self.games.read().await;
        Ok(games.get(&id).cloned())
    }

    async fn get_games(&self) -> StoreResult<Vec<Game>> {
        let games = self.games.read().await;
        let mut result: Vec<Game> = games.values().cloned().collect();
        result.sort_by_key(|g| (g.start(), g.created_at()));
        Ok(result)
    }
}

#[async_trait]
impl GameWriter for MemoryStore {
    async fn insert(&self, game: &Game) -> StoreResult<Game> {
        let mut games = self.games.write().await;
        if games.contains_key(&game.id()) {
            return Err(StoreError::already_exists(format!(
                "Game with ID {} already exists",
                game.id()
            )));
        }

        let now = self.clock.utc();
        let stored = game.clone().with_timestamps(now, now);
        games.insert(stored.id(), stored.clone());
        Ok(stored)
    }

    async fn update(&self, game: &Game) -> StoreResult<Game> {
        let mut games = self.games.write().await;
        let slot = games.get_mut(&game.id()).ok_or_else(|| game_not_found(game.id()))?;

        let created_at = slot.created_at().unwrap_or_else(|| self.clock.utc());
        *slot = game.clone().with_timestamps(created_at, self.clock.utc());
        Ok(slot.clone())
    }
}

impl MemoryStore {
    /// Insert under the entries write lock, optionally bounded by `capacity`.
    async fn insert_entry(
        &self,
        game_id: GameId,
        user_id: UserId,
        capacity: Option<u32>,
    ) -> StoreResult<GameEntry> {
        let users = self.users.read().await;
        if !users.iter().any(|u| u.id() == user_id) {
            return Err(StoreError::not_found("User", "ID", user_id));
        }

        let games = self.games.read().await;
        if !games.contains_key(&game_id) {
            return Err(game_not_found(game_id));
        }

        let mut entries = self.entries.write().await;
        if entries
            .iter()
            .any(|e| e.game_id == game_id && e.user_id == user_id)
        {
            return Err(duplicate_entry(game_id, user_id));
        }

        if let Some(capacity) = capacity {
            let taken = entries.iter().filter(|e| e.game_id == game_id).count();
            if taken >= capacity as usize {
                return Err(StoreError::CapacityReached {
                    entity: Game::aggregate_type(),
                    id: game_id.to_string(),
                    capacity,
                });
            }
        }

        let entry = GameEntry::new(game_id, user_id, self.clock.utc());
        entries.push(entry.clone());
        Ok(entry)
    }
}

#[async_trait]
impl GameEntryRepository for MemoryStore {
    async fn insert(&self, game_id: GameId, user_id: UserId) -> StoreResult<GameEntry> {
        self.insert_entry(game_id, user_id, None).await
    }

    async fn insert_within_capacity(
        &self,
        game_id: GameId,
        user_id: UserId,
        capacity: u32,
    ) -> StoreResult<GameEntry> {
        self.insert_entry(game_id, user_id, Some(capacity)).await
    }

    async fn get(&self, game_id: GameId) -> StoreResult<Vec<GameEntry>> {
        let games = self.games.read().await;
        if !games.contains_key(&game_id) {
            return Err(game_not_found(game_id));
        }

        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .filter(|e| e.game_id == game_id)
            .cloned()
            .collect())
    }

    async fn exists(&self, game_id: GameId, user_id: UserId) -> StoreResult<bool> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .any(|e| e.game_id == game_id && e.user_id == user_id))
    }

    async fn delete(&self, game_id: GameId, user_id: UserId) -> StoreResult<()> {
        let mut entries = self.entries.write().await;
        let position = entries
            .iter()
            .position(|e| e.game_id == game_id && e.user_id == user_id)
            .ok_or_else(|| missing_entry(game_id, user_id))?;
        entries.remove(position);
        Ok(())
    }
}
