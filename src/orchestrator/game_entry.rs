//! Game Entry Orchestrator
//!
//! Decides whether a user may join a game and records entries.
//!
//! The eligibility gate runs four checks in a fixed order and stops at the
//! first failure:
//!
//! 1. capacity
//! 2. schedule
//! 3. status
//! 4. duplicate entry
//!
//! `add_game_entry` is a bare insert and does not run the gate. `enter_game`
//! runs the gate, takes the game's buy-in from the user's purse, inserts
//! through the store's bounded insert (which re-checks capacity and pair
//! uniqueness atomically) and records the fee. A failed step undoes the
//! steps before it.

use std::sync::Arc;

use crate::aggregate::{Aggregate, Game, GameEntry, User};
use crate::clock::SharedClock;
use crate::domain::{DomainError, GameEntryViolation, GameId, Money, UserId};
use crate::entry_fee::{EntryFee, EntryFeeStore};
use crate::error::{AppError, AppResult};
use crate::store::{GameEntryRepository, PurseWriter, StoreError, UserReader};

pub struct GameEntryOrchestrator {
    repository: Arc<dyn GameEntryRepository>,
    users: Arc<dyn UserReader>,
    purses: Arc<dyn PurseWriter>,
    fees: Arc<dyn EntryFeeStore>,
    clock: SharedClock,
}

impl GameEntryOrchestrator {
    pub fn new(
        repository: Arc<dyn GameEntryRepository>,
        users: Arc<dyn UserReader>,
        purses: Arc<dyn PurseWriter>,
        fees: Arc<dyn EntryFeeStore>,
        clock: SharedClock,
    ) -> Self {
        Self {
            repository,
            users,
            purses,
            fees,
            clock,
        }
    }

    /// Run the eligibility gate, failing with the first violated rule.
    pub async fn check_entry_eligibility(&self, game: &Game, user_id: UserId) -> AppResult<()> {
        match self.entry_eligibility(game, user_id).await? {
            None => Ok(()),
            Some(violation) => {
                tracing::debug!(
                    game_id = %game.id(),
                    user_id = %user_id,
                    reason = violation.code(),
                    "Game entry not eligible"
                );
                Err(DomainError::game_entry(violation).into())
            }
        }
    }

    /// Run the eligibility gate without failing on a violation.
    ///
    /// Returns `Ok(None)` when the user may enter. Store errors still fail.
    pub async fn entry_eligibility(
        &self,
        game: &Game,
        user_id: UserId,
    ) -> AppResult<Option<GameEntryViolation>> {
        let entries = self.repository.get(game.id()).await?;
        if entries.len() >= game.players() as usize {
            return Ok(Some(GameEntryViolation::FullCapacity));
        }

        if game.has_started(self.clock.utc()) {
            return Ok(Some(GameEntryViolation::AlreadyStarted));
        }

        if !game.status().is_open_for_entry() {
            return Ok(Some(GameEntryViolation::IncorrectStatus));
        }

        if self.repository.exists(game.id(), user_id).await? {
            return Ok(Some(GameEntryViolation::AlreadyEntered));
        }

        Ok(None)
    }

    /// Record an entry for `user` in `game` without running the gate.
    ///
    /// The store still rejects a second entry for the same pair.
    pub async fn add_game_entry(&self, game: &Game, user: &User) -> AppResult<GameEntry> {
        let entry = self.repository.insert(game.id(), user.id()).await?;
        tracing::info!(game_id = %game.id(), user_id = %user.id(), "Game entry added");
        Ok(entry)
    }

    /// Run the gate, charge the buy-in, then insert with capacity and
    /// uniqueness enforced by the store and record the fee.
    ///
    /// Losing a race to a concurrent entry reports the same violation the
    /// gate would have, and the buy-in is refunded.
    pub async fn enter_game(&self, game: &Game, user: &User) -> AppResult<GameEntry> {
        self.check_entry_eligibility(game, user.id()).await?;

        let buy_in = game.buy_in();
        let charge = Money::new(-buy_in.amount(), buy_in.currency().clone());
        if let Err(e) = self.purses.apply_delta(user.id(), &charge).await {
            tracing::debug!(
                game_id = %game.id(),
                user_id = %user.id(),
                error = %e,
                "Buy-in rejected"
            );
            return Err(e.into());
        }

        let entry = match self
            .repository
            .insert_within_capacity(game.id(), user.id(), game.players())
            .await
        {
            Ok(entry) => entry,
            Err(e) => {
                self.refund(game, user.id()).await;
                return Err(match e {
                    StoreError::CapacityReached { .. } => {
                        AppError::from(DomainError::game_entry(GameEntryViolation::FullCapacity))
                    }
                    e if e.is_already_exists() => {
                        AppError::from(DomainError::game_entry(GameEntryViolation::AlreadyEntered))
                    }
                    other => other.into(),
                });
            }
        };

        if let Err(e) = self.fees.record(game.id(), user.id(), buy_in).await {
            tracing::error!(
                game_id = %game.id(),
                user_id = %user.id(),
                error = %e,
                "Entry fee not recorded, withdrawing entry"
            );
            if let Err(undo) = self.repository.delete(game.id(), user.id()).await {
                tracing::error!(
                    game_id = %game.id(),
                    user_id = %user.id(),
                    error = %undo,
                    "Compensating entry delete failed"
                );
            }
            self.refund(game, user.id()).await;
            return Err(e.into());
        }

        tracing::info!(
            game_id = %game.id(),
            user_id = %user.id(),
            fee = buy_in.amount(),
            "User entered game"
        );
        Ok(entry)
    }

    /// Fees charged for a game, in the order users entered
    pub async fn get_entry_fees(&self, game_id: GameId) -> AppResult<Vec<EntryFee>> {
        Ok(self.fees.fees_for_game(game_id).await?)
    }

    /// Give the buy-in back after a failed entry
    async fn refund(&self, game: &Game, user_id: UserId) {
        if let Err(e) = self.purses.apply_delta(user_id, game.buy_in()).await {
            tracing::error!(
                game_id = %game.id(),
                user_id = %user_id,
                error = %e,
                "Buy-in refund failed"
            );
        }
    }

    /// Users entered in a game, in entry order
    pub async fn get_users_for_game(&self, game_id: GameId) -> AppResult<Vec<User>> {
        let entries = self.repository.get(game_id).await?;

        let mut users = Vec::with_capacity(entries.len());
        for entry in entries {
            users.push(self.users.get_by_id(entry.user_id).await?);
        }
        Ok(users)
    }

    pub async fn is_user_in_game(&self, game: &Game, user_id: UserId) -> AppResult<bool> {
        let entries = self.repository.get(game.id()).await?;
        Ok(entries.iter().any(|e| e.user_id == user_id))
    }
}
