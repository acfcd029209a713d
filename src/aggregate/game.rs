//! Game Aggregate
//!
//! A scheduled game with stakes, a player capacity and a lifecycle status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::{DomainError, GameId, Money};

use super::Aggregate;

/// Kind of game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameType {
    GeneralKnowledge,
}

impl GameType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameType::GeneralKnowledge => "GENERAL_KNOWLEDGE",
        }
    }
}

/// Lifecycle status of a game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameStatus {
    /// Scheduled and open for entry
    Created,
    Started,
    Completed,
    Cancelled,
}

impl GameStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameStatus::Created => "CREATED",
            GameStatus::Started => "STARTED",
            GameStatus::Completed => "COMPLETED",
            GameStatus::Cancelled => "CANCELLED",
        }
    }

    /// Whether users may still join a game in this status.
    ///
    /// Matches exhaustively so that adding a status forces a decision here.
    pub fn is_open_for_entry(&self) -> bool {
        match self {
            GameStatus::Created => true,
            GameStatus::Started | GameStatus::Completed | GameStatus::Cancelled => false,
        }
    }
}

/// Error parsing a persisted enum value
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl FromStr for GameStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATED" => Ok(GameStatus::Created),
            "STARTED" => Ok(GameStatus::Started),
            "COMPLETED" => Ok(GameStatus::Completed),
            "CANCELLED" => Ok(GameStatus::Cancelled),
            other => Err(UnknownVariant {
                kind: "game status",
                value: other.to_string(),
            }),
        }
    }
}

impl FromStr for GameType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GENERAL_KNOWLEDGE" => Ok(GameType::GeneralKnowledge),
            other => Err(UnknownVariant {
                kind: "game type",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Game Aggregate
#[derive(Debug, Clone, PartialEq)]
pub struct Game {
    id: GameId,
    game_type: GameType,
    status: GameStatus,
    buy_in: Money,
    max: Money,
    min: Money,
    start: DateTime<Utc>,
    /// Player capacity
    players: u32,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl Game {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: GameId,
        game_type: GameType,
        status: GameStatus,
        buy_in: Money,
        max: Money,
        min: Money,
        start: DateTime<Utc>,
        players: u32,
    ) -> Self {
        Self {
            id,
            game_type,
            status,
            buy_in,
            max,
            min,
            start,
            players,
            created_at: None,
            updated_at: None,
        }
    }

    /// Check the stake fields are consistent with each other.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.players == 0 {
            return Err(DomainError::InvalidGame(
                "player capacity must be at least 1".to_string(),
            ));
        }

        if !self.buy_in.has_same_currency(&self.max) || !self.buy_in.has_same_currency(&self.min)
        {
            return Err(DomainError::InvalidGame(
                "buy-in and stakes must share one currency".to_string(),
            ));
        }

        if self.buy_in.is_negative() || self.min.is_negative() {
            return Err(DomainError::InvalidGame(
                "amounts must not be negative".to_string(),
            ));
        }

        if !self.max.greater_than_or_equal(&self.min)? {
            return Err(DomainError::InvalidGame(
                "minimum stake exceeds maximum stake".to_string(),
            ));
        }

        Ok(())
    }

    /// A game has started once its scheduled start is at or before `now`.
    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        self.start <= now
    }

    pub fn with_status(mut self, status: GameStatus) -> Self {
        self.status = status;
        self
    }

    /// Attach store-assigned timestamps
    pub fn with_timestamps(mut self, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self.updated_at = Some(updated_at);
        self
    }

    // =========================================================================
    // Getters
    // =========================================================================

    pub fn game_type(&self) -> GameType {
        self.game_type
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn buy_in(&self) -> &Money {
        &self.buy_in
    }

    pub fn max(&self) -> &Money {
        &self.max
    }

    pub fn min(&self) -> &Money {
        &self.min
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn players(&self) -> u32 {
        self.players
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

impl Aggregate for Game {
    type Id = GameId;

    fn aggregate_type() -> &'static str {
        "Game"
    }

    fn id(&self) -> GameId {
        self.id
    }
}
