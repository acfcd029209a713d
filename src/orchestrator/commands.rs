//! Command definitions
//!
//! Commands represent intentions to change the system state. They double as
//! request bodies for the HTTP layer.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::aggregate::{GameStatus, GameType};
use crate::domain::{Currency, Money};

/// Command to register a new user
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserCommand {
    pub email: String,
    pub username: String,
    pub password: String,
    /// Purse currency; the configured default when absent
    #[serde(default)]
    pub currency: Option<Currency>,
}

impl CreateUserCommand {
    pub fn new(
        email: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            username: username.into(),
            password: password.into(),
            currency: None,
        }
    }

    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currency = Some(currency);
        self
    }
}

/// Command to change a user's details. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserCommand {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Command to schedule a new game
#[derive(Debug, Clone, Deserialize)]
pub struct CreateGameCommand {
    pub game_type: GameType,
    pub buy_in: Money,
    pub max: Money,
    pub min: Money,
    pub start: DateTime<Utc>,
    pub players: u32,
}

/// Command to move a game to a new status
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateGameStatusCommand {
    pub status: GameStatus,
}
