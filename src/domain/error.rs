//! Domain Error Types
//!
//! Business rule violations, independent of the web and storage layers.

use serde::Serialize;
use thiserror::Error;

use super::MoneyError;

/// Reasons a user may not enter a game.
///
/// The `Display` text of each variant is the client-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameEntryViolation {
    FullCapacity,
    AlreadyStarted,
    IncorrectStatus,
    AlreadyEntered,
}

impl GameEntryViolation {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            GameEntryViolation::FullCapacity => "game_full_capacity",
            GameEntryViolation::AlreadyStarted => "game_already_started",
            GameEntryViolation::IncorrectStatus => "game_incorrect_status",
            GameEntryViolation::AlreadyEntered => "game_already_entered",
        }
    }
}

impl std::fmt::Display for GameEntryViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameEntryViolation::FullCapacity => write!(f, "Game has reached full capacity"),
            GameEntryViolation::AlreadyStarted => write!(f, "Game has already started"),
            GameEntryViolation::IncorrectStatus => {
                write!(f, "Game does not have the correct status to enter")
            }
            GameEntryViolation::AlreadyEntered => write!(f, "User has already entered Game"),
        }
    }
}

/// Domain-specific errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Requested aggregate does not exist
    #[error("{0}")]
    NotFound(String),

    /// Uniqueness invariant violated at the storage layer
    #[error("{0}")]
    DuplicateRecord(String),

    /// Game entry eligibility rule violated
    #[error("{0}")]
    GameEntry(GameEntryViolation),

    /// Email or username already registered
    #[error("{0}")]
    UserCreation(String),

    /// Credentials did not verify
    #[error("{0}")]
    NotAuthenticated(String),

    /// Purse could not be created after the user was inserted
    #[error("{0}")]
    PurseCreation(String),

    /// Purse balance too low for a debit
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: i64, available: i64 },

    /// Game definition failed validation
    #[error("Invalid game: {0}")]
    InvalidGame(String),

    #[error(transparent)]
    Money(#[from] MoneyError),
}

impl DomainError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn game_entry(violation: GameEntryViolation) -> Self {
        Self::GameEntry(violation)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this is a client error (caller's fault, not a fault in the system)
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::PurseCreation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_entry_messages() {
        let cases = [
            (GameEntryViolation::FullCapacity, "Game has reached full capacity"),
            (GameEntryViolation::AlreadyStarted, "Game has already started"),
            (
                GameEntryViolation::IncorrectStatus,
                "Game does not have the correct status to enter",
            ),
            (GameEntryViolation::AlreadyEntered, "User has already entered Game"),
        ];

        for (violation, message) in cases {
            assert_eq!(DomainError::game_entry(violation).to_string(), message);
        }
    }

    #[test]
    fn test_violation_codes_are_distinct() {
        let codes = [
            GameEntryViolation::FullCapacity.code(),
            GameEntryViolation::AlreadyStarted.code(),
            GameEntryViolation::IncorrectStatus.code(),
            GameEntryViolation::AlreadyEntered.code(),
        ];
        for (i, a) in codes.iter().enumerate() {
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_purse_creation_is_not_client_error() {
        assert!(!DomainError::PurseCreation("boom".to_string()).is_client_error());
        assert!(DomainError::not_found("missing").is_client_error());
        assert!(DomainError::not_found("missing").is_not_found());
    }
}
