//! Aggregate module
//!
//! The entities owned by each registry: users, purses, games and game entries.

pub mod game;
pub mod game_entry;
pub mod purse;
pub mod user;

pub use game::{Game, GameStatus, GameType};
pub use game_entry::GameEntry;
pub use purse::UserPurse;
pub use user::User;

/// Aggregate trait that all stored entities implement
pub trait Aggregate {
    /// The identifier type of the aggregate root
    type Id: std::fmt::Display;

    /// Get the aggregate type name (for storage and error messages)
    fn aggregate_type() -> &'static str;

    /// Get the aggregate ID
    fn id(&self) -> Self::Id;
}
