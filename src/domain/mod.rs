//! Domain module
//!
//! Value types and business rule errors shared by every aggregate.

pub mod context;
pub mod error;
pub mod ids;
pub mod money;
pub mod password;

pub use context::OperationContext;
pub use error::{DomainError, GameEntryViolation};
pub use ids::{EntryId, GameId, UserId};
pub use money::{Currency, Money, MoneyError};
pub use password::{PasswordHash, PasswordHashError};
