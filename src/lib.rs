//! game_platform Library
//!
//! Re-exports modules for the server binary and integration testing.

pub mod aggregate;
pub mod api;
pub mod bank;
pub mod clock;
pub mod config;
pub mod db;
pub mod domain;
pub mod entry_fee;
mod error;
pub mod orchestrator;
pub mod store;

pub use config::Config;
pub use domain::{Currency, DomainError, GameEntryViolation, Money, OperationContext};
pub use error::{AppError, AppResult};
