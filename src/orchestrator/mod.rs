//! Orchestrator module
//!
//! Services that compose store operations into business operations. Each
//! orchestrator depends only on store ports and an injected clock.

mod commands;
mod game;
mod game_entry;
mod purse;
mod user;


pub use commands::*;
pub use game::GameOrchestrator;
pub use game_entry::GameEntryOrchestrator;
pub use purse::PurseOrchestrator;
pub use user::UserOrchestrator;
