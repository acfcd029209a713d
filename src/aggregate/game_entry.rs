//! Game Entry
//!
//! One user's participation in one game.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{EntryId, GameId, UserId};

use super::Aggregate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameEntry {
    pub id: EntryId,
    pub game_id: GameId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl GameEntry {
    pub fn new(game_id: GameId, user_id: UserId, created_at: DateTime<Utc>) -> Self {
        Self {
            id: EntryId::new(),
            game_id,
            user_id,
            created_at,
        }
    }
}

impl Aggregate for GameEntry {
    type Id = EntryId;

    fn aggregate_type() -> &'static str {
        "GameEntry"
    }

    fn id(&self) -> EntryId {
        self.id
    }
}
