//! Game Orchestrator

use std::sync::Arc;

use crate::aggregate::{Aggregate, Game, GameStatus};
use crate::domain::GameId;
use crate::error::AppResult;
use crate::store::{GameReader, GameWriter};

use super::CreateGameCommand;

pub struct GameOrchestrator {
    reader: Arc<dyn GameReader>,
    writer: Arc<dyn GameWriter>,
}

impl GameOrchestrator {
    pub fn new(reader: Arc<dyn GameReader>, writer: Arc<dyn GameWriter>) -> Self {
        Self { reader, writer }
    }

    /// Validate and persist a new game
    pub async fn create_game(&self, game: &Game) -> AppResult<Game> {
        game.validate()?;
        let game = self.writer.insert(game).await?;

        tracing::info!(
            game_id = %game.id(),
            players = game.players(),
            start = %game.start(),
            "Game created"
        );
        Ok(game)
    }

    /// Schedule a new game in the `CREATED` status
    pub async fn schedule(&self, command: CreateGameCommand) -> AppResult<Game> {
        let game = Game::new(
            GameId::new(),
            command.game_type,
            GameStatus::Created,
            command.buy_in,
            command.max,
            command.min,
            command.start,
            command.players,
        );
        self.create_game(&game).await
    }

    pub async fn get_game(&self, id: GameId) -> AppResult<Game> {
        Ok(self.reader.get_by_id(id).await?)
    }

    /// All games, earliest start first
    pub async fn get_games(&self) -> AppResult<Vec<Game>> {
        Ok(self.reader.get_games().await?)
    }

    pub async fn update_game_status(&self, id: GameId, status: GameStatus) -> AppResult<Game> {
        let game = self.reader.get_by_id(id).await?;
        let from = game.status();
        let game = self.writer.update(&game.with_status(status)).await?;

        tracing::info!(game_id = %id, from = %from, to = %status, "Game status changed");
        Ok(game)
    }
}
