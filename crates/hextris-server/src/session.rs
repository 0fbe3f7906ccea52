//! Per-connection game session management.

use hextris_core::{
    Bot, BotDifficulty, GameConfig, GameError, GameEvent, GameSession, HexSettings, InputEvent, Move,
    SessionSnapshot,
};
use tracing::info;
use uuid::Uuid;

use crate::protocol::SessionInfo;

/// The game owned by one WebSocket connection.
pub struct ClientSession {
    pub id: Uuid,
    config: GameConfig,
    game: GameSession,
    bot: Bot,
}

impl ClientSession {
    pub fn new(id: Uuid, config: GameConfig, seed: Option<u64>) -> Result<Self, GameError> {
        let game = Self::start(config, seed)?;
        Ok(Self {
            id,
            config,
            game,
            bot: Bot::new(BotDifficulty::Greedy),
        })
    }

    fn start(config: GameConfig, seed: Option<u64>) -> Result<GameSession, GameError> {
        match seed {
            Some(seed) => GameSession::with_seed(config, seed),
            None => GameSession::new(config),
        }
    }

    /// Replace the game with a fresh one, keeping the current settings
    pub fn restart(&mut self, seed: Option<u64>) -> Result<(), GameError> {
        let config = GameConfig {
            settings: self.game.config().settings,
            ..self.config
        };
        self.game = Self::start(config, seed)?;
        info!(session = %self.id, ?seed, "Restarted game");
        Ok(())
    }

    pub fn apply_input(&mut self, event: InputEvent) -> Result<Vec<GameEvent>, GameError> {
        self.game.handle(event)
    }

    pub fn update_settings(&mut self, settings: HexSettings) -> Result<Vec<GameEvent>, GameError> {
        self.game.set_settings(settings)
    }

    /// Suggested placement for the current position
    pub fn hint(&mut self) -> Option<Move> {
        self.bot.choose_move(&self.game)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.game.snapshot()
    }

    pub fn to_info(&self) -> SessionInfo {
        SessionInfo {
            id: self.id,
            moves: self.game.moves(),
            occupied_cells: self.game.board().occupied_count(),
            game_over: self.game.is_game_over(),
        }
    }
}
