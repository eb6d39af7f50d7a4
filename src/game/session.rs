use log::info;
use std::fmt;
use std::str::FromStr;

use super::oracle::{ChessGame, ChessOracle, OracleFactory};
use super::utils::GameOutcome;
use crate::error::BoardError;

/// How the two sides of the board are played.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameMode {
    /// Both players at the physical board; remote moves are refused.
    Local,
    /// Local player against a remote human.
    Pvp,
    /// Local player against a remote bot.
    Pvb,
    /// Both sides fed remotely; the board only mirrors.
    Bvb,
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GameMode::Local => "local",
            GameMode::Pvp => "pvp",
            GameMode::Pvb => "pvb",
            GameMode::Bvb => "bvb",
        })
    }
}

impl FromStr for GameMode {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(GameMode::Local),
            "pvp" => Ok(GameMode::Pvp),
            "pvb" => Ok(GameMode::Pvb),
            "bvb" => Ok(GameMode::Bvb),
            _ => Err(BoardError::UnknownMode(s.to_string())),
        }
    }
}

/// Mode, active flag and live position of the one game on the board.
///
/// The position exists exactly while the game is active.
pub struct GameSession {
    mode: Option<GameMode>,
    position: Option<Box<dyn ChessOracle>>,
    new_position: OracleFactory,
}

impl GameSession {
    pub fn new(new_position: OracleFactory) -> Self {
        GameSession {
            mode: None,
            position: None,
            new_position,
        }
    }

    pub fn set_mode(&mut self, mode: GameMode) -> Result<(), BoardError> {
        if self.is_active() {
            return Err(BoardError::ModeChangeRejected);
        }
        info!("Game mode set to {}", mode);
        self.mode = Some(mode);
        Ok(())
    }

    pub fn start(&mut self) -> Result<(), BoardError> {
        if self.is_active() {
            return Err(BoardError::StartRejected("game already active"));
        }
        let mode = self
            .mode
            .ok_or(BoardError::StartRejected("no game mode selected"))?;
        self.position = Some((self.new_position)());
        info!("Game started in mode {}", mode);
        Ok(())
    }

    pub fn end(&mut self) {
        if self.position.take().is_some() {
            info!("Game ended");
        }
        self.mode = None;
    }

    pub fn is_active(&self) -> bool {
        self.position.is_some()
    }

    pub fn mode(&self) -> Option<GameMode> {
        self.mode
    }

    pub fn position(&self) -> Option<&dyn ChessOracle> {
        self.position.as_deref()
    }

    pub fn position_mut(&mut self) -> Option<&mut Box<dyn ChessOracle>> {
        self.position.as_mut()
    }

    pub fn is_over(&self) -> Option<bool> {
        self.position().map(|position| position.is_over())
    }

    pub fn result(&self) -> Option<GameOutcome> {
        self.position().and_then(|position| position.result())
    }
}

impl Default for GameSession {
    fn default() -> Self {
        GameSession::new(Box::new(|| -> Box<dyn ChessOracle> { Box::new(ChessGame::new()) }))
    }
}
