use thiserror::Error;

use crate::board::BoardMove;

/// Errors surfaced to the remote peer as `{"error": ...}` records.
///
/// None of these are fatal: every variant is reported and the loop that
/// produced it keeps running.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("invalid message format: {0}")]
    Transport(String),
    #[error("invalid command: {0}")]
    UnknownCommand(String),
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error("illegal move {0}")]
    IllegalMove(BoardMove),
    #[error("game already active")]
    ModeChangeRejected,
    #[error("failed to start game: {0}")]
    StartRejected(&'static str),
    #[error("no active game")]
    NoActiveGame,
    #[error("another move is in progress")]
    MoveInProgress,
    #[error("remote moves are disabled in local mode")]
    RemoteMovesDisabled,
    #[error("board already paired")]
    AlreadyPaired,
    #[error("invalid square: {0}")]
    InvalidSquare(String),
    #[error("invalid move notation: {0}")]
    InvalidNotation(String),
    #[error("unknown game mode: {0}")]
    UnknownMode(String),
}
