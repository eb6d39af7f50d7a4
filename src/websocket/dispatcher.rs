use log::{info, warn};

use crate::board::{lock, BoardMove};
use crate::error::BoardError;
use crate::game::GameMode;
use crate::models::{AppState, CommandRecord, EventRecord};

/// The single record answering one inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub record: EventRecord,
    /// The connection ends once the record is sent.
    pub close: bool,
}

impl Reply {
    fn open(record: EventRecord) -> Self {
        Reply {
            record,
            close: false,
        }
    }

    fn closing(record: EventRecord) -> Self {
        Reply { record, close: true }
    }
}

impl From<Result<EventRecord, BoardError>> for Reply {
    fn from(result: Result<EventRecord, BoardError>) -> Self {
        match result {
            Ok(record) => Reply::open(record),
            Err(e) => {
                warn!("Command failed: {}", e);
                Reply::open(EventRecord::error(e))
            }
        }
    }
}

/// Decodes a text frame and dispatches it. Undecodable frames are answered
/// with an error and change nothing.
pub fn dispatch_text(state: &AppState, peer_id: &str, text: &str) -> Reply {
    match serde_json::from_str::<CommandRecord>(text) {
        Ok(command) => dispatch(state, peer_id, &command),
        Err(e) => {
            warn!("Error parsing command from {}: {}", peer_id, e);
            Reply::from(Err(BoardError::Transport(e.to_string())))
        }
    }
}

pub fn dispatch(state: &AppState, peer_id: &str, command: &CommandRecord) -> Reply {
    info!("Command from {}: {:?}", peer_id, command);
    match command.action.as_str() {
        "ping" => Reply::open(EventRecord::response("pong")),
        "select_gamemode" => select_gamemode(state, command).into(),
        "start_game" => start_game(state).into(),
        "move" => remote_move(state, command).into(),
        "disconnect" => {
            // Unpairing ends the game itself; a connection that never paired
            // still drops any game it started.
            if !state.unpair(peer_id) {
                lock(&state.board).end_game();
            }
            Reply::closing(EventRecord::response("disconnected"))
        }
        other => Reply::from(Err(BoardError::UnknownCommand(other.to_string()))),
    }
}

fn select_gamemode(state: &AppState, command: &CommandRecord) -> Result<EventRecord, BoardError> {
    let mode: GameMode = command
        .mode
        .as_deref()
        .ok_or(BoardError::MissingField("mode"))?
        .parse()?;
    lock(&state.board).set_mode(mode)?;
    Ok(EventRecord::success(format!("game mode set to {}", mode)))
}

fn start_game(state: &AppState) -> Result<EventRecord, BoardError> {
    let fen = lock(&state.board).start_game()?;
    Ok(EventRecord::Response {
        response: "game started".to_string(),
        fen: Some(fen),
    })
}

fn remote_move(state: &AppState, command: &CommandRecord) -> Result<EventRecord, BoardError> {
    let mv: BoardMove = command
        .mv
        .as_deref()
        .ok_or(BoardError::MissingField("move"))?
        .parse()?;
    lock(&state.board).remote_move(mv)?;
    Ok(EventRecord::response("move is valid"))
}
