use actix::Message;
use serde::{Deserialize, Serialize};

use crate::board::BoardOutcome;

/// Message sent from the remote peer to the board
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CommandRecord {
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(rename = "move", default, skip_serializing_if = "Option::is_none")]
    pub mv: Option<String>,
}

impl CommandRecord {
    pub fn new(action: &str) -> Self {
        CommandRecord {
            action: action.to_string(),
            mode: None,
            mv: None,
        }
    }
}

/// Message sent from the board to the remote peer
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum EventRecord {
    Response {
        response: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fen: Option<String>,
    },
    Success {
        success: String,
    },
    Error {
        error: String,
    },
    Event(BoardEvent),
}

impl EventRecord {
    pub fn response(text: &str) -> Self {
        EventRecord::Response {
            response: text.to_string(),
            fen: None,
        }
    }

    pub fn success(text: String) -> Self {
        EventRecord::Success { success: text }
    }

    pub fn error(error: impl ToString) -> Self {
        EventRecord::Error {
            error: error.to_string(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|e| format!("{{\"error\":\"failed to encode reply: {}\"}}", e))
    }
}

/// Board activity pushed to the peer without being asked for
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BoardEvent {
    MovePlayed {
        #[serde(rename = "move")]
        mv: String,
        fen: String,
    },
    IllegalMove {
        #[serde(rename = "move")]
        mv: String,
    },
    RemoteMovePending {
        #[serde(rename = "move")]
        mv: String,
    },
    RemoteMoveCompleted {
        #[serde(rename = "move")]
        mv: String,
        fen: String,
    },
    GameEnded {
        result: String,
    },
}

impl BoardEvent {
    /// The part of an outcome the peer cares about. Light-only outcomes
    /// (highlights, settling, restoring) stay on the board.
    pub fn from_outcome(outcome: &BoardOutcome) -> Option<BoardEvent> {
        match outcome {
            BoardOutcome::MoveAccepted { mv, fen } => Some(BoardEvent::MovePlayed {
                mv: mv.to_string(),
                fen: fen.clone(),
            }),
            BoardOutcome::IllegalMove { mv } => Some(BoardEvent::IllegalMove { mv: mv.to_string() }),
            BoardOutcome::RemoteMoveIncomplete { mv } => {
                Some(BoardEvent::RemoteMovePending { mv: mv.to_string() })
            }
            BoardOutcome::RemoteMoveCompleted { mv, fen } => Some(BoardEvent::RemoteMoveCompleted {
                mv: mv.to_string(),
                fen: fen.clone(),
            }),
            BoardOutcome::GameOver { result } => Some(BoardEvent::GameEnded {
                result: result.to_string(),
            }),
            _ => None,
        }
    }
}

/// Text frame delivered to the paired websocket actor
#[derive(Message)]
#[rtype(result = "()")]
pub struct PeerMessage(pub String);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::BoardMove;
    use crate::game::GameOutcome;

    #[test]
    fn test_command_record_parsing() {
        let record: CommandRecord = serde_json::from_str(r#"{"action":"move","move":"e2e4"}"#).unwrap();
        assert_eq!(record.action, "move");
        assert_eq!(record.mv.as_deref(), Some("e2e4"));
        assert_eq!(record.mode, None);

        let record: CommandRecord = serde_json::from_str(r#"{"action":"ping"}"#).unwrap();
        assert_eq!(record, CommandRecord::new("ping"));

        assert!(serde_json::from_str::<CommandRecord>(r#"{"mode":"pvp"}"#).is_err());
    }

    #[test]
    fn test_reply_shapes() {
        assert_eq!(EventRecord::response("pong").to_json(), r#"{"response":"pong"}"#);
        assert_eq!(
            EventRecord::success("game mode set to pvp".to_string()).to_json(),
            r#"{"success":"game mode set to pvp"}"#
        );
        assert_eq!(EventRecord::error("no active game").to_json(), r#"{"error":"no active game"}"#);
    }

    #[test]
    fn test_events_are_tagged() {
        let event = EventRecord::Event(BoardEvent::IllegalMove {
            mv: "e2e5".to_string(),
        });
        assert_eq!(event.to_json(), r#"{"event":"illegal_move","move":"e2e5"}"#);

        let parsed: EventRecord = serde_json::from_str(r#"{"event":"game_ended","result":"1-0"}"#).unwrap();
        assert_eq!(
            parsed,
            EventRecord::Event(BoardEvent::GameEnded {
                result: "1-0".to_string()
            })
        );
    }

    #[test]
    fn test_outcomes_to_events() {
        let mv: BoardMove = "e7e5".parse().unwrap();
        assert_eq!(
            BoardEvent::from_outcome(&BoardOutcome::RemoteMoveIncomplete { mv }),
            Some(BoardEvent::RemoteMovePending {
                mv: "e7e5".to_string()
            })
        );
        assert_eq!(
            BoardEvent::from_outcome(&BoardOutcome::GameOver {
                result: GameOutcome::Draw
            }),
            Some(BoardEvent::GameEnded {
                result: "1/2-1/2".to_string()
            })
        );
        assert_eq!(BoardEvent::from_outcome(&BoardOutcome::Settled { mv }), None);
    }
}
