use actix::Message;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::game::{GameState, Move};
use crate::rooms::{RoomCreated, RoomError, RoomJoined, RoomSnapshot, RoomUpdate};

/// Operations a client can send over the duplex connection. Room and player
/// come from the connection's seat, so any `roomId`/`playerId` fields the
/// client includes are ignored.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    CreateRoom {
        nickname: String,
    },
    JoinRoom {
        room_id: String,
        nickname: String,
    },
    Move {
        #[serde(rename = "move")]
        mv: MovePayload,
    },
    Resign {},
    NewGame {},
    LegalMoves {
        square: String,
    },
    GetState {},
}

const OPERATIONS: [&str; 7] = [
    "createRoom",
    "joinRoom",
    "move",
    "resign",
    "newGame",
    "legalMoves",
    "getState",
];

impl ClientMessage {
    /// Parses a text frame. A frame whose `type` is not a known operation is
    /// `UnknownOperation`; anything else that does not fit is
    /// `MalformedRequest`.
    pub fn parse(text: &str) -> Result<ClientMessage, RoomError> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| RoomError::MalformedRequest(format!("invalid JSON: {e}")))?;
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| RoomError::MalformedRequest("missing type".into()))?;
        if !OPERATIONS.contains(&kind) {
            return Err(RoomError::UnknownOperation(kind.to_string()));
        }
        serde_json::from_value(value).map_err(|e| RoomError::MalformedRequest(e.to_string()))
    }
}

/// A requested move in square notation.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MovePayload {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub promotion: Option<String>,
}

/// Frames the server pushes to clients.
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    RoomCreated(RoomCreated),
    RoomJoined(RoomJoined),
    OpponentJoined {
        opponent_nickname: String,
    },
    /// A committed state. `version` grows with every commit to the room, so
    /// a client can drop a frame older than the one it already shows.
    GameState {
        room_id: String,
        version: u64,
        game: GameState,
    },
    RoomState(RoomSnapshot),
    LegalMoves {
        room_id: String,
        square: String,
        moves: Vec<Move>,
    },
    OpponentDisconnected,
    RoomClosed {
        room_id: String,
    },
    Error {
        code: String,
        message: String,
    },
}

impl From<&RoomError> for ServerMessage {
    fn from(err: &RoomError) -> Self {
        ServerMessage::Error {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<&RoomUpdate> for ServerMessage {
    fn from(update: &RoomUpdate) -> Self {
        ServerMessage::GameState {
            room_id: update.room_id.clone(),
            version: update.version,
            game: update.game_state.clone(),
        }
    }
}

impl From<&RoomJoined> for ServerMessage {
    fn from(joined: &RoomJoined) -> Self {
        ServerMessage::GameState {
            room_id: joined.room_id.clone(),
            version: joined.version,
            game: joined.game_state.clone(),
        }
    }
}

/// Message type for WebSocket communication
#[derive(Message)]
#[rtype(result = "()")]
pub struct ChessWebSocketMessage(pub String);
