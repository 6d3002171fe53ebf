use thiserror::Error;

/// Why a room operation was rejected. Every variant maps to a stable code the
/// client can switch on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoomError {
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Room not found: {0}")]
    RoomNotFound(String),

    #[error("Room is full")]
    RoomFull,

    #[error("Player not in room")]
    NotSeated,

    #[error("Not your turn")]
    NotYourTurn,

    #[error("Game has ended")]
    GameAlreadyEnded,

    #[error("Invalid square notation")]
    InvalidSquareNotation,

    #[error("Illegal move")]
    IllegalMove,

    #[error("Opponent not connected")]
    OpponentNotConnected,

    /// The room store could not be read or written. Retrying may succeed.
    #[error("Failed to apply change: {0}")]
    PersistenceFailure(String),

    #[error("Unknown operation: {0}")]
    UnknownOperation(String),
}

impl RoomError {
    pub fn code(&self) -> &'static str {
        match self {
            RoomError::MalformedRequest(_) => "MALFORMED_REQUEST",
            RoomError::RoomNotFound(_) => "ROOM_NOT_FOUND",
            RoomError::RoomFull => "ROOM_FULL",
            RoomError::NotSeated => "NOT_SEATED",
            RoomError::NotYourTurn => "NOT_YOUR_TURN",
            RoomError::GameAlreadyEnded => "GAME_ALREADY_ENDED",
            RoomError::InvalidSquareNotation => "INVALID_SQUARE_NOTATION",
            RoomError::IllegalMove => "ILLEGAL_MOVE",
            RoomError::OpponentNotConnected => "OPPONENT_NOT_CONNECTED",
            RoomError::PersistenceFailure(_) => "PERSISTENCE_FAILURE",
            RoomError::UnknownOperation(_) => "UNKNOWN_OPERATION",
        }
    }

    /// Server-side faults, as opposed to requests the caller should correct.
    pub fn is_server_error(&self) -> bool {
        matches!(self, RoomError::PersistenceFailure(_))
    }
}

/// Result type alias for room operations
pub type RoomResult<T> = Result<T, RoomError>;
