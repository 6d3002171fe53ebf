//! Chess rules and the per-room game session.
//!
//! Everything in here is pure: functions take values and return new values,
//! so the engine can be called from any thread without locking.

pub mod board;
pub mod castling;
pub mod fen;
pub mod legality;
pub mod moves;
pub mod notation;
pub mod phase;
pub mod session;
pub mod types;

pub use board::Board;
pub use legality::{all_legal_moves, legal_moves};
pub use moves::is_square_attacked;
pub use notation::{parse_promotion, parse_square};
pub use phase::game_phase;
pub use session::{GameState, Outcome, SessionStatus};
pub use types::{CastlingRights, Color, GamePhase, Move, MoveContext, Piece, PieceType, Square};
