use serde::Serialize;

use super::board::Board;
use super::castling::update_castling_rights;
use super::fen::parse_fen;
use super::legality::legal_moves;
use super::phase::game_phase;
use super::types::{CastlingRights, Color, GamePhase, Move, MoveContext, PieceType, Square};

/// Everything one game in a room needs: the position, whose turn it is, the
/// derived phase, castling rights, the previous move (for en passant) and a
/// resignation marker. Serializes to the wire game-state shape.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub board: Board,
    pub turn: Color,
    pub game_phase: GamePhase,
    pub castling_rights: CastlingRights,
    pub last_move: Option<Move>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resigned: Option<Color>,
}

/// How a finished game ended.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "reason", rename_all = "camelCase")]
pub enum Outcome {
    Checkmate { winner: Color },
    Stalemate,
    Resignation { winner: Color },
}

/// Where a room's game stands. A room with one seated player is waiting
/// regardless of its game state.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum SessionStatus {
    AwaitingOpponent,
    Active,
    Ended(Outcome),
}

impl Default for GameState {
    fn default() -> Self {
        GameState::new()
    }
}

impl GameState {
    /// A fresh game: initial board, white to move, all castling rights.
    pub fn new() -> Self {
        Self::from_parts(Board::initial(), Color::White, CastlingRights::default(), None)
    }

    fn from_parts(
        board: Board,
        turn: Color,
        castling_rights: CastlingRights,
        last_move: Option<Move>,
    ) -> Self {
        let context = MoveContext {
            castling_rights,
            last_move,
        };
        GameState {
            game_phase: game_phase(&board, turn, &context),
            board,
            turn,
            castling_rights,
            last_move,
            resigned: None,
        }
    }

    /// Sets up a game from a FEN record.
    pub fn from_fen(fen: &str) -> Option<Self> {
        let position = parse_fen(fen)?;
        Some(Self::from_parts(
            position.board,
            position.turn,
            position.castling_rights,
            position.last_move,
        ))
    }

    pub fn context(&self) -> MoveContext {
        MoveContext {
            castling_rights: self.castling_rights,
            last_move: self.last_move,
        }
    }

    pub fn is_over(&self) -> bool {
        self.outcome().is_some()
    }

    pub fn outcome(&self) -> Option<Outcome> {
        if let Some(loser) = self.resigned {
            Some(Outcome::Resignation {
                winner: loser.opposite(),
            })
        } else if self.game_phase.checkmate {
            Some(Outcome::Checkmate {
                winner: self.turn.opposite(),
            })
        } else if self.game_phase.stalemate {
            Some(Outcome::Stalemate)
        } else {
            None
        }
    }

    pub fn status(&self, seated: usize) -> SessionStatus {
        match self.outcome() {
            Some(outcome) => SessionStatus::Ended(outcome),
            None if seated < 2 => SessionStatus::AwaitingOpponent,
            None => SessionStatus::Active,
        }
    }

    pub fn legal_moves_from(&self, square: Square) -> Vec<Move> {
        legal_moves(&self.board, square, &self.context())
    }

    /// Finds the legal move from `from` to `to` matching the requested
    /// promotion. A promotion move with no request becomes a queen; asking
    /// for a promotion on a move that does not promote matches nothing.
    pub fn find_legal_move(
        &self,
        from: Square,
        to: Square,
        promotion: Option<PieceType>,
    ) -> Option<Move> {
        self.legal_moves_from(from)
            .into_iter()
            .filter(|mv| mv.to == to)
            .find_map(|mv| match (mv.promotion, promotion) {
                (Some(_), requested) => Some(Move {
                    promotion: Some(requested.unwrap_or(PieceType::Queen)),
                    ..mv
                }),
                (None, None) => Some(mv),
                (None, Some(_)) => None,
            })
    }

    /// Plays an already validated move: new board, other side to move,
    /// narrowed castling rights and a recomputed phase. A move from an empty
    /// square returns the state unchanged.
    pub fn apply_move(&self, mv: &Move) -> GameState {
        let Some(piece) = self.board.piece_at(mv.from) else {
            return self.clone();
        };
        Self::from_parts(
            self.board.apply_move(mv),
            self.turn.opposite(),
            update_castling_rights(self.castling_rights, mv, piece),
            Some(*mv),
        )
    }

    /// Marks `color` as having resigned. Has no effect on a finished game.
    pub fn resign(&self, color: Color) -> GameState {
        if self.is_over() {
            return self.clone();
        }
        GameState {
            resigned: Some(color),
            ..self.clone()
        }
    }
}
