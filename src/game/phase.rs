use super::board::Board;
use super::legality::all_legal_moves;
use super::moves::is_square_attacked;
use super::types::{Color, GamePhase, MoveContext};

/// Check, checkmate and stalemate for the side to move. Always computed
/// from scratch; nothing is carried over from the previous position.
pub fn game_phase(board: &Board, turn: Color, context: &MoveContext) -> GamePhase {
    let check = board
        .king_square(turn)
        .is_some_and(|king| is_square_attacked(board, king, turn.opposite()));
    let stuck = all_legal_moves(board, turn, context).is_empty();
    GamePhase {
        turn,
        check,
        checkmate: check && stuck,
        stalemate: !check && stuck,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::types::{CastlingRights, Piece, PieceType, Square};

    fn sq(file: u8, rank: u8) -> Square {
        Square::new(file, rank).unwrap()
    }

    #[test]
    fn start_position_is_quiet() {
        let phase = game_phase(&Board::initial(), Color::White, &MoveContext::default());
        assert_eq!(
            phase,
            GamePhase {
                turn: Color::White,
                check: false,
                checkmate: false,
                stalemate: false,
            }
        );
    }

    #[test]
    fn back_rank_mate() {
        let board = Board::empty()
            .with_piece(sq(6, 0), Some(Piece::new(PieceType::King, Color::White)))
            .with_piece(sq(5, 1), Some(Piece::new(PieceType::Pawn, Color::White)))
            .with_piece(sq(6, 1), Some(Piece::new(PieceType::Pawn, Color::White)))
            .with_piece(sq(7, 1), Some(Piece::new(PieceType::Pawn, Color::White)))
            .with_piece(sq(0, 0), Some(Piece::new(PieceType::Rook, Color::Black)))
            .with_piece(sq(6, 7), Some(Piece::new(PieceType::King, Color::Black)));
        let context = MoveContext {
            castling_rights: CastlingRights::NONE,
            last_move: None,
        };
        let phase = game_phase(&board, Color::White, &context);
        assert!(phase.check);
        assert!(phase.checkmate);
        assert!(!phase.stalemate);
    }

    #[test]
    fn cornered_king_is_stalemated() {
        let board = Board::empty()
            .with_piece(sq(7, 7), Some(Piece::new(PieceType::King, Color::Black)))
            .with_piece(sq(6, 5), Some(Piece::new(PieceType::Queen, Color::White)))
            .with_piece(sq(0, 0), Some(Piece::new(PieceType::King, Color::White)));
        let context = MoveContext {
            castling_rights: CastlingRights::NONE,
            last_move: None,
        };
        let phase = game_phase(&board, Color::Black, &context);
        assert!(!phase.check);
        assert!(phase.stalemate);
        assert!(!phase.checkmate);
    }

    #[test]
    fn check_with_an_escape_is_not_mate() {
        let board = Board::empty()
            .with_piece(sq(4, 0), Some(Piece::new(PieceType::King, Color::White)))
            .with_piece(sq(4, 7), Some(Piece::new(PieceType::Rook, Color::Black)))
            .with_piece(sq(0, 7), Some(Piece::new(PieceType::King, Color::Black)));
        let context = MoveContext {
            castling_rights: CastlingRights::NONE,
            last_move: None,
        };
        let phase = game_phase(&board, Color::White, &context);
        assert!(phase.check);
        assert!(!phase.checkmate);
        assert!(!phase.stalemate);
    }
}
