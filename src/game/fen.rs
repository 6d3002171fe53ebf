//! FEN import for setting up arbitrary positions.
//!
//! The halfmove and fullmove counters are accepted and ignored. The
//! en-passant field is turned back into the double step that produced it,
//! since that is how the rest of the engine tracks en passant.

use super::board::Board;
use super::notation::parse_square;
use super::types::{CastlingRights, Color, Move, Piece, PieceType, Square};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FenPosition {
    pub board: Board,
    pub turn: Color,
    pub castling_rights: CastlingRights,
    pub last_move: Option<Move>,
}

fn piece_from_char(c: char) -> Option<Piece> {
    let color = if c.is_ascii_uppercase() {
        Color::White
    } else {
        Color::Black
    };
    let kind = match c.to_ascii_lowercase() {
        'p' => PieceType::Pawn,
        'n' => PieceType::Knight,
        'b' => PieceType::Bishop,
        'r' => PieceType::Rook,
        'q' => PieceType::Queen,
        'k' => PieceType::King,
        _ => return None,
    };
    Some(Piece::new(kind, color))
}

fn parse_placement(placement: &str) -> Option<Board> {
    let rows: Vec<&str> = placement.split('/').collect();
    if rows.len() != 8 {
        return None;
    }
    let mut board = Board::empty();
    for (i, row) in rows.iter().enumerate() {
        let rank = 7 - i as u8;
        let mut file = 0u8;
        for c in row.chars() {
            if let Some(skip) = c.to_digit(10) {
                file += skip as u8;
                if file > 8 {
                    return None;
                }
            } else {
                let square = Square::new(file, rank)?;
                board = board.with_piece(square, Some(piece_from_char(c)?));
                file += 1;
            }
        }
        if file != 8 {
            return None;
        }
    }
    Some(board)
}

fn parse_castling(field: &str) -> Option<CastlingRights> {
    let mut rights = CastlingRights::NONE;
    if field == "-" {
        return Some(rights);
    }
    for c in field.chars() {
        match c {
            'K' => rights.white_kingside = true,
            'Q' => rights.white_queenside = true,
            'k' => rights.black_kingside = true,
            'q' => rights.black_queenside = true,
            _ => return None,
        }
    }
    Some(rights)
}

/// Reconstructs the double pawn step implied by an en-passant target square.
fn double_step_through(target: Square, turn: Color) -> Option<Move> {
    // the pawn that just moved belongs to the side not on move
    let mover = turn.opposite();
    let dir = mover.forward();
    let from = target.offset(0, -dir)?;
    let to = target.offset(0, dir)?;
    Some(Move::new(from, to))
}

/// Parses a FEN record. Returns `None` on any malformed field.
pub fn parse_fen(fen: &str) -> Option<FenPosition> {
    let mut fields = fen.split_whitespace();
    let board = parse_placement(fields.next()?)?;
    let turn = match fields.next().unwrap_or("w") {
        "w" => Color::White,
        "b" => Color::Black,
        _ => return None,
    };
    let castling_rights = parse_castling(fields.next().unwrap_or("-"))?;
    let last_move = match fields.next().unwrap_or("-") {
        "-" => None,
        target => Some(double_step_through(parse_square(target)?, turn)?),
    };
    Some(FenPosition {
        board,
        turn,
        castling_rights,
        last_move,
    })
}
