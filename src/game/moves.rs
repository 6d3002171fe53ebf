//! Pseudo-legal move generation and the attack oracle.
//!
//! Nothing here looks at whether the mover's own king ends up attacked; that
//! filtering lives in [`super::legality`].

use super::board::Board;
use super::types::{Color, Move, Piece, PieceType, Square};

const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (2, 1),
    (2, -1),
    (-2, 1),
    (-2, -1),
    (1, 2),
    (1, -2),
    (-1, 2),
    (-1, -2),
];

const KING_OFFSETS: [(i8, i8); 8] = [
    (1, 0),
    (1, 1),
    (1, -1),
    (0, 1),
    (0, -1),
    (-1, 0),
    (-1, 1),
    (-1, -1),
];

const ROOK_DIRECTIONS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const BISHOP_DIRECTIONS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

/// Walks each direction until the edge, a friendly piece (excluded) or an
/// enemy piece (included).
fn slide(
    board: &Board,
    from: Square,
    color: Color,
    directions: &[(i8, i8)],
    out: &mut Vec<Square>,
) {
    for &(df, dr) in directions {
        let mut current = from;
        while let Some(next) = current.offset(df, dr) {
            match board.piece_at(next) {
                None => out.push(next),
                Some(p) => {
                    if p.color != color {
                        out.push(next);
                    }
                    break;
                }
            }
            current = next;
        }
    }
}

fn step(board: &Board, from: Square, color: Color, offsets: &[(i8, i8)], out: &mut Vec<Square>) {
    for &(df, dr) in offsets {
        if let Some(to) = from.offset(df, dr) {
            if board.piece_at(to).map_or(true, |p| p.color != color) {
                out.push(to);
            }
        }
    }
}

fn pawn_pushes_and_captures(board: &Board, from: Square, color: Color, out: &mut Vec<Square>) {
    let dir = color.forward();
    if let Some(one) = from.offset(0, dir) {
        if board.piece_at(one).is_none() {
            out.push(one);
            if from.rank == color.pawn_start_rank() {
                if let Some(two) = from.offset(0, 2 * dir) {
                    if board.piece_at(two).is_none() {
                        out.push(two);
                    }
                }
            }
        }
    }
    for target in pawn_attacks(from, color) {
        if board.piece_at(target).is_some_and(|p| p.color != color) {
            out.push(target);
        }
    }
}

/// The two forward-diagonal squares a pawn attacks, whether or not anything
/// stands there.
pub fn pawn_attacks(from: Square, color: Color) -> impl Iterator<Item = Square> {
    let dir = color.forward();
    [-1i8, 1]
        .into_iter()
        .filter_map(move |df| from.offset(df, dir))
}

/// Destination squares for `piece` standing on `from`, ignoring self-check.
pub fn pseudo_legal_targets(board: &Board, from: Square, piece: Piece) -> Vec<Square> {
    let mut out = Vec::with_capacity(28);
    match piece.kind {
        PieceType::Pawn => pawn_pushes_and_captures(board, from, piece.color, &mut out),
        PieceType::Knight => step(board, from, piece.color, &KNIGHT_OFFSETS, &mut out),
        PieceType::Bishop => slide(board, from, piece.color, &BISHOP_DIRECTIONS, &mut out),
        PieceType::Rook => slide(board, from, piece.color, &ROOK_DIRECTIONS, &mut out),
        PieceType::Queen => {
            slide(board, from, piece.color, &ROOK_DIRECTIONS, &mut out);
            slide(board, from, piece.color, &BISHOP_DIRECTIONS, &mut out);
        }
        PieceType::King => step(board, from, piece.color, &KING_OFFSETS, &mut out),
    }
    out
}

/// Pseudo-legal moves for `piece` on `from`. Pawn moves onto the far rank
/// carry a default queen promotion.
pub fn pseudo_legal_moves(board: &Board, from: Square, piece: Piece) -> Vec<Move> {
    let last_rank = piece.color.promotion_rank();
    pseudo_legal_targets(board, from, piece)
        .into_iter()
        .map(|to| {
            if piece.kind == PieceType::Pawn && to.rank == last_rank {
                Move::with_promotion(from, to, PieceType::Queen)
            } else {
                Move::new(from, to)
            }
        })
        .collect()
}

/// True if any piece of `by` attacks `square`. Pawns attack diagonally only.
pub fn is_square_attacked(board: &Board, square: Square, by: Color) -> bool {
    board
        .pieces()
        .filter(|(_, p)| p.color == by)
        .any(|(from, piece)| match piece.kind {
            PieceType::Pawn => pawn_attacks(from, by).any(|s| s == square),
            _ => pseudo_legal_targets(board, from, piece).contains(&square),
        })
}
