use super::board::Board;
use super::castling::castling_moves;
use super::moves::{is_square_attacked, pseudo_legal_moves};
use super::types::{Color, Move, MoveContext, Piece, PieceType, Square};

/// The en-passant capture available to the pawn on `from`, if any. Only the
/// move immediately after an adjacent enemy double step qualifies.
fn en_passant_move(
    board: &Board,
    from: Square,
    pawn: Piece,
    last_move: Option<&Move>,
) -> Option<Move> {
    let last = last_move?;
    if from.rank != pawn.color.en_passant_rank() {
        return None;
    }
    let passed = board.piece_at(last.to)?;
    if !passed.is(PieceType::Pawn, pawn.color.opposite()) {
        return None;
    }
    if last.from.file != last.to.file || last.from.rank.abs_diff(last.to.rank) != 2 {
        return None;
    }
    if last.to.rank != from.rank || last.to.file.abs_diff(from.file) != 1 {
        return None;
    }
    let behind = Square::new(last.to.file, (from.rank as i8 + pawn.color.forward()) as u8)?;
    board.piece_at(behind).is_none().then(|| Move::new(from, behind))
}

/// Simulates `mv` and reports whether the mover's king is safe afterwards.
fn leaves_king_safe(board: &Board, mv: &Move, mover: Piece) -> bool {
    let next = board.apply_move(mv);
    let king = if mover.kind == PieceType::King {
        Some(mv.to)
    } else {
        next.king_square(mover.color)
    };
    match king {
        Some(square) => !is_square_attacked(&next, square, mover.color.opposite()),
        None => true,
    }
}

/// Legal moves for the piece on `square`: pseudo-legal moves plus castling
/// and en passant, minus anything that leaves the mover's king attacked.
/// An empty square yields no moves.
pub fn legal_moves(board: &Board, square: Square, context: &MoveContext) -> Vec<Move> {
    let Some(piece) = board.piece_at(square) else {
        return Vec::new();
    };

    let mut candidates = pseudo_legal_moves(board, square, piece);
    match piece.kind {
        PieceType::King => {
            candidates.extend(castling_moves(board, piece.color, &context.castling_rights))
        }
        PieceType::Pawn => {
            candidates.extend(en_passant_move(board, square, piece, context.last_move.as_ref()))
        }
        _ => {}
    }

    candidates.retain(|mv| leaves_king_safe(board, mv, piece));
    candidates
}

/// Every legal move for `color`. Used to decide whether the side to move has
/// any move at all.
pub fn all_legal_moves(board: &Board, color: Color, context: &MoveContext) -> Vec<Move> {
    board
        .pieces()
        .filter(|(_, p)| p.color == color)
        .flat_map(|(sq, _)| legal_moves(board, sq, context))
        .collect()
}
