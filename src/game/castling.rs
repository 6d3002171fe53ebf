use super::board::Board;
use super::moves::is_square_attacked;
use super::types::{CastleSide, CastlingRights, Color, Move, Piece, PieceType, Square};

/// Narrows `rights` after `mv` has been played by `moving`.
///
/// A king move clears both of its color's flags, a rook leaving its home
/// corner clears that corner's flag, and any move landing on an enemy home
/// corner clears the enemy flag for that corner (the rook there is either
/// being captured or already gone).
pub fn update_castling_rights(rights: CastlingRights, mv: &Move, moving: Piece) -> CastlingRights {
    let mut next = rights;
    match moving.kind {
        PieceType::King => {
            for side in CastleSide::BOTH {
                next.revoke(moving.color, side);
            }
        }
        PieceType::Rook if mv.from.rank == moving.color.home_rank() => {
            if let Some(side) = CastleSide::from_rook_file(mv.from.file) {
                next.revoke(moving.color, side);
            }
        }
        _ => {}
    }

    let enemy = moving.color.opposite();
    if mv.to.rank == enemy.home_rank() {
        if let Some(side) = CastleSide::from_rook_file(mv.to.file) {
            next.revoke(enemy, side);
        }
    }
    next
}

/// Castling moves available to `color`: the right is still held, king and
/// rook stand on their original squares, the squares between them are
/// empty, and the king neither starts on, crosses, nor lands on an attacked
/// square.
pub fn castling_moves(board: &Board, color: Color, rights: &CastlingRights) -> Vec<Move> {
    let rank = color.home_rank();
    let king_square = Square { file: 4, rank };
    if board.piece_at(king_square) != Some(Piece::new(PieceType::King, color)) {
        return Vec::new();
    }
    let enemy = color.opposite();

    CastleSide::BOTH
        .into_iter()
        .filter(|&side| rights.get(color, side))
        .filter(|&side| {
            board.piece_at(Square {
                file: side.rook_file(),
                rank,
            }) == Some(Piece::new(PieceType::Rook, color))
        })
        .filter(|&side| {
            side.between_files()
                .iter()
                .all(|&file| board.piece_at(Square { file, rank }).is_none())
        })
        .filter(|&side| {
            side.king_path_files()
                .iter()
                .all(|&file| !is_square_attacked(board, Square { file, rank }, enemy))
        })
        .map(|side| {
            Move::new(
                king_square,
                Square {
                    file: side.king_target_file(),
                    rank,
                },
            )
        })
        .collect()
}
