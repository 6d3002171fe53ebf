use serde::Serialize;

use super::types::{CastleSide, Color, Move, Piece, PieceType, Square};

const BACK_RANK: [PieceType; 8] = [
    PieceType::Rook,
    PieceType::Knight,
    PieceType::Bishop,
    PieceType::Queen,
    PieceType::King,
    PieceType::Bishop,
    PieceType::Knight,
    PieceType::Rook,
];

/// 8x8 grid indexed `[rank][file]`. `Board` is `Copy`: every mutation
/// produces a new value and leaves the original untouched.
///
/// Serializes as eight rank-major rows of optional `{type, color}` records,
/// rank 1 first.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Board([[Option<Piece>; 8]; 8]);

impl Default for Board {
    fn default() -> Self {
        Board::initial()
    }
}

impl Board {
    pub fn empty() -> Self {
        Board([[None; 8]; 8])
    }

    /// The standard starting position.
    pub fn initial() -> Self {
        let mut board = Board::empty();
        for (file, kind) in BACK_RANK.iter().enumerate() {
            board.0[0][file] = Some(Piece::new(*kind, Color::White));
            board.0[1][file] = Some(Piece::new(PieceType::Pawn, Color::White));
            board.0[6][file] = Some(Piece::new(PieceType::Pawn, Color::Black));
            board.0[7][file] = Some(Piece::new(*kind, Color::Black));
        }
        board
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.0[square.rank as usize][square.file as usize]
    }

    /// Returns a copy of this board with `square` set to `piece`.
    pub fn with_piece(mut self, square: Square, piece: Option<Piece>) -> Self {
        self.set(square, piece);
        self
    }

    fn set(&mut self, square: Square, piece: Option<Piece>) {
        self.0[square.rank as usize][square.file as usize] = piece;
    }

    /// Every occupied square with the piece on it.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(move |sq| self.piece_at(sq).map(|p| (sq, p)))
    }

    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.pieces()
            .find(|(_, p)| p.is(PieceType::King, color))
            .map(|(sq, _)| sq)
    }

    /// Applies a move that has already been checked for legality and returns
    /// the resulting board. Handles en-passant removal, the rook half of
    /// castling, and promotion (queen when `move.promotion` is absent).
    /// A move from an empty square returns an unchanged copy.
    pub fn apply_move(&self, mv: &Move) -> Board {
        let mut next = *self;
        let Some(piece) = next.piece_at(mv.from) else {
            return next;
        };
        next.set(mv.from, None);

        if piece.kind == PieceType::Pawn
            && mv.from.file != mv.to.file
            && next.piece_at(mv.to).is_none()
        {
            // en passant: the captured pawn sits beside the mover, not on `to`
            next.set(
                Square {
                    file: mv.to.file,
                    rank: mv.from.rank,
                },
                None,
            );
        }

        if piece.kind == PieceType::King {
            let side = match mv.to.file as i8 - mv.from.file as i8 {
                2 => Some(CastleSide::Kingside),
                -2 => Some(CastleSide::Queenside),
                _ => None,
            };
            if let Some(side) = side {
                let rank = mv.from.rank;
                let corner = Square {
                    file: side.rook_file(),
                    rank,
                };
                let rook = next.piece_at(corner);
                next.set(corner, None);
                next.set(
                    Square {
                        file: side.rook_target_file(),
                        rank,
                    },
                    rook,
                );
            }
        }

        let landed = if piece.kind == PieceType::Pawn && (mv.to.rank == 0 || mv.to.rank == 7) {
            Piece::new(mv.promotion.unwrap_or(PieceType::Queen), piece.color)
        } else {
            piece
        };
        next.set(mv.to, Some(landed));
        next
    }
}
