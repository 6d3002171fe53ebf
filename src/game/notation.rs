//! Square notation ("e2") and promotion tokens as used on the wire.

use std::fmt;

use serde::{Serialize, Serializer};

use super::types::{PieceType, Square};

const FILES: &[u8; 8] = b"abcdefgh";
const RANKS: &[u8; 8] = b"12345678";

/// Parses two-character square notation. Anything else is `None`.
pub fn parse_square(s: &str) -> Option<Square> {
    let &[file, rank] = s.as_bytes() else {
        return None;
    };
    let file = FILES.iter().position(|&c| c == file)?;
    let rank = RANKS.iter().position(|&c| c == rank)?;
    Square::new(file as u8, rank as u8)
}

/// Maps a promotion token to a piece type. Unknown tokens, and pieces a pawn
/// cannot become, are treated as "no preference".
pub fn parse_promotion(token: Option<&str>) -> Option<PieceType> {
    let kind = match token?.trim().to_ascii_lowercase().as_str() {
        "queen" | "q" => PieceType::Queen,
        "rook" | "r" => PieceType::Rook,
        "bishop" | "b" => PieceType::Bishop,
        "knight" | "n" => PieceType::Knight,
        _ => return None,
    };
    Some(kind)
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}",
            FILES[self.file as usize] as char,
            RANKS[self.rank as usize] as char
        )
    }
}

impl fmt::Display for PieceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Square {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
