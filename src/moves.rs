use crate::piece::{Piece, PieceType};
use crate::square::{parse_square, square_representation, Square};
use std::fmt;

/// What a move does beyond shifting a piece, so make and unmake can
/// apply the right side effects without re-deriving them.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MoveKind {
    Normal,
    Promotion,
    EnPassant,
    Castling,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Move {
    pub piece: Piece,
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceType>,
    pub kind: MoveKind,
}

impl Move {
    pub fn new(piece: Piece, from: Square, to: Square) -> Move {
        Move {
            piece,
            from,
            to,
            promotion: None,
            kind: MoveKind::Normal,
        }
    }

    pub fn promotion(piece: Piece, from: Square, to: Square, target: PieceType) -> Move {
        Move {
            piece,
            from,
            to,
            promotion: Some(target),
            kind: MoveKind::Promotion,
        }
    }

    pub fn en_passant(piece: Piece, from: Square, to: Square) -> Move {
        Move {
            piece,
            from,
            to,
            promotion: None,
            kind: MoveKind::EnPassant,
        }
    }

    pub fn castling(piece: Piece, from: Square, to: Square) -> Move {
        Move {
            piece,
            from,
            to,
            promotion: None,
            kind: MoveKind::Castling,
        }
    }

    /// Parses pure coordinate notation ("e2e4", "e7e8q") into its
    /// components. The move is not checked against any position, so
    /// only the origin, target and promotion target come out.
    pub fn parse(s: &str) -> Option<(Square, Square, Option<PieceType>)> {
        if !s.is_ascii() || !(4..=5).contains(&s.len()) {
            return None;
        }
        let from = parse_square(&s[0..2])?;
        let to = parse_square(&s[2..4])?;
        let promotion = match s.as_bytes().get(4) {
            None => None,
            Some(b'q') => Some(PieceType::Queen),
            Some(b'r') => Some(PieceType::Rook),
            Some(b'b') => Some(PieceType::Bishop),
            Some(b'n') => Some(PieceType::Knight),
            Some(_) => return None,
        };
        Some((from, to, promotion))
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}{}",
            square_representation(self.from).unwrap_or_default(),
            square_representation(self.to).unwrap_or_default()
        )?;
        if let Some(target) = self.promotion {
            write!(f, "{}", target)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece::Color;

    #[test]
    fn parse_coordinate_notation() {
        assert_eq!(Move::parse("e2e4"), Some((12, 28, None)));
        assert_eq!(Move::parse("e7e8q"), Some((52, 60, Some(PieceType::Queen))));
        assert_eq!(Move::parse("a7a8n"), Some((48, 56, Some(PieceType::Knight))));
        assert_eq!(Move::parse("e2e4x"), None);
        assert_eq!(Move::parse("e2"), None);
        assert_eq!(Move::parse("i2i4"), None);
        assert_eq!(Move::parse("e9e4"), None);
    }

    #[test]
    fn display_round_trips() {
        let pawn = Piece::new(PieceType::Pawn, Color::White);
        assert_eq!(Move::new(pawn, 12, 28).to_string(), "e2e4");
        assert_eq!(
            Move::promotion(pawn, 52, 60, PieceType::Queen).to_string(),
            "e7e8q"
        );
    }
}
