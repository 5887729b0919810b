use crate::piece::Color;
use crate::square::Square;
use std::fmt;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Not};

/// A 64-bit mask with one bit per board square, little-endian
/// rank-file ordering (bit 0 = a1, bit 63 = h8).
#[repr(transparent)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Bitboard(pub u64);

impl Bitboard {
    pub const EMPTY: Bitboard = Bitboard(0);
    pub const UNIVERSE: Bitboard = Bitboard(!0);

    pub const FILES: [Bitboard; 8] = [
        Bitboard(0x0101010101010101),
        Bitboard(0x0202020202020202),
        Bitboard(0x0404040404040404),
        Bitboard(0x0808080808080808),
        Bitboard(0x1010101010101010),
        Bitboard(0x2020202020202020),
        Bitboard(0x4040404040404040),
        Bitboard(0x8080808080808080),
    ];
    pub const RANKS: [Bitboard; 8] = [
        Bitboard(0x00000000000000ff),
        Bitboard(0x000000000000ff00),
        Bitboard(0x0000000000ff0000),
        Bitboard(0x00000000ff000000),
        Bitboard(0x000000ff00000000),
        Bitboard(0x0000ff0000000000),
        Bitboard(0x00ff000000000000),
        Bitboard(0xff00000000000000),
    ];

    // Squares that must be empty between king and rook, indexed by
    // [color][kingside = 0 / queenside = 1].
    pub const CASTLING_OCCUPANCY_MASKS: [[Bitboard; 2]; 2] = [
        [Bitboard(0x6000000000000000), Bitboard(0xe00000000000000)],
        [Bitboard(0x60), Bitboard(0xe)],
    ];
    // Squares the king crosses or lands on, which may not be attacked.
    pub const CASTLING_ATTACKED_MASKS: [[Bitboard; 2]; 2] = [
        [Bitboard(0x6000000000000000), Bitboard(0xc00000000000000)],
        [Bitboard(0x60), Bitboard(0xc)],
    ];

    #[inline]
    pub fn from_square(square: Square) -> Bitboard {
        Bitboard(1u64 << square)
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
    #[inline(always)]
    pub fn is_set(&self, sq: Square) -> bool {
        self.0 & (1 << sq) != 0
    }
    #[inline(always)]
    pub fn set(&mut self, sq: Square) {
        self.0 |= 1 << sq
    }
    #[inline(always)]
    pub fn unset(&mut self, sq: Square) {
        self.0 &= !(1 << sq)
    }

    #[inline(always)]
    pub fn ls1b(&self) -> Option<Square> {
        if self.is_empty() {
            None
        } else {
            Some(self.0.trailing_zeros() as Square)
        }
    }

    #[inline(always)]
    pub fn reset_ls1b(&mut self) {
        self.0 &= self.0.wrapping_sub(1)
    }

    #[inline(always)]
    pub fn pop_ls1b(&mut self) -> Option<Square> {
        let ls1b = self.ls1b();
        self.reset_ls1b();
        ls1b
    }

    #[inline(always)]
    pub fn pop_count(&self) -> u32 {
        self.0.count_ones()
    }

    /*
    ONE-SQUARE SHIFTS
    */
    #[inline]
    pub fn north_shift(bb: Bitboard) -> Bitboard {
        Bitboard(bb.0 << 8)
    }
    #[inline]
    pub fn south_shift(bb: Bitboard) -> Bitboard {
        Bitboard(bb.0 >> 8)
    }
    #[inline]
    pub fn east_shift(bb: Bitboard) -> Bitboard {
        Bitboard(bb.0 << 1) & !Self::FILES[0]
    }
    #[inline]
    pub fn west_shift(bb: Bitboard) -> Bitboard {
        Bitboard(bb.0 >> 1) & !Self::FILES[7]
    }
    #[inline]
    pub fn north_east_shift(bb: Bitboard) -> Bitboard {
        Bitboard(bb.0 << 9) & !Self::FILES[0]
    }
    #[inline]
    pub fn north_west_shift(bb: Bitboard) -> Bitboard {
        Bitboard(bb.0 << 7) & !Self::FILES[7]
    }
    #[inline]
    pub fn south_east_shift(bb: Bitboard) -> Bitboard {
        Bitboard(bb.0 >> 7) & !Self::FILES[0]
    }
    #[inline]
    pub fn south_west_shift(bb: Bitboard) -> Bitboard {
        Bitboard(bb.0 >> 9) & !Self::FILES[7]
    }

    /*
    SETWISE PAWN FORMULAS
    */
    #[inline]
    pub fn pawn_pushes(pawns: Bitboard, empty: Bitboard, color: Color) -> Bitboard {
        let shift = match color {
            Color::White => Self::north_shift(pawns),
            Color::Black => Self::south_shift(pawns),
        };
        shift & empty
    }

    #[inline]
    pub fn pawn_double_pushes(pawns: Bitboard, empty: Bitboard, color: Color) -> Bitboard {
        let single = Self::pawn_pushes(pawns, empty, color);
        let shift = match color {
            Color::White => Self::north_shift(single & Self::RANKS[2]),
            Color::Black => Self::south_shift(single & Self::RANKS[5]),
        };
        shift & empty
    }

    // East and west are relative to the mover, so an east attack is
    // always origin + 9 for white and origin - 9 for black.
    #[inline]
    pub fn pawn_east_attacks(pawns: Bitboard, color: Color) -> Bitboard {
        match color {
            Color::White => Self::north_east_shift(pawns),
            Color::Black => Self::south_west_shift(pawns),
        }
    }
    #[inline]
    pub fn pawn_west_attacks(pawns: Bitboard, color: Color) -> Bitboard {
        match color {
            Color::White => Self::north_west_shift(pawns),
            Color::Black => Self::south_east_shift(pawns),
        }
    }
    #[inline]
    pub fn pawn_attacks(pawns: Bitboard, color: Color) -> Bitboard {
        Self::pawn_east_attacks(pawns, color) | Self::pawn_west_attacks(pawns, color)
    }
}

impl fmt::Display for Bitboard {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut s = String::new();
        for rank in (0..8).rev() {
            for file in 0..8 {
                s.push_str(if self.is_set(rank * 8 + file) { "x " } else { ". " });
            }
            s.push('\n');
        }
        write!(f, "{}", s)
    }
}

/// Iterating a bitboard yields its set squares, lowest first.
impl Iterator for Bitboard {
    type Item = Square;

    fn next(&mut self) -> Option<Self::Item> {
        self.pop_ls1b()
    }
}

impl BitAnd for Bitboard {
    type Output = Bitboard;
    fn bitand(self, rhs: Self) -> Self::Output {
        Bitboard(self.0 & rhs.0)
    }
}
impl BitAndAssign for Bitboard {
    fn bitand_assign(&mut self, rhs: Self) {
        self.0 &= rhs.0
    }
}
impl BitOr for Bitboard {
    type Output = Bitboard;
    fn bitor(self, rhs: Self) -> Self::Output {
        Bitboard(self.0 | rhs.0)
    }
}
impl BitOrAssign for Bitboard {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0
    }
}
impl BitXor for Bitboard {
    type Output = Bitboard;
    fn bitxor(self, rhs: Self) -> Self::Output {
        Bitboard(self.0 ^ rhs.0)
    }
}
impl BitXorAssign for Bitboard {
    fn bitxor_assign(&mut self, rhs: Self) {
        self.0 ^= rhs.0
    }
}
impl Not for Bitboard {
    type Output = Bitboard;
    fn not(self) -> Self::Output {
        Bitboard(!self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_pop() {
        let mut bb = Bitboard::EMPTY;
        bb.set(0);
        bb.set(28);
        bb.set(63);
        assert_eq!(bb.pop_count(), 3);
        assert_eq!(bb.pop_ls1b(), Some(0));
        assert_eq!(bb.pop_ls1b(), Some(28));
        assert_eq!(bb.pop_ls1b(), Some(63));
        assert_eq!(bb.pop_ls1b(), None);
    }

    #[test]
    fn shifts_respect_board_edges() {
        let h4 = Bitboard::from_square(31);
        assert_eq!(Bitboard::east_shift(h4), Bitboard::EMPTY);
        assert_eq!(Bitboard::north_east_shift(h4), Bitboard::EMPTY);
        let a4 = Bitboard::from_square(24);
        assert_eq!(Bitboard::west_shift(a4), Bitboard::EMPTY);
        assert_eq!(Bitboard::south_west_shift(a4), Bitboard::EMPTY);
        assert_eq!(Bitboard::north_shift(a4), Bitboard::from_square(32));
    }

    #[test]
    fn pawn_formulas() {
        // White pawn on e2 with an empty board ahead
        let pawns = Bitboard::from_square(12);
        let empty = !pawns;
        assert_eq!(
            Bitboard::pawn_pushes(pawns, empty, Color::White),
            Bitboard::from_square(20)
        );
        assert_eq!(
            Bitboard::pawn_double_pushes(pawns, empty, Color::White),
            Bitboard::from_square(28)
        );
        assert_eq!(
            Bitboard::pawn_attacks(pawns, Color::White),
            Bitboard::from_square(19) | Bitboard::from_square(21)
        );
        // Blocked double push
        let blocked = empty & !Bitboard::from_square(20);
        assert!(Bitboard::pawn_double_pushes(pawns, blocked, Color::White).is_empty());
    }
}
