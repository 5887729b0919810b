use crate::bitboard::Bitboard;
use crate::castling::CastlingRights;
use crate::moves::Move;
use crate::piece::Piece;
use crate::square::Square;
use arrayvec::ArrayVec;

/// Everything make() destroys and unmake() must restore, including
/// the derived caches so a position round-trips bitwise identical.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub move_played: Move,
    pub captured_piece: Option<Piece>,
    pub castling_rights: CastlingRights,
    pub ep_target: Option<Square>,
    pub halfmove_clock: u32,
    pub fullmove_number: u32,
    pub checkers: ArrayVec<(Piece, Square), 32>,
    pub attack_map: Bitboard,
    pub blockers: Bitboard,
    pub prev_blockers: Bitboard,
}
