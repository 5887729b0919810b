use crate::attacks;
use crate::bitboard::Bitboard;
use crate::castling::CastlingRights;
use crate::errors::{FenError, MoveError};
use crate::history::HistoryEntry;
use crate::move_generator::generate;
use crate::moves::{Move, MoveKind};
use crate::piece::Color::{Black, White};
use crate::piece::{Color, Piece, PieceType};
use crate::square::{file_of, parse_square, square_representation, Square};
use arrayvec::ArrayVec;
use std::fmt::{Display, Formatter};

pub const START_POSITION_FEN: &str =
    "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

// Bitboards are indexed by color and piece type, with a redundant
// color aggregate at index 6.

/// A full position with incremental make/unmake and derived caches.
///
/// After every state change the board knows which enemy pieces give
/// check, which squares the enemy attacks, and which pieces shield
/// the king from a slider. The legality filter reads these caches
/// instead of re-scanning the position per candidate move.
#[derive(Clone, PartialEq)]
pub struct Board {
    bitboards: [[Bitboard; 7]; 2],
    pieces: [Option<Piece>; 64],
    side_to_move: Color,
    castling_rights: CastlingRights,
    ep_target: Option<Square>,
    halfmove_clock: u32,
    fullmove_number: u32,

    // Derived caches, valid for the side to move
    checkers: ArrayVec<(Piece, Square), 32>,
    attack_map: Bitboard,
    blockers: Bitboard,
    prev_blockers: Bitboard,

    history_entries: Vec<HistoryEntry>,
}

impl Default for Board {
    fn default() -> Board {
        Board::from_start_position()
    }
}

impl Board {
    /// Builds a board from its FEN representation. The halfmove clock
    /// and fullmove number may be omitted, the other fields may not.
    pub fn new(fen: &str) -> Result<Board, FenError> {
        let mut b = Board {
            bitboards: [[Bitboard::EMPTY; 7]; 2],
            pieces: [None; 64],
            side_to_move: White,
            castling_rights: CastlingRights::none(),
            ep_target: None,
            halfmove_clock: 0,
            fullmove_number: 1,

            checkers: ArrayVec::new(),
            attack_map: Bitboard::EMPTY,
            blockers: Bitboard::EMPTY,
            prev_blockers: Bitboard::EMPTY,

            history_entries: Vec::with_capacity(64),
        };
        b.set_fen(fen)?;
        Ok(b)
    }

    pub fn from_start_position() -> Board {
        // The start position FEN is well formed
        Board::new(START_POSITION_FEN).unwrap_or_else(|_| unreachable!())
    }

    /// Makes a move on the board.
    /// The move is expected to come from the generator for this exact
    /// position, anything else will corrupt the state.
    pub fn make(&mut self, mv: Move) {
        let captured_piece = self.remove_piece(mv.to);
        let history_entry = HistoryEntry {
            move_played: mv,
            captured_piece,
            castling_rights: self.castling_rights,
            ep_target: self.ep_target,
            halfmove_clock: self.halfmove_clock,
            fullmove_number: self.fullmove_number,
            checkers: self.checkers.clone(),
            attack_map: self.attack_map,
            blockers: self.blockers,
            prev_blockers: self.prev_blockers,
        };

        if mv.piece.piece_type == PieceType::King {
            self.castling_rights.uncastle(self.side_to_move);
        }
        // Independent checks, one capture can touch two corners
        if mv.from == 7 || mv.to == 7 {
            self.castling_rights.uncastle_kingside(White);
        }
        if mv.from == 0 || mv.to == 0 {
            self.castling_rights.uncastle_queenside(White);
        }
        if mv.from == 63 || mv.to == 63 {
            self.castling_rights.uncastle_kingside(Black);
        }
        if mv.from == 56 || mv.to == 56 {
            self.castling_rights.uncastle_queenside(Black);
        }

        self.ep_target = None;
        if mv.piece.piece_type == PieceType::Pawn && mv.to.abs_diff(mv.from) == 16 {
            self.ep_target = Some((mv.from + mv.to) / 2);
        }

        self.remove_piece(mv.from);
        self.add_piece(mv.piece, mv.to);

        match mv.kind {
            MoveKind::Promotion => {
                if let Some(target) = mv.promotion {
                    self.remove_piece(mv.to);
                    self.add_piece(Piece::new(target, self.side_to_move), mv.to);
                }
            }
            MoveKind::EnPassant => {
                self.remove_piece(match self.side_to_move {
                    White => mv.to - 8,
                    Black => mv.to + 8,
                });
            }
            MoveKind::Castling => {
                let (rook_from, rook_to) = match (self.side_to_move, file_of(mv.to)) {
                    (White, 6) => (7, 5),
                    (White, _) => (0, 3),
                    (Black, 6) => (63, 61),
                    (Black, _) => (56, 59),
                };
                if let Some(rook) = self.remove_piece(rook_from) {
                    self.add_piece(rook, rook_to);
                }
            }
            MoveKind::Normal => (),
        }

        if mv.piece.piece_type == PieceType::Pawn || captured_piece.is_some() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }
        if self.side_to_move == Black {
            self.fullmove_number += 1;
        }
        self.side_to_move = self.side_to_move.opposite();

        self.history_entries.push(history_entry);
        self.recompute_caches();
    }

    /// Unmakes the move on top of the history stack, restoring the
    /// position and its caches bit for bit.
    pub fn unmake(&mut self) {
        let entry = if let Some(h) = self.history_entries.pop() {
            h
        } else {
            return;
        };
        let mv = entry.move_played;

        self.side_to_move = self.side_to_move.opposite();
        self.castling_rights = entry.castling_rights;
        self.ep_target = entry.ep_target;
        self.halfmove_clock = entry.halfmove_clock;
        self.fullmove_number = entry.fullmove_number;

        // Putting the moved piece back from the Move itself undoes a
        // promotion for free, mv.piece is still the pawn
        self.remove_piece(mv.to);
        self.add_piece(mv.piece, mv.from);
        if let Some(captured) = entry.captured_piece {
            self.add_piece(captured, mv.to);
        }

        match mv.kind {
            MoveKind::EnPassant => {
                self.add_piece(
                    Piece::new(PieceType::Pawn, self.side_to_move.opposite()),
                    match self.side_to_move {
                        White => mv.to - 8,
                        Black => mv.to + 8,
                    },
                );
            }
            MoveKind::Castling => {
                let (rook_from, rook_to) = match (self.side_to_move, file_of(mv.to)) {
                    (White, 6) => (7, 5),
                    (White, _) => (0, 3),
                    (Black, 6) => (63, 61),
                    (Black, _) => (56, 59),
                };
                if let Some(rook) = self.remove_piece(rook_to) {
                    self.add_piece(rook, rook_from);
                }
            }
            _ => (),
        }

        self.checkers = entry.checkers;
        self.attack_map = entry.attack_map;
        self.blockers = entry.blockers;
        self.prev_blockers = entry.prev_blockers;
    }

    /// Given a string in coordinate notation, makes the move if it is
    /// legal in the current position.
    pub fn make_from_str(&mut self, move_str: &str) -> Result<(), MoveError> {
        let (from, to, promotion) = Move::parse(move_str)
            .ok_or_else(|| MoveError::Malformed(move_str.to_owned()))?;

        let legal_moves = generate(self);
        if let Some(mv) = legal_moves
            .iter()
            .find(|m| m.from == from && m.to == to && m.promotion == promotion)
            .copied()
        {
            self.make(mv);
            Ok(())
        } else {
            Err(MoveError::Illegal(move_str.to_owned()))
        }
    }

    /// Places a new piece on a given square
    fn add_piece(&mut self, piece: Piece, sq: Square) {
        self.pieces[sq] = Some(piece);
        self.bitboards[piece.color as usize][piece.piece_type as usize].set(sq);
        self.bitboards[piece.color as usize][6].set(sq);
    }

    /// Clears the given square, returning the removed piece if any
    fn remove_piece(&mut self, sq: Square) -> Option<Piece> {
        let removed = self.pieces[sq];
        if let Some(p) = removed {
            self.pieces[sq] = None;
            self.bitboards[p.color as usize][p.piece_type as usize].unset(sq);
            self.bitboards[p.color as usize][6].unset(sq);
        }
        removed
    }

    /*
    DERIVED CACHES
     */

    /// Rebuilds the check, attack and pin information for the side to
    /// move. Called once per make, never per candidate move.
    fn recompute_caches(&mut self) {
        self.checkers.clear();
        self.attack_map = Bitboard::EMPTY;
        self.blockers = Bitboard::EMPTY;
        self.prev_blockers = Bitboard::EMPTY;

        let us = self.side_to_move;
        let them = us.opposite();
        let king_sq = if let Some(sq) = self.king_square(us) {
            sq
        } else {
            return;
        };
        let occupancy = self.get_occupancy_bitboard();
        // Removing our king lets slider rays extend through it, so a
        // checked king cannot step backwards along the checking ray
        let seen_through_king =
            occupancy & !self.bitboards[us as usize][PieceType::King as usize];

        let their_pawns = self.bitboards[them as usize][PieceType::Pawn as usize];
        self.attack_map |= Bitboard::pawn_attacks(their_pawns, them);
        for sq in Bitboard::pawn_attacks(Bitboard::from_square(king_sq), us) & their_pawns {
            self.checkers.push((Piece::new(PieceType::Pawn, them), sq));
        }

        for sq in self.bitboards[them as usize][PieceType::Knight as usize] {
            let attacks = attacks::knight(sq);
            self.attack_map |= attacks;
            if attacks.is_set(king_sq) {
                self.checkers.push((Piece::new(PieceType::Knight, them), sq));
            }
        }

        for sq in self.bitboards[them as usize][PieceType::King as usize] {
            self.attack_map |= attacks::king(sq);
        }

        for sq in self.get_diagonal_sliders_bitboard(them) {
            let attacks = attacks::bishop(sq, seen_through_king);
            self.attack_map |= attacks;
            if attacks.is_set(king_sq) {
                if let Some(piece) = self.pieces[sq] {
                    self.checkers.push((piece, sq));
                }
            }
        }
        for sq in self.get_cardinal_sliders_bitboard(them) {
            let attacks = attacks::rook(sq, seen_through_king);
            self.attack_map |= attacks;
            if attacks.is_set(king_sq) {
                if let Some(piece) = self.pieces[sq] {
                    self.checkers.push((piece, sq));
                }
            }
        }

        self.blockers = self.compute_blockers(king_sq, occupancy);
        if let Some(ep) = self.ep_target {
            // Pins as they would look after the en passant victim is
            // gone, for the rank-discovered-check corner case
            let victim = match us {
                White => ep - 8,
                Black => ep + 8,
            };
            self.prev_blockers =
                self.compute_blockers(king_sq, occupancy & !Bitboard::from_square(victim));
        }
    }

    /// For each enemy slider aligned with the king, the single piece
    /// (of either color) standing between them, if there is exactly
    /// one.
    fn compute_blockers(&self, king_sq: Square, occupancy: Bitboard) -> Bitboard {
        let them = self.side_to_move.opposite();
        let mut blockers = Bitboard::EMPTY;
        for sq in self.get_diagonal_sliders_bitboard(them) {
            if attacks::bishop(sq, Bitboard::EMPTY).is_set(king_sq) {
                let shield = attacks::between(sq, king_sq) & occupancy;
                if shield.pop_count() == 1 {
                    blockers |= shield;
                }
            }
        }
        for sq in self.get_cardinal_sliders_bitboard(them) {
            if attacks::rook(sq, Bitboard::EMPTY).is_set(king_sq) {
                let shield = attacks::between(sq, king_sq) & occupancy;
                if shield.pop_count() == 1 {
                    blockers |= shield;
                }
            }
        }
        blockers
    }

    /*
    LEGALITY
     */

    /// Decides whether a pseudo-legal move is legal, using only the
    /// cached check, attack and pin information.
    pub fn is_legal(&self, mv: &Move) -> bool {
        let king_sq = if let Some(sq) = self.king_square(self.side_to_move) {
            sq
        } else {
            return true;
        };

        if mv.piece.piece_type == PieceType::King {
            // Castling paths were already vetted at generation
            return !self.attack_map.is_set(mv.to);
        }

        let capture_sq = if mv.kind == MoveKind::EnPassant {
            match self.side_to_move {
                White => mv.to - 8,
                Black => mv.to + 8,
            }
        } else {
            mv.to
        };

        match self.checkers.len() {
            0 => self.pin_allows(mv, king_sq, capture_sq),
            1 => {
                let (checker, checker_sq) = self.checkers[0];
                let resolves = capture_sq == checker_sq
                    || (checker.piece_type.can_slide()
                        && attacks::between(king_sq, checker_sq).is_set(mv.to));
                resolves && self.pin_allows(mv, king_sq, capture_sq)
            }
            // Double check, only the king may move
            _ => false,
        }
    }

    fn pin_allows(&self, mv: &Move, king_sq: Square, capture_sq: Square) -> bool {
        if self.blockers.is_set(mv.from) && !attacks::line(king_sq, mv.from).is_set(mv.to) {
            return false;
        }
        if mv.kind == MoveKind::EnPassant {
            // The victim may itself be shielding our king
            if self.blockers.is_set(capture_sq)
                && !attacks::line(king_sq, capture_sq).is_set(mv.to)
            {
                return false;
            }
            // Both pawns leaving the same rank can uncover a rook
            if self.prev_blockers.is_set(mv.from)
                && !attacks::line(king_sq, mv.from).is_set(mv.to)
            {
                return false;
            }
        }
        true
    }

    /*
    GETTERS
     */
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    pub fn en_passant_target(&self) -> Option<Square> {
        self.ep_target
    }

    pub fn side_to_move_castling_rights(&self) -> (bool, bool) {
        self.castling_rights.get(self.side_to_move)
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    pub fn get_piece_bitboard(&self, piece_type: PieceType, color: Color) -> Bitboard {
        self.bitboards[color as usize][piece_type as usize]
    }

    pub fn get_color_bitboard(&self, color: Color) -> Bitboard {
        self.bitboards[color as usize][6]
    }

    pub fn get_occupancy_bitboard(&self) -> Bitboard {
        self.bitboards[0][6] | self.bitboards[1][6]
    }

    pub fn get_diagonal_sliders_bitboard(&self, color: Color) -> Bitboard {
        self.bitboards[color as usize][2] | self.bitboards[color as usize][4]
    }
    pub fn get_cardinal_sliders_bitboard(&self, color: Color) -> Bitboard {
        self.bitboards[color as usize][3] | self.bitboards[color as usize][4]
    }

    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.bitboards[color as usize][PieceType::King as usize].ls1b()
    }

    pub fn piece_on(&self, sq: Square) -> Option<Piece> {
        self.pieces[sq]
    }

    pub fn checkers(&self) -> &[(Piece, Square)] {
        &self.checkers
    }

    pub fn attack_map(&self) -> Bitboard {
        self.attack_map
    }

    pub fn blockers(&self) -> Bitboard {
        self.blockers
    }

    pub fn in_check(&self) -> bool {
        !self.checkers.is_empty()
    }

    /// A simple iterator over material, each item being a piece type
    /// and its associated bitboard
    pub fn material_iter(&self, color: Color) -> impl Iterator<Item = (PieceType, &Bitboard)> {
        self.bitboards[color as usize][0..6]
            .iter()
            .enumerate()
            .filter_map(|(i, bb)| PieceType::from_determinant(i).map(|pt| (pt, bb)))
    }

    /*
    FEN STRING OPERATIONS
     */
    fn set_fen(&mut self, fen: &str) -> Result<(), FenError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() < 4 {
            return Err(FenError::MissingFields(fields.len()));
        }

        let ranks: Vec<&str> = fields[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(FenError::WrongSquareCount);
        }
        for (i, rank) in ranks.iter().enumerate() {
            let mut file = 0;
            for c in rank.chars() {
                if let Some(d) = c.to_digit(10) {
                    if !(1..=8).contains(&d) {
                        return Err(FenError::InvalidPlacement(rank.to_string()));
                    }
                    file += d as usize;
                } else if let Some(piece) = Piece::from_char(c) {
                    if file >= 8 {
                        return Err(FenError::WrongSquareCount);
                    }
                    self.add_piece(piece, (7 - i) * 8 + file);
                    file += 1;
                } else {
                    return Err(FenError::InvalidPlacement(rank.to_string()));
                }
            }
            if file != 8 {
                return Err(FenError::WrongSquareCount);
            }
        }

        self.side_to_move = match fields[1] {
            "w" => White,
            "b" => Black,
            other => return Err(FenError::InvalidSideToMove(other.to_owned())),
        };
        self.castling_rights = CastlingRights::from_str(fields[2]);
        self.ep_target = match fields[3] {
            "-" => None,
            s => Some(parse_square(s).ok_or_else(|| FenError::InvalidEnPassant(s.to_owned()))?),
        };
        self.halfmove_clock = match fields.get(4) {
            Some(s) => s
                .parse::<u32>()
                .map_err(|_| FenError::InvalidClock(s.to_string()))?,
            None => 0,
        };
        self.fullmove_number = match fields.get(5) {
            Some(s) => s
                .parse::<u32>()
                .map_err(|_| FenError::InvalidClock(s.to_string()))?,
            None => 1,
        };

        self.recompute_caches();
        Ok(())
    }

    pub fn get_fen(&self) -> String {
        let mut fen = String::new();

        let mut current_square = 56;
        let mut empty_counter = 0;
        loop {
            match self.pieces[current_square] {
                Some(p) => {
                    if empty_counter != 0 {
                        fen.push_str(&empty_counter.to_string())
                    }
                    empty_counter = 0;
                    fen.push_str(&p.to_string())
                }
                None => empty_counter += 1,
            }

            current_square += 1;
            if current_square == 8 {
                if empty_counter != 0 {
                    fen.push_str(&empty_counter.to_string())
                }
                break;
            }
            if current_square % 8 == 0 {
                if empty_counter != 0 {
                    fen.push_str(&empty_counter.to_string())
                }
                empty_counter = 0;
                fen.push('/');
                current_square -= 16;
            }
        }

        fen.push_str(if self.side_to_move == White { " w " } else { " b " });
        fen.push_str(&self.castling_rights.to_string());
        match self.ep_target.and_then(square_representation) {
            Some(sq) => fen.push_str(&(" ".to_owned() + &sq + " ")),
            None => fen.push_str(" - "),
        }
        fen.push_str(&(self.halfmove_clock.to_string() + " "));
        fen.push_str(&self.fullmove_number.to_string());
        fen
    }
}

impl Display for Board {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for rank in (0..8).rev() {
            for file in 0..8 {
                match self.pieces[rank * 8 + file] {
                    None => write!(f, ". ")?,
                    Some(p) => write!(f, "{} ", p)?,
                }
            }
            writeln!(f)?;
        }
        write!(f, "fen: {}", self.get_fen())
    }
}
