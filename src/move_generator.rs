//! Legal move generation.
//!
//! Moves are produced pseudo-legally with setwise pawn formulas and
//! table lookups, and each candidate is run through the board's
//! cached legality filter as it is produced. Castling is the
//! exception, its path checks happen here since the filter cannot see
//! intermediate squares.

use crate::attacks;
use crate::bitboard::Bitboard;
use crate::board::Board;
use crate::movelist::MoveList;
use crate::moves::Move;
use crate::piece::{Color, Piece, PieceType};

/// Generates all legal moves for the side to move.
pub fn generate(board: &Board) -> MoveList {
    let mut moves = MoveList::default();

    pawn_moves(board, &mut moves);
    knight_moves(board, &mut moves);
    slider_moves(board, &mut moves);
    king_moves(board, &mut moves);
    en_passant(board, &mut moves);
    if !board.in_check() {
        castling(board, &mut moves);
    }

    moves
}

// Filtering at push time keeps the list bounded by the legal move
// count, a pseudo-legal candidate set has no such bound
fn push_if_legal(board: &Board, moves: &mut MoveList, mv: Move) {
    if board.is_legal(&mv) {
        moves.push(mv);
    }
}

fn pawn_moves(board: &Board, moves: &mut MoveList) {
    let side = board.side_to_move();
    let (m, pre_promo_rank) = match side {
        Color::White => (1isize, Bitboard::RANKS[6]),
        Color::Black => (-1isize, Bitboard::RANKS[1]),
    };
    let pawn = Piece::new(PieceType::Pawn, side);
    let empty = !board.get_occupancy_bitboard();
    let enemies = board.get_color_bitboard(side.opposite());

    let pawns = board.get_piece_bitboard(PieceType::Pawn, side) & !pre_promo_rank;
    for target in Bitboard::pawn_pushes(pawns, empty, side) {
        push_if_legal(board, moves, Move::new(pawn, (target as isize - 8 * m) as usize, target));
    }
    for target in Bitboard::pawn_double_pushes(pawns, empty, side) {
        push_if_legal(board, moves, Move::new(pawn, (target as isize - 16 * m) as usize, target));
    }
    for target in Bitboard::pawn_west_attacks(pawns, side) & enemies {
        push_if_legal(board, moves, Move::new(pawn, (target as isize - 7 * m) as usize, target));
    }
    for target in Bitboard::pawn_east_attacks(pawns, side) & enemies {
        push_if_legal(board, moves, Move::new(pawn, (target as isize - 9 * m) as usize, target));
    }

    let promoting = board.get_piece_bitboard(PieceType::Pawn, side) & pre_promo_rank;
    if promoting.is_empty() {
        return;
    }
    for target in Bitboard::pawn_pushes(promoting, empty, side) {
        push_promotions(board, moves, pawn, (target as isize - 8 * m) as usize, target);
    }
    for target in Bitboard::pawn_west_attacks(promoting, side) & enemies {
        push_promotions(board, moves, pawn, (target as isize - 7 * m) as usize, target);
    }
    for target in Bitboard::pawn_east_attacks(promoting, side) & enemies {
        push_promotions(board, moves, pawn, (target as isize - 9 * m) as usize, target);
    }
}

fn push_promotions(board: &Board, moves: &mut MoveList, pawn: Piece, from: usize, to: usize) {
    for target in PieceType::PROMOTION_TARGETS {
        push_if_legal(board, moves, Move::promotion(pawn, from, to, target));
    }
}

fn knight_moves(board: &Board, moves: &mut MoveList) {
    let side = board.side_to_move();
    let knight = Piece::new(PieceType::Knight, side);
    let own = board.get_color_bitboard(side);
    for origin in board.get_piece_bitboard(PieceType::Knight, side) {
        for target in attacks::knight(origin) & !own {
            push_if_legal(board, moves, Move::new(knight, origin, target));
        }
    }
}

fn slider_moves(board: &Board, moves: &mut MoveList) {
    let side = board.side_to_move();
    let own = board.get_color_bitboard(side);
    let occupancy = board.get_occupancy_bitboard();

    for origin in board.get_diagonal_sliders_bitboard(side) {
        if let Some(piece) = board.piece_on(origin) {
            for target in attacks::bishop(origin, occupancy) & !own {
                push_if_legal(board, moves, Move::new(piece, origin, target));
            }
        }
    }
    for origin in board.get_cardinal_sliders_bitboard(side) {
        // Queens show up in both slider sets, their diagonal and
        // cardinal targets are disjoint so nothing is pushed twice
        if let Some(piece) = board.piece_on(origin) {
            for target in attacks::rook(origin, occupancy) & !own {
                push_if_legal(board, moves, Move::new(piece, origin, target));
            }
        }
    }
}

fn king_moves(board: &Board, moves: &mut MoveList) {
    let side = board.side_to_move();
    let king = Piece::new(PieceType::King, side);
    let own = board.get_color_bitboard(side);
    if let Some(origin) = board.king_square(side) {
        for target in attacks::king(origin) & !own {
            push_if_legal(board, moves, Move::new(king, origin, target));
        }
    }
}

fn en_passant(board: &Board, moves: &mut MoveList) {
    let side = board.side_to_move();
    if let Some(target) = board.en_passant_target() {
        let pawn = Piece::new(PieceType::Pawn, side);
        // Our pawns attacking the en passant square are exactly the
        // squares an enemy pawn on it would attack
        let origins = Bitboard::pawn_attacks(Bitboard::from_square(target), side.opposite())
            & board.get_piece_bitboard(PieceType::Pawn, side);
        for origin in origins {
            push_if_legal(board, moves, Move::en_passant(pawn, origin, target));
        }
    }
}

/// Castling is only tried when not in check. The squares between king
/// and rook must be empty and the king's path unattacked.
fn castling(board: &Board, moves: &mut MoveList) {
    let side = board.side_to_move();
    let king = Piece::new(PieceType::King, side);
    let occupancy = board.get_occupancy_bitboard();
    let attacked = board.attack_map();
    let (kingside_right, queenside_right) = board.side_to_move_castling_rights();

    let king_from = match side {
        Color::White => 4,
        Color::Black => 60,
    };
    if kingside_right
        && (occupancy & Bitboard::CASTLING_OCCUPANCY_MASKS[side as usize][0]).is_empty()
        && (attacked & Bitboard::CASTLING_ATTACKED_MASKS[side as usize][0]).is_empty()
    {
        push_if_legal(board, moves, Move::castling(king, king_from, king_from + 2));
    }
    if queenside_right
        && (occupancy & Bitboard::CASTLING_OCCUPANCY_MASKS[side as usize][1]).is_empty()
        && (attacked & Bitboard::CASTLING_ATTACKED_MASKS[side as usize][1]).is_empty()
    {
        push_if_legal(board, moves, Move::castling(king, king_from, king_from - 2));
    }
}

#[cfg(test)]
mod tests {
    use super::generate;
    use crate::attacks;
    use crate::bitboard::Bitboard;
    use crate::board::Board;
    use crate::moves::MoveKind;
    use crate::piece::{Color, PieceType};
    use crate::search::perft;
    use crate::square::Square;

    #[test]
    fn start_position_has_twenty_moves() {
        let board = Board::from_start_position();
        assert_eq!(generate(&board).len(), 20);
    }

    #[test]
    fn dense_position_generates_every_move() {
        // The most legal moves known in any position
        let board =
            Board::new("R6R/3Q4/1Q4Q1/4Q3/2Q4Q/Q4Q2/pp1Q4/kBNN1KB1 w - - 0 1").unwrap();
        assert_eq!(generate(&board).len(), 218);
    }

    #[test]
    fn double_check_only_allows_king_moves() {
        // Knight on f3 and rook on e8 both give check
        let board = Board::new("4r2k/8/8/8/8/5n2/3P4/4K3 w - - 0 1").unwrap();
        let moves = generate(&board);
        assert!(moves.iter().all(|m| m.from == 4));
    }

    #[test]
    fn pinned_pieces_stay_on_their_ray() {
        // The e2 bishop is pinned by the e8 rook and cannot move at
        // all, bishops never stay on a file
        let board = Board::new("4r2k/8/8/8/8/8/4B3/4K3 w - - 0 1").unwrap();
        let moves = generate(&board);
        assert!(!moves.iter().any(|m| m.from == 12));
        // A rook pinned on the file still slides along it
        let board = Board::new("4r2k/8/8/8/8/8/4R3/4K3 w - - 0 1").unwrap();
        let moves = generate(&board);
        let rook_moves: Vec<_> = moves.iter().filter(|m| m.from == 12).collect();
        assert!(!rook_moves.is_empty());
        assert!(rook_moves.iter().all(|m| m.to % 8 == 4));
    }

    #[test]
    fn en_passant_discovered_check_is_rejected() {
        // Capturing en passant would expose the king on the fifth rank
        let board = Board::new("8/8/8/KPp4r/8/8/8/7k w - c6 0 1").unwrap();
        let moves = generate(&board);
        assert!(!moves.iter().any(|m| m.kind == MoveKind::EnPassant));
    }

    #[test]
    fn en_passant_capture_resolves_pawn_check() {
        // The d5 pawn just double-pushed and checks the e4 king, the
        // e5 pawn may capture it en passant
        let board = Board::new("7k/8/8/3pP3/4K3/8/8/8 w - d6 0 1").unwrap();
        let moves = generate(&board);
        assert!(moves
            .iter()
            .any(|m| m.kind == MoveKind::EnPassant && m.to == 43));
    }

    #[test]
    fn castling_through_attacked_square_is_rejected() {
        // The black rook on f8 attacks f1, only queenside castling works
        let board = Board::new("5r1k/8/8/8/8/8/8/R3K2R w KQ - 0 1").unwrap();
        let moves = generate(&board);
        assert!(!moves.iter().any(|m| m.kind == MoveKind::Castling && m.to == 6));
        assert!(moves.iter().any(|m| m.kind == MoveKind::Castling && m.to == 2));
    }

    // Verification goes up to depth 4, more would make testing
    // exponentially slower and the positions are varied enough to
    // cover all kinds of moves by depth 4 anyway
    const TEST_POSITIONS: [(&str, [u64; 4]); 7] = [
        (
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            [20, 400, 8902, 197281],
        ),
        (
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            [48, 2039, 97862, 4085603],
        ),
        (
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
            [14, 191, 2812, 43238],
        ),
        (
            "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
            [6, 264, 9467, 422333],
        ),
        (
            "r2q1rk1/pP1p2pp/Q4n2/bbp1p3/Np6/1B3NBn/pPPP1PPP/R3K2R b KQ - 0 1",
            [6, 264, 9467, 422333],
        ),
        (
            "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
            [44, 1486, 62379, 2103487],
        ),
        (
            "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10",
            [46, 2079, 89890, 3894594],
        ),
    ];

    fn square_attacked(board: &Board, sq: Square, by: Color) -> bool {
        let occupancy = board.get_occupancy_bitboard();
        let attackers = (attacks::knight(sq) & board.get_piece_bitboard(PieceType::Knight, by))
            | (attacks::king(sq) & board.get_piece_bitboard(PieceType::King, by))
            | (attacks::bishop(sq, occupancy) & board.get_diagonal_sliders_bitboard(by))
            | (attacks::rook(sq, occupancy) & board.get_cardinal_sliders_bitboard(by))
            | (Bitboard::pawn_attacks(Bitboard::from_square(sq), by.opposite())
                & board.get_piece_bitboard(PieceType::Pawn, by));
        !attackers.is_empty()
    }

    // Slow oracle: make every generated move and verify the mover's
    // king was never left en prise, then unmake back to the exact
    // starting state.
    #[test]
    fn legality_cross_check() {
        for (fen, _) in TEST_POSITIONS {
            let mut board = Board::new(fen).unwrap();
            let baseline = board.clone();
            let mover = board.side_to_move();
            for mv in generate(&board).iter().copied() {
                board.make(mv);
                let king_sq = board.king_square(mover).unwrap();
                assert!(
                    !square_attacked(&board, king_sq, mover.opposite()),
                    "{} leaves the king attacked in {}",
                    mv,
                    fen
                );
                board.unmake();
            }
            assert!(board == baseline);
        }
    }

    #[test]
    fn perft_verification() {
        for (fen, results) in TEST_POSITIONS {
            let mut board = Board::new(fen).unwrap();
            for d in 1..=4 {
                assert_eq!(results[d - 1], perft(&mut board, d as u32), "{} at depth {}", fen, d);
            }
        }
    }

    #[test]
    #[ignore] // expensive, run with --ignored
    fn deep_perft_verification() {
        let mut board = Board::from_start_position();
        assert_eq!(perft(&mut board, 5), 4865609);
        let mut board = Board::new("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1").unwrap();
        assert_eq!(perft(&mut board, 6), 11030083);
    }
}
