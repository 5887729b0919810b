//! Precomputed attack tables, built once on first access.
//!
//! Knight and king moves are plain per-square lookups. Sliding piece
//! attacks use magic bitboards: the relevant occupancy is hashed by a
//! fixed multiplier into a dense table of precomputed attack sets.
//! Magic constants are the well known Shallow Blue set.

use crate::bitboard::Bitboard;
use crate::square::Square;
use std::sync::OnceLock;

const ROOK_MAGICS: [u64; 64] = [
    0xa8002c000108020, 0x6c00049b0002001, 0x100200010090040, 0x2480041000800801,
    0x280028004000800, 0x900410008040022, 0x280020001001080, 0x2880002041000080,
    0xa000800080400034, 0x4808020004000, 0x2290802004801000, 0x411000d00100020,
    0x402800800040080, 0xb000401004208, 0x2409000100040200, 0x1002100004082,
    0x22878001e24000, 0x1090810021004010, 0x801030040200012, 0x500808008001000,
    0xa08018014000880, 0x8000808004000200, 0x201008080010200, 0x801020000441091,
    0x800080204005, 0x1040200040100048, 0x120200402082, 0xd14880480100080,
    0x12040280080080, 0x100040080020080, 0x9020010080800200, 0x813241200148449,
    0x491604001800080, 0x100401000402001, 0x4820010021001040, 0x400402202000812,
    0x209009005000802, 0x810800601800400, 0x4301083214000150, 0x204026458e001401,
    0x40204000808000, 0x8001008040010020, 0x8410820820420010, 0x1003001000090020,
    0x804040008008080, 0x12000810020004, 0x1000100200040208, 0x430000a044020001,
    0x280009023410300, 0xe0100040002240, 0x200100401700, 0x2244100408008080,
    0x8000400801980, 0x2000810040200, 0x8010100228810400, 0x2000009044210200,
    0x4080008040102101, 0x40002080411d01, 0x2005524060000901, 0x502001008400422,
    0x489a000810200402, 0x1004400080a13, 0x4000011008020084, 0x26002114058042,
];
const ROOK_INDEX_BITS: [u32; 64] = [
    12, 11, 11, 11, 11, 11, 11, 12,
    11, 10, 10, 10, 10, 10, 10, 11,
    11, 10, 10, 10, 10, 10, 10, 11,
    11, 10, 10, 10, 10, 10, 10, 11,
    11, 10, 10, 10, 10, 10, 10, 11,
    11, 10, 10, 10, 10, 10, 10, 11,
    11, 10, 10, 10, 10, 10, 10, 11,
    12, 11, 11, 11, 11, 11, 11, 12,
];
const BISHOP_MAGICS: [u64; 64] = [
    0x89a1121896040240, 0x2004844802002010, 0x2068080051921000, 0x62880a0220200808,
    0x4042004000000, 0x100822020200011, 0xc00444222012000a, 0x28808801216001,
    0x400492088408100, 0x201c401040c0084, 0x840800910a0010, 0x82080240060,
    0x2000840504006000, 0x30010c4108405004, 0x1008005410080802, 0x8144042209100900,
    0x208081020014400, 0x4800201208ca00, 0xf18140408012008, 0x1004002802102001,
    0x841000820080811, 0x40200200a42008, 0x800054042000, 0x88010400410c9000,
    0x520040470104290, 0x1004040051500081, 0x2002081833080021, 0x400c00c010142,
    0x941408200c002000, 0x658810000806011, 0x188071040440a00, 0x4800404002011c00,
    0x104442040404200, 0x511080202091021, 0x4022401120400, 0x80c0040400080120,
    0x8040010040820802, 0x480810700020090, 0x102008e00040242, 0x809005202050100,
    0x8002024220104080, 0x431008804142000, 0x19001802081400, 0x200014208040080,
    0x3308082008200100, 0x41010500040c020, 0x4012020c04210308, 0x208220a202004080,
    0x111040120082000, 0x6803040141280a00, 0x2101004202410000, 0x8200000041108022,
    0x21082088000, 0x2410204010040, 0x40100400809000, 0x822088220820214,
    0x40808090012004, 0x910224040218c9, 0x402814422015008, 0x90014004842410,
    0x1000042304105, 0x10008830412a00, 0x2520081090008908, 0x40102000a0a60140,
];
const BISHOP_INDEX_BITS: [u32; 64] = [
    6, 5, 5, 5, 5, 5, 5, 6,
    5, 5, 5, 5, 5, 5, 5, 5,
    5, 5, 7, 7, 7, 7, 5, 5,
    5, 5, 7, 9, 9, 7, 5, 5,
    5, 5, 7, 9, 9, 7, 5, 5,
    5, 5, 7, 7, 7, 7, 5, 5,
    5, 5, 5, 5, 5, 5, 5, 5,
    6, 5, 5, 5, 5, 5, 5, 6,
];

const BISHOP_DELTAS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
const ROOK_DELTAS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// One magic hashing entry. `offset` locates the square's slice of
/// the shared attack table.
#[derive(Copy, Clone)]
struct Magic {
    mask: u64,
    magic: u64,
    shift: u32,
    offset: usize,
}

impl Magic {
    #[inline(always)]
    fn index(&self, occupancy: Bitboard) -> usize {
        let relevant = occupancy.0 & self.mask;
        self.offset + (relevant.wrapping_mul(self.magic) >> (64 - self.shift)) as usize
    }
}

struct Tables {
    knight: [Bitboard; 64],
    king: [Bitboard; 64],
    bishop: [Magic; 64],
    rook: [Magic; 64],
    sliding: Vec<Bitboard>,
    between: Box<[[Bitboard; 64]; 64]>,
    line: Box<[[Bitboard; 64]; 64]>,
}

static TABLES: OnceLock<Tables> = OnceLock::new();

#[inline]
fn tables() -> &'static Tables {
    TABLES.get_or_init(Tables::build)
}

/// Knight attacks from `square`.
#[inline]
pub fn knight(square: Square) -> Bitboard {
    tables().knight[square]
}

/// King attacks from `square`.
#[inline]
pub fn king(square: Square) -> Bitboard {
    tables().king[square]
}

/// Bishop attacks from `square` given the full board occupancy.
#[inline]
pub fn bishop(square: Square, occupancy: Bitboard) -> Bitboard {
    let t = tables();
    t.sliding[t.bishop[square].index(occupancy)]
}

/// Rook attacks from `square` given the full board occupancy.
#[inline]
pub fn rook(square: Square, occupancy: Bitboard) -> Bitboard {
    let t = tables();
    t.sliding[t.rook[square].index(occupancy)]
}

/// Queen attacks, the union of bishop and rook attacks.
#[inline]
pub fn queen(square: Square, occupancy: Bitboard) -> Bitboard {
    bishop(square, occupancy) | rook(square, occupancy)
}

/// Squares strictly between `a` and `b`, empty if they do not share a
/// rank, file or diagonal.
#[inline]
pub fn between(a: Square, b: Square) -> Bitboard {
    tables().between[a][b]
}

/// The full line through `a` and `b` (both endpoints included),
/// extended to the board edges. Empty if unaligned.
#[inline]
pub fn line(a: Square, b: Square) -> Bitboard {
    tables().line[a][b]
}

impl Tables {
    fn build() -> Tables {
        let knight_shifts: [fn(Bitboard) -> Bitboard; 8] = [
            |bb| Bitboard(bb.0 << 10) & !(Bitboard::FILES[0] | Bitboard::FILES[1]),
            |bb| Bitboard(bb.0 >> 10) & !(Bitboard::FILES[6] | Bitboard::FILES[7]),
            |bb| Bitboard(bb.0 << 17) & !Bitboard::FILES[0],
            |bb| Bitboard(bb.0 >> 17) & !Bitboard::FILES[7],
            |bb| Bitboard(bb.0 << 15) & !Bitboard::FILES[7],
            |bb| Bitboard(bb.0 >> 15) & !Bitboard::FILES[0],
            |bb| Bitboard(bb.0 << 6) & !(Bitboard::FILES[6] | Bitboard::FILES[7]),
            |bb| Bitboard(bb.0 >> 6) & !(Bitboard::FILES[0] | Bitboard::FILES[1]),
        ];
        let king_shifts: [fn(Bitboard) -> Bitboard; 8] = [
            Bitboard::north_shift,
            Bitboard::south_shift,
            Bitboard::east_shift,
            Bitboard::west_shift,
            Bitboard::north_east_shift,
            Bitboard::north_west_shift,
            Bitboard::south_east_shift,
            Bitboard::south_west_shift,
        ];

        let mut knight = [Bitboard::EMPTY; 64];
        let mut king = [Bitboard::EMPTY; 64];
        for sq in 0..64 {
            let origin = Bitboard::from_square(sq);
            for shift in knight_shifts {
                knight[sq] |= shift(origin);
            }
            for shift in king_shifts {
                king[sq] |= shift(origin);
            }
        }

        let mut sliding = Vec::new();
        let mut bishop = [Magic { mask: 0, magic: 0, shift: 0, offset: 0 }; 64];
        let mut rook = bishop;
        for sq in 0..64 {
            bishop[sq] = fill_magic(
                sq,
                BISHOP_MAGICS[sq],
                BISHOP_INDEX_BITS[sq],
                &BISHOP_DELTAS,
                &mut sliding,
            );
            rook[sq] = fill_magic(
                sq,
                ROOK_MAGICS[sq],
                ROOK_INDEX_BITS[sq],
                &ROOK_DELTAS,
                &mut sliding,
            );
        }

        let mut between = Box::new([[Bitboard::EMPTY; 64]; 64]);
        let mut line = Box::new([[Bitboard::EMPTY; 64]; 64]);
        for a in 0..64 {
            for b in 0..64 {
                if a == b {
                    continue;
                }
                let endpoints = Bitboard::from_square(a) | Bitboard::from_square(b);
                if slide(a, Bitboard::EMPTY, &BISHOP_DELTAS).is_set(b) {
                    between[a][b] = slide(a, Bitboard::from_square(b), &BISHOP_DELTAS)
                        & slide(b, Bitboard::from_square(a), &BISHOP_DELTAS);
                    line[a][b] = (slide(a, Bitboard::EMPTY, &BISHOP_DELTAS)
                        & slide(b, Bitboard::EMPTY, &BISHOP_DELTAS))
                        | endpoints;
                } else if slide(a, Bitboard::EMPTY, &ROOK_DELTAS).is_set(b) {
                    between[a][b] = slide(a, Bitboard::from_square(b), &ROOK_DELTAS)
                        & slide(b, Bitboard::from_square(a), &ROOK_DELTAS);
                    line[a][b] = (slide(a, Bitboard::EMPTY, &ROOK_DELTAS)
                        & slide(b, Bitboard::EMPTY, &ROOK_DELTAS))
                        | endpoints;
                }
            }
        }

        Tables {
            knight,
            king,
            bishop,
            rook,
            sliding,
            between,
            line,
        }
    }
}

/// Builds the magic entry for one square and appends its attack slice
/// to the shared table, enumerating every relevant occupancy subset
/// with the carry-rippler trick.
fn fill_magic(
    square: Square,
    magic: u64,
    shift: u32,
    deltas: &[(i8, i8); 4],
    sliding: &mut Vec<Bitboard>,
) -> Magic {
    let mask = relevant_mask(square, deltas);
    let offset = sliding.len();
    sliding.resize(offset + (1 << shift), Bitboard::EMPTY);

    let mut subset = 0u64;
    loop {
        let key = (subset.wrapping_mul(magic) >> (64 - shift)) as usize;
        sliding[offset + key] = slide(square, Bitboard(subset), deltas);
        subset = subset.wrapping_sub(mask) & mask;
        if subset == 0 {
            break;
        }
    }

    Magic { mask, magic, shift, offset }
}

/// Relevant occupancy mask: the rays from `square` with their last
/// square dropped, since a blocker on the edge changes nothing.
fn relevant_mask(square: Square, deltas: &[(i8, i8); 4]) -> u64 {
    let mut mask = 0u64;
    for &(dr, df) in deltas {
        let (mut rank, mut file) = ((square / 8) as i8, (square % 8) as i8);
        loop {
            let (next_rank, next_file) = (rank + dr, file + df);
            if !(0..8).contains(&(next_rank + dr)) || !(0..8).contains(&(next_file + df)) {
                break;
            }
            rank = next_rank;
            file = next_file;
            mask |= 1u64 << (rank * 8 + file);
        }
    }
    mask
}

/// Ray-cast slider attacks, stopping at the first occupied square in
/// each direction (the blocker itself is included).
fn slide(square: Square, occupancy: Bitboard, deltas: &[(i8, i8); 4]) -> Bitboard {
    let mut attacks = Bitboard::EMPTY;
    for &(dr, df) in deltas {
        let (mut rank, mut file) = ((square / 8) as i8, (square % 8) as i8);
        loop {
            rank += dr;
            file += df;
            if !(0..8).contains(&rank) || !(0..8).contains(&file) {
                break;
            }
            let sq = (rank * 8 + file) as Square;
            attacks.set(sq);
            if occupancy.is_set(sq) {
                break;
            }
        }
    }
    attacks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::square::parse_square;

    #[test]
    fn empty_board_attack_counts() {
        let d4 = parse_square("d4").unwrap();
        assert_eq!(bishop(d4, Bitboard::EMPTY).pop_count(), 13);
        assert_eq!(rook(d4, Bitboard::EMPTY).pop_count(), 14);
        assert_eq!(queen(d4, Bitboard::EMPTY).pop_count(), 27);
        assert_eq!(knight(d4).pop_count(), 8);
        assert_eq!(king(d4).pop_count(), 8);
    }

    #[test]
    fn corner_attack_counts() {
        assert_eq!(knight(0).pop_count(), 2);
        assert_eq!(king(0).pop_count(), 3);
        assert_eq!(king(63).pop_count(), 3);
    }

    #[test]
    fn sliders_stop_at_blockers() {
        let d4 = parse_square("d4").unwrap();
        let d6 = parse_square("d6").unwrap();
        let attacks = rook(d4, Bitboard::from_square(d6));
        // d6 blocks the northern ray, d7 and d8 are shadowed
        assert!(attacks.is_set(d6));
        assert!(!attacks.is_set(parse_square("d7").unwrap()));
        assert!(!attacks.is_set(parse_square("d8").unwrap()));
        assert!(attacks.is_set(parse_square("d1").unwrap()));
    }

    #[test]
    fn magic_lookup_matches_ray_cast() {
        let occupancy = Bitboard(0x00ff0000181800ff);
        for sq in 0..64 {
            assert_eq!(bishop(sq, occupancy), slide(sq, occupancy, &BISHOP_DELTAS));
            assert_eq!(rook(sq, occupancy), slide(sq, occupancy, &ROOK_DELTAS));
        }
    }

    #[test]
    fn between_and_line() {
        let a1 = 0;
        let h8 = 63;
        assert_eq!(between(a1, h8).pop_count(), 6);
        assert_eq!(line(a1, h8).pop_count(), 8);
        assert!(line(a1, h8).is_set(a1) && line(a1, h8).is_set(h8));
        // Unaligned squares
        let b1 = 1;
        let c4 = parse_square("c4").unwrap();
        assert_eq!(between(b1, c4), Bitboard::EMPTY);
        assert_eq!(line(b1, c4), Bitboard::EMPTY);
        // Adjacent squares have nothing in between
        assert_eq!(between(a1, b1), Bitboard::EMPTY);
    }
}
