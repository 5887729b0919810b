#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use mimalloc::MiMalloc;
use std::time::Instant;

use crate::board::Board;
use crate::errors::FenError;

pub mod attacks;
pub mod bitboard;
pub mod board;
pub mod castling;
pub mod errors;
pub mod evaluation;
pub mod history;
pub mod move_generator;
pub mod movelist;
pub mod moves;
pub mod piece;
pub mod search;
pub mod square;
pub mod uci;

/// Runs a perft table up to `depth` on the given position, printing
/// node counts and throughput per depth.
pub fn perft(depth: u32, fen: Option<String>) -> Result<(), FenError> {
    let mut board = match fen {
        None => Board::from_start_position(),
        Some(f) => Board::new(&f)?,
    };
    println!("{}\n", board);
    println!("depth nodes\n--------");
    for d in 0..=depth {
        let start = Instant::now();
        let nodes = search::perft(&mut board, d);
        let elapsed = start.elapsed();
        println!(
            "{}     {} ({}s, {} nps)",
            d,
            nodes,
            elapsed.as_secs_f32(),
            nodes as f32 / elapsed.as_secs_f32()
        );
    }
    Ok(())
}
