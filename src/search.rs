//! Iterative deepening negamax search and perft, both running on
//! background workers that report through channels and stop
//! cooperatively.

use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::board::Board;
use crate::evaluation::{Evaluation, Score};
use crate::move_generator::generate;
use crate::moves::Move;

/// Bounds on a search. With no bound set the search runs until it is
/// stopped explicitly.
#[derive(Clone, Default)]
pub struct SearchLimits {
    pub budget: Option<Duration>,
    pub max_depth: Option<u32>,
}

impl SearchLimits {
    pub fn set_depth(&mut self, value: Option<u32>) -> &mut Self {
        self.max_depth = value;
        self
    }
    pub fn set_time(&mut self, value: Option<Duration>) -> &mut Self {
        self.budget = value;
        self
    }
    /// Derives a time budget from the remaining clock and increment.
    pub fn set_time_from_clock(
        &mut self,
        clock: Duration,
        increment: Option<Duration>,
    ) -> &mut Self {
        let mut movetime = clock / 50;
        if let Some(inc) = increment {
            movetime += inc / 2;
        }
        self.budget = Some(if movetime.is_zero() { clock } else { movetime });
        self
    }
}

/// One completed deepening iteration.
#[derive(Debug, Clone)]
pub struct SearchReport {
    pub depth: u32,
    pub score: Score,
    pub best_move: Move,
    pub time: Duration,
}

impl Display for SearchReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mate = self.score <= -Evaluation::MATE_SCORE || self.score >= Evaluation::MATE_SCORE;
        write!(
            f,
            "depth {} score {} {} time {} pv {}",
            self.depth,
            if mate { "mate" } else { "cp" },
            if mate {
                (self.depth as Score + 1) / 2 * self.score.signum()
            } else {
                self.score
            },
            self.time.as_millis(),
            self.best_move
        )
    }
}

/// Everything a search worker sends back over its channel.
pub enum SearchEvent {
    Progress(SearchReport),
    Finished(Option<Move>),
}

struct Worker {
    _handle: JoinHandle<()>,
    stop_handle: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
}

/// Owns at most one background search at a time.
#[derive(Default)]
pub struct Search {
    worker: Option<Worker>,
}

impl Search {
    pub fn new() -> Search {
        Search { worker: None }
    }

    pub fn is_searching(&self) -> bool {
        self.worker
            .as_ref()
            .map_or(false, |w| w.running.load(Ordering::SeqCst))
    }

    /// Spawns a worker searching the given position, returning the
    /// receiving end of its event channel. Returns None if a search
    /// is already running.
    pub fn start(&mut self, board: &Board, limits: SearchLimits) -> Option<Receiver<SearchEvent>> {
        if self.is_searching() {
            return None;
        }

        let (sender, receiver) = channel();
        let stop_handle = Arc::new(AtomicBool::new(false));
        let running = Arc::new(AtomicBool::new(true));

        let position = board.clone();
        let stop_signal = Arc::clone(&stop_handle);
        let running_signal = Arc::clone(&running);
        let _handle = thread::spawn(move || {
            search_root(position, limits, sender, stop_signal);
            running_signal.store(false, Ordering::SeqCst);
        });

        self.worker = Some(Worker {
            _handle,
            stop_handle,
            running,
        });
        Some(receiver)
    }

    /// Asks the running search to wind down. The worker still emits
    /// its Finished event with the best move found so far.
    pub fn stop(&mut self) {
        if let Some(worker) = &self.worker {
            worker.stop_handle.store(true, Ordering::SeqCst);
        }
    }
}

fn search_root(
    mut position: Board,
    limits: SearchLimits,
    events: Sender<SearchEvent>,
    stop_signal: Arc<AtomicBool>,
) {
    let start = Instant::now();
    let budget = limits.budget;
    let out_of_time = move || {
        stop_signal.load(Ordering::SeqCst)
            || budget.map_or(false, |budget| start.elapsed() >= budget)
    };

    let root_moves = generate(&position);
    if root_moves.is_empty() {
        let _ = events.send(SearchEvent::Finished(None));
        return;
    }

    // Seeded with an arbitrary legal move so a stop during the first
    // iteration still produces an answer
    let mut best: Option<Move> = root_moves.get(0).copied();
    let mut depth = 1;
    'deepening: loop {
        let beta = Evaluation::MATE_SCORE + 1;
        let mut alpha = -beta;
        let mut iteration_best = None;

        // Searching the previous iteration's best move first gives
        // tight bounds early and keeps a full-width answer on hand
        // if the clock runs out mid-iteration
        if let Some(mv) = best {
            position.make(mv);
            alpha = -negamax(&mut position, -beta, -alpha, depth - 1);
            position.unmake();
            iteration_best = Some(mv);
        }
        for mv in &root_moves {
            if out_of_time() {
                break 'deepening;
            }
            if Some(*mv) == best {
                continue;
            }
            position.make(*mv);
            let score = -negamax(&mut position, -beta, -alpha, depth - 1);
            position.unmake();
            if score > alpha || iteration_best.is_none() {
                alpha = score;
                iteration_best = Some(*mv);
            }
        }

        best = iteration_best;
        if let Some(best_move) = best {
            let _ = events.send(SearchEvent::Progress(SearchReport {
                depth,
                score: alpha,
                best_move,
                time: start.elapsed(),
            }));
        }
        if out_of_time() || limits.max_depth.map_or(false, |max| depth >= max) {
            break;
        }
        depth += 1;
    }

    let _ = events.send(SearchEvent::Finished(best));
}

/// Fail-hard alpha beta. Depth 0 falls back to the static material
/// balance, terminal positions score as mate or draw.
fn negamax(position: &mut Board, mut alpha: Score, beta: Score, depth: u32) -> Score {
    if depth == 0 {
        return Evaluation::material(position);
    }

    let moves = generate(position);
    if moves.is_empty() {
        return if position.in_check() {
            -Evaluation::MATE_SCORE
        } else {
            Evaluation::DRAW_SCORE
        };
    }

    for mv in &moves {
        position.make(*mv);
        let score = -negamax(position, -beta, -alpha, depth - 1);
        position.unmake();
        if score >= beta {
            return beta;
        }
        if score > alpha {
            alpha = score;
        }
    }
    alpha
}

/*
PERFT
 */

/// Counts leaf nodes of the legal move tree, with the usual shortcut
/// of counting moves instead of recursing at the last ply.
pub fn perft(board: &mut Board, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }
    let moves = generate(board);
    if depth == 1 {
        return moves.len() as u64;
    }

    let mut nodes = 0;
    for mv in &moves {
        board.make(*mv);
        nodes += perft(board, depth - 1);
        board.unmake();
    }
    nodes
}

/// Splits the root moves across one board clone per hardware thread
/// and counts each subtree in parallel. Returns per-root-move counts
/// in no particular order.
pub fn perft_divide(board: &Board, depth: u32) -> Vec<(Move, u64)> {
    let moves: Vec<Move> = generate(board).iter().copied().collect();
    if depth == 0 || moves.is_empty() {
        return vec![];
    }

    let workers = num_cpus::get().max(1);
    let chunk_size = (moves.len() + workers - 1) / workers;
    let mut results = Vec::with_capacity(moves.len());
    thread::scope(|s| {
        let handles: Vec<_> = moves
            .chunks(chunk_size)
            .map(|chunk| {
                let mut local = board.clone();
                s.spawn(move || {
                    chunk
                        .iter()
                        .map(|mv| {
                            local.make(*mv);
                            let nodes = perft(&mut local, depth - 1);
                            local.unmake();
                            (*mv, nodes)
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        for handle in handles {
            if let Ok(part) = handle.join() {
                results.extend(part);
            }
        }
    });
    results
}

/// Total node count at `depth`, computed with the parallel splitter.
pub fn perft_concurrent(board: &Board, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }
    perft_divide(board, depth).iter().map(|(_, nodes)| nodes).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use std::time::Duration;

    #[test]
    fn terminal_positions_score_mate_and_stalemate() {
        // Fool's mate, white is checkmated
        let mut board =
            Board::new("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 0 3").unwrap();
        assert_eq!(
            negamax(&mut board, -Evaluation::MATE_SCORE - 1, Evaluation::MATE_SCORE + 1, 3),
            -Evaluation::MATE_SCORE
        );

        let mut board = Board::new("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert_eq!(
            negamax(&mut board, -Evaluation::MATE_SCORE - 1, Evaluation::MATE_SCORE + 1, 2),
            Evaluation::DRAW_SCORE
        );
    }

    #[test]
    fn search_finds_mate_in_one() {
        let board = Board::new("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1").unwrap();
        let mut search = Search::new();
        let mut limits = SearchLimits::default();
        limits.set_depth(Some(3));
        let receiver = search.start(&board, limits).unwrap();

        let mut best = None;
        for event in receiver {
            if let SearchEvent::Finished(mv) = event {
                best = mv;
            }
        }
        assert_eq!(best.map(|m| m.to_string()), Some(String::from("a1a8")));
    }

    #[test]
    fn stop_interrupts_an_unbounded_search() {
        let board = Board::from_start_position();
        let mut search = Search::new();
        let receiver = search.start(&board, SearchLimits::default()).unwrap();

        std::thread::sleep(Duration::from_millis(50));
        assert!(search.is_searching());
        search.stop();
        // The Finished event must still arrive
        let finished = receiver
            .into_iter()
            .any(|e| matches!(e, SearchEvent::Finished(Some(_))));
        assert!(finished);
    }

    #[test]
    fn only_one_search_runs_at_a_time() {
        let board = Board::from_start_position();
        let mut search = Search::new();
        let first = search.start(&board, SearchLimits::default());
        assert!(first.is_some());
        assert!(search.start(&board, SearchLimits::default()).is_none());
        search.stop();
        for _ in first.into_iter().flatten() {}
    }

    #[test]
    fn mated_position_reports_no_best_move() {
        let board =
            Board::new("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 0 3").unwrap();
        let mut search = Search::new();
        let receiver = search.start(&board, SearchLimits::default()).unwrap();
        let mut finished_with = None;
        for event in receiver {
            if let SearchEvent::Finished(mv) = event {
                finished_with = Some(mv);
            }
        }
        assert_eq!(finished_with, Some(None));
    }

    #[test]
    fn divide_matches_sequential_perft() {
        let mut board = Board::from_start_position();
        let sequential = perft(&mut board, 3);
        assert_eq!(perft_concurrent(&board, 3), sequential);

        let divided = perft_divide(&board, 3);
        assert_eq!(divided.len(), 20);
        assert_eq!(divided.iter().map(|(_, n)| n).sum::<u64>(), sequential);
    }
}
