//! UCI front end. Reads commands line by line, drives the board and
//! the background search, and prints search events as they arrive.

use crate::board::Board;
use crate::errors::{FenError, MoveError};
use crate::piece::Color;
use crate::search::{perft_divide, Search, SearchEvent, SearchLimits};

use regex::Regex;
use rustyline::config::Configurer;
use rustyline::Editor;
use std::collections::HashMap;
use std::thread;
use std::time::Duration;

pub struct UCI {
    board: Board,
    search: Search,
    editor: Editor<()>,
    debug_mode: bool,
}

impl Default for UCI {
    fn default() -> Self {
        let mut editor = Editor::<()>::new();
        editor.set_auto_add_history(true);
        UCI {
            board: Board::from_start_position(),
            search: Search::new(),
            editor,
            debug_mode: false,
        }
    }
}

impl UCI {
    pub fn run(&mut self) {
        while let Ok(line) = self.editor.readline("uci> ") {
            match self.handle_command(&line) {
                Ok(UCIOkCode::ShouldQuit) => break,
                Err(UCIErrCode::BadCommand(cmd)) => {
                    eprintln!("Unknown or badly formed UCI command: {}", cmd)
                }
                Err(UCIErrCode::BadFen(err)) => eprintln!("Cannot set position: {}", err),
                Err(UCIErrCode::BadMove(err)) => eprintln!("{}", err),
                Err(UCIErrCode::MissingArg(arg)) => {
                    eprintln!("Missing an argument: {} {} <- here", line.trim(), arg)
                }
                _ => (),
            }
        }
        self.search.stop();
    }

    fn handle_command(&mut self, line: &str) -> Result<UCIOkCode, UCIErrCode> {
        let args_regex = Self::args_regex();
        let mut args = args_regex.find_iter(line).map(|m| m.as_str());
        let cmd = if let Some(c) = args.next() {
            c
        } else {
            return Err(UCIErrCode::NoCommand);
        };
        match cmd {
            "uci" => {
                println!("id name Pyrite");
                println!("id author the Pyrite developers");
                println!("uciok");
            }
            "debug" => self.debug_mode = args.next().unwrap_or("off") == "on",
            "isready" => println!("readyok"),
            // No options are exposed, but the command must parse
            "setoption" => (),
            "ucinewgame" => {
                self.search.stop();
                self.board = Board::from_start_position();
            }
            "position" => {
                let words: Vec<&str> = args.collect();
                let mut sections = words.split(|w| *w == "moves");
                let placement = sections.next().unwrap_or(&[]);
                match placement.first() {
                    Some(&"startpos") => self.board = Board::from_start_position(),
                    Some(&"fen") => {
                        let fen = placement[1..].join(" ").replace('"', "");
                        self.board = Board::new(&fen).map_err(UCIErrCode::BadFen)?;
                    }
                    _ => return Err(UCIErrCode::MissingArg(String::from("<startpos | fen>"))),
                }
                if let Some(moves) = sections.next() {
                    for mv in moves {
                        self.board.make_from_str(mv).map_err(UCIErrCode::BadMove)?;
                    }
                }
            }
            "go" => {
                let words: Vec<String> = args.map(String::from).collect();
                if let Some(at) = words.iter().position(|w| w == "perft") {
                    let depth = words
                        .get(at + 1)
                        .and_then(|d| d.parse::<u32>().ok())
                        .unwrap_or(1);
                    self.run_perft(depth);
                } else {
                    let limits = self.parse_go_args(words.into_iter());
                    if let Some(receiver) = self.search.start(&self.board, limits) {
                        thread::spawn(move || {
                            for event in receiver {
                                match event {
                                    SearchEvent::Progress(report) => println!("info {}", report),
                                    SearchEvent::Finished(Some(mv)) => println!("bestmove {}", mv),
                                    SearchEvent::Finished(None) => println!("bestmove 0000"),
                                }
                            }
                        });
                    }
                }
            }
            "stop" => self.search.stop(),
            // Not part of the UCI protocol, but handy at the prompt
            "show" => println!("{}", self.board),
            "divide" => {
                let depth = args.next().and_then(|d| d.parse::<u32>().ok()).unwrap_or(1);
                self.run_perft(depth);
            }
            "quit" => return Ok(UCIOkCode::ShouldQuit),
            _ => return Err(UCIErrCode::BadCommand(String::from(cmd))),
        }

        Ok(UCIOkCode::OkCommand)
    }

    fn run_perft(&self, depth: u32) {
        let mut results = perft_divide(&self.board, depth);
        results.sort_by_key(|(mv, _)| mv.to_string());
        let mut total = 0;
        for (mv, nodes) in &results {
            println!("{}: {}", mv, nodes);
            total += nodes;
        }
        println!();
        println!("Nodes searched: {}", total);
    }

    fn parse_go_args<I: Iterator<Item = String>>(&self, args: I) -> SearchLimits {
        let valid_args = [
            "wtime", "btime", "winc", "binc", "depth", "movetime", "infinite",
        ];

        let mut arg_value_map: HashMap<String, String> = HashMap::new();
        let mut current_arg = String::new();
        let mut current_value = String::new();
        for word in args {
            if valid_args.contains(&word.as_str()) {
                arg_value_map.insert(current_arg, String::from(current_value.trim()));
                current_arg = word;
                current_value = String::new();
            } else {
                current_value.push_str(&word);
                current_value.push(' ');
            }
        }
        arg_value_map.insert(current_arg, String::from(current_value.trim()));

        let millis = |s: &String| s.parse::<u64>().ok().map(Duration::from_millis);

        let mut limits = SearchLimits::default();
        limits.set_depth(arg_value_map.get("depth").and_then(|d| d.parse().ok()));
        if arg_value_map.contains_key("infinite") {
            return limits;
        }

        if let Some(movetime) = arg_value_map.get("movetime").and_then(millis) {
            limits.set_time(Some(movetime));
        } else {
            let (clock, increment) = if self.board.side_to_move() == Color::White {
                (
                    arg_value_map.get("wtime").and_then(millis),
                    arg_value_map.get("winc").and_then(millis),
                )
            } else {
                (
                    arg_value_map.get("btime").and_then(millis),
                    arg_value_map.get("binc").and_then(millis),
                )
            };
            if let Some(clock) = clock {
                limits.set_time_from_clock(clock, increment);
            }
        }
        limits
    }

    fn args_regex() -> Regex {
        // Quoted arguments stay in one piece
        Regex::new(r#"(".*?"|[^"\s]+)"#).unwrap_or_else(|_| unreachable!())
    }
}

enum UCIOkCode {
    OkCommand,
    ShouldQuit,
}

enum UCIErrCode {
    NoCommand,
    MissingArg(String),
    BadCommand(String),
    BadFen(FenError),
    BadMove(MoveError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn go_args_are_parsed() {
        let uci = UCI::default();
        let limits =
            uci.parse_go_args(["depth", "6"].map(String::from).into_iter());
        assert_eq!(limits.max_depth, Some(6));
        assert_eq!(limits.budget, None);

        let limits =
            uci.parse_go_args(["movetime", "2000"].map(String::from).into_iter());
        assert_eq!(limits.budget, Some(Duration::from_millis(2000)));

        // White to move, so only wtime/winc matter
        let limits = uci.parse_go_args(
            ["wtime", "10000", "btime", "500", "winc", "100"]
                .map(String::from)
                .into_iter(),
        );
        assert_eq!(limits.budget, Some(Duration::from_millis(250)));

        let limits = uci.parse_go_args(["infinite"].map(String::from).into_iter());
        assert_eq!(limits.budget, None);
        assert_eq!(limits.max_depth, None);
    }

    #[test]
    fn position_command_builds_the_board() {
        let mut uci = UCI::default();
        assert!(uci
            .handle_command("position startpos moves e2e4 e7e5 g1f3")
            .is_ok());
        assert_eq!(
            uci.board.get_fen(),
            "rnbqkbnr/pppp1ppp/8/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 1 2"
        );

        assert!(uci
            .handle_command("position fen 8/8/8/8/8/8/8/K6k w - - 0 1")
            .is_ok());
        assert_eq!(uci.board.get_fen(), "8/8/8/8/8/8/8/K6k w - - 0 1");

        assert!(matches!(
            uci.handle_command("position fen not a fen"),
            Err(UCIErrCode::BadFen(_))
        ));
        assert!(matches!(
            uci.handle_command("position startpos moves e2e5"),
            Err(UCIErrCode::BadMove(MoveError::Illegal(_)))
        ));
    }
}
