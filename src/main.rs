use pyrite::uci::UCI;

fn main() {
    println!("pyrite v{}", env!("CARGO_PKG_VERSION"));

    let mut args = std::env::args().skip(1);
    // `pyrite perft <depth> [<FEN>]` runs a perft table and exits,
    // anything else starts the UCI prompt
    if args.next().as_deref() == Some("perft") {
        let expected_format = "Expected : perft <depth> [<FEN>]";
        let depth = match args.next().and_then(|d| d.parse::<u32>().ok()) {
            Some(d) => d,
            None => {
                eprintln!("{}", expected_format);
                std::process::exit(1);
            }
        };
        if let Err(err) = pyrite::perft(depth, args.next()) {
            eprintln!("{}", err);
            std::process::exit(1);
        }
    } else {
        UCI::default().run()
    }
}
