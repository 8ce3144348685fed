//! Self-play CLI.
//!
//! Plays the engine against hidden random fleets and writes one JSON record
//! per game.
//!
//! Usage:
//!   cargo run --release --bin selfplay -- [OPTIONS]
//!
//! Options:
//!   --games N        Number of games to play (default: 10)
//!   --size N         Board size (default: 10)
//!   --ships L,L,..   Ship lengths (default: preset for the board size)
//!   --strategy S     mcts, density, minimax or entropy (default: mcts)
//!   --iterations N   Fixed planner iterations per move (default: time budget)
//!   --threads N      Number of parallel games (default: 4)
//!   --seed N         Base seed, 0 for entropy (default: 0)
//!   --output FILE    Output file path (default: stdout)
//!   --quiet          Suppress summary output

use std::env;
use std::fs::File;
use std::io::{self, BufWriter};
use std::time::Instant;

use broadside::board::FleetPreset;
use broadside::selfplay::{self, SelfPlayConfig};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    let mut config = SelfPlayConfig::default();
    let mut ships: Option<Vec<usize>> = None;
    let mut output_path: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        let flag = args[i].as_str();
        let mut value = || {
            i += 1;
            args.get(i)
                .cloned()
                .unwrap_or_else(|| fail(&format!("{} needs a value", flag)))
        };
        match flag {
            "--games" => config.num_games = value().parse().expect("invalid --games value"),
            "--size" => config.size = value().parse().expect("invalid --size value"),
            "--ships" => {
                let lengths = value()
                    .split(',')
                    .map(|s| s.trim().parse::<usize>().expect("invalid --ships value"))
                    .collect();
                ships = Some(lengths);
            }
            "--strategy" => {
                config.engine.strategy = value()
                    .parse()
                    .unwrap_or_else(|e: String| fail(&e));
            }
            "--iterations" => {
                let n: u64 = value().parse().expect("invalid --iterations value");
                config.engine.mcts_iterations = (n > 0).then_some(n);
            }
            "--threads" => config.threads = value().parse().expect("invalid --threads value"),
            "--seed" => config.seed = value().parse().expect("invalid --seed value"),
            "--output" => output_path = Some(value()),
            "--quiet" => config.quiet = true,
            "--help" | "-h" => {
                print_usage();
                return;
            }
            other => fail(&format!("Unknown argument: {}", other)),
        }
        i += 1;
    }

    config.lengths = match ships {
        Some(lengths) => lengths,
        None => match FleetPreset::for_size(config.size) {
            Some(preset) => preset.ship_lengths().to_vec(),
            None => fail(&format!("no preset fleet for size {}; pass --ships", config.size)),
        },
    };

    if !config.quiet {
        eprintln!(
            "Self-play: {} games, {}x{} board, ships {:?}, strategy {}, {} threads",
            config.num_games,
            config.size,
            config.size,
            config.lengths,
            config.engine.strategy,
            config.threads
        );
    }

    let start = Instant::now();
    let games = selfplay::run_self_play(&config).expect("self-play failed");
    let elapsed = start.elapsed();

    if !config.quiet {
        eprintln!(
            "Completed {} games in {:.1}s ({:.2}s/game)",
            games.len(),
            elapsed.as_secs_f64(),
            elapsed.as_secs_f64() / games.len().max(1) as f64
        );
        selfplay::print_summary(&games);
    }

    match output_path {
        Some(path) => {
            let file = File::create(&path).expect("failed to create output file");
            let mut writer = BufWriter::new(file);
            selfplay::write_jsonl(&games, &mut writer).expect("failed to write output");
            if !config.quiet {
                eprintln!("Wrote {} games to {}", games.len(), path);
            }
        }
        None => {
            let stdout = io::stdout();
            let mut writer = BufWriter::new(stdout.lock());
            selfplay::write_jsonl(&games, &mut writer).expect("failed to write output");
        }
    }
}

fn fail(message: &str) -> ! {
    eprintln!("{}", message);
    print_usage();
    std::process::exit(1);
}

fn print_usage() {
    eprintln!("Usage: selfplay [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --games N        Number of games to play (default: 10)");
    eprintln!("  --size N         Board size (default: 10)");
    eprintln!("  --ships L,L,..   Ship lengths (default: preset for the board size)");
    eprintln!("  --strategy S     mcts, density, minimax or entropy (default: mcts)");
    eprintln!("  --iterations N   Fixed planner iterations per move (default: time budget)");
    eprintln!("  --threads N      Number of parallel games (default: 4)");
    eprintln!("  --seed N         Base seed, 0 for entropy (default: 0)");
    eprintln!("  --output FILE    Output file path (default: stdout)");
    eprintln!("  --quiet          Suppress summary output");
    eprintln!("  --help           Show this help");
}
