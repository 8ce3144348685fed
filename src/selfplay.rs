//! Self-play games against a hidden random fleet.
//!
//! A referee hides a random no-touch fleet and answers every shot with
//! miss/hit/sunk; the engine hunts until the fleet is cleared. Games are
//! independent, so they run in parallel under rayon and records are
//! streamed back to the caller as they complete.

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::warn;

use crate::board::fleet::{OwnFleet, SinkRule, Strike};
use crate::board::grid::Coord;
use crate::board::placement::random_fleet;
use crate::config::EngineConfig;
use crate::engine::{Engine, EngineError, Outcome};

/// Per-ship anchor retries when the referee hides its fleet.
const REFEREE_RETRIES: usize = 200;
/// Whole-fleet restarts before the referee gives up.
const REFEREE_RESTARTS: usize = 50;
/// Separates the referee's RNG stream from the engine's.
const REFEREE_SALT: u64 = 0xA076_1D64_78BD_642F;

#[derive(Debug, thiserror::Error)]
pub enum SelfPlayError {
    #[error("referee could not hide the fleet {lengths:?} on a {size}x{size} board")]
    RefereeLayout { lengths: Vec<usize>, size: usize },

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("self-play worker thread panicked")]
    WorkerPanicked,
}

/// Configuration for a self-play run.
#[derive(Debug, Clone)]
pub struct SelfPlayConfig {
    pub num_games: usize,
    pub size: usize,
    pub lengths: Vec<usize>,
    /// Engine settings; `seed` is overridden per game.
    pub engine: EngineConfig,
    /// Parallel games. 1 plays sequentially on the calling thread.
    pub threads: usize,
    /// Base seed (0 = use entropy). Game `i` uses `seed + i`.
    pub seed: u64,
    /// Suppress per-game progress output.
    pub quiet: bool,
}

impl Default for SelfPlayConfig {
    fn default() -> Self {
        SelfPlayConfig {
            num_games: 10,
            size: 10,
            lengths: vec![5, 4, 3, 3, 2],
            engine: EngineConfig::default(),
            threads: 4,
            seed: 0,
            quiet: false,
        }
    }
}

/// One shot of a self-play game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShotRecord {
    pub x: usize,
    pub y: usize,
    pub outcome: Outcome,
    pub guaranteed: bool,
}

/// A complete self-play game.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameRecord {
    pub game_id: usize,
    pub seed: u64,
    pub size: usize,
    pub won: bool,
    /// Shots fired until the fleet was cleared (or the game stopped).
    pub shots: usize,
    pub hits: usize,
    pub guaranteed_hits: usize,
    pub elapsed_ms: u64,
    /// The referee's hidden fleet, one cell list per ship.
    pub fleet: Vec<Vec<Coord>>,
    pub shot_log: Vec<ShotRecord>,
}

fn game_seed(config: &SelfPlayConfig, game_id: usize) -> u64 {
    if config.seed != 0 {
        config.seed.wrapping_add(game_id as u64)
    } else {
        SmallRng::from_entropy().gen::<u64>().max(1)
    }
}

/// Plays one game with the given seed.
pub fn play_game(
    config: &SelfPlayConfig,
    game_id: usize,
    seed: u64,
) -> Result<GameRecord, SelfPlayError> {
    let start = Instant::now();
    let mut rng = SmallRng::seed_from_u64(seed ^ REFEREE_SALT);
    let mut sorted = config.lengths.clone();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    let placements = (0..REFEREE_RESTARTS)
        .find_map(|_| random_fleet(config.size, &sorted, REFEREE_RETRIES, &mut rng))
        .map(|(_, placements)| placements)
        .ok_or_else(|| SelfPlayError::RefereeLayout {
            lengths: config.lengths.clone(),
            size: config.size,
        })?;
    let mut referee = OwnFleet::new(config.size, &placements, SinkRule::AllSegments);
    let fleet = referee.ships().iter().map(|s| s.cells.clone()).collect();

    let mut engine_config = config.engine.clone();
    engine_config.seed = seed;
    let mut engine = Engine::new(engine_config);
    engine.new_match(config.size, &config.lengths)?;

    let mut shot_log = Vec::new();
    let mut won = false;
    for _ in 0..config.size * config.size {
        let mv = match engine.next_move() {
            Ok(mv) => mv,
            Err(EngineError::NoMovesLeft) => break,
            Err(e) => return Err(e.into()),
        };
        let outcome = match referee.strike(Coord::new(mv.x, mv.y)) {
            Strike::Miss | Strike::Repeat => Outcome::Miss,
            Strike::Hit { .. } => Outcome::Hit,
            Strike::Sunk { .. } => Outcome::Sunk,
        };
        shot_log.push(ShotRecord {
            x: mv.x,
            y: mv.y,
            outcome,
            guaranteed: mv.is_guaranteed,
        });
        let report = engine.apply_outcome(mv.x, mv.y, outcome)?;
        if report.won {
            won = true;
            break;
        }
    }

    let hits = shot_log.iter().filter(|s| s.outcome != Outcome::Miss).count();
    let guaranteed_hits = shot_log
        .iter()
        .filter(|s| s.guaranteed && s.outcome != Outcome::Miss)
        .count();
    Ok(GameRecord {
        game_id,
        seed,
        size: config.size,
        won,
        shots: shot_log.len(),
        hits,
        guaranteed_hits,
        elapsed_ms: start.elapsed().as_millis() as u64,
        fleet,
        shot_log,
    })
}

/// Runs self-play and collects every finished game.
pub fn run_self_play(config: &SelfPlayConfig) -> Result<Vec<GameRecord>, SelfPlayError> {
    let mut games = Vec::with_capacity(config.num_games);
    run_self_play_with_callback(config, |game| games.push(game))?;
    games.sort_by_key(|g| g.game_id);
    Ok(games)
}

/// Runs self-play, calling `on_game` with each completed game record.
///
/// Games that fail are logged and skipped.
pub fn run_self_play_with_callback<F>(config: &SelfPlayConfig, on_game: F) -> Result<(), SelfPlayError>
where
    F: FnMut(GameRecord) + Send,
{
    if config.threads > 1 {
        run_self_play_parallel(config, on_game)
    } else {
        run_self_play_sequential(config, on_game);
        Ok(())
    }
}

fn report_game(config: &SelfPlayConfig, n: usize, game: &GameRecord) {
    if config.quiet {
        return;
    }
    eprintln!(
        "Game {}/{}: {} in {} shots, {} guaranteed ({:.1}s)",
        n,
        config.num_games,
        if game.won { "cleared" } else { "unfinished" },
        game.shots,
        game.guaranteed_hits,
        game.elapsed_ms as f64 / 1000.0,
    );
}

fn run_self_play_sequential<F>(config: &SelfPlayConfig, mut on_game: F)
where
    F: FnMut(GameRecord),
{
    for i in 0..config.num_games {
        let seed = game_seed(config, i);
        match play_game(config, i, seed) {
            Ok(game) => {
                report_game(config, i + 1, &game);
                on_game(game);
            }
            Err(e) => warn!(game = i, seed, error = %e, "self-play game failed"),
        }
    }
}

/// Plays games concurrently on a dedicated rayon pool and delivers them to
/// the callback on the calling thread.
fn run_self_play_parallel<F>(config: &SelfPlayConfig, mut on_game: F) -> Result<(), SelfPlayError>
where
    F: FnMut(GameRecord) + Send,
{
    use rayon::prelude::*;
    use std::sync::mpsc;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .build()?;
    let (tx, rx) = mpsc::channel::<GameRecord>();

    let config_clone = config.clone();
    let handle = std::thread::spawn(move || {
        let completed = AtomicUsize::new(0);
        pool.install(|| {
            (0..config_clone.num_games)
                .into_par_iter()
                .for_each_with(tx, |tx, i| {
                    let seed = game_seed(&config_clone, i);
                    match play_game(&config_clone, i, seed) {
                        Ok(game) => {
                            let n = completed.fetch_add(1, Ordering::Relaxed) + 1;
                            report_game(&config_clone, n, &game);
                            let _ = tx.send(game);
                        }
                        Err(e) => warn!(game = i, seed, error = %e, "self-play game failed"),
                    }
                });
        });
    });

    for game in rx {
        on_game(game);
    }
    handle.join().map_err(|_| SelfPlayError::WorkerPanicked)
}

/// Writes game records as JSONL, one game per line.
pub fn write_jsonl<W: Write>(games: &[GameRecord], out: &mut W) -> std::io::Result<()> {
    for game in games {
        serde_json::to_writer(&mut *out, game)?;
        writeln!(out)?;
    }
    out.flush()
}

/// Aggregate numbers over a set of games.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Summary {
    pub games: usize,
    pub cleared: usize,
    pub mean_shots: f64,
    pub min_shots: usize,
    pub max_shots: usize,
    pub mean_guaranteed: f64,
}

pub fn summarize(games: &[GameRecord]) -> Summary {
    let cleared: Vec<&GameRecord> = games.iter().filter(|g| g.won).collect();
    if cleared.is_empty() {
        return Summary {
            games: games.len(),
            ..Summary::default()
        };
    }
    let n = cleared.len() as f64;
    Summary {
        games: games.len(),
        cleared: cleared.len(),
        mean_shots: cleared.iter().map(|g| g.shots as f64).sum::<f64>() / n,
        min_shots: cleared.iter().map(|g| g.shots).min().unwrap_or(0),
        max_shots: cleared.iter().map(|g| g.shots).max().unwrap_or(0),
        mean_guaranteed: cleared.iter().map(|g| g.guaranteed_hits as f64).sum::<f64>() / n,
    }
}

/// Prints a summary of the games to stderr.
pub fn print_summary(games: &[GameRecord]) {
    let s = summarize(games);
    eprintln!("\n=== Self-play summary ===");
    eprintln!("Games: {} ({} cleared)", s.games, s.cleared);
    if s.cleared > 0 {
        eprintln!(
            "Shots to clear: mean {:.1}, min {}, max {}",
            s.mean_shots, s.min_shots, s.max_shots
        );
        eprintln!("Guaranteed hits per game: {:.2}", s.mean_guaranteed);
    }
}
