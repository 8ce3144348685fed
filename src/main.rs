//! Broadside -- a battleship decision engine speaking a line protocol.
//!
//! This binary reads commands from stdin and writes one reply line per
//! command to stdout. Logs go to stderr, filtered by `RUST_LOG`.

use std::io::{self, BufRead, Write};

use broadside::engine::{Engine, EngineError, Snapshot};
use broadside::protocol::parser::{parse_command, Command};
use broadside::protocol::response::{
    board_rows, write_error, write_info, write_json, write_keyword, write_raw, ResponseError,
};

/// Runs the main protocol loop, reading commands from stdin and writing
/// responses to stdout.
fn main() -> Result<(), ResponseError> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    let mut engine = Engine::default();
    // Snapshots taken before every outcome and strike, newest last.
    let mut history: Vec<Snapshot> = Vec::new();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };

        let cmd = match parse_command(&line) {
            Some(c) => c,
            None => continue,
        };

        match cmd {
            Command::IsReady => write_keyword(&mut out, "readyok")?,
            Command::SetOption { name, value } => {
                if let Err(e) = engine.set_option(&name, value.as_deref()) {
                    write_error(&mut out, &e.to_string())?;
                }
            }
            Command::NewMatch { size, lengths } => {
                history.clear();
                match engine.new_match(size, &lengths) {
                    Ok(grid) => write_json(&mut out, "layout", &grid)?,
                    Err(e) => write_error(&mut out, &e.to_string())?,
                }
            }
            Command::Go => match engine.next_move() {
                Ok(mv) => {
                    if let Some(report) = engine.last_search() {
                        write_info(&mut out, &report)?;
                    }
                    write_json(&mut out, "move", &mv)?;
                }
                Err(e) => write_error(&mut out, &e.to_string())?,
            },
            Command::Outcome { x, y, outcome } => {
                history.push(engine.snapshot());
                match engine.apply_outcome(x, y, outcome) {
                    Ok(report) => write_json(&mut out, "update", &report)?,
                    Err(e) => {
                        // A ledger mismatch still records the hit; keep it undoable.
                        if !matches!(e, EngineError::InconsistentSunk { .. }) {
                            history.pop();
                        }
                        write_error(&mut out, &e.to_string())?;
                    }
                }
            }
            Command::Strike { x, y } => {
                history.push(engine.snapshot());
                match engine.apply_strike_on_own_board(x, y) {
                    Ok(report) => write_json(&mut out, "strike", &report)?,
                    Err(e) => {
                        history.pop();
                        write_error(&mut out, &e.to_string())?;
                    }
                }
            }
            Command::Undo => match history.pop() {
                Some(snapshot) => {
                    engine.restore(snapshot);
                    write_keyword(&mut out, "undone")?;
                }
                None => write_error(&mut out, "nothing to undo")?,
            },
            Command::Board => match engine.opponent_board() {
                Ok(board) => write_json(&mut out, "board", &board_rows(board))?,
                Err(e) => write_error(&mut out, &e.to_string())?,
            },
            Command::Profile => match engine.opponent_profile() {
                Ok(blob) => write_raw(&mut out, "profile", &blob)?,
                Err(e) => write_error(&mut out, &e.to_string())?,
            },
            Command::LoadProfile { json } => match engine.load_opponent_profile(&json) {
                Ok(()) => write_keyword(&mut out, "profileok")?,
                Err(e) => write_error(&mut out, &e.to_string())?,
            },
            Command::Quit => break,
        }
        out.flush()?;
    }
    Ok(())
}
