//! Host command parser.
//!
//! Parses incoming protocol lines into structured `Command` variants that
//! the main loop can dispatch on.

use crate::board::FleetPreset;
use crate::engine::Outcome;

/// A parsed host-to-engine command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Synchronization ping; engine must reply `readyok`.
    IsReady,

    /// Set an engine option: `setoption name <id> [value <x>]`.
    SetOption { name: String, value: Option<String> },

    /// Start a match: `newmatch <size> [l1,l2,...]`. Without lengths the
    /// preset fleet for the board size is used.
    NewMatch { size: usize, lengths: Vec<usize> },

    /// Ask for the next shot.
    Go,

    /// Report the result of the engine's shot: `outcome <x> <y> <miss|hit|sunk>`.
    Outcome { x: usize, y: usize, outcome: Outcome },

    /// Opponent fires at the engine's own board: `strike <x> <y>`.
    Strike { x: usize, y: usize },

    /// Revert the last outcome or strike.
    Undo,

    /// Print the opponent board as the engine sees it.
    Board,

    /// Print the opponent profile blob.
    Profile,

    /// Load a profile blob: `loadprofile <json>`.
    LoadProfile { json: String },

    /// Terminate the engine process.
    Quit,
}

/// Parses a single line of input into a `Command`.
///
/// Returns `None` for empty lines or unrecognized commands. Malformed
/// arguments for known commands also return `None` after logging to stderr.
pub fn parse_command(line: &str) -> Option<Command> {
    let trimmed = line.trim();
    let tokens: Vec<&str> = trimmed.split_whitespace().collect();
    let first = *tokens.first()?;

    match first {
        "isready" => Some(Command::IsReady),
        "go" => Some(Command::Go),
        "undo" => Some(Command::Undo),
        "board" => Some(Command::Board),
        "profile" => Some(Command::Profile),
        "quit" => Some(Command::Quit),

        "setoption" => parse_setoption(&tokens),
        "newmatch" => parse_newmatch(&tokens),
        "outcome" => parse_outcome(&tokens),
        "strike" => parse_strike(&tokens),
        "loadprofile" => parse_loadprofile(trimmed),

        other => {
            eprintln!("unknown command: {}", other);
            None
        }
    }
}

/// Parses `setoption name <id> [value <x>]`.
fn parse_setoption(tokens: &[&str]) -> Option<Command> {
    if tokens.len() < 3 || tokens[1] != "name" {
        eprintln!("malformed setoption: expected 'setoption name <id> [value <x>]'");
        return None;
    }

    let value_idx = tokens.iter().position(|&t| t == "value");
    let (name_parts, value_parts) = match value_idx {
        Some(vi) => (&tokens[2..vi], &tokens[vi + 1..]),
        None => (&tokens[2..], &tokens[tokens.len()..]),
    };
    if name_parts.is_empty() {
        eprintln!("malformed setoption: empty name");
        return None;
    }
    let value = (!value_parts.is_empty()).then(|| value_parts.join(" "));
    Some(Command::SetOption {
        name: name_parts.join(" "),
        value,
    })
}

/// Parses `newmatch <size> [l1,l2,...]`. Lengths may be separated by
/// commas, spaces or both.
fn parse_newmatch(tokens: &[&str]) -> Option<Command> {
    let Some(size) = tokens.get(1).and_then(|t| t.parse::<usize>().ok()) else {
        eprintln!("malformed newmatch: expected 'newmatch <size> [l1,l2,...]'");
        return None;
    };

    let mut lengths = Vec::new();
    for part in tokens[2..].iter().flat_map(|t| t.split(',')) {
        if part.is_empty() {
            continue;
        }
        match part.parse::<usize>() {
            Ok(l) => lengths.push(l),
            Err(_) => {
                eprintln!("invalid ship length: '{}'", part);
                return None;
            }
        }
    }

    if lengths.is_empty() {
        match FleetPreset::for_size(size) {
            Some(preset) => lengths = preset.ship_lengths().to_vec(),
            None => {
                eprintln!("no preset fleet for board size {}; give ship lengths", size);
                return None;
            }
        }
    }
    Some(Command::NewMatch { size, lengths })
}

fn parse_coords(tokens: &[&str], usage: &str) -> Option<(usize, usize)> {
    let x = tokens.get(1).and_then(|t| t.parse::<usize>().ok());
    let y = tokens.get(2).and_then(|t| t.parse::<usize>().ok());
    match (x, y) {
        (Some(x), Some(y)) => Some((x, y)),
        _ => {
            eprintln!("malformed {}", usage);
            None
        }
    }
}

/// Parses `outcome <x> <y> <miss|hit|sunk>`.
fn parse_outcome(tokens: &[&str]) -> Option<Command> {
    let (x, y) = parse_coords(tokens, "outcome: expected 'outcome <x> <y> <miss|hit|sunk>'")?;
    let Some(word) = tokens.get(3) else {
        eprintln!("malformed outcome: missing result");
        return None;
    };
    match word.parse::<Outcome>() {
        Ok(outcome) => Some(Command::Outcome { x, y, outcome }),
        Err(e) => {
            eprintln!("{}", e);
            None
        }
    }
}

/// Parses `strike <x> <y>`.
fn parse_strike(tokens: &[&str]) -> Option<Command> {
    let (x, y) = parse_coords(tokens, "strike: expected 'strike <x> <y>'")?;
    Some(Command::Strike { x, y })
}

/// Parses `loadprofile <json>`, keeping everything after the keyword.
fn parse_loadprofile(line: &str) -> Option<Command> {
    let json = line.strip_prefix("loadprofile").unwrap_or("").trim();
    if json.is_empty() {
        eprintln!("malformed loadprofile: expected 'loadprofile <json>'");
        return None;
    }
    Some(Command::LoadProfile {
        json: json.to_string(),
    })
}
