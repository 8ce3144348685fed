//! Engine-to-host response lines.
//!
//! Every reply is a single line: a keyword, optionally followed by one JSON
//! value. Search statistics go out as `info iterations N time T mode M`.

use std::io::{self, Write};

use serde::Serialize;

use crate::board::grid::{Board, CellState};
use crate::engine::SearchReport;

#[derive(Debug, thiserror::Error)]
pub enum ResponseError {
    #[error("write failed: {0}")]
    Io(#[from] io::Error),

    #[error("could not encode response: {0}")]
    Json(#[from] serde_json::Error),
}

/// Writes a keyword with no payload.
pub fn write_keyword<W: Write>(out: &mut W, keyword: &str) -> Result<(), ResponseError> {
    writeln!(out, "{}", keyword)?;
    Ok(())
}

/// Writes `<keyword> <json>`.
pub fn write_json<W: Write, T: Serialize + ?Sized>(
    out: &mut W,
    keyword: &str,
    value: &T,
) -> Result<(), ResponseError> {
    let json = serde_json::to_string(value)?;
    writeln!(out, "{} {}", keyword, json)?;
    Ok(())
}

/// Writes a pre-encoded JSON payload, such as a profile blob.
pub fn write_raw<W: Write>(out: &mut W, keyword: &str, json: &str) -> Result<(), ResponseError> {
    writeln!(out, "{} {}", keyword, json)?;
    Ok(())
}

/// Writes `error {"message": ...}`.
pub fn write_error<W: Write>(out: &mut W, message: &str) -> Result<(), ResponseError> {
    #[derive(Serialize)]
    struct ErrorBody<'a> {
        message: &'a str,
    }
    write_json(out, "error", &ErrorBody { message })
}

/// Writes the planner statistics of the last search.
pub fn write_info<W: Write>(out: &mut W, report: &SearchReport) -> Result<(), ResponseError> {
    write!(
        out,
        "info iterations {} time {} mode {}",
        report.stats.iterations, report.stats.elapsed_ms, report.mode
    )?;
    if report.stats.timed_out {
        write!(out, " ceiling")?;
    }
    writeln!(out)?;
    Ok(())
}

/// Opponent board as rows of cell states, top row first.
pub fn board_rows(board: &Board) -> Vec<Vec<CellState>> {
    board
        .cells()
        .chunks(board.size().max(1))
        .map(|row| row.to_vec())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::grid::Coord;
    use crate::search::{PlannerStats, TacticalMode};

    fn written(f: impl FnOnce(&mut Vec<u8>) -> Result<(), ResponseError>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn json_lines() {
        let out = written(|w| write_json(w, "layout", &[0u8, 1, 1]));
        assert_eq!(out, "layout [0,1,1]\n");
        let out = written(|w| write_error(w, "no match in progress"));
        assert_eq!(out, "error {\"message\":\"no match in progress\"}\n");
        let out = written(|w| write_keyword(w, "readyok"));
        assert_eq!(out, "readyok\n");
    }

    #[test]
    fn info_line_format() {
        let report = SearchReport {
            stats: PlannerStats {
                iterations: 812,
                nodes: 90,
                elapsed_ms: 250,
                timed_out: false,
            },
            mode: TacticalMode::Balanced,
        };
        let out = written(|w| write_info(w, &report));
        assert_eq!(out, "info iterations 812 time 250 mode balanced\n");
    }

    #[test]
    fn board_rows_are_row_major() {
        let mut board = Board::new(3);
        board.set(Coord::new(2, 0), CellState::Hit);
        board.set(Coord::new(0, 1), CellState::Miss);
        let rows = board_rows(&board);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0][2], CellState::Hit);
        assert_eq!(rows[1][0], CellState::Miss);
        let json = serde_json::to_string(&rows[1]).unwrap();
        assert_eq!(json, r#"["miss","unknown","unknown"]"#);
    }
}
