//! Hunt/target state machine.
//!
//! In `Hunt` the engine searches open water; the first hit switches to
//! `Target`, where candidate cells around the current run of hits are
//! queued. The queue is always rebuilt from the tracked hits rather than
//! appended to, so it never holds stale or duplicate cells.

use std::cmp::Reverse;
use std::collections::VecDeque;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::board::fleet::{FleetLedger, LedgerError};
use crate::board::grid::{Board, CellState, Coord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetMode {
    #[default]
    Hunt,
    Target,
}

/// A sunk report that the ledger could not account for.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("sunk ship of length {length} does not match the remaining fleet: {source}")]
pub struct SunkMismatch {
    pub length: usize,
    pub cells: Vec<Coord>,
    pub source: LedgerError,
}

/// Board changes caused by a confirmed sinking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SunkShip {
    pub cells: Vec<Coord>,
    /// Cells around the ship newly ruled out.
    pub cleared: Vec<Coord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Targeting {
    mode: TargetMode,
    hits: Vec<Coord>,
    queue: VecDeque<Coord>,
}

impl Targeting {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> TargetMode {
        self.mode
    }

    /// Unresolved hits on the ship currently targeted.
    pub fn hits(&self) -> &[Coord] {
        &self.hits
    }

    pub fn queue(&self) -> &VecDeque<Coord> {
        &self.queue
    }

    /// Next queued cell, if the machine is targeting and one is left.
    pub fn peek(&self) -> Option<Coord> {
        match self.mode {
            TargetMode::Target => self.queue.front().copied(),
            TargetMode::Hunt => None,
        }
    }

    /// Drops any target state and returns to `Hunt`.
    pub fn reset_to_hunt(&mut self) {
        self.mode = TargetMode::Hunt;
        self.hits.clear();
        self.queue.clear();
    }

    /// Records a miss. An exhausted queue falls back to `Hunt`.
    pub fn on_miss(&mut self, board: &Board) {
        if self.mode != TargetMode::Target {
            return;
        }
        self.rebuild(board);
        if self.queue.is_empty() {
            self.reset_to_hunt();
        }
    }

    /// Records a hit; the cell must already be marked `Hit` on `board`.
    pub fn on_hit(&mut self, c: Coord, board: &Board) {
        if !self.hits.contains(&c) {
            self.hits.push(c);
        }
        self.mode = TargetMode::Target;
        self.rebuild(board);
    }

    /// Resolves a sunk report at `c` (already marked `Hit` on `board`).
    ///
    /// The ship's extent is the 4-connected `Hit` region through `c`. The
    /// ledger is checked before anything else changes; on a mismatch the
    /// cells stay `Hit`, the machine stays in `Target` and nothing is
    /// decremented.
    pub fn on_sunk(
        &mut self,
        c: Coord,
        board: &mut Board,
        ledger: &mut FleetLedger,
    ) -> Result<SunkShip, SunkMismatch> {
        let mut cells = board.connected_region(c, CellState::Hit);
        cells.sort();

        if let Err(source) = ledger.confirm_sunk(cells.len()) {
            if !self.hits.contains(&c) {
                self.hits.push(c);
            }
            self.mode = TargetMode::Target;
            self.rebuild(board);
            return Err(SunkMismatch {
                length: cells.len(),
                cells,
                source,
            });
        }

        for &s in &cells {
            board.set(s, CellState::Sunk);
        }
        let cleared = board.mark_surrounding_miss(&cells);

        self.hits.retain(|h| !cells.contains(h));
        if self.hits.is_empty() {
            self.reset_to_hunt();
        } else {
            self.rebuild(board);
            if self.queue.is_empty() {
                self.reset_to_hunt();
            }
        }
        Ok(SunkShip { cells, cleared })
    }

    /// Rebuilds the queue after the board changed outside a shot, e.g. when
    /// unreachable cells were marked `Water`. The mode is left alone.
    pub fn refresh(&mut self, board: &Board) {
        if self.mode == TargetMode::Target {
            self.rebuild(board);
        }
    }

    fn rebuild(&mut self, board: &Board) {
        self.queue = target_candidates(&self.hits, board);
    }
}

/// Candidate cells for a run of unresolved hits.
///
/// One hit: its unknown orthogonal neighbors. Two or more on one line: the
/// unknown gaps between the extremes, then the cells just past each end.
/// Hits off a single line: the union of their unknown neighbors, cells
/// touching more hits first.
pub fn target_candidates(hits: &[Coord], board: &Board) -> VecDeque<Coord> {
    let size = board.size();
    let unknown = |c: &Coord| board.get(*c) == CellState::Unknown;
    let mut out: VecDeque<Coord> = VecDeque::new();

    match hits {
        [] => {}
        [only] => out.extend(only.orthogonal(size).filter(unknown)),
        [first, rest @ ..] => {
            let horizontal = rest.iter().all(|h| h.y == first.y);
            let vertical = rest.iter().all(|h| h.x == first.x);
            if horizontal || vertical {
                let key = |h: &Coord| if horizontal { h.x } else { h.y };
                let lo = hits.iter().map(key).min().unwrap_or(0);
                let hi = hits.iter().map(key).max().unwrap_or(0);
                let at = |k: usize| {
                    if horizontal {
                        Coord::new(k, first.y)
                    } else {
                        Coord::new(first.x, k)
                    }
                };
                out.extend((lo..=hi).map(at).filter(unknown));
                if lo > 0 && unknown(&at(lo - 1)) {
                    out.push_back(at(lo - 1));
                }
                if hi + 1 < size && unknown(&at(hi + 1)) {
                    out.push_back(at(hi + 1));
                }
            } else {
                for h in hits {
                    for n in h.orthogonal(size).filter(unknown) {
                        if !out.contains(&n) {
                            out.push_back(n);
                        }
                    }
                }
                let touching =
                    |c: &Coord| c.orthogonal(size).filter(|n| hits.contains(n)).count();
                out.make_contiguous()
                    .sort_by_key(|c| Reverse(touching(c)));
            }
        }
    }
    out
}

/// Opening move: one of the four cells around the board center, uniformly.
pub fn opening_move<R: Rng>(size: usize, rng: &mut R) -> Coord {
    let half = size / 2;
    let candidates: Vec<Coord> = if size % 2 == 0 && size >= 2 {
        vec![
            Coord::new(half - 1, half - 1),
            Coord::new(half, half - 1),
            Coord::new(half - 1, half),
            Coord::new(half, half),
        ]
    } else {
        Coord::new(half, half).orthogonal(size).collect()
    };
    if candidates.is_empty() {
        return Coord::new(half, half);
    }
    candidates[rng.gen_range(0..candidates.len())]
}
