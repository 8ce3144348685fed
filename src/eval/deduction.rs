//! Exact deduction over unknown pockets.
//!
//! A pocket is a maximal 4-connected region of `Unknown` cells. When the
//! unknown area equals the remaining ship-cell budget exactly, every pocket
//! must be tiled completely by remaining ships; a pocket whose tiling is
//! unique yields cells that are proven ship segments. Unlike the density
//! estimator, anything returned here is a certainty under the rules.

use crate::board::fleet::FleetLedger;
use crate::board::grid::{Board, CellState, Coord};
use crate::board::placement::{all_placements, fits_evidence, Orientation, Placement};

/// Tiling enumeration stops once this many solutions are found.
const AMBIGUOUS: usize = 2;

/// All pockets in row-major order of their first cell.
pub fn find_pockets(board: &Board) -> Vec<Vec<Coord>> {
    let mut seen = vec![false; board.area()];
    let mut pockets = Vec::new();
    for c in board.coords() {
        let idx = c.index(board.size());
        if seen[idx] || board.get(c) != CellState::Unknown {
            continue;
        }
        let region = board.connected_region(c, CellState::Unknown);
        for r in &region {
            seen[r.index(board.size())] = true;
        }
        pockets.push(region);
    }
    pockets
}

/// Every multiset drawn from `lengths` (sorted longest first) that sums to
/// `target`. Equal lengths at the same depth are branched on once.
pub fn length_multisets(lengths: &[usize], target: usize) -> Vec<Vec<usize>> {
    fn walk(
        lengths: &[usize],
        start: usize,
        left: usize,
        current: &mut Vec<usize>,
        out: &mut Vec<Vec<usize>>,
    ) {
        if left == 0 {
            out.push(current.clone());
            return;
        }
        for i in start..lengths.len() {
            if i > start && lengths[i] == lengths[i - 1] {
                continue;
            }
            if lengths[i] > left {
                continue;
            }
            current.push(lengths[i]);
            walk(lengths, i + 1, left - lengths[i], current, out);
            current.pop();
        }
    }

    let mut sorted = lengths.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    let mut out = Vec::new();
    if target > 0 {
        walk(&sorted, 0, target, &mut Vec::new(), &mut out);
    }
    out
}

/// Outcome of tiling one pocket with a fixed multiset of ships.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tiling {
    None,
    Unique(Vec<Placement>),
    Ambiguous,
}

/// Tiles `pocket` exactly with `ships`, stopping at the second solution.
pub fn tile_pocket(size: usize, pocket: &[Coord], ships: &[usize]) -> Tiling {
    let mut inside = vec![false; size * size];
    for c in pocket {
        inside[c.index(size)] = true;
    }
    let mut order: Vec<usize> = pocket.iter().map(|c| c.index(size)).collect();
    order.sort_unstable();

    let mut solver = TileSolver {
        size,
        inside,
        covered: vec![false; size * size],
        order,
        remaining: ships.to_vec(),
        current: Vec::with_capacity(ships.len()),
        first: None,
        found: 0,
    };
    solver.remaining.sort_unstable_by(|a, b| b.cmp(a));
    solver.search();

    match (solver.found, solver.first) {
        (1, Some(placements)) => Tiling::Unique(placements),
        (0, _) => Tiling::None,
        _ => Tiling::Ambiguous,
    }
}

struct TileSolver {
    size: usize,
    inside: Vec<bool>,
    covered: Vec<bool>,
    /// Pocket cell indices, ascending.
    order: Vec<usize>,
    /// Ship lengths still to place, longest first.
    remaining: Vec<usize>,
    current: Vec<Placement>,
    first: Option<Vec<Placement>>,
    found: usize,
}

impl TileSolver {
    fn search(&mut self) {
        if self.found >= AMBIGUOUS {
            return;
        }
        let Some(&start) = self.order.iter().find(|&&i| !self.covered[i]) else {
            if self.remaining.is_empty() {
                self.found += 1;
                if self.first.is_none() {
                    self.first = Some(self.current.clone());
                }
            }
            return;
        };
        let origin = Coord::from_index(start, self.size);

        for i in 0..self.remaining.len() {
            if i > 0 && self.remaining[i] == self.remaining[i - 1] {
                continue;
            }
            let length = self.remaining[i];
            for &orientation in Orientation::for_length(length) {
                let placement = Placement::new(origin, length, orientation);
                if !self.fits(&placement) {
                    continue;
                }
                self.set(&placement, true);
                self.remaining.remove(i);
                self.current.push(placement);

                self.search();

                self.current.pop();
                self.remaining.insert(i, length);
                self.set(&placement, false);
                if self.found >= AMBIGUOUS {
                    return;
                }
            }
        }
    }

    fn fits(&self, placement: &Placement) -> bool {
        placement.in_bounds(self.size)
            && placement.cells().all(|c| {
                let idx = c.index(self.size);
                self.inside[idx] && !self.covered[idx]
            })
    }

    fn set(&mut self, placement: &Placement, value: bool) {
        for c in placement.cells() {
            self.covered[c.index(self.size)] = value;
        }
    }
}

/// Returns a cell that is provably a ship segment, if one can be deduced.
///
/// Requires that no unresolved `Hit` cells exist, since those already
/// account for part of the remaining ship-cell budget.
pub fn find_guaranteed_hit(board: &Board, ledger: &FleetLedger) -> Option<Coord> {
    let ship_cells = ledger.remaining_cells();
    if ship_cells == 0 || board.count(CellState::Hit) > 0 {
        return None;
    }
    let pockets = find_pockets(board);
    let unknown: usize = pockets.iter().map(Vec::len).sum();
    if unknown != ship_cells {
        return None;
    }

    let lengths = ledger.remaining_lengths();
    for pocket in &pockets {
        let multisets = length_multisets(&lengths, pocket.len());
        if multisets.len() != 1 {
            continue;
        }
        if let Tiling::Unique(placements) = tile_pocket(board.size(), pocket, &multisets[0]) {
            if let Some(first) = placements.first() {
                return Some(first.origin);
            }
        }
    }
    None
}

/// Marks `Unknown` cells that no remaining ship can cover as `Water`.
///
/// Returns the cells changed, in row-major order.
pub fn eliminate_unreachable(board: &mut Board, ledger: &FleetLedger) -> Vec<Coord> {
    let size = board.size();
    let mut reachable = vec![false; board.area()];
    for entry in ledger.entries().iter().filter(|e| e.remaining > 0) {
        for placement in all_placements(size, entry.length) {
            if fits_evidence(board, &placement) {
                for c in placement.cells() {
                    reachable[c.index(size)] = true;
                }
            }
        }
    }

    let unreachable: Vec<Coord> = board
        .coords_in(CellState::Unknown)
        .filter(|c| !reachable[c.index(size)])
        .collect();
    for &c in &unreachable {
        board.set(c, CellState::Water);
    }
    unreachable
}
