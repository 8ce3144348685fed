//! Placement-count density estimation.
//!
//! For every remaining opponent ship (each unit counted once, not once per
//! distinct length) and every placement that fits the evidence, each covered
//! cell gets one point. The result is a heuristic ranking, not a probability:
//! placements are counted independently and ships are never combined.
//!
//! Parity damping then scales down cells whose `(x + y) mod m` is nonzero,
//! where `m` is the smallest remaining length. Any ship of length `m` must
//! cross a cell of residue zero, so those cells are tried first. This is a
//! search-order heuristic only; damped cells keep a nonzero score and remain
//! valid fallbacks.

use crate::board::fleet::FleetLedger;
use crate::board::grid::{Board, CellState, Coord};
use crate::board::placement::{all_placements, fits_evidence};

/// Per-cell placement scores for one board state.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityMap {
    size: usize,
    scores: Vec<f64>,
}

impl DensityMap {
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    #[inline]
    pub fn get(&self, c: Coord) -> f64 {
        self.scores[c.index(self.size)]
    }

    /// Multiplies every score by `factor(c)`.
    pub fn scale(&mut self, factor: impl Fn(Coord) -> f64) {
        let size = self.size;
        for (i, s) in self.scores.iter_mut().enumerate() {
            *s *= factor(Coord::from_index(i, size));
        }
    }

    /// Damps cells off the parity lattice of `modulus`. No-op for modulus < 2.
    pub fn apply_parity(&mut self, modulus: usize, damping: f64) {
        if modulus < 2 {
            return;
        }
        self.scale(|c| {
            if (c.x + c.y) % modulus == 0 {
                1.0
            } else {
                damping
            }
        });
    }

    /// `Unknown` cells with a positive score, best first.
    ///
    /// Ties break toward the lower row-major index so the order is stable.
    pub fn ranked(&self, board: &Board) -> Vec<Coord> {
        let mut cells: Vec<(usize, f64)> = self
            .scores
            .iter()
            .enumerate()
            .filter(|&(i, &s)| s > 0.0 && board.get_index(i) == CellState::Unknown)
            .map(|(i, &s)| (i, s))
            .collect();
        cells.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        cells
            .into_iter()
            .map(|(i, _)| Coord::from_index(i, self.size))
            .collect()
    }

    /// Highest-scoring `Unknown` cell, if any has a positive score.
    pub fn best(&self, board: &Board) -> Option<Coord> {
        let mut best: Option<(usize, f64)> = None;
        for (i, &s) in self.scores.iter().enumerate() {
            if s <= 0.0 || board.get_index(i) != CellState::Unknown {
                continue;
            }
            if best.map_or(true, |(_, bs)| s > bs) {
                best = Some((i, s));
            }
        }
        best.map(|(i, _)| Coord::from_index(i, self.size))
    }
}

/// Raw placement counts, without parity damping.
pub fn placement_counts(board: &Board, ledger: &FleetLedger) -> DensityMap {
    let size = board.size();
    let mut scores = vec![0.0; board.area()];
    for entry in ledger.entries() {
        if entry.remaining == 0 {
            continue;
        }
        let weight = entry.remaining as f64;
        for placement in all_placements(size, entry.length) {
            if !fits_evidence(board, &placement) {
                continue;
            }
            for c in placement.cells() {
                scores[c.index(size)] += weight;
            }
        }
    }
    DensityMap { size, scores }
}

/// Placement counts with parity damping on the smallest remaining length.
pub fn estimate_density(board: &Board, ledger: &FleetLedger, parity_damping: f64) -> DensityMap {
    let mut map = placement_counts(board, ledger);
    if let Some(m) = ledger.smallest_remaining() {
        map.apply_parity(m, parity_damping);
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_beats_corner_on_empty_board() {
        let board = Board::new(10);
        let ledger = FleetLedger::new(&[5, 4, 3, 3, 2]);
        let map = placement_counts(&board, &ledger);
        assert!(map.get(Coord::new(4, 4)) > map.get(Coord::new(0, 0)));
    }

    #[test]
    fn duplicate_lengths_count_per_unit() {
        let board = Board::new(6);
        let one = placement_counts(&board, &FleetLedger::new(&[3]));
        let two = placement_counts(&board, &FleetLedger::new(&[3, 3]));
        for (a, b) in one.scores().iter().zip(two.scores()) {
            assert_eq!(a * 2.0, *b);
        }
    }

    #[test]
    fn corner_count_for_single_ship() {
        // A length-2 ship covers (0,0) in one horizontal and one vertical placement.
        let board = Board::new(10);
        let map = placement_counts(&board, &FleetLedger::new(&[2]));
        assert_eq!(map.get(Coord::new(0, 0)), 2.0);
        assert_eq!(map.get(Coord::new(1, 1)), 4.0);
    }

    #[test]
    fn misses_block_placements() {
        let mut board = Board::new(10);
        board.set(Coord::new(1, 0), CellState::Miss);
        board.set(Coord::new(0, 1), CellState::Miss);
        let map = placement_counts(&board, &FleetLedger::new(&[2]));
        assert_eq!(map.get(Coord::new(0, 0)), 0.0);
        assert_eq!(map.get(Coord::new(1, 0)), 0.0);
    }

    #[test]
    fn parity_damps_but_keeps_off_lattice_cells() {
        let board = Board::new(10);
        let ledger = FleetLedger::new(&[3, 2]);
        let raw = placement_counts(&board, &ledger);
        let damped = estimate_density(&board, &ledger, 0.1);
        let on = Coord::new(4, 4);
        let off = Coord::new(4, 5);
        assert_eq!(damped.get(on), raw.get(on));
        assert!((damped.get(off) - raw.get(off) * 0.1).abs() < 1e-9);
        assert!(damped.get(off) > 0.0);
    }

    #[test]
    fn ranked_skips_resolved_cells_and_is_ordered() {
        let mut board = Board::new(8);
        board.set(Coord::new(3, 3), CellState::Hit);
        let map = estimate_density(&board, &FleetLedger::new(&[4, 3]), 0.1);
        let ranked = map.ranked(&board);
        assert!(!ranked.contains(&Coord::new(3, 3)));
        for w in ranked.windows(2) {
            assert!(map.get(w[0]) >= map.get(w[1]));
        }
        assert_eq!(map.best(&board), ranked.first().copied());
    }

    #[test]
    fn empty_ledger_has_no_best() {
        let board = Board::new(5);
        let map = estimate_density(&board, &FleetLedger::new(&[]), 0.1);
        assert_eq!(map.best(&board), None);
        assert!(map.ranked(&board).is_empty());
    }
}
