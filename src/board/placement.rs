//! Placement feasibility.
//!
//! Two checks share one `Placement` description:
//!
//! - `fits_evidence` asks whether an opponent ship could sit somewhere given
//!   what has been observed. It ignores other hypothetical ships entirely and
//!   is the hot path of every estimator, so it only touches the covered cells.
//! - `Occupancy::fits_apart` applies the no-touching rule against ships that
//!   are already placed, used for the engine's own fleet and for sampling
//!   complete candidate layouts.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::grid::{Board, CellState, Coord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    pub const BOTH: [Orientation; 2] = [Orientation::Horizontal, Orientation::Vertical];

    /// Orientations worth enumerating for a ship of `length`.
    /// A single-cell ship has only one distinct placement per anchor.
    pub fn for_length(length: usize) -> &'static [Orientation] {
        const SINGLE: &[Orientation] = &[Orientation::Horizontal];
        const PAIR: &[Orientation] = &[Orientation::Horizontal, Orientation::Vertical];
        if length <= 1 {
            SINGLE
        } else {
            PAIR
        }
    }
}

/// A ship of `length` anchored at its top/left end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Placement {
    pub origin: Coord,
    pub length: usize,
    pub orientation: Orientation,
}

impl Placement {
    pub const fn new(origin: Coord, length: usize, orientation: Orientation) -> Self {
        Placement {
            origin,
            length,
            orientation,
        }
    }

    /// Returns true if every covered cell lies on a board of `size`.
    pub fn in_bounds(&self, size: usize) -> bool {
        if self.length == 0 {
            return false;
        }
        match self.orientation {
            Orientation::Horizontal => self.origin.x + self.length <= size && self.origin.y < size,
            Orientation::Vertical => self.origin.y + self.length <= size && self.origin.x < size,
        }
    }

    /// Covered cells, from the anchor outward.
    pub fn cells(&self) -> impl Iterator<Item = Coord> {
        let Placement {
            origin,
            length,
            orientation,
        } = *self;
        (0..length).map(move |i| match orientation {
            Orientation::Horizontal => Coord::new(origin.x + i, origin.y),
            Orientation::Vertical => Coord::new(origin.x, origin.y + i),
        })
    }

    pub fn contains(&self, c: Coord) -> bool {
        match self.orientation {
            Orientation::Horizontal => {
                c.y == self.origin.y && c.x >= self.origin.x && c.x < self.origin.x + self.length
            }
            Orientation::Vertical => {
                c.x == self.origin.x && c.y >= self.origin.y && c.y < self.origin.y + self.length
            }
        }
    }
}

/// Every in-bounds placement of a ship of `length` on a board of `size`.
pub fn all_placements(size: usize, length: usize) -> impl Iterator<Item = Placement> {
    Orientation::for_length(length).iter().flat_map(move |&o| {
        (0..size * size).filter_map(move |i| {
            let p = Placement::new(Coord::from_index(i, size), length, o);
            p.in_bounds(size).then_some(p)
        })
    })
}

/// Returns false if any covered cell is off the board or already known to be
/// empty (`Miss`, `Water`) or part of a finished ship (`Sunk`).
pub fn fits_evidence(board: &Board, placement: &Placement) -> bool {
    placement.in_bounds(board.size())
        && placement.cells().all(|c| {
            !matches!(
                board.get(c),
                CellState::Miss | CellState::Water | CellState::Sunk
            )
        })
}

/// Coordinate-level form of [`fits_evidence`].
pub fn can_place(
    board: &Board,
    x: usize,
    y: usize,
    length: usize,
    orientation: Orientation,
) -> bool {
    fits_evidence(board, &Placement::new(Coord::new(x, y), length, orientation))
}

/// A bitset of ship cells on a square board.
///
/// Used for the engine's own fleet and for every sampled opponent layout, so
/// it is kept compact: one bit per cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Occupancy {
    size: usize,
    words: Vec<u64>,
}

impl Occupancy {
    pub fn new(size: usize) -> Self {
        Occupancy {
            size,
            words: vec![0; (size * size).div_ceil(64)],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn is_set(&self, idx: usize) -> bool {
        self.words[idx / 64] & (1u64 << (idx % 64)) != 0
    }

    #[inline]
    pub fn contains(&self, c: Coord) -> bool {
        self.is_set(c.index(self.size))
    }

    #[inline]
    fn set(&mut self, idx: usize) {
        self.words[idx / 64] |= 1u64 << (idx % 64);
    }

    #[inline]
    fn clear(&mut self, idx: usize) {
        self.words[idx / 64] &= !(1u64 << (idx % 64));
    }

    /// Number of occupied cells.
    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Occupied cell indices in ascending order.
    pub fn iter_set(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(wi, &w)| {
            let mut bits = w;
            std::iter::from_fn(move || {
                if bits == 0 {
                    return None;
                }
                let tz = bits.trailing_zeros() as usize;
                bits &= bits - 1;
                Some(wi * 64 + tz)
            })
        })
    }

    /// No-touch check: every covered cell and its 8-neighborhood must be free.
    pub fn fits_apart(&self, placement: &Placement) -> bool {
        if !placement.in_bounds(self.size) {
            return false;
        }
        placement.cells().all(|c| {
            !self.contains(c) && c.surrounding(self.size).all(|n| !self.contains(n))
        })
    }

    /// Marks the placement's cells as occupied. Does not check feasibility.
    pub fn place(&mut self, placement: &Placement) {
        for c in placement.cells() {
            self.set(c.index(self.size));
        }
    }

    /// Clears the placement's cells.
    pub fn remove(&mut self, placement: &Placement) {
        for c in placement.cells() {
            self.clear(c.index(self.size));
        }
    }

    /// Tries up to `retries` random anchors for one ship and places it on success.
    pub fn place_random<R: Rng>(
        &mut self,
        length: usize,
        retries: usize,
        rng: &mut R,
    ) -> Option<Placement> {
        if length == 0 || length > self.size {
            return None;
        }
        for _ in 0..retries {
            let orientation = if rng.gen::<bool>() {
                Orientation::Horizontal
            } else {
                Orientation::Vertical
            };
            let (max_x, max_y) = match orientation {
                Orientation::Horizontal => (self.size - length + 1, self.size),
                Orientation::Vertical => (self.size, self.size - length + 1),
            };
            let origin = Coord::new(rng.gen_range(0..max_x), rng.gen_range(0..max_y));
            let placement = Placement::new(origin, length, orientation);
            if self.fits_apart(&placement) {
                self.place(&placement);
                return Some(placement);
            }
        }
        None
    }
}

/// Places every length (in the given order) with the no-touch rule.
///
/// Returns the placements in input order, or `None` as soon as one ship
/// cannot be seated within `retries` random attempts.
pub fn random_fleet<R: Rng>(
    size: usize,
    lengths: &[usize],
    retries: usize,
    rng: &mut R,
) -> Option<(Occupancy, Vec<Placement>)> {
    let mut occ = Occupancy::new(size);
    let mut placements = Vec::with_capacity(lengths.len());
    for &len in lengths {
        placements.push(occ.place_random(len, retries, rng)?);
    }
    Some((occ, placements))
}

/// Combined validity check for a full fleet: in bounds, no overlap, no touching.
pub fn is_valid_fleet(size: usize, placements: &[Placement]) -> bool {
    if placements.iter().any(|p| !p.in_bounds(size)) {
        return false;
    }
    for (i, a) in placements.iter().enumerate() {
        for b in &placements[i + 1..] {
            let touching = a
                .cells()
                .any(|ca| b.cells().any(|cb| ca.chebyshev(cb) <= 1));
            if touching {
                return false;
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn h(x: usize, y: usize, len: usize) -> Placement {
        Placement::new(Coord::new(x, y), len, Orientation::Horizontal)
    }

    fn v(x: usize, y: usize, len: usize) -> Placement {
        Placement::new(Coord::new(x, y), len, Orientation::Vertical)
    }

    #[test]
    fn placement_bounds() {
        assert!(h(5, 0, 5).in_bounds(10));
        assert!(!h(6, 0, 5).in_bounds(10));
        assert!(v(9, 5, 5).in_bounds(10));
        assert!(!v(9, 6, 5).in_bounds(10));
    }

    #[test]
    fn evidence_blocks_miss_water_and_sunk_but_not_hit() {
        let mut board = Board::new(10);
        assert!(can_place(&board, 0, 0, 3, Orientation::Horizontal));
        board.set(Coord::new(1, 0), CellState::Hit);
        assert!(can_place(&board, 0, 0, 3, Orientation::Horizontal));
        for blocker in [CellState::Miss, CellState::Water, CellState::Sunk] {
            board.set(Coord::new(1, 0), blocker);
            assert!(!can_place(&board, 0, 0, 3, Orientation::Horizontal));
        }
        assert!(!can_place(&board, 8, 0, 3, Orientation::Horizontal));
    }

    #[test]
    fn placement_count_on_empty_board() {
        // 10x10, length 3: 8 anchors per row * 10 rows * 2 orientations.
        assert_eq!(all_placements(10, 3).count(), 160);
        assert_eq!(all_placements(10, 1).count(), 100);
    }

    #[test]
    fn no_touch_rejects_diagonal_contact() {
        let mut occ = Occupancy::new(10);
        occ.place(&h(2, 2, 1));
        assert!(!occ.fits_apart(&v(3, 3, 3)));
        assert!(!occ.fits_apart(&v(2, 3, 3)));
        assert!(occ.fits_apart(&h(4, 2, 3)));
    }

    #[test]
    fn fits_apart_matches_combined_check() {
        let candidates = [
            h(0, 0, 4),
            v(0, 2, 3),
            h(4, 1, 2),
            v(5, 0, 5),
            h(1, 1, 3),
            v(9, 5, 5),
            h(6, 9, 2),
        ];
        for a in &candidates {
            let mut occ = Occupancy::new(10);
            occ.place(a);
            for b in &candidates {
                if a == b {
                    continue;
                }
                assert_eq!(
                    occ.fits_apart(b),
                    is_valid_fleet(10, &[*a, *b]),
                    "asymmetric result for {:?} then {:?}",
                    a,
                    b
                );
            }
        }
    }

    #[test]
    fn random_fleet_is_valid() {
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..50 {
            let (occ, placements) =
                random_fleet(10, &[5, 4, 3, 3, 2], 500, &mut rng).expect("fleet should fit");
            assert_eq!(occ.count(), 17);
            assert!(is_valid_fleet(10, &placements));
        }
    }

    #[test]
    fn iter_set_lists_cells_in_order() {
        let mut occ = Occupancy::new(10);
        occ.place(&v(9, 5, 3));
        let cells: Vec<usize> = occ.iter_set().collect();
        assert_eq!(cells, vec![59, 69, 79]);
    }
}
