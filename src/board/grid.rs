//! Opponent board representation.
//!
//! Holds the engine's knowledge of the opponent's grid: one closed
//! `CellState` per coordinate, stored row-major in a flat vector so that
//! cloning a board for planning or history is a single allocation.

use serde::{Deserialize, Serialize};

/// Orthogonal neighbor offsets in up, down, left, right order.
pub const ORTHOGONAL: [(isize, isize); 4] = [(0, -1), (0, 1), (-1, 0), (1, 0)];

/// What the engine knows about a single opponent cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellState {
    /// Never shot and not ruled out.
    Unknown,
    /// Proven empty without being shot.
    Water,
    /// Shot and missed, or ruled out by the no-adjacency rule.
    Miss,
    /// Shot and hit, ship not yet confirmed sunk.
    Hit,
    /// Part of a ship confirmed sunk.
    Sunk,
}

impl CellState {
    /// Returns true for cells that can never hold a ship segment.
    pub const fn is_empty_water(self) -> bool {
        matches!(self, CellState::Water | CellState::Miss)
    }
}

/// A board coordinate. `x` is the column, `y` the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub x: usize,
    pub y: usize,
}

impl Coord {
    pub const fn new(x: usize, y: usize) -> Self {
        Coord { x, y }
    }

    /// Row-major index on a board of the given size.
    pub const fn index(self, size: usize) -> usize {
        self.y * size + self.x
    }

    /// Inverse of [`Coord::index`].
    pub const fn from_index(idx: usize, size: usize) -> Self {
        Coord {
            x: idx % size,
            y: idx / size,
        }
    }

    /// Returns the coordinate shifted by `(dx, dy)` if it stays on a board of `size`.
    pub fn offset(self, dx: isize, dy: isize, size: usize) -> Option<Coord> {
        let nx = self.x as isize + dx;
        let ny = self.y as isize + dy;
        if nx < 0 || ny < 0 || nx >= size as isize || ny >= size as isize {
            return None;
        }
        Some(Coord::new(nx as usize, ny as usize))
    }

    /// Up to four in-bounds orthogonal neighbors.
    pub fn orthogonal(self, size: usize) -> impl Iterator<Item = Coord> {
        ORTHOGONAL
            .into_iter()
            .filter_map(move |(dx, dy)| self.offset(dx, dy, size))
    }

    /// Up to eight in-bounds surrounding cells (the 8-neighborhood).
    pub fn surrounding(self, size: usize) -> impl Iterator<Item = Coord> {
        (-1isize..=1)
            .flat_map(|dy| (-1isize..=1).map(move |dx| (dx, dy)))
            .filter(|&(dx, dy)| dx != 0 || dy != 0)
            .filter_map(move |(dx, dy)| self.offset(dx, dy, size))
    }

    /// Chebyshev (king-move) distance.
    pub fn chebyshev(self, other: Coord) -> usize {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }
}

/// The engine's view of the opponent's grid.
///
/// The size is fixed for the lifetime of a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    size: usize,
    cells: Vec<CellState>,
}

impl Board {
    /// Creates a board of `size`×`size` cells, all `Unknown`.
    pub fn new(size: usize) -> Self {
        Board {
            size,
            cells: vec![CellState::Unknown; size * size],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Total number of cells.
    pub fn area(&self) -> usize {
        self.cells.len()
    }

    pub fn in_bounds(&self, x: usize, y: usize) -> bool {
        x < self.size && y < self.size
    }

    pub fn get(&self, c: Coord) -> CellState {
        self.cells[c.index(self.size)]
    }

    pub fn get_index(&self, idx: usize) -> CellState {
        self.cells[idx]
    }

    pub fn set(&mut self, c: Coord, state: CellState) {
        let idx = c.index(self.size);
        self.cells[idx] = state;
    }

    pub fn cells(&self) -> &[CellState] {
        &self.cells
    }

    /// Iterates over every coordinate in row-major order.
    pub fn coords(&self) -> impl Iterator<Item = Coord> + '_ {
        (0..self.cells.len()).map(move |i| Coord::from_index(i, self.size))
    }

    /// Iterates over coordinates currently in `state`.
    pub fn coords_in(&self, state: CellState) -> impl Iterator<Item = Coord> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(move |(_, &s)| s == state)
            .map(move |(i, _)| Coord::from_index(i, self.size))
    }

    pub fn count(&self, state: CellState) -> usize {
        self.cells.iter().filter(|&&s| s == state).count()
    }

    /// Flood-fills the 4-connected region of cells in `state` containing `start`.
    ///
    /// Returns an empty vector when `start` itself is not in `state`.
    pub fn connected_region(&self, start: Coord, state: CellState) -> Vec<Coord> {
        if self.get(start) != state {
            return Vec::new();
        }
        let mut seen = vec![false; self.cells.len()];
        let mut region = vec![start];
        seen[start.index(self.size)] = true;
        let mut head = 0;
        while head < region.len() {
            let cur = region[head];
            head += 1;
            for n in cur.orthogonal(self.size) {
                let idx = n.index(self.size);
                if !seen[idx] && self.cells[idx] == state {
                    seen[idx] = true;
                    region.push(n);
                }
            }
        }
        region
    }

    /// Marks every `Unknown` cell around `cells` as `Miss` and returns the changed cells.
    pub fn mark_surrounding_miss(&mut self, cells: &[Coord]) -> Vec<Coord> {
        let mut changed = Vec::new();
        for &c in cells {
            for n in c.surrounding(self.size) {
                if self.get(n) == CellState::Unknown {
                    self.set(n, CellState::Miss);
                    changed.push(n);
                }
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_board_is_unknown() {
        let board = Board::new(10);
        assert_eq!(board.area(), 100);
        assert_eq!(board.count(CellState::Unknown), 100);
    }

    #[test]
    fn coord_index_roundtrip() {
        let c = Coord::new(3, 7);
        assert_eq!(Coord::from_index(c.index(10), 10), c);
    }

    #[test]
    fn corner_has_two_orthogonal_and_three_surrounding() {
        let c = Coord::new(0, 0);
        assert_eq!(c.orthogonal(10).count(), 2);
        assert_eq!(c.surrounding(10).count(), 3);
        assert_eq!(Coord::new(5, 5).surrounding(10).count(), 8);
    }

    #[test]
    fn connected_region_follows_orthogonal_links_only() {
        let mut board = Board::new(5);
        board.set(Coord::new(1, 1), CellState::Hit);
        board.set(Coord::new(2, 1), CellState::Hit);
        board.set(Coord::new(3, 2), CellState::Hit); // diagonal, not connected
        let region = board.connected_region(Coord::new(1, 1), CellState::Hit);
        assert_eq!(region.len(), 2);
        assert!(region.contains(&Coord::new(2, 1)));
    }

    #[test]
    fn mark_surrounding_skips_known_cells() {
        let mut board = Board::new(4);
        board.set(Coord::new(0, 0), CellState::Sunk);
        board.set(Coord::new(1, 0), CellState::Sunk);
        board.set(Coord::new(2, 1), CellState::Hit);
        let changed = board.mark_surrounding_miss(&[Coord::new(0, 0), Coord::new(1, 0)]);
        // (0,1), (1,1), (2,0); (2,1) is a hit and stays untouched.
        assert_eq!(changed.len(), 3);
        assert_eq!(board.get(Coord::new(2, 1)), CellState::Hit);
        assert_eq!(board.get(Coord::new(2, 0)), CellState::Miss);
    }
}
