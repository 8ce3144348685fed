//! Fleet bookkeeping.
//!
//! The opponent's fleet is tracked only as a multiset of lengths that are
//! still afloat (`FleetLedger`); the engine has no ground truth about where
//! those ships are. The engine's own fleet is fully materialized (`OwnFleet`)
//! with per-ship hit counts and an owner index per cell.

use serde::{Deserialize, Serialize};

use super::grid::Coord;
use super::placement::Placement;

/// Errors raised by the opponent fleet ledger.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("no ship of length {0} in this fleet")]
    UnknownLength(usize),

    #[error("every ship of length {0} is already sunk")]
    Exhausted(usize),
}

/// One ship class in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetEntry {
    pub length: usize,
    pub total: usize,
    pub remaining: usize,
}

/// Remaining opponent ships, grouped by length, longest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetLedger {
    entries: Vec<FleetEntry>,
}

impl FleetLedger {
    /// Builds a ledger from a flat list of ship lengths (duplicates allowed).
    pub fn new(lengths: &[usize]) -> Self {
        let mut sorted: Vec<usize> = lengths.to_vec();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        let mut entries: Vec<FleetEntry> = Vec::new();
        for len in sorted {
            match entries.last_mut() {
                Some(e) if e.length == len => {
                    e.total += 1;
                    e.remaining += 1;
                }
                _ => entries.push(FleetEntry {
                    length: len,
                    total: 1,
                    remaining: 1,
                }),
            }
        }
        FleetLedger { entries }
    }

    pub fn entries(&self) -> &[FleetEntry] {
        &self.entries
    }

    /// Remaining count for a length (0 if the length is not part of the fleet).
    pub fn remaining(&self, length: usize) -> usize {
        self.entries
            .iter()
            .find(|e| e.length == length)
            .map_or(0, |e| e.remaining)
    }

    /// Remaining lengths as a flat multiset, longest first.
    pub fn remaining_lengths(&self) -> Vec<usize> {
        self.entries
            .iter()
            .flat_map(|e| std::iter::repeat(e.length).take(e.remaining))
            .collect()
    }

    /// Sum of length × remaining count.
    pub fn remaining_cells(&self) -> usize {
        self.entries.iter().map(|e| e.length * e.remaining).sum()
    }

    pub fn ships_left(&self) -> usize {
        self.entries.iter().map(|e| e.remaining).sum()
    }

    pub fn total_ships(&self) -> usize {
        self.entries.iter().map(|e| e.total).sum()
    }

    pub fn smallest_remaining(&self) -> Option<usize> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.remaining > 0)
            .map(|e| e.length)
    }

    pub fn is_cleared(&self) -> bool {
        self.ships_left() == 0
    }

    /// Records one confirmed sinking. Verifies first; never decrements on failure.
    pub fn confirm_sunk(&mut self, length: usize) -> Result<(), LedgerError> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.length == length)
            .ok_or(LedgerError::UnknownLength(length))?;
        if entry.remaining == 0 {
            return Err(LedgerError::Exhausted(length));
        }
        entry.remaining -= 1;
        Ok(())
    }
}

/// When a ship on the engine's own board counts as sunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SinkRule {
    /// Every segment must be struck.
    #[default]
    AllSegments,
    /// As `AllSegments`, except a length-3 ship also sinks when its middle
    /// segment is struck (house rule variant).
    MiddleOfThree,
}

/// A ship of the engine's own fleet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ship {
    pub id: usize,
    pub length: usize,
    pub cells: Vec<Coord>,
    pub hit_count: usize,
    pub sunk: bool,
}

/// Result of a strike against the engine's own board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strike {
    Miss,
    Hit { ship: usize },
    Sunk { ship: usize, cells: Vec<Coord> },
    /// The cell was already struck; nothing changed.
    Repeat,
}

/// The engine's own fleet and the strikes it has taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnFleet {
    size: usize,
    owner: Vec<Option<usize>>,
    struck: Vec<bool>,
    ships: Vec<Ship>,
    rule: SinkRule,
}

impl OwnFleet {
    /// Materializes ships from placements. Placements are assumed valid.
    pub fn new(size: usize, placements: &[Placement], rule: SinkRule) -> Self {
        let mut owner = vec![None; size * size];
        let ships = placements
            .iter()
            .enumerate()
            .map(|(id, p)| {
                let cells: Vec<Coord> = p.cells().collect();
                for c in &cells {
                    owner[c.index(size)] = Some(id);
                }
                Ship {
                    id,
                    length: p.length,
                    cells,
                    hit_count: 0,
                    sunk: false,
                }
            })
            .collect();
        OwnFleet {
            size,
            owner,
            struck: vec![false; size * size],
            ships,
            rule,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn ships(&self) -> &[Ship] {
        &self.ships
    }

    pub fn ships_left(&self) -> usize {
        self.ships.iter().filter(|s| !s.sunk).count()
    }

    pub fn all_sunk(&self) -> bool {
        !self.ships.is_empty() && self.ships.iter().all(|s| s.sunk)
    }

    /// Flat row-major grid: 1 for ship cells, 0 otherwise.
    pub fn layout_grid(&self) -> Vec<u8> {
        self.owner.iter().map(|o| u8::from(o.is_some())).collect()
    }

    /// Applies an opponent strike at `c`. The coordinate must be on the board.
    pub fn strike(&mut self, c: Coord) -> Strike {
        let idx = c.index(self.size);
        if self.struck[idx] {
            return Strike::Repeat;
        }
        self.struck[idx] = true;
        let Some(id) = self.owner[idx] else {
            return Strike::Miss;
        };

        let rule = self.rule;
        let ship = &mut self.ships[id];
        ship.hit_count += 1;
        if ship.sunk {
            return Strike::Hit { ship: id };
        }
        let middle_rule =
            rule == SinkRule::MiddleOfThree && ship.length == 3 && ship.cells[1] == c;
        if middle_rule || ship.hit_count >= ship.length {
            ship.sunk = true;
            return Strike::Sunk {
                ship: id,
                cells: ship.cells.clone(),
            };
        }
        Strike::Hit { ship: id }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::placement::Orientation;

    #[test]
    fn ledger_groups_lengths() {
        let ledger = FleetLedger::new(&[3, 5, 2, 3, 4]);
        let lens: Vec<usize> = ledger.entries().iter().map(|e| e.length).collect();
        assert_eq!(lens, vec![5, 4, 3, 2]);
        assert_eq!(ledger.remaining(3), 2);
        assert_eq!(ledger.remaining_cells(), 17);
        assert_eq!(ledger.remaining_lengths(), vec![5, 4, 3, 3, 2]);
        assert_eq!(ledger.smallest_remaining(), Some(2));
    }

    #[test]
    fn ledger_refuses_exhausted_length() {
        let mut ledger = FleetLedger::new(&[3, 2]);
        assert!(ledger.confirm_sunk(2).is_ok());
        assert_eq!(ledger.confirm_sunk(2), Err(LedgerError::Exhausted(2)));
        assert_eq!(ledger.confirm_sunk(7), Err(LedgerError::UnknownLength(7)));
        assert_eq!(ledger.remaining(2), 0);
        assert_eq!(ledger.remaining(3), 1);
        assert_eq!(ledger.smallest_remaining(), Some(3));
    }

    fn fleet(rule: SinkRule) -> OwnFleet {
        let placements = [
            Placement::new(Coord::new(0, 0), 3, Orientation::Horizontal),
            Placement::new(Coord::new(5, 5), 2, Orientation::Vertical),
        ];
        OwnFleet::new(10, &placements, rule)
    }

    #[test]
    fn strikes_sink_after_all_segments() {
        let mut own = fleet(SinkRule::AllSegments);
        assert_eq!(own.strike(Coord::new(9, 9)), Strike::Miss);
        assert_eq!(own.strike(Coord::new(5, 5)), Strike::Hit { ship: 1 });
        assert_eq!(own.strike(Coord::new(5, 5)), Strike::Repeat);
        match own.strike(Coord::new(5, 6)) {
            Strike::Sunk { ship, cells } => {
                assert_eq!(ship, 1);
                assert_eq!(cells.len(), 2);
            }
            other => panic!("expected sunk, got {:?}", other),
        }
        assert_eq!(own.ships_left(), 1);
        assert!(!own.all_sunk());
    }

    #[test]
    fn middle_rule_sinks_three_on_center_hit() {
        let mut own = fleet(SinkRule::MiddleOfThree);
        assert!(matches!(own.strike(Coord::new(1, 0)), Strike::Sunk { ship: 0, .. }));

        let mut standard = fleet(SinkRule::AllSegments);
        assert_eq!(standard.strike(Coord::new(1, 0)), Strike::Hit { ship: 0 });
    }

    #[test]
    fn layout_grid_marks_ship_cells() {
        let own = fleet(SinkRule::AllSegments);
        let grid = own.layout_grid();
        assert_eq!(grid.len(), 100);
        assert_eq!(grid.iter().filter(|&&b| b == 1).count(), 5);
        assert_eq!(grid[0], 1);
        assert_eq!(grid[55], 1);
    }
}
