//! Board representation and fleet bookkeeping.
//!
//! Contains the opponent belief grid, placement feasibility checks shared by
//! every estimator, and the fleet ledgers for both sides.

pub mod fleet;
pub mod grid;
pub mod placement;

pub use fleet::{FleetEntry, FleetLedger, LedgerError, OwnFleet, Ship, SinkRule, Strike};
pub use grid::{Board, CellState, Coord, ORTHOGONAL};
pub use placement::{
    all_placements, can_place, fits_evidence, is_valid_fleet, random_fleet, Occupancy,
    Orientation, Placement,
};

/// Standard fleet compositions by board size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FleetPreset {
    Standard10,
    Large12,
    Huge15,
}

impl FleetPreset {
    pub fn ship_lengths(self) -> &'static [usize] {
        match self {
            FleetPreset::Standard10 => &[5, 4, 3, 3, 2],
            FleetPreset::Large12 => &[5, 4, 4, 3, 3, 3, 2, 2],
            FleetPreset::Huge15 => &[5, 5, 4, 4, 3, 3, 3, 2, 2, 2, 2],
        }
    }

    /// Looks up a preset by board size.
    pub fn for_size(size: usize) -> Option<FleetPreset> {
        match size {
            10 => Some(FleetPreset::Standard10),
            12 => Some(FleetPreset::Large12),
            15 => Some(FleetPreset::Huge15),
            _ => None,
        }
    }
}
