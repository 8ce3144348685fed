//! Long-run opponent placement statistics.
//!
//! Every confirmed opponent ship adds one unit of weight spread over the
//! board regions its cells occupy, plus one orientation count. A profile
//! loaded from an earlier match acts as a prior and is blended in with an
//! exponential decay whenever the profile is exported or consulted.
//!
//! Region shares are compared against a baseline sampled from uniformly
//! random no-touch fleets, so an opponent who places at random leaves the
//! density map unchanged whatever the board geometry.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::board::grid::Coord;
use crate::board::placement::random_fleet;

/// Blended weight needed before the profile biases the density map.
pub const MIN_OBSERVATIONS: f64 = 3.0;

/// Random fleets sampled for the uniform-placement baseline.
pub const BASELINE_FLEETS: usize = 500;

/// Random anchors tried per ship when sampling a baseline fleet.
const SHIP_RETRIES: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("malformed profile: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("profile field {0} is negative or not finite")]
    InvalidValue(&'static str),
}

/// Board region of a cell, by distance to the nearest border.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Edge,
    Center,
    Corner,
}

impl Region {
    /// Cells within two rows/columns of a border are in its band; cells in
    /// two bands are corners.
    pub fn of(c: Coord, size: usize) -> Region {
        let band = |v: usize| v < 2 || v + 2 >= size;
        match (band(c.x), band(c.y)) {
            (true, true) => Region::Corner,
            (true, false) | (false, true) => Region::Edge,
            (false, false) => Region::Center,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementBias {
    pub edge: f64,
    pub center: f64,
    pub corner: f64,
}

impl PlacementBias {
    pub fn total(&self) -> f64 {
        self.edge + self.center + self.corner
    }

    fn get(&self, region: Region) -> f64 {
        match region {
            Region::Edge => self.edge,
            Region::Center => self.center,
            Region::Corner => self.corner,
        }
    }

    /// Adds one unit of weight spread evenly over the ship's cells.
    fn add_ship(&mut self, cells: &[Coord], size: usize) {
        if cells.is_empty() {
            return;
        }
        let share = 1.0 / cells.len() as f64;
        for &c in cells {
            match Region::of(c, size) {
                Region::Edge => self.edge += share,
                Region::Center => self.center += share,
                Region::Corner => self.corner += share,
            }
        }
    }

    /// The same weights scaled to sum to 1, or `None` when empty.
    pub fn shares(&self) -> Option<PlacementBias> {
        let total = self.total();
        if total <= 0.0 {
            return None;
        }
        Some(PlacementBias {
            edge: self.edge / total,
            center: self.center / total,
            corner: self.corner / total,
        })
    }

    /// Each region's share of the board's cells.
    pub fn cell_shares(size: usize) -> PlacementBias {
        let mut counts = PlacementBias::default();
        for y in 0..size {
            for x in 0..size {
                match Region::of(Coord::new(x, y), size) {
                    Region::Edge => counts.edge += 1.0,
                    Region::Center => counts.center += 1.0,
                    Region::Corner => counts.corner += 1.0,
                }
            }
        }
        counts.shares().unwrap_or_default()
    }
}

/// Region shares produced by an opponent who places `lengths` uniformly at
/// random under the no-touch rule, estimated from `fleets` sampled fleets.
///
/// Falls back to plain cell shares when no fleet can be sampled.
pub fn uniform_baseline<R: Rng>(
    size: usize,
    lengths: &[usize],
    fleets: usize,
    rng: &mut R,
) -> PlacementBias {
    let mut sorted = lengths.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));

    let mut weights = PlacementBias::default();
    for _ in 0..fleets {
        if let Some((_, placements)) = random_fleet(size, &sorted, SHIP_RETRIES, rng) {
            for placement in &placements {
                let cells: Vec<Coord> = placement.cells().collect();
                weights.add_ship(&cells, size);
            }
        }
    }
    weights
        .shares()
        .unwrap_or_else(|| PlacementBias::cell_shares(size))
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OrientationBias {
    pub vertical: f64,
    pub horizontal: f64,
}

/// Serializable profile statistics.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProfileStats {
    pub placement_bias: PlacementBias,
    pub orientation_bias: OrientationBias,
}

impl ProfileStats {
    fn scaled(&self, k: f64) -> ProfileStats {
        ProfileStats {
            placement_bias: PlacementBias {
                edge: self.placement_bias.edge * k,
                center: self.placement_bias.center * k,
                corner: self.placement_bias.corner * k,
            },
            orientation_bias: OrientationBias {
                vertical: self.orientation_bias.vertical * k,
                horizontal: self.orientation_bias.horizontal * k,
            },
        }
    }

    fn plus(&self, other: &ProfileStats) -> ProfileStats {
        ProfileStats {
            placement_bias: PlacementBias {
                edge: self.placement_bias.edge + other.placement_bias.edge,
                center: self.placement_bias.center + other.placement_bias.center,
                corner: self.placement_bias.corner + other.placement_bias.corner,
            },
            orientation_bias: OrientationBias {
                vertical: self.orientation_bias.vertical + other.orientation_bias.vertical,
                horizontal: self.orientation_bias.horizontal + other.orientation_bias.horizontal,
            },
        }
    }

    fn validate(&self) -> Result<(), ProfileError> {
        let fields = [
            ("placementBias.edge", self.placement_bias.edge),
            ("placementBias.center", self.placement_bias.center),
            ("placementBias.corner", self.placement_bias.corner),
            ("orientationBias.vertical", self.orientation_bias.vertical),
            ("orientationBias.horizontal", self.orientation_bias.horizontal),
        ];
        for (name, v) in fields {
            if !v.is_finite() || v < 0.0 {
                return Err(ProfileError::InvalidValue(name));
            }
        }
        Ok(())
    }
}

/// Opponent statistics for the current match plus a decayed prior.
#[derive(Debug, Clone, PartialEq)]
pub struct OpponentProfile {
    prior: ProfileStats,
    current: ProfileStats,
    decay: f64,
}

impl Default for OpponentProfile {
    fn default() -> Self {
        OpponentProfile::new(0.8)
    }
}

impl OpponentProfile {
    pub fn new(decay: f64) -> Self {
        OpponentProfile {
            prior: ProfileStats::default(),
            current: ProfileStats::default(),
            decay: decay.clamp(0.0, 1.0),
        }
    }

    pub fn set_decay(&mut self, decay: f64) {
        self.decay = decay.clamp(0.0, 1.0);
    }

    /// Records a confirmed opponent ship.
    pub fn observe_ship(&mut self, cells: &[Coord], size: usize) {
        if cells.is_empty() {
            return;
        }
        self.current.placement_bias.add_ship(cells, size);
        if cells.len() > 1 {
            if cells.iter().all(|c| c.x == cells[0].x) {
                self.current.orientation_bias.vertical += 1.0;
            } else if cells.iter().all(|c| c.y == cells[0].y) {
                self.current.orientation_bias.horizontal += 1.0;
            }
        }
    }

    /// Prior scaled by the decay, plus this match's observations.
    pub fn blended(&self) -> ProfileStats {
        self.prior.scaled(self.decay).plus(&self.current)
    }

    /// Total blended placement weight.
    pub fn observations(&self) -> f64 {
        self.blended().placement_bias.total()
    }

    /// Multiplier for a cell's density score: `1 + weight·(share/expected − 1)`,
    /// where `share` is the region's fraction of blended placement weight
    /// and `expected` its share in `baseline` (see [`uniform_baseline`]).
    /// Returns 1 until enough ships have been observed.
    pub fn density_factor(
        &self,
        c: Coord,
        size: usize,
        weight: f64,
        baseline: &PlacementBias,
    ) -> f64 {
        let stats = self.blended();
        let Some(shares) = stats.placement_bias.shares() else {
            return 1.0;
        };
        if stats.placement_bias.total() < MIN_OBSERVATIONS {
            return 1.0;
        }
        let region = Region::of(c, size);
        let expected = baseline.get(region);
        if expected <= 0.0 {
            return 1.0;
        }
        (1.0 + weight * (shares.get(region) / expected - 1.0)).max(0.0)
    }

    /// Serializes the blended statistics for host-side persistence.
    pub fn export(&self) -> Result<String, ProfileError> {
        Ok(serde_json::to_string(&self.blended())?)
    }

    /// Replaces the prior with a previously exported blob and clears
    /// this match's observations.
    pub fn load(&mut self, data: &str) -> Result<(), ProfileError> {
        let stats: ProfileStats = serde_json::from_str(data)?;
        stats.validate()?;
        self.prior = stats;
        self.current = ProfileStats::default();
        Ok(())
    }
}
