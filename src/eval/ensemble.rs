//! Sampled candidate layouts ("possible realities").
//!
//! The ensemble is drawn once at match start from complete no-touch fleets
//! and only ever shrinks: every shot outcome drops the layouts that disagree
//! with it. Filtering is exact, so any surviving layout agrees with every
//! outcome recorded so far.

use rand::Rng;
use tracing::{debug, warn};

use crate::board::grid::{Board, CellState, Coord};
use crate::board::placement::{random_fleet, Occupancy};

/// One complete candidate opponent fleet, as a ship-cell bitset.
pub type Layout = Occupancy;

/// Random anchors tried per ship when sampling a layout.
const SHIP_RETRIES: usize = 100;

/// Upper bound on the up-front allocation for sampled layouts.
const PREALLOCATE: usize = 4096;

#[derive(Debug, Clone, PartialEq)]
pub struct Ensemble {
    size: usize,
    layouts: Vec<Layout>,
    evidence: Vec<(Coord, bool)>,
}

impl Ensemble {
    /// Samples up to `target` layouts, giving up after `attempts` tries.
    pub fn generate<R: Rng>(
        size: usize,
        lengths: &[usize],
        target: usize,
        attempts: usize,
        rng: &mut R,
    ) -> Self {
        let mut sorted = lengths.to_vec();
        sorted.sort_unstable_by(|a, b| b.cmp(a));

        let mut layouts = Vec::with_capacity(target.min(PREALLOCATE));
        let mut tries = 0;
        while layouts.len() < target && tries < attempts {
            tries += 1;
            if let Some((occ, _)) = random_fleet(size, &sorted, SHIP_RETRIES, rng) {
                layouts.push(occ);
            }
        }
        debug!(
            accepted = layouts.len(),
            tries,
            target,
            "ensemble sampled"
        );
        Ensemble {
            size,
            layouts,
            evidence: Vec::new(),
        }
    }

    /// An ensemble with no members. Every scoring query yields nothing.
    pub fn empty(size: usize) -> Self {
        Ensemble {
            size,
            layouts: Vec::new(),
            evidence: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }

    pub fn layouts(&self) -> &[Layout] {
        &self.layouts
    }

    pub fn evidence(&self) -> &[(Coord, bool)] {
        &self.evidence
    }

    /// Records a shot outcome and drops disagreeing layouts.
    ///
    /// Returns the number of layouts removed.
    pub fn apply(&mut self, c: Coord, hit: bool) -> usize {
        self.evidence.push((c, hit));
        let before = self.layouts.len();
        self.layouts.retain(|l| l.contains(c) == hit);
        let removed = before - self.layouts.len();
        if before > 0 && self.layouts.is_empty() {
            warn!(x = c.x, y = c.y, hit, "ensemble collapsed; no layout matches the evidence");
        }
        removed
    }

    /// True if `layout` agrees with every recorded outcome.
    pub fn is_consistent(&self, layout: &Layout) -> bool {
        self.evidence.iter().all(|&(c, hit)| layout.contains(c) == hit)
    }

    /// Number of layouts with a ship segment on each cell.
    pub fn ship_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.size * self.size];
        for layout in &self.layouts {
            for idx in layout.iter_set() {
                counts[idx] += 1;
            }
        }
        counts
    }

    /// `Unknown` cells ranked by `min(with ship, without ship)`, best first.
    ///
    /// Returns an empty list if the ensemble is empty or every member agrees
    /// on every unknown cell (no cell splits the ensemble).
    pub fn minimax_ranked(&self, board: &Board) -> Vec<Coord> {
        let n = self.layouts.len();
        if n == 0 {
            return Vec::new();
        }
        let counts = self.ship_counts();
        let mut scored: Vec<(usize, usize)> = board
            .coords_in(CellState::Unknown)
            .map(|c| {
                let idx = c.index(self.size);
                (idx, counts[idx].min(n - counts[idx]))
            })
            .filter(|&(_, s)| s > 0)
            .collect();
        scored.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        scored
            .into_iter()
            .map(|(i, _)| Coord::from_index(i, self.size))
            .collect()
    }

    /// `Unknown` cells ranked by expected remaining uncertainty after the
    /// shot, lowest first.
    ///
    /// Uncertainty is the sum over unknown cells of the binary entropy of
    /// "ship here", estimated from layout frequencies. For a candidate `c`
    /// hit with probability `p`, the expectation is
    /// `p·H(after hit) + (1 − p)·H(after miss)`, where both conditional
    /// distributions come from pairwise co-occurrence counts.
    pub fn entropy_ranked(&self, board: &Board) -> Vec<Coord> {
        let n = self.layouts.len();
        if n == 0 {
            return Vec::new();
        }
        let unknown: Vec<usize> = board
            .coords_in(CellState::Unknown)
            .map(|c| c.index(self.size))
            .collect();
        let u = unknown.len();
        if u == 0 {
            return Vec::new();
        }
        let mut slot = vec![usize::MAX; self.size * self.size];
        for (k, &idx) in unknown.iter().enumerate() {
            slot[idx] = k;
        }

        // pair[a * u + b]: layouts with ships on both a and b; diagonal is the single count.
        let mut pair = vec![0u32; u * u];
        let mut ships: Vec<usize> = Vec::new();
        for layout in &self.layouts {
            ships.clear();
            ships.extend(layout.iter_set().map(|i| slot[i]).filter(|&k| k != usize::MAX));
            for &a in &ships {
                for &b in &ships {
                    pair[a * u + b] += 1;
                }
            }
        }

        let total = n as f64;
        let mut scored: Vec<(usize, f64)> = Vec::with_capacity(u);
        for a in 0..u {
            let with = pair[a * u + a] as f64;
            let without = total - with;
            let p_hit = with / total;
            let mut h_hit = 0.0;
            let mut h_miss = 0.0;
            for b in 0..u {
                if b == a {
                    continue;
                }
                let both = pair[a * u + b] as f64;
                let only_b = pair[b * u + b] as f64 - both;
                if with > 0.0 {
                    h_hit += binary_entropy(both / with);
                }
                if without > 0.0 {
                    h_miss += binary_entropy(only_b / without);
                }
            }
            let expected = p_hit * h_hit + (1.0 - p_hit) * h_miss;
            scored.push((unknown[a], expected));
        }
        scored.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        scored
            .into_iter()
            .map(|(i, _)| Coord::from_index(i, self.size))
            .collect()
    }
}

/// Shannon entropy in bits of a Bernoulli(`p`) variable.
pub fn binary_entropy(p: f64) -> f64 {
    if p <= 0.0 || p >= 1.0 {
        return 0.0;
    }
    -(p * p.log2() + (1.0 - p) * (1.0 - p).log2())
}
