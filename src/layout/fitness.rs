//! Fitness terms for own-fleet layouts.
//!
//! Each term lies in `[0, 1]`, higher is better. All three are empirical
//! heuristics; none of them is a guarantee about how long a layout survives.

use serde::{Deserialize, Serialize};

use crate::board::grid::Coord;
use crate::board::placement::Placement;

/// Relative weight of each fitness term.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitnessWeights {
    pub parity: f64,
    pub ambiguity: f64,
    pub balance: f64,
}

impl Default for FitnessWeights {
    fn default() -> Self {
        FitnessWeights {
            parity: 0.5,
            ambiguity: 0.25,
            balance: 0.25,
        }
    }
}

/// Weighted sum of all terms.
pub fn fitness(size: usize, placements: &[Placement], weights: &FitnessWeights) -> f64 {
    weights.parity * parity_resistance(size, placements)
        + weights.ambiguity * ambiguity(placements)
        + weights.balance * balance(size, placements)
}

/// Fraction of the board a checkerboard sweep covers before every ship has
/// been touched at least once.
///
/// The sweep visits all `(x + y)` even cells in row-major order, then the
/// odd ones.
pub fn parity_resistance(size: usize, placements: &[Placement]) -> f64 {
    let area = size * size;
    if area == 0 || placements.is_empty() {
        return 0.0;
    }
    let mut owner = vec![None; area];
    for (id, p) in placements.iter().enumerate() {
        for c in p.cells() {
            owner[c.index(size)] = Some(id);
        }
    }

    let sweep = (0..2).flat_map(|parity| {
        (0..area).filter(move |&i| {
            let c = Coord::from_index(i, size);
            (c.x + c.y) % 2 == parity
        })
    });

    let mut touched = vec![false; placements.len()];
    let mut untouched = placements.len();
    for (shots, idx) in sweep.enumerate() {
        if let Some(id) = owner[idx] {
            if !touched[id] {
                touched[id] = true;
                untouched -= 1;
                if untouched == 0 {
                    return (shots + 1) as f64 / area as f64;
                }
            }
        }
    }
    1.0
}

/// Share of ordered ship pairs that come within two cells of each other.
///
/// No-touch layouts never put ships closer than that, so every counted pair
/// is a near miss that can mislead line inference during targeting.
pub fn ambiguity(placements: &[Placement]) -> f64 {
    let n = placements.len();
    if n < 2 {
        return 0.0;
    }
    let cells: Vec<Vec<Coord>> = placements.iter().map(|p| p.cells().collect()).collect();
    let mut near = 0usize;
    for a in 0..n {
        for b in 0..n {
            if a == b {
                continue;
            }
            let close = cells[a]
                .iter()
                .any(|ca| cells[b].iter().any(|cb| ca.chebyshev(*cb) == 2));
            if close {
                near += 1;
            }
        }
    }
    near as f64 / (n * (n - 1)) as f64
}

/// Half centroid proximity to the board center, half spread regularity.
///
/// Spread regularity is `1 / (1 + variance)` of the per-ship distances from
/// the fleet centroid.
pub fn balance(size: usize, placements: &[Placement]) -> f64 {
    if placements.is_empty() || size == 0 {
        return 0.0;
    }
    let fleet = centroid(placements.iter().flat_map(|p| p.cells()));
    let mid = (size as f64 - 1.0) / 2.0;
    let max_dist = (2.0 * mid * mid).sqrt();
    let proximity = if max_dist > 0.0 {
        1.0 - dist(fleet, (mid, mid)) / max_dist
    } else {
        1.0
    };

    let distances: Vec<f64> = placements
        .iter()
        .map(|p| dist(centroid(p.cells()), fleet))
        .collect();
    let mean = distances.iter().sum::<f64>() / distances.len() as f64;
    let variance =
        distances.iter().map(|d| (d - mean) * (d - mean)).sum::<f64>() / distances.len() as f64;

    0.5 * proximity + 0.5 / (1.0 + variance)
}

fn centroid(cells: impl Iterator<Item = Coord>) -> (f64, f64) {
    let (mut sx, mut sy, mut n) = (0.0, 0.0, 0.0);
    for c in cells {
        sx += c.x as f64;
        sy += c.y as f64;
        n += 1.0;
    }
    if n == 0.0 {
        return (0.0, 0.0);
    }
    (sx / n, sy / n)
}

fn dist(a: (f64, f64), b: (f64, f64)) -> f64 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::placement::Orientation;

    fn h(x: usize, y: usize, len: usize) -> Placement {
        Placement::new(Coord::new(x, y), len, Orientation::Horizontal)
    }

    #[test]
    fn parity_sweep_finds_ship_on_even_cells_first() {
        // A horizontal ship always covers an even cell; found within the first half.
        let score = parity_resistance(10, &[h(0, 0, 2)]);
        assert!(score <= 0.5);
        assert!((score - 0.01).abs() < 1e-12);
    }

    #[test]
    fn single_cell_on_odd_square_survives_first_pass() {
        let score = parity_resistance(4, &[h(1, 0, 1)]);
        // 8 even cells, then (1,0) is the first odd cell.
        assert!((score - 9.0 / 16.0).abs() < 1e-12);
    }

    #[test]
    fn ambiguity_counts_near_misses() {
        let apart = [h(0, 0, 2), h(6, 6, 2)];
        let near = [h(0, 0, 2), h(3, 0, 2)];
        assert_eq!(ambiguity(&apart), 0.0);
        assert_eq!(ambiguity(&near), 1.0);
    }

    #[test]
    fn balance_prefers_centered_fleets() {
        let centered = [h(3, 4, 2), h(6, 5, 2)];
        let cornered = [h(0, 0, 2), h(0, 2, 2)];
        assert!(balance(10, &centered) > balance(10, &cornered));
        for layout in [&centered[..], &cornered[..]] {
            let b = balance(10, layout);
            assert!((0.0..=1.0).contains(&b));
        }
    }

    #[test]
    fn weighted_sum_is_bounded() {
        let layout = [h(0, 0, 5), h(0, 2, 4), h(6, 4, 3), h(0, 6, 3), h(8, 9, 2)];
        let f = fitness(10, &layout, &FitnessWeights::default());
        assert!(f > 0.0 && f <= 1.0);
    }
}
