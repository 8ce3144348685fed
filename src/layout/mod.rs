//! Own-fleet layout.
//!
//! Chooses where the engine's own ships go: a genetic search over complete
//! no-touch layouts scored by how well they resist common hunting patterns.

pub mod fitness;
pub mod genetic;

pub use fitness::FitnessWeights;
pub use genetic::{GeneticConfig, GeneticOptimizer, Individual, LayoutError};

use rand::rngs::SmallRng;

use crate::board::placement::Placement;

/// Runs the optimizer for one fleet and returns the best layout found.
pub fn optimise_layout(
    size: usize,
    lengths: &[usize],
    config: &GeneticConfig,
    rng: &mut SmallRng,
) -> Result<Vec<Placement>, LayoutError> {
    let optimizer = GeneticOptimizer::new(size, lengths, config.clone())?;
    Ok(optimizer.run(rng)?.placements)
}
