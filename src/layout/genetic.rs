//! Genetic optimizer for the engine's own fleet layout.
//!
//! Individuals are complete no-touch layouts, one gene per ship in
//! longest-first order. Fitness is evaluated in parallel with rayon; every
//! random draw comes from the caller's RNG on the calling thread, so a
//! seeded run is reproducible.

use rand::rngs::SmallRng;
use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::board::placement::{random_fleet, Occupancy, Placement};

use super::fitness::{fitness, FitnessWeights};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("fleet is empty")]
    EmptyFleet,

    #[error("ship of length {length} cannot fit on a {size}x{size} board")]
    ShipTooLong { length: usize, size: usize },

    #[error("could not seat the fleet {lengths:?} on a {size}x{size} board without touching")]
    Infeasible { lengths: Vec<usize>, size: usize },
}

/// Optimizer parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneticConfig {
    pub population: usize,
    pub generations: usize,
    pub elite_fraction: f64,
    pub tournament_size: usize,
    pub mutation_rate: f64,
    /// Random anchors tried per ship before giving up on it.
    pub placement_retries: usize,
    /// Full greedy layouts tried before the fleet is declared infeasible.
    pub layout_restarts: usize,
    pub weights: FitnessWeights,
}

impl Default for GeneticConfig {
    fn default() -> Self {
        GeneticConfig {
            population: 40,
            generations: 30,
            elite_fraction: 0.1,
            tournament_size: 4,
            mutation_rate: 0.15,
            placement_retries: 200,
            layout_restarts: 50,
            weights: FitnessWeights::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Individual {
    pub placements: Vec<Placement>,
    pub fitness: f64,
}

pub struct GeneticOptimizer {
    size: usize,
    lengths: Vec<usize>,
    config: GeneticConfig,
}

impl GeneticOptimizer {
    /// Validates the fleet and prepares an optimizer. Lengths are reordered
    /// longest first.
    pub fn new(size: usize, lengths: &[usize], config: GeneticConfig) -> Result<Self, LayoutError> {
        if lengths.is_empty() {
            return Err(LayoutError::EmptyFleet);
        }
        if let Some(&length) = lengths.iter().find(|&&l| l == 0 || l > size) {
            return Err(LayoutError::ShipTooLong { length, size });
        }
        let mut sorted = lengths.to_vec();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        Ok(GeneticOptimizer {
            size,
            lengths: sorted,
            config,
        })
    }

    pub fn lengths(&self) -> &[usize] {
        &self.lengths
    }

    /// Greedy largest-first layout with bounded retries and restarts.
    pub fn random_layout(&self, rng: &mut SmallRng) -> Result<Vec<Placement>, LayoutError> {
        for _ in 0..self.config.layout_restarts.max(1) {
            if let Some((_, placements)) =
                random_fleet(self.size, &self.lengths, self.config.placement_retries, rng)
            {
                return Ok(placements);
            }
        }
        Err(LayoutError::Infeasible {
            lengths: self.lengths.clone(),
            size: self.size,
        })
    }

    /// Runs the evolutionary loop and returns the best layout seen.
    pub fn run(&self, rng: &mut SmallRng) -> Result<Individual, LayoutError> {
        let pop_size = self.config.population.max(1);
        let mut population = Vec::with_capacity(pop_size);
        for _ in 0..pop_size {
            population.push(Individual {
                placements: self.random_layout(rng)?,
                fitness: 0.0,
            });
        }
        self.evaluate(&mut population);
        let mut best = self.fittest(&population);

        let elite =
            ((pop_size as f64 * self.config.elite_fraction).ceil() as usize).clamp(1, pop_size);
        for generation in 0..self.config.generations {
            population.sort_by(|a, b| b.fitness.total_cmp(&a.fitness));
            let mut next: Vec<Individual> = population[..elite].to_vec();
            while next.len() < pop_size {
                let a = self.tournament(&population, rng);
                let b = self.tournament(&population, rng);
                let mut child = self.crossover(a, b, rng);
                if rng.gen::<f64>() < self.config.mutation_rate {
                    self.mutate(&mut child, rng);
                }
                next.push(Individual {
                    placements: child,
                    fitness: 0.0,
                });
            }
            self.evaluate(&mut next);
            population = next;

            let gen_best = self.fittest(&population);
            if gen_best.fitness > best.fitness {
                best = gen_best;
            }
            debug!(generation, best = best.fitness, "layout generation done");
        }

        info!(
            fitness = best.fitness,
            generations = self.config.generations,
            population = pop_size,
            "own fleet layout optimised"
        );
        Ok(best)
    }

    fn evaluate(&self, population: &mut [Individual]) {
        let size = self.size;
        let weights = self.config.weights;
        population.par_iter_mut().for_each(|ind| {
            ind.fitness = fitness(size, &ind.placements, &weights);
        });
    }

    fn fittest(&self, population: &[Individual]) -> Individual {
        population
            .iter()
            .max_by(|a, b| a.fitness.total_cmp(&b.fitness))
            .cloned()
            .unwrap_or(Individual {
                placements: Vec::new(),
                fitness: f64::NEG_INFINITY,
            })
    }

    fn tournament<'a>(&self, population: &'a [Individual], rng: &mut SmallRng) -> &'a Individual {
        let mut best = &population[rng.gen_range(0..population.len())];
        for _ in 1..self.config.tournament_size.max(1) {
            let candidate = &population[rng.gen_range(0..population.len())];
            if candidate.fitness > best.fitness {
                best = candidate;
            }
        }
        best
    }

    /// Takes even-indexed ships from `a`, odd-indexed from `b`. Genes that
    /// collide are re-seated at random; if that fails the child is `a`.
    fn crossover(&self, a: &Individual, b: &Individual, rng: &mut SmallRng) -> Vec<Placement> {
        let mut occ = Occupancy::new(self.size);
        let mut genes: Vec<Option<Placement>> = Vec::with_capacity(self.lengths.len());
        for i in 0..self.lengths.len() {
            let source = if i % 2 == 0 { a } else { b };
            let gene = source.placements[i];
            if occ.fits_apart(&gene) {
                occ.place(&gene);
                genes.push(Some(gene));
            } else {
                genes.push(None);
            }
        }

        let mut child = Vec::with_capacity(genes.len());
        for (i, gene) in genes.into_iter().enumerate() {
            match gene {
                Some(p) => child.push(p),
                None => {
                    match occ.place_random(self.lengths[i], self.config.placement_retries, rng) {
                        Some(p) => child.push(p),
                        None => return a.placements.clone(),
                    }
                }
            }
        }
        child
    }

    /// Moves one random ship to a random free spot, if one is found.
    fn mutate(&self, placements: &mut [Placement], rng: &mut SmallRng) {
        if placements.is_empty() {
            return;
        }
        let idx = rng.gen_range(0..placements.len());
        let mut occ = Occupancy::new(self.size);
        for (i, p) in placements.iter().enumerate() {
            if i != idx {
                occ.place(p);
            }
        }
        if let Some(p) = occ.place_random(placements[idx].length, self.config.placement_retries, rng) {
            placements[idx] = p;
        }
    }
}
