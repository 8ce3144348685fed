//! Interchangeable hunt-mode shot selection.
//!
//! Every strategy answers the same question (which unknown cell to shoot
//! next while no ship is being targeted) from the same context, so the
//! engine can switch between them by configuration.

use std::fmt;
use std::str::FromStr;

use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};

use crate::board::fleet::FleetLedger;
use crate::board::grid::{Board, Coord};
use crate::eval::density::DensityMap;
use crate::eval::ensemble::Ensemble;

use super::mcts::{MctsPlanner, PlannerStats, SearchBudget};

/// Everything a hunt policy may consult.
pub struct HuntContext<'a> {
    pub board: &'a Board,
    pub ledger: &'a FleetLedger,
    pub ensemble: &'a Ensemble,
    /// Density map with parity damping and any profile bias applied.
    pub density: &'a DensityMap,
    pub budget: &'a SearchBudget,
    /// Maximum runner-up cells to report.
    pub alternates: usize,
}

/// A chosen shot plus runner-up candidates.
#[derive(Debug, Clone, PartialEq)]
pub struct ShotChoice {
    pub coord: Coord,
    pub alternates: Vec<Coord>,
    /// Present when the choice came from tree search.
    pub stats: Option<PlannerStats>,
}

impl ShotChoice {
    fn from_ranked(ranked: Vec<Coord>, alternates: usize) -> Option<Self> {
        let mut iter = ranked.into_iter();
        let coord = iter.next()?;
        Some(ShotChoice {
            coord,
            alternates: iter.take(alternates).collect(),
            stats: None,
        })
    }
}

/// A hunt-mode shot selector. Returns `None` when it has no opinion, in
/// which case the engine falls back to the next strategy.
pub trait HuntPolicy {
    fn name(&self) -> &'static str;
    fn choose(&self, ctx: &HuntContext<'_>, rng: &mut SmallRng) -> Option<ShotChoice>;
}

/// Highest placement density.
pub struct DensityPolicy;

impl HuntPolicy for DensityPolicy {
    fn name(&self) -> &'static str {
        "density"
    }

    fn choose(&self, ctx: &HuntContext<'_>, _rng: &mut SmallRng) -> Option<ShotChoice> {
        ShotChoice::from_ranked(ctx.density.ranked(ctx.board), ctx.alternates)
    }
}

/// Cell that is hardest to rule out in the worst case over the ensemble.
pub struct MinimaxPolicy;

impl HuntPolicy for MinimaxPolicy {
    fn name(&self) -> &'static str {
        "minimax"
    }

    fn choose(&self, ctx: &HuntContext<'_>, _rng: &mut SmallRng) -> Option<ShotChoice> {
        ShotChoice::from_ranked(ctx.ensemble.minimax_ranked(ctx.board), ctx.alternates)
    }
}

/// Cell minimizing expected remaining uncertainty over the ensemble.
pub struct EntropyPolicy;

impl HuntPolicy for EntropyPolicy {
    fn name(&self) -> &'static str {
        "entropy"
    }

    fn choose(&self, ctx: &HuntContext<'_>, _rng: &mut SmallRng) -> Option<ShotChoice> {
        ShotChoice::from_ranked(ctx.ensemble.entropy_ranked(ctx.board), ctx.alternates)
    }
}

/// Tree search whose root candidates come from the context's density map.
pub struct MctsPolicy {
    pub planner: MctsPlanner,
}

impl HuntPolicy for MctsPolicy {
    fn name(&self) -> &'static str {
        "mcts"
    }

    fn choose(&self, ctx: &HuntContext<'_>, rng: &mut SmallRng) -> Option<ShotChoice> {
        let root = ctx.density.ranked(ctx.board);
        let result = self
            .planner
            .plan_ranked(ctx.board, ctx.ledger, root, ctx.budget, rng);
        let coord = result.best?;
        let mut alternates = result.alternates;
        alternates.truncate(ctx.alternates);
        Some(ShotChoice {
            coord,
            alternates,
            stats: Some(result.stats),
        })
    }
}

/// Configured hunt strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HuntStrategy {
    #[default]
    Mcts,
    Density,
    Minimax,
    Entropy,
}

impl HuntStrategy {
    pub fn build(self, planner: MctsPlanner) -> Box<dyn HuntPolicy> {
        match self {
            HuntStrategy::Mcts => Box::new(MctsPolicy { planner }),
            HuntStrategy::Density => Box::new(DensityPolicy),
            HuntStrategy::Minimax => Box::new(MinimaxPolicy),
            HuntStrategy::Entropy => Box::new(EntropyPolicy),
        }
    }
}

impl fmt::Display for HuntStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HuntStrategy::Mcts => "mcts",
            HuntStrategy::Density => "density",
            HuntStrategy::Minimax => "minimax",
            HuntStrategy::Entropy => "entropy",
        };
        f.write_str(s)
    }
}

impl FromStr for HuntStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mcts" => Ok(HuntStrategy::Mcts),
            "density" => Ok(HuntStrategy::Density),
            "minimax" => Ok(HuntStrategy::Minimax),
            "entropy" => Ok(HuntStrategy::Entropy),
            other => Err(format!("unknown strategy '{}'", other)),
        }
    }
}
