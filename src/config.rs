//! Engine configuration.
//!
//! Every tunable lives in `EngineConfig`. Hosts adjust it through
//! `setoption name <id> value <x>`; ids are matched case-insensitively and
//! ignore `_`, `-` and spaces, so `MctsIterations`, `mcts_iterations` and
//! `mcts-iterations` are the same option.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::board::fleet::SinkRule;
use crate::layout::GeneticConfig;
use crate::search::{HuntStrategy, MctsPlanner, ModeBudgets};

/// Largest ensemble a host may request.
pub const MAX_ENSEMBLE_SIZE: usize = 100_000;
/// Largest per-member sampling attempt count a host may request.
pub const MAX_ENSEMBLE_ATTEMPTS: usize = 1_000;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown option: {0}")]
    UnknownOption(String),

    #[error("option {0} requires a value")]
    MissingValue(String),

    #[error("invalid value '{value}' for option {name}")]
    InvalidValue { name: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub strategy: HuntStrategy,
    /// Match seed; 0 draws one from OS entropy.
    pub seed: u64,
    pub ensemble_size: usize,
    /// Sampling attempts per requested ensemble member.
    pub ensemble_attempts: usize,
    pub parity_damping: f64,
    /// Fixed planner iterations per move; `None` uses the tactical time budget.
    pub mcts_iterations: Option<u64>,
    pub mcts_branching: usize,
    pub mcts_rollout_fraction: f64,
    pub hard_ceiling_ms: u64,
    pub aggressive_ms: u64,
    pub balanced_ms: u64,
    pub cautious_ms: u64,
    pub tactics_window: usize,
    pub sink_rule: SinkRule,
    /// Runner-up cells reported with each move.
    pub alternates: usize,
    pub profile_weight: f64,
    pub profile_decay: f64,
    pub genetic: GeneticConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            strategy: HuntStrategy::Mcts,
            seed: 0,
            ensemble_size: 2000,
            ensemble_attempts: 20,
            parity_damping: 0.1,
            mcts_iterations: None,
            mcts_branching: 10,
            mcts_rollout_fraction: 0.3,
            hard_ceiling_ms: 2000,
            aggressive_ms: 120,
            balanced_ms: 250,
            cautious_ms: 500,
            tactics_window: 10,
            sink_rule: SinkRule::AllSegments,
            alternates: 4,
            profile_weight: 0.2,
            profile_decay: 0.8,
            genetic: GeneticConfig::default(),
        }
    }
}

fn invalid(name: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        name: name.to_string(),
        value: value.to_string(),
    }
}

fn parse<T: FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse::<T>().map_err(|_| invalid(name, value))
}

/// Parses a count that must not exceed `max`.
fn parse_at_most(name: &str, value: &str, max: usize) -> Result<usize, ConfigError> {
    let v: usize = parse(name, value)?;
    if v > max {
        return Err(invalid(name, value));
    }
    Ok(v)
}

/// Parses a value that must lie in `[0, 1]`.
fn parse_unit(name: &str, value: &str) -> Result<f64, ConfigError> {
    let v: f64 = parse(name, value)?;
    if !(0.0..=1.0).contains(&v) {
        return Err(invalid(name, value));
    }
    Ok(v)
}

fn parse_sink_rule(name: &str, value: &str) -> Result<SinkRule, ConfigError> {
    match normalize(value).as_str() {
        "allsegments" | "standard" => Ok(SinkRule::AllSegments),
        "middleofthree" | "middle" => Ok(SinkRule::MiddleOfThree),
        _ => Err(invalid(name, value)),
    }
}

fn normalize(id: &str) -> String {
    id.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

impl EngineConfig {
    /// Applies one `setoption`. Leaves the config untouched on error.
    pub fn set_option(&mut self, name: &str, value: Option<&str>) -> Result<(), ConfigError> {
        let value = value.ok_or_else(|| ConfigError::MissingValue(name.to_string()))?;
        match normalize(name).as_str() {
            "strategy" => self.strategy = parse(name, value)?,
            "seed" => self.seed = parse(name, value)?,
            "ensemblesize" => {
                self.ensemble_size = parse_at_most(name, value, MAX_ENSEMBLE_SIZE)?
            }
            "ensembleattempts" => {
                self.ensemble_attempts = parse_at_most(name, value, MAX_ENSEMBLE_ATTEMPTS)?
            }
            "paritydamping" => self.parity_damping = parse_unit(name, value)?,
            "mctsiterations" => {
                let n: u64 = parse(name, value)?;
                self.mcts_iterations = (n > 0).then_some(n);
            }
            "mctsbranching" => self.mcts_branching = parse(name, value)?,
            "rolloutfraction" | "mctsrolloutfraction" => {
                self.mcts_rollout_fraction = parse_unit(name, value)?
            }
            "hardceiling" | "hardceilingms" => self.hard_ceiling_ms = parse(name, value)?,
            "aggressivetime" | "aggressivems" => self.aggressive_ms = parse(name, value)?,
            "balancedtime" | "balancedms" => self.balanced_ms = parse(name, value)?,
            "cautioustime" | "cautiousms" => self.cautious_ms = parse(name, value)?,
            "tacticswindow" => self.tactics_window = parse(name, value)?,
            "sinkrule" => self.sink_rule = parse_sink_rule(name, value)?,
            "alternates" => self.alternates = parse(name, value)?,
            "profileweight" => self.profile_weight = parse_unit(name, value)?,
            "profiledecay" => self.profile_decay = parse_unit(name, value)?,
            "population" => self.genetic.population = parse(name, value)?,
            "generations" => self.genetic.generations = parse(name, value)?,
            "elitefraction" => self.genetic.elite_fraction = parse_unit(name, value)?,
            "tournamentsize" => self.genetic.tournament_size = parse(name, value)?,
            "mutationrate" => self.genetic.mutation_rate = parse_unit(name, value)?,
            "placementretries" => self.genetic.placement_retries = parse(name, value)?,
            "layoutrestarts" => self.genetic.layout_restarts = parse(name, value)?,
            _ => return Err(ConfigError::UnknownOption(name.to_string())),
        }
        Ok(())
    }

    pub fn planner(&self) -> MctsPlanner {
        MctsPlanner::new(
            self.mcts_branching,
            self.mcts_rollout_fraction,
            self.parity_damping,
        )
    }

    pub fn mode_budgets(&self) -> ModeBudgets {
        ModeBudgets {
            aggressive: Duration::from_millis(self.aggressive_ms),
            balanced: Duration::from_millis(self.balanced_ms),
            cautious: Duration::from_millis(self.cautious_ms),
        }
    }

    pub fn hard_ceiling(&self) -> Duration {
        Duration::from_millis(self.hard_ceiling_ms)
    }
}
