//! Engine state management.
//!
//! One `Engine` owns one match at a time: the opponent board and ledger,
//! the targeting state machine, the layout ensemble, the tactical
//! controller and the engine's own fleet. The opponent profile outlives
//! matches and is only replaced by an explicit load.
//!
//! Per turn, `next_move` asks targeting first, then pocket deduction, then
//! the configured hunt strategy, then plain density, then any unknown cell.
//! Each stage degrades silently to the next. Only ledger mismatches and
//! infeasible own-fleet layouts surface as errors.

use std::fmt;
use std::str::FromStr;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::board::fleet::{FleetLedger, OwnFleet, Strike};
use crate::board::grid::{Board, CellState, Coord};
use crate::config::{ConfigError, EngineConfig};
use crate::eval::deduction::{eliminate_unreachable, find_guaranteed_hit};
use crate::eval::density::{estimate_density, DensityMap};
use crate::eval::ensemble::Ensemble;
use crate::layout::{optimise_layout, LayoutError};
use crate::profile::{
    uniform_baseline, OpponentProfile, PlacementBias, ProfileError, BASELINE_FLEETS,
};
use crate::search::{HuntContext, PlannerStats, SearchBudget, TacticalController, TacticalMode};
use crate::targeting::{opening_move, TargetMode, Targeting};

/// Mixes the outcome counter into the match seed for per-turn RNG streams.
const TURN_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("no match in progress")]
    NoMatch,

    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),

    #[error("({x}, {y}) is outside the {size}x{size} board")]
    OutOfBounds { x: usize, y: usize, size: usize },

    #[error("({x}, {y}) is already resolved")]
    AlreadyResolved { x: usize, y: usize },

    #[error("hit reported at ({x}, {y}), which is known to be empty")]
    Contradiction { x: usize, y: usize },

    #[error(
        "sunk ship of length {length} at {cells:?} has no remaining count in the fleet; \
         cells kept as hits, consider undoing the last outcome"
    )]
    InconsistentSunk { length: usize, cells: Vec<Coord> },

    #[error("own fleet layout failed: {0}")]
    Layout(#[from] LayoutError),

    #[error("own board cell ({x}, {y}) was already struck")]
    AlreadyStruck { x: usize, y: usize },

    #[error("no unknown cells left to shoot")]
    NoMovesLeft,

    #[error(transparent)]
    Profile(#[from] ProfileError),
}

/// Reported result of one of the engine's shots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Miss,
    Hit,
    Sunk,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Outcome::Miss => "miss",
            Outcome::Hit => "hit",
            Outcome::Sunk => "sunk",
        };
        f.write_str(s)
    }
}

impl FromStr for Outcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "miss" | "water" => Ok(Outcome::Miss),
            "hit" | "damaged" => Ok(Outcome::Hit),
            "sunk" => Ok(Outcome::Sunk),
            other => Err(format!("unknown outcome '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveSuggestion {
    pub x: usize,
    pub y: usize,
    pub is_guaranteed: bool,
    pub alternates: Vec<Coord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellUpdate {
    pub x: usize,
    pub y: usize,
    pub new_state: CellState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeReport {
    pub updated_cells: Vec<CellUpdate>,
    pub game_over: bool,
    pub won: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrikeReport {
    pub hit: bool,
    /// Every cell of the ship this strike completed, if any.
    pub sunk_cells: Option<Vec<Coord>>,
    /// True once every own ship is sunk.
    pub game_over: bool,
}

/// Planner statistics from the most recent hunt decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchReport {
    pub stats: PlannerStats,
    pub mode: TacticalMode,
}

/// State of one match.
#[derive(Debug, Clone, PartialEq)]
struct Match {
    size: usize,
    seed: u64,
    board: Board,
    ledger: FleetLedger,
    targeting: Targeting,
    ensemble: Ensemble,
    tactics: TacticalController,
    own: OwnFleet,
    /// Region shares of a uniformly placed fleet, for profile bias.
    baseline: PlacementBias,
    last_move: Option<Coord>,
    /// Outcomes applied so far; also salts the per-turn RNG.
    outcomes: u64,
}

/// Full engine state for undo, opaque to the host.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    state: Option<Match>,
    profile: OpponentProfile,
}

/// Holds the mutable state of the engine between commands.
pub struct Engine {
    config: EngineConfig,
    current: Option<Match>,
    profile: OpponentProfile,
    last_search: Option<SearchReport>,
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new(EngineConfig::default())
    }
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let profile = OpponentProfile::new(config.profile_decay);
        Engine {
            config,
            current: None,
            profile,
            last_search: None,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Applies one `setoption`. Takes effect for the next decision; the
    /// ensemble and own layout of a running match are not rebuilt.
    pub fn set_option(&mut self, name: &str, value: Option<&str>) -> Result<(), EngineError> {
        self.config.set_option(name, value)?;
        self.profile.set_decay(self.config.profile_decay);
        Ok(())
    }

    /// Starts a match: lays out the own fleet and samples the ensemble.
    ///
    /// Returns the own layout as a flat row-major grid of 0/1.
    pub fn new_match(&mut self, size: usize, lengths: &[usize]) -> Result<Vec<u8>, EngineError> {
        let seed = if self.config.seed == 0 {
            SmallRng::from_entropy().gen()
        } else {
            self.config.seed
        };
        let mut rng = SmallRng::seed_from_u64(seed);

        let placements = optimise_layout(size, lengths, &self.config.genetic, &mut rng)?;
        let own = OwnFleet::new(size, &placements, self.config.sink_rule);
        let ensemble = Ensemble::generate(
            size,
            lengths,
            self.config.ensemble_size,
            self.config
                .ensemble_size
                .saturating_mul(self.config.ensemble_attempts),
            &mut rng,
        );
        let baseline = uniform_baseline(size, lengths, BASELINE_FLEETS, &mut rng);
        info!(
            size,
            ships = lengths.len(),
            seed,
            ensemble = ensemble.len(),
            "new match"
        );

        let grid = own.layout_grid();
        self.current = Some(Match {
            size,
            seed,
            board: Board::new(size),
            ledger: FleetLedger::new(lengths),
            targeting: Targeting::new(),
            ensemble,
            tactics: TacticalController::new(self.config.tactics_window),
            own,
            baseline,
            last_move: None,
            outcomes: 0,
        });
        self.last_search = None;
        Ok(grid)
    }

    /// Suggests the next shot. Does not change any evidence; repeated calls
    /// without an intervening outcome return the same suggestion when the
    /// planner runs on an iteration budget.
    pub fn next_move(&mut self) -> Result<MoveSuggestion, EngineError> {
        let config = &self.config;
        let profile = &self.profile;
        let m = self.current.as_mut().ok_or(EngineError::NoMatch)?;
        if m.board.count(CellState::Unknown) == 0 {
            return Err(EngineError::NoMovesLeft);
        }
        let mut rng = SmallRng::seed_from_u64(m.seed ^ m.outcomes.wrapping_mul(TURN_SALT));

        let density = biased_density(config, profile, &m.baseline, &m.board, &m.ledger);
        let alternates_from = |board: &Board, chosen: Coord, ranked: Vec<Coord>| -> Vec<Coord> {
            ranked
                .into_iter()
                .filter(|&c| c != chosen && board.get(c) == CellState::Unknown)
                .take(config.alternates)
                .collect()
        };

        let mut search = None;
        let first_shot = m.outcomes == 0 && m.targeting.mode() == TargetMode::Hunt;
        let (coord, is_guaranteed, alternates) = if first_shot {
            let c = opening_move(m.size, &mut rng);
            (c, false, alternates_from(&m.board, c, density.ranked(&m.board)))
        } else if let Some(c) = targeted(&m.targeting, &m.board) {
            let rest = m.targeting.queue().iter().copied().collect();
            (c, false, alternates_from(&m.board, c, rest))
        } else if let Some(c) = find_guaranteed_hit(&m.board, &m.ledger) {
            debug!(x = c.x, y = c.y, "guaranteed hit");
            (c, true, Vec::new())
        } else {
            let mode = m.tactics.update(
                m.own.ships_left(),
                m.own.ships().len(),
                m.ledger.ships_left(),
                m.ledger.total_ships(),
            );
            let budget = SearchBudget {
                iterations: config.mcts_iterations,
                movetime: m.tactics.movetime(&config.mode_budgets()),
                hard_ceiling: config.hard_ceiling(),
                cautious: m.tactics.is_cautious(),
            };
            let ctx = HuntContext {
                board: &m.board,
                ledger: &m.ledger,
                ensemble: &m.ensemble,
                density: &density,
                budget: &budget,
                alternates: config.alternates,
            };
            let policy = config.strategy.build(config.planner());
            match policy.choose(&ctx, &mut rng) {
                Some(choice) => {
                    if let Some(stats) = choice.stats {
                        search = Some(SearchReport { stats, mode });
                    }
                    (
                        choice.coord,
                        false,
                        alternates_from(&m.board, choice.coord, choice.alternates),
                    )
                }
                None => {
                    debug!(strategy = policy.name(), "strategy had no move; using density");
                    match density.best(&m.board) {
                        Some(c) => {
                            let ranked = density.ranked(&m.board);
                            (c, false, alternates_from(&m.board, c, ranked))
                        }
                        None => {
                            let open: Vec<Coord> = m.board.coords_in(CellState::Unknown).collect();
                            let c = open[rng.gen_range(0..open.len())];
                            (c, false, Vec::new())
                        }
                    }
                }
            }
        };

        m.last_move = Some(coord);
        self.last_search = search;
        Ok(MoveSuggestion {
            x: coord.x,
            y: coord.y,
            is_guaranteed,
            alternates,
        })
    }

    /// Records the outcome of a shot at `(x, y)`.
    pub fn apply_outcome(
        &mut self,
        x: usize,
        y: usize,
        outcome: Outcome,
    ) -> Result<OutcomeReport, EngineError> {
        let m = self.current.as_mut().ok_or(EngineError::NoMatch)?;
        if !m.board.in_bounds(x, y) {
            return Err(EngineError::OutOfBounds { x, y, size: m.size });
        }
        let c = Coord::new(x, y);
        let hit = outcome != Outcome::Miss;
        match m.board.get(c) {
            CellState::Unknown => {}
            s if hit && s.is_empty_water() => {
                return Err(EngineError::Contradiction { x, y });
            }
            _ => return Err(EngineError::AlreadyResolved { x, y }),
        }

        m.outcomes += 1;
        m.tactics.record_shot(hit);
        m.ensemble.apply(c, hit);

        let mut updated = Vec::new();
        let mut result = Ok(());
        match outcome {
            Outcome::Miss => {
                m.board.set(c, CellState::Miss);
                updated.push(update(c, CellState::Miss));
                m.targeting.on_miss(&m.board);
            }
            Outcome::Hit => {
                m.board.set(c, CellState::Hit);
                updated.push(update(c, CellState::Hit));
                m.targeting.on_hit(c, &m.board);
            }
            Outcome::Sunk => {
                m.board.set(c, CellState::Hit);
                match m.targeting.on_sunk(c, &mut m.board, &mut m.ledger) {
                    Ok(sunk) => {
                        updated.extend(sunk.cells.iter().map(|&s| update(s, CellState::Sunk)));
                        updated.extend(sunk.cleared.iter().map(|&s| update(s, CellState::Miss)));
                        self.profile.observe_ship(&sunk.cells, m.size);
                        info!(length = sunk.cells.len(), left = m.ledger.ships_left(), "ship sunk");
                    }
                    Err(mismatch) => {
                        warn!(
                            length = mismatch.length,
                            cells = ?mismatch.cells,
                            "sunk report does not match the fleet ledger"
                        );
                        result = Err(EngineError::InconsistentSunk {
                            length: mismatch.length,
                            cells: mismatch.cells,
                        });
                    }
                }
            }
        }

        let water = eliminate_unreachable(&mut m.board, &m.ledger);
        updated.extend(water.iter().map(|&w| update(w, CellState::Water)));
        if !water.is_empty() {
            m.targeting.refresh(&m.board);
        }
        result?;

        let won = m.ledger.is_cleared();
        Ok(OutcomeReport {
            updated_cells: updated,
            game_over: won || m.own.all_sunk(),
            won,
        })
    }

    /// Applies an opponent strike against the engine's own fleet.
    pub fn apply_strike_on_own_board(
        &mut self,
        x: usize,
        y: usize,
    ) -> Result<StrikeReport, EngineError> {
        let m = self.current.as_mut().ok_or(EngineError::NoMatch)?;
        if x >= m.size || y >= m.size {
            return Err(EngineError::OutOfBounds { x, y, size: m.size });
        }
        let (hit, sunk_cells) = match m.own.strike(Coord::new(x, y)) {
            Strike::Repeat => return Err(EngineError::AlreadyStruck { x, y }),
            Strike::Miss => (false, None),
            Strike::Hit { .. } => (true, None),
            Strike::Sunk { cells, .. } => (true, Some(cells)),
        };
        Ok(StrikeReport {
            hit,
            sunk_cells,
            game_over: m.own.all_sunk(),
        })
    }

    /// Blended opponent profile as a JSON blob for host-side storage.
    pub fn opponent_profile(&self) -> Result<String, EngineError> {
        Ok(self.profile.export()?)
    }

    /// Loads a profile blob produced by [`Engine::opponent_profile`].
    pub fn load_opponent_profile(&mut self, data: &str) -> Result<(), EngineError> {
        Ok(self.profile.load(data)?)
    }

    pub fn profile(&self) -> &OpponentProfile {
        &self.profile
    }

    /// Deep copy of the whole engine state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            state: self.current.clone(),
            profile: self.profile.clone(),
        }
    }

    pub fn restore(&mut self, snapshot: Snapshot) {
        self.current = snapshot.state;
        self.profile = snapshot.profile;
    }

    pub fn opponent_board(&self) -> Result<&Board, EngineError> {
        Ok(&self.current.as_ref().ok_or(EngineError::NoMatch)?.board)
    }

    pub fn ledger(&self) -> Result<&FleetLedger, EngineError> {
        Ok(&self.current.as_ref().ok_or(EngineError::NoMatch)?.ledger)
    }

    pub fn own_fleet(&self) -> Result<&OwnFleet, EngineError> {
        Ok(&self.current.as_ref().ok_or(EngineError::NoMatch)?.own)
    }

    pub fn targeting(&self) -> Result<&Targeting, EngineError> {
        Ok(&self.current.as_ref().ok_or(EngineError::NoMatch)?.targeting)
    }

    pub fn ensemble(&self) -> Result<&Ensemble, EngineError> {
        Ok(&self.current.as_ref().ok_or(EngineError::NoMatch)?.ensemble)
    }

    pub fn last_move(&self) -> Option<Coord> {
        self.current.as_ref().and_then(|m| m.last_move)
    }

    pub fn last_search(&self) -> Option<SearchReport> {
        self.last_search
    }
}

fn update(c: Coord, state: CellState) -> CellUpdate {
    CellUpdate {
        x: c.x,
        y: c.y,
        new_state: state,
    }
}

/// Next queued target cell that is still unknown.
fn targeted(targeting: &Targeting, board: &Board) -> Option<Coord> {
    if targeting.mode() != TargetMode::Target {
        return None;
    }
    targeting
        .queue()
        .iter()
        .copied()
        .find(|&c| board.get(c) == CellState::Unknown)
}

/// Parity-damped density, scaled by the opponent profile once it has
/// enough observations.
fn biased_density(
    config: &EngineConfig,
    profile: &OpponentProfile,
    baseline: &PlacementBias,
    board: &Board,
    ledger: &FleetLedger,
) -> DensityMap {
    let mut density = estimate_density(board, ledger, config.parity_damping);
    if config.profile_weight > 0.0 {
        let size = board.size();
        density.scale(|c| profile.density_factor(c, size, config.profile_weight, baseline));
    }
    density
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick_config(seed: u64) -> EngineConfig {
        let mut config = EngineConfig {
            seed,
            ensemble_size: 200,
            mcts_iterations: Some(200),
            ..EngineConfig::default()
        };
        config.genetic.population = 10;
        config.genetic.generations = 3;
        config
    }

    fn started(seed: u64) -> Engine {
        let mut engine = Engine::new(quick_config(seed));
        engine.new_match(10, &[5, 4, 3, 3, 2]).expect("standard fleet fits");
        engine
    }

    #[test]
    fn calls_before_a_match_fail() {
        let mut engine = Engine::default();
        assert!(matches!(engine.next_move(), Err(EngineError::NoMatch)));
        assert!(matches!(
            engine.apply_outcome(0, 0, Outcome::Miss),
            Err(EngineError::NoMatch)
        ));
        assert!(matches!(engine.opponent_board(), Err(EngineError::NoMatch)));
    }

    #[test]
    fn new_match_returns_own_layout() {
        let mut engine = Engine::new(quick_config(1));
        let grid = engine.new_match(10, &[5, 4, 3, 3, 2]).unwrap();
        assert_eq!(grid.len(), 100);
        assert_eq!(grid.iter().filter(|&&b| b == 1).count(), 17);
        assert_eq!(engine.targeting().unwrap().mode(), TargetMode::Hunt);
        assert_eq!(engine.ensemble().unwrap().len(), 200);
    }

    #[test]
    fn infeasible_fleet_is_fatal() {
        let mut engine = Engine::new(quick_config(1));
        let err = engine.new_match(3, &[3, 3, 3]).unwrap_err();
        assert!(matches!(err, EngineError::Layout(LayoutError::Infeasible { .. })));
    }

    #[test]
    fn opening_move_is_near_center_and_repeatable() {
        let mut engine = started(5);
        let a = engine.next_move().unwrap();
        let b = engine.next_move().unwrap();
        assert_eq!(a, b);
        assert!((4..=5).contains(&a.x) && (4..=5).contains(&a.y));
        assert!(!a.is_guaranteed);
    }

    #[test]
    fn hit_switches_to_targeting_neighbors() {
        let mut engine = started(6);
        let report = engine.apply_outcome(4, 4, Outcome::Hit).unwrap();
        assert_eq!(report.updated_cells[0], update(Coord::new(4, 4), CellState::Hit));
        assert!(!report.game_over);
        let mv = engine.next_move().unwrap();
        assert_eq!(Coord::new(4, 4).chebyshev(Coord::new(mv.x, mv.y)), 1);
        assert!(mv.x == 4 || mv.y == 4);
    }

    #[test]
    fn outcome_validation() {
        let mut engine = started(7);
        assert!(matches!(
            engine.apply_outcome(10, 0, Outcome::Miss),
            Err(EngineError::OutOfBounds { x: 10, y: 0, size: 10 })
        ));
        engine.apply_outcome(0, 0, Outcome::Miss).unwrap();
        assert!(matches!(
            engine.apply_outcome(0, 0, Outcome::Miss),
            Err(EngineError::AlreadyResolved { x: 0, y: 0 })
        ));
        assert!(matches!(
            engine.apply_outcome(0, 0, Outcome::Hit),
            Err(EngineError::Contradiction { x: 0, y: 0 })
        ));
    }

    #[test]
    fn strikes_on_own_board() {
        let mut engine = started(8);
        let own = engine.own_fleet().unwrap().clone();
        let ship = own.ships()[own.ships().len() - 1].clone();
        let mut last = None;
        for c in &ship.cells {
            last = Some(engine.apply_strike_on_own_board(c.x, c.y).unwrap());
        }
        let last = last.unwrap();
        assert!(last.hit);
        assert_eq!(last.sunk_cells.as_deref(), Some(&ship.cells[..]));
        assert!(!last.game_over);
        let c = ship.cells[0];
        assert!(matches!(
            engine.apply_strike_on_own_board(c.x, c.y),
            Err(EngineError::AlreadyStruck { .. })
        ));
    }

    #[test]
    fn snapshot_restore_round_trip() {
        let mut engine = started(9);
        engine.apply_outcome(4, 4, Outcome::Miss).unwrap();
        let snap = engine.snapshot();
        let before = engine.next_move().unwrap();

        engine.apply_outcome(before.x, before.y, Outcome::Hit).unwrap();
        let shot = Coord::new(before.x, before.y);
        assert_ne!(engine.opponent_board().unwrap().get(shot), CellState::Unknown);

        engine.restore(snap);
        let after = engine.next_move().unwrap();
        assert_eq!(before, after);
        assert_eq!(engine.opponent_board().unwrap().get(shot), CellState::Unknown);
    }

    #[test]
    fn every_strategy_produces_moves() {
        for strategy in ["density", "minimax", "entropy", "mcts"] {
            let mut engine = Engine::new(quick_config(10));
            engine.set_option("Strategy", Some(strategy)).unwrap();
            engine.new_match(10, &[5, 4, 3, 3, 2]).unwrap();
            engine.apply_outcome(4, 4, Outcome::Miss).unwrap();
            let mv = engine.next_move().unwrap();
            assert_eq!(
                engine.opponent_board().unwrap().get(Coord::new(mv.x, mv.y)),
                CellState::Unknown
            );
            assert!(mv.alternates.len() <= 4);
        }
    }

    #[test]
    fn mcts_records_search_stats() {
        let mut engine = started(11);
        engine.apply_outcome(4, 4, Outcome::Miss).unwrap();
        engine.next_move().unwrap();
        let report = engine.last_search().expect("planner ran");
        assert_eq!(report.stats.iterations, 200);
    }

    #[test]
    fn eliminated_cells_leave_the_target_queue() {
        let mut engine = Engine::new(quick_config(13));
        engine.new_match(10, &[3]).unwrap();
        for (x, y) in [(3, 5), (5, 5), (4, 6)] {
            engine.apply_outcome(x, y, Outcome::Miss).unwrap();
        }
        engine.apply_outcome(4, 4, Outcome::Hit).unwrap();
        let report = engine.apply_outcome(4, 3, Outcome::Miss).unwrap();
        assert!(report
            .updated_cells
            .contains(&update(Coord::new(4, 5), CellState::Water)));

        let board = engine.opponent_board().unwrap();
        let targeting = engine.targeting().unwrap();
        assert!(targeting
            .queue()
            .iter()
            .all(|&c| board.get(c) == CellState::Unknown));

        let mv = engine.next_move().unwrap();
        let board = engine.opponent_board().unwrap();
        assert_eq!(board.get(Coord::new(mv.x, mv.y)), CellState::Unknown);
        assert!(mv.alternates.iter().all(|&c| board.get(c) == CellState::Unknown));
        assert!(!mv.alternates.contains(&Coord::new(4, 5)));
    }

    #[test]
    fn oversized_ensemble_options_are_rejected() {
        let mut engine = Engine::new(quick_config(14));
        assert!(matches!(
            engine.set_option("EnsembleSize", Some("1000000000000000000")),
            Err(EngineError::InvalidConfig(ConfigError::InvalidValue { .. }))
        ));
        engine.new_match(10, &[5, 4, 3, 3, 2]).unwrap();
        assert_eq!(engine.ensemble().unwrap().len(), 200);
    }

    #[test]
    fn loaded_profile_steers_the_planner() {
        use crate::profile::Region;

        let hunt = |profile: Option<&str>| {
            let mut engine = Engine::new(quick_config(15));
            engine.set_option("ProfileWeight", Some("1")).unwrap();
            if let Some(blob) = profile {
                engine.load_opponent_profile(blob).unwrap();
            }
            engine.new_match(10, &[5, 4, 3, 3, 2]).unwrap();
            engine.apply_outcome(4, 4, Outcome::Miss).unwrap();
            let mv = engine.next_move().unwrap();
            assert!(engine.last_search().is_some());
            mv
        };

        let plain = hunt(None);
        assert_ne!(Region::of(Coord::new(plain.x, plain.y), 10), Region::Corner);

        let cornered = hunt(Some(r#"{"placementBias":{"corner":10.0}}"#));
        assert_eq!(Region::of(Coord::new(cornered.x, cornered.y), 10), Region::Corner);
        assert!(cornered
            .alternates
            .iter()
            .all(|&c| Region::of(c, 10) == Region::Corner));
    }

    #[test]
    fn unknown_option_is_rejected() {
        let mut engine = Engine::default();
        assert!(matches!(
            engine.set_option("Threads", Some("4")),
            Err(EngineError::InvalidConfig(ConfigError::UnknownOption(_)))
        ));
    }

    #[test]
    fn profile_round_trips_through_engine() {
        let mut engine = started(12);
        engine.apply_outcome(0, 0, Outcome::Hit).unwrap();
        engine.apply_outcome(1, 0, Outcome::Sunk).unwrap();
        let blob = engine.opponent_profile().unwrap();
        let mut other = Engine::default();
        other.load_opponent_profile(&blob).unwrap();
        assert!(other.profile().observations() > 0.0);
        assert!(matches!(
            other.load_opponent_profile("{"),
            Err(EngineError::Profile(_))
        ));
    }
}
