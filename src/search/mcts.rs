//! Monte Carlo tree search over hypothetical shot sequences.
//!
//! Nodes live in a flat arena and link to their parent by index. Each node
//! owns a cloned board, with the shots leading to it marked `Miss` since the
//! real outcome is unknown while planning. Candidate moves are the top cells
//! of the density ranking (the bottom ones in cautious mode), computed on
//! first visit and reused by the rollout from that node. The caller may
//! supply the root ranking, e.g. one biased by an opponent profile.
//!
//! The deadline is checked between iterations only. When it passes, the most
//! visited root child found so far is returned.

use std::time::{Duration, Instant};

use rand::Rng;
use tracing::{debug, info};

use crate::board::fleet::FleetLedger;
use crate::board::grid::{Board, CellState, Coord};
use crate::eval::density::estimate_density;

/// UCB1 exploration constant.
const EXPLORATION: f64 = std::f64::consts::SQRT_2;

/// Limits for one planning call.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchBudget {
    /// Fixed iteration count. When set, `movetime` is ignored, which makes
    /// the result reproducible for a given RNG seed.
    pub iterations: Option<u64>,
    pub movetime: Duration,
    /// Absolute wall-clock cap, applied in every mode.
    pub hard_ceiling: Duration,
    /// Prefer low-density cells as candidates.
    pub cautious: bool,
}

impl SearchBudget {
    pub fn iterations(n: u64) -> Self {
        SearchBudget {
            iterations: Some(n),
            movetime: Duration::ZERO,
            hard_ceiling: Duration::from_secs(60),
            cautious: false,
        }
    }
}

/// Search statistics emitted via `info` lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlannerStats {
    pub iterations: u64,
    pub nodes: usize,
    pub elapsed_ms: u64,
    /// True if the hard ceiling cut the search short.
    pub timed_out: bool,
}

/// Result of a planning call.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanResult {
    pub best: Option<Coord>,
    /// Other root moves, most visited first.
    pub alternates: Vec<Coord>,
    pub stats: PlannerStats,
}

struct Node {
    board: Board,
    ledger: FleetLedger,
    parent: Option<usize>,
    mv: Option<Coord>,
    visits: u32,
    score: f64,
    /// Density-ranked `Unknown` cells, computed on first visit.
    ranked: Option<Vec<Coord>>,
    /// Candidate moves not yet expanded, stored so `pop` yields the next one.
    untried: Vec<Coord>,
    children: Vec<usize>,
}

impl Node {
    fn new(board: Board, ledger: FleetLedger, parent: Option<usize>, mv: Option<Coord>) -> Self {
        Node {
            board,
            ledger,
            parent,
            mv,
            visits: 0,
            score: 0.0,
            ranked: None,
            untried: Vec::new(),
            children: Vec::new(),
        }
    }

    fn ucb(&self, parent_visits: u32) -> f64 {
        if self.visits == 0 {
            return f64::INFINITY;
        }
        let n = self.visits as f64;
        self.score / n + EXPLORATION * ((parent_visits as f64).ln() / n).sqrt()
    }
}

/// Tree search planner for hunt moves.
#[derive(Debug, Clone, PartialEq)]
pub struct MctsPlanner {
    /// Candidate moves per node.
    pub branching: usize,
    /// Rollout depth as a fraction of the unknown cells.
    pub rollout_fraction: f64,
    pub parity_damping: f64,
}

impl Default for MctsPlanner {
    fn default() -> Self {
        MctsPlanner {
            branching: 10,
            rollout_fraction: 0.3,
            parity_damping: 0.1,
        }
    }
}

impl MctsPlanner {
    pub fn new(branching: usize, rollout_fraction: f64, parity_damping: f64) -> Self {
        MctsPlanner {
            branching: branching.max(1),
            rollout_fraction,
            parity_damping,
        }
    }

    /// Runs the search from `board` and returns the most visited root move.
    pub fn plan<R: Rng>(
        &self,
        board: &Board,
        ledger: &FleetLedger,
        budget: &SearchBudget,
        rng: &mut R,
    ) -> PlanResult {
        let ranked = estimate_density(board, ledger, self.parity_damping).ranked(board);
        self.plan_ranked(board, ledger, ranked, budget, rng)
    }

    /// Like [`MctsPlanner::plan`], but the root candidates come from
    /// `root_ranked` (best first) instead of the plain density ranking.
    /// Deeper nodes still rank by plain density.
    pub fn plan_ranked<R: Rng>(
        &self,
        board: &Board,
        ledger: &FleetLedger,
        root_ranked: Vec<Coord>,
        budget: &SearchBudget,
        rng: &mut R,
    ) -> PlanResult {
        let start = Instant::now();
        let mut nodes = vec![Node::new(board.clone(), ledger.clone(), None, None)];
        self.seed(&mut nodes[0], root_ranked, budget.cautious);

        let mut iterations: u64 = 0;
        let mut timed_out = false;
        loop {
            if let Some(limit) = budget.iterations {
                if iterations >= limit {
                    break;
                }
            } else if start.elapsed() >= budget.movetime {
                break;
            }
            if start.elapsed() >= budget.hard_ceiling {
                timed_out = true;
                break;
            }
            if nodes[0].untried.is_empty() && nodes[0].children.is_empty() {
                break;
            }

            let leaf = self.select_and_expand(&mut nodes, budget.cautious);
            let value = self.rollout(&mut nodes[leaf], budget.cautious, rng);
            backpropagate(&mut nodes, leaf, value);
            iterations += 1;
        }

        let mut root_children: Vec<(u32, usize)> = nodes[0]
            .children
            .iter()
            .map(|&c| (nodes[c].visits, c))
            .collect();
        // Stable sort keeps expansion order (density rank) among equal visit counts.
        root_children.sort_by(|a, b| b.0.cmp(&a.0));
        let mut moves = root_children.into_iter().filter_map(|(_, c)| nodes[c].mv);
        let best = moves.next();
        let alternates = moves.collect();

        let stats = PlannerStats {
            iterations,
            nodes: nodes.len(),
            elapsed_ms: start.elapsed().as_millis() as u64,
            timed_out,
        };
        if timed_out {
            info!(
                iterations,
                elapsed_ms = stats.elapsed_ms,
                "search stopped at hard ceiling; returning best so far"
            );
        }
        debug!(
            iterations,
            nodes = stats.nodes,
            elapsed_ms = stats.elapsed_ms,
            best = ?best,
            "mcts finished"
        );
        PlanResult {
            best,
            alternates,
            stats,
        }
    }

    /// Computes the density ranking and candidate list of a node once.
    fn prepare(&self, node: &mut Node, cautious: bool) {
        if node.ranked.is_some() {
            return;
        }
        let ranked = estimate_density(&node.board, &node.ledger, self.parity_damping)
            .ranked(&node.board);
        self.seed(node, ranked, cautious);
    }

    /// Stores `ranked` on the node and picks its candidate moves.
    fn seed(&self, node: &mut Node, ranked: Vec<Coord>, cautious: bool) {
        let take = self.branching.min(ranked.len());
        // `untried` is popped from the back, so store the preferred move last.
        node.untried = if cautious {
            ranked[ranked.len() - take..].to_vec()
        } else {
            ranked[..take].iter().rev().copied().collect()
        };
        node.ranked = Some(ranked);
    }

    /// Descends by UCB1 to a node with untried moves and expands one of them.
    /// Returns the new child, or the terminal node reached.
    fn select_and_expand(&self, nodes: &mut Vec<Node>, cautious: bool) -> usize {
        let mut id = 0;
        loop {
            self.prepare(&mut nodes[id], cautious);
            if !nodes[id].untried.is_empty() || nodes[id].children.is_empty() {
                break;
            }
            let parent_visits = nodes[id].visits;
            let mut best_child = nodes[id].children[0];
            let mut best_ucb = f64::NEG_INFINITY;
            for &c in &nodes[id].children {
                let u = nodes[c].ucb(parent_visits);
                if u > best_ucb {
                    best_ucb = u;
                    best_child = c;
                }
            }
            id = best_child;
        }

        let Some(mv) = nodes[id].untried.pop() else {
            return id;
        };
        let mut board = nodes[id].board.clone();
        board.set(mv, CellState::Miss);
        let ledger = nodes[id].ledger.clone();
        let child = nodes.len();
        nodes.push(Node::new(board, ledger, Some(id), Some(mv)));
        nodes[id].children.push(child);
        child
    }

    /// Simulates shots down the node's density ranking. Returns a value in
    /// `[-1, 1]` from the simulated hit rate.
    fn rollout<R: Rng>(&self, node: &mut Node, cautious: bool, rng: &mut R) -> f64 {
        self.prepare(node, cautious);
        let ranked = node.ranked.as_deref().unwrap_or(&[]);

        let mut unknown = node.board.count(CellState::Unknown);
        let mut ship_cells = node
            .ledger
            .remaining_cells()
            .saturating_sub(node.board.count(CellState::Hit));
        let depth = ((unknown as f64) * self.rollout_fraction).ceil() as usize;

        let mut shots = 0usize;
        let mut hits = 0usize;
        for _ in ranked.iter().take(depth.max(1)) {
            if unknown == 0 {
                break;
            }
            let p = ship_cells as f64 / unknown as f64;
            if rng.gen::<f64>() < p {
                hits += 1;
                ship_cells = ship_cells.saturating_sub(1);
            }
            unknown -= 1;
            shots += 1;
        }
        if shots == 0 {
            return 0.0;
        }
        2.0 * hits as f64 / shots as f64 - 1.0
    }
}

fn backpropagate(nodes: &mut [Node], leaf: usize, value: f64) {
    let mut cur = Some(leaf);
    while let Some(id) = cur {
        nodes[id].visits += 1;
        nodes[id].score += value;
        cur = nodes[id].parent;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn standard() -> (Board, FleetLedger) {
        (Board::new(10), FleetLedger::new(&[5, 4, 3, 3, 2]))
    }

    #[test]
    fn fixed_iterations_are_deterministic() {
        let (board, ledger) = standard();
        let planner = MctsPlanner::default();
        let budget = SearchBudget::iterations(300);
        let a = planner.plan(&board, &ledger, &budget, &mut SmallRng::seed_from_u64(42));
        let b = planner.plan(&board, &ledger, &budget, &mut SmallRng::seed_from_u64(42));
        assert_eq!(a.best, b.best);
        assert_eq!(a.alternates, b.alternates);
        assert_eq!(a.stats.iterations, 300);
    }

    #[test]
    fn best_move_is_an_unknown_candidate() {
        let (mut board, ledger) = standard();
        board.set(Coord::new(4, 4), CellState::Miss);
        let planner = MctsPlanner::default();
        let result = planner.plan(
            &board,
            &ledger,
            &SearchBudget::iterations(200),
            &mut SmallRng::seed_from_u64(1),
        );
        let best = result.best.expect("a move");
        assert_eq!(board.get(best), CellState::Unknown);
        assert!(!result.alternates.contains(&best));
        assert!(result.alternates.len() < planner.branching);
    }

    #[test]
    fn time_budget_stops_the_search() {
        let (board, ledger) = standard();
        let budget = SearchBudget {
            iterations: None,
            movetime: Duration::from_millis(20),
            hard_ceiling: Duration::from_millis(500),
            cautious: false,
        };
        let result = MctsPlanner::default().plan(
            &board,
            &ledger,
            &budget,
            &mut SmallRng::seed_from_u64(3),
        );
        assert!(result.best.is_some());
        assert!(result.stats.iterations > 0);
        assert!(!result.stats.timed_out);
    }

    #[test]
    fn hard_ceiling_applies_to_iteration_budgets() {
        let (board, ledger) = standard();
        let budget = SearchBudget {
            iterations: Some(u64::MAX),
            movetime: Duration::ZERO,
            hard_ceiling: Duration::from_millis(30),
            cautious: false,
        };
        let result = MctsPlanner::default().plan(
            &board,
            &ledger,
            &budget,
            &mut SmallRng::seed_from_u64(4),
        );
        assert!(result.stats.timed_out);
        assert!(result.best.is_some());
    }

    #[test]
    fn cautious_mode_picks_low_density_candidates() {
        let (board, ledger) = standard();
        let planner = MctsPlanner::new(3, 0.3, 0.1);
        let ranked = estimate_density(&board, &ledger, 0.1).ranked(&board);
        let tail = &ranked[ranked.len() - 3..];
        let budget = SearchBudget {
            cautious: true,
            ..SearchBudget::iterations(50)
        };
        let result = planner.plan(&board, &ledger, &budget, &mut SmallRng::seed_from_u64(5));
        assert!(tail.contains(&result.best.expect("a move")));
    }

    #[test]
    fn root_candidates_follow_the_given_ranking() {
        let (board, ledger) = standard();
        let planner = MctsPlanner::new(4, 0.3, 0.1);
        let corners = vec![
            Coord::new(0, 0),
            Coord::new(9, 0),
            Coord::new(0, 9),
            Coord::new(9, 9),
        ];
        let result = planner.plan_ranked(
            &board,
            &ledger,
            corners.clone(),
            &SearchBudget::iterations(100),
            &mut SmallRng::seed_from_u64(6),
        );
        let best = result.best.expect("a move");
        assert!(corners.contains(&best));
        assert!(result.alternates.iter().all(|c| corners.contains(c)));
    }

    #[test]
    fn finished_board_yields_no_move() {
        let mut board = Board::new(4);
        for c in board.coords().collect::<Vec<_>>() {
            board.set(c, CellState::Miss);
        }
        let result = MctsPlanner::default().plan(
            &board,
            &FleetLedger::new(&[2]),
            &SearchBudget::iterations(10),
            &mut SmallRng::seed_from_u64(6),
        );
        assert_eq!(result.best, None);
        assert_eq!(result.stats.iterations, 0);
    }
}
