//! Search and planning.
//!
//! Hunt-mode shot selection: the strategy abstraction, the tree search
//! planner, and the tactical controller that sizes its budget.

pub mod mcts;
pub mod policy;
pub mod tactics;

pub use mcts::{MctsPlanner, PlanResult, PlannerStats, SearchBudget};
pub use policy::{
    DensityPolicy, EntropyPolicy, HuntContext, HuntPolicy, HuntStrategy, MctsPolicy,
    MinimaxPolicy, ShotChoice,
};
pub use tactics::{ModeBudgets, TacticalController, TacticalMode};
