//! Belief evaluation over the opponent board.
//!
//! Three estimators of where the remaining ships are: placement-count
//! density (heuristic), pocket deduction (exact) and the sampled layout
//! ensemble (exact filtering, sampled coverage).

pub mod deduction;
pub mod density;
pub mod ensemble;

pub use deduction::{eliminate_unreachable, find_guaranteed_hit, find_pockets};
pub use density::{estimate_density, placement_counts, DensityMap};
pub use ensemble::{Ensemble, Layout};
