//! Broadside battleship decision engine library.
//!
//! Exposes the board model, estimators, search, own-fleet layout and
//! protocol modules for use by integration tests and the binary entry
//! points. [`engine::Engine`] is the single owner of match state.

pub mod board;
pub mod config;
pub mod engine;
pub mod eval;
pub mod layout;
pub mod profile;
pub mod protocol;
pub mod search;
pub mod selfplay;
pub mod targeting;
