//! Water sort puzzle solver library.
//!
//! Eight search and metaheuristic solvers work on the fully observed
//! [`State`]. For puzzles whose contents are partly or wholly hidden, the
//! conformant [`planner`] looks for one plan that solves every candidate world
//! and the [`ActiveTester`] pours for real to narrow the candidates down.

pub mod active;
pub mod belief;
pub mod config;
pub mod error;
pub mod generator;
pub mod heuristic;
pub mod planner;
pub mod puzzle;
pub mod replay;
pub mod solver;
pub mod state;

// Re-export main types
pub use active::ActiveTester;
pub use belief::{generate_worlds, BeliefState};
pub use config::{
    ActiveConfig, AnnealingConfig, BeeColonyConfig, HillClimbConfig, PlannerConfig, SolverConfig,
};
pub use error::SolveError;
pub use generator::generate_level;
pub use heuristic::heuristic;
pub use puzzle::{Color, Puzzle, PuzzleConfig, Regime, Segment, Tube, CAPACITY};
pub use replay::{replay, ReplayReport};
pub use solver::{solve, solve_puzzle, Algorithm, BeliefStats, SolverResult};
pub use state::{apply_all, Move, State};
