//! Error taxonomy shared by every solver, the planner and the replay engine.

use thiserror::Error;

use crate::state::Move;

/// Why a solve, plan or replay did not produce a usable move list.
///
/// None of these are fatal: callers may retry with another algorithm or another
/// puzzle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolveError {
    /// A requested pour violates the legality rules.
    #[error("illegal move: tube {from} -> tube {to}")]
    IllegalMove { from: usize, to: usize },

    /// The instance was rejected before any search started.
    #[error("invalid puzzle: {0}")]
    InvalidPuzzle(String),

    /// A complete search visited every reachable state without reaching the goal.
    #[error("no solution: search space exhausted after {nodes} nodes")]
    Exhausted { nodes: usize },

    /// A resource cap stopped the search; the puzzle may still be solvable.
    #[error("no solution found within resource bounds ({nodes} nodes)")]
    BudgetExhausted { nodes: usize },

    /// Observed test outcomes ruled out every candidate world.
    #[error("observations after {tests} tests are inconsistent with every candidate world")]
    BeliefContradiction { tests: usize },

    /// A replayed move was illegal against the live tubes.
    #[error("replay stopped at step {step}: tube {from} -> tube {to} is illegal")]
    Replay { step: usize, from: usize, to: usize },
}

impl SolveError {
    pub fn illegal(mv: Move) -> Self {
        SolveError::IllegalMove {
            from: mv.from,
            to: mv.to,
        }
    }

    /// Short machine-readable tag used in CLI reports.
    pub fn kind(&self) -> &'static str {
        match self {
            SolveError::IllegalMove { .. } => "illegal_move",
            SolveError::InvalidPuzzle(_) => "invalid_puzzle",
            SolveError::Exhausted { .. } => "unsolvable",
            SolveError::BudgetExhausted { .. } => "budget_exhausted",
            SolveError::BeliefContradiction { .. } => "belief_contradiction",
            SolveError::Replay { .. } => "replay_failed",
        }
    }
}
