//! Memoized backtracking with a path-local visited set.
//!
//! Only states on the current path are blocked, so a state abandoned on one
//! branch may be entered again from another. The traversal keeps its own
//! stack of frames instead of recursing, so deep paths cannot overflow the
//! native stack.

use std::collections::HashSet;
use std::time::Instant;

use super::{Algorithm, SolverResult};
use crate::config::SolverConfig;
use crate::error::SolveError;
use crate::state::{Move, State};

/// A state on the current path and the moves still to try from it
struct Frame {
    state: State,
    moves: Vec<Move>,
    next: usize,
}

impl Frame {
    fn new(state: State) -> Self {
        let moves = state.legal_moves();
        Self {
            state,
            moves,
            next: 0,
        }
    }
}

pub fn backtracking(initial: &State, config: &SolverConfig) -> Result<SolverResult, SolveError> {
    let started = Instant::now();
    let mut nodes = 1;
    if initial.is_goal() {
        return Ok(SolverResult::new(
            Algorithm::Backtracking,
            Vec::new(),
            nodes,
            started,
        ));
    }

    let mut on_path: HashSet<State> = HashSet::new();
    on_path.insert(initial.clone());
    let mut stack = vec![Frame::new(initial.clone())];
    let mut path: Vec<Move> = Vec::new();

    loop {
        let Some(frame) = stack.last_mut() else {
            break;
        };

        if frame.next == frame.moves.len() {
            // every move tried: unwind this state off the path
            if let Some(done) = stack.pop() {
                on_path.remove(&done.state);
            }
            path.pop();
            continue;
        }

        let mv = frame.moves[frame.next];
        frame.next += 1;
        let child = frame.state.successor(mv);
        nodes += 1;

        if child.is_goal() {
            path.push(mv);
            return Ok(SolverResult::new(
                Algorithm::Backtracking,
                path,
                nodes,
                started,
            ));
        }
        if on_path.contains(&child) {
            continue;
        }
        if nodes >= config.max_nodes {
            return Err(SolveError::BudgetExhausted { nodes });
        }

        on_path.insert(child.clone());
        path.push(mv);
        stack.push(Frame::new(child));
    }

    Err(SolveError::Exhausted { nodes })
}
