use std::time::Instant;

use rand::seq::SliceRandom;

use super::{Algorithm, SolverResult};
use crate::config::SolverConfig;
use crate::error::SolveError;
use crate::heuristic::heuristic;
use crate::state::{Move, State};

/// Steepest-descent hill climbing with random restarts.
///
/// Each restart begins at `initial` and repeatedly takes the move with the
/// lowest heuristic, provided it is strictly lower than the current one. The
/// move order is shuffled per restart so ties break differently between
/// restarts.
///
/// A goal reached on any restart is returned with `stuck == false`. Otherwise
/// the path ending at the lowest heuristic is returned with `stuck == true`;
/// it is legal but does not solve the puzzle.
pub fn hill_climbing(initial: &State, config: &SolverConfig) -> Result<SolverResult, SolveError> {
    let started = Instant::now();
    let params = &config.hill_climb;
    let mut rng = config.rng();
    let mut nodes = 0;
    let mut best: Option<(u32, Vec<Move>)> = None;

    for restart in 0..params.restarts {
        let mut current = initial.clone();
        let mut current_h = heuristic(&current);
        let mut path: Vec<Move> = Vec::new();

        for _ in 0..params.iterations_per_restart {
            nodes += 1;
            if current.is_goal() {
                return Ok(SolverResult::new(Algorithm::HillClimb, path, nodes, started));
            }

            let mut moves = current.legal_moves();
            moves.shuffle(&mut rng);
            let mut step: Option<(Move, State, u32)> = None;
            for mv in moves {
                let next = current.successor(mv);
                let h = heuristic(&next);
                let floor = step.as_ref().map_or(current_h, |(_, _, best_h)| *best_h);
                if h < floor {
                    step = Some((mv, next, h));
                }
            }

            let Some((mv, next, h)) = step else {
                break;
            };
            current = next;
            current_h = h;
            path.push(mv);
        }

        if current.is_goal() {
            return Ok(SolverResult::new(Algorithm::HillClimb, path, nodes, started));
        }
        tracing::trace!(restart, h = current_h, steps = path.len(), "hill climb stalled");
        if best.as_ref().map_or(true, |(best_h, _)| current_h < *best_h) {
            best = Some((current_h, path));
        }
    }

    match best {
        Some((_, path)) if !path.is_empty() => {
            let mut result = SolverResult::new(Algorithm::HillClimb, path, nodes, started);
            result.stuck = true;
            Ok(result)
        }
        _ => Err(SolveError::BudgetExhausted { nodes }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle::Color::{Green as G, Red as R};
    use crate::state::apply_all;

    #[test]
    fn test_plateau_reports_stuck_path() {
        // either first move drops h to 1 and the second to 0, after which
        // nothing improves although the goal is still one pour away
        let state = State::new(vec![vec![R, R, R, G], vec![G, G, G, R], vec![]], 4);
        let result = hill_climbing(&state, &SolverConfig::default().with_seed(9)).unwrap();
        assert!(result.stuck);
        assert_eq!(result.steps, 2);
        assert_eq!(result.nodes, 30);
        let end = apply_all(&state, &result.moves).unwrap();
        assert_eq!(heuristic(&end), 0);
        assert!(!end.is_goal());
    }

    #[test]
    fn test_solved_start_is_not_stuck() {
        let solved = State::new(vec![vec![G, G, G, G], vec![]], 4);
        let result = hill_climbing(&solved, &SolverConfig::default()).unwrap();
        assert!(!result.stuck);
        assert!(result.moves.is_empty());
    }

    #[test]
    fn test_no_improving_move_anywhere() {
        let stuck = State::new(vec![vec![R, R, G, G], vec![G, G, R, R]], 4);
        assert_eq!(
            hill_climbing(&stuck, &SolverConfig::default().with_seed(1)),
            Err(SolveError::BudgetExhausted { nodes: 10 })
        );
    }
}
