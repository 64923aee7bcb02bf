use std::time::Instant;

use rand::seq::IndexedRandom;
use rand::Rng;

use super::{Algorithm, SolverResult};
use crate::config::SolverConfig;
use crate::error::SolveError;
use crate::heuristic::heuristic;
use crate::state::{Move, State};

/// Simulated annealing over random legal moves.
///
/// A move that lowers the heuristic is always taken; one that raises it is
/// taken with probability `exp(-delta / T)`. The walk starts over from
/// `initial` when it reaches a state with no legal move or when the
/// temperature drops below its floor. Every iteration counts as one node.
pub fn simulated_annealing(
    initial: &State,
    config: &SolverConfig,
) -> Result<SolverResult, SolveError> {
    let started = Instant::now();
    let params = &config.annealing;
    let mut rng = config.rng();

    let mut current = initial.clone();
    let mut current_h = heuristic(&current);
    let mut path: Vec<Move> = Vec::new();
    let mut temperature = params.initial_temperature;
    let mut nodes = 0;

    while nodes < params.max_iterations {
        nodes += 1;
        if current.is_goal() {
            return Ok(SolverResult::new(Algorithm::Annealing, path, nodes, started));
        }

        let moves = current.legal_moves();
        let Some(&mv) = moves.choose(&mut rng) else {
            current = initial.clone();
            current_h = heuristic(&current);
            path.clear();
            temperature = params.initial_temperature;
            continue;
        };

        let next = current.successor(mv);
        let next_h = heuristic(&next);
        let delta = f64::from(next_h) - f64::from(current_h);
        if delta < 0.0 || rng.random::<f64>() < (-delta / temperature).exp() {
            current = next;
            current_h = next_h;
            path.push(mv);
        }

        temperature *= params.cooling_rate;
        if temperature < params.min_temperature {
            current = initial.clone();
            current_h = heuristic(&current);
            path.clear();
            temperature = params.initial_temperature;
        }
    }

    Err(SolveError::BudgetExhausted { nodes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnnealingConfig;
    use crate::puzzle::Color::{Green as G, Red as R};
    use crate::state::apply_all;

    fn swap() -> State {
        State::new(vec![vec![R, R, R, G], vec![G, G, G, R], vec![]], 4)
    }

    #[test]
    fn test_seeded_runs_agree() {
        let config = SolverConfig::default().with_seed(5);
        assert_eq!(
            simulated_annealing(&swap(), &config).map(|r| r.moves),
            simulated_annealing(&swap(), &config).map(|r| r.moves)
        );
    }

    #[test]
    fn test_plan_reaches_goal_when_found() {
        let config = SolverConfig::default().with_seed(17);
        if let Ok(result) = simulated_annealing(&swap(), &config) {
            assert!(apply_all(&swap(), &result.moves).unwrap().is_goal());
            assert!(result.nodes <= config.annealing.max_iterations);
        }
    }

    #[test]
    fn test_iteration_cap() {
        let config = SolverConfig {
            annealing: AnnealingConfig {
                max_iterations: 1,
                ..AnnealingConfig::default()
            },
            ..SolverConfig::default().with_seed(1)
        };
        assert_eq!(
            simulated_annealing(&swap(), &config),
            Err(SolveError::BudgetExhausted { nodes: 1 })
        );
    }

    #[test]
    fn test_dead_end_restarts_until_cap() {
        // full tubes, no legal move anywhere
        let stuck = State::new(vec![vec![R, R, G, G], vec![G, G, R, R]], 4);
        let config = SolverConfig::default().with_seed(2);
        assert_eq!(
            simulated_annealing(&stuck, &config),
            Err(SolveError::BudgetExhausted {
                nodes: config.annealing.max_iterations
            })
        );
    }
}
