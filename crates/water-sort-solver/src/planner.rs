//! Conformant planning over belief states.
//!
//! The planner looks for one straight-line pour sequence that solves every
//! candidate world at once. It never observes outcomes, so it only succeeds
//! when the candidate worlds are close enough for a shared plan to exist.

use std::collections::HashSet;
use std::time::Instant;

use tracing::debug;

use crate::belief::{generate_worlds, BeliefState};
use crate::config::SolverConfig;
use crate::error::SolveError;
use crate::puzzle::Puzzle;
use crate::solver::{Algorithm, BeliefStats, SolverResult};
use crate::state::Move;

/// Plan for a live puzzle.
///
/// With no hidden segment the belief is the single visible world and the
/// depth limit does not apply.
pub fn plan(puzzle: &Puzzle, config: &SolverConfig) -> Result<SolverResult, SolveError> {
    let started = Instant::now();
    let canonical = puzzle.canonical();
    canonical.validate()?;

    let (belief, max_depth) = if puzzle.has_hidden_segments() {
        let mut rng = config.rng();
        let worlds = generate_worlds(puzzle, config.planner.max_worlds, &mut rng);
        (BeliefState::new(worlds), Some(config.planner.max_depth))
    } else {
        (BeliefState::new(vec![canonical]), None)
    };

    let (moves, stats) = conformant_search(&belief, max_depth, config.max_nodes)?;
    let mut result = SolverResult::new(Algorithm::AndOr, moves, stats.and_nodes, started);
    result.belief_stats = Some(stats);
    Ok(result)
}

struct Frame {
    belief: BeliefState,
    actions: Vec<Move>,
    next: usize,
}

/// Depth-first search for a conformant plan from `initial`.
///
/// A belief is examined when first reached: goal test, then the depth limit,
/// then the signature memo shared by the whole search. Actions are tried in
/// enumeration order and the first plan found is returned. `max_nodes` bounds
/// the number of beliefs examined.
pub fn conformant_search(
    initial: &BeliefState,
    max_depth: Option<usize>,
    max_nodes: usize,
) -> Result<(Vec<Move>, BeliefStats), SolveError> {
    let mut stats = BeliefStats::default();
    let mut visited: HashSet<u64> = HashSet::new();
    let mut depth_cut = false;
    let mut path: Vec<Move> = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();

    let mut pending = Some(initial.clone());
    loop {
        if let Some(belief) = pending.take() {
            stats.and_nodes += 1;
            stats.belief_states_explored += 1;
            stats.max_belief_size = stats.max_belief_size.max(belief.size());
            stats.total_worlds_processed += belief.size();

            if belief.is_goal() {
                debug!(
                    steps = path.len(),
                    beliefs = stats.belief_states_explored,
                    "conformant plan found"
                );
                return Ok((path, stats));
            }

            let depth = stack.len();
            let expand = if max_depth.is_some_and(|limit| depth > limit) {
                depth_cut = true;
                false
            } else {
                visited.insert(belief.signature())
            };

            if expand {
                if stats.belief_states_explored >= max_nodes {
                    return Err(SolveError::BudgetExhausted {
                        nodes: stats.belief_states_explored,
                    });
                }
                let actions = belief.valid_actions();
                stack.push(Frame {
                    belief,
                    actions,
                    next: 0,
                });
            } else {
                path.pop();
            }
        }

        let Some(frame) = stack.last_mut() else {
            break;
        };
        if frame.next == frame.actions.len() {
            stack.pop();
            path.pop();
            continue;
        }
        let action = frame.actions[frame.next];
        frame.next += 1;
        stats.or_nodes += 1;
        pending = Some(frame.belief.apply_action(action));
        path.push(action);
    }

    let nodes = stats.belief_states_explored;
    if depth_cut {
        Err(SolveError::BudgetExhausted { nodes })
    } else {
        Err(SolveError::Exhausted { nodes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle::Color::{Blue as B, Green as G, Red as R};
    use crate::puzzle::{PuzzleConfig, Regime, Segment, Tube};
    use crate::state::{apply_all, State};

    fn swap_tubes(regime: Regime) -> Vec<Tube> {
        let top_only = regime == Regime::Hidden;
        vec![
            Tube::from_segments(
                [R, R, R, G].into_iter().enumerate().map(|(i, c)| {
                    if top_only && i < 3 {
                        Segment::hidden(c)
                    } else {
                        Segment::visible(c)
                    }
                }),
                4,
            ),
            Tube::from_segments([G, G, G, R].map(Segment::visible), 4),
            Tube::empty(4),
        ]
    }

    #[test]
    fn test_two_worlds_share_a_plan() {
        let a = State::new(
            vec![vec![R, R, R, R], vec![G, G, G, G], vec![B, B], vec![B, B]],
            4,
        );
        let b = State::new(
            vec![vec![G, G, G, G], vec![R, R, R, R], vec![B, B], vec![B, B]],
            4,
        );
        let belief = BeliefState::new(vec![a.clone(), b.clone()]);
        let (moves, stats) = conformant_search(&belief, Some(30), 1_000).unwrap();
        assert_eq!(moves, vec![Move::new(2, 3), Move::new(2, 3)]);
        assert_eq!(stats.max_belief_size, 2);
        for world in [a, b] {
            assert!(apply_all(&world, &moves).unwrap().is_goal());
        }
    }

    #[test]
    fn test_single_hidden_world_is_planned() {
        let puzzle = Puzzle::new(swap_tubes(Regime::Hidden), Regime::Hidden);
        assert!(puzzle.has_hidden_segments());
        let result = plan(&puzzle, &SolverConfig::default().with_seed(1)).unwrap();
        assert_eq!(
            result.moves,
            vec![Move::new(0, 2), Move::new(1, 0), Move::new(2, 1)]
        );
        let stats = result.belief_stats.unwrap();
        assert_eq!(stats.max_belief_size, 1);
        assert_eq!(result.nodes, stats.and_nodes);
    }

    #[test]
    fn test_fully_visible_puzzle_plans_without_depth_limit() {
        let puzzle = Puzzle::new(swap_tubes(Regime::Classic), Regime::Classic);
        let result = plan(&puzzle, &SolverConfig::default()).unwrap();
        assert_eq!(result.algorithm, Algorithm::AndOr);
        assert!(apply_all(&puzzle.canonical(), &result.moves)
            .unwrap()
            .is_goal());
    }

    #[test]
    fn test_every_action_is_legal_in_every_world() {
        let puzzle = Puzzle::new(swap_tubes(Regime::Hidden), Regime::Hidden);
        let config = SolverConfig::default().with_seed(3);
        let result = plan(&puzzle, &config).unwrap();
        let worlds = generate_worlds(&puzzle, config.planner.max_worlds, &mut config.rng());
        for world in worlds {
            let mut state = world;
            for mv in &result.moves {
                assert!(state.is_legal(*mv));
                state = state.apply(*mv).unwrap();
            }
            assert!(state.is_goal());
        }
    }

    #[test]
    fn test_depth_limit_reports_budget() {
        let a = State::new(
            vec![vec![R, R, R, R], vec![G, G, G, G], vec![B, B], vec![B, B]],
            4,
        );
        let b = State::new(
            vec![vec![G, G, G, G], vec![R, R, R, R], vec![B, B], vec![B, B]],
            4,
        );
        let belief = BeliefState::new(vec![a, b]);
        assert!(matches!(
            conformant_search(&belief, Some(0), 1_000),
            Err(SolveError::BudgetExhausted { .. })
        ));
    }

    #[test]
    fn test_dead_belief_is_exhausted() {
        let stuck = State::new(vec![vec![R, R, G, G], vec![G, G, R, R]], 4);
        let belief = BeliefState::new(vec![stuck]);
        assert_eq!(
            conformant_search(&belief, None, 1_000),
            Err(SolveError::Exhausted { nodes: 1 })
        );
    }

    #[test]
    fn test_mass_violation_rejected() {
        let puzzle = Puzzle::from_config(&PuzzleConfig {
            regime: Regime::Hidden,
            capacity: 4,
            tubes: vec![vec![R, R, R], vec![]],
            visibility: None,
        })
        .unwrap();
        assert!(matches!(
            plan(&puzzle, &SolverConfig::default()),
            Err(SolveError::InvalidPuzzle(_))
        ));
    }
}
