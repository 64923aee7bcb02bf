//! Solver suite: eight algorithms over the canonical [`State`], plus dispatch
//! for the two partial-observability strategies that work on a live
//! [`Puzzle`].

mod annealing;
mod backtrack;
mod bee_colony;
mod hill_climb;
mod search;

use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::active::ActiveTester;
use crate::config::SolverConfig;
use crate::error::SolveError;
use crate::planner;
use crate::puzzle::{Puzzle, Regime};
use crate::state::{Move, State};

pub use annealing::simulated_annealing;
pub use backtrack::backtracking;
pub use bee_colony::bee_colony;
pub use hill_climb::hill_climbing;
pub use search::{a_star, bfs, dfs, greedy};

/// Every strategy a collaborator can invoke by name
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum Algorithm {
    Bfs,
    Dfs,
    AStar,
    Greedy,
    #[value(name = "sa")]
    #[serde(rename = "sa")]
    Annealing,
    HillClimb,
    Backtracking,
    #[value(name = "abca")]
    #[serde(rename = "abca")]
    BeeColony,
    /// Conformant belief-state planning (hidden and blind regimes)
    AndOr,
    /// Active testing against a copy of the live puzzle (blind regime)
    Blind,
}

impl Algorithm {
    /// The eight solvers that need a fully observed state.
    pub const SEARCH: [Algorithm; 8] = [
        Algorithm::Bfs,
        Algorithm::Dfs,
        Algorithm::AStar,
        Algorithm::Greedy,
        Algorithm::Annealing,
        Algorithm::HillClimb,
        Algorithm::Backtracking,
        Algorithm::BeeColony,
    ];

    pub fn needs_full_observation(self) -> bool {
        !matches!(self, Algorithm::AndOr | Algorithm::Blind)
    }

    /// Algorithms that make sense for a puzzle dealt under `regime`.
    pub fn applicable(regime: Regime) -> Vec<Algorithm> {
        match regime {
            Regime::Classic => {
                let mut all = Self::SEARCH.to_vec();
                all.push(Algorithm::AndOr);
                all
            }
            Regime::Hidden => vec![Algorithm::AndOr],
            Regime::Blind => vec![Algorithm::Blind, Algorithm::AndOr],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Algorithm::Bfs => "BFS",
            Algorithm::Dfs => "DFS",
            Algorithm::AStar => "A*",
            Algorithm::Greedy => "Greedy",
            Algorithm::Annealing => "SA",
            Algorithm::HillClimb => "HC+Restarts",
            Algorithm::Backtracking => "Backtracking",
            Algorithm::BeeColony => "ABCA",
            Algorithm::AndOr => "And-Or",
            Algorithm::Blind => "Blind",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Statistics of a belief-state search
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeliefStats {
    pub and_nodes: usize,
    pub or_nodes: usize,
    pub belief_states_explored: usize,
    pub max_belief_size: usize,
    pub total_worlds_processed: usize,
}

/// Result of a successful solve
#[derive(Debug, Clone, PartialEq)]
pub struct SolverResult {
    pub algorithm: Algorithm,
    /// Moves in replay order
    pub moves: Vec<Move>,
    pub steps: usize,
    pub elapsed: Duration,
    /// States, iterations or belief nodes examined
    pub nodes: usize,
    /// Best-effort result from a run that never reached the goal
    pub stuck: bool,
    /// Real pours attempted by the active tester
    pub tests_performed: Option<usize>,
    pub belief_stats: Option<BeliefStats>,
}

impl SolverResult {
    pub(crate) fn new(
        algorithm: Algorithm,
        moves: Vec<Move>,
        nodes: usize,
        started: Instant,
    ) -> Self {
        Self {
            algorithm,
            steps: moves.len(),
            moves,
            elapsed: started.elapsed(),
            nodes,
            stuck: false,
            tests_performed: None,
            belief_stats: None,
        }
    }
}

/// Parent-pointer arena recording how each expanded state was reached.
pub(crate) struct SearchTree {
    parents: Vec<Option<(usize, Move)>>,
}

impl SearchTree {
    pub(crate) const ROOT: usize = 0;

    pub(crate) fn new() -> Self {
        Self {
            parents: vec![None],
        }
    }

    pub(crate) fn push(&mut self, parent: usize, mv: Move) -> usize {
        self.parents.push(Some((parent, mv)));
        self.parents.len() - 1
    }

    pub(crate) fn path(&self, mut node: usize) -> Vec<Move> {
        let mut moves = Vec::new();
        while let Some((parent, mv)) = self.parents[node] {
            moves.push(mv);
            node = parent;
        }
        moves.reverse();
        moves
    }
}

/// Run one of the eight full-observation solvers.
///
/// The state is validated first. `AndOr` and `Blind` run through
/// [`solve_puzzle`] on a fully visible puzzle holding the same stacks.
pub fn solve(
    initial: &State,
    algorithm: Algorithm,
    config: &SolverConfig,
) -> Result<SolverResult, SolveError> {
    initial.validate()?;

    let result = match algorithm {
        Algorithm::Bfs => bfs(initial, config),
        Algorithm::Dfs => dfs(initial, config),
        Algorithm::AStar => a_star(initial, config),
        Algorithm::Greedy => greedy(initial, config),
        Algorithm::Annealing => simulated_annealing(initial, config),
        Algorithm::HillClimb => hill_climbing(initial, config),
        Algorithm::Backtracking => backtracking(initial, config),
        Algorithm::BeeColony => bee_colony(initial, config),
        Algorithm::AndOr | Algorithm::Blind => {
            return solve_puzzle(&Puzzle::from_state(initial), algorithm, config)
        }
    };

    match &result {
        Ok(r) => debug!(
            %algorithm,
            steps = r.steps,
            nodes = r.nodes,
            stuck = r.stuck,
            "solver finished"
        ),
        Err(e) => debug!(%algorithm, error = %e, "solver gave up"),
    }
    result
}

/// Run any algorithm against a live puzzle.
///
/// Full-observation solvers see the canonical state. The active tester probes
/// a private clone, so `puzzle` itself is never poured into.
pub fn solve_puzzle(
    puzzle: &Puzzle,
    algorithm: Algorithm,
    config: &SolverConfig,
) -> Result<SolverResult, SolveError> {
    match algorithm {
        Algorithm::AndOr => planner::plan(puzzle, config),
        Algorithm::Blind => {
            let mut probe_copy = puzzle.clone();
            ActiveTester::new(config).run(&mut probe_copy)
        }
        _ => solve(&puzzle.canonical(), algorithm, config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle::Color::{Blue as B, Green as G, Red as R};
    use crate::state::apply_all;

    fn seeded() -> SolverConfig {
        SolverConfig::default().with_seed(11)
    }

    fn two_color() -> State {
        State::new(vec![vec![R, R, G, G], vec![G, G, R, R], vec![], vec![]], 4)
    }

    fn three_color() -> State {
        State::new(
            vec![
                vec![R, G, B, R],
                vec![B, R, G, G],
                vec![G, B, R, B],
                vec![],
                vec![],
            ],
            4,
        )
    }

    /// Every emitted move is legal in sequence, mass is conserved and, unless
    /// the run reported itself stuck, the last state is a goal.
    fn assert_valid_plan(initial: &State, result: &SolverResult) {
        let mut state = initial.clone();
        for mv in &result.moves {
            assert!(state.is_legal(*mv), "{} illegal in {}", mv, state);
            state = state.apply(*mv).unwrap();
            assert_eq!(state.color_counts(), initial.color_counts());
        }
        assert_eq!(result.steps, result.moves.len());
        if !result.stuck {
            assert!(state.is_goal(), "{} did not reach goal: {}", result.algorithm, state);
        }
    }

    #[test]
    fn test_bfs_fixture_is_deterministic() {
        let expected: Vec<Move> = [(0, 2), (0, 2), (1, 0), (1, 0), (1, 2), (1, 2)]
            .into_iter()
            .map(Move::from)
            .collect();
        for _ in 0..3 {
            let result = solve(&two_color(), Algorithm::Bfs, &seeded()).unwrap();
            assert_eq!(result.moves, expected);
        }
    }

    #[test]
    fn test_exhaustive_solvers_produce_valid_plans() {
        for state in [two_color(), three_color()] {
            for algorithm in [
                Algorithm::Bfs,
                Algorithm::Dfs,
                Algorithm::AStar,
                Algorithm::Greedy,
                Algorithm::Backtracking,
            ] {
                let result = solve(&state, algorithm, &seeded()).unwrap();
                assert_valid_plan(&state, &result);
            }
        }
    }

    #[test]
    fn test_bfs_is_never_beaten() {
        let state = three_color();
        let config = seeded();
        let optimal = solve(&state, Algorithm::Bfs, &config).unwrap().steps;
        for algorithm in Algorithm::SEARCH {
            if let Ok(result) = solve(&state, algorithm, &config) {
                assert_valid_plan(&state, &result);
                if !result.stuck {
                    assert!(result.steps >= optimal, "{} beat BFS", algorithm);
                }
            }
        }
    }

    #[test]
    fn test_solved_instance_needs_no_moves() {
        let solved = State::new(vec![vec![R, R, R, R], vec![], vec![]], 4);
        for algorithm in Algorithm::SEARCH {
            let result = solve(&solved, algorithm, &seeded()).unwrap();
            assert!(result.moves.is_empty(), "{} moved", algorithm);
            assert!(!result.stuck);
        }
    }

    #[test]
    fn test_mass_violation_is_rejected_by_every_solver() {
        let short = State::new(vec![vec![R, R, R], vec![], vec![]], 4);
        for algorithm in Algorithm::SEARCH {
            assert!(matches!(
                solve(&short, algorithm, &seeded()),
                Err(SolveError::InvalidPuzzle(_))
            ));
        }
    }

    #[test]
    fn test_partial_observation_algorithms_accept_a_state() {
        let state = two_color();
        let planned = solve(&state, Algorithm::AndOr, &seeded()).unwrap();
        assert_valid_plan(&state, &planned);
        assert!(planned.belief_stats.is_some());

        let tested = solve(&state, Algorithm::Blind, &seeded()).unwrap();
        assert_eq!(tested.tests_performed, Some(0));
        assert_eq!(tested.steps, 6);
        assert_valid_plan(&state, &tested);
    }

    #[test]
    fn test_cli_names_match_report_names() {
        use clap::ValueEnum;
        for algorithm in Algorithm::value_variants() {
            let name = serde_json::to_value(algorithm).unwrap();
            let parsed = Algorithm::from_str(name.as_str().unwrap(), false).unwrap();
            assert_eq!(parsed, *algorithm);
        }
        assert_eq!(Algorithm::from_str("a_star", false), Ok(Algorithm::AStar));
    }

    #[test]
    fn test_solve_puzzle_uses_canonical_state() {
        let puzzle = Puzzle::from_config(&crate::puzzle::PuzzleConfig {
            regime: Regime::Classic,
            capacity: 4,
            tubes: vec![vec![R, R, R, G], vec![G, G, G, R], vec![]],
            visibility: None,
        })
        .unwrap();
        let result = solve_puzzle(&puzzle, Algorithm::Bfs, &seeded()).unwrap();
        assert_eq!(
            result.moves,
            vec![Move::new(0, 2), Move::new(1, 0), Move::new(2, 1)]
        );
        assert!(apply_all(&puzzle.canonical(), &result.moves).unwrap().is_goal());
    }

    #[test]
    fn test_search_tree_path() {
        let mut tree = SearchTree::new();
        let a = tree.push(SearchTree::ROOT, Move::new(0, 1));
        let b = tree.push(a, Move::new(1, 2));
        assert_eq!(tree.path(b), vec![Move::new(0, 1), Move::new(1, 2)]);
        assert!(tree.path(SearchTree::ROOT).is_empty());
    }

    #[test]
    fn test_applicable_algorithms_by_regime() {
        assert_eq!(Algorithm::applicable(Regime::Classic).len(), 9);
        assert_eq!(Algorithm::applicable(Regime::Hidden), vec![Algorithm::AndOr]);
        assert!(Algorithm::applicable(Regime::Blind).contains(&Algorithm::Blind));
    }
}
