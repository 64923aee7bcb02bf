//! Exhaustive state-space searches sharing a global visited set.
//!
//! BFS and DFS differ only in which end of the frontier they pop; A* and
//! greedy best-first differ only in their priority.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet, VecDeque};
use std::time::Instant;

use rand::seq::SliceRandom;

use super::{Algorithm, SearchTree, SolverResult};
use crate::config::SolverConfig;
use crate::error::SolveError;
use crate::heuristic::heuristic;
use crate::state::State;

/// Breadth-first search: move-count optimal.
pub fn bfs(initial: &State, config: &SolverConfig) -> Result<SolverResult, SolveError> {
    frontier_search(initial, config, Algorithm::Bfs)
}

/// Depth-first search with the move order shuffled at every expansion.
pub fn dfs(initial: &State, config: &SolverConfig) -> Result<SolverResult, SolveError> {
    frontier_search(initial, config, Algorithm::Dfs)
}

fn frontier_search(
    initial: &State,
    config: &SolverConfig,
    algorithm: Algorithm,
) -> Result<SolverResult, SolveError> {
    let started = Instant::now();
    let lifo = algorithm == Algorithm::Dfs;
    let mut rng = config.rng();

    let mut tree = SearchTree::new();
    let mut frontier: VecDeque<(State, usize)> = VecDeque::new();
    frontier.push_back((initial.clone(), SearchTree::ROOT));
    let mut visited: HashSet<State> = HashSet::new();
    visited.insert(initial.clone());
    let mut nodes = 0;

    loop {
        let popped = if lifo {
            frontier.pop_back()
        } else {
            frontier.pop_front()
        };
        let Some((state, id)) = popped else {
            break;
        };
        nodes += 1;

        if state.is_goal() {
            return Ok(SolverResult::new(algorithm, tree.path(id), nodes, started));
        }
        if visited.len() >= config.max_nodes {
            return Err(SolveError::BudgetExhausted { nodes });
        }

        let mut moves = state.legal_moves();
        if lifo {
            moves.shuffle(&mut rng);
        }
        for mv in moves {
            let child = state.successor(mv);
            if visited.contains(&child) {
                continue;
            }
            visited.insert(child.clone());
            let child_id = tree.push(id, mv);
            frontier.push_back((child, child_id));
        }
    }

    Err(SolveError::Exhausted { nodes })
}

/// Heap entry ordered so the smallest `(priority, depth, seq)` pops first;
/// `seq` keeps equal priorities in insertion order.
struct Entry {
    priority: u32,
    depth: u32,
    seq: u64,
    id: usize,
    state: State,
}

impl Entry {
    fn key(&self) -> (u32, u32, u64) {
        (self.priority, self.depth, self.seq)
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        other.key().cmp(&self.key())
    }
}

/// A* on `depth + heuristic`.
///
/// A state is re-queued when reached by a shorter path; stale heap entries are
/// skipped when popped. Optimality depends on the heuristic, which is not
/// known to be admissible.
pub fn a_star(initial: &State, config: &SolverConfig) -> Result<SolverResult, SolveError> {
    let started = Instant::now();
    let mut tree = SearchTree::new();
    let mut best_depth: HashMap<State, u32> = HashMap::new();
    best_depth.insert(initial.clone(), 0);

    let mut heap = BinaryHeap::new();
    let mut seq = 0u64;
    heap.push(Entry {
        priority: heuristic(initial),
        depth: 0,
        seq,
        id: SearchTree::ROOT,
        state: initial.clone(),
    });
    let mut nodes = 0;

    while let Some(Entry {
        depth, id, state, ..
    }) = heap.pop()
    {
        nodes += 1;
        if state.is_goal() {
            return Ok(SolverResult::new(
                Algorithm::AStar,
                tree.path(id),
                nodes,
                started,
            ));
        }
        if best_depth.get(&state).is_some_and(|&best| depth > best) {
            continue;
        }
        if best_depth.len() >= config.max_nodes {
            return Err(SolveError::BudgetExhausted { nodes });
        }

        for mv in state.legal_moves() {
            let child = state.successor(mv);
            let child_depth = depth + 1;
            if best_depth
                .get(&child)
                .is_some_and(|&best| child_depth >= best)
            {
                continue;
            }
            best_depth.insert(child.clone(), child_depth);
            seq += 1;
            heap.push(Entry {
                priority: child_depth + heuristic(&child),
                depth: child_depth,
                seq,
                id: tree.push(id, mv),
                state: child,
            });
        }
    }

    Err(SolveError::Exhausted { nodes })
}

/// Greedy best-first search on the heuristic alone.
pub fn greedy(initial: &State, config: &SolverConfig) -> Result<SolverResult, SolveError> {
    let started = Instant::now();
    let mut tree = SearchTree::new();
    let mut visited: HashSet<State> = HashSet::new();
    visited.insert(initial.clone());

    let mut heap = BinaryHeap::new();
    let mut seq = 0u64;
    heap.push(Entry {
        priority: heuristic(initial),
        depth: 0,
        seq,
        id: SearchTree::ROOT,
        state: initial.clone(),
    });
    let mut nodes = 0;

    while let Some(Entry {
        depth, id, state, ..
    }) = heap.pop()
    {
        nodes += 1;
        if state.is_goal() {
            return Ok(SolverResult::new(
                Algorithm::Greedy,
                tree.path(id),
                nodes,
                started,
            ));
        }
        if visited.len() >= config.max_nodes {
            return Err(SolveError::BudgetExhausted { nodes });
        }

        for mv in state.legal_moves() {
            let child = state.successor(mv);
            if visited.contains(&child) {
                continue;
            }
            visited.insert(child.clone());
            seq += 1;
            heap.push(Entry {
                priority: heuristic(&child),
                depth: depth + 1,
                seq,
                id: tree.push(id, mv),
                state: child,
            });
        }
    }

    Err(SolveError::Exhausted { nodes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle::Color::{Green as G, Red as R};
    use crate::state::Move;

    fn swap() -> State {
        State::new(vec![vec![R, R, R, G], vec![G, G, G, R], vec![]], 4)
    }

    #[test]
    fn test_bfs_three_move_swap() {
        let result = bfs(&swap(), &SolverConfig::default()).unwrap();
        assert_eq!(
            result.moves,
            vec![Move::new(0, 2), Move::new(1, 0), Move::new(2, 1)]
        );
        assert_eq!(result.algorithm, Algorithm::Bfs);
    }

    #[test]
    fn test_a_star_matches_bfs_length_on_swap() {
        let result = a_star(&swap(), &SolverConfig::default()).unwrap();
        assert_eq!(result.steps, 3);
    }

    #[test]
    fn test_dfs_same_seed_same_plan() {
        let config = SolverConfig::default().with_seed(3);
        let a = dfs(&swap(), &config).unwrap();
        let b = dfs(&swap(), &config).unwrap();
        assert_eq!(a.moves, b.moves);
    }

    #[test]
    fn test_unsolvable_state_exhausts() {
        // full tubes, no free space: nothing can move
        let stuck = State::new(vec![vec![R, R, G, G], vec![G, G, R, R]], 4);
        assert_eq!(
            bfs(&stuck, &SolverConfig::default()),
            Err(SolveError::Exhausted { nodes: 1 })
        );
        assert!(matches!(
            greedy(&stuck, &SolverConfig::default()),
            Err(SolveError::Exhausted { .. })
        ));
    }

    #[test]
    fn test_node_cap_reports_budget() {
        let config = SolverConfig {
            max_nodes: 2,
            ..SolverConfig::default()
        };
        let state = State::new(vec![vec![R, R, G, G], vec![G, G, R, R], vec![], vec![]], 4);
        assert!(matches!(
            bfs(&state, &config),
            Err(SolveError::BudgetExhausted { .. })
        ));
        assert!(matches!(
            a_star(&state, &config),
            Err(SolveError::BudgetExhausted { .. })
        ));
    }
}
