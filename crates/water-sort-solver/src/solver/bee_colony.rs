//! Artificial bee colony over fixed-length move sequences.
//!
//! A food source is a candidate move list. Illegal moves in a candidate are
//! skipped when it is replayed, so mutations never need to stay legal; only the
//! legal moves replayed before the goal make it into a returned plan.

use std::time::Instant;

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::Rng;

use super::{Algorithm, SolverResult};
use crate::config::{BeeColonyConfig, SolverConfig};
use crate::error::SolveError;
use crate::heuristic::heuristic;
use crate::state::{Move, State};

/// Fitness of a candidate that reaches the goal, before subtracting its length
const SOLVED_FITNESS: f64 = 10_000.0;
/// Any fitness above this came from a goal-reaching candidate
const SOLVED_THRESHOLD: f64 = 9_000.0;

struct FoodSource {
    path: Vec<Move>,
    fitness: f64,
    trials: usize,
}

struct Colony<'a> {
    initial: &'a State,
    params: &'a BeeColonyConfig,
    rng: StdRng,
}

impl<'a> Colony<'a> {
    /// Replay `path` from the initial state, skipping illegal moves and
    /// stopping at the goal. Returns the final state and the moves applied.
    fn replay(&self, path: &[Move]) -> (State, Vec<Move>) {
        let mut state = self.initial.clone();
        let mut applied = Vec::new();
        for &mv in path {
            if !state.is_legal(mv) {
                continue;
            }
            state = state.successor(mv);
            applied.push(mv);
            if state.is_goal() {
                break;
            }
        }
        (state, applied)
    }

    fn fitness(&self, path: &[Move]) -> f64 {
        let (end, applied) = self.replay(path);
        if end.is_goal() {
            SOLVED_FITNESS - applied.len() as f64
        } else {
            -f64::from(heuristic(&end)) - path.len() as f64 * 0.1
        }
    }

    fn source(&self, path: Vec<Move>) -> FoodSource {
        FoodSource {
            fitness: self.fitness(&path),
            path,
            trials: 0,
        }
    }

    /// A random legal walk whose length is drawn from the configured range.
    fn random_path(&mut self) -> Vec<Move> {
        let max = self.params.max_path_len.max(self.params.min_path_len);
        let len = self.rng.random_range(self.params.min_path_len..=max);
        let mut state = self.initial.clone();
        let mut path = Vec::with_capacity(len);
        for _ in 0..len {
            let moves = state.legal_moves();
            let Some(&mv) = moves.choose(&mut self.rng) else {
                break;
            };
            state = state.successor(mv);
            path.push(mv);
        }
        path
    }

    /// Uniform pair of distinct tube indices; needs at least two tubes.
    fn random_pair(&mut self) -> Move {
        let tubes = self.initial.len();
        let from = self.rng.random_range(0..tubes);
        let mut to = self.rng.random_range(0..tubes - 1);
        if to >= from {
            to += 1;
        }
        Move::new(from, to)
    }

    fn neighbour(&mut self, path: &[Move]) -> Vec<Move> {
        if path.is_empty() {
            return self.random_path();
        }
        let mut next = path.to_vec();
        let roll: f64 = self.rng.random();
        if roll < 0.5 {
            let at = self.rng.random_range(0..next.len());
            next[at] = self.random_pair();
        } else if roll < 0.75 && next.len() > self.params.min_path_len {
            let at = self.rng.random_range(0..next.len());
            next.remove(at);
        } else {
            let at = self.rng.random_range(0..=next.len());
            let mv = self.random_pair();
            next.insert(at, mv);
        }
        next.truncate(self.params.max_path_len.max(1));
        next
    }

    /// Greedy replacement of `source` by one of its neighbours.
    fn explore(&mut self, source: &mut FoodSource) {
        let candidate = self.neighbour(&source.path);
        let fitness = self.fitness(&candidate);
        if fitness > source.fitness {
            source.path = candidate;
            source.fitness = fitness;
            source.trials = 0;
        } else {
            source.trials += 1;
        }
    }

    /// Roulette pick weighted by positive fitness; `total` is their sum.
    fn pick(&mut self, sources: &[FoodSource], total: f64) -> usize {
        let target = self.rng.random::<f64>() * total;
        let mut cumulative = 0.0;
        for (i, source) in sources.iter().enumerate() {
            if source.fitness > 0.0 {
                cumulative += source.fitness;
                if target <= cumulative {
                    return i;
                }
            }
        }
        sources.len() - 1
    }
}

pub fn bee_colony(initial: &State, config: &SolverConfig) -> Result<SolverResult, SolveError> {
    let started = Instant::now();
    if initial.is_goal() {
        return Ok(SolverResult::new(
            Algorithm::BeeColony,
            Vec::new(),
            1,
            started,
        ));
    }
    if initial.legal_moves().is_empty() {
        return Err(SolveError::Exhausted { nodes: 1 });
    }

    let params = &config.bee_colony;
    let mut colony = Colony {
        initial,
        params,
        rng: config.rng(),
    };

    let mut sources: Vec<FoodSource> = (0..params.bees)
        .map(|_| {
            let path = colony.random_path();
            colony.source(path)
        })
        .collect();
    let mut best: Option<(f64, Vec<Move>)> = None;
    let mut nodes = 0;

    for cycle in 0..params.max_cycles {
        nodes += params.bees * 2;

        // employed bees
        for source in sources.iter_mut() {
            colony.explore(source);
        }

        // onlookers
        let total: f64 = sources
            .iter()
            .map(|s| s.fitness)
            .filter(|f| *f > 0.0)
            .sum();
        if total > 0.0 {
            for _ in 0..sources.len() {
                let chosen = colony.pick(&sources, total);
                colony.explore(&mut sources[chosen]);
            }
        }

        for source in &sources {
            if best.as_ref().map_or(true, |(f, _)| source.fitness > *f) {
                best = Some((source.fitness, source.path.clone()));
            }
        }
        if let Some((fitness, path)) = &best {
            if *fitness > SOLVED_THRESHOLD {
                let (end, applied) = colony.replay(path);
                if end.is_goal() {
                    tracing::trace!(cycle, steps = applied.len(), "colony reached goal");
                    return Ok(SolverResult::new(
                        Algorithm::BeeColony,
                        applied,
                        nodes,
                        started,
                    ));
                }
            }
        }

        // scouts
        for source in sources.iter_mut() {
            if source.trials > params.limit {
                let path = colony.random_path();
                *source = colony.source(path);
            }
        }
    }

    Err(SolveError::BudgetExhausted { nodes })
}
