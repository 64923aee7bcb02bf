//! Active testing for puzzles whose contents are hidden.
//!
//! The tester pours for real on a live puzzle to learn which candidate worlds
//! are consistent with what it observes. Each probe either succeeds or fails;
//! worlds that predict the other outcome are dropped. Once few enough worlds
//! remain, one of them is solved with BFS and the plan is replayed on a copy
//! of the live tubes. A plan that does not solve the copy is itself an
//! observation: every world predicting a different outcome is dropped.

use std::time::Instant;

use tracing::{debug, info};

use crate::belief::generate_worlds;
use crate::config::SolverConfig;
use crate::error::SolveError;
use crate::puzzle::Puzzle;
use crate::replay::replay;
use crate::solver::{bfs, Algorithm, SolverResult};
use crate::state::{Move, State};

pub struct ActiveTester<'a> {
    config: &'a SolverConfig,
}

impl<'a> ActiveTester<'a> {
    pub fn new(config: &'a SolverConfig) -> Self {
        Self { config }
    }

    /// Probe `live` until the surviving worlds can be planned for.
    ///
    /// `live` is poured into: pass a copy dedicated to this run. The returned
    /// moves are the successful probes followed by the adopted plan, so they
    /// replay from the state `live` was in before the call.
    pub fn run(&self, live: &mut Puzzle) -> Result<SolverResult, SolveError> {
        let started = Instant::now();
        let params = &self.config.active;
        live.canonical().validate()?;

        let mut rng = self.config.rng();
        let mut worlds = generate_worlds(live, params.max_worlds, &mut rng);
        let mut probes: Vec<Move> = Vec::new();
        let mut last_success: Option<Move> = None;
        let mut tests = 0;
        let mut nodes = 0;

        loop {
            if let Some(plan) = self.ready(&worlds, &mut nodes) {
                let observed = dry_run(live, &plan)?;
                if let Outcome::Finished { solved: true } = observed {
                    info!(tests, probes = probes.len(), plan = plan.len(), "ready to solve");
                    let mut moves = probes;
                    moves.extend(plan);
                    let mut result = SolverResult::new(Algorithm::Blind, moves, nodes, started);
                    result.tests_performed = Some(tests);
                    return Ok(result);
                }

                // the adopted world predicted a solve, so it is always dropped here
                tests += 1;
                worlds.retain(|w| predict(w, &plan) == observed);
                info!(test = tests, ?observed, remaining = worlds.len(), "plan rejected");
                if worlds.is_empty() {
                    return Err(SolveError::BeliefContradiction { tests });
                }
                continue;
            }
            if tests >= params.max_tests {
                return Err(SolveError::BudgetExhausted { nodes });
            }

            let probe = match select_test(live, &worlds) {
                Some(probe) => probe,
                None => match exploratory_pour(&worlds, last_success) {
                    Some(probe) => {
                        debug!(%probe, "no informative test, exploring");
                        probe
                    }
                    None => return Err(SolveError::BudgetExhausted { nodes }),
                },
            };

            let success = live.pour(probe);
            tests += 1;
            nodes += 1;
            worlds.retain(|w| w.is_legal(probe) == success);
            info!(test = tests, %probe, success, remaining = worlds.len(), "active test");

            if worlds.is_empty() {
                return Err(SolveError::BeliefContradiction { tests });
            }
            if success {
                worlds = worlds.iter().map(|w| w.successor(probe)).collect();
                probes.push(probe);
                last_success = Some(probe);
            }
        }
    }

    /// A plan once the surviving worlds are few enough and all solvable.
    ///
    /// The shortest BFS plan among the worlds is adopted; with more than one
    /// world it is only a candidate until a dry run confirms it.
    fn ready(&self, worlds: &[State], nodes: &mut usize) -> Option<Vec<Move>> {
        if worlds.is_empty() || worlds.len() > self.config.active.direct_solve_threshold.max(1) {
            return None;
        }
        let mut best: Option<Vec<Move>> = None;
        for world in worlds {
            let solved = bfs(world, self.config).ok()?;
            *nodes += solved.nodes;
            if best.as_ref().map_or(true, |b| solved.moves.len() < b.len()) {
                best = Some(solved.moves);
            }
        }
        best
    }
}

/// What replaying a plan shows: the first illegal step, or where it ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Illegal { step: usize },
    Finished { solved: bool },
}

/// Replay `plan` on a copy of `live` without touching it.
fn dry_run(live: &Puzzle, plan: &[Move]) -> Result<Outcome, SolveError> {
    match replay(live, plan) {
        Ok(report) => Ok(Outcome::Finished {
            solved: report.solved,
        }),
        Err(SolveError::Replay { step, .. }) => Ok(Outcome::Illegal { step }),
        Err(e) => Err(e),
    }
}

/// The outcome `world` predicts for `plan`.
fn predict(world: &State, plan: &[Move]) -> Outcome {
    let mut state = world.clone();
    for (step, &mv) in plan.iter().enumerate() {
        if !state.is_legal(mv) {
            return Outcome::Illegal { step };
        }
        state = state.successor(mv);
    }
    Outcome::Finished {
        solved: state.is_goal(),
    }
}

/// The probe that splits the worlds most evenly.
///
/// Each pair with a non-empty live source scores `min(successes, failures)`
/// over the worlds; the first pair with the highest positive score wins.
fn select_test(live: &Puzzle, worlds: &[State]) -> Option<Move> {
    let n = live.len();
    let mut best: Option<(Move, usize)> = None;
    for from in 0..n {
        if live.tubes()[from].is_empty() {
            continue;
        }
        for to in 0..n {
            if from == to {
                continue;
            }
            let mv = Move::new(from, to);
            let successes = worlds.iter().filter(|w| w.is_legal(mv)).count();
            let score = successes.min(worlds.len() - successes);
            if score > best.map_or(0, |(_, s)| s) {
                best = Some((mv, score));
            }
        }
    }
    best.map(|(mv, _)| mv)
}

/// A pour legal in every world that does not undo the last successful one.
fn exploratory_pour(worlds: &[State], last_success: Option<Move>) -> Option<Move> {
    let n = worlds.first()?.len();
    (0..n)
        .flat_map(|from| (0..n).map(move |to| Move::new(from, to)))
        .filter(|mv| last_success.map_or(true, |last| *mv != last.reversed()))
        .find(|mv| worlds.iter().all(|w| w.is_legal(*mv)))
}
