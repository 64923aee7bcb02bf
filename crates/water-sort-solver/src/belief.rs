//! Candidate worlds and belief states for partially observed puzzles.
//!
//! A world is a full [`State`] that agrees with every visible segment of a
//! live puzzle. A [`BeliefState`] is the set of worlds still considered
//! possible, and both the conformant planner and the active tester reason
//! over it.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::debug;

use crate::puzzle::{Color, Puzzle, CAPACITY};
use crate::state::{Move, Stack, State};

/// Candidate worlds for `puzzle`.
///
/// The hidden pool is the puzzle's color multiset minus its visible segments.
/// When the pool has at most `max_worlds` distinct arrangements every one of
/// them is returned, in lexicographic order of the pool. Otherwise up to
/// `max_worlds` distinct arrangements are sampled, with `10 * max_worlds`
/// shuffles as the attempt budget.
pub fn generate_worlds(puzzle: &Puzzle, max_worlds: usize, rng: &mut StdRng) -> Vec<State> {
    let mut pool = hidden_pool(puzzle);
    pool.sort();
    let arrangements = arrangements(&pool);

    let worlds = if arrangements <= max_worlds as u128 {
        let mut worlds = Vec::with_capacity(arrangements as usize);
        loop {
            worlds.push(complete(puzzle, &pool));
            if !next_permutation(&mut pool) {
                break;
            }
        }
        worlds
    } else {
        let mut seen: HashSet<State> = HashSet::new();
        let mut worlds = Vec::new();
        for _ in 0..max_worlds.saturating_mul(10) {
            if worlds.len() >= max_worlds {
                break;
            }
            pool.shuffle(rng);
            let world = complete(puzzle, &pool);
            if seen.insert(world.clone()) {
                worlds.push(world);
            }
        }
        worlds
    };

    debug!(
        hidden = pool.len(),
        arrangements = %arrangements,
        worlds = worlds.len(),
        exhaustive = arrangements <= max_worlds as u128,
        "generated candidate worlds"
    );
    worlds
}

/// Colors of every hidden segment, in no particular order.
fn hidden_pool(puzzle: &Puzzle) -> Vec<Color> {
    let mut pool: Vec<Color> = puzzle.tubes().iter().flat_map(|t| t.colors()).collect();
    for segment in puzzle.tubes().iter().flat_map(|t| t.segments()) {
        if segment.visible {
            if let Some(at) = pool.iter().position(|c| *c == segment.color) {
                pool.swap_remove(at);
            }
        }
    }
    pool
}

/// Fill the hidden slots of `puzzle` in tube order, bottom to top, from `fill`.
fn complete(puzzle: &Puzzle, fill: &[Color]) -> State {
    let capacity = puzzle.tubes().first().map_or(CAPACITY, |t| t.capacity());
    let mut fill = fill.iter();
    let tubes = puzzle
        .tubes()
        .iter()
        .map(|tube| {
            tube.segments()
                .iter()
                .map(|segment| {
                    if segment.visible {
                        segment.color
                    } else {
                        fill.next().copied().unwrap_or(segment.color)
                    }
                })
                .collect::<Stack>()
        })
        .collect();
    State::from_stacks(tubes, capacity)
}

/// Distinct orderings of a sorted multiset, saturating at `u128::MAX`.
fn arrangements(sorted: &[Color]) -> u128 {
    let mut total: u128 = 1;
    let mut remaining = sorted.len() as u128;
    for run in sorted.chunk_by(|a, b| a == b) {
        // multiply by C(remaining, run.len())
        let k = run.len() as u128;
        let mut binomial: u128 = 1;
        for i in 0..k {
            binomial = match binomial.checked_mul(remaining - i) {
                Some(v) => v / (i + 1),
                None => return u128::MAX,
            };
        }
        total = match total.checked_mul(binomial) {
            Some(v) => v,
            None => return u128::MAX,
        };
        remaining -= k;
    }
    total
}

/// Rearrange into the next lexicographic permutation; false once the
/// sequence is in descending order.
fn next_permutation(items: &mut [Color]) -> bool {
    let Some(pivot) = items.windows(2).rposition(|w| w[0] < w[1]) else {
        return false;
    };
    let Some(swap) = items.iter().rposition(|c| *c > items[pivot]) else {
        return false;
    };
    items.swap(pivot, swap);
    items[pivot + 1..].reverse();
    true
}

/// A set of candidate worlds with a permutation-insensitive signature.
#[derive(Debug, Clone)]
pub struct BeliefState {
    worlds: Vec<State>,
    signature: u64,
}

impl BeliefState {
    pub fn new(worlds: Vec<State>) -> Self {
        let signature = signature(&worlds);
        Self { worlds, signature }
    }

    pub fn worlds(&self) -> &[State] {
        &self.worlds
    }

    /// Hash of the worlds after sorting each world's tubes and then the
    /// worlds themselves. Equal for collections that differ only in order.
    pub fn signature(&self) -> u64 {
        self.signature
    }

    pub fn size(&self) -> usize {
        self.worlds.len()
    }

    /// Every world solved. An empty belief is never a goal.
    pub fn is_goal(&self) -> bool {
        !self.worlds.is_empty() && self.worlds.iter().all(State::is_goal)
    }

    /// Pours whose source is non-empty in the first world and that are legal in
    /// every world, `from` major then `to`.
    pub fn valid_actions(&self) -> Vec<Move> {
        let Some(first) = self.worlds.first() else {
            return Vec::new();
        };
        let n = first.len();
        let mut actions = Vec::new();
        for from in 0..n {
            if first.tubes()[from].is_empty() {
                continue;
            }
            for to in 0..n {
                let mv = Move::new(from, to);
                if self.worlds.iter().all(|w| w.is_legal(mv)) {
                    actions.push(mv);
                }
            }
        }
        actions
    }

    /// Advance every world by `mv`; worlds where it is illegal stay put.
    pub fn apply_action(&self, mv: Move) -> BeliefState {
        let worlds = self
            .worlds
            .iter()
            .map(|w| {
                if w.is_legal(mv) {
                    w.successor(mv)
                } else {
                    w.clone()
                }
            })
            .collect();
        BeliefState::new(worlds)
    }
}

fn signature(worlds: &[State]) -> u64 {
    let mut keys: Vec<Vec<&Stack>> = worlds.iter().map(State::sorted_tubes).collect();
    keys.sort();
    let mut hasher = DefaultHasher::new();
    keys.hash(&mut hasher);
    hasher.finish()
}
