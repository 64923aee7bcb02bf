//! Distance-to-goal estimate used by the informed and stochastic solvers.

use crate::state::State;

/// Count, over every mixed tube, the segments that differ from the tube's most
/// frequent color. Monochrome and empty tubes score 0.
///
/// Admissibility is not established for this estimate, so A* driven by it is
/// treated as near-optimal rather than guaranteed optimal.
pub fn heuristic(state: &State) -> u32 {
    state
        .tubes()
        .iter()
        .map(|tube| {
            let mut best = 0;
            for (i, color) in tube.iter().enumerate() {
                if tube[..i].contains(color) {
                    continue;
                }
                best = best.max(tube.iter().filter(|c| *c == color).count());
            }
            (tube.len() - best) as u32
        })
        .sum()
}
