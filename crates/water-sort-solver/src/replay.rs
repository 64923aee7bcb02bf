//! Replaying a move list against a live puzzle.

use crate::error::SolveError;
use crate::puzzle::Puzzle;
use crate::state::Move;

/// Outcome of a replay that applied every move
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayReport {
    pub applied: usize,
    pub solved: bool,
    /// The puzzle after the last move
    pub puzzle: Puzzle,
}

/// Pour `moves` one segment at a time into a copy of `puzzle`.
///
/// Each move is checked against the live tubes before it is poured; the first
/// illegal one stops the replay with [`SolveError::Replay`], `step` counting
/// from 0. The copy reveals segments the same way interactive play would.
pub fn replay(puzzle: &Puzzle, moves: &[Move]) -> Result<ReplayReport, SolveError> {
    let mut live = puzzle.clone();
    for (step, &mv) in moves.iter().enumerate() {
        if !live.pour(mv) {
            return Err(SolveError::Replay {
                step,
                from: mv.from,
                to: mv.to,
            });
        }
    }
    Ok(ReplayReport {
        applied: moves.len(),
        solved: live.is_solved(),
        puzzle: live,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle::Color::{Green as G, Red as R};
    use crate::puzzle::{PuzzleConfig, Regime};

    fn swap(regime: Regime) -> Puzzle {
        Puzzle::from_config(&PuzzleConfig {
            regime,
            capacity: 4,
            tubes: vec![vec![R, R, R, G], vec![G, G, G, R], vec![]],
            visibility: None,
        })
        .unwrap()
    }

    fn plan() -> Vec<Move> {
        vec![Move::new(0, 2), Move::new(1, 0), Move::new(2, 1)]
    }

    #[test]
    fn test_plan_solves_live_copy() {
        let puzzle = swap(Regime::Classic);
        let report = replay(&puzzle, &plan()).unwrap();
        assert_eq!(report.applied, 3);
        assert!(report.solved);
        // the caller's puzzle is untouched
        assert!(!puzzle.is_solved());
    }

    #[test]
    fn test_hidden_segments_revealed_by_replay() {
        let hidden = |p: &Puzzle| p.tubes().iter().map(|t| t.hidden_count()).sum::<usize>();
        let puzzle = swap(Regime::Hidden);
        let report = replay(&puzzle, &plan()).unwrap();
        assert!(report.solved);
        // each source exposed one segment
        assert_eq!(hidden(&puzzle), 6);
        assert_eq!(hidden(&report.puzzle), 4);
    }

    #[test]
    fn test_illegal_step_is_reported() {
        let moves = vec![Move::new(0, 2), Move::new(0, 1)];
        assert_eq!(
            replay(&swap(Regime::Classic), &moves),
            Err(SolveError::Replay {
                step: 1,
                from: 0,
                to: 1
            })
        );
    }

    #[test]
    fn test_partial_plan_is_not_solved() {
        let report = replay(&swap(Regime::Classic), &plan()[..1]).unwrap();
        assert_eq!(report.applied, 1);
        assert!(!report.solved);
    }
}
