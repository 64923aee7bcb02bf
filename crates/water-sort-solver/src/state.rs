//! Canonical search state and the pour rules every solver shares.
//!
//! A [`State`] is a puzzle reduced to its color stacks. It is immutable from
//! the outside and hashed by value, so solvers use it directly as the key of
//! their visited sets.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::SolveError;
use crate::puzzle::{Color, CAPACITY};

/// Colors of one tube, bottom to top
pub type Stack = SmallVec<[Color; CAPACITY]>;

/// A pour from one tube index to another
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Move {
    pub from: usize,
    pub to: usize,
}

impl Move {
    pub fn new(from: usize, to: usize) -> Self {
        Self { from, to }
    }

    pub fn reversed(self) -> Self {
        Self {
            from: self.to,
            to: self.from,
        }
    }
}

impl From<(usize, usize)> for Move {
    fn from((from, to): (usize, usize)) -> Self {
        Self { from, to }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.from, self.to)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct State {
    tubes: Vec<Stack>,
    capacity: usize,
}

impl State {
    pub fn new(tubes: Vec<Vec<Color>>, capacity: usize) -> Self {
        Self::from_stacks(
            tubes.into_iter().map(SmallVec::from_vec).collect(),
            capacity,
        )
    }

    pub fn from_stacks(tubes: Vec<Stack>, capacity: usize) -> Self {
        Self { tubes, capacity }
    }

    pub fn tubes(&self) -> &[Stack] {
        &self.tubes
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.tubes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tubes.is_empty()
    }

    pub fn is_legal(&self, mv: Move) -> bool {
        if mv.from == mv.to {
            return false;
        }
        let (Some(src), Some(dst)) = (self.tubes.get(mv.from), self.tubes.get(mv.to)) else {
            return false;
        };
        let Some(top) = src.last() else {
            return false;
        };
        if dst.len() >= self.capacity {
            return false;
        }
        dst.last().map_or(true, |t| t == top)
    }

    /// Apply a single-segment pour, leaving `self` untouched.
    pub fn apply(&self, mv: Move) -> Result<State, SolveError> {
        if !self.is_legal(mv) {
            return Err(SolveError::illegal(mv));
        }
        Ok(self.successor(mv))
    }

    /// Successor of a move already known to be legal.
    pub(crate) fn successor(&self, mv: Move) -> State {
        let mut next = self.clone();
        if let Some(color) = next.tubes[mv.from].pop() {
            next.tubes[mv.to].push(color);
        }
        next
    }

    /// Every legal move, `from` major then `to`.
    pub fn legal_moves(&self) -> Vec<Move> {
        let n = self.tubes.len();
        let mut moves = Vec::new();
        for from in 0..n {
            if self.tubes[from].is_empty() {
                continue;
            }
            for to in 0..n {
                let mv = Move::new(from, to);
                if self.is_legal(mv) {
                    moves.push(mv);
                }
            }
        }
        moves
    }

    pub fn is_tube_solved(&self, index: usize) -> bool {
        let tube = &self.tubes[index];
        match tube.first() {
            None => true,
            Some(first) => tube.len() == self.capacity && tube.iter().all(|c| c == first),
        }
    }

    /// Every tube empty or full of one color
    pub fn is_goal(&self) -> bool {
        (0..self.tubes.len()).all(|i| self.is_tube_solved(i))
    }

    /// Per-color segment totals
    pub fn color_counts(&self) -> BTreeMap<Color, usize> {
        let mut counts = BTreeMap::new();
        for color in self.tubes.iter().flatten() {
            *counts.entry(*color).or_insert(0) += 1;
        }
        counts
    }

    /// Reject instances no pour sequence can ever solve: overfull tubes, or a
    /// color whose total is not a whole number of tubes.
    pub fn validate(&self) -> Result<(), SolveError> {
        if self.capacity == 0 {
            return Err(SolveError::InvalidPuzzle("capacity must be positive".into()));
        }
        if let Some((i, tube)) = self
            .tubes
            .iter()
            .enumerate()
            .find(|(_, t)| t.len() > self.capacity)
        {
            return Err(SolveError::InvalidPuzzle(format!(
                "tube {} holds {} segments, capacity is {}",
                i,
                tube.len(),
                self.capacity
            )));
        }
        for (color, count) in self.color_counts() {
            if count % self.capacity != 0 {
                return Err(SolveError::InvalidPuzzle(format!(
                    "{:?} appears {} times, not a multiple of {}",
                    color, count, self.capacity
                )));
            }
        }
        Ok(())
    }

    /// Tubes in sorted order; two states that differ only by tube order agree here.
    pub fn sorted_tubes(&self) -> Vec<&Stack> {
        let mut tubes: Vec<&Stack> = self.tubes.iter().collect();
        tubes.sort();
        tubes
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, tube) in self.tubes.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "[")?;
            for color in tube {
                write!(f, "{}", color.letter())?;
            }
            write!(f, "]")?;
        }
        Ok(())
    }
}

/// Apply a whole move list, failing on the first illegal move.
pub fn apply_all(state: &State, moves: &[Move]) -> Result<State, SolveError> {
    moves.iter().try_fold(state.clone(), |s, &mv| s.apply(mv))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle::Color::{Blue as B, Green as G, Red as R};

    fn two_color() -> State {
        State::new(vec![vec![R, R, G, G], vec![G, G, R, R], vec![], vec![]], 4)
    }

    #[test]
    fn test_legality_rules() {
        let s = two_color();
        assert!(s.is_legal(Move::new(0, 2)));
        assert!(!s.is_legal(Move::new(0, 1))); // G onto R
        assert!(!s.is_legal(Move::new(2, 0))); // empty source
        assert!(!s.is_legal(Move::new(0, 0))); // self-pour
        assert!(!s.is_legal(Move::new(0, 9))); // out of range

        let full = State::new(vec![vec![R, R, R, R], vec![R]], 4);
        assert!(!full.is_legal(Move::new(1, 0)));
        assert!(full.is_legal(Move::new(0, 1)));
    }

    #[test]
    fn test_apply_moves_exactly_one_segment() {
        let s = two_color();
        let next = s.apply(Move::new(0, 2)).unwrap();
        assert_eq!(next.tubes()[0].as_slice(), &[R, R, G]);
        assert_eq!(next.tubes()[2].as_slice(), &[G]);
        // pure: original untouched
        assert_eq!(s.tubes()[0].len(), 4);
        assert_eq!(next.color_counts(), s.color_counts());
    }

    #[test]
    fn test_apply_reports_illegal_move() {
        let s = two_color();
        assert_eq!(
            s.apply(Move::new(0, 1)),
            Err(SolveError::IllegalMove { from: 0, to: 1 })
        );
    }

    #[test]
    fn test_legal_moves_order() {
        let s = two_color();
        let moves = s.legal_moves();
        assert_eq!(
            moves,
            vec![
                Move::new(0, 2),
                Move::new(0, 3),
                Move::new(1, 2),
                Move::new(1, 3)
            ]
        );
    }

    #[test]
    fn test_goal() {
        assert!(State::new(vec![vec![R, R, R, R], vec![], vec![]], 4).is_goal());
        assert!(!State::new(vec![vec![R, R], vec![R, R]], 4).is_goal());
        assert!(!two_color().is_goal());
    }

    #[test]
    fn test_validate_mass() {
        assert!(two_color().validate().is_ok());
        let short = State::new(vec![vec![R, R, R], vec![]], 4);
        assert!(matches!(short.validate(), Err(SolveError::InvalidPuzzle(_))));
    }

    #[test]
    fn test_sorted_tubes_ignores_order() {
        let a = State::new(vec![vec![B], vec![R, G]], 4);
        let b = State::new(vec![vec![R, G], vec![B]], 4);
        assert_ne!(a, b);
        assert_eq!(a.sorted_tubes(), b.sorted_tubes());
    }

    #[test]
    fn test_display() {
        assert_eq!(two_color().to_string(), "[RRGG] [GGRR] [] []");
    }
}
