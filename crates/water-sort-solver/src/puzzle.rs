//! Puzzle representation types that match the JSON puzzle format.
//!
//! A [`Puzzle`] is the live instance a collaborator plays on: tubes of
//! segments that carry a visibility flag. Solvers never search over it
//! directly; they take its [`State`] via [`Puzzle::canonical`].

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::SolveError;
use crate::state::{Move, State};

/// Number of segments a tube holds unless the puzzle says otherwise.
pub const CAPACITY: usize = 4;

/// Segment color, one of twelve named liquids
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    Red,
    Green,
    Blue,
    Yellow,
    Orange,
    Purple,
    Cyan,
    Pink,
    Brown,
    Olive,
    DarkGreen,
    Magenta,
}

impl Color {
    pub const ALL: [Color; 12] = [
        Color::Red,
        Color::Green,
        Color::Blue,
        Color::Yellow,
        Color::Orange,
        Color::Purple,
        Color::Cyan,
        Color::Pink,
        Color::Brown,
        Color::Olive,
        Color::DarkGreen,
        Color::Magenta,
    ];

    /// One-letter code used when printing states
    pub fn letter(self) -> char {
        match self {
            Color::Red => 'R',
            Color::Green => 'G',
            Color::Blue => 'B',
            Color::Yellow => 'Y',
            Color::Orange => 'O',
            Color::Purple => 'P',
            Color::Cyan => 'C',
            Color::Pink => 'K',
            Color::Brown => 'N',
            Color::Olive => 'V',
            Color::DarkGreen => 'D',
            Color::Magenta => 'M',
        }
    }
}

/// Observability regime of a puzzle
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Regime {
    /// Every segment is visible.
    #[default]
    Classic,
    /// Only the top of each tube is visible; pours reveal what they expose.
    Hidden,
    /// Nothing is visible, ever.
    Blind,
}

impl Regime {
    /// Initial visibility of segment `index` in a tube holding `len` segments.
    fn initially_visible(self, index: usize, len: usize) -> bool {
        match self {
            Regime::Classic => true,
            Regime::Hidden => index + 1 == len,
            Regime::Blind => false,
        }
    }
}

/// One unit of liquid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Segment {
    pub color: Color,
    pub visible: bool,
}

impl Segment {
    pub fn visible(color: Color) -> Self {
        Self {
            color,
            visible: true,
        }
    }

    pub fn hidden(color: Color) -> Self {
        Self {
            color,
            visible: false,
        }
    }
}

/// A live tube, segments stored bottom to top
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tube {
    segments: SmallVec<[Segment; CAPACITY]>,
    capacity: usize,
}

impl Tube {
    pub fn empty(capacity: usize) -> Self {
        Self {
            segments: SmallVec::new(),
            capacity,
        }
    }

    pub fn from_segments(segments: impl IntoIterator<Item = Segment>, capacity: usize) -> Self {
        Self {
            segments: segments.into_iter().collect(),
            capacity,
        }
    }

    /// Build a tube whose visibility follows the regime's dealing rule.
    pub fn dealt(colors: &[Color], regime: Regime, capacity: usize) -> Self {
        let len = colors.len();
        Self::from_segments(
            colors.iter().enumerate().map(|(i, &color)| Segment {
                color,
                visible: regime.initially_visible(i, len),
            }),
            capacity,
        )
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.segments.len() >= self.capacity
    }

    pub fn top(&self) -> Option<Segment> {
        self.segments.last().copied()
    }

    pub fn colors(&self) -> impl Iterator<Item = Color> + '_ {
        self.segments.iter().map(|s| s.color)
    }

    pub fn hidden_count(&self) -> usize {
        self.segments.iter().filter(|s| !s.visible).count()
    }

    /// Empty, or full and monochrome
    pub fn is_solved(&self) -> bool {
        match self.segments.first() {
            None => true,
            Some(first) => {
                self.is_full() && self.segments.iter().all(|s| s.color == first.color)
            }
        }
    }

    pub fn can_pour_into(&self, other: &Tube) -> bool {
        let Some(top) = self.top() else {
            return false;
        };
        if other.is_full() {
            return false;
        }
        other.top().map_or(true, |t| t.color == top.color)
    }

    /// Length of the top same-color run that fits into `other`.
    pub fn pourable_amount(&self, other: &Tube) -> usize {
        if !self.can_pour_into(other) {
            return 0;
        }
        let Some(top) = self.top() else {
            return 0;
        };
        let run = self
            .segments
            .iter()
            .rev()
            .take_while(|s| s.color == top.color)
            .count();
        run.min(other.capacity - other.len())
    }
}

/// A live puzzle instance: the tubes a player (or the active tester) pours between
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Puzzle {
    tubes: Vec<Tube>,
    regime: Regime,
}

impl Puzzle {
    pub fn new(tubes: Vec<Tube>, regime: Regime) -> Self {
        Self { tubes, regime }
    }

    /// Deal a puzzle from its JSON description.
    pub fn from_config(config: &PuzzleConfig) -> Result<Self, SolveError> {
        if config.capacity == 0 {
            return Err(SolveError::InvalidPuzzle("capacity must be positive".into()));
        }
        if let Some(visibility) = &config.visibility {
            if visibility.len() != config.tubes.len()
                || visibility
                    .iter()
                    .zip(&config.tubes)
                    .any(|(v, t)| v.len() != t.len())
            {
                return Err(SolveError::InvalidPuzzle(
                    "visibility must match the shape of tubes".into(),
                ));
            }
        }

        let mut tubes = Vec::with_capacity(config.tubes.len());
        for (i, colors) in config.tubes.iter().enumerate() {
            if colors.len() > config.capacity {
                return Err(SolveError::InvalidPuzzle(format!(
                    "tube {} holds {} segments, capacity is {}",
                    i,
                    colors.len(),
                    config.capacity
                )));
            }
            let tube = match config.visibility.as_ref().map(|v| &v[i]) {
                Some(flags) => Tube::from_segments(
                    colors
                        .iter()
                        .zip(flags)
                        .map(|(&color, &visible)| Segment { color, visible }),
                    config.capacity,
                ),
                None => Tube::dealt(colors, config.regime, config.capacity),
            };
            tubes.push(tube);
        }
        Ok(Self::new(tubes, config.regime))
    }

    /// Describe this puzzle in the JSON format, keeping per-segment visibility
    /// only when it differs from what the regime would deal.
    pub fn to_config(&self) -> PuzzleConfig {
        let capacity = self.tubes.first().map_or(CAPACITY, Tube::capacity);
        let tubes: Vec<Vec<Color>> = self.tubes.iter().map(|t| t.colors().collect()).collect();
        let dealt = tubes
            .iter()
            .map(|colors| Tube::dealt(colors, self.regime, capacity))
            .collect::<Vec<_>>();
        let visibility = if dealt
            .iter()
            .zip(&self.tubes)
            .all(|(d, t)| d.segments() == t.segments())
        {
            None
        } else {
            Some(
                self.tubes
                    .iter()
                    .map(|t| t.segments().iter().map(|s| s.visible).collect())
                    .collect(),
            )
        };
        PuzzleConfig {
            regime: self.regime,
            capacity,
            tubes,
            visibility,
        }
    }

    pub fn tubes(&self) -> &[Tube] {
        &self.tubes
    }

    pub fn regime(&self) -> Regime {
        self.regime
    }

    pub fn len(&self) -> usize {
        self.tubes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tubes.is_empty()
    }

    /// Check a pour without performing it (out-of-range indices are never legal)
    pub fn can_pour(&self, mv: Move) -> bool {
        if mv.from == mv.to {
            return false;
        }
        match (self.tubes.get(mv.from), self.tubes.get(mv.to)) {
            (Some(src), Some(dst)) => src.can_pour_into(dst),
            _ => false,
        }
    }

    /// Pour a single segment. Returns whether the pour happened.
    ///
    /// Outside the blind regime the segment exposed in the source becomes visible.
    pub fn pour(&mut self, mv: Move) -> bool {
        if !self.can_pour(mv) {
            return false;
        }
        self.move_segments(mv, 1) == 1
    }

    pub fn pourable_amount(&self, mv: Move) -> usize {
        if !self.can_pour(mv) {
            return 0;
        }
        self.tubes[mv.from].pourable_amount(&self.tubes[mv.to])
    }

    /// Batch transfer used by interactive play: the whole top run, bounded by
    /// the destination's free space. Returns the number of segments moved.
    pub fn transfer(&mut self, mv: Move) -> usize {
        let amount = self.pourable_amount(mv);
        if amount == 0 {
            return 0;
        }
        self.move_segments(mv, amount)
    }

    fn move_segments(&mut self, mv: Move, amount: usize) -> usize {
        let mut moved = 0;
        while moved < amount {
            let Some(segment) = self.tubes[mv.from].segments.pop() else {
                break;
            };
            self.tubes[mv.to].segments.push(segment);
            moved += 1;
        }
        if self.regime != Regime::Blind {
            if let Some(top) = self.tubes[mv.from].segments.last_mut() {
                top.visible = true;
            }
        }
        moved
    }

    pub fn is_solved(&self) -> bool {
        self.tubes.iter().all(Tube::is_solved)
    }

    pub fn has_hidden_segments(&self) -> bool {
        self.tubes.iter().any(|t| t.hidden_count() > 0)
    }

    /// Canonical search state: colors only, visibility stripped.
    pub fn canonical(&self) -> State {
        let capacity = self.tubes.first().map_or(CAPACITY, Tube::capacity);
        State::from_stacks(
            self.tubes.iter().map(|t| t.colors().collect()).collect(),
            capacity,
        )
    }

    /// A fully visible classic puzzle holding the stacks of `state`.
    pub fn from_state(state: &State) -> Self {
        let tubes = state
            .tubes()
            .iter()
            .map(|stack| {
                Tube::from_segments(stack.iter().map(|&c| Segment::visible(c)), state.capacity())
            })
            .collect();
        Self::new(tubes, Regime::Classic)
    }
}

impl fmt::Display for Puzzle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, tube) in self.tubes.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "[")?;
            for segment in tube.segments() {
                if segment.visible {
                    write!(f, "{}", segment.color.letter())?;
                } else {
                    write!(f, "?")?;
                }
            }
            write!(f, "]")?;
        }
        Ok(())
    }
}

fn default_capacity() -> usize {
    CAPACITY
}

/// JSON description of a puzzle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PuzzleConfig {
    #[serde(default)]
    pub regime: Regime,
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    /// Tube contents, bottom to top
    pub tubes: Vec<Vec<Color>>,
    /// Optional per-segment visibility, overriding the regime's dealing rule
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Vec<Vec<bool>>>,
}
