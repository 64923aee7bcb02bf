//! Random level construction.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::puzzle::{Color, Puzzle, Regime, Tube, CAPACITY};

/// Most colors a generated level uses
pub const MAX_COLORS: usize = 8;
/// Empty tubes added after the color tubes
pub const EMPTY_TUBES: usize = 2;

/// Deal a level with `colors` color tubes (clamped to `1..=MAX_COLORS`) and
/// [`EMPTY_TUBES`] empty ones.
///
/// Every color appears `CAPACITY` times; the segments are shuffled and dealt
/// into the color tubes. Visibility follows `regime`.
pub fn generate_level<R: Rng + ?Sized>(colors: usize, regime: Regime, rng: &mut R) -> Puzzle {
    let colors = colors.clamp(1, MAX_COLORS);
    let mut pool: Vec<Color> = Color::ALL[..colors]
        .iter()
        .flat_map(|&c| std::iter::repeat(c).take(CAPACITY))
        .collect();
    pool.shuffle(rng);

    let mut tubes: Vec<Tube> = pool
        .chunks(CAPACITY)
        .map(|chunk| Tube::dealt(chunk, regime, CAPACITY))
        .collect();
    tubes.extend((0..EMPTY_TUBES).map(|_| Tube::empty(CAPACITY)));
    Puzzle::new(tubes, regime)
}
