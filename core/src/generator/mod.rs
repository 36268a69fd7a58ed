use rand::rngs::SmallRng;

use crate::*;
pub use preset::*;
pub use random::*;

mod preset;
mod random;

/// Decides where the mines go once the first cell of a round is revealed.
pub trait MineGenerator {
    /// Builds a layout for `config` that never puts a mine on `start`.
    fn generate(&mut self, config: LevelConfig, start: Coord2, rng: &mut SmallRng) -> MineLayout;
}
