//! Engine for a single-player mine-discovery puzzle.
//!
//! [`GameEngine`] owns the board and round state. Renderers call its operations and redraw the
//! cells listed in the returned [`Update`]; delayed effects are driven by [`GameEngine::advance`].

use core::ops::Index;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

pub use board::*;
pub use cell::*;
pub use config::*;
pub use engine::*;
pub use error::*;
pub use generator::*;
pub use history::*;
pub use round::*;
pub use schedule::*;
pub use score::*;
pub use types::*;

mod board;
mod cell;
mod config;
mod engine;
mod error;
mod generator;
mod history;
mod round;
mod schedule;
mod score;
mod types;

/// Where the mines of a round are, before they are laid on a [`Board`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MineLayout {
    mine_mask: Array2<bool>,
    mine_count: CellCount,
}

impl MineLayout {
    pub fn from_mine_mask(mine_mask: Array2<bool>) -> Self {
        let mine_count = mine_mask
            .iter()
            .filter(|&&is_mine| is_mine)
            .count()
            .try_into()
            .unwrap_or(CellCount::MAX);
        Self {
            mine_mask,
            mine_count,
        }
    }

    pub fn from_mine_coords(size: Coord, mine_coords: &[Coord2]) -> Result<Self> {
        if mine_coords
            .iter()
            .any(|&(row, col)| row >= size || col >= size)
        {
            return Err(GameError::InvalidCoords);
        }
        Ok(Self::from_mine_coords_unchecked(size, mine_coords))
    }

    /// Every coordinate must be within `size`.
    pub(crate) fn from_mine_coords_unchecked(size: Coord, mine_coords: &[Coord2]) -> Self {
        let mut mine_mask: Array2<bool> = Array2::default((size.into(), size.into()));
        for &coords in mine_coords {
            mine_mask[coords.to_nd_index()] = true;
        }
        Self::from_mine_mask(mine_mask)
    }

    pub fn size(&self) -> Coord {
        self.mine_mask.nrows().try_into().unwrap_or(Coord::MAX)
    }

    pub fn mine_count(&self) -> CellCount {
        self.mine_count
    }

    pub fn contains_mine(&self, coords: Coord2) -> bool {
        self[coords]
    }

    pub fn iter_mines(&self) -> impl Iterator<Item = Coord2> + '_ {
        iter_board(self.size()).filter(|&pos| self[pos])
    }
}

impl Index<Coord2> for MineLayout {
    type Output = bool;

    fn index(&self, coords: Coord2) -> &Self::Output {
        &self.mine_mask[coords.to_nd_index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_rejects_out_of_range_mines() {
        assert_eq!(
            MineLayout::from_mine_coords(3, &[(0, 3)]),
            Err(GameError::InvalidCoords)
        );
    }

    #[test]
    fn duplicate_coords_count_once() {
        let layout = MineLayout::from_mine_coords(3, &[(1, 1), (1, 1), (2, 0)]).unwrap();
        assert_eq!(layout.mine_count(), 2);
        assert_eq!(layout.iter_mines().collect::<Vec<_>>(), vec![(1, 1), (2, 0)]);
    }
}
