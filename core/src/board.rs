use core::ops::{Index, IndexMut};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

/// Square grid of cells for a single round.
///
/// Cloning a board is a deep copy, which is what undo snapshots rely on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    cells: Array2<Cell>,
}

impl Board {
    /// A board of hidden, mineless cells.
    pub fn new(size: Coord) -> Self {
        Self {
            cells: Array2::default((size.into(), size.into())),
        }
    }

    pub fn size(&self) -> Coord {
        self.cells.nrows().try_into().unwrap_or(Coord::MAX)
    }

    pub fn total_cells(&self) -> CellCount {
        square(self.size())
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        let size = self.size();
        if coords.0 < size && coords.1 < size {
            Ok(coords)
        } else {
            Err(GameError::InvalidCoords)
        }
    }

    pub fn iter_coords(&self) -> impl Iterator<Item = Coord2> + use<> {
        iter_board(self.size())
    }

    pub fn iter_neighbors(&self, coords: Coord2) -> NeighborIter {
        self.cells.iter_neighbors(coords)
    }

    /// Coordinates of every cell matching `pred`, in row-major order.
    pub fn find(&self, pred: impl Fn(Cell) -> bool) -> Vec<Coord2> {
        self.iter_coords().filter(|&pos| pred(self[pos])).collect()
    }

    pub fn mine_count(&self) -> CellCount {
        self.count(|cell| cell.is_mine)
    }

    pub fn shown_count(&self) -> CellCount {
        self.count(|cell| cell.is_shown)
    }

    fn count(&self, pred: impl Fn(&Cell) -> bool) -> CellCount {
        self.cells
            .iter()
            .filter(|cell| pred(cell))
            .count()
            .try_into()
            .unwrap_or(CellCount::MAX)
    }

    pub fn adjacent_mine_count(&self, coords: Coord2) -> u8 {
        let count = self.iter_neighbors(coords).filter(|&pos| self[pos].is_mine).count();
        // at most 8 neighbours
        count as u8
    }

    /// Lays every mine of `layout`; counts are left stale until [`Board::recount`].
    pub fn lay_mines(&mut self, layout: &MineLayout) {
        for pos in layout.iter_mines() {
            self[pos].is_mine = true;
        }
    }

    /// Recomputes `mines_around` for every non-mine cell.
    pub fn recount(&mut self) {
        for pos in self.iter_coords() {
            let count = if self[pos].is_mine {
                0
            } else {
                self.adjacent_mine_count(pos)
            };
            self[pos].mines_around = count;
        }
    }

    /// Shows `origin` and cascades through zero-count cells.
    ///
    /// The caller guarantees `origin` is a hidden, unmarked, safe cell. Returns every newly shown
    /// cell, `origin` first. `is_shown` doubles as the visited set, so the fill terminates even on
    /// a board without mines.
    pub fn expand(&mut self, origin: Coord2) -> Vec<Coord2> {
        let mut opened = Vec::new();
        let mut to_visit = vec![origin];

        while let Some(pos) = to_visit.pop() {
            let cell = self[pos];
            if cell.is_shown || cell.is_mine || cell.is_marked {
                continue;
            }

            self[pos].is_shown = true;
            self[pos].is_safe = false;
            opened.push(pos);
            log::trace!("flood opened {:?}, mines around: {}", pos, cell.mines_around);

            if cell.mines_around == 0 {
                to_visit.extend(self.iter_neighbors(pos).filter(|&next| self[next].is_hidden()));
            }
        }

        opened
    }
}

impl Index<Coord2> for Board {
    type Output = Cell;

    fn index(&self, coords: Coord2) -> &Self::Output {
        &self.cells[coords.to_nd_index()]
    }
}

impl IndexMut<Coord2> for Board {
    fn index_mut(&mut self, coords: Coord2) -> &mut Self::Output {
        &mut self.cells[coords.to_nd_index()]
    }
}
