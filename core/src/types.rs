use ndarray::Array2;

/// Single board axis, used for the board side length and for row/column indices.
pub type Coord = u8;

/// Count type for mines, revealed cells and total cells.
pub type CellCount = u16;

/// Board position as `(row, col)`.
pub type Coord2 = (Coord, Coord);

pub trait ToNdIndex {
    type Output;
    fn to_nd_index(self) -> Self::Output;
}

impl ToNdIndex for Coord2 {
    type Output = [usize; 2];

    fn to_nd_index(self) -> Self::Output {
        [self.0.into(), self.1.into()]
    }
}

/// Number of cells on a square board of side `size`.
pub const fn square(size: Coord) -> CellCount {
    let size = size as CellCount;
    size.saturating_mul(size)
}

const OFFSETS: [(i8, i8); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Iterates the in-bounds 8-neighbourhood of a cell on a square board.
#[derive(Clone, Debug)]
pub struct NeighborIter {
    center: Coord2,
    size: Coord,
    next: usize,
}

impl NeighborIter {
    pub fn new(center: Coord2, size: Coord) -> Self {
        Self {
            center,
            size,
            next: 0,
        }
    }

    fn shift(&self, (dr, dc): (i8, i8)) -> Option<Coord2> {
        let row = self.center.0.checked_add_signed(dr)?;
        let col = self.center.1.checked_add_signed(dc)?;
        (row < self.size && col < self.size).then_some((row, col))
    }
}

impl Iterator for NeighborIter {
    type Item = Coord2;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(&offset) = OFFSETS.get(self.next) {
            self.next += 1;
            if let Some(coords) = self.shift(offset) {
                return Some(coords);
            }
        }
        None
    }
}

pub trait NeighborIterExt {
    fn iter_neighbors(&self, coords: Coord2) -> NeighborIter;
}

impl<T> NeighborIterExt for Array2<T> {
    fn iter_neighbors(&self, coords: Coord2) -> NeighborIter {
        let size = self.nrows().try_into().unwrap_or(Coord::MAX);
        NeighborIter::new(coords, size)
    }
}

/// Inclusive axis-aligned rectangle of cells, built from two arbitrary corners.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Area {
    top_left: Coord2,
    bottom_right: Coord2,
}

impl Area {
    pub fn spanning(a: Coord2, b: Coord2) -> Self {
        Self {
            top_left: (a.0.min(b.0), a.1.min(b.1)),
            bottom_right: (a.0.max(b.0), a.1.max(b.1)),
        }
    }

    /// The 3x3 block centred on `center`, clamped to the board.
    pub fn around(center: Coord2, size: Coord) -> Self {
        let last = size.saturating_sub(1);
        Self {
            top_left: (center.0.saturating_sub(1), center.1.saturating_sub(1)),
            bottom_right: (
                center.0.saturating_add(1).min(last),
                center.1.saturating_add(1).min(last),
            ),
        }
    }

    pub fn contains(&self, (row, col): Coord2) -> bool {
        (self.top_left.0..=self.bottom_right.0).contains(&row)
            && (self.top_left.1..=self.bottom_right.1).contains(&col)
    }

    pub fn iter(&self) -> impl Iterator<Item = Coord2> + use<> {
        let (top, left) = self.top_left;
        let (bottom, right) = self.bottom_right;
        (top..=bottom).flat_map(move |row| (left..=right).map(move |col| (row, col)))
    }
}

/// Row-major iterator over every cell of a square board.
pub fn iter_board(size: Coord) -> impl Iterator<Item = Coord2> {
    (0..size).flat_map(move |row| (0..size).map(move |col| (row, col)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corner_has_three_neighbors() {
        let neighbors: Vec<_> = NeighborIter::new((0, 0), 4).collect();
        assert_eq!(neighbors, vec![(0, 1), (1, 0), (1, 1)]);
    }

    #[test]
    fn center_has_eight_neighbors() {
        assert_eq!(NeighborIter::new((2, 2), 5).count(), 8);
    }

    #[test]
    fn single_cell_board_has_no_neighbors() {
        assert_eq!(NeighborIter::new((0, 0), 1).count(), 0);
    }

    #[test]
    fn area_normalizes_corners() {
        let area = Area::spanning((3, 0), (1, 2));
        let cells: Vec<_> = area.iter().collect();
        assert_eq!(cells.len(), 9);
        assert_eq!(cells.first(), Some(&(1, 0)));
        assert_eq!(cells.last(), Some(&(3, 2)));
        assert!(area.contains((2, 1)));
        assert!(!area.contains((0, 1)));
    }

    #[test]
    fn area_around_edge_is_clamped() {
        assert_eq!(Area::around((0, 3), 4).iter().count(), 4);
        assert_eq!(Area::around((1, 1), 4).iter().count(), 9);
    }
}
