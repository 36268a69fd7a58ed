use rand::seq::index;

use super::*;

/// Uniform placement over every cell except the starting one.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RandomMineGenerator;

impl MineGenerator for RandomMineGenerator {
    fn generate(&mut self, config: LevelConfig, start: Coord2, rng: &mut SmallRng) -> MineLayout {
        let size = config.size;
        let total_cells = usize::from(config.total_cells());
        let start_index = usize::from(start.0) * usize::from(size) + usize::from(start.1);

        let free_cells = total_cells.saturating_sub(1);
        let mut mines = usize::from(config.mines);
        if mines > free_cells {
            log::warn!(
                "Cannot fit {} mines around the start cell, placing {} instead",
                mines,
                free_cells
            );
            mines = free_cells;
        }

        // sample among the other cells, then shift indices past the start cell
        let coords: Vec<Coord2> = index::sample(rng, free_cells, mines)
            .into_iter()
            .map(|i| if i >= start_index { i + 1 } else { i })
            .map(|i| ((i / usize::from(size)) as Coord, (i % usize::from(size)) as Coord))
            .collect();

        log::debug!("placed {} mines avoiding {:?}", coords.len(), start);
        MineLayout::from_mine_coords_unchecked(size, &coords)
    }
}
