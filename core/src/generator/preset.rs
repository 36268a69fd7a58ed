use super::*;

/// Replays a fixed set of mine positions, useful for puzzles and tests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PresetMineGenerator {
    mines: Vec<Coord2>,
}

impl PresetMineGenerator {
    pub fn new(mines: impl Into<Vec<Coord2>>) -> Self {
        Self {
            mines: mines.into(),
        }
    }
}

impl MineGenerator for PresetMineGenerator {
    fn generate(&mut self, config: LevelConfig, start: Coord2, _rng: &mut SmallRng) -> MineLayout {
        let in_bounds = |&(row, col): &Coord2| row < config.size && col < config.size;
        let mines: Vec<Coord2> = self
            .mines
            .iter()
            .copied()
            .filter(in_bounds)
            .filter(|&pos| {
                let keep = pos != start;
                if !keep {
                    log::warn!("Preset mine at {:?} dropped, it is the start cell", pos);
                }
                keep
            })
            .collect();

        if mines.len() != self.mines.len() {
            log::warn!(
                "Preset layout trimmed from {} to {} mines",
                self.mines.len(),
                mines.len()
            );
        }
        MineLayout::from_mine_coords_unchecked(config.size, &mines)
    }
}
