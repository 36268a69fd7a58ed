use serde::{Deserialize, Serialize};

use crate::*;

/// Counters and quotas of the round being played.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundState {
    pub is_active: bool,
    pub revealed_count: CellCount,
    pub marked_count: CellCount,
    pub elapsed_secs: u32,
    pub hints_remaining: u8,
    pub safe_clicks_remaining: u8,
    pub lives_remaining: u8,
    /// Mines currently on the board, lowered by the exterminator.
    pub mines_remaining: CellCount,
}

impl RoundState {
    pub fn new(level: LevelConfig, settings: &EngineSettings) -> Self {
        Self {
            is_active: true,
            revealed_count: 0,
            marked_count: 0,
            elapsed_secs: 0,
            hints_remaining: settings.hints,
            safe_clicks_remaining: settings.safe_clicks,
            lives_remaining: level.lives,
            mines_remaining: level.mines,
        }
    }

    /// Both counters must match exactly for a win.
    pub fn is_cleared(&self, total_cells: CellCount) -> bool {
        self.revealed_count == total_cells.saturating_sub(self.mines_remaining)
            && self.marked_count == self.mines_remaining
    }

    /// Flags left to place, negative when over-flagged.
    pub fn flags_left(&self) -> i32 {
        i32::from(self.mines_remaining) - i32::from(self.marked_count)
    }
}

/// Everything a renderer needs for counters, timer and quotas.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundSummary {
    pub state: EngineState,
    pub armed: Armed,
    pub round: RoundState,
    pub placements_left: CellCount,
    pub exterminator_used: bool,
}
