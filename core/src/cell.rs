use serde::{Deserialize, Serialize};

/// One board position as tracked by the engine.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// Adjacent mine count, meaningless on a mine.
    pub mines_around: u8,
    pub is_shown: bool,
    pub is_mine: bool,
    /// Never set together with `is_shown`.
    pub is_marked: bool,
    /// Transient highlight left by a safe-click.
    pub is_safe: bool,
}

impl Cell {
    pub const fn is_hidden(self) -> bool {
        !self.is_shown
    }

    /// What the cell shows with no transient overlay applied.
    pub const fn resting_view(self) -> CellView {
        if self.is_shown {
            CellView::Revealed(self.mines_around)
        } else if self.is_marked {
            CellView::Flagged
        } else if self.is_safe {
            CellView::Safe
        } else {
            CellView::Hidden
        }
    }

    /// What the cell shows while it is being peeked at.
    pub const fn peek_view(self) -> CellView {
        if self.is_mine {
            CellView::Mine
        } else {
            CellView::Revealed(self.mines_around)
        }
    }
}

/// Visual content of a cell, as handed to renderers.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellView {
    Hidden,
    Flagged,
    Safe,
    Revealed(u8),
    Mine,
    /// The mine that ended the round.
    Exploded,
}

impl CellView {
    /// Whether the cell still looks unopened.
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Hidden | Self::Flagged | Self::Safe)
    }
}
