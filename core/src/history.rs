use serde::{Deserialize, Serialize};

use crate::*;

/// Board and counters captured right before a committed move.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub board: Board,
    pub round: RoundState,
}

/// LIFO stack of snapshots consumed by undo.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryStack {
    snapshots: Vec<Snapshot>,
}

impl HistoryStack {
    pub fn push(&mut self, board: &Board, round: &RoundState) {
        self.snapshots.push(Snapshot {
            board: board.clone(),
            round: *round,
        });
    }

    pub fn pop(&mut self) -> Option<Snapshot> {
        self.snapshots.pop()
    }

    /// Takes mines out of every stored snapshot, keeping their counters and counts consistent.
    pub fn forget_mines(&mut self, mines: &[Coord2]) {
        for snapshot in &mut self.snapshots {
            let mut removed: CellCount = 0;
            for &pos in mines {
                if snapshot.board[pos].is_mine {
                    snapshot.board[pos].is_mine = false;
                    removed += 1;
                }
            }
            if removed > 0 {
                snapshot.round.mines_remaining =
                    snapshot.round.mines_remaining.saturating_sub(removed);
                snapshot.board.recount();
            }
        }
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshots_do_not_alias_the_live_board() {
        let mut history = HistoryStack::default();
        let mut board = Board::new(3);
        let mut round = RoundState::default();

        history.push(&board, &round);
        board[(1, 1)].is_shown = true;
        round.revealed_count = 1;
        history.push(&board, &round);

        let latest = history.pop().unwrap();
        assert!(latest.board[(1, 1)].is_shown);
        let first = history.pop().unwrap();
        assert!(!first.board[(1, 1)].is_shown);
        assert_eq!(first.round.revealed_count, 0);
        assert!(history.pop().is_none());
    }

    #[test]
    fn forgotten_mines_leave_every_snapshot() {
        let mut history = HistoryStack::default();
        let mut board = Board::new(3);
        board[(0, 0)].is_mine = true;
        board[(2, 2)].is_mine = true;
        board.recount();
        let round = RoundState {
            mines_remaining: 2,
            ..Default::default()
        };
        history.push(&board, &round);
        history.push(&board, &round);

        history.forget_mines(&[(2, 2)]);

        while let Some(snapshot) = history.pop() {
            assert!(!snapshot.board[(2, 2)].is_mine);
            assert!(snapshot.board[(0, 0)].is_mine);
            assert_eq!(snapshot.board[(1, 1)].mines_around, 1);
            assert_eq!(snapshot.round.mines_remaining, 1);
        }
    }
}
