//! Delayed effects and the round clock.
//!
//! Time is virtual: whoever embeds the engine feeds elapsed time through [`Scheduler::advance`]
//! and [`RoundTimer::advance`], usually from a UI interval. Every task remembers the round
//! generation it was scheduled in, so the engine can drop tasks that outlived their round.

use core::time::Duration;

use crate::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PeekKind {
    Hint,
    MegaHint,
}

/// Effect to undo once its delay runs out.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Task {
    /// A mine flashed by a lost life goes back to hidden.
    HideFlash(Coord2),
    /// A hint or mega-hint preview is over.
    EndPeek(PeekKind, Area),
    /// Manually placed mines stop being displayed.
    HidePlacedMines,
    /// A safe-click highlight fades.
    ClearSafe(Coord2),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

/// A task whose delay ran out.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Fired {
    pub id: TaskId,
    pub generation: u64,
    pub task: Task,
}

#[derive(Clone, Debug)]
struct Pending {
    id: TaskId,
    due: Duration,
    generation: u64,
    task: Task,
}

#[derive(Clone, Debug, Default)]
pub struct Scheduler {
    now: Duration,
    next_id: u64,
    pending: Vec<Pending>,
}

impl Scheduler {
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn schedule(&mut self, delay: Duration, generation: u64, task: Task) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        let due = self.now + delay;
        log::trace!("scheduled {:?} as {:?}, due at {:?}", task, id, due);
        self.pending.push(Pending {
            id,
            due,
            generation,
            task,
        });
        id
    }

    /// Returns whether the task was still pending.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|pending| pending.id != id);
        before != self.pending.len()
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Moves the clock forward and hands back every task that came due, earliest first.
    pub fn advance(&mut self, elapsed: Duration) -> Vec<Fired> {
        self.now += elapsed;
        let now = self.now;

        let (mut due, waiting): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|pending| pending.due <= now);
        self.pending = waiting;

        due.sort_by_key(|pending| (pending.due, pending.id));
        due.into_iter()
            .map(|pending| Fired {
                id: pending.id,
                generation: pending.generation,
                task: pending.task,
            })
            .collect()
    }
}

/// 1 Hz round clock, stopped exactly once at round end.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RoundTimer {
    running: bool,
    carry: Duration,
    elapsed_secs: u32,
}

impl RoundTimer {
    const TICK: Duration = Duration::from_secs(1);

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed_secs
    }

    pub fn start(&mut self) {
        if !self.running {
            log::debug!("timer started at {}s", self.elapsed_secs);
            self.running = true;
        }
    }

    /// Returns `false` when the timer was already stopped.
    pub fn stop(&mut self) -> bool {
        if !self.running {
            return false;
        }
        log::debug!("timer stopped at {}s", self.elapsed_secs);
        self.running = false;
        self.carry = Duration::ZERO;
        true
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Returns how many whole ticks happened.
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        if !self.running {
            return 0;
        }
        self.carry += elapsed;
        let mut ticks = 0;
        while self.carry >= Self::TICK {
            self.carry -= Self::TICK;
            ticks += 1;
        }
        self.elapsed_secs = self.elapsed_secs.saturating_add(ticks);
        ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(ms: u64) -> Duration {
        Duration::from_millis(ms)
    }

    #[test]
    fn fires_due_tasks_in_order() {
        let mut scheduler = Scheduler::default();
        let late = scheduler.schedule(ms(1500), 0, Task::HidePlacedMines);
        let early = scheduler.schedule(ms(1000), 0, Task::HideFlash((1, 1)));

        assert!(scheduler.advance(ms(999)).is_empty());
        let fired = scheduler.advance(ms(600));

        assert_eq!(fired.iter().map(|f| f.id).collect::<Vec<_>>(), vec![early, late]);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn cancelled_tasks_never_fire() {
        let mut scheduler = Scheduler::default();
        let id = scheduler.schedule(ms(10), 3, Task::ClearSafe((0, 0)));
        assert!(scheduler.cancel(id));
        assert!(!scheduler.cancel(id));
        assert!(scheduler.advance(ms(100)).is_empty());
    }

    #[test]
    fn fired_tasks_keep_their_generation() {
        let mut scheduler = Scheduler::default();
        scheduler.schedule(ms(10), 7, Task::HidePlacedMines);
        let fired = scheduler.advance(ms(10));
        assert_eq!(fired[0].generation, 7);
        assert_eq!(scheduler.now(), ms(10));
    }

    #[test]
    fn timer_ticks_whole_seconds_only_while_running() {
        let mut timer = RoundTimer::default();
        assert_eq!(timer.advance(ms(5000)), 0);

        timer.start();
        assert_eq!(timer.advance(ms(700)), 0);
        assert_eq!(timer.advance(ms(700)), 1);
        assert_eq!(timer.advance(ms(2600)), 3);
        assert_eq!(timer.elapsed_secs(), 4);

        assert!(timer.stop());
        assert!(!timer.stop());
        assert_eq!(timer.advance(ms(3000)), 0);
        assert_eq!(timer.elapsed_secs(), 4);
    }
}
