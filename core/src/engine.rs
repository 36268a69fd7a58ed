use chrono::Utc;
use core::fmt;
use core::time::Duration;
use hashbrown::{HashMap, HashSet};
use rand::rngs::SmallRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::*;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineState {
    /// Waiting for manually placed mines.
    #[default]
    Idle,
    Active,
    Won,
    Lost,
}

impl EngineState {
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }

    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

/// How the next reveal is interpreted.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Armed {
    #[default]
    None,
    Hint,
    MegaHint,
    ManualPlacement,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    NoChange,
    Changed,
    /// A mine was hit but a life absorbed it.
    LifeLost,
    Won,
    Lost,
}

impl Outcome {
    pub const fn has_update(self) -> bool {
        !matches!(self, Self::NoChange)
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

/// Side information a renderer may want to react to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    RoundStarted,
    PlacementComplete,
    PlacedMinesHidden,
    CornerPicked(Coord2),
    PreviewStarted(PeekKind),
    PreviewEnded(PeekKind),
    MinesExterminated(CellCount),
    Undone,
    ScoreRecorded,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CellChange {
    pub coords: Coord2,
    pub view: CellView,
}

/// Result of every engine operation: the cells to redraw and the counters after the change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Update {
    pub outcome: Outcome,
    pub changes: Vec<CellChange>,
    pub notices: SmallVec<[Notice; 2]>,
    pub summary: RoundSummary,
}

impl Update {
    pub fn view_of(&self, coords: Coord2) -> Option<CellView> {
        self.changes
            .iter()
            .find(|change| change.coords == coords)
            .map(|change| change.view)
    }
}

/// Cells touched by an operation, deduplicated, in first-touch order.
#[derive(Default)]
struct Touched {
    order: Vec<Coord2>,
    seen: HashSet<Coord2>,
}

impl Touched {
    fn add(&mut self, coords: Coord2) {
        if self.seen.insert(coords) {
            self.order.push(coords);
        }
    }

    fn extend(&mut self, coords: impl IntoIterator<Item = Coord2>) {
        for pos in coords {
            self.add(pos);
        }
    }
}

/// Transient display state that never enters undo snapshots.
#[derive(Clone, Debug, Default)]
struct Overlay {
    peeks: HashMap<Coord2, u8>,
    flashes: HashMap<Coord2, u8>,
    show_placed: bool,
}

impl Overlay {
    fn hold(map: &mut HashMap<Coord2, u8>, coords: Coord2) {
        *map.entry(coords).or_default() += 1;
    }

    fn release(map: &mut HashMap<Coord2, u8>, coords: Coord2) {
        if let Some(count) = map.get_mut(&coords) {
            *count -= 1;
            if *count == 0 {
                map.remove(&coords);
            }
        }
    }

    /// Drops everything, returning the cells that were affected.
    fn clear(&mut self) -> Vec<Coord2> {
        self.show_placed = false;
        self.peeks
            .drain()
            .chain(self.flashes.drain())
            .map(|(pos, _)| pos)
            .collect()
    }
}

/// Owns one round of play at a time and every assist that goes with it.
pub struct GameEngine<S: ScoreStore = MemoryScoreStore> {
    settings: EngineSettings,
    level: LevelConfig,
    board: Board,
    round: RoundState,
    state: EngineState,
    armed: Armed,
    mega_corner: Option<Coord2>,
    placements_left: CellCount,
    manual_round: bool,
    first_click: bool,
    exterminator_used: bool,
    triggered_mine: Option<Coord2>,
    history: HistoryStack,
    overlay: Overlay,
    /// Pending highlight fades, cancelled when the cell opens first.
    safe_tasks: HashMap<Coord2, TaskId>,
    generation: u64,
    scheduler: Scheduler,
    timer: RoundTimer,
    rng: SmallRng,
    generator: Box<dyn MineGenerator>,
    scores: S,
    player_name: Option<String>,
}

impl GameEngine {
    pub fn new(level: LevelConfig) -> Result<Self> {
        Self::with_settings(level, EngineSettings::default())
    }

    pub fn with_settings(level: LevelConfig, settings: EngineSettings) -> Result<Self> {
        Self::with_store(level, settings, MemoryScoreStore::default())
    }
}

impl<S: ScoreStore> GameEngine<S> {
    /// Builds an engine with a round of `level` already active.
    pub fn with_store(level: LevelConfig, settings: EngineSettings, scores: S) -> Result<Self> {
        let level = level.validate()?;
        let seed = settings.seed.unwrap_or_else(|| rand::rng().random());
        log::debug!("engine seed: {}", seed);

        let mut engine = Self {
            round: RoundState::new(level, &settings),
            settings,
            level,
            board: Board::new(level.size),
            state: EngineState::Idle,
            armed: Armed::None,
            mega_corner: None,
            placements_left: 0,
            manual_round: false,
            first_click: true,
            exterminator_used: false,
            triggered_mine: None,
            history: HistoryStack::default(),
            overlay: Overlay::default(),
            safe_tasks: HashMap::new(),
            generation: 0,
            scheduler: Scheduler::default(),
            timer: RoundTimer::default(),
            rng: SmallRng::seed_from_u64(seed),
            generator: Box::new(RandomMineGenerator),
            scores,
            player_name: None,
        };
        engine.reset_round(level, false);
        Ok(engine)
    }

    /// Replaces how mines are laid on the first reveal, from the next first reveal on.
    pub fn with_generator(mut self, generator: impl MineGenerator + 'static) -> Self {
        self.generator = Box::new(generator);
        self
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn level(&self) -> LevelConfig {
        self.level
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn round(&self) -> &RoundState {
        &self.round
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn armed(&self) -> Armed {
        self.armed
    }

    pub fn mega_corner(&self) -> Option<Coord2> {
        self.mega_corner
    }

    /// Whether mines exist and the first reveal happened.
    pub fn is_started(&self) -> bool {
        !self.first_click
    }

    pub fn placements_left(&self) -> CellCount {
        self.placements_left
    }

    pub fn triggered_mine(&self) -> Option<Coord2> {
        self.triggered_mine
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn pending_tasks(&self) -> usize {
        self.scheduler.len()
    }

    pub fn scores(&self) -> &S {
        &self.scores
    }

    pub fn scores_mut(&mut self) -> &mut S {
        &mut self.scores
    }

    /// Name recorded with the next won round, `None` records a guest.
    pub fn set_player_name(&mut self, name: Option<String>) {
        self.player_name = name;
    }

    pub fn summary(&self) -> RoundSummary {
        RoundSummary {
            state: self.state,
            armed: self.armed,
            round: self.round,
            placements_left: self.placements_left,
            exterminator_used: self.exterminator_used,
        }
    }

    pub fn cell_at(&self, coords: Coord2) -> Result<Cell> {
        let coords = self.board.validate_coords(coords)?;
        Ok(self.board[coords])
    }

    pub fn view_at(&self, coords: Coord2) -> Result<CellView> {
        let coords = self.board.validate_coords(coords)?;
        Ok(self.view(coords))
    }

    /// Every cell with its current view, row-major.
    pub fn views(&self) -> Vec<CellChange> {
        self.board
            .iter_coords()
            .map(|coords| CellChange {
                coords,
                view: self.view(coords),
            })
            .collect()
    }

    fn view(&self, coords: Coord2) -> CellView {
        let cell = self.board[coords];

        if self.state == EngineState::Lost {
            if self.triggered_mine == Some(coords) {
                return CellView::Exploded;
            }
            if cell.is_mine {
                return CellView::Mine;
            }
        }

        if cell.is_mine
            && (self.overlay.flashes.contains_key(&coords) || self.overlay.show_placed)
        {
            return CellView::Mine;
        }

        if !cell.is_shown && self.overlay.peeks.contains_key(&coords) {
            return cell.peek_view();
        }

        cell.resting_view()
    }

    pub fn new_round(&mut self, level: LevelConfig) -> Result<Update> {
        let level = level.validate()?;
        Ok(self.reset_round(level, false))
    }

    pub fn set_level(&mut self, level: Level) -> Update {
        self.reset_round(level.config(), false)
    }

    pub fn restart(&mut self) -> Update {
        self.reset_round(self.level, false)
    }

    /// Starts a fresh round that waits for every mine to be placed by hand.
    pub fn enter_manual_placement_mode(&mut self) -> Update {
        self.reset_round(self.level, true)
    }

    fn reset_round(&mut self, level: LevelConfig, manual: bool) -> Update {
        log::debug!("new round: {:?}, manual placement: {}", level, manual);

        self.generation += 1;
        self.scheduler.cancel_all();
        self.safe_tasks.clear();
        self.timer.reset();
        self.overlay.clear();

        self.level = level;
        self.board = Board::new(level.size);
        self.round = RoundState::new(level, &self.settings);
        self.history.clear();
        self.mega_corner = None;
        self.manual_round = manual;
        self.first_click = true;
        self.exterminator_used = false;
        self.triggered_mine = None;

        if manual && level.mines > 0 {
            self.state = EngineState::Idle;
            self.round.is_active = false;
            self.armed = Armed::ManualPlacement;
            self.placements_left = level.mines;
        } else {
            self.state = EngineState::Active;
            self.armed = Armed::None;
            self.placements_left = 0;
        }

        let mut touched = Touched::default();
        touched.extend(self.board.iter_coords());
        self.finish(Outcome::Changed, touched, &[Notice::RoundStarted])
    }

    /// Primary action; how it resolves depends on what is armed.
    pub fn reveal_cell(&mut self, row: Coord, col: Coord) -> Result<Update> {
        let coords = self.board.validate_coords((row, col))?;

        if self.armed == Armed::ManualPlacement && self.placements_left > 0 {
            return Ok(self.place_mine(coords));
        }

        let cell = self.board[coords];
        if !self.state.is_active() || cell.is_shown || cell.is_marked {
            return Ok(self.no_change());
        }

        let mut touched = Touched::default();
        if self.first_click {
            self.lay_mines(coords);
        }

        match self.armed {
            Armed::Hint => {
                self.armed = Armed::None;
                let area = Area::around(coords, self.board.size());
                return Ok(self.start_peek(PeekKind::Hint, area, touched));
            }
            Armed::MegaHint => return Ok(self.pick_corner(coords, touched)),
            Armed::None | Armed::ManualPlacement => {}
        }

        self.history.push(&self.board, &self.round);

        if self.board[coords].is_mine {
            return Ok(self.hit_mine(coords, touched));
        }

        let opened = self.board.expand(coords);
        log::debug!("revealed {:?}, {} cells opened", coords, opened.len());
        for pos in &opened {
            if let Some(id) = self.safe_tasks.remove(pos) {
                self.scheduler.cancel(id);
            }
        }
        self.round.revealed_count += CellCount::try_from(opened.len()).unwrap_or(CellCount::MAX);
        touched.extend(opened);

        Ok(self.settle(touched))
    }

    /// Lays the mines on the first reveal of the round.
    ///
    /// A round entered through manual placement keeps its hand-placed mines when the quota was
    /// already used up by the time of this first reveal.
    fn lay_mines(&mut self, start: Coord2) {
        self.first_click = false;
        // marks placed before any mine existed are not worth undoing into
        self.history.clear();

        if !(self.manual_round && self.placements_left == 0) {
            let layout = self.generator.generate(self.level, start, &mut self.rng);
            self.board.lay_mines(&layout);
            self.board.recount();
            self.round.mines_remaining = self.board.mine_count();
        }

        self.timer.start();
    }

    fn place_mine(&mut self, coords: Coord2) -> Update {
        if self.board[coords].is_mine {
            return self.no_change();
        }

        self.board[coords].is_mine = true;
        self.placements_left -= 1;
        self.overlay.show_placed = true;
        log::debug!("mine placed at {:?}, {} left", coords, self.placements_left);

        let mut touched = Touched::default();
        touched.add(coords);
        if self.placements_left > 0 {
            return self.finish(Outcome::Changed, touched, &[]);
        }

        self.board.recount();
        self.round.mines_remaining = self.board.mine_count();
        self.armed = Armed::None;
        self.state = EngineState::Active;
        self.round.is_active = true;
        let delay = self.settings.timings.delay_for(Task::HidePlacedMines);
        self.scheduler.schedule(delay, self.generation, Task::HidePlacedMines);

        self.finish(Outcome::Changed, touched, &[Notice::PlacementComplete])
    }

    fn pick_corner(&mut self, coords: Coord2, touched: Touched) -> Update {
        match self.mega_corner.take() {
            Some(first) => {
                self.armed = Armed::None;
                self.start_peek(PeekKind::MegaHint, Area::spanning(first, coords), touched)
            }
            None => {
                self.mega_corner = Some(coords);
                self.finish(Outcome::Changed, touched, &[Notice::CornerPicked(coords)])
            }
        }
    }

    fn start_peek(&mut self, kind: PeekKind, area: Area, mut touched: Touched) -> Update {
        log::debug!("{:?} preview of {:?}", kind, area);
        for pos in area.iter() {
            Overlay::hold(&mut self.overlay.peeks, pos);
        }
        touched.extend(area.iter());

        let task = Task::EndPeek(kind, area);
        let delay = self.settings.timings.delay_for(task);
        self.scheduler.schedule(delay, self.generation, task);

        self.finish(Outcome::Changed, touched, &[Notice::PreviewStarted(kind)])
    }

    fn hit_mine(&mut self, coords: Coord2, mut touched: Touched) -> Update {
        touched.add(coords);

        if self.round.lives_remaining > 0 {
            self.round.lives_remaining -= 1;
            log::debug!(
                "mine hit at {:?}, {} lives left",
                coords,
                self.round.lives_remaining
            );
            Overlay::hold(&mut self.overlay.flashes, coords);
            let task = Task::HideFlash(coords);
            let delay = self.settings.timings.delay_for(task);
            self.scheduler.schedule(delay, self.generation, task);
            return self.finish(Outcome::LifeLost, touched, &[]);
        }

        log::debug!("mine hit at {:?}, round lost", coords);
        self.triggered_mine = Some(coords);
        let notices = self.end_round(false, &mut touched);
        self.finish(Outcome::Lost, touched, &notices)
    }

    /// Checks the win condition after a committed move.
    fn settle(&mut self, mut touched: Touched) -> Update {
        if self.round.is_cleared(self.board.total_cells()) {
            let notices = self.end_round(true, &mut touched);
            self.finish(Outcome::Won, touched, &notices)
        } else {
            self.finish(Outcome::Changed, touched, &[])
        }
    }

    fn end_round(&mut self, won: bool, touched: &mut Touched) -> SmallVec<[Notice; 2]> {
        let mut notices = SmallVec::new();
        if self.state.is_finished() {
            return notices;
        }

        self.state = if won {
            EngineState::Won
        } else {
            EngineState::Lost
        };
        self.round.is_active = false;
        self.armed = Armed::None;
        self.mega_corner = None;
        self.timer.stop();
        self.round.elapsed_secs = self.timer.elapsed_secs();

        // pending effects belong to a round that no longer accepts input
        self.generation += 1;
        touched.extend(self.overlay.clear());
        self.cancel_safe_tasks();
        touched.extend(self.clear_safe_marks());
        if !won {
            touched.extend(self.board.find(|cell| cell.is_mine));
        }
        log::debug!("round ended, won: {}, after {}s", won, self.round.elapsed_secs);

        if won {
            let entry = ScoreEntry::new(
                self.player_name.as_deref(),
                self.round.elapsed_secs,
                Utc::now(),
            );
            self.scores.append(entry);
            notices.push(Notice::ScoreRecorded);
        }
        notices
    }

    fn cancel_safe_tasks(&mut self) {
        for (_, id) in self.safe_tasks.drain() {
            self.scheduler.cancel(id);
        }
    }

    fn clear_safe_marks(&mut self) -> Vec<Coord2> {
        let safe = self.board.find(|cell| cell.is_safe);
        for &pos in &safe {
            self.board[pos].is_safe = false;
        }
        safe
    }

    pub fn toggle_mark(&mut self, row: Coord, col: Coord) -> Result<Update> {
        let coords = self.board.validate_coords((row, col))?;

        if !self.state.is_active()
            || self.armed == Armed::ManualPlacement
            || self.board[coords].is_shown
        {
            return Ok(self.no_change());
        }

        self.history.push(&self.board, &self.round);
        let cell = &mut self.board[coords];
        cell.is_marked = !cell.is_marked;
        if cell.is_marked {
            self.round.marked_count += 1;
        } else {
            self.round.marked_count -= 1;
        }
        log::debug!("mark toggled at {:?}, {} marked", coords, self.round.marked_count);

        let mut touched = Touched::default();
        touched.add(coords);
        Ok(self.settle(touched))
    }

    /// Restores the board and counters from before the last committed move.
    pub fn undo(&mut self) -> Update {
        if !self.state.is_active() {
            return self.no_change();
        }
        let Some(snapshot) = self.history.pop() else {
            return self.no_change();
        };
        log::debug!("undo, {} snapshots left", self.history.len());

        self.board = snapshot.board;
        self.round = RoundState {
            elapsed_secs: self.timer.elapsed_secs(),
            ..snapshot.round
        };

        self.generation += 1;
        self.overlay.clear();
        self.cancel_safe_tasks();
        self.clear_safe_marks();

        let mut touched = Touched::default();
        touched.extend(self.board.iter_coords());
        self.finish(Outcome::Changed, touched, &[Notice::Undone])
    }

    /// Spends a hint right away; the next reveal becomes a 3x3 preview.
    pub fn arm_hint(&mut self) -> Update {
        if self.state.is_finished()
            || self.armed == Armed::ManualPlacement
            || self.round.hints_remaining == 0
        {
            return self.no_change();
        }
        self.round.hints_remaining -= 1;
        self.armed = Armed::Hint;
        log::debug!("hint armed, {} left", self.round.hints_remaining);
        self.finish(Outcome::Changed, Touched::default(), &[])
    }

    /// The next two reveals pick the corners of a rectangular preview.
    pub fn arm_mega_hint(&mut self) -> Update {
        if self.state.is_finished() || self.armed == Armed::ManualPlacement {
            return self.no_change();
        }
        self.armed = Armed::MegaHint;
        self.mega_corner = None;
        log::debug!("mega hint armed");
        self.finish(Outcome::Changed, Touched::default(), &[])
    }

    /// Highlights one random hidden cell that is guaranteed not to be a mine.
    pub fn request_safe_click(&mut self) -> Result<Update> {
        if self.first_click {
            return Err(GameError::NotStarted);
        }
        if !self.state.is_active() || self.round.safe_clicks_remaining == 0 {
            return Ok(self.no_change());
        }

        let candidates = self
            .board
            .find(|cell| !cell.is_shown && !cell.is_mine && !cell.is_marked && !cell.is_safe);
        let Some(&coords) = candidates.choose(&mut self.rng) else {
            log::debug!("safe click requested but no cell qualifies");
            return Ok(self.no_change());
        };

        self.board[coords].is_safe = true;
        self.round.safe_clicks_remaining -= 1;
        log::debug!(
            "safe click at {:?}, {} left",
            coords,
            self.round.safe_clicks_remaining
        );

        let task = Task::ClearSafe(coords);
        let delay = self.settings.timings.delay_for(task);
        let id = self.scheduler.schedule(delay, self.generation, task);
        self.safe_tasks.insert(coords, id);

        let mut touched = Touched::default();
        touched.add(coords);
        Ok(self.finish(Outcome::Changed, touched, &[]))
    }

    /// Removes a few random hidden, unmarked mines, once per round.
    pub fn exterminate_mines(&mut self) -> Result<Update> {
        if self.first_click {
            return Err(GameError::NotStarted);
        }
        if !self.state.is_active() || self.exterminator_used {
            return Ok(self.no_change());
        }
        self.exterminator_used = true;

        let candidates = self
            .board
            .find(|cell| cell.is_mine && !cell.is_shown && !cell.is_marked);
        let quota = usize::from(self.level.extermination_quota());
        let removed: Vec<Coord2> = candidates
            .choose_multiple(&mut self.rng, quota)
            .copied()
            .collect();

        for &pos in &removed {
            self.board[pos].is_mine = false;
            self.overlay.flashes.remove(&pos);
        }
        let removed_count = CellCount::try_from(removed.len()).unwrap_or(CellCount::MAX);
        self.round.mines_remaining = self.round.mines_remaining.saturating_sub(removed_count);
        self.board.recount();
        // removed mines stay removed whatever gets undone later
        self.history.forget_mines(&removed);
        log::debug!("exterminated mines at {:?}", removed);

        let mut touched = Touched::default();
        touched.extend(self.board.iter_coords());
        Ok(self.finish(
            Outcome::Changed,
            touched,
            &[Notice::MinesExterminated(removed_count)],
        ))
    }

    /// Moves virtual time forward: ticks the round clock and runs due effects.
    pub fn advance(&mut self, elapsed: Duration) -> Update {
        let ticks = self.timer.advance(elapsed);
        self.round.elapsed_secs = self.timer.elapsed_secs();

        let mut touched = Touched::default();
        let mut notices = SmallVec::<[Notice; 2]>::new();
        for fired in self.scheduler.advance(elapsed) {
            if fired.generation != self.generation {
                log::trace!("dropping stale {:?}", fired.task);
                continue;
            }
            log::trace!("running {:?}", fired.task);
            match fired.task {
                Task::HideFlash(pos) => {
                    Overlay::release(&mut self.overlay.flashes, pos);
                    touched.add(pos);
                }
                Task::EndPeek(kind, area) => {
                    for pos in area.iter() {
                        Overlay::release(&mut self.overlay.peeks, pos);
                    }
                    touched.extend(area.iter());
                    notices.push(Notice::PreviewEnded(kind));
                }
                Task::HidePlacedMines => {
                    self.overlay.show_placed = false;
                    touched.extend(self.board.find(|cell| cell.is_mine));
                    notices.push(Notice::PlacedMinesHidden);
                }
                Task::ClearSafe(pos) => {
                    self.safe_tasks.remove(&pos);
                    self.board[pos].is_safe = false;
                    touched.add(pos);
                }
            }
        }

        let outcome = if ticks > 0 || !touched.order.is_empty() || !notices.is_empty() {
            Outcome::Changed
        } else {
            Outcome::NoChange
        };
        self.finish(outcome, touched, &notices)
    }

    fn no_change(&self) -> Update {
        self.finish(Outcome::NoChange, Touched::default(), &[])
    }

    fn finish(
        &self,
        outcome: Outcome,
        touched: Touched,
        notices: &[Notice],
    ) -> Update {
        Update {
            outcome,
            changes: touched
                .order
                .into_iter()
                .map(|coords| CellChange {
                    coords,
                    view: self.view(coords),
                })
                .collect(),
            notices: notices.iter().copied().collect(),
            summary: self.summary(),
        }
    }
}

impl<S: ScoreStore> fmt::Debug for GameEngine<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameEngine")
            .field("level", &self.level)
            .field("state", &self.state)
            .field("armed", &self.armed)
            .field("round", &self.round)
            .field("history", &self.history.len())
            .finish_non_exhaustive()
    }
}
