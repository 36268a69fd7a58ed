//! Plays rounds against the engine with a small deduction bot.
//!
//! The bot only looks at what a player would see (cell views and the round summary), uses the
//! assists the engine offers when it gets stuck, and guesses otherwise.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use core::time::Duration;
use rand::rngs::SmallRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;

use sweeper_core::*;

#[derive(Copy, Clone, Debug, ValueEnum)]
enum LevelArg {
    Beginner,
    Medium,
    Expert,
}

impl From<LevelArg> for Level {
    fn from(level: LevelArg) -> Self {
        match level {
            LevelArg::Beginner => Level::Beginner,
            LevelArg::Medium => Level::Medium,
            LevelArg::Expert => Level::Expert,
        }
    }
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// What log level to use
    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity,

    /// Difficulty to play on
    #[arg(short, long, value_enum, default_value_t = LevelArg::Beginner)]
    level: LevelArg,

    /// How many rounds to play
    #[arg(short, long, default_value_t = 10)]
    rounds: u32,

    /// Force a seed instead of random
    #[arg(short, long)]
    seed: Option<u64>,

    /// TOML file with engine settings
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Name recorded with won rounds
    #[arg(short, long)]
    name: Option<String>,

    /// Never use safe clicks or the exterminator
    #[arg(long)]
    no_assists: bool,

    /// Print the board at the end of every round
    #[arg(long)]
    show: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Move {
    Reveal(Coord2),
    Mark(Coord2),
}

struct Bot {
    rng: SmallRng,
    assists: bool,
}

impl Bot {
    /// Next move that follows from the visible numbers alone.
    fn deduce(engine: &GameEngine) -> Option<Move> {
        let size = engine.board().size();
        let views = engine.views();
        let view = |(row, col): Coord2| views[usize::from(row) * usize::from(size) + usize::from(col)].view;

        for pos in iter_board(size) {
            let CellView::Revealed(mines_around) = view(pos) else {
                continue;
            };
            let neighbors: Vec<_> = NeighborIter::new(pos, size).collect();
            let flagged = neighbors
                .iter()
                .filter(|&&next| view(next) == CellView::Flagged)
                .count();
            let closed: Vec<_> = neighbors
                .into_iter()
                .filter(|&next| matches!(view(next), CellView::Hidden | CellView::Safe))
                .collect();

            let Some(&first) = closed.first() else {
                continue;
            };
            if flagged == usize::from(mines_around) {
                return Some(Move::Reveal(first));
            }
            if flagged + closed.len() == usize::from(mines_around) {
                return Some(Move::Mark(first));
            }
        }

        // every closed cell left must be a mine
        let closed: Vec<_> = iter_board(size)
            .filter(|&pos| view(pos) == CellView::Hidden)
            .collect();
        let flags_left = engine.round().flags_left();
        if !closed.is_empty() && i32::try_from(closed.len()).is_ok_and(|len| len == flags_left) {
            return Some(Move::Mark(closed[0]));
        }

        None
    }

    fn next_move(&mut self, engine: &mut GameEngine) -> anyhow::Result<Move> {
        if let Some(next) = Self::deduce(engine) {
            return Ok(next);
        }

        if self.assists {
            let round = *engine.round();
            if round.safe_clicks_remaining > 0 {
                let update = engine.request_safe_click()?;
                if let Some(change) = update.changes.first() {
                    log::info!("safe click suggested {:?}", change.coords);
                    return Ok(Move::Reveal(change.coords));
                }
            }
            if !engine.summary().exterminator_used {
                let update = engine.exterminate_mines()?;
                log::info!("exterminator used: {:?}", update.notices);
                if let Some(next) = Self::deduce(engine) {
                    return Ok(next);
                }
            }
        }

        let hidden = engine
            .views()
            .into_iter()
            .filter(|change| change.view == CellView::Hidden)
            .map(|change| change.coords)
            .collect::<Vec<_>>();
        let guess = hidden
            .choose(&mut self.rng)
            .copied()
            .context("no hidden cell left to guess")?;
        log::info!("guessing {:?}", guess);
        Ok(Move::Reveal(guess))
    }

    fn play_round(&mut self, engine: &mut GameEngine) -> anyhow::Result<EngineState> {
        let size = engine.board().size();
        let max_moves = 4 * usize::from(size) * usize::from(size);
        let center = size / 2;
        engine.reveal_cell(center, center)?;

        for _ in 0..max_moves {
            if !engine.state().is_active() {
                break;
            }
            let next = self.next_move(engine)?;
            log::debug!("bot plays {:?}", next);
            match next {
                Move::Reveal((row, col)) => {
                    let update = engine.reveal_cell(row, col)?;
                    if update.outcome == Outcome::LifeLost {
                        // the flash gives the mine away
                        engine.toggle_mark(row, col)?;
                    }
                }
                Move::Mark((row, col)) => {
                    engine.toggle_mark(row, col)?;
                }
            }
            // let flashes and highlights run out, and the clock tick
            engine.advance(Duration::from_millis(1500));
        }

        Ok(engine.state())
    }
}

fn glyph(view: CellView) -> char {
    match view {
        CellView::Hidden => '#',
        CellView::Flagged => 'F',
        CellView::Safe => 's',
        CellView::Revealed(0) => '.',
        CellView::Revealed(n) => char::from(b'0' + n),
        CellView::Mine => '*',
        CellView::Exploded => 'X',
    }
}

fn print_board(engine: &GameEngine) {
    let size = usize::from(engine.board().size());
    for row in engine.views().chunks(size) {
        let line: String = row.iter().map(|change| glyph(change.view)).collect();
        println!("  {line}");
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.verbose.log_level_filter())
        .init();

    let mut settings = match &args.settings {
        Some(path) => {
            let source = std::fs::read_to_string(path)
                .with_context(|| format!("reading settings from {}", path.display()))?;
            EngineSettings::from_toml_str(&source)?
        }
        None => EngineSettings::default(),
    };
    if args.seed.is_some() {
        settings.seed = args.seed;
    }
    let bot_seed = settings.seed.unwrap_or_else(|| rand::rng().random());

    let level = Level::from(args.level);
    let mut engine = GameEngine::with_settings(level.config(), settings)?;
    engine.set_player_name(args.name.clone());
    let mut bot = Bot {
        rng: SmallRng::seed_from_u64(bot_seed),
        assists: !args.no_assists,
    };

    let mut wins = 0;
    for round in 1..=args.rounds {
        if round > 1 {
            engine.restart();
        }
        let state = bot.play_round(&mut engine)?;
        let summary = engine.summary();
        if state == EngineState::Won {
            wins += 1;
        }
        println!(
            "round {round}: {state:?} in {}s, {} lives left, {} hints unused",
            summary.round.elapsed_secs, summary.round.lives_remaining, summary.round.hints_remaining,
        );
        if args.show {
            print_board(&engine);
        }
    }

    println!("{} won {wins} of {} rounds", level.name(), args.rounds);
    for (rank, entry) in engine.scores().best(5).into_iter().enumerate() {
        println!(
            "{:>2}. {} {}s at {}",
            rank + 1,
            entry.name,
            entry.elapsed_secs,
            entry.timestamp.format("%Y-%m-%d %H:%M:%S")
        );
    }
    log::debug!("scores: {}", engine.scores().to_json()?);

    Ok(())
}
