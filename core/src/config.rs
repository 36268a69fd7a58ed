use core::time::Duration;
use serde::{Deserialize, Serialize};

use crate::*;

/// Board side, mine count and lives for one round.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelConfig {
    pub size: Coord,
    pub mines: CellCount,
    pub lives: u8,
}

impl LevelConfig {
    pub const fn new_unchecked(size: Coord, mines: CellCount, lives: u8) -> Self {
        Self { size, mines, lives }
    }

    pub fn new(size: Coord, mines: CellCount, lives: u8) -> Result<Self> {
        Self::new_unchecked(size, mines, lives).validate()
    }

    pub fn validate(self) -> Result<Self> {
        if self.size == 0 {
            return Err(GameError::InvalidConfig);
        }
        if self.mines >= self.total_cells() {
            return Err(GameError::TooManyMines {
                mines: self.mines.into(),
                cells: self.total_cells().into(),
            });
        }
        Ok(self)
    }

    pub const fn total_cells(&self) -> CellCount {
        square(self.size)
    }

    /// How many mines the exterminator removes on this level.
    pub const fn extermination_quota(&self) -> CellCount {
        if self.mines <= Level::Beginner.config().mines {
            1
        } else {
            3
        }
    }
}

impl Default for LevelConfig {
    fn default() -> Self {
        Level::default().config()
    }
}

impl From<Level> for LevelConfig {
    fn from(level: Level) -> Self {
        level.config()
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Level {
    #[default]
    Beginner,
    Medium,
    Expert,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::Beginner, Level::Medium, Level::Expert];

    pub const fn config(self) -> LevelConfig {
        match self {
            Self::Beginner => LevelConfig::new_unchecked(4, 2, 1),
            Self::Medium => LevelConfig::new_unchecked(8, 14, 3),
            Self::Expert => LevelConfig::new_unchecked(12, 32, 3),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Beginner => "Beginner",
            Self::Medium => "Medium",
            Self::Expert => "Expert",
        }
    }

    /// Out of range indices fall back to the first level.
    pub fn from_index(index: usize) -> Self {
        Self::ALL.get(index).copied().unwrap_or_default()
    }
}

/// Delays of the transient effects, in milliseconds.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    pub mine_flash_ms: u64,
    pub hint_preview_ms: u64,
    pub mega_hint_preview_ms: u64,
    pub placement_display_ms: u64,
    pub safe_highlight_ms: u64,
}

impl Timings {
    pub const fn delay_for(&self, task: Task) -> Duration {
        let ms = match task {
            Task::HideFlash(_) => self.mine_flash_ms,
            Task::EndPeek(PeekKind::Hint, _) => self.hint_preview_ms,
            Task::EndPeek(PeekKind::MegaHint, _) => self.mega_hint_preview_ms,
            Task::HidePlacedMines => self.placement_display_ms,
            Task::ClearSafe(_) => self.safe_highlight_ms,
        };
        Duration::from_millis(ms)
    }
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            mine_flash_ms: 1000,
            hint_preview_ms: 1000,
            mega_hint_preview_ms: 1500,
            placement_display_ms: 1500,
            safe_highlight_ms: 1500,
        }
    }
}

/// Tunables that stay fixed across rounds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub hints: u8,
    pub safe_clicks: u8,
    /// Fixed RNG seed, random when absent.
    pub seed: Option<u64>,
    pub timings: Timings,
}

impl EngineSettings {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let settings: Self = toml::from_str(source)?;
        log::debug!("loaded engine settings: {:?}", settings);
        Ok(settings)
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            hints: 3,
            safe_clicks: 3,
            seed: None,
            timings: Timings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_match_the_closed_set() {
        assert_eq!(Level::Beginner.config(), LevelConfig::new_unchecked(4, 2, 1));
        assert_eq!(Level::Medium.config(), LevelConfig::new_unchecked(8, 14, 3));
        assert_eq!(Level::Expert.config(), LevelConfig::new_unchecked(12, 32, 3));
        assert_eq!(Level::from_index(7), Level::Beginner);
        for level in Level::ALL {
            assert!(level.config().validate().is_ok(), "{}", level.name());
        }
    }

    #[test]
    fn rejects_full_boards() {
        assert_eq!(
            LevelConfig::new(3, 9, 1),
            Err(GameError::TooManyMines { mines: 9, cells: 9 })
        );
        assert_eq!(LevelConfig::new(0, 0, 1), Err(GameError::InvalidConfig));
        assert!(LevelConfig::new(3, 8, 0).is_ok());
    }

    #[test]
    fn extermination_quota_depends_on_tier() {
        assert_eq!(Level::Beginner.config().extermination_quota(), 1);
        assert_eq!(Level::Medium.config().extermination_quota(), 3);
        assert_eq!(Level::Expert.config().extermination_quota(), 3);
    }

    #[test]
    fn settings_fill_missing_fields_with_defaults() {
        let settings = EngineSettings::from_toml_str(
            r#"
            seed = 42
            [timings]
            mine_flash_ms = 250
            "#,
        )
        .unwrap();

        assert_eq!(settings.seed, Some(42));
        assert_eq!(settings.hints, 3);
        assert_eq!(settings.timings.mine_flash_ms, 250);
        assert_eq!(settings.timings.safe_highlight_ms, 1500);
    }

    #[test]
    fn malformed_settings_are_reported() {
        let err = EngineSettings::from_toml_str("hints = \"many\"").unwrap_err();
        assert!(matches!(err, GameError::Settings(_)));
    }
}
