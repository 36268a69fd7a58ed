use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Start the game first")]
    NotStarted,
    #[error("Invalid coordinates")]
    InvalidCoords,
    #[error("Invalid level: board side must be at least 1")]
    InvalidConfig,
    #[error("Too many mines: {mines} requested but the board only has {cells} cells")]
    TooManyMines { mines: u32, cells: u32 },
    #[error("Could not read engine settings: {0}")]
    Settings(String),
    #[error("Could not (de)serialize scores: {0}")]
    Scores(String),
}

impl GameError {
    /// Errors an adapter should show to the player instead of swallowing.
    pub const fn is_user_facing(&self) -> bool {
        matches!(self, Self::NotStarted)
    }
}

impl From<toml::de::Error> for GameError {
    fn from(err: toml::de::Error) -> Self {
        Self::Settings(err.to_string())
    }
}

impl From<serde_json::Error> for GameError {
    fn from(err: serde_json::Error) -> Self {
        Self::Scores(err.to_string())
    }
}

pub type Result<T> = core::result::Result<T, GameError>;
