//! Error types for the league simulation engine

use crate::models::{PlayerId, Position, TeamId};
use thiserror::Error;

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, SimError>;

/// Errors that can occur while preparing or running a simulation batch.
///
/// Every variant is raised before the first run starts. Degenerate states
/// inside a run (unsold players, short lineups, flat distributions) are
/// absorbed by fallback policies and only show up in [`crate::SimMetrics`].
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Budget of ${budget} cannot cover {required} roster slots at the minimum bid")]
    BudgetTooSmall { budget: u32, required: u32 },

    #[error("Not enough {position} players: {required} required, {available} available")]
    InsufficientPlayers { position: Position, required: usize, available: usize },

    #[error("Player pool too small: {required} roster slots, {available} draftable players")]
    InsufficientPool { required: usize, available: usize },

    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("Invalid playoff bracket: {0}")]
    InvalidBracket(String),

    #[error("Unknown team {0}")]
    UnknownTeam(TeamId),

    #[error("Unknown player {0}")]
    UnknownPlayer(PlayerId),

    #[error("Invalid snapshot: {0}")]
    Snapshot(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
