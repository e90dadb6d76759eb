// Domain errors for the ladder service.

use thiserror::Error;

use crate::sets::SetsError;

/// Everything that can go wrong between a request and a saved ladder.
/// Display strings are user-facing: the 400 responses surface them as-is.
#[derive(Debug, Error)]
pub enum LadderError {
    #[error("Player not found: {0}")]
    PlayerNotFound(String),

    #[error("Player already registered: {0}")]
    DuplicatePlayer(String),

    #[error("Email already registered: {0}")]
    DuplicateEmail(String),

    #[error("A match needs two different players")]
    SamePlayer,

    #[error("Winner {0} is not one of the two players")]
    WinnerNotPlaying(String),

    #[error("Rank difference {distance} is outside the challenge window of {window}")]
    OutOfReach { distance: i64, window: i64 },

    #[error("Invalid set scores: {0}")]
    InvalidSets(#[from] SetsError),

    #[error("Corrupt ladder state: {0}")]
    Integrity(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl LadderError {
    /// Low-cardinality label for the rejection counters.
    pub fn reason(&self) -> &'static str {
        match self {
            LadderError::PlayerNotFound(_) => "player_not_found",
            LadderError::DuplicatePlayer(_) => "duplicate_player",
            LadderError::DuplicateEmail(_) => "duplicate_email",
            LadderError::SamePlayer => "same_player",
            LadderError::WinnerNotPlaying(_) => "winner_not_playing",
            LadderError::OutOfReach { .. } => "out_of_reach",
            LadderError::InvalidSets(_) => "invalid_sets",
            LadderError::Integrity(_) => "integrity",
            LadderError::Database(_) => "database",
        }
    }
}
