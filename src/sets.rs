// Set-score parsing: scores arrive as free text like "6-4, 3-6" and are
// validated and re-rendered canonically before a match is stored.

use thiserror::Error;

/// Games won by each side in one set, in player1-player2 order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetScore {
    pub player1: u32,
    pub player2: u32,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SetsError {
    #[error("set scores must not be empty")]
    Empty,
    #[error("malformed set score {0:?}, expected games like 6-4")]
    Malformed(String),
}

/// Parse a comma-separated list of `games-games` pairs.
pub fn parse_sets(input: &str) -> Result<Vec<SetScore>, SetsError> {
    if input.trim().is_empty() {
        return Err(SetsError::Empty);
    }
    let mut sets = Vec::new();
    for part in input.split(',') {
        let part = part.trim();
        let Some((left, right)) = part.split_once('-') else {
            return Err(SetsError::Malformed(part.to_string()));
        };
        let player1 = left
            .trim()
            .parse::<u32>()
            .map_err(|_| SetsError::Malformed(part.to_string()))?;
        let player2 = right
            .trim()
            .parse::<u32>()
            .map_err(|_| SetsError::Malformed(part.to_string()))?;
        sets.push(SetScore { player1, player2 });
    }
    Ok(sets)
}

/// Render scores in the canonical `"6-4, 3-6"` form.
pub fn format_sets(sets: &[SetScore]) -> String {
    sets.iter()
        .map(|s| format!("{}-{}", s.player1, s.player2))
        .collect::<Vec<_>>()
        .join(", ")
}
