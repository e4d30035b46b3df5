//! Tournament error types.

use super::models::{MatchId, TournamentId, TournamentStatus};
use thiserror::Error;

/// Tournament errors
#[derive(Debug, Error)]
pub enum TournamentError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration error
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Tournament not found: {0}")]
    NotFound(TournamentId),

    #[error("Match not found: {0}")]
    MatchNotFound(MatchId),

    #[error("Invalid tournament title: {0:?}")]
    InvalidTitle(String),

    #[error("Points per match must be between 1 and 50, got {0}")]
    InvalidPointsPerMatch(u32),

    #[error("A tournament needs at least one player")]
    NoPlayers,

    #[error("A tournament needs at least one court")]
    NoCourts,

    #[error("Player names must be unique within a tournament: {0}")]
    DuplicatePlayerName(String),

    #[error("Court names must be unique within a tournament: {0}")]
    DuplicateCourtName(String),

    #[error("Court numbers must be unique within a tournament: {0}")]
    DuplicateCourtNumber(u32),

    #[error("Player already assigned to this match")]
    DuplicateMatchPlayer,

    #[error("Unknown {kind} value: {value}")]
    UnknownValue { kind: &'static str, value: String },

    /// Player count is below four or not a multiple of four
    #[error("Number of players must be a multiple of 4, got {0}")]
    InvalidPlayerCount(usize),

    #[error("Not enough courts: need {needed}, have {available}")]
    InsufficientCourts { needed: usize, available: usize },

    #[error("Tournament is already finished")]
    AlreadyFinished,

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        from: TournamentStatus,
        to: TournamentStatus,
    },

    #[error("Both scores must be provided if match {0} is marked as played")]
    MissingScore(MatchId),

    #[error("Score {score} for match {match_id} is out of range")]
    ScoreOutOfRange { match_id: MatchId, score: u32 },

    #[error("At least one match result must be provided")]
    EmptyResults,

    #[error("All matches must be marked as played (match {0} is not)")]
    ResultNotPlayed(MatchId),

    #[error("Matches {match_ids:?} do not belong to round {round}")]
    MatchesOutsideRound { round: u32, match_ids: Vec<MatchId> },

    #[error("Round {0} was generated concurrently")]
    StaleRound(u32),

    /// Optimistic concurrency check failed
    #[error("Matches {match_ids:?} have been updated in the meantime")]
    Conflict { match_ids: Vec<MatchId> },
}

impl TournamentError {
    /// Get a client-safe error message that doesn't leak internal details
    pub fn client_message(&self) -> String {
        match self {
            TournamentError::Database(_) | TournamentError::Migration(_) => {
                "Internal server error".to_string()
            }
            TournamentError::NotFound(_) => "Tournament not found".to_string(),
            TournamentError::MatchNotFound(_) => "Match not found".to_string(),
            _ => self.to_string(),
        }
    }

    /// True for stale result submissions
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            TournamentError::Conflict { .. } | TournamentError::StaleRound(_)
        )
    }
}

/// Result type for tournament operations
pub type TournamentResult<T> = Result<T, TournamentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_hides_ids() {
        assert_eq!(
            TournamentError::NotFound(42).client_message(),
            "Tournament not found"
        );
        assert_eq!(
            TournamentError::Database(sqlx::Error::RowNotFound).client_message(),
            "Internal server error"
        );
    }

    #[test]
    fn test_conflict_message_lists_matches() {
        let err = TournamentError::Conflict {
            match_ids: vec![3, 5],
        };
        assert!(err.is_conflict());
        assert!(err.client_message().contains("[3, 5]"));
    }
}
