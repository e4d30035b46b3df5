//! Storage contract used by the tournament manager.
//!
//! Every write that spans several rows (tournament creation, a whole round,
//! a batch of results, a snapshot rebuild) is a single method so that
//! implementations can make it atomic.

use async_trait::async_trait;

use crate::rounds::RoundPlan;
use crate::tournament::{
    Court, Match, MatchDetails, MatchId, MatchResultUpdate, NewTournament, Player,
    RankingSnapshot, Tournament, TournamentId, TournamentResult, TournamentStatus,
};

/// Trait for tournament repository operations
#[async_trait]
pub trait TournamentRepository: Send + Sync {
    /// Create a tournament with its players and courts in one unit
    ///
    /// Duplicate player names or court names/numbers are rejected and
    /// nothing is stored.
    async fn create_tournament(&self, new: &NewTournament) -> TournamentResult<TournamentId>;

    /// Get a tournament
    async fn get_tournament(&self, tournament_id: TournamentId) -> TournamentResult<Tournament>;

    /// List all tournaments, newest first
    async fn list_tournaments(&self) -> TournamentResult<Vec<Tournament>>;

    /// Players in stored order
    async fn list_players(&self, tournament_id: TournamentId) -> TournamentResult<Vec<Player>>;

    /// Courts in stored order
    async fn list_courts(&self, tournament_id: TournamentId) -> TournamentResult<Vec<Court>>;

    /// Highest round number among the tournament's matches
    async fn max_round_number(&self, tournament_id: TournamentId) -> TournamentResult<Option<u32>>;

    /// Matches with court and players, optionally limited to one round
    async fn list_matches(
        &self,
        tournament_id: TournamentId,
        round_number: Option<u32>,
    ) -> TournamentResult<Vec<MatchDetails>>;

    /// Get a single match
    async fn get_match(&self, match_id: MatchId) -> TournamentResult<Match>;

    /// Store every match and seat of a round and the tournament counters
    ///
    /// Fails with `StaleRound` if a round with the same or a later number was
    /// stored in the meantime.
    async fn commit_round(
        &self,
        tournament_id: TournamentId,
        plan: &RoundPlan,
    ) -> TournamentResult<Vec<MatchId>>;

    /// Write match results after checking every concurrency token
    ///
    /// Nothing is written if any match is missing or stale.
    async fn apply_results(
        &self,
        tournament_id: TournamentId,
        updates: &[MatchResultUpdate],
    ) -> TournamentResult<()>;

    /// All snapshots of a tournament
    async fn list_snapshots(
        &self,
        tournament_id: TournamentId,
    ) -> TournamentResult<Vec<RankingSnapshot>>;

    /// Replace the snapshots of one round (delete then insert, atomically)
    async fn replace_snapshots(
        &self,
        tournament_id: TournamentId,
        round_number: u32,
        snapshots: &[RankingSnapshot],
    ) -> TournamentResult<()>;

    /// Set the tournament status
    ///
    /// Backward moves are rejected with `InvalidTransition`.
    async fn update_status(
        &self,
        tournament_id: TournamentId,
        status: TournamentStatus,
    ) -> TournamentResult<()>;
}
