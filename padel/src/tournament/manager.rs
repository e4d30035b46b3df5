//! Tournament manager: the invocation surface over storage and the round engine.

use super::errors::{TournamentError, TournamentResult};
use super::models::{
    Court, Match, MatchDetails, MatchResultUpdate, NewTournament, Player, RankingSnapshot,
    Tournament, TournamentFormat, TournamentId, TournamentStatus,
};
use crate::db::TournamentRepository;
use crate::ranking::{self, PlayerStanding};
use crate::rounds::{self, RoundContext, Shuffler};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Tournament manager
///
/// Writes to one tournament are serialized through a per-tournament lock;
/// different tournaments proceed independently.
#[derive(Clone)]
pub struct TournamentManager {
    repo: Arc<dyn TournamentRepository>,
    shuffler: Arc<Mutex<Shuffler>>,
    locks: Arc<Mutex<HashMap<TournamentId, Arc<Mutex<()>>>>>,
}

impl TournamentManager {
    /// Create a manager drawing rounds from OS entropy
    pub fn new(repo: Arc<dyn TournamentRepository>) -> Self {
        Self::with_shuffler(repo, Shuffler::new())
    }

    /// Create a manager with an explicit random source
    pub fn with_shuffler(repo: Arc<dyn TournamentRepository>, shuffler: Shuffler) -> Self {
        Self {
            repo,
            shuffler: Arc::new(Mutex::new(shuffler)),
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    // Entries exist only for stored tournaments
    async fn lock_tournament(
        &self,
        tournament_id: TournamentId,
    ) -> TournamentResult<OwnedMutexGuard<()>> {
        let existing = self.locks.lock().await.get(&tournament_id).cloned();
        let lock = match existing {
            Some(lock) => lock,
            None => {
                self.repo.get_tournament(tournament_id).await?;
                self.locks
                    .lock()
                    .await
                    .entry(tournament_id)
                    .or_insert_with(|| Arc::new(Mutex::new(())))
                    .clone()
            }
        };
        Ok(lock.lock_owned().await)
    }

    /// Create a tournament with its players and courts
    ///
    /// # Arguments
    ///
    /// * `new` - Title, format, scoring settings, player names and courts
    ///
    /// # Returns
    ///
    /// * `TournamentResult<TournamentId>` - Id of the stored tournament
    ///
    /// # Errors
    ///
    /// Returns an error if the definition is invalid or a name or court
    /// number is repeated; nothing is stored in that case.
    pub async fn create_tournament(&self, new: NewTournament) -> TournamentResult<TournamentId> {
        new.validate()?;

        let tournament_id = self.repo.create_tournament(&new).await?;

        log::info!(
            "Created {} tournament {} '{}' with {} players on {} courts",
            new.format,
            tournament_id,
            new.title,
            new.players.len(),
            new.courts.len()
        );

        Ok(tournament_id)
    }

    /// Get a tournament
    pub async fn get_tournament(
        &self,
        tournament_id: TournamentId,
    ) -> TournamentResult<Tournament> {
        self.repo.get_tournament(tournament_id).await
    }

    /// List all tournaments, newest first
    pub async fn list_tournaments(&self) -> TournamentResult<Vec<Tournament>> {
        self.repo.list_tournaments().await
    }

    pub async fn list_players(&self, tournament_id: TournamentId) -> TournamentResult<Vec<Player>> {
        self.repo.list_players(tournament_id).await
    }

    pub async fn list_courts(&self, tournament_id: TournamentId) -> TournamentResult<Vec<Court>> {
        self.repo.list_courts(tournament_id).await
    }

    /// Draw and store the next round, returning its number
    ///
    /// # Arguments
    ///
    /// * `tournament_id` - Tournament to draw for
    /// * `is_final` - Seed the final round from the standings
    ///
    /// # Returns
    ///
    /// * `TournamentResult<u32>` - Number of the new round
    ///
    /// # Errors
    ///
    /// Returns an error if the tournament is finished, the player count is
    /// not a positive multiple of four, or there are not enough courts for
    /// every group of four.
    pub async fn generate_round(
        &self,
        tournament_id: TournamentId,
        is_final: bool,
    ) -> TournamentResult<u32> {
        let _guard = self.lock_tournament(tournament_id).await?;

        let tournament = self.repo.get_tournament(tournament_id).await?;
        if tournament.status == TournamentStatus::Finished {
            return Err(TournamentError::AlreadyFinished);
        }

        let players = self.repo.list_players(tournament_id).await?;
        let groups = rounds::groups_needed(players.len())
            .ok_or(TournamentError::InvalidPlayerCount(players.len()))?;

        let courts = self.repo.list_courts(tournament_id).await?;
        if courts.is_empty() {
            return Err(TournamentError::NoCourts);
        }
        if courts.len() < groups {
            return Err(TournamentError::InsufficientCourts {
                needed: groups,
                available: courts.len(),
            });
        }

        let max_round = self.repo.max_round_number(tournament_id).await?;

        let seeded = is_final
            || (tournament.format == TournamentFormat::Mexicano
                && tournament.status != TournamentStatus::New);
        let order = if seeded {
            let snapshots = self.repo.list_snapshots(tournament_id).await?;
            ranking::ranking_order(&ranking::aggregate(
                &snapshots,
                tournament.points_per_match,
            ))
        } else {
            Vec::new()
        };

        let ctx = RoundContext {
            tournament: &tournament,
            players: &players,
            courts: &courts,
            max_round,
            ranking: &order,
        };

        let plan = {
            let mut shuffler = self.shuffler.lock().await;
            rounds::generate_round(&ctx, is_final, &mut shuffler)
        };

        let Some(plan) = plan else {
            log::warn!("Tournament {tournament_id}: round generation produced no matches");
            return Err(TournamentError::InvalidPlayerCount(players.len()));
        };

        self.repo.commit_round(tournament_id, &plan).await?;

        log::info!(
            "Tournament {}: generated {}round {} with {} matches",
            tournament_id,
            if is_final { "final " } else { "" },
            plan.round_number,
            plan.matches.len()
        );

        Ok(plan.round_number)
    }

    /// Record the result of one match and refresh that round's snapshots
    ///
    /// # Arguments
    ///
    /// * `update` - Scores, played flag and the `updated_at` the caller last saw
    ///
    /// # Returns
    ///
    /// * `TournamentResult<Match>` - The stored match, carrying the new token
    pub async fn submit_match_result(&self, update: MatchResultUpdate) -> TournamentResult<Match> {
        update.validate()?;

        let game = self.repo.get_match(update.match_id).await?;
        let _guard = self.lock_tournament(game.tournament_id).await?;

        self.write_results(game.tournament_id, &[update]).await?;
        self.rebuild_round(game.tournament_id, game.round_number).await?;

        self.repo.get_match(game.id).await
    }

    /// Record results for every listed match of a round in one unit
    ///
    /// Every entry must be played with both scores, and every match must
    /// belong to the given round.
    ///
    /// # Arguments
    ///
    /// * `tournament_id` - Tournament the round belongs to
    /// * `round_number` - Round every update must target
    /// * `updates` - One result per match
    ///
    /// # Returns
    ///
    /// * `TournamentResult<Vec<MatchDetails>>` - The round's matches after the write
    ///
    /// # Errors
    ///
    /// Returns `Conflict` with the stale match ids if any token is outdated;
    /// no result of the batch is written then.
    pub async fn submit_round_results(
        &self,
        tournament_id: TournamentId,
        round_number: u32,
        updates: Vec<MatchResultUpdate>,
    ) -> TournamentResult<Vec<MatchDetails>> {
        if updates.is_empty() {
            return Err(TournamentError::EmptyResults);
        }

        for update in &updates {
            if !update.played {
                return Err(TournamentError::ResultNotPlayed(update.match_id));
            }
            update.validate()?;
        }

        let _guard = self.lock_tournament(tournament_id).await?;

        let round_ids: HashSet<_> = self
            .repo
            .list_matches(tournament_id, Some(round_number))
            .await?
            .iter()
            .map(|m| m.game.id)
            .collect();

        let outside: Vec<_> = updates
            .iter()
            .map(|u| u.match_id)
            .filter(|id| !round_ids.contains(id))
            .collect();
        if !outside.is_empty() {
            return Err(TournamentError::MatchesOutsideRound {
                round: round_number,
                match_ids: outside,
            });
        }

        self.write_results(tournament_id, &updates).await?;
        self.rebuild_round(tournament_id, round_number).await?;

        self.repo.list_matches(tournament_id, Some(round_number)).await
    }

    async fn write_results(
        &self,
        tournament_id: TournamentId,
        updates: &[MatchResultUpdate],
    ) -> TournamentResult<()> {
        if let Err(e) = self.repo.apply_results(tournament_id, updates).await {
            if e.is_conflict() {
                log::warn!("Tournament {tournament_id}: rejected stale result submission: {e}");
            }
            return Err(e);
        }
        Ok(())
    }

    /// Matches of the latest round, empty before the first round
    pub async fn current_round_matches(
        &self,
        tournament_id: TournamentId,
    ) -> TournamentResult<Vec<MatchDetails>> {
        match self.repo.max_round_number(tournament_id).await? {
            Some(round) => self.repo.list_matches(tournament_id, Some(round)).await,
            None => Ok(Vec::new()),
        }
    }

    pub async fn round_matches(
        &self,
        tournament_id: TournamentId,
        round_number: u32,
    ) -> TournamentResult<Vec<MatchDetails>> {
        self.repo.list_matches(tournament_id, Some(round_number)).await
    }

    pub async fn all_matches(
        &self,
        tournament_id: TournamentId,
    ) -> TournamentResult<Vec<MatchDetails>> {
        self.repo.list_matches(tournament_id, None).await
    }

    /// Full standings, best first
    pub async fn ranking(
        &self,
        tournament_id: TournamentId,
    ) -> TournamentResult<Vec<PlayerStanding>> {
        let tournament = self.repo.get_tournament(tournament_id).await?;
        let snapshots = self.repo.list_snapshots(tournament_id).await?;
        Ok(ranking::aggregate(&snapshots, tournament.points_per_match))
    }

    /// Recompute the snapshots of one round from its played matches
    ///
    /// # Arguments
    ///
    /// * `tournament_id` - Tournament to rebuild
    /// * `round_number` - Round whose snapshots are replaced
    ///
    /// # Returns
    ///
    /// * `TournamentResult<Vec<RankingSnapshot>>` - The snapshots now stored
    pub async fn rebuild_snapshots(
        &self,
        tournament_id: TournamentId,
        round_number: u32,
    ) -> TournamentResult<Vec<RankingSnapshot>> {
        let _guard = self.lock_tournament(tournament_id).await?;
        self.rebuild_round(tournament_id, round_number).await
    }

    async fn rebuild_round(
        &self,
        tournament_id: TournamentId,
        round_number: u32,
    ) -> TournamentResult<Vec<RankingSnapshot>> {
        let matches = self
            .repo
            .list_matches(tournament_id, Some(round_number))
            .await?;
        let snapshots = ranking::build_round_snapshots(tournament_id, round_number, &matches);

        self.repo
            .replace_snapshots(tournament_id, round_number, &snapshots)
            .await?;

        log::debug!(
            "Tournament {}: rebuilt {} snapshots for round {}",
            tournament_id,
            snapshots.len(),
            round_number
        );

        Ok(snapshots)
    }

    /// Close a tournament; no further rounds can be drawn
    pub async fn finish_tournament(&self, tournament_id: TournamentId) -> TournamentResult<()> {
        let _guard = self.lock_tournament(tournament_id).await?;

        let tournament = self.repo.get_tournament(tournament_id).await?;
        if !tournament.status.can_transition_to(TournamentStatus::Finished) {
            return Err(TournamentError::AlreadyFinished);
        }

        self.repo
            .update_status(tournament_id, TournamentStatus::Finished)
            .await?;

        log::info!(
            "Tournament {} finished after {} rounds",
            tournament_id,
            tournament.number_of_rounds
        );

        Ok(())
    }
}
