//! In-memory tournament storage.
//!
//! Each tournament owns an arena holding its players, courts, matches and
//! snapshots, so every multi-row write only touches one arena under one lock.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};
use tokio::sync::Mutex;

use super::repository::TournamentRepository;
use crate::rounds::RoundPlan;
use crate::tournament::{
    Court, Match, MatchDetails, MatchId, MatchPlayer, MatchResultUpdate, NewTournament, Player,
    PlayerId, RankingSnapshot, Team, Tournament, TournamentError, TournamentId, TournamentResult,
    TournamentStatus,
};

struct StoredMatch {
    game: Match,
    seats: Vec<(PlayerId, Team)>,
}

struct TournamentArena {
    tournament: Tournament,
    players: Vec<Player>,
    courts: Vec<Court>,
    matches: Vec<StoredMatch>,
    snapshots: Vec<RankingSnapshot>,
}

impl TournamentArena {
    fn details(&self, stored: &StoredMatch) -> TournamentResult<MatchDetails> {
        let court = self
            .courts
            .iter()
            .find(|c| c.id == stored.game.court_id)
            .cloned()
            .ok_or(TournamentError::MatchNotFound(stored.game.id))?;

        let players = stored
            .seats
            .iter()
            .filter_map(|(player_id, team)| {
                self.players.iter().find(|p| p.id == *player_id).map(|p| MatchPlayer {
                    match_id: stored.game.id,
                    player_id: p.id,
                    name: p.name.clone(),
                    team: *team,
                })
            })
            .collect();

        Ok(MatchDetails {
            game: stored.game.clone(),
            court,
            players,
        })
    }

    fn max_round(&self) -> Option<u32> {
        self.matches.iter().map(|m| m.game.round_number).max()
    }
}

#[derive(Default)]
struct Store {
    next_id: i64,
    arenas: BTreeMap<TournamentId, TournamentArena>,
    match_owner: HashMap<MatchId, TournamentId>,
    last_write: Option<DateTime<Utc>>,
}

impl Store {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    /// Strictly increasing write timestamps, so every write yields a new token
    fn write_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let stamp = match self.last_write {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_write = Some(stamp);
        stamp
    }

    fn arena(&self, tournament_id: TournamentId) -> TournamentResult<&TournamentArena> {
        self.arenas
            .get(&tournament_id)
            .ok_or(TournamentError::NotFound(tournament_id))
    }

    fn arena_mut(&mut self, tournament_id: TournamentId) -> TournamentResult<&mut TournamentArena> {
        self.arenas
            .get_mut(&tournament_id)
            .ok_or(TournamentError::NotFound(tournament_id))
    }
}

/// Tournament repository kept entirely in memory
#[derive(Default)]
pub struct MemoryTournamentRepository {
    store: Mutex<Store>,
}

impl MemoryTournamentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TournamentRepository for MemoryTournamentRepository {
    async fn create_tournament(&self, new: &NewTournament) -> TournamentResult<TournamentId> {
        new.validate()?;

        let mut store = self.store.lock().await;
        let id = store.next_id();
        let created_at = store.write_timestamp();

        let players = new
            .players
            .iter()
            .map(|name| Player {
                id: store.next_id(),
                tournament_id: id,
                name: name.clone(),
            })
            .collect();

        let courts = new
            .courts
            .iter()
            .map(|court| Court {
                id: store.next_id(),
                tournament_id: id,
                name: court.name.clone(),
                number: court.number,
            })
            .collect();

        let tournament = Tournament {
            id,
            title: new.title.clone(),
            format: new.format,
            result_sorting: new.result_sorting,
            team_format: new.team_format,
            final_match: new.final_match,
            points_per_match: new.points_per_match,
            status: TournamentStatus::New,
            number_of_rounds: 0,
            final_round: None,
            created_at,
        };

        store.arenas.insert(
            id,
            TournamentArena {
                tournament,
                players,
                courts,
                matches: Vec::new(),
                snapshots: Vec::new(),
            },
        );

        Ok(id)
    }

    async fn get_tournament(&self, tournament_id: TournamentId) -> TournamentResult<Tournament> {
        let store = self.store.lock().await;
        Ok(store.arena(tournament_id)?.tournament.clone())
    }

    async fn list_tournaments(&self) -> TournamentResult<Vec<Tournament>> {
        let store = self.store.lock().await;
        Ok(store
            .arenas
            .values()
            .rev()
            .map(|arena| arena.tournament.clone())
            .collect())
    }

    async fn list_players(&self, tournament_id: TournamentId) -> TournamentResult<Vec<Player>> {
        let store = self.store.lock().await;
        Ok(store.arena(tournament_id)?.players.clone())
    }

    async fn list_courts(&self, tournament_id: TournamentId) -> TournamentResult<Vec<Court>> {
        let store = self.store.lock().await;
        Ok(store.arena(tournament_id)?.courts.clone())
    }

    async fn max_round_number(&self, tournament_id: TournamentId) -> TournamentResult<Option<u32>> {
        let store = self.store.lock().await;
        Ok(store.arena(tournament_id)?.max_round())
    }

    async fn list_matches(
        &self,
        tournament_id: TournamentId,
        round_number: Option<u32>,
    ) -> TournamentResult<Vec<MatchDetails>> {
        let store = self.store.lock().await;
        let arena = store.arena(tournament_id)?;

        arena
            .matches
            .iter()
            .filter(|m| round_number.is_none_or(|round| m.game.round_number == round))
            .map(|m| arena.details(m))
            .collect()
    }

    async fn get_match(&self, match_id: MatchId) -> TournamentResult<Match> {
        let store = self.store.lock().await;
        let owner = store
            .match_owner
            .get(&match_id)
            .copied()
            .ok_or(TournamentError::MatchNotFound(match_id))?;

        store
            .arena(owner)?
            .matches
            .iter()
            .find(|m| m.game.id == match_id)
            .map(|m| m.game.clone())
            .ok_or(TournamentError::MatchNotFound(match_id))
    }

    async fn commit_round(
        &self,
        tournament_id: TournamentId,
        plan: &RoundPlan,
    ) -> TournamentResult<Vec<MatchId>> {
        let mut store = self.store.lock().await;

        // Validate everything before the first write
        {
            let arena = store.arena(tournament_id)?;
            if arena
                .max_round()
                .is_some_and(|round| round >= plan.round_number)
            {
                return Err(TournamentError::StaleRound(plan.round_number));
            }

            let registered: HashSet<PlayerId> = arena.players.iter().map(|p| p.id).collect();
            for planned in &plan.matches {
                if !arena.courts.iter().any(|c| c.id == planned.court_id) {
                    return Err(TournamentError::NoCourts);
                }
                let mut seated = HashSet::new();
                for player_id in planned.players() {
                    if !registered.contains(&player_id) || !seated.insert(player_id) {
                        return Err(TournamentError::DuplicateMatchPlayer);
                    }
                }
            }
        }

        let updated_at = store.write_timestamp();
        let mut created = Vec::with_capacity(plan.matches.len());
        let mut stored = Vec::with_capacity(plan.matches.len());

        for planned in &plan.matches {
            let id = store.next_id();
            let seats = planned
                .team_1
                .iter()
                .map(|p| (*p, Team::Team1))
                .chain(planned.team_2.iter().map(|p| (*p, Team::Team2)))
                .collect();

            stored.push(StoredMatch {
                game: Match {
                    id,
                    tournament_id,
                    round_number: plan.round_number,
                    court_id: planned.court_id,
                    team_1_score: None,
                    team_2_score: None,
                    played: false,
                    updated_at,
                },
                seats,
            });
            created.push(id);
        }

        for id in &created {
            store.match_owner.insert(*id, tournament_id);
        }

        let arena = store.arena_mut(tournament_id)?;
        arena.matches.extend(stored);
        arena.tournament.status = plan.status;
        arena.tournament.number_of_rounds = plan.number_of_rounds;
        arena.tournament.final_round = plan.final_round;

        Ok(created)
    }

    async fn apply_results(
        &self,
        tournament_id: TournamentId,
        updates: &[MatchResultUpdate],
    ) -> TournamentResult<()> {
        let mut store = self.store.lock().await;

        let mut conflicts = Vec::new();
        {
            let arena = store.arena(tournament_id)?;
            for update in updates {
                let stored = arena
                    .matches
                    .iter()
                    .find(|m| m.game.id == update.match_id)
                    .ok_or(TournamentError::MatchNotFound(update.match_id))?;
                if stored.game.is_stale(update.expected_updated_at) {
                    conflicts.push(update.match_id);
                }
            }
        }

        if !conflicts.is_empty() {
            return Err(TournamentError::Conflict {
                match_ids: conflicts,
            });
        }

        let updated_at = store.write_timestamp();
        let arena = store.arena_mut(tournament_id)?;
        for update in updates {
            if let Some(stored) = arena.matches.iter_mut().find(|m| m.game.id == update.match_id) {
                stored.game.team_1_score = update.team_1_score;
                stored.game.team_2_score = update.team_2_score;
                stored.game.played = update.played;
                stored.game.updated_at = updated_at;
            }
        }

        Ok(())
    }

    async fn list_snapshots(
        &self,
        tournament_id: TournamentId,
    ) -> TournamentResult<Vec<RankingSnapshot>> {
        let store = self.store.lock().await;
        Ok(store.arena(tournament_id)?.snapshots.clone())
    }

    async fn replace_snapshots(
        &self,
        tournament_id: TournamentId,
        round_number: u32,
        snapshots: &[RankingSnapshot],
    ) -> TournamentResult<()> {
        let mut store = self.store.lock().await;
        let arena = store.arena_mut(tournament_id)?;

        arena.snapshots.retain(|s| s.round_number != round_number);
        arena.snapshots.extend(snapshots.iter().cloned());

        Ok(())
    }

    async fn update_status(
        &self,
        tournament_id: TournamentId,
        status: TournamentStatus,
    ) -> TournamentResult<()> {
        let mut store = self.store.lock().await;
        let tournament = &mut store.arena_mut(tournament_id)?.tournament;

        if !tournament.status.can_transition_to(status) {
            return Err(TournamentError::InvalidTransition {
                from: tournament.status,
                to: status,
            });
        }

        tournament.status = status;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rounds::PlannedMatch;
    use crate::tournament::TournamentFormat;

    fn eight_players() -> NewTournament {
        NewTournament::new(TournamentFormat::Americano, 21)
            .with_players((1..=8).map(|i| format!("Gracz{i}")))
            .with_court("Kort A", 1)
            .with_court("Kort B", 2)
    }

    async fn seeded_round(repo: &MemoryTournamentRepository) -> (TournamentId, Vec<MatchId>) {
        let id = repo.create_tournament(&eight_players()).await.unwrap();
        let players = repo.list_players(id).await.unwrap();
        let courts = repo.list_courts(id).await.unwrap();
        let ids: Vec<PlayerId> = players.iter().map(|p| p.id).collect();

        let plan = RoundPlan {
            round_number: 1,
            matches: vec![
                PlannedMatch {
                    court_id: courts[0].id,
                    team_1: [ids[0], ids[1]],
                    team_2: [ids[2], ids[3]],
                },
                PlannedMatch {
                    court_id: courts[1].id,
                    team_1: [ids[4], ids[5]],
                    team_2: [ids[6], ids[7]],
                },
            ],
            status: TournamentStatus::InProgress,
            number_of_rounds: 1,
            final_round: None,
        };

        let matches = repo.commit_round(id, &plan).await.unwrap();
        (id, matches)
    }

    #[tokio::test]
    async fn test_create_keeps_stored_order() {
        let repo = MemoryTournamentRepository::new();
        let id = repo.create_tournament(&eight_players()).await.unwrap();

        let players = repo.list_players(id).await.unwrap();
        assert_eq!(players.len(), 8);
        assert_eq!(players[0].name, "Gracz1");
        assert_eq!(players[7].name, "Gracz8");

        let courts = repo.list_courts(id).await.unwrap();
        assert_eq!(courts[0].number, 1);
        assert_eq!(courts[1].name, "Kort B");

        let tournament = repo.get_tournament(id).await.unwrap();
        assert_eq!(tournament.status, TournamentStatus::New);
        assert_eq!(tournament.number_of_rounds, 0);
    }

    #[tokio::test]
    async fn test_duplicate_names_store_nothing() {
        let repo = MemoryTournamentRepository::new();
        let result = repo
            .create_tournament(&eight_players().with_players(["Gracz1"]))
            .await;

        assert!(matches!(result, Err(TournamentError::DuplicatePlayerName(_))));
        assert!(repo.list_tournaments().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_tournament() {
        let repo = MemoryTournamentRepository::new();
        assert!(matches!(
            repo.get_tournament(99).await,
            Err(TournamentError::NotFound(99))
        ));
    }

    #[tokio::test]
    async fn test_commit_round_stores_matches_and_counters() {
        let repo = MemoryTournamentRepository::new();
        let (id, matches) = seeded_round(&repo).await;

        assert_eq!(matches.len(), 2);
        assert_eq!(repo.max_round_number(id).await.unwrap(), Some(1));

        let details = repo.list_matches(id, Some(1)).await.unwrap();
        assert_eq!(details.len(), 2);
        assert_eq!(details[0].team(Team::Team1).count(), 2);
        assert_eq!(details[0].team(Team::Team2).count(), 2);
        assert!(!details[0].game.played);

        let tournament = repo.get_tournament(id).await.unwrap();
        assert_eq!(tournament.status, TournamentStatus::InProgress);
        assert_eq!(tournament.number_of_rounds, 1);
    }

    #[tokio::test]
    async fn test_commit_round_rejects_reused_round_number() {
        let repo = MemoryTournamentRepository::new();
        let (id, _) = seeded_round(&repo).await;

        let plan = RoundPlan {
            round_number: 1,
            matches: Vec::new(),
            status: TournamentStatus::InProgress,
            number_of_rounds: 1,
            final_round: None,
        };
        assert!(matches!(
            repo.commit_round(id, &plan).await,
            Err(TournamentError::StaleRound(1))
        ));
    }

    #[tokio::test]
    async fn test_commit_round_rejects_duplicate_seat() {
        let repo = MemoryTournamentRepository::new();
        let id = repo.create_tournament(&eight_players()).await.unwrap();
        let players = repo.list_players(id).await.unwrap();
        let courts = repo.list_courts(id).await.unwrap();

        let plan = RoundPlan {
            round_number: 1,
            matches: vec![PlannedMatch {
                court_id: courts[0].id,
                team_1: [players[0].id, players[0].id],
                team_2: [players[1].id, players[2].id],
            }],
            status: TournamentStatus::InProgress,
            number_of_rounds: 1,
            final_round: None,
        };

        assert!(matches!(
            repo.commit_round(id, &plan).await,
            Err(TournamentError::DuplicateMatchPlayer)
        ));
        assert!(repo.list_matches(id, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_apply_results_checks_tokens() {
        let repo = MemoryTournamentRepository::new();
        let (id, matches) = seeded_round(&repo).await;
        let original = repo.get_match(matches[0]).await.unwrap();

        repo.apply_results(
            id,
            &[MatchResultUpdate::played(matches[0], 21, 10).expecting(original.updated_at)],
        )
        .await
        .unwrap();

        let updated = repo.get_match(matches[0]).await.unwrap();
        assert!(updated.played);
        assert_eq!(updated.team_1_score, Some(21));
        assert!(updated.updated_at > original.updated_at);

        // Reusing the old token is a conflict and writes nothing
        let stale = repo
            .apply_results(
                id,
                &[MatchResultUpdate::played(matches[0], 0, 21).expecting(original.updated_at)],
            )
            .await;
        match stale {
            Err(TournamentError::Conflict { match_ids }) => assert_eq!(match_ids, vec![matches[0]]),
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(repo.get_match(matches[0]).await.unwrap().team_1_score, Some(21));
    }

    #[tokio::test]
    async fn test_replace_snapshots_is_per_round() {
        let repo = MemoryTournamentRepository::new();
        let (id, _) = seeded_round(&repo).await;
        let players = repo.list_players(id).await.unwrap();

        let snap = |round: u32, points: u32| RankingSnapshot {
            tournament_id: id,
            player_id: players[0].id,
            player_name: players[0].name.clone(),
            round_number: round,
            points,
            is_winner: false,
        };

        repo.replace_snapshots(id, 1, &[snap(1, 5)]).await.unwrap();
        repo.replace_snapshots(id, 2, &[snap(2, 7)]).await.unwrap();
        repo.replace_snapshots(id, 1, &[snap(1, 9)]).await.unwrap();

        let mut points: Vec<u32> = repo
            .list_snapshots(id)
            .await
            .unwrap()
            .iter()
            .map(|s| s.points)
            .collect();
        points.sort_unstable();
        assert_eq!(points, vec![7, 9]);
    }

    #[tokio::test]
    async fn test_status_only_moves_forward() {
        let repo = MemoryTournamentRepository::new();
        let id = repo.create_tournament(&eight_players()).await.unwrap();

        repo.update_status(id, TournamentStatus::Finished).await.unwrap();

        assert!(matches!(
            repo.update_status(id, TournamentStatus::InProgress).await,
            Err(TournamentError::InvalidTransition {
                from: TournamentStatus::Finished,
                to: TournamentStatus::InProgress,
            })
        ));
        assert_eq!(
            repo.get_tournament(id).await.unwrap().status,
            TournamentStatus::Finished
        );
    }
}
