//! PostgreSQL implementation of [`TournamentRepository`].

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::{Postgres, Row, Transaction};
use std::collections::HashMap;

use super::repository::TournamentRepository;
use crate::rounds::RoundPlan;
use crate::tournament::{
    Court, FinalMatchPattern, Match, MatchDetails, MatchId, MatchPlayer, MatchResultUpdate,
    NewTournament, Player, RankingSnapshot, Team, Tournament, TournamentError, TournamentId,
    TournamentResult, TournamentStatus,
};

const TOURNAMENT_COLUMNS: &str = "id, title, format, result_sorting, team_format, final_match,
     points_per_match, status, number_of_rounds, final_round, created_at";

const MATCH_COLUMNS: &str =
    "id, tournament_id, round_number, court_id, team_1_score, team_2_score, played, updated_at";

/// Map a unique-constraint violation to the domain error, pass anything else through
fn map_unique_violation(err: sqlx::Error, on_violation: TournamentError) -> TournamentError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => on_violation,
        _ => TournamentError::Database(err),
    }
}

fn tournament_from_row(row: &PgRow) -> TournamentResult<Tournament> {
    let final_code: i16 = row.get("final_match");
    let final_match = u8::try_from(final_code)
        .ok()
        .and_then(FinalMatchPattern::from_code)
        .ok_or_else(|| TournamentError::UnknownValue {
            kind: "FinalMatchPattern",
            value: final_code.to_string(),
        })?;

    Ok(Tournament {
        id: row.get("id"),
        title: row.get("title"),
        format: row.get::<String, _>("format").parse()?,
        result_sorting: row.get::<String, _>("result_sorting").parse()?,
        team_format: row.get::<String, _>("team_format").parse()?,
        final_match,
        points_per_match: row.get::<i32, _>("points_per_match") as u32,
        status: row.get::<String, _>("status").parse()?,
        number_of_rounds: row.get::<i32, _>("number_of_rounds") as u32,
        final_round: row.get::<Option<i32>, _>("final_round").map(|r| r as u32),
        created_at: row.get("created_at"),
    })
}

fn match_from_row(row: &PgRow) -> Match {
    Match {
        id: row.get("id"),
        tournament_id: row.get("tournament_id"),
        round_number: row.get::<i32, _>("round_number") as u32,
        court_id: row.get("court_id"),
        team_1_score: row.get::<Option<i32>, _>("team_1_score").map(|s| s as u32),
        team_2_score: row.get::<Option<i32>, _>("team_2_score").map(|s| s as u32),
        played: row.get("played"),
        updated_at: row.get("updated_at"),
    }
}

fn court_from_row(row: &PgRow) -> Court {
    Court {
        id: row.get("id"),
        tournament_id: row.get("tournament_id"),
        name: row.get("name"),
        number: row.get::<i32, _>("number") as u32,
    }
}

/// PostgreSQL tournament repository
pub struct PgTournamentRepository {
    pool: PgPool,
}

impl PgTournamentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lock the tournament row for the rest of the transaction
    async fn lock_tournament(
        tx: &mut Transaction<'_, Postgres>,
        tournament_id: TournamentId,
    ) -> TournamentResult<()> {
        sqlx::query("SELECT id FROM tournaments WHERE id = $1 FOR UPDATE")
            .bind(tournament_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or(TournamentError::NotFound(tournament_id))?;
        Ok(())
    }

    async fn ensure_tournament(&self, tournament_id: TournamentId) -> TournamentResult<()> {
        sqlx::query("SELECT id FROM tournaments WHERE id = $1")
            .bind(tournament_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(TournamentError::NotFound(tournament_id))?;
        Ok(())
    }
}

#[async_trait]
impl TournamentRepository for PgTournamentRepository {
    async fn create_tournament(&self, new: &NewTournament) -> TournamentResult<TournamentId> {
        new.validate()?;

        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            "INSERT INTO tournaments
                (title, format, result_sorting, team_format, final_match, points_per_match)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id",
        )
        .bind(&new.title)
        .bind(new.format.as_str())
        .bind(new.result_sorting.as_str())
        .bind(new.team_format.as_str())
        .bind(i16::from(new.final_match.code()))
        .bind(new.points_per_match as i32)
        .fetch_one(&mut *tx)
        .await?;

        let tournament_id: TournamentId = row.get("id");

        for name in &new.players {
            sqlx::query("INSERT INTO players (tournament_id, name) VALUES ($1, $2)")
                .bind(tournament_id)
                .bind(name)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    map_unique_violation(e, TournamentError::DuplicatePlayerName(name.clone()))
                })?;
        }

        for court in &new.courts {
            sqlx::query("INSERT INTO courts (tournament_id, name, number) VALUES ($1, $2, $3)")
                .bind(tournament_id)
                .bind(&court.name)
                .bind(court.number as i32)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    let is_number = matches!(
                        &e,
                        sqlx::Error::Database(db) if db.constraint() == Some("courts_number_unique")
                    );
                    let violation = if is_number {
                        TournamentError::DuplicateCourtNumber(court.number)
                    } else {
                        TournamentError::DuplicateCourtName(court.name.clone())
                    };
                    map_unique_violation(e, violation)
                })?;
        }

        tx.commit().await?;

        Ok(tournament_id)
    }

    async fn get_tournament(&self, tournament_id: TournamentId) -> TournamentResult<Tournament> {
        let row = sqlx::query(&format!(
            "SELECT {TOURNAMENT_COLUMNS} FROM tournaments WHERE id = $1"
        ))
        .bind(tournament_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(TournamentError::NotFound(tournament_id))?;

        tournament_from_row(&row)
    }

    async fn list_tournaments(&self) -> TournamentResult<Vec<Tournament>> {
        let rows = sqlx::query(&format!(
            "SELECT {TOURNAMENT_COLUMNS} FROM tournaments ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(tournament_from_row).collect()
    }

    async fn list_players(&self, tournament_id: TournamentId) -> TournamentResult<Vec<Player>> {
        self.ensure_tournament(tournament_id).await?;

        let rows = sqlx::query(
            "SELECT id, tournament_id, name FROM players WHERE tournament_id = $1 ORDER BY id",
        )
        .bind(tournament_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|r| Player {
                id: r.get("id"),
                tournament_id: r.get("tournament_id"),
                name: r.get("name"),
            })
            .collect())
    }

    async fn list_courts(&self, tournament_id: TournamentId) -> TournamentResult<Vec<Court>> {
        self.ensure_tournament(tournament_id).await?;

        let rows = sqlx::query(
            "SELECT id, tournament_id, name, number FROM courts
             WHERE tournament_id = $1 ORDER BY id",
        )
        .bind(tournament_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(court_from_row).collect())
    }

    async fn max_round_number(&self, tournament_id: TournamentId) -> TournamentResult<Option<u32>> {
        self.ensure_tournament(tournament_id).await?;

        let row = sqlx::query(
            "SELECT MAX(round_number) AS max_round FROM matches WHERE tournament_id = $1",
        )
        .bind(tournament_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get::<Option<i32>, _>("max_round").map(|r| r as u32))
    }

    async fn list_matches(
        &self,
        tournament_id: TournamentId,
        round_number: Option<u32>,
    ) -> TournamentResult<Vec<MatchDetails>> {
        self.ensure_tournament(tournament_id).await?;
        let round = round_number.map(|r| r as i32);

        let match_rows = sqlx::query(
            "SELECT m.id, m.tournament_id, m.round_number, m.court_id, m.team_1_score,
                    m.team_2_score, m.played, m.updated_at,
                    c.name AS court_name, c.number AS court_number
             FROM matches m
             JOIN courts c ON c.id = m.court_id
             WHERE m.tournament_id = $1 AND ($2::INTEGER IS NULL OR m.round_number = $2)
             ORDER BY m.round_number, m.id",
        )
        .bind(tournament_id)
        .bind(round)
        .fetch_all(&self.pool)
        .await?;

        let seat_rows = sqlx::query(
            "SELECT mp.match_id, mp.player_id, mp.team, p.name
             FROM match_players mp
             JOIN matches m ON m.id = mp.match_id
             JOIN players p ON p.id = mp.player_id
             WHERE m.tournament_id = $1 AND ($2::INTEGER IS NULL OR m.round_number = $2)
             ORDER BY mp.id",
        )
        .bind(tournament_id)
        .bind(round)
        .fetch_all(&self.pool)
        .await?;

        let mut seats: HashMap<MatchId, Vec<MatchPlayer>> = HashMap::new();
        for row in &seat_rows {
            let match_id: MatchId = row.get("match_id");
            seats.entry(match_id).or_default().push(MatchPlayer {
                match_id,
                player_id: row.get("player_id"),
                name: row.get("name"),
                team: row.get::<String, _>("team").parse::<Team>()?,
            });
        }

        Ok(match_rows
            .iter()
            .map(|row| {
                let game = match_from_row(row);
                let court = Court {
                    id: game.court_id,
                    tournament_id,
                    name: row.get("court_name"),
                    number: row.get::<i32, _>("court_number") as u32,
                };
                let players = seats.remove(&game.id).unwrap_or_default();
                MatchDetails {
                    game,
                    court,
                    players,
                }
            })
            .collect())
    }

    async fn get_match(&self, match_id: MatchId) -> TournamentResult<Match> {
        let row = sqlx::query(&format!("SELECT {MATCH_COLUMNS} FROM matches WHERE id = $1"))
            .bind(match_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(TournamentError::MatchNotFound(match_id))?;

        Ok(match_from_row(&row))
    }

    async fn commit_round(
        &self,
        tournament_id: TournamentId,
        plan: &RoundPlan,
    ) -> TournamentResult<Vec<MatchId>> {
        let mut tx = self.pool.begin().await?;
        Self::lock_tournament(&mut tx, tournament_id).await?;

        let row = sqlx::query(
            "SELECT MAX(round_number) AS max_round FROM matches WHERE tournament_id = $1",
        )
        .bind(tournament_id)
        .fetch_one(&mut *tx)
        .await?;
        let current: Option<i32> = row.get("max_round");
        if current.is_some_and(|r| r as u32 >= plan.round_number) {
            return Err(TournamentError::StaleRound(plan.round_number));
        }

        let mut created = Vec::with_capacity(plan.matches.len());
        for planned in &plan.matches {
            let row = sqlx::query(
                "INSERT INTO matches (tournament_id, round_number, court_id)
                 VALUES ($1, $2, $3)
                 RETURNING id",
            )
            .bind(tournament_id)
            .bind(plan.round_number as i32)
            .bind(planned.court_id)
            .fetch_one(&mut *tx)
            .await?;
            let match_id: MatchId = row.get("id");

            let seats = planned
                .team_1
                .iter()
                .map(|p| (*p, Team::Team1))
                .chain(planned.team_2.iter().map(|p| (*p, Team::Team2)));

            for (player_id, team) in seats {
                sqlx::query(
                    "INSERT INTO match_players (match_id, player_id, team) VALUES ($1, $2, $3)",
                )
                .bind(match_id)
                .bind(player_id)
                .bind(team.as_str())
                .execute(&mut *tx)
                .await
                .map_err(|e| map_unique_violation(e, TournamentError::DuplicateMatchPlayer))?;
            }

            created.push(match_id);
        }

        sqlx::query(
            "UPDATE tournaments
             SET status = $1, number_of_rounds = $2, final_round = $3
             WHERE id = $4",
        )
        .bind(plan.status.as_str())
        .bind(plan.number_of_rounds as i32)
        .bind(plan.final_round.map(|r| r as i32))
        .bind(tournament_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(created)
    }

    async fn apply_results(
        &self,
        tournament_id: TournamentId,
        updates: &[MatchResultUpdate],
    ) -> TournamentResult<()> {
        let mut tx = self.pool.begin().await?;

        let mut conflicts = Vec::new();
        for update in updates {
            let row = sqlx::query(&format!(
                "SELECT {MATCH_COLUMNS} FROM matches
                 WHERE id = $1 AND tournament_id = $2 FOR UPDATE"
            ))
            .bind(update.match_id)
            .bind(tournament_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(TournamentError::MatchNotFound(update.match_id))?;

            if match_from_row(&row).is_stale(update.expected_updated_at) {
                conflicts.push(update.match_id);
            }
        }

        if !conflicts.is_empty() {
            tx.rollback().await?;
            return Err(TournamentError::Conflict {
                match_ids: conflicts,
            });
        }

        for update in updates {
            sqlx::query(
                "UPDATE matches
                 SET team_1_score = $1, team_2_score = $2, played = $3,
                     updated_at = GREATEST(clock_timestamp(), updated_at + INTERVAL '1 microsecond')
                 WHERE id = $4",
            )
            .bind(update.team_1_score.map(|s| s as i32))
            .bind(update.team_2_score.map(|s| s as i32))
            .bind(update.played)
            .bind(update.match_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(())
    }

    async fn list_snapshots(
        &self,
        tournament_id: TournamentId,
    ) -> TournamentResult<Vec<RankingSnapshot>> {
        self.ensure_tournament(tournament_id).await?;

        let rows = sqlx::query(
            "SELECT s.tournament_id, s.player_id, p.name, s.round_number, s.points, s.is_winner
             FROM ranking_snapshots s
             JOIN players p ON p.id = s.player_id
             WHERE s.tournament_id = $1
             ORDER BY s.round_number, s.id",
        )
        .bind(tournament_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|r| RankingSnapshot {
                tournament_id: r.get("tournament_id"),
                player_id: r.get("player_id"),
                player_name: r.get("name"),
                round_number: r.get::<i32, _>("round_number") as u32,
                points: r.get::<i32, _>("points") as u32,
                is_winner: r.get("is_winner"),
            })
            .collect())
    }

    async fn replace_snapshots(
        &self,
        tournament_id: TournamentId,
        round_number: u32,
        snapshots: &[RankingSnapshot],
    ) -> TournamentResult<()> {
        let mut tx = self.pool.begin().await?;
        Self::lock_tournament(&mut tx, tournament_id).await?;

        sqlx::query("DELETE FROM ranking_snapshots WHERE tournament_id = $1 AND round_number = $2")
            .bind(tournament_id)
            .bind(round_number as i32)
            .execute(&mut *tx)
            .await?;

        for snapshot in snapshots {
            sqlx::query(
                "INSERT INTO ranking_snapshots
                    (tournament_id, player_id, round_number, points, is_winner)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(tournament_id)
            .bind(snapshot.player_id)
            .bind(round_number as i32)
            .bind(snapshot.points as i32)
            .bind(snapshot.is_winner)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(())
    }

    async fn update_status(
        &self,
        tournament_id: TournamentId,
        status: TournamentStatus,
    ) -> TournamentResult<()> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT status FROM tournaments WHERE id = $1 FOR UPDATE")
            .bind(tournament_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(TournamentError::NotFound(tournament_id))?;
        let current: TournamentStatus = row.get::<String, _>("status").parse()?;

        if !current.can_transition_to(status) {
            return Err(TournamentError::InvalidTransition {
                from: current,
                to: status,
            });
        }

        sqlx::query("UPDATE tournaments SET status = $1 WHERE id = $2")
            .bind(status.as_str())
            .bind(tournament_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, DatabaseConfig};
    use crate::tournament::TournamentFormat;

    async fn repository() -> PgTournamentRepository {
        let db = Database::new(&DatabaseConfig::from_env())
            .await
            .expect("Failed to connect to database");
        db.run_migrations().await.expect("Migrations failed");
        PgTournamentRepository::new(db.pool().clone())
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL instance"]
    async fn test_create_and_read_back() {
        let repo = repository().await;
        let new = NewTournament::new(TournamentFormat::Mexicano, 24)
            .with_title("Liga czwartkowa")
            .with_players(["Ania", "Bartek", "Celina", "Darek"])
            .with_court("Kort 1", 1);

        let id = repo.create_tournament(&new).await.unwrap();
        let tournament = repo.get_tournament(id).await.unwrap();
        assert_eq!(tournament.format, TournamentFormat::Mexicano);
        assert_eq!(tournament.status, TournamentStatus::New);
        assert_eq!(tournament.points_per_match, 24);

        let players = repo.list_players(id).await.unwrap();
        assert_eq!(players.len(), 4);
        assert_eq!(players[0].name, "Ania");
        assert_eq!(repo.max_round_number(id).await.unwrap(), None);
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL instance"]
    async fn test_unknown_tournament_is_not_found() {
        let repo = repository().await;
        assert!(matches!(
            repo.get_tournament(i64::MAX).await,
            Err(TournamentError::NotFound(_))
        ));
        assert!(matches!(
            repo.update_status(i64::MAX, TournamentStatus::Finished).await,
            Err(TournamentError::NotFound(_))
        ));
    }

    #[test]
    fn test_unique_violation_passthrough() {
        let err =
            map_unique_violation(sqlx::Error::RowNotFound, TournamentError::DuplicateMatchPlayer);
        assert!(matches!(err, TournamentError::Database(sqlx::Error::RowNotFound)));
    }
}
