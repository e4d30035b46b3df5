//! Plays a whole tournament with random scores.

use crate::config::CliConfig;
use padel::tournament::{MatchDetails, MatchResultUpdate, NewTournament, Team, TournamentManager};
use padel::{PlayerStanding, Tournament};
use rand::Rng;
use serde::Serialize;

/// One match as shown in the report
#[derive(Debug, Clone, Serialize)]
pub struct MatchLine {
    pub court: String,
    pub team_1: Vec<String>,
    pub team_2: Vec<String>,
    pub team_1_score: u32,
    pub team_2_score: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoundSummary {
    pub round_number: u32,
    pub is_final: bool,
    pub matches: Vec<MatchLine>,
}

/// Everything printed at the end of a run
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub tournament: Tournament,
    pub rounds: Vec<RoundSummary>,
    pub standings: Vec<PlayerStanding>,
}

/// Definition of the simulated tournament
pub fn tournament_definition(config: &CliConfig) -> NewTournament {
    let mut new = NewTournament::new(config.format, config.points_per_match)
        .with_title(format!("{} simulation", config.format))
        .with_final_match(config.final_match)
        .with_players((1..=config.players).map(|i| format!("Player {i:02}")));

    for number in 1..=config.courts {
        new = new.with_court(format!("Court {number}"), number);
    }

    new
}

/// Create, play and finish a tournament
pub async fn run<R: Rng>(
    manager: &TournamentManager,
    config: &CliConfig,
    rng: &mut R,
) -> anyhow::Result<SimulationReport> {
    let tournament_id = manager
        .create_tournament(tournament_definition(config))
        .await?;

    let mut rounds = Vec::new();
    for _ in 0..config.rounds {
        rounds.push(play_round(manager, tournament_id, false, config.points_per_match, rng).await?);
    }
    if config.play_final {
        rounds.push(play_round(manager, tournament_id, true, config.points_per_match, rng).await?);
    }

    manager.finish_tournament(tournament_id).await?;

    Ok(SimulationReport {
        tournament: manager.get_tournament(tournament_id).await?,
        rounds,
        standings: manager.ranking(tournament_id).await?,
    })
}

async fn play_round<R: Rng>(
    manager: &TournamentManager,
    tournament_id: i64,
    is_final: bool,
    points_per_match: u32,
    rng: &mut R,
) -> anyhow::Result<RoundSummary> {
    let round_number = manager.generate_round(tournament_id, is_final).await?;
    let drawn = manager.round_matches(tournament_id, round_number).await?;

    let updates = drawn
        .iter()
        .map(|m| {
            let team_1 = rng.random_range(0..=points_per_match);
            MatchResultUpdate::played(m.game.id, team_1, points_per_match - team_1)
                .expecting(m.game.updated_at)
        })
        .collect();

    let played = manager
        .submit_round_results(tournament_id, round_number, updates)
        .await?;

    log::debug!("Round {round_number} scored ({} matches)", played.len());

    Ok(RoundSummary {
        round_number,
        is_final,
        matches: played.iter().map(match_line).collect(),
    })
}

fn match_line(details: &MatchDetails) -> MatchLine {
    let names = |team| {
        details
            .team(team)
            .map(|p| p.name.clone())
            .collect::<Vec<_>>()
    };

    MatchLine {
        court: details.court.name.clone(),
        team_1: names(Team::Team1),
        team_2: names(Team::Team2),
        team_1_score: details.game.team_1_score.unwrap_or(0),
        team_2_score: details.game.team_2_score.unwrap_or(0),
    }
}

/// Plain text rendering of the report
pub fn render(report: &SimulationReport) -> String {
    let mut out = String::new();
    let t = &report.tournament;

    out.push_str(&format!(
        "{} ({}, {} points per match, final pattern {})\n",
        t.title,
        t.format,
        t.points_per_match,
        t.final_match.label()
    ));

    for round in &report.rounds {
        out.push_str(&format!(
            "\n{} {}\n",
            if round.is_final { "Final round" } else { "Round" },
            round.round_number
        ));
        for m in &round.matches {
            out.push_str(&format!(
                "  {:<10} {:>22} {:>2} - {:<2} {}\n",
                m.court,
                m.team_1.join(" & "),
                m.team_1_score,
                m.team_2_score,
                m.team_2.join(" & ")
            ));
        }
    }

    out.push_str("\nStandings\n");
    for (place, standing) in report.standings.iter().enumerate() {
        let record = standing.win_loss_record;
        out.push_str(&format!(
            "  {:>2}. {:<12} {:>4} pts  {}W {}D {}L  {:>5.1}%\n",
            place + 1,
            standing.name,
            standing.total_points,
            record.win,
            record.draw,
            record.loss,
            standing.win_rate
        ));
    }

    out
}
