use chrono::Utc;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use padel::{
    RankingSnapshot, Shuffler,
    ranking::{aggregate, ranking_order},
    rounds::{RoundContext, generate_round},
    tournament::{
        Court, FinalMatchPattern, Player, PlayerId, ResultSorting, TeamFormat, Tournament,
        TournamentFormat, TournamentStatus,
    },
};
use std::hint::black_box;

/// Helper to create an in-progress tournament with N players and enough courts
fn setup(format: TournamentFormat, n_players: usize) -> (Tournament, Vec<Player>, Vec<Court>) {
    let tournament = Tournament {
        id: 1,
        title: "Bench".to_string(),
        format,
        result_sorting: ResultSorting::Points,
        team_format: TeamFormat::Player,
        final_match: FinalMatchPattern::OneThreeVsTwoFour,
        points_per_match: 21,
        status: TournamentStatus::InProgress,
        number_of_rounds: 5,
        final_round: None,
        created_at: Utc::now(),
    };

    let players = (1..=n_players as i64)
        .map(|id| Player {
            id,
            tournament_id: 1,
            name: format!("player{id}"),
        })
        .collect();

    let courts = (1..=(n_players / 4) as i64)
        .map(|i| Court {
            id: 1000 + i,
            tournament_id: 1,
            name: format!("court{i}"),
            number: i as u32,
        })
        .collect();

    (tournament, players, courts)
}

/// Five scored rounds for every player
fn snapshots(n_players: usize) -> Vec<RankingSnapshot> {
    (1..=n_players as i64)
        .flat_map(|player_id| {
            (1..=5u32).map(move |round_number| RankingSnapshot {
                tournament_id: 1,
                player_id,
                player_name: format!("player{player_id}"),
                round_number,
                points: (player_id as u32 * 7 + round_number * 3) % 22,
                is_winner: (player_id + i64::from(round_number)) % 2 == 0,
            })
        })
        .collect()
}

/// Benchmark standings aggregation
fn bench_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate");

    for n_players in [8, 32, 128] {
        let data = snapshots(n_players);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_players", n_players)),
            &data,
            |b, data| {
                b.iter(|| aggregate(black_box(data), 21));
            },
        );
    }

    group.finish();
}

/// Benchmark round planning for each generator
fn bench_generate_round(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate_round");

    for n_players in [8, 32, 128] {
        for (label, format, is_final) in [
            ("americano", TournamentFormat::Americano, false),
            ("mexicano", TournamentFormat::Mexicano, false),
            ("final", TournamentFormat::Mexicano, true),
        ] {
            let (tournament, players, courts) = setup(format, n_players);
            let ranking: Vec<PlayerId> = ranking_order(&aggregate(&snapshots(n_players), 21));
            let mut shuffler = Shuffler::seeded(42);

            group.bench_with_input(
                BenchmarkId::new(label, format!("{}_players", n_players)),
                &n_players,
                |b, _| {
                    b.iter(|| {
                        let ctx = RoundContext {
                            tournament: &tournament,
                            players: &players,
                            courts: &courts,
                            max_round: Some(5),
                            ranking: &ranking,
                        };
                        generate_round(black_box(&ctx), is_final, &mut shuffler)
                    });
                },
            );
        }
    }

    group.finish();
}

criterion_group!(ranking, bench_aggregate);
criterion_group!(rounds, bench_generate_round);
criterion_main!(ranking, rounds);
