/// Property-based tests for round pairing and standings using proptest
///
/// These tests check that every generated round is a partition of the
/// registered players into fours, whatever the seed, ranking or layout.
use chrono::Utc;
use padel::ranking::{aggregate, ranking_order};
use padel::rounds::{RoundContext, RoundPlan, Shuffler, generate_round, groups_needed};
use padel::tournament::{
    Court, FinalMatchPattern, Player, PlayerId, RankingSnapshot, ResultSorting, TeamFormat,
    Tournament, TournamentFormat, TournamentStatus,
};
use proptest::prelude::*;
use std::collections::HashSet;

fn tournament(format: TournamentFormat, status: TournamentStatus, rounds: u32) -> Tournament {
    Tournament {
        id: 1,
        title: "Property".to_string(),
        format,
        result_sorting: ResultSorting::Points,
        team_format: TeamFormat::Player,
        final_match: FinalMatchPattern::OneFourVsTwoThree,
        points_per_match: 21,
        status,
        number_of_rounds: rounds,
        final_round: None,
        created_at: Utc::now(),
    }
}

fn players(count: usize) -> Vec<Player> {
    (1..=count as i64)
        .map(|id| Player {
            id,
            tournament_id: 1,
            name: format!("P{id:03}"),
        })
        .collect()
}

fn courts(count: usize) -> Vec<Court> {
    (1..=count as i64)
        .map(|i| Court {
            id: 1000 + i,
            tournament_id: 1,
            name: format!("Court {i}"),
            number: i as u32,
        })
        .collect()
}

fn format_strategy() -> impl Strategy<Value = TournamentFormat> {
    prop_oneof![Just(TournamentFormat::Americano), Just(TournamentFormat::Mexicano)]
}

fn status_strategy() -> impl Strategy<Value = TournamentStatus> {
    prop_oneof![Just(TournamentStatus::New), Just(TournamentStatus::InProgress)]
}

// Seated players of a plan, in seating order
fn seated(plan: &RoundPlan) -> Vec<PlayerId> {
    plan.matches.iter().flat_map(|m| m.players()).collect()
}

proptest! {
    #[test]
    fn test_valid_layouts_partition_players(
        groups in 1usize..=8,
        spare_courts in 0usize..=3,
        format in format_strategy(),
        status in status_strategy(),
        is_final in any::<bool>(),
        seed in any::<u64>(),
        ranking_seed in any::<u64>(),
    ) {
        let t = tournament(format, status, 2);
        let players = players(groups * 4);
        let courts = courts(groups + spare_courts);

        // Any permutation of the players is a valid ranking
        let mut ranking: Vec<PlayerId> = players.iter().map(|p| p.id).collect();
        Shuffler::seeded(ranking_seed).shuffle(&mut ranking);

        let ctx = RoundContext {
            tournament: &t,
            players: &players,
            courts: &courts,
            max_round: Some(2),
            ranking: &ranking,
        };

        let plan = generate_round(&ctx, is_final, &mut Shuffler::seeded(seed));
        prop_assert!(plan.is_some());
        let plan = plan.unwrap();

        prop_assert_eq!(plan.matches.len(), groups);
        prop_assert_eq!(plan.round_number, 3);

        let all = seated(&plan);
        let unique: HashSet<PlayerId> = all.iter().copied().collect();
        prop_assert_eq!(all.len(), groups * 4);
        prop_assert_eq!(unique.len(), groups * 4);

        let used_courts: Vec<i64> = plan.matches.iter().map(|m| m.court_id).collect();
        let expected_courts: Vec<i64> = courts[..groups].iter().map(|c| c.id).collect();
        prop_assert_eq!(used_courts, expected_courts);

        prop_assert!(plan.number_of_rounds >= t.number_of_rounds);
        if !is_final {
            prop_assert_eq!(plan.status, TournamentStatus::InProgress);
        }
        prop_assert_eq!(plan.final_round.is_some(), is_final);
    }

    #[test]
    fn test_invalid_layouts_are_skipped(
        player_count in 0usize..=40,
        court_count in 0usize..=10,
        format in format_strategy(),
        seed in any::<u64>(),
    ) {
        let layout_ok = groups_needed(player_count).is_some_and(|g| g <= court_count);
        prop_assume!(!layout_ok);

        let t = tournament(format, TournamentStatus::New, 0);
        let players = players(player_count);
        let courts = courts(court_count);
        let ctx = RoundContext {
            tournament: &t,
            players: &players,
            courts: &courts,
            max_round: None,
            ranking: &[],
        };

        prop_assert!(generate_round(&ctx, false, &mut Shuffler::seeded(seed)).is_none());
        prop_assert!(generate_round(&ctx, true, &mut Shuffler::seeded(seed)).is_none());
    }

    #[test]
    fn test_mexicano_groups_follow_ranking(
        groups in 1usize..=6,
        seed in any::<u64>(),
        ranking_seed in any::<u64>(),
    ) {
        let t = tournament(TournamentFormat::Mexicano, TournamentStatus::InProgress, 4);
        let players = players(groups * 4);
        let courts = courts(groups);

        let mut ranking: Vec<PlayerId> = players.iter().map(|p| p.id).collect();
        Shuffler::seeded(ranking_seed).shuffle(&mut ranking);

        let ctx = RoundContext {
            tournament: &t,
            players: &players,
            courts: &courts,
            max_round: Some(4),
            ranking: &ranking,
        };
        let plan = generate_round(&ctx, false, &mut Shuffler::seeded(seed)).unwrap();

        for (planned, expected) in plan.matches.iter().zip(ranking.chunks(4)) {
            let got: HashSet<PlayerId> = planned.players().collect();
            let want: HashSet<PlayerId> = expected.iter().copied().collect();
            prop_assert_eq!(got, want);
        }
        prop_assert_eq!(plan.number_of_rounds, 5);
    }

    #[test]
    fn test_standings_are_sorted(
        results in prop::collection::vec((1i64..=8, 1u32..=5, 0u32..=21, any::<bool>()), 0..60),
    ) {
        // One snapshot per (player, round)
        let mut seen = HashSet::new();
        let snapshots: Vec<RankingSnapshot> = results
            .into_iter()
            .filter(|(player, round, _, _)| seen.insert((*player, *round)))
            .map(|(player_id, round_number, points, is_winner)| RankingSnapshot {
                tournament_id: 1,
                player_id,
                player_name: format!("P{player_id:03}"),
                round_number,
                points,
                is_winner,
            })
            .collect();

        let standings = aggregate(&snapshots, 21);

        for pair in standings.windows(2) {
            prop_assert!(
                pair[0].total_points > pair[1].total_points
                    || (pair[0].total_points == pair[1].total_points
                        && pair[0].win_rate >= pair[1].win_rate)
            );
        }

        let counted: u32 = standings.iter().map(|s| s.total_matches).sum();
        prop_assert_eq!(counted as usize, snapshots.len());

        for s in &standings {
            prop_assert_eq!(s.win_loss_record.total(), s.total_matches);
            prop_assert!((0.0..=100.0).contains(&s.win_rate));
        }

        let order = ranking_order(&standings);
        let unique: HashSet<PlayerId> = order.iter().copied().collect();
        prop_assert_eq!(unique.len(), order.len());
    }
}
