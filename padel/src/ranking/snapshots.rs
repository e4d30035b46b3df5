//! Snapshot builder: per-player outcomes of a round's played matches.

use crate::tournament::models::{MatchDetails, RankingSnapshot, TournamentId};

/// Build the snapshots of one round.
///
/// Only played matches contribute. Each seated player is credited with their
/// team's score; a drawn match has no winner.
pub fn build_round_snapshots(
    tournament_id: TournamentId,
    round_number: u32,
    matches: &[MatchDetails],
) -> Vec<RankingSnapshot> {
    matches
        .iter()
        .filter(|m| m.game.played && m.game.round_number == round_number)
        .flat_map(|m| {
            let winner = m.game.winner();
            m.players.iter().map(move |seat| RankingSnapshot {
                tournament_id,
                player_id: seat.player_id,
                player_name: seat.name.clone(),
                round_number,
                points: m.game.score_for(seat.team),
                is_winner: winner == Some(seat.team),
            })
        })
        .collect()
}
