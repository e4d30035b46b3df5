//! Final round: fixed seeding inside each group of four.

use super::{PlannedMatch, RoundContext, RoundPlan, has_valid_layout, seeding_order};
use crate::tournament::models::PLAYERS_PER_MATCH;
use log::debug;

/// Draw the final round from the current standings.
///
/// Standings are cut into groups of four in rank order and each group is
/// split by the tournament's
/// [`FinalMatchPattern`](crate::tournament::models::FinalMatchPattern).
/// The new round becomes both the round counter and the final round marker.
///
/// # Arguments
///
/// * `ctx` - Tournament, players, courts, highest existing round and ranking
///
/// # Returns
///
/// * `Option<RoundPlan>` - The final round, or None on an invalid layout
pub fn generate_final_round(ctx: &RoundContext<'_>) -> Option<RoundPlan> {
    if !has_valid_layout(ctx.players.len(), ctx.courts.len()) {
        debug!(
            "Skipping final draw for tournament {}: {} players, {} courts",
            ctx.tournament.id,
            ctx.players.len(),
            ctx.courts.len()
        );
        return None;
    }

    let round_number = ctx.tournament.number_of_rounds + 1;
    let ([a, b], [c, d]) = ctx.tournament.final_match.layout();

    let matches = seeding_order(ctx)
        .chunks_exact(PLAYERS_PER_MATCH)
        .zip(ctx.courts)
        .map(|(group, court)| PlannedMatch {
            court_id: court.id,
            team_1: [group[a], group[b]],
            team_2: [group[c], group[d]],
        })
        .collect();

    Some(RoundPlan {
        round_number,
        matches,
        status: ctx.tournament.status,
        number_of_rounds: round_number,
        final_round: Some(round_number),
    })
}
