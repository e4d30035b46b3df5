//! Americano draw: every round is a fresh random split into fours.

use super::{PlannedMatch, RoundContext, RoundPlan, Shuffler, has_valid_layout};
use crate::tournament::models::{PLAYERS_PER_MATCH, PlayerId, TournamentStatus};
use log::debug;

/// Draw the next Americano round.
///
/// Players are shuffled and cut into contiguous groups of four; the i-th group
/// plays on the i-th court with its first two players as team 1. The round
/// number follows the highest existing round. A `New` tournament becomes
/// `InProgress`.
///
/// # Arguments
///
/// * `ctx` - Tournament, players, courts and highest existing round
/// * `shuffler` - Random source for the draw
///
/// # Returns
///
/// * `Option<RoundPlan>` - The round to commit, or None if the players cannot
///   be split into fours on the available courts
pub fn generate_americano_round(
    ctx: &RoundContext<'_>,
    shuffler: &mut Shuffler,
) -> Option<RoundPlan> {
    if !has_valid_layout(ctx.players.len(), ctx.courts.len()) {
        debug!(
            "Skipping americano draw for tournament {}: {} players, {} courts",
            ctx.tournament.id,
            ctx.players.len(),
            ctx.courts.len()
        );
        return None;
    }

    let round_number = ctx.max_round.map_or(1, |round| round + 1);

    let mut drawn: Vec<PlayerId> = ctx.players.iter().map(|p| p.id).collect();
    shuffler.shuffle(&mut drawn);

    let matches = drawn
        .chunks_exact(PLAYERS_PER_MATCH)
        .zip(ctx.courts)
        .map(|(group, court)| PlannedMatch {
            court_id: court.id,
            team_1: [group[0], group[1]],
            team_2: [group[2], group[3]],
        })
        .collect();

    let status = match ctx.tournament.status {
        TournamentStatus::New => TournamentStatus::InProgress,
        other => other,
    };

    Some(RoundPlan {
        round_number,
        matches,
        status,
        number_of_rounds: round_number.max(ctx.tournament.number_of_rounds),
        final_round: ctx.tournament.final_round,
    })
}
