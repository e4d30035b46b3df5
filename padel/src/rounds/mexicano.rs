//! Mexicano draw: players of similar standing share a court.

use super::{
    PlannedMatch, RoundContext, RoundPlan, Shuffler, generate_americano_round, has_valid_layout,
    seeding_order,
};
use crate::tournament::models::{PLAYERS_PER_MATCH, PlayerId, TournamentStatus};
use log::debug;

/// Draw the next Mexicano round.
///
/// The opening round of a `New` tournament is an Americano draw. Afterwards the
/// standings are cut into groups of four (ranks 1-4, 5-8, ...) and only the
/// team split inside each group is random.
///
/// # Arguments
///
/// * `ctx` - Tournament, players, courts, highest existing round and ranking
/// * `shuffler` - Random source for the team split
///
/// # Returns
///
/// * `Option<RoundPlan>` - The round to commit, or None on an invalid layout
pub fn generate_mexicano_round(
    ctx: &RoundContext<'_>,
    shuffler: &mut Shuffler,
) -> Option<RoundPlan> {
    if ctx.tournament.status == TournamentStatus::New {
        return generate_americano_round(ctx, shuffler);
    }

    if !has_valid_layout(ctx.players.len(), ctx.courts.len()) {
        debug!(
            "Skipping mexicano draw for tournament {}: {} players, {} courts",
            ctx.tournament.id,
            ctx.players.len(),
            ctx.courts.len()
        );
        return None;
    }

    let round_number = ctx.tournament.number_of_rounds + 1;
    let order = seeding_order(ctx);

    let matches = order
        .chunks_exact(PLAYERS_PER_MATCH)
        .zip(ctx.courts)
        .map(|(group, court)| {
            let mut group: Vec<PlayerId> = group.to_vec();
            shuffler.shuffle(&mut group);
            PlannedMatch {
                court_id: court.id,
                team_1: [group[0], group[1]],
                team_2: [group[2], group[3]],
            }
        })
        .collect();

    Some(RoundPlan {
        round_number,
        matches,
        status: ctx.tournament.status,
        number_of_rounds: round_number,
        final_round: ctx.tournament.final_round,
    })
}
