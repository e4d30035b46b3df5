//! Picks the generator for the next round.

use super::{
    RoundContext, RoundPlan, Shuffler, generate_americano_round, generate_final_round,
    generate_mexicano_round,
};
use crate::tournament::models::TournamentFormat;

/// Plan the next round.
///
/// A final round is seeded from standings whatever the format; otherwise the
/// tournament format decides. No validation happens here beyond the silent
/// layout check each generator performs.
///
/// # Arguments
///
/// * `ctx` - Everything the generators read
/// * `is_final` - Draw the final round instead of a regular one
/// * `shuffler` - Random source for the regular formats
///
/// # Returns
///
/// * `Option<RoundPlan>` - The planned round, or None on an invalid layout
pub fn generate_round(
    ctx: &RoundContext<'_>,
    is_final: bool,
    shuffler: &mut Shuffler,
) -> Option<RoundPlan> {
    if is_final {
        return generate_final_round(ctx);
    }

    match ctx.tournament.format {
        TournamentFormat::Americano => generate_americano_round(ctx, shuffler),
        TournamentFormat::Mexicano => generate_mexicano_round(ctx, shuffler),
    }
}
