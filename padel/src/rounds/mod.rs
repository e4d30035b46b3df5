//! Round generation engine.
//!
//! Generators are pure: they read a [`RoundContext`] and return a
//! [`RoundPlan`] describing every match of the next round together with the
//! tournament counters after it. Nothing is written here; the plan is
//! committed as one unit by the storage layer, so a round is either stored
//! completely or not at all.
//!
//! An invalid layout (fewer than four players, a player count that is not a
//! multiple of four, or not enough courts for every group) yields `None`.

pub mod americano;
pub mod final_round;
pub mod mexicano;
pub mod orchestrator;
pub mod shuffler;

pub use americano::generate_americano_round;
pub use final_round::generate_final_round;
pub use mexicano::generate_mexicano_round;
pub use orchestrator::generate_round;
pub use shuffler::Shuffler;

use crate::tournament::models::{
    Court, CourtId, PLAYERS_PER_MATCH, Player, PlayerId, Tournament, TournamentStatus,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Everything a generator may read
#[derive(Debug, Clone, Copy)]
pub struct RoundContext<'a> {
    pub tournament: &'a Tournament,
    /// Players in stored order
    pub players: &'a [Player],
    /// Courts in stored order
    pub courts: &'a [Court],
    /// Highest round number among existing matches
    pub max_round: Option<u32>,
    /// Current standings, best first
    pub ranking: &'a [PlayerId],
}

/// One match to be created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedMatch {
    pub court_id: CourtId,
    pub team_1: [PlayerId; 2],
    pub team_2: [PlayerId; 2],
}

impl PlannedMatch {
    /// All four players
    pub fn players(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.team_1.iter().chain(self.team_2.iter()).copied()
    }
}

/// A complete round ready to be committed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundPlan {
    pub round_number: u32,
    pub matches: Vec<PlannedMatch>,
    /// Tournament status after the round is stored
    pub status: TournamentStatus,
    /// Tournament round counter after the round is stored
    pub number_of_rounds: u32,
    /// Final round marker after the round is stored
    pub final_round: Option<u32>,
}

/// Number of matches a round needs, if the players can be split into fours
pub fn groups_needed(player_count: usize) -> Option<usize> {
    if player_count < PLAYERS_PER_MATCH || player_count % PLAYERS_PER_MATCH != 0 {
        None
    } else {
        Some(player_count / PLAYERS_PER_MATCH)
    }
}

/// True when every group of four gets its own court
pub(crate) fn has_valid_layout(player_count: usize, court_count: usize) -> bool {
    groups_needed(player_count).is_some_and(|groups| groups <= court_count)
}

/// Standings order completed with players that have no results yet.
///
/// Unranked players follow the ranked ones in stored order, and ranking
/// entries for unknown players are dropped.
pub(crate) fn seeding_order(ctx: &RoundContext<'_>) -> Vec<PlayerId> {
    let registered: HashSet<PlayerId> = ctx.players.iter().map(|p| p.id).collect();
    let mut seen = HashSet::new();

    let mut order: Vec<PlayerId> = ctx
        .ranking
        .iter()
        .copied()
        .filter(|id| registered.contains(id) && seen.insert(*id))
        .collect();

    order.extend(
        ctx.players
            .iter()
            .map(|p| p.id)
            .filter(|id| !seen.contains(id)),
    );

    order
}
