//! Standings aggregation over per-round snapshots.

use crate::tournament::models::{PlayerId, RankingSnapshot};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

/// One round as seen from a player's standing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundResult {
    pub round_number: u32,
    pub points: u32,
    pub is_winner: bool,
}

/// Win/draw/loss tally
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinLossRecord {
    pub win: u32,
    pub draw: u32,
    pub loss: u32,
}

impl WinLossRecord {
    /// Rounds counted in the record
    pub fn total(&self) -> u32 {
        self.win + self.draw + self.loss
    }
}

/// Aggregated standing of one player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStanding {
    pub player_id: PlayerId,
    pub name: String,
    pub rounds: Vec<RoundResult>,
    pub total_points: u32,
    pub total_matches: u32,
    pub win_loss_record: WinLossRecord,
    /// Percentage of rounds won, one decimal place
    pub win_rate: f64,
}

impl PlayerStanding {
    fn new(player_id: PlayerId, name: &str) -> Self {
        Self {
            player_id,
            name: name.to_string(),
            rounds: Vec::new(),
            total_points: 0,
            total_matches: 0,
            win_loss_record: WinLossRecord::default(),
            win_rate: 0.0,
        }
    }

    fn record(&mut self, snapshot: &RankingSnapshot, points_per_match: u32) {
        self.rounds.push(RoundResult {
            round_number: snapshot.round_number,
            points: snapshot.points,
            is_winner: snapshot.is_winner,
        });
        self.total_matches += 1;
        self.total_points += snapshot.points;

        // Exactly half the ceiling is a draw; doubled to stay in integers
        if snapshot.is_winner {
            self.win_loss_record.win += 1;
        } else if snapshot.points * 2 == points_per_match {
            self.win_loss_record.draw += 1;
        } else {
            self.win_loss_record.loss += 1;
        }
    }

    fn finalize(&mut self) {
        let played = self.win_loss_record.total();
        self.win_rate = if played > 0 {
            round_one_decimal(f64::from(self.win_loss_record.win) / f64::from(played) * 100.0)
        } else {
            0.0
        };
    }
}

// Halves go to the even digit: 6.25 becomes 6.2
fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round_ties_even() / 10.0
}

/// Build the standings table from every snapshot of a tournament.
///
/// Snapshots are visited in (player name, round) order. Players are sorted by
/// total points, then win rate, both descending; remaining ties keep the
/// visiting order.
///
/// # Arguments
///
/// * `snapshots` - Every stored snapshot of the tournament
/// * `points_per_match` - Ceiling used to recognise draws
///
/// # Returns
///
/// * `Vec<PlayerStanding>` - Standings, best first
pub fn aggregate(snapshots: &[RankingSnapshot], points_per_match: u32) -> Vec<PlayerStanding> {
    let mut ordered: Vec<&RankingSnapshot> = snapshots.iter().collect();
    ordered.sort_by(|a, b| {
        a.player_name
            .cmp(&b.player_name)
            .then(a.round_number.cmp(&b.round_number))
    });

    let mut index: HashMap<PlayerId, usize> = HashMap::new();
    let mut standings: Vec<PlayerStanding> = Vec::new();

    for snapshot in ordered {
        let slot = *index.entry(snapshot.player_id).or_insert_with(|| {
            standings.push(PlayerStanding::new(snapshot.player_id, &snapshot.player_name));
            standings.len() - 1
        });
        standings[slot].record(snapshot, points_per_match);
    }

    for standing in &mut standings {
        standing.finalize();
    }

    standings.sort_by(|a, b| {
        b.total_points
            .cmp(&a.total_points)
            .then_with(|| {
                b.win_rate
                    .partial_cmp(&a.win_rate)
                    .unwrap_or(Ordering::Equal)
            })
    });

    standings
}

/// Player ids from best to worst
pub fn ranking_order(standings: &[PlayerStanding]) -> Vec<PlayerId> {
    standings.iter().map(|s| s.player_id).collect()
}
