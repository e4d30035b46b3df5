//! # Padel
//!
//! Round generation and ranking engine for Americano and Mexicano padel
//! tournaments.
//!
//! Each round splits the registered players into groups of four, one group
//! per court, with two players per team:
//!
//! - **Americano**: every round is drawn at random
//! - **Mexicano**: the first round is random, later rounds group players of
//!   similar standing and randomize teams inside each group
//! - **Final round**: groups follow the standings and teams follow one of
//!   three fixed seeding patterns
//!
//! Standings are aggregated from per-round snapshots that are rebuilt from
//! match results whenever results are submitted.
//!
//! ## Core Modules
//!
//! - [`ranking`]: Standings aggregation and snapshot building
//! - [`rounds`]: Pure round generators and the orchestrator selecting them
//! - [`tournament`]: Models, errors and the [`TournamentManager`]
//! - [`db`]: Storage trait with PostgreSQL and in-memory implementations
//!
//! ## Example
//!
//! ```
//! use padel::ranking::{aggregate, ranking_order};
//! use padel::RankingSnapshot;
//!
//! let snapshot = |player_id, round_number, points, is_winner| RankingSnapshot {
//!     tournament_id: 1,
//!     player_id,
//!     player_name: format!("P{player_id}"),
//!     round_number,
//!     points,
//!     is_winner,
//! };
//!
//! let standings = aggregate(
//!     &[
//!         snapshot(1, 1, 21, true),
//!         snapshot(2, 1, 15, false),
//!         snapshot(1, 2, 10, false),
//!         snapshot(2, 2, 10, true),
//!     ],
//!     21,
//! );
//!
//! assert_eq!(ranking_order(&standings), vec![1, 2]);
//! assert_eq!(standings[0].total_points, 31);
//! assert_eq!(standings[0].win_rate, 50.0);
//! ```

/// Database access and tournament storage.
pub mod db;

/// Standings aggregation and per-round snapshots.
pub mod ranking;

/// Round generators.
pub mod rounds;

/// Tournament models, errors and manager.
pub mod tournament;

pub use ranking::PlayerStanding;
pub use rounds::{RoundPlan, Shuffler};
pub use tournament::{
    MatchResultUpdate, NewTournament, RankingSnapshot, Tournament, TournamentError,
    TournamentFormat, TournamentManager, TournamentResult, TournamentStatus,
};
