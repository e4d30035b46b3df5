//! Tournament module for Americano and Mexicano padel tournaments.
//!
//! This module provides:
//! - Tournament, player, court and match models
//! - Creation-time validation of names, courts and scoring
//! - The [`TournamentManager`] driving round generation, result submission
//!   and rankings over a [`TournamentRepository`](crate::db::TournamentRepository)
//!
//! ## Example
//!
//! ```no_run
//! use padel::db::MemoryTournamentRepository;
//! use padel::tournament::{NewTournament, TournamentFormat, TournamentManager};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let manager = TournamentManager::new(Arc::new(MemoryTournamentRepository::new()));
//!
//!     let tournament = NewTournament::new(TournamentFormat::Mexicano, 21)
//!         .with_title("Friday Mexicano")
//!         .with_players(["Ana", "Ben", "Cleo", "Dan", "Eva", "Finn", "Gia", "Hal"])
//!         .with_court("Centre", 1)
//!         .with_court("Side", 2);
//!
//!     let tournament_id = manager.create_tournament(tournament).await?;
//!     let round = manager.generate_round(tournament_id, false).await?;
//!     println!("Drew round {round}");
//!
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod manager;
pub mod models;

pub use errors::{TournamentError, TournamentResult};
pub use manager::TournamentManager;
pub use models::{
    Court, CourtId, FinalMatchPattern, Match, MatchDetails, MatchId, MatchPlayer,
    MatchResultUpdate, NewCourt, NewTournament, Player, PlayerId, RankingSnapshot, ResultSorting,
    Team, TeamFormat, Tournament, TournamentFormat, TournamentId, TournamentStatus,
};
