//! Ranking module: snapshot building and standings aggregation.
//!
//! Snapshots are a disposable cache derived from match results. They are
//! rebuilt per (tournament, round) whenever results are submitted, and the
//! standings table is always aggregated from them.

pub mod aggregator;
pub mod snapshots;

pub use aggregator::{PlayerStanding, RoundResult, WinLossRecord, aggregate, ranking_order};
pub use snapshots::build_round_snapshots;
