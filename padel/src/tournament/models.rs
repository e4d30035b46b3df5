//! Tournament data models for Americano and Mexicano padel tournaments.

use super::errors::{TournamentError, TournamentResult};
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Tournament ID type
pub type TournamentId = i64;

/// Player ID type
pub type PlayerId = i64;

/// Court ID type
pub type CourtId = i64;

/// Match ID type
pub type MatchId = i64;

/// Lowest allowed points-per-match ceiling
pub const MIN_POINTS_PER_MATCH: u32 = 1;

/// Highest allowed points-per-match ceiling, also the highest recordable score
pub const MAX_POINTS_PER_MATCH: u32 = 50;

/// Highest score a team can be credited with in a single match
pub const MAX_TEAM_SCORE: u32 = 50;

/// Number of players on court in one match
pub const PLAYERS_PER_MATCH: usize = 4;

/// Maximum tournament title length
pub const MAX_TITLE_LEN: usize = 30;

/// Title used when none is given
pub const DEFAULT_TITLE: &str = "Padel Tournament";

/// Pairing format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TournamentFormat {
    /// Every round is drawn at random
    Americano,
    /// Rounds after the first group players by standings
    Mexicano,
}

/// How standings are presented to users
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResultSorting {
    Wins,
    Points,
}

/// Whether players enter individually or as fixed pairs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TeamFormat {
    Player,
    Pair,
}

/// Seeding pattern applied to every group of four in the final round.
///
/// Positions are ranks inside the group, best first. Serialized as its
/// numeric code, the same value stored in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum FinalMatchPattern {
    /// 1 & 3 vs 2 & 4 (code 1)
    OneThreeVsTwoFour,
    /// 1 & 2 vs 3 & 4 (code 2)
    OneTwoVsThreeFour,
    /// 1 & 4 vs 2 & 3 (code 3)
    OneFourVsTwoThree,
}

impl FinalMatchPattern {
    /// Resolve the stored numeric code
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::OneThreeVsTwoFour),
            2 => Some(Self::OneTwoVsThreeFour),
            3 => Some(Self::OneFourVsTwoThree),
            _ => None,
        }
    }

    /// Numeric code as stored
    pub fn code(self) -> u8 {
        match self {
            Self::OneThreeVsTwoFour => 1,
            Self::OneTwoVsThreeFour => 2,
            Self::OneFourVsTwoThree => 3,
        }
    }

    /// Group indices (0-based) forming team 1 and team 2
    pub fn layout(self) -> ([usize; 2], [usize; 2]) {
        match self {
            Self::OneThreeVsTwoFour => ([0, 2], [1, 3]),
            Self::OneTwoVsThreeFour => ([0, 1], [2, 3]),
            Self::OneFourVsTwoThree => ([0, 3], [1, 2]),
        }
    }

    /// Human readable label
    pub fn label(self) -> &'static str {
        match self {
            Self::OneThreeVsTwoFour => "1 & 3 vs 2 & 4",
            Self::OneTwoVsThreeFour => "1 & 2 vs 3 & 4",
            Self::OneFourVsTwoThree => "1 & 4 vs 2 & 3",
        }
    }
}

impl From<FinalMatchPattern> for u8 {
    fn from(pattern: FinalMatchPattern) -> Self {
        pattern.code()
    }
}

impl TryFrom<u8> for FinalMatchPattern {
    type Error = TournamentError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or_else(|| TournamentError::UnknownValue {
            kind: "FinalMatchPattern",
            value: code.to_string(),
        })
    }
}

/// Tournament lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TournamentStatus {
    /// Created, no round drawn yet
    New,
    /// At least one round drawn
    InProgress,
    /// Closed by the organiser
    Finished,
}

impl TournamentStatus {
    /// Status only ever moves forward
    pub fn can_transition_to(self, next: TournamentStatus) -> bool {
        matches!(
            (self, next),
            (Self::New, Self::InProgress)
                | (Self::New, Self::Finished)
                | (Self::InProgress, Self::Finished)
        )
    }
}

/// Team tag of a player within a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Team {
    Team1,
    Team2,
}

macro_rules! text_enum {
    ($ty:ty { $($variant:path => $text:literal),+ $(,)? }) => {
        impl $ty {
            /// Storage representation
            pub fn as_str(self) -> &'static str {
                match self {
                    $($variant => $text),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = TournamentError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_ascii_uppercase().as_str() {
                    $($text => Ok($variant),)+
                    _ => Err(TournamentError::UnknownValue {
                        kind: stringify!($ty),
                        value: s.to_string(),
                    }),
                }
            }
        }
    };
}

text_enum!(TournamentFormat {
    TournamentFormat::Americano => "AMERICANO",
    TournamentFormat::Mexicano => "MEXICANO",
});

text_enum!(ResultSorting {
    ResultSorting::Wins => "WINS",
    ResultSorting::Points => "POINTS",
});

text_enum!(TeamFormat {
    TeamFormat::Player => "PLAYER",
    TeamFormat::Pair => "PAIR",
});

text_enum!(TournamentStatus {
    TournamentStatus::New => "NEW",
    TournamentStatus::InProgress => "IN_PROGRESS",
    TournamentStatus::Finished => "FINISHED",
});

text_enum!(Team {
    Team::Team1 => "TEAM1",
    Team::Team2 => "TEAM2",
});

/// Court definition supplied at tournament creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCourt {
    pub name: String,
    pub number: u32,
}

/// Everything needed to create a tournament in one atomic step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTournament {
    pub title: String,
    pub format: TournamentFormat,
    pub result_sorting: ResultSorting,
    pub team_format: TeamFormat,
    pub final_match: FinalMatchPattern,
    pub points_per_match: u32,
    /// Player display names, in registration order
    pub players: Vec<String>,
    /// Courts, in the order rounds consume them
    pub courts: Vec<NewCourt>,
}

impl NewTournament {
    /// Create a tournament definition with default sorting, team format and final pattern
    pub fn new(format: TournamentFormat, points_per_match: u32) -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            format,
            result_sorting: ResultSorting::Points,
            team_format: TeamFormat::Player,
            final_match: FinalMatchPattern::OneTwoVsThreeFour,
            points_per_match,
            players: Vec::new(),
            courts: Vec::new(),
        }
    }

    /// Set the title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the final round seeding pattern
    pub fn with_final_match(mut self, pattern: FinalMatchPattern) -> Self {
        self.final_match = pattern;
        self
    }

    /// Add players by name
    pub fn with_players<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.players.extend(names.into_iter().map(Into::into));
        self
    }

    /// Add a court
    pub fn with_court(mut self, name: impl Into<String>, number: u32) -> Self {
        self.courts.push(NewCourt {
            name: name.into(),
            number,
        });
        self
    }

    /// Check creation invariants before anything is written
    pub fn validate(&self) -> TournamentResult<()> {
        if self.title.trim().is_empty() || self.title.chars().count() > MAX_TITLE_LEN {
            return Err(TournamentError::InvalidTitle(self.title.clone()));
        }

        if !(MIN_POINTS_PER_MATCH..=MAX_POINTS_PER_MATCH).contains(&self.points_per_match) {
            return Err(TournamentError::InvalidPointsPerMatch(self.points_per_match));
        }

        if self.players.is_empty() {
            return Err(TournamentError::NoPlayers);
        }

        if self.courts.is_empty() {
            return Err(TournamentError::NoCourts);
        }

        let mut names = HashSet::new();
        for name in &self.players {
            if !names.insert(name.as_str()) {
                return Err(TournamentError::DuplicatePlayerName(name.clone()));
            }
        }

        let mut court_names = HashSet::new();
        let mut court_numbers = HashSet::new();
        for court in &self.courts {
            if !court_names.insert(court.name.as_str()) {
                return Err(TournamentError::DuplicateCourtName(court.name.clone()));
            }
            if !court_numbers.insert(court.number) {
                return Err(TournamentError::DuplicateCourtNumber(court.number));
            }
        }

        Ok(())
    }
}

/// Stored tournament
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub title: String,
    pub format: TournamentFormat,
    pub result_sorting: ResultSorting,
    pub team_format: TeamFormat,
    pub final_match: FinalMatchPattern,
    pub points_per_match: u32,
    pub status: TournamentStatus,
    /// Highest round drawn so far
    pub number_of_rounds: u32,
    /// Round designated as the final, once drawn
    pub final_round: Option<u32>,
    pub created_at: DateTime<Utc>,
}

/// Registered player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub tournament_id: TournamentId,
    pub name: String,
}

/// Court owned by a tournament
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Court {
    pub id: CourtId,
    pub tournament_id: TournamentId,
    pub name: String,
    pub number: u32,
}

/// A single match of a round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub tournament_id: TournamentId,
    pub round_number: u32,
    pub court_id: CourtId,
    pub team_1_score: Option<u32>,
    pub team_2_score: Option<u32>,
    pub played: bool,
    /// Optimistic concurrency token
    pub updated_at: DateTime<Utc>,
}

impl Match {
    /// Winning team, `None` for a draw
    pub fn winner(&self) -> Option<Team> {
        let team_1 = self.team_1_score.unwrap_or(0);
        let team_2 = self.team_2_score.unwrap_or(0);
        match team_1.cmp(&team_2) {
            std::cmp::Ordering::Greater => Some(Team::Team1),
            std::cmp::Ordering::Less => Some(Team::Team2),
            std::cmp::Ordering::Equal => None,
        }
    }

    /// True when the caller's token no longer matches the stored one.
    ///
    /// Compared at microsecond precision, the resolution of the store.
    pub fn is_stale(&self, expected: Option<DateTime<Utc>>) -> bool {
        expected.is_some_and(|seen| seen.trunc_subsecs(6) != self.updated_at.trunc_subsecs(6))
    }

    /// Points credited to a team
    pub fn score_for(&self, team: Team) -> u32 {
        match team {
            Team::Team1 => self.team_1_score.unwrap_or(0),
            Team::Team2 => self.team_2_score.unwrap_or(0),
        }
    }
}

/// Player seat in a match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchPlayer {
    pub match_id: MatchId,
    pub player_id: PlayerId,
    pub name: String,
    pub team: Team,
}

/// Match joined with its court and players
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchDetails {
    #[serde(flatten)]
    pub game: Match,
    pub court: Court,
    pub players: Vec<MatchPlayer>,
}

impl MatchDetails {
    /// Players assigned to a team
    pub fn team(&self, team: Team) -> impl Iterator<Item = &MatchPlayer> {
        self.players.iter().filter(move |p| p.team == team)
    }
}

/// Per-player outcome of one round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingSnapshot {
    pub tournament_id: TournamentId,
    pub player_id: PlayerId,
    pub player_name: String,
    pub round_number: u32,
    pub points: u32,
    pub is_winner: bool,
}

/// Result submitted for a match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResultUpdate {
    pub match_id: MatchId,
    pub team_1_score: Option<u32>,
    pub team_2_score: Option<u32>,
    pub played: bool,
    /// Timestamp the caller last saw; `None` skips the conflict check
    pub expected_updated_at: Option<DateTime<Utc>>,
}

impl MatchResultUpdate {
    /// Result of a finished match
    pub fn played(match_id: MatchId, team_1_score: u32, team_2_score: u32) -> Self {
        Self {
            match_id,
            team_1_score: Some(team_1_score),
            team_2_score: Some(team_2_score),
            played: true,
            expected_updated_at: None,
        }
    }

    /// Attach the concurrency token read alongside the match
    pub fn expecting(mut self, updated_at: DateTime<Utc>) -> Self {
        self.expected_updated_at = Some(updated_at);
        self
    }

    /// Reject results that may not be written
    pub fn validate(&self) -> TournamentResult<()> {
        if self.played && (self.team_1_score.is_none() || self.team_2_score.is_none()) {
            return Err(TournamentError::MissingScore(self.match_id));
        }

        for score in [self.team_1_score, self.team_2_score].into_iter().flatten() {
            if score > MAX_TEAM_SCORE {
                return Err(TournamentError::ScoreOutOfRange {
                    match_id: self.match_id,
                    score,
                });
            }
        }

        Ok(())
    }
}
