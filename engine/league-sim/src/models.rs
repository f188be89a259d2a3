//! Data models shared by the auction and season simulators

use crate::config::PositionTable;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Player identifier as issued by the data provider
pub type PlayerId = u32;

/// League team index (0-based, dense)
pub type TeamId = usize;

/// Fantasy position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Position {
    QB,
    RB,
    WR,
    TE,
    DST,
}

impl Position {
    /// All positions in lineup order
    pub const ALL: [Position; 5] =
        [Position::QB, Position::RB, Position::WR, Position::TE, Position::DST];

    pub fn as_str(&self) -> &'static str {
        match self {
            Position::QB => "QB",
            Position::RB => "RB",
            Position::WR => "WR",
            Position::TE => "TE",
            Position::DST => "DST",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Position {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "QB" => Ok(Position::QB),
            "RB" => Ok(Position::RB),
            "WR" => Ok(Position::WR),
            "TE" => Ok(Position::TE),
            "DST" | "D/ST" | "DEF" => Ok(Position::DST),
            other => Err(format!("unknown position '{}'", other)),
        }
    }
}

/// A player's projections after stat-kind resolution.
///
/// Built once from a snapshot; read-only for the lifetime of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerProjection {
    pub id: PlayerId,
    pub name: String,
    pub position: Position,
    /// Professional team abbreviation
    pub pro_team: String,
    pub bye_week: Option<u32>,
    /// Season-long point projection
    pub season_points: f64,
    /// Per-game point projection
    pub per_game: f64,
    /// Weekly projections where the provider publishes them
    #[serde(default)]
    pub week_projections: BTreeMap<u32, f64>,
    /// Points actually scored in completed weeks
    #[serde(default)]
    pub actuals: BTreeMap<u32, f64>,
}

impl PlayerProjection {
    /// Actual points for a completed week
    pub fn actual(&self, week: u32) -> Option<f64> {
        self.actuals.get(&week).copied()
    }

    /// Point expectation for a single week before any season-level weighting
    pub fn projection_for_week(&self, week: u32) -> f64 {
        self.week_projections.get(&week).copied().unwrap_or(self.per_game)
    }

    pub fn is_on_bye(&self, week: u32) -> bool {
        self.bye_week == Some(week)
    }
}

/// Draft classification derived from replacement levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerType {
    Starter,
    Bench,
    Undrafted,
}

/// A player annotated with auction economics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub position: Position,
    pub bye_week: Option<u32>,
    pub projection: f64,
    pub per_game: f64,
    /// 1-based rank within position by projection
    pub rank: u32,
    pub vor_starter: f64,
    pub vor_bench: f64,
    pub vor_total: f64,
    /// Relative worth in auction dollars
    pub value: f64,
    /// Dollar cost normalized to total league budget
    pub price: f64,
    pub player_type: PlayerType,
    /// 1 = best value tier
    pub tier: u32,
}

/// Slot a drafted player occupies on the roster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RosterSlot {
    Starter(Position),
    Flex,
    Bench,
}

impl fmt::Display for RosterSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RosterSlot::Starter(position) => write!(f, "{}", position),
            RosterSlot::Flex => f.write_str("FLEX"),
            RosterSlot::Bench => f.write_str("BENCH"),
        }
    }
}

/// A synthetic owner taking part in an auction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftTeam {
    pub id: TeamId,
    pub name: String,
    pub funds: u32,
    pub slots_left: u32,
    /// Players drafted per position
    pub filled: PositionTable<u32>,
    /// Starting slots filled per position
    pub starters_filled: PositionTable<u32>,
    pub flex_filled: u32,
    /// Lower is more aggressive
    pub aggression: u32,
    /// Overall pick number of this team's most recent win
    pub last_pick: Option<u32>,
    pub spent: u32,
    pub starter_spent: u32,
}

impl DraftTeam {
    pub fn new(id: TeamId, name: String, budget: u32, roster_size: u32, aggression: u32) -> Self {
        Self {
            id,
            name,
            funds: budget,
            slots_left: roster_size,
            filled: PositionTable::default(),
            starters_filled: PositionTable::default(),
            flex_filled: 0,
            aggression,
            last_pick: None,
            spent: 0,
            starter_spent: 0,
        }
    }

    pub fn players_drafted(&self) -> u32 {
        self.filled.iter().map(|(_, n)| *n).sum()
    }
}

/// One recorded auction sale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftPick {
    /// 1-based overall pick number
    pub pick: u32,
    pub player: PlayerId,
    pub player_name: String,
    pub position: Position,
    pub nominator: TeamId,
    pub winner: TeamId,
    pub bid: u32,
    pub slot: RosterSlot,
    /// Inflated value at the time of the sale
    pub value: f64,
    /// Inflated price at the time of the sale
    pub price: f64,
}

/// A rostered player's season-level draws for one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub player: PlayerId,
    pub position: Position,
    pub bye_week: Option<u32>,
    /// Weeks the player misses through injury
    pub injured_weeks: BTreeSet<u32>,
    /// Performance multiplier applied to projections
    pub weight: f64,
    /// Simulated per-game scoring mean
    pub expected: f64,
    /// Simulated per-game scoring standard deviation
    pub spread: f64,
}

impl RosterEntry {
    pub fn is_available(&self, week: u32) -> bool {
        self.bye_week != Some(week) && !self.injured_weeks.contains(&week)
    }
}

/// Record carried into a mid-season simulation
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamRecord {
    /// Matchup plus top-half wins
    pub wins: f64,
    pub points: f64,
}

/// One head-to-head pairing and its simulated scores
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Matchup {
    pub home: TeamId,
    pub away: TeamId,
    pub home_score: f64,
    pub away_score: f64,
}

impl Matchup {
    /// Win credit for `team`: 1 for a win, 0.5 for an exact tie, 0 otherwise
    pub fn credit_for(&self, team: TeamId) -> f64 {
        let (mine, theirs) = if team == self.home {
            (self.home_score, self.away_score)
        } else {
            (self.away_score, self.home_score)
        };
        if mine > theirs {
            1.0
        } else if mine == theirs {
            0.5
        } else {
            0.0
        }
    }
}

/// Outcome of one simulated week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekResult {
    pub week: u32,
    /// Score per team, indexed by team id
    pub scores: Vec<f64>,
    pub matchups: Vec<Matchup>,
    /// Matchup credit per team
    pub matchup_wins: Vec<f64>,
    /// Top-half credit per team
    pub top_half: Vec<f64>,
    pub median: f64,
    pub highest: TeamId,
    pub lowest: TeamId,
    /// Lineup slots filled by replacement players
    pub replacements: u32,
}

/// One playoff round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayoffRound {
    pub week: u32,
    pub byes: Vec<TeamId>,
    /// Teams that played, with their scores
    pub scores: Vec<(TeamId, f64)>,
    pub advancing: Vec<TeamId>,
}

/// Season summary for one team in one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamSeason {
    pub team: TeamId,
    pub matchup_wins: f64,
    pub top_half_wins: f64,
    /// Matchup plus top-half wins, including any prior record
    pub wins: f64,
    pub points: f64,
    /// Final standing after seeding (1 = first seed)
    pub rank: u32,
    pub made_playoffs: bool,
    pub made_finals: bool,
    pub champion: bool,
    pub runner_up: bool,
    pub third: bool,
}

/// Full outcome of one simulated season
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonOutcome {
    pub teams: Vec<TeamSeason>,
    pub weeks: Vec<WeekResult>,
    /// Team ids in seed order
    pub seeds: Vec<TeamId>,
    pub playoffs: Vec<PlayoffRound>,
    /// Regular-season points scored in starting lineups per player
    pub player_points: BTreeMap<PlayerId, f64>,
}

impl SeasonOutcome {
    pub fn champion(&self) -> Option<TeamId> {
        self.teams.iter().find(|t| t.champion).map(|t| t.team)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_parse() {
        assert_eq!("qb".parse::<Position>().unwrap(), Position::QB);
        assert_eq!("D/ST".parse::<Position>().unwrap(), Position::DST);
        assert!("K".parse::<Position>().is_err());
    }

    #[test]
    fn test_matchup_credit() {
        let m = Matchup { home: 0, away: 1, home_score: 101.5, away_score: 99.0 };
        assert_eq!(m.credit_for(0), 1.0);
        assert_eq!(m.credit_for(1), 0.0);

        let tie = Matchup { home: 2, away: 3, home_score: 88.0, away_score: 88.0 };
        assert_eq!(tie.credit_for(2), 0.5);
        assert_eq!(tie.credit_for(3), 0.5);
    }

    #[test]
    fn test_roster_entry_availability() {
        let entry = RosterEntry {
            player: 7,
            position: Position::WR,
            bye_week: Some(9),
            injured_weeks: [3, 4].into_iter().collect(),
            weight: 1.0,
            expected: 12.0,
            spread: 4.8,
        };
        assert!(entry.is_available(1));
        assert!(!entry.is_available(3));
        assert!(!entry.is_available(9));
    }
}
