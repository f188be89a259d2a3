//! League configuration
//!
//! One explicit configuration object is passed into every component. Nothing
//! in the engine reads process-wide state.

use crate::error::{Result, SimError};
use crate::models::Position;
use crate::{DEFAULT_BUDGET, DEFAULT_MIN_BID, DEFAULT_REGULAR_WEEKS, DEFAULT_SEASON_LENGTH, DEFAULT_TEAMS};
use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};
use std::path::Path;

/// A value per fantasy position
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PositionTable<T> {
    #[serde(rename = "QB", alias = "qb")]
    pub qb: T,
    #[serde(rename = "RB", alias = "rb")]
    pub rb: T,
    #[serde(rename = "WR", alias = "wr")]
    pub wr: T,
    #[serde(rename = "TE", alias = "te")]
    pub te: T,
    #[serde(rename = "DST", alias = "dst")]
    pub dst: T,
}

impl<T> PositionTable<T> {
    pub fn new(qb: T, rb: T, wr: T, te: T, dst: T) -> Self {
        Self { qb, rb, wr, te, dst }
    }

    /// Build a table by evaluating `f` for every position
    pub fn from_fn(mut f: impl FnMut(Position) -> T) -> Self {
        Self {
            qb: f(Position::QB),
            rb: f(Position::RB),
            wr: f(Position::WR),
            te: f(Position::TE),
            dst: f(Position::DST),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Position, &T)> + '_ {
        Position::ALL.into_iter().map(move |p| (p, &self[p]))
    }
}

impl<T> Index<Position> for PositionTable<T> {
    type Output = T;

    fn index(&self, position: Position) -> &T {
        match position {
            Position::QB => &self.qb,
            Position::RB => &self.rb,
            Position::WR => &self.wr,
            Position::TE => &self.te,
            Position::DST => &self.dst,
        }
    }
}

impl<T> IndexMut<Position> for PositionTable<T> {
    fn index_mut(&mut self, position: Position) -> &mut T {
        match position {
            Position::QB => &mut self.qb,
            Position::RB => &mut self.rb,
            Position::WR => &mut self.wr,
            Position::TE => &mut self.te,
            Position::DST => &mut self.dst,
        }
    }
}

/// Top-level league configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LeagueConfig {
    /// Roster construction and budget
    pub roster: RosterConfig,

    /// Auction behaviour
    pub auction: AuctionConfig,

    /// Season and playoff structure, scoring model
    pub season: SeasonConfig,
}

/// Roster construction rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterConfig {
    /// Number of teams in the league
    pub teams: usize,

    /// Auction budget per team in dollars
    pub budget: u32,

    /// Minimum bid per player in dollars
    pub min_bid: u32,

    /// Starting slots per position
    pub starters: PositionTable<u32>,

    /// Number of flex slots
    pub flex_slots: u32,

    /// Positions eligible for a flex slot
    pub flex_positions: Vec<Position>,

    /// Bench slots per team
    pub bench_slots: u32,

    /// Expected bench players per team at each position (sums to `bench_slots`)
    pub bench_share: PositionTable<f64>,

    /// Hard cap on players per position per team
    pub max_slots: PositionTable<u32>,

    /// Optional display names, indexed by team id
    pub team_names: Vec<String>,
}

/// How the opening bid is drawn between price and value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BidDistribution {
    Uniform,
    /// Mode midway between price and value
    Triangular,
}

/// Coefficients of the appetite score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppetiteWeights {
    /// Divisor applied to a player's share of remaining tier VOR
    pub tier_share_divisor: f64,

    /// Divisor applied to picks since the team's last win
    pub recency_divisor: f64,
}

/// Auction behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuctionConfig {
    /// Share of spendable dollars that goes to starters
    pub starter_allocation: f64,

    /// Number of top remaining players nominations are drawn from
    pub shortlist_size: usize,

    pub bid_distribution: BidDistribution,

    /// Offset added to the competition factor when drawing an opening bid
    pub competition_offset: f64,

    /// Aggression levels a team may draw (lower is more aggressive)
    pub aggression_levels: Vec<u32>,

    /// Draw weights matching `aggression_levels`
    pub aggression_weights: Vec<f64>,

    pub appetite: AppetiteWeights,

    /// Number of VOR tiers used for positional scarcity
    pub value_tiers: usize,

    /// Players projected at or below this many points per game are not valued
    pub min_per_game: f64,
}

/// Playoff advancement rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayoffFormat {
    /// Every live team scores; the top half by score advance
    TopHalf,
    /// Seeded head-to-head pairings, reseeded every round
    Bracket,
}

/// How the flex slot is filled from the remaining eligible players
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlexSelection {
    /// Random draw weighted by expected points
    Weighted,
    /// Highest expected points
    Best,
}

/// Weekly point distribution family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreModel {
    /// Shifted gamma with a per-position shape
    Gamma,
    /// Normal with a per-position spread ratio
    Normal,
}

/// Gamma parameters for a position's weekly scoring
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GammaParams {
    pub shape: f64,
    pub loc: f64,
    pub scale: f64,
}

impl GammaParams {
    pub fn mean(&self) -> f64 {
        self.loc + self.shape * self.scale
    }
}

/// Normal parameters for a season-long performance multiplier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightParams {
    pub mean: f64,
    pub sd: f64,
}

/// League prize money used for expected payout
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Payouts {
    pub champion: f64,
    pub runner_up: f64,
    pub third: f64,
}

/// Season structure and scoring model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeasonConfig {
    /// Regular-season weeks
    pub regular_weeks: u32,

    /// Total weeks in the professional season (injury ceiling)
    pub season_length: u32,

    /// Playoff field size
    pub playoff_teams: usize,

    /// Top seeds that skip the first playoff round
    pub playoff_byes: usize,

    /// Playoff spots awarded by points rather than wins
    pub wildcards: usize,

    pub playoff_format: PlayoffFormat,

    pub flex_selection: FlexSelection,

    /// Free agents averaged into the replacement player
    pub replacement_top_n: usize,

    pub score_model: ScoreModel,

    /// Minimum standard deviation / scale used by the sampler
    pub variance_floor: f64,

    pub gamma: PositionTable<GammaParams>,

    /// Mean games missed per season
    pub injury_mean_games: PositionTable<f64>,

    pub weight: PositionTable<WeightParams>,

    /// Weekly standard deviation as a fraction of per-game projection
    pub sd_ratio: PositionTable<f64>,

    pub payouts: Payouts,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            teams: DEFAULT_TEAMS,
            budget: DEFAULT_BUDGET,
            min_bid: DEFAULT_MIN_BID,
            starters: PositionTable::new(1, 2, 3, 1, 1),
            flex_slots: 1,
            flex_positions: vec![Position::RB, Position::WR],
            bench_slots: 6,
            bench_share: PositionTable::new(0.5, 2.5, 2.5, 0.5, 0.0),
            max_slots: PositionTable::new(2, 7, 8, 2, 1),
            team_names: Vec::new(),
        }
    }
}

impl Default for AppetiteWeights {
    fn default() -> Self {
        Self { tier_share_divisor: 0.5, recency_divisor: 10.0 }
    }
}

impl Default for AuctionConfig {
    fn default() -> Self {
        Self {
            starter_allocation: 0.8,
            shortlist_size: 10,
            bid_distribution: BidDistribution::Uniform,
            competition_offset: 0.2,
            aggression_levels: vec![1, 2, 3],
            aggression_weights: vec![0.2, 0.6, 0.2],
            appetite: AppetiteWeights::default(),
            value_tiers: 10,
            min_per_game: 1.0,
        }
    }
}

impl Default for Payouts {
    fn default() -> Self {
        Self { champion: 870.0, runner_up: 430.0, third: 170.0 }
    }
}

impl Default for SeasonConfig {
    fn default() -> Self {
        Self {
            regular_weeks: DEFAULT_REGULAR_WEEKS,
            season_length: DEFAULT_SEASON_LENGTH,
            playoff_teams: 6,
            playoff_byes: 2,
            wildcards: 1,
            playoff_format: PlayoffFormat::TopHalf,
            flex_selection: FlexSelection::Weighted,
            replacement_top_n: 3,
            score_model: ScoreModel::Gamma,
            variance_floor: 0.5,
            gamma: PositionTable::new(
                GammaParams { shape: 6.0, loc: 2.0, scale: 2.5 },
                GammaParams { shape: 2.5, loc: 0.0, scale: 4.4 },
                GammaParams { shape: 2.3, loc: 0.0, scale: 4.8 },
                GammaParams { shape: 2.0, loc: 0.0, scale: 4.2 },
                GammaParams { shape: 3.0, loc: -2.0, scale: 3.0 },
            ),
            injury_mean_games: PositionTable::new(2.1, 2.9, 2.2, 1.6, 0.0),
            weight: PositionTable::new(
                WeightParams { mean: 0.9667, sd: 0.1690 },
                WeightParams { mean: 1.0407, sd: 0.3855 },
                WeightParams { mean: 1.0267, sd: 0.2586 },
                WeightParams { mean: 0.9795, sd: 0.2370 },
                WeightParams { mean: 1.0, sd: 0.0 },
            ),
            sd_ratio: PositionTable::new(0.2, 0.4, 0.4, 0.4, 0.4),
            payouts: Payouts::default(),
        }
    }
}

impl RosterConfig {
    /// Starting slots per team, flex included
    pub fn starter_slots(&self) -> u32 {
        self.starters.iter().map(|(_, n)| *n).sum::<u32>() + self.flex_slots
    }

    /// Total roster size per team
    pub fn roster_size(&self) -> u32 {
        self.starter_slots() + self.bench_slots
    }

    /// Total auction dollars in the league
    pub fn total_dollars(&self) -> u32 {
        self.budget * self.teams as u32
    }

    pub fn is_flex(&self, position: Position) -> bool {
        self.flex_slots > 0 && self.flex_positions.contains(&position)
    }

    /// Display name for a team
    pub fn team_name(&self, team: usize) -> String {
        self.team_names.get(team).cloned().unwrap_or_else(|| format!("Team {}", team + 1))
    }
}

impl SeasonConfig {
    /// Number of playoff rounds implied by the field size and byes
    pub fn playoff_rounds(&self) -> Result<u32> {
        let field = self.playoff_teams;
        let byes = self.playoff_byes;
        if field < 2 {
            return Err(SimError::InvalidBracket(format!(
                "playoff field of {} cannot produce a final",
                field
            )));
        }
        if byes >= field {
            return Err(SimError::InvalidBracket(format!(
                "{} byes leave nobody to play in a field of {}",
                byes, field
            )));
        }
        let playing = field - byes;
        if playing % 2 != 0 {
            return Err(SimError::InvalidBracket(format!(
                "{} teams play the first round; an even number is required",
                playing
            )));
        }
        let second_round = playing / 2 + byes;
        if !second_round.is_power_of_two() {
            return Err(SimError::InvalidBracket(format!(
                "{} teams reach the second round; a power of two is required",
                second_round
            )));
        }
        Ok(1 + second_round.trailing_zeros())
    }

    /// Week number of the final playoff round
    pub fn final_week(&self) -> Result<u32> {
        Ok(self.regular_weeks + self.playoff_rounds()?)
    }
}

impl LeagueConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check every rule that must hold before a batch may start
    pub fn validate(&self) -> Result<()> {
        let roster = &self.roster;
        let auction = &self.auction;
        let season = &self.season;

        if roster.teams < 2 {
            return Err(SimError::Config(format!("at least 2 teams required, got {}", roster.teams)));
        }
        if roster.teams % 2 != 0 {
            return Err(SimError::Config(format!(
                "head-to-head weeks need an even number of teams, got {}",
                roster.teams
            )));
        }
        if roster.min_bid == 0 {
            return Err(SimError::Config("min_bid must be at least 1".to_string()));
        }
        if roster.roster_size() == 0 {
            return Err(SimError::Config("roster has no slots".to_string()));
        }
        let required = roster.roster_size() * roster.min_bid;
        if roster.budget < required {
            return Err(SimError::BudgetTooSmall { budget: roster.budget, required });
        }
        if roster.flex_slots > 0 && roster.flex_positions.is_empty() {
            return Err(SimError::Config("flex slots configured without eligible positions".to_string()));
        }
        for (position, starters) in roster.starters.iter() {
            if roster.max_slots[position] < *starters {
                return Err(SimError::Config(format!(
                    "max_slots for {} ({}) is below its starters ({})",
                    position, roster.max_slots[position], starters
                )));
            }
            if roster.bench_share[position] < 0.0 {
                return Err(SimError::Config(format!("negative bench share for {}", position)));
            }
        }
        let max_total: u32 = roster.max_slots.iter().map(|(_, n)| *n).sum();
        if max_total < roster.roster_size() {
            return Err(SimError::Config(format!(
                "max_slots allow {} players but rosters hold {}",
                max_total,
                roster.roster_size()
            )));
        }
        let share_total: f64 = roster.bench_share.iter().map(|(_, s)| *s).sum();
        if (share_total - roster.bench_slots as f64).abs() > 1e-6 {
            return Err(SimError::Config(format!(
                "bench shares sum to {} but there are {} bench slots",
                share_total, roster.bench_slots
            )));
        }

        if !(auction.starter_allocation > 0.0 && auction.starter_allocation <= 1.0) {
            return Err(SimError::Config(format!(
                "starter_allocation must be in (0, 1], got {}",
                auction.starter_allocation
            )));
        }
        if auction.shortlist_size == 0 {
            return Err(SimError::Config("shortlist_size must be at least 1".to_string()));
        }
        if auction.aggression_levels.is_empty()
            || auction.aggression_levels.len() != auction.aggression_weights.len()
        {
            return Err(SimError::Config(
                "aggression_levels and aggression_weights must be non-empty and the same length"
                    .to_string(),
            ));
        }
        if auction.aggression_weights.iter().any(|w| !w.is_finite() || *w < 0.0)
            || auction.aggression_weights.iter().sum::<f64>() <= 0.0
        {
            return Err(SimError::Config("aggression_weights must be non-negative with a positive sum".to_string()));
        }
        if auction.value_tiers == 0 {
            return Err(SimError::Config("value_tiers must be at least 1".to_string()));
        }
        if auction.appetite.tier_share_divisor <= 0.0 || auction.appetite.recency_divisor <= 0.0 {
            return Err(SimError::Config("appetite divisors must be positive".to_string()));
        }

        if season.regular_weeks == 0 {
            return Err(SimError::Config("regular_weeks must be at least 1".to_string()));
        }
        if season.playoff_teams > roster.teams {
            return Err(SimError::InvalidBracket(format!(
                "playoff field of {} exceeds {} teams",
                season.playoff_teams, roster.teams
            )));
        }
        if season.wildcards > season.playoff_teams {
            return Err(SimError::InvalidBracket(format!(
                "{} wild cards exceed a field of {}",
                season.wildcards, season.playoff_teams
            )));
        }
        let final_week = season.final_week()?;
        if final_week > season.season_length {
            return Err(SimError::Config(format!(
                "playoffs end in week {} but the season has {} weeks",
                final_week, season.season_length
            )));
        }
        if season.replacement_top_n == 0 {
            return Err(SimError::Config("replacement_top_n must be at least 1".to_string()));
        }
        if !(season.variance_floor > 0.0) {
            return Err(SimError::Config("variance_floor must be positive".to_string()));
        }

        Ok(())
    }
}
