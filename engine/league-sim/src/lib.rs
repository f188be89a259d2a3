//! # LeagueSim
//!
//! Monte-Carlo engine for salary-cap auction fantasy football leagues.
//!
//! A player pool is valued against replacement level, teams draft it in a
//! simulated nomination auction, and the resulting rosters play out seasons
//! of head-to-head and top-half scoring with injuries, byes and playoffs.
//! Batches of independent runs are folded into win, rank, playoff and
//! payout distributions, single-week odds and bid statistics.

pub mod aggregator;
pub mod auction;
pub mod config;
pub mod error;
pub mod lineup;
pub mod metrics;
pub mod models;
pub mod odds;
pub mod report;
pub mod sampler;
pub mod season;
pub mod snapshot;
pub mod synthetic;
pub mod valuation;



pub use aggregator::{run_seed, Aggregator, BatchOptions, BatchSummary, RunRecord, SimulationPlan};
pub use auction::{AuctionOutcome, AuctionPhase, AuctionSimulator, AuctionState};
pub use config::{
    AuctionConfig, BidDistribution, FlexSelection, LeagueConfig, Payouts, PlayoffFormat,
    PositionTable, RosterConfig, ScoreModel, SeasonConfig,
};
pub use error::{Result, SimError};
pub use lineup::{Lineup, LineupResolver};
pub use metrics::{MetricsSnapshot, SimMetrics};
pub use models::{
    DraftPick, DraftTeam, Player, PlayerId, PlayerProjection, Position, RosterEntry, RosterSlot,
    SeasonOutcome, TeamId, TeamRecord, WeekResult,
};
pub use odds::{american_odds, Odds};
pub use report::{BatchReport, SummaryRecord};
pub use sampler::OutcomeSampler;
pub use season::{Schedule, SeasonInput, SeasonSimulator, SeasonTeam};
pub use snapshot::LeagueSnapshot;
pub use valuation::{ValueCalculator, ValuedPool};

/// Current version of LeagueSim
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default league size
pub const DEFAULT_TEAMS: usize = 10;

/// Default auction budget per team in dollars
pub const DEFAULT_BUDGET: u32 = 200;

/// Default minimum bid
pub const DEFAULT_MIN_BID: u32 = 1;

/// Default regular-season length in weeks
pub const DEFAULT_REGULAR_WEEKS: u32 = 14;

/// Default scoring-season length in weeks, playoffs included
pub const DEFAULT_SEASON_LENGTH: u32 = 18;

/// Default runs per batch
pub const DEFAULT_RUNS: u64 = 1000;
