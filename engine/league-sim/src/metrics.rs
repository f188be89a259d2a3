//! Metrics collection for simulation batches
//!
//! Per-run degeneracies never abort a batch. They are counted here so a
//! caller can tell how often a fallback policy kicked in.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time copy of all counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Simulation runs finished
    pub runs_completed: u64,

    /// Auctions simulated
    pub auctions: u64,

    /// Seasons simulated
    pub seasons: u64,

    /// Weeks simulated, regular season and playoffs
    pub weeks: u64,

    /// Players sold at auction
    pub players_sold: u64,

    /// Nominated players nobody could afford
    pub players_discarded: u64,

    /// $1 bid reductions while looking for an eligible team
    pub bid_decrements: u64,

    /// Auctions that ran out of nominatable players with slots still open
    pub incomplete_auctions: u64,

    /// Appetite draws that fell back to a uniform choice
    pub appetite_fallbacks: u64,

    /// Lineup slots filled by a replacement player
    pub replacement_substitutions: u64,

    /// Sampling parameters raised to the variance floor
    pub variance_clamps: u64,

    /// Matchups that ended in an exact tie
    pub score_ties: u64,
}

/// Thread-safe counters shared by every worker in a batch
#[derive(Debug, Default)]
pub struct SimMetrics {
    runs_completed: AtomicU64,
    auctions: AtomicU64,
    seasons: AtomicU64,
    weeks: AtomicU64,
    players_sold: AtomicU64,
    players_discarded: AtomicU64,
    bid_decrements: AtomicU64,
    incomplete_auctions: AtomicU64,
    appetite_fallbacks: AtomicU64,
    replacement_substitutions: AtomicU64,
    variance_clamps: AtomicU64,
    score_ties: AtomicU64,
}

impl SimMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_run(&self) {
        self.runs_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_auction(&self) {
        self.auctions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_season(&self) {
        self.seasons.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_week(&self) {
        self.weeks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sale(&self) {
        self.players_sold.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_discard(&self) {
        self.players_discarded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_bid_decrements(&self, count: u64) {
        if count > 0 {
            self.bid_decrements.fetch_add(count, Ordering::Relaxed);
        }
    }

    pub fn record_incomplete_auction(&self) {
        self.incomplete_auctions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_appetite_fallback(&self) {
        self.appetite_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_replacements(&self, count: u64) {
        if count > 0 {
            self.replacement_substitutions.fetch_add(count, Ordering::Relaxed);
        }
    }

    pub fn record_variance_clamp(&self) {
        self.variance_clamps.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_tie(&self) {
        self.score_ties.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            runs_completed: self.runs_completed.load(Ordering::Relaxed),
            auctions: self.auctions.load(Ordering::Relaxed),
            seasons: self.seasons.load(Ordering::Relaxed),
            weeks: self.weeks.load(Ordering::Relaxed),
            players_sold: self.players_sold.load(Ordering::Relaxed),
            players_discarded: self.players_discarded.load(Ordering::Relaxed),
            bid_decrements: self.bid_decrements.load(Ordering::Relaxed),
            incomplete_auctions: self.incomplete_auctions.load(Ordering::Relaxed),
            appetite_fallbacks: self.appetite_fallbacks.load(Ordering::Relaxed),
            replacement_substitutions: self.replacement_substitutions.load(Ordering::Relaxed),
            variance_clamps: self.variance_clamps.load(Ordering::Relaxed),
            score_ties: self.score_ties.load(Ordering::Relaxed),
        }
    }
}
