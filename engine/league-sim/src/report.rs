//! Batch reports
//!
//! Turns the integer tallies of a batch into probability tables, moments
//! and flat `(team, week, metric, value)` records for downstream storage.

use crate::aggregator::{BatchSummary, TeamTally, SPEND_BUCKETS};
use crate::config::Payouts;
use crate::metrics::MetricsSnapshot;
use crate::models::{PlayerId, Position, TeamId};
use crate::odds::{american_odds, Odds};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::time::Duration;

/// Mean and population standard deviation from a sum and sum of squares
/// kept in units of `1/scale`
fn moments(sum: f64, sum_sq: f64, n: u64, scale: f64) -> (f64, f64) {
    if n == 0 {
        return (0.0, 0.0);
    }
    let n = n as f64;
    let mean = sum / n / scale;
    let second = sum_sq / n / (scale * scale);
    (mean, (second - mean * mean).max(0.0).sqrt())
}

fn ratio(count: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

/// Pearson correlation from integer sums
fn pearson(n: u64, sx: i128, sy: i128, sxx: i128, syy: i128, sxy: i128) -> Option<f64> {
    if n < 2 {
        return None;
    }
    let n = n as f64;
    let (sx, sy, sxx, syy, sxy) = (sx as f64, sy as f64, sxx as f64, syy as f64, sxy as f64);
    let cov = n * sxy - sx * sy;
    let var_x = n * sxx - sx * sx;
    let var_y = n * syy - sy * sy;
    if var_x <= 0.0 || var_y <= 0.0 {
        return None;
    }
    Some(cov / (var_x * var_y).sqrt())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WinDistributionRow {
    pub team: TeamId,
    pub name: String,
    pub wins: f64,
    pub probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankDistributionRow {
    pub team: TeamId,
    pub name: String,
    pub rank: u32,
    pub probability: f64,
}

/// Season outlook for one team
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayoffOddsRow {
    pub team: TeamId,
    pub name: String,
    pub mean_wins: f64,
    pub sd_wins: f64,
    pub mean_points: f64,
    pub sd_points: f64,
    pub mean_rank: f64,
    pub sd_rank: f64,
    pub playoffs: f64,
    pub finals: f64,
    pub champion: f64,
    pub runner_up: f64,
    pub third: f64,
    pub expected_payout: f64,
    pub playoff_odds: Odds,
    pub champion_odds: Odds,
}

/// Single-week outlook for one team
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekOddsRow {
    pub team: TeamId,
    pub name: String,
    pub mean_score: f64,
    /// Expected head-to-head credit, ties counting half
    pub win: f64,
    pub top_half: f64,
    pub highest: f64,
    pub lowest: f64,
    pub win_odds: Odds,
    pub highest_odds: Odds,
}

/// Winning-bid statistics for one player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerBidRow {
    pub player: PlayerId,
    pub name: String,
    pub position: Position,
    pub draft_rate: f64,
    pub mean_bid: f64,
    pub sd_bid: f64,
    pub mean_value: f64,
    /// Mean season lineup points when a season followed the auction
    pub mean_points: Option<f64>,
    pub points_per_dollar: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamSpendRow {
    pub team: TeamId,
    pub name: String,
    pub mean_spent: f64,
    pub mean_starter_share: f64,
    pub mean_unspent: f64,
}

/// How starter spend share relates to season results
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpendCorrelation {
    pub samples: u64,
    pub points: Option<f64>,
    pub playoffs: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendBucketRow {
    pub share_low: f64,
    pub share_high: f64,
    pub teams: u64,
    pub playoff_rate: f64,
    pub mean_points: f64,
}

/// One flat output record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub team: Option<TeamId>,
    pub week: u32,
    pub metric: String,
    pub value: f64,
}

impl SummaryRecord {
    fn team(team: TeamId, week: u32, metric: impl Into<String>, value: f64) -> Self {
        Self { team: Some(team), week, metric: metric.into(), value }
    }

    fn league(week: u32, metric: impl Into<String>, value: f64) -> Self {
        Self { team: None, week, metric: metric.into(), value }
    }
}

/// Result of a batch
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub plan: String,
    /// Week the results are reported against (0 before the season)
    pub week: u32,
    pub requested_runs: u64,
    pub completed_runs: u64,
    /// Stopped by cancellation or deadline before all runs finished
    pub cancelled: bool,
    pub seed: u64,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
    pub payouts: Payouts,
    pub metrics: MetricsSnapshot,
    pub summary: BatchSummary,
}

impl BatchReport {
    fn season_teams(&self) -> impl Iterator<Item = &TeamTally> {
        self.summary.teams.iter().filter(|t| t.seasons > 0)
    }

    pub fn win_distribution(&self) -> Vec<WinDistributionRow> {
        self.season_teams()
            .flat_map(|t| {
                t.win_histogram.iter().enumerate().map(move |(half, &count)| WinDistributionRow {
                    team: t.team,
                    name: t.name.clone(),
                    wins: half as f64 / 2.0,
                    probability: ratio(count, t.seasons),
                })
            })
            .collect()
    }

    pub fn rank_distribution(&self) -> Vec<RankDistributionRow> {
        self.season_teams()
            .flat_map(|t| {
                t.rank_histogram.iter().enumerate().map(move |(i, &count)| RankDistributionRow {
                    team: t.team,
                    name: t.name.clone(),
                    rank: i as u32 + 1,
                    probability: ratio(count, t.seasons),
                })
            })
            .collect()
    }

    pub fn playoff_odds(&self) -> Vec<PlayoffOddsRow> {
        self.season_teams()
            .map(|t| {
                let (mean_wins, sd_wins) =
                    moments(t.wins_half_sum as f64, t.wins_half_sq as f64, t.seasons, 2.0);
                let (mean_points, sd_points) =
                    moments(t.points_centi_sum as f64, t.points_centi_sq as f64, t.seasons, 100.0);
                let (mean_rank, sd_rank) =
                    moments(t.rank_sum as f64, t.rank_sq as f64, t.seasons, 1.0);
                let playoffs = ratio(t.playoffs, t.seasons);
                let champion = ratio(t.champion, t.seasons);
                let runner_up = ratio(t.runner_up, t.seasons);
                let third = ratio(t.third, t.seasons);
                PlayoffOddsRow {
                    team: t.team,
                    name: t.name.clone(),
                    mean_wins,
                    sd_wins,
                    mean_points,
                    sd_points,
                    mean_rank,
                    sd_rank,
                    playoffs,
                    finals: ratio(t.finals, t.seasons),
                    champion,
                    runner_up,
                    third,
                    expected_payout: champion * self.payouts.champion
                        + runner_up * self.payouts.runner_up
                        + third * self.payouts.third,
                    playoff_odds: american_odds(playoffs),
                    champion_odds: american_odds(champion),
                }
            })
            .collect()
    }

    pub fn week_odds(&self) -> Vec<WeekOddsRow> {
        self.summary
            .teams
            .iter()
            .filter(|t| t.weeks > 0)
            .map(|t| {
                let win = t.week_wins_half as f64 / 2.0 / t.weeks as f64;
                let highest = ratio(t.week_highest, t.weeks);
                WeekOddsRow {
                    team: t.team,
                    name: t.name.clone(),
                    mean_score: t.week_points_centi as f64 / 100.0 / t.weeks as f64,
                    win,
                    top_half: t.week_top_half_half as f64 / 2.0 / t.weeks as f64,
                    highest,
                    lowest: ratio(t.week_lowest, t.weeks),
                    win_odds: american_odds(win),
                    highest_odds: american_odds(highest),
                }
            })
            .collect()
    }

    /// Drafted players, most expensive first
    pub fn player_bids(&self) -> Vec<PlayerBidRow> {
        let auctions = self.summary.auction.auctions;
        let mut rows: Vec<PlayerBidRow> = self
            .summary
            .players
            .iter()
            .map(|(&player, tally)| {
                let (mean_bid, sd_bid) =
                    moments(tally.bid_sum as f64, tally.bid_sq as f64, tally.drafted, 1.0);
                let mean_points = (tally.seasons > 0)
                    .then(|| tally.points_centi as f64 / 100.0 / tally.seasons as f64);
                PlayerBidRow {
                    player,
                    name: tally.name.clone(),
                    position: tally.position,
                    draft_rate: ratio(tally.drafted, auctions),
                    mean_bid,
                    sd_bid,
                    mean_value: tally.value_centi as f64 / 100.0 / tally.drafted.max(1) as f64,
                    mean_points,
                    points_per_dollar: mean_points
                        .filter(|_| mean_bid > 0.0)
                        .map(|points| points / mean_bid),
                }
            })
            .collect();
        rows.sort_by(|a, b| {
            b.mean_bid.partial_cmp(&a.mean_bid).unwrap_or(Ordering::Equal).then(a.player.cmp(&b.player))
        });
        rows
    }

    pub fn team_spend(&self) -> Vec<TeamSpendRow> {
        self.summary
            .teams
            .iter()
            .filter(|t| t.auctions > 0)
            .map(|t| TeamSpendRow {
                team: t.team,
                name: t.name.clone(),
                mean_spent: t.spent_sum as f64 / t.auctions as f64,
                mean_starter_share: ratio(t.starter_spent_sum, t.spent_sum),
                mean_unspent: t.unspent_sum as f64 / t.auctions as f64,
            })
            .collect()
    }

    pub fn spend_correlation(&self) -> SpendCorrelation {
        let s = &self.summary.spend;
        SpendCorrelation {
            samples: s.samples,
            points: pearson(
                s.samples,
                s.sum_share,
                s.sum_points,
                s.sum_share_sq,
                s.sum_points_sq,
                s.sum_share_points,
            ),
            // playoffs is 0/1 so its sum of squares is its sum
            playoffs: pearson(
                s.samples,
                s.sum_share,
                s.sum_playoffs,
                s.sum_share_sq,
                s.sum_playoffs,
                s.sum_share_playoffs,
            ),
        }
    }

    pub fn spend_buckets(&self) -> Vec<SpendBucketRow> {
        self.summary
            .spend
            .buckets
            .iter()
            .enumerate()
            .map(|(i, bucket)| SpendBucketRow {
                share_low: i as f64 / SPEND_BUCKETS as f64,
                share_high: (i + 1) as f64 / SPEND_BUCKETS as f64,
                teams: bucket.teams,
                playoff_rate: ratio(bucket.playoffs, bucket.teams),
                mean_points: if bucket.teams == 0 {
                    0.0
                } else {
                    bucket.points_centi as f64 / 100.0 / bucket.teams as f64
                },
            })
            .collect()
    }

    /// Every table flattened into records
    pub fn records(&self) -> Vec<SummaryRecord> {
        let week = self.week;
        let mut records = Vec::new();

        for row in self.playoff_odds() {
            for (metric, value) in [
                ("mean_wins", row.mean_wins),
                ("sd_wins", row.sd_wins),
                ("mean_points", row.mean_points),
                ("sd_points", row.sd_points),
                ("mean_rank", row.mean_rank),
                ("sd_rank", row.sd_rank),
                ("playoffs", row.playoffs),
                ("finals", row.finals),
                ("champion", row.champion),
                ("runner_up", row.runner_up),
                ("third", row.third),
                ("expected_payout", row.expected_payout),
            ] {
                records.push(SummaryRecord::team(row.team, week, metric, value));
            }
        }
        for row in self.win_distribution().into_iter().filter(|r| r.probability > 0.0) {
            records.push(SummaryRecord::team(
                row.team,
                week,
                format!("wins_{}", row.wins),
                row.probability,
            ));
        }
        for row in self.rank_distribution().into_iter().filter(|r| r.probability > 0.0) {
            records.push(SummaryRecord::team(
                row.team,
                week,
                format!("rank_{}", row.rank),
                row.probability,
            ));
        }

        for row in self.week_odds() {
            for (metric, value) in [
                ("week_mean_score", row.mean_score),
                ("week_win", row.win),
                ("week_top_half", row.top_half),
                ("week_highest", row.highest),
                ("week_lowest", row.lowest),
            ] {
                records.push(SummaryRecord::team(row.team, week, metric, value));
            }
        }

        for row in self.team_spend() {
            records.push(SummaryRecord::team(row.team, week, "mean_spent", row.mean_spent));
            records.push(SummaryRecord::team(row.team, week, "starter_share", row.mean_starter_share));
            records.push(SummaryRecord::team(row.team, week, "mean_unspent", row.mean_unspent));
        }

        let auction = &self.summary.auction;
        if auction.auctions > 0 {
            records.push(SummaryRecord::league(
                week,
                "auction_complete_rate",
                ratio(auction.complete, auction.auctions),
            ));
            records.push(SummaryRecord::league(
                week,
                "mean_unspent",
                auction.unspent_sum as f64 / auction.auctions as f64,
            ));
            records.push(SummaryRecord::league(week, "max_unspent", auction.unspent_max as f64));
            for row in self.player_bids() {
                let prefix = format!("player_{}", row.player);
                records.push(SummaryRecord::league(week, format!("{}_mean_bid", prefix), row.mean_bid));
                records.push(SummaryRecord::league(week, format!("{}_draft_rate", prefix), row.draft_rate));
            }
        }

        let correlation = self.spend_correlation();
        if let Some(r) = correlation.points {
            records.push(SummaryRecord::league(week, "starter_share_points_r", r));
        }
        if let Some(r) = correlation.playoffs {
            records.push(SummaryRecord::league(week, "starter_share_playoffs_r", r));
        }

        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moments() {
        // values 1, 2, 3 stored in halves: 2, 4, 6
        let (mean, sd) = moments(12.0, 56.0, 3, 2.0);
        assert!((mean - 2.0).abs() < 1e-12);
        assert!((sd - (2.0f64 / 3.0).sqrt()).abs() < 1e-12);
        assert_eq!(moments(0.0, 0.0, 0, 1.0), (0.0, 0.0));
    }

    #[test]
    fn test_pearson_perfect_and_degenerate() {
        // x = 1,2,3; y = 2,4,6
        let r = pearson(3, 6, 12, 14, 56, 28).unwrap();
        assert!((r - 1.0).abs() < 1e-12);
        // constant x
        assert_eq!(pearson(3, 3, 12, 3, 56, 12), None);
        assert_eq!(pearson(1, 1, 1, 1, 1, 1), None);
    }
}
