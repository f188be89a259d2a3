//! Report rendering for the command line

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use league_sim::report::{
    PlayerBidRow, PlayoffOddsRow, SpendBucketRow, SpendCorrelation, TeamSpendRow, WeekOddsRow,
};
use league_sim::{BatchReport, MetricsSnapshot, SummaryRecord};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Rows shown in the bid table
const TOP_PLAYERS: usize = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable tables
    Table,
    /// One JSON document
    Json,
    /// Flat summary records, one JSON object per line
    Records,
}

/// Serializable view of a batch report
#[derive(Debug, Serialize)]
pub struct ReportDocument {
    pub plan: String,
    pub week: u32,
    pub seed: u64,
    pub requested_runs: u64,
    pub completed_runs: u64,
    pub cancelled: bool,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u128,
    pub metrics: MetricsSnapshot,
    pub playoff_odds: Vec<PlayoffOddsRow>,
    pub week_odds: Vec<WeekOddsRow>,
    pub team_spend: Vec<TeamSpendRow>,
    pub player_bids: Vec<PlayerBidRow>,
    pub spend_correlation: SpendCorrelation,
    pub spend_buckets: Vec<SpendBucketRow>,
    pub records: Vec<SummaryRecord>,
}

impl ReportDocument {
    pub fn from_report(report: &BatchReport) -> Self {
        Self {
            plan: report.plan.clone(),
            week: report.week,
            seed: report.seed,
            requested_runs: report.requested_runs,
            completed_runs: report.completed_runs,
            cancelled: report.cancelled,
            started_at: report.started_at,
            elapsed_ms: report.elapsed.as_millis(),
            metrics: report.metrics,
            playoff_odds: report.playoff_odds(),
            week_odds: report.week_odds(),
            team_spend: report.team_spend(),
            player_bids: report.player_bids(),
            spend_correlation: report.spend_correlation(),
            spend_buckets: report.spend_buckets(),
            records: report.records(),
        }
    }
}

/// Write `report` to `out` in `format`
pub fn write_report<W: Write>(out: &mut W, report: &BatchReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &ReportDocument::from_report(report))
                .context("Failed to serialize report")?;
            writeln!(out)?;
        }
        OutputFormat::Records => {
            for record in report.records() {
                serde_json::to_writer(&mut *out, &record).context("Failed to serialize record")?;
                writeln!(out)?;
            }
        }
        OutputFormat::Table => write_tables(out, report)?,
    }
    Ok(())
}

/// Write flat records to a JSON-lines file
pub fn save_records(path: &Path, report: &BatchReport) -> Result<()> {
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create records file: {:?}", path))?;
    write_report(&mut file, report, OutputFormat::Records)
}

fn write_tables<W: Write>(out: &mut W, report: &BatchReport) -> Result<()> {
    writeln!(out, "League Simulation: {} (week {})", report.plan, report.week)?;
    writeln!(out, "{}", "=".repeat(50))?;
    writeln!(
        out,
        "Runs: {}/{}{}  Seed: {}  Elapsed: {:.2}s",
        report.completed_runs,
        report.requested_runs,
        if report.cancelled { " (stopped early)" } else { "" },
        report.seed,
        report.elapsed.as_secs_f64()
    )?;

    let odds = report.playoff_odds();
    if !odds.is_empty() {
        writeln!(out)?;
        writeln!(out, "Season Outlook")?;
        writeln!(out, "{}", "=".repeat(50))?;
        writeln!(
            out,
            "{:<16} {:>6} {:>5} {:>8} {:>5} {:>7} {:>7} {:>7} {:>7} {:>8}",
            "Team", "Wins", "SD", "Points", "Rank", "Playoff", "Final", "Champ", "Line", "Payout"
        )?;
        for row in &odds {
            writeln!(
                out,
                "{:<16} {:>6.2} {:>5.2} {:>8.1} {:>5.2} {:>6.1}% {:>6.1}% {:>6.1}% {:>7} {:>8.2}",
                truncate(&row.name, 16),
                row.mean_wins,
                row.sd_wins,
                row.mean_points,
                row.mean_rank,
                row.playoffs * 100.0,
                row.finals * 100.0,
                row.champion * 100.0,
                row.champion_odds.to_string(),
                row.expected_payout
            )?;
        }
    }

    let week = report.week_odds();
    if !week.is_empty() {
        writeln!(out)?;
        writeln!(out, "Week {} Odds", report.week)?;
        writeln!(out, "{}", "=".repeat(50))?;
        writeln!(
            out,
            "{:<16} {:>7} {:>6} {:>7} {:>7} {:>6} {:>7}",
            "Team", "Score", "Win", "Line", "TopHalf", "High", "Low"
        )?;
        for row in &week {
            writeln!(
                out,
                "{:<16} {:>7.1} {:>5.1}% {:>7} {:>6.1}% {:>5.1}% {:>6.1}%",
                truncate(&row.name, 16),
                row.mean_score,
                row.win * 100.0,
                row.win_odds.to_string(),
                row.top_half * 100.0,
                row.highest * 100.0,
                row.lowest * 100.0
            )?;
        }
    }

    let spend = report.team_spend();
    if !spend.is_empty() {
        writeln!(out)?;
        writeln!(out, "Auction Spending")?;
        writeln!(out, "{}", "=".repeat(50))?;
        for row in &spend {
            writeln!(
                out,
                "{:<16} spent ${:>6.1}  starters {:>5.1}%  unspent ${:.1}",
                truncate(&row.name, 16),
                row.mean_spent,
                row.mean_starter_share * 100.0,
                row.mean_unspent
            )?;
        }

        writeln!(out)?;
        writeln!(out, "Top Winning Bids")?;
        writeln!(out, "{}", "=".repeat(50))?;
        for row in report.player_bids().iter().take(TOP_PLAYERS) {
            writeln!(
                out,
                "{:<20} {:<4} ${:>5.1} ± {:<5.1} value ${:>5.1}  drafted {:>5.1}%",
                truncate(&row.name, 20),
                row.position.as_str(),
                row.mean_bid,
                row.sd_bid,
                row.mean_value,
                row.draft_rate * 100.0
            )?;
        }

        let correlation = report.spend_correlation();
        if let Some(r) = correlation.points {
            writeln!(out)?;
            writeln!(out, "Starter spend share vs season points: r = {:.3}", r)?;
            if let Some(r) = correlation.playoffs {
                writeln!(out, "Starter spend share vs playoffs:      r = {:.3}", r)?;
            }
            for bucket in report.spend_buckets().iter().filter(|b| b.teams > 0) {
                writeln!(
                    out,
                    "  {:>3.0}-{:<3.0}% starters: {:>6} teams, playoffs {:>5.1}%, points {:.1}",
                    bucket.share_low * 100.0,
                    bucket.share_high * 100.0,
                    bucket.teams,
                    bucket.playoff_rate * 100.0,
                    bucket.mean_points
                )?;
            }
        }
    }

    Ok(())
}

fn truncate(name: &str, width: usize) -> String {
    name.chars().take(width).collect()
}
