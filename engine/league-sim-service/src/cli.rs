//! # Command Line Interface
//!
//! Runs simulation batches, single seeded runs and auction valuations.

use crate::config::{save_config, ServiceConfig};
use crate::input::{build_plan, player_pool, Mode};
use crate::output::{save_records, write_report, OutputFormat};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use league_sim::{Aggregator, BatchOptions, ValueCalculator};
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::time::Duration;
use tracing::info;

/// Fantasy league auction and season simulator
#[derive(Parser)]
#[command(name = "league-sim")]
#[command(about = "Monte-Carlo simulation of auction drafts and fantasy football seasons")]
#[command(version)]
pub struct Cli {
    /// Service configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override the configured log level
    #[arg(long)]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a batch and print aggregated results
    Run {
        #[arg(long, value_enum, default_value = "both")]
        mode: Mode,
        /// Runs in the batch
        #[arg(short, long)]
        runs: Option<u64>,
        /// Worker threads
        #[arg(short, long)]
        workers: Option<usize>,
        /// Batch seed
        #[arg(short, long)]
        seed: Option<u64>,
        /// Stop after this many seconds and report what finished
        #[arg(long)]
        deadline_secs: Option<u64>,
        /// League snapshot (JSON)
        #[arg(long)]
        snapshot: Option<PathBuf>,
        /// Week to simulate in week mode
        #[arg(long)]
        week: Option<u32>,
        #[arg(short, long, value_enum, default_value = "table")]
        output: OutputFormat,
        /// Also write flat summary records to this file
        #[arg(long)]
        records: Option<PathBuf>,
    },
    /// Run once with a fixed seed and print the full run as JSON
    Single {
        #[arg(long, value_enum, default_value = "both")]
        mode: Mode,
        #[arg(short, long, default_value = "0")]
        seed: u64,
        #[arg(long)]
        snapshot: Option<PathBuf>,
        #[arg(long)]
        week: Option<u32>,
    },
    /// Print auction values and prices for the player pool
    Values {
        #[arg(long)]
        snapshot: Option<PathBuf>,
        /// Players to show
        #[arg(long, default_value = "50")]
        limit: usize,
    },
    /// Validate the configuration and print the league shape
    Validate,
    /// Write the effective configuration as TOML
    InitConfig {
        #[arg(default_value = "league-sim.toml")]
        path: PathBuf,
    },
}

/// CLI handler
pub struct CliHandler {
    config: ServiceConfig,
}

impl CliHandler {
    pub fn new(config: ServiceConfig) -> Self {
        Self { config }
    }

    /// Handle CLI commands, writing results to `out`
    pub fn handle_command<W: Write>(
        &self,
        command: Commands,
        cancel: &AtomicBool,
        out: &mut W,
    ) -> Result<()> {
        match command {
            Commands::Run {
                mode,
                runs,
                workers,
                seed,
                deadline_secs,
                snapshot,
                week,
                output,
                records,
            } => {
                let settings = &self.config.simulation;
                let options = BatchOptions {
                    runs: runs.unwrap_or(settings.runs),
                    workers: workers.unwrap_or(settings.workers),
                    seed: seed.unwrap_or(settings.seed),
                    deadline: deadline_secs.or(settings.deadline_secs).map(Duration::from_secs),
                };
                let snapshot = snapshot.or_else(|| settings.snapshot.clone());
                self.run_batch(mode, &options, snapshot, week, output, records, cancel, out)?;
            }
            Commands::Single { mode, seed, snapshot, week } => {
                let snapshot = snapshot.or_else(|| self.config.simulation.snapshot.clone());
                self.run_single(mode, seed, snapshot, week, out)?;
            }
            Commands::Values { snapshot, limit } => {
                let snapshot = snapshot.or_else(|| self.config.simulation.snapshot.clone());
                self.show_values(snapshot, limit, out)?;
            }
            Commands::Validate => {
                self.show_league(out)?;
            }
            Commands::InitConfig { path } => {
                save_config(&self.config, &path)?;
                writeln!(out, "Wrote configuration to {}", path.display())?;
            }
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn run_batch<W: Write>(
        &self,
        mode: Mode,
        options: &BatchOptions,
        snapshot: Option<PathBuf>,
        week: Option<u32>,
        output: OutputFormat,
        records: Option<PathBuf>,
        cancel: &AtomicBool,
        out: &mut W,
    ) -> Result<()> {
        let league = &self.config.league;
        let plan = build_plan(league, mode, snapshot.as_deref(), week, options.seed)?;
        let aggregator = Aggregator::new(league.clone()).context("Invalid league configuration")?;

        let report = aggregator
            .run_batch_with_cancel(&plan, options, cancel)
            .context("Simulation batch failed")?;
        info!(
            "Batch complete: {} runs, {} auctions, {} seasons, {} weeks simulated",
            report.completed_runs, report.metrics.auctions, report.metrics.seasons, report.metrics.weeks
        );

        write_report(out, &report, output)?;
        if let Some(path) = records {
            save_records(&path, &report)?;
            info!("Wrote summary records to {:?}", path);
        }
        Ok(())
    }

    fn run_single<W: Write>(
        &self,
        mode: Mode,
        seed: u64,
        snapshot: Option<PathBuf>,
        week: Option<u32>,
        out: &mut W,
    ) -> Result<()> {
        let league = &self.config.league;
        let plan = build_plan(league, mode, snapshot.as_deref(), week, seed)?;
        let aggregator = Aggregator::new(league.clone())?;
        let record = aggregator.run_single(&plan, seed)?;
        serde_json::to_writer_pretty(&mut *out, &record).context("Failed to serialize run")?;
        writeln!(out)?;
        Ok(())
    }

    fn show_values<W: Write>(&self, snapshot: Option<PathBuf>, limit: usize, out: &mut W) -> Result<()> {
        let league = &self.config.league;
        let snapshot = snapshot.as_deref().map(crate::input::load_snapshot).transpose()?;
        let players = player_pool(league, snapshot.as_ref(), self.config.simulation.seed)?;
        let pool = ValueCalculator::new(league.clone()).value_pool(&players)?;

        writeln!(out, "Auction Values")?;
        writeln!(out, "{}", "=".repeat(50))?;
        writeln!(
            out,
            "{:<20} {:<4} {:>4} {:>7} {:>7} {:>7} {:>4} {:<9}",
            "Player", "Pos", "Rank", "Proj", "Value", "Price", "Tier", "Type"
        )?;
        for player in pool.players.iter().take(limit) {
            writeln!(
                out,
                "{:<20} {:<4} {:>4} {:>7.1} {:>7.2} {:>7.2} {:>4} {:<9}",
                player.name.chars().take(20).collect::<String>(),
                player.position.as_str(),
                player.rank,
                player.projection,
                player.value,
                player.price,
                player.tier,
                format!("{:?}", player.player_type)
            )?;
        }
        writeln!(out)?;
        writeln!(
            out,
            "Drafted value ${:.2}, drafted price ${:.2}",
            pool.drafted_value(),
            pool.drafted_price()
        )?;
        Ok(())
    }

    fn show_league<W: Write>(&self, out: &mut W) -> Result<()> {
        let league = &self.config.league;
        league.validate()?;
        let roster = &league.roster;
        let season = &league.season;

        writeln!(out, "League Configuration")?;
        writeln!(out, "{}", "=".repeat(50))?;
        writeln!(out, "Teams: {}  Budget: ${}  Min bid: ${}", roster.teams, roster.budget, roster.min_bid)?;
        writeln!(
            out,
            "Roster: {} starters + {} flex + {} bench = {}",
            roster.starter_slots() - roster.flex_slots,
            roster.flex_slots,
            roster.bench_slots,
            roster.roster_size()
        )?;
        for (position, starters) in roster.starters.iter() {
            writeln!(out, "  {:<4} starters {}  max {}", position.as_str(), starters, roster.max_slots[position])?;
        }
        writeln!(
            out,
            "Season: {} regular weeks, {} playoff teams ({} byes, {} wild cards), final in week {}",
            season.regular_weeks,
            season.playoff_teams,
            season.playoff_byes,
            season.wildcards,
            season.final_week()?
        )?;
        writeln!(
            out,
            "Batch: {} runs on {} workers, seed {}",
            self.config.simulation.runs, self.config.simulation.workers, self.config.simulation.seed
        )?;
        writeln!(out, "✅ Configuration is valid")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handler() -> CliHandler {
        let mut config = ServiceConfig::default();
        config.simulation.runs = 6;
        config.simulation.workers = 2;
        CliHandler::new(config)
    }

    fn run(command: Commands) -> String {
        let cancel = AtomicBool::new(false);
        let mut out = Vec::new();
        handler().handle_command(command, &cancel, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_parse_run_command() {
        let cli = Cli::parse_from([
            "league-sim", "run", "--mode", "season", "--runs", "50", "--seed", "3", "--output", "json",
        ]);
        match cli.command {
            Commands::Run { mode, runs, seed, output, .. } => {
                assert_eq!(mode, Mode::Season);
                assert_eq!(runs, Some(50));
                assert_eq!(seed, Some(3));
                assert_eq!(output, OutputFormat::Json);
            }
            _ => panic!("expected run command"),
        }
    }

    #[test]
    fn test_run_season_json() {
        let text = run(Commands::Run {
            mode: Mode::Season,
            runs: None,
            workers: None,
            seed: Some(1),
            deadline_secs: None,
            snapshot: None,
            week: None,
            output: OutputFormat::Json,
            records: None,
        });
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["completed_runs"], 6);
        assert_eq!(value["playoff_odds"].as_array().unwrap().len(), 10);
    }

    #[test]
    fn test_run_week_records() {
        let text = run(Commands::Run {
            mode: Mode::Week,
            runs: Some(4),
            workers: Some(1),
            seed: Some(2),
            deadline_secs: None,
            snapshot: None,
            week: Some(3),
            output: OutputFormat::Records,
            records: None,
        });
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 10 * 5);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["week"], 3);
    }

    #[test]
    fn test_single_run_is_reproducible() {
        let command = || Commands::Single { mode: Mode::Auction, seed: 9, snapshot: None, week: None };
        assert_eq!(run(command()), run(command()));
    }

    #[test]
    fn test_values_and_validate() {
        let values = run(Commands::Values { snapshot: None, limit: 5 });
        assert!(values.contains("Auction Values"));
        // title, rule, header, 5 players, blank, totals
        assert_eq!(values.lines().count(), 10);

        let validate = run(Commands::Validate);
        assert!(validate.contains("Configuration is valid"));
    }
}
