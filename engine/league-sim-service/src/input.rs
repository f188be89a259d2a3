//! Simulation inputs: league snapshots and batch plans

use anyhow::{Context, Result};
use clap::ValueEnum;
use league_sim::synthetic::{synthetic_players, synthetic_snapshot};
use league_sim::{LeagueConfig, LeagueSnapshot, PlayerProjection, SimulationPlan};
use std::path::Path;
use tracing::info;

/// What each run of a batch simulates
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Auctions only
    Auction,
    /// The rest of the season from the snapshot's rosters
    Season,
    /// An auction followed by a full season
    Both,
    /// One week from the snapshot's rosters
    Week,
}

/// Read a league snapshot from a JSON file
pub fn load_snapshot(path: &Path) -> Result<LeagueSnapshot> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot: {:?}", path))?;
    let snapshot: LeagueSnapshot = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse snapshot: {:?}", path))?;
    info!(
        "Loaded {} season snapshot at week {}: {} teams, {} players",
        snapshot.season,
        snapshot.current_week,
        snapshot.teams.len(),
        snapshot.players.len()
    );
    Ok(snapshot)
}

/// The snapshot at `path`, or a synthetic league seeded with `seed`
pub fn snapshot_or_synthetic(
    league: &LeagueConfig,
    path: Option<&Path>,
    seed: u64,
) -> Result<LeagueSnapshot> {
    match path {
        Some(path) => load_snapshot(path),
        None => {
            info!("No snapshot configured; using a synthetic league (seed {})", seed);
            Ok(synthetic_snapshot(league, seed))
        }
    }
}

/// The projection pool an auction draws from
pub fn player_pool(
    league: &LeagueConfig,
    snapshot: Option<&LeagueSnapshot>,
    seed: u64,
) -> Result<Vec<PlayerProjection>> {
    match snapshot {
        Some(snapshot) => snapshot
            .resolve_players(league.season.season_length)
            .context("Failed to resolve snapshot players"),
        None => Ok(synthetic_players(seed)),
    }
}

/// Build the plan a batch runs.
///
/// `week` defaults to the snapshot's current week in week mode.
pub fn build_plan(
    league: &LeagueConfig,
    mode: Mode,
    snapshot_path: Option<&Path>,
    week: Option<u32>,
    seed: u64,
) -> Result<SimulationPlan> {
    let plan = match mode {
        Mode::Auction | Mode::Both => {
            let snapshot = snapshot_path.map(load_snapshot).transpose()?;
            let players = player_pool(league, snapshot.as_ref(), seed)?;
            if mode == Mode::Auction {
                SimulationPlan::auction(league, &players)?
            } else {
                SimulationPlan::auction_then_season(league, players)?
            }
        }
        Mode::Season => {
            let snapshot = snapshot_or_synthetic(league, snapshot_path, seed)?;
            SimulationPlan::season(snapshot.season_input(league)?)
        }
        Mode::Week => {
            let snapshot = snapshot_or_synthetic(league, snapshot_path, seed)?;
            let week = week.unwrap_or(snapshot.current_week);
            SimulationPlan::week(league, snapshot.season_input(league)?, week)?
        }
    };
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_synthetic_plans_for_every_mode() {
        let league = LeagueConfig::default();
        for (mode, kind) in [
            (Mode::Auction, "auction"),
            (Mode::Season, "season"),
            (Mode::Both, "auction+season"),
            (Mode::Week, "week"),
        ] {
            let plan = build_plan(&league, mode, None, None, 1).unwrap();
            assert_eq!(plan.kind(), kind);
        }
    }

    #[test]
    fn test_snapshot_file_round_trip() {
        let league = LeagueConfig::default();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("snapshot.json");
        let mut snapshot = synthetic_snapshot(&league, 4);
        snapshot.current_week = 6;
        std::fs::write(&path, serde_json::to_string_pretty(&snapshot).unwrap()).unwrap();

        let loaded = load_snapshot(&path).unwrap();
        assert_eq!(loaded.current_week, 6);
        assert_eq!(loaded.players.len(), snapshot.players.len());

        let plan = build_plan(&league, Mode::Week, Some(&path), None, 0).unwrap();
        assert_eq!(plan.as_of_week(), 6);
    }

    #[test]
    fn test_week_outside_season_rejected() {
        let league = LeagueConfig::default();
        assert!(build_plan(&league, Mode::Week, None, Some(20), 1).is_err());
    }

    #[test]
    fn test_bad_snapshot_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = load_snapshot(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("broken.json"));
    }
}
