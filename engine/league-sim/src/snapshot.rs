//! Provider snapshot and stat-kind resolution
//!
//! The data provider hands over loosely structured stat rows per player. They
//! are resolved exactly once into typed [`PlayerProjection`] records; nothing
//! downstream looks at raw rows again.

use crate::config::LeagueConfig;
use crate::error::{Result, SimError};
use crate::models::{PlayerId, PlayerProjection, Position, TeamId, TeamRecord};
use crate::season::{Schedule, SeasonInput, SeasonTeam};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Which statistic a snapshot row carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StatKind {
    /// Season-long projected points
    SeasonProjection,
    /// Projected points per game
    SeasonAverage,
    /// Projected points for one week
    WeekProjection { week: u32 },
    /// Points scored in a completed week
    WeekActual { week: u32 },
}

/// One stat row
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatLine {
    #[serde(flatten)]
    pub kind: StatKind,
    pub points: f64,
}

/// A player as delivered by the data provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotPlayer {
    pub id: PlayerId,
    pub name: String,
    pub position: Position,
    #[serde(default)]
    pub pro_team: String,
    #[serde(default)]
    pub bye_week: Option<u32>,
    #[serde(default)]
    pub stats: Vec<StatLine>,
    /// League team currently rostering the player
    #[serde(default)]
    pub owner: Option<TeamId>,
}

/// A league team as delivered by the data provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotTeam {
    pub id: TeamId,
    pub name: String,
    /// Record from weeks already played
    #[serde(default)]
    pub record: TeamRecord,
}

/// Read-only league snapshot consumed by the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueSnapshot {
    pub season: i32,
    /// First week that has not been played yet
    #[serde(default = "default_current_week")]
    pub current_week: u32,
    #[serde(default)]
    pub teams: Vec<SnapshotTeam>,
    pub players: Vec<SnapshotPlayer>,
    /// Regular-season pairings by week; generated when empty
    #[serde(default)]
    pub schedule: Vec<Vec<(TeamId, TeamId)>>,
}

fn default_current_week() -> u32 {
    1
}

impl SnapshotPlayer {
    /// Resolve raw stat rows into a typed projection.
    ///
    /// Per-game points come from the season average when present, then the
    /// season projection spread over `season_length - 1` games, then the
    /// mean weekly projection. Season points fall back the same way.
    pub fn resolve(&self, season_length: u32) -> Result<PlayerProjection> {
        let games = season_length.saturating_sub(1).max(1) as f64;
        let mut season_projection = None;
        let mut season_average = None;
        let mut week_projections = BTreeMap::new();
        let mut actuals = BTreeMap::new();

        for line in &self.stats {
            if !line.points.is_finite() {
                return Err(SimError::Snapshot(format!(
                    "player {} has a non-finite {:?} value",
                    self.id, line.kind
                )));
            }
            match line.kind {
                StatKind::SeasonProjection => season_projection = Some(line.points),
                StatKind::SeasonAverage => season_average = Some(line.points),
                StatKind::WeekProjection { week } => {
                    check_week(self.id, week, season_length)?;
                    week_projections.insert(week, line.points);
                }
                StatKind::WeekActual { week } => {
                    check_week(self.id, week, season_length)?;
                    actuals.insert(week, line.points);
                }
            }
        }

        let weekly_mean = if week_projections.is_empty() {
            None
        } else {
            Some(week_projections.values().sum::<f64>() / week_projections.len() as f64)
        };

        let per_game = season_average
            .or(season_projection.map(|p| p / games))
            .or(weekly_mean)
            .unwrap_or(0.0);
        let season_points = season_projection.unwrap_or(per_game * games);

        Ok(PlayerProjection {
            id: self.id,
            name: self.name.clone(),
            position: self.position,
            pro_team: self.pro_team.clone(),
            bye_week: self.bye_week,
            season_points,
            per_game,
            week_projections,
            actuals,
        })
    }
}

fn check_week(player: PlayerId, week: u32, season_length: u32) -> Result<()> {
    if week == 0 || week > season_length {
        return Err(SimError::Snapshot(format!(
            "player {} has a stat for week {} outside 1..={}",
            player, week, season_length
        )));
    }
    Ok(())
}

impl LeagueSnapshot {
    /// Resolve every player, sorted by id
    pub fn resolve_players(&self, season_length: u32) -> Result<Vec<PlayerProjection>> {
        let mut seen = HashSet::new();
        let mut players = Vec::with_capacity(self.players.len());
        for player in &self.players {
            if !seen.insert(player.id) {
                return Err(SimError::Snapshot(format!("duplicate player id {}", player.id)));
            }
            players.push(player.resolve(season_length)?);
        }
        players.sort_by_key(|p| p.id);
        Ok(players)
    }

    /// Build the input for a season simulation starting at `current_week`
    pub fn season_input(&self, config: &LeagueConfig) -> Result<SeasonInput> {
        let n_teams = self.teams.len();
        if n_teams != config.roster.teams {
            return Err(SimError::Snapshot(format!(
                "snapshot has {} teams but the league is configured for {}",
                n_teams, config.roster.teams
            )));
        }
        for (index, team) in self.teams.iter().enumerate() {
            if team.id != index {
                return Err(SimError::Snapshot(format!(
                    "team ids must be dense and ordered; found {} at position {}",
                    team.id, index
                )));
            }
        }

        let players = self.resolve_players(config.season.season_length)?;
        let mut teams: Vec<SeasonTeam> = self
            .teams
            .iter()
            .map(|t| SeasonTeam { id: t.id, name: t.name.clone(), roster: Vec::new() })
            .collect();
        for player in &self.players {
            if let Some(owner) = player.owner {
                let team = teams.get_mut(owner).ok_or(SimError::UnknownTeam(owner))?;
                team.roster.push(player.id);
            }
        }
        for team in &mut teams {
            team.roster.sort_unstable();
        }

        let schedule = if self.schedule.is_empty() {
            Schedule::round_robin(n_teams, config.season.regular_weeks)?
        } else {
            Schedule::from_weeks(self.schedule.clone(), n_teams)?
        };
        let prior = self.teams.iter().map(|t| t.record).collect();

        SeasonInput::new(config, teams, players, schedule, self.current_week, prior)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(stats: Vec<StatLine>) -> SnapshotPlayer {
        SnapshotPlayer {
            id: 11,
            name: "Test Runner".to_string(),
            position: Position::RB,
            pro_team: "KC".to_string(),
            bye_week: Some(6),
            stats,
            owner: None,
        }
    }

    #[test]
    fn test_resolve_prefers_season_average() {
        let resolved = player(vec![
            StatLine { kind: StatKind::SeasonProjection, points: 170.0 },
            StatLine { kind: StatKind::SeasonAverage, points: 11.0 },
        ])
        .resolve(18)
        .unwrap();
        assert_eq!(resolved.per_game, 11.0);
        assert_eq!(resolved.season_points, 170.0);
    }

    #[test]
    fn test_resolve_spreads_season_projection() {
        let resolved = player(vec![StatLine { kind: StatKind::SeasonProjection, points: 170.0 }])
            .resolve(18)
            .unwrap();
        assert!((resolved.per_game - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_resolve_weekly_rows() {
        let resolved = player(vec![
            StatLine { kind: StatKind::WeekProjection { week: 1 }, points: 9.0 },
            StatLine { kind: StatKind::WeekProjection { week: 2 }, points: 13.0 },
            StatLine { kind: StatKind::WeekActual { week: 1 }, points: 21.4 },
        ])
        .resolve(18)
        .unwrap();
        assert_eq!(resolved.per_game, 11.0);
        assert_eq!(resolved.actual(1), Some(21.4));
        assert_eq!(resolved.actual(2), None);
        assert_eq!(resolved.projection_for_week(2), 13.0);
        assert_eq!(resolved.projection_for_week(3), 11.0);
    }

    #[test]
    fn test_resolve_rejects_bad_week() {
        let result = player(vec![StatLine { kind: StatKind::WeekActual { week: 0 }, points: 1.0 }])
            .resolve(18);
        assert!(matches!(result, Err(SimError::Snapshot(_))));
    }

    #[test]
    fn test_snapshot_json_shape() {
        let json = r#"{
            "season": 2023,
            "players": [{
                "id": 1,
                "name": "A",
                "position": "QB",
                "stats": [
                    {"kind": "season_projection", "points": 340.0},
                    {"kind": "week_actual", "week": 1, "points": 25.5}
                ]
            }]
        }"#;
        let snapshot: LeagueSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.current_week, 1);
        let players = snapshot.resolve_players(18).unwrap();
        assert_eq!(players[0].actual(1), Some(25.5));
        assert_eq!(players[0].season_points, 340.0);
    }
}
