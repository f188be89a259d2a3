//! Deterministic synthetic league data
//!
//! Used by tests, benches and dry runs of the command-line driver when no
//! provider snapshot is available.

use crate::config::{LeagueConfig, PositionTable};
use crate::error::Result;
use crate::models::{PlayerProjection, Position};
use crate::season::SeasonInput;
use crate::snapshot::{LeagueSnapshot, SnapshotPlayer, SnapshotTeam, StatKind, StatLine};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Players generated per position
const POOL_SIZE: PositionTable<usize> = PositionTable { qb: 24, rb: 80, wr: 90, te: 24, dst: 12 };

/// Top per-game projection and drop per rank
const CURVE: PositionTable<(f64, f64)> = PositionTable {
    qb: (24.0, 0.4),
    rb: (20.0, 0.2),
    wr: (19.0, 0.18),
    te: (14.0, 0.4),
    dst: (9.0, 0.3),
};

/// Players each team rosters in a synthetic season
const ROSTER_QUOTA: PositionTable<usize> = PositionTable { qb: 2, rb: 5, wr: 5, te: 2, dst: 1 };

/// Games per season used to turn per-game points into a season projection
const GAMES: f64 = 17.0;

/// A player pool large enough for a 10 or 12 team league
pub fn synthetic_players(seed: u64) -> Vec<PlayerProjection> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut players = Vec::new();
    for (slot, position) in Position::ALL.into_iter().enumerate() {
        let (top, drop) = CURVE[position];
        for i in 0..POOL_SIZE[position] {
            let noise: f64 = rng.gen_range(-0.5..0.5);
            let per_game = (top - drop * i as f64 + noise).max(1.5);
            players.push(PlayerProjection {
                id: (slot as u32 + 1) * 1000 + i as u32,
                name: format!("{} {}", position, i + 1),
                position,
                pro_team: format!("T{:02}", i % 32),
                bye_week: Some(5 + (i % 10) as u32),
                season_points: per_game * GAMES,
                per_game,
                week_projections: BTreeMap::new(),
                actuals: BTreeMap::new(),
            });
        }
    }
    players
}

/// A pre-season snapshot with rosters dealt snake-style by projection
pub fn synthetic_snapshot(config: &LeagueConfig, seed: u64) -> LeagueSnapshot {
    let n_teams = config.roster.teams;
    let players = synthetic_players(seed);

    let mut owners: BTreeMap<u32, usize> = BTreeMap::new();
    for position in Position::ALL {
        let mut ranked: Vec<&PlayerProjection> =
            players.iter().filter(|p| p.position == position).collect();
        ranked.sort_by(|a, b| b.per_game.partial_cmp(&a.per_game).unwrap_or(Ordering::Equal));
        let rounds = ROSTER_QUOTA[position].min(ranked.len() / n_teams.max(1));
        for round in 0..rounds {
            for k in 0..n_teams {
                let team = if round % 2 == 0 { k } else { n_teams - 1 - k };
                owners.insert(ranked[round * n_teams + k].id, team);
            }
        }
    }

    let snapshot_players = players
        .iter()
        .map(|p| SnapshotPlayer {
            id: p.id,
            name: p.name.clone(),
            position: p.position,
            pro_team: p.pro_team.clone(),
            bye_week: p.bye_week,
            stats: vec![
                StatLine { kind: StatKind::SeasonProjection, points: p.season_points },
                StatLine { kind: StatKind::SeasonAverage, points: p.per_game },
            ],
            owner: owners.get(&p.id).copied(),
        })
        .collect();

    LeagueSnapshot {
        season: 2023,
        current_week: 1,
        teams: (0..n_teams)
            .map(|id| SnapshotTeam {
                id,
                name: config.roster.team_name(id),
                record: Default::default(),
            })
            .collect(),
        players: snapshot_players,
        schedule: Vec::new(),
    }
}

/// A fresh season over the synthetic snapshot
pub fn synthetic_season_input(config: &LeagueConfig, seed: u64) -> Result<SeasonInput> {
    synthetic_snapshot(config, seed).season_input(config)
}
