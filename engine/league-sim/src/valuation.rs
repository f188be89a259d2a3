//! Valuation model
//!
//! Turns point projections into auction dollars. Replacement levels come
//! from the league's roster construction, value-over-replacement (VOR) is
//! priced separately for the starter and bench shares of spendable money,
//! and the result is normalized so rostered players cost exactly the league's
//! total budget.

use crate::config::{LeagueConfig, PositionTable};
use crate::error::{Result, SimError};
use crate::models::{Player, PlayerId, PlayerProjection, PlayerType, Position};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{debug, info};

/// Replacement thresholds for one position
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplacementLevel {
    /// 1-based rank of the first player who is not a likely starter
    pub starter_rank: u32,
    /// 1-based rank of the first player who is not a likely bench pick
    pub bench_rank: u32,
    pub starter_points: f64,
    pub bench_points: f64,
}

/// Output of the valuation model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuedPool {
    /// Valued players, highest value first
    pub players: Vec<Player>,
    pub replacement: PositionTable<ReplacementLevel>,
    pub starter_dollars_per_vor: f64,
    pub bench_dollars_per_vor: f64,
}

impl ValuedPool {
    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    /// Sum of value over players expected to be drafted
    pub fn drafted_value(&self) -> f64 {
        self.players
            .iter()
            .filter(|p| p.player_type != PlayerType::Undrafted)
            .map(|p| p.value)
            .sum()
    }

    /// Sum of price over players expected to be drafted
    pub fn drafted_price(&self) -> f64 {
        self.players
            .iter()
            .filter(|p| p.player_type != PlayerType::Undrafted)
            .map(|p| p.price)
            .sum()
    }
}

/// Computes auction value and price for a player pool
pub struct ValueCalculator {
    config: LeagueConfig,
}

impl ValueCalculator {
    /// Create a new value calculator
    pub fn new(config: LeagueConfig) -> Self {
        Self { config }
    }

    /// Replacement ranks per position as `(starter_rank, bench_rank)`.
    ///
    /// Flex slots are split evenly across the flex-eligible positions.
    pub fn replacement_ranks(&self) -> PositionTable<(u32, u32)> {
        let roster = &self.config.roster;
        let teams = roster.teams as f64;
        PositionTable::from_fn(|position| {
            let flex_share = if roster.is_flex(position) {
                roster.flex_slots as f64 / roster.flex_positions.len() as f64
            } else {
                0.0
            };
            let starters = (roster.starters[position] as f64 + flex_share) * teams;
            let total = starters + roster.bench_share[position] * teams;
            (starters.ceil() as u32 + 1, total.ceil() as u32 + 1)
        })
    }

    /// Value every player in `projections`.
    ///
    /// Fails if the pool cannot supply the league's starters or fill every
    /// roster once per-position caps are applied.
    pub fn value_pool(&self, projections: &[PlayerProjection]) -> Result<ValuedPool> {
        let roster = &self.config.roster;
        let auction = &self.config.auction;

        let mut by_position: PositionTable<Vec<&PlayerProjection>> = PositionTable::default();
        for projection in projections.iter().filter(|p| p.per_game > auction.min_per_game) {
            by_position[projection.position].push(projection);
        }
        for position in Position::ALL {
            by_position[position].sort_by(|a, b| {
                b.season_points
                    .partial_cmp(&a.season_points)
                    .unwrap_or(Ordering::Equal)
                    .then(a.id.cmp(&b.id))
            });
        }

        self.check_pool(&by_position)?;

        let ranks = self.replacement_ranks();
        let points_at = |position: Position, rank: u32| -> f64 {
            by_position[position]
                .get(rank as usize - 1)
                .map(|p| p.season_points)
                .unwrap_or(0.0)
        };
        let replacement = PositionTable::from_fn(|position| {
            let (starter_rank, bench_rank) = ranks[position];
            ReplacementLevel {
                starter_rank,
                bench_rank,
                starter_points: points_at(position, starter_rank),
                bench_points: points_at(position, bench_rank),
            }
        });

        let mut players = Vec::new();
        for position in Position::ALL {
            let level = replacement[position];
            let has_bench = roster.bench_share[position] > 0.0;
            for (index, projection) in by_position[position].iter().enumerate() {
                let points = projection.season_points;
                let player_type = if points > level.starter_points {
                    PlayerType::Starter
                } else if points > level.bench_points {
                    PlayerType::Bench
                } else {
                    PlayerType::Undrafted
                };
                let vor_starter = (points - level.starter_points).max(0.0);
                let vor_bench = if has_bench { (points - level.bench_points).max(0.0) } else { 0.0 };
                players.push(Player {
                    id: projection.id,
                    name: projection.name.clone(),
                    position,
                    bye_week: projection.bye_week,
                    projection: points,
                    per_game: projection.per_game,
                    rank: index as u32 + 1,
                    vor_starter,
                    vor_bench,
                    vor_total: vor_starter + vor_bench,
                    value: 0.0,
                    price: 0.0,
                    player_type,
                    tier: 1,
                });
            }
        }

        let floor = roster.roster_size() as f64 * roster.min_bid as f64 * roster.teams as f64;
        let available = roster.total_dollars() as f64 - floor;
        let vor_of = |kind: PlayerType| -> f64 {
            players.iter().filter(|p| p.player_type == kind).map(|p| p.vor_total).sum()
        };
        let starter_vor = vor_of(PlayerType::Starter);
        let bench_vor = vor_of(PlayerType::Bench);
        let bench_allocation = 1.0 - auction.starter_allocation;

        let bench_dollars_per_vor =
            if bench_vor > 0.0 { available * bench_allocation / bench_vor } else { 0.0 };
        let starter_dollars_per_vor = if starter_vor > 0.0 {
            available * auction.starter_allocation / starter_vor
        } else {
            0.0
        } + bench_dollars_per_vor;

        for player in &mut players {
            player.value = player.vor_starter * starter_dollars_per_vor
                + player.vor_bench * bench_dollars_per_vor
                + roster.min_bid as f64;
        }

        let drafted_value: f64 = players
            .iter()
            .filter(|p| p.player_type != PlayerType::Undrafted)
            .map(|p| p.value)
            .sum();
        let scale =
            if drafted_value > 0.0 { roster.total_dollars() as f64 / drafted_value } else { 1.0 };
        for player in &mut players {
            player.price = player.value * scale;
        }

        assign_tiers(&mut players, auction.value_tiers);

        players.sort_by(|a, b| {
            b.value
                .partial_cmp(&a.value)
                .unwrap_or(Ordering::Equal)
                .then(b.projection.partial_cmp(&a.projection).unwrap_or(Ordering::Equal))
                .then(a.id.cmp(&b.id))
        });

        let starters = players.iter().filter(|p| p.player_type == PlayerType::Starter).count();
        let bench = players.iter().filter(|p| p.player_type == PlayerType::Bench).count();
        info!(
            "Valued {} players ({} starters, {} bench): ${:.2}/VOR starter, ${:.2}/VOR bench",
            players.len(),
            starters,
            bench,
            starter_dollars_per_vor,
            bench_dollars_per_vor
        );

        Ok(ValuedPool { players, replacement, starter_dollars_per_vor, bench_dollars_per_vor })
    }

    fn check_pool(&self, by_position: &PositionTable<Vec<&PlayerProjection>>) -> Result<()> {
        let roster = &self.config.roster;
        let mut draftable = 0;
        for position in Position::ALL {
            let available = by_position[position].len();
            let required = roster.starters[position] as usize * roster.teams;
            if available < required {
                return Err(SimError::InsufficientPlayers { position, required, available });
            }
            draftable += available.min(roster.max_slots[position] as usize * roster.teams);
        }
        let required = roster.roster_size() as usize * roster.teams;
        if draftable < required {
            return Err(SimError::InsufficientPool { required, available: draftable });
        }
        debug!("Player pool supports {} of {} roster slots", draftable, required);
        Ok(())
    }
}

/// Split players into VOR tiers at the largest gaps between neighbours.
///
/// Tier 1 holds the highest VOR. At most `n_tiers` tiers are produced; flat
/// stretches never start a new tier.
pub fn assign_tiers(players: &mut [Player], n_tiers: usize) {
    let mut order: Vec<usize> = (0..players.len()).collect();
    order.sort_by(|&a, &b| {
        players[b]
            .vor_total
            .partial_cmp(&players[a].vor_total)
            .unwrap_or(Ordering::Equal)
            .then(players[a].id.cmp(&players[b].id))
    });

    let mut gaps: Vec<(usize, f64)> = order
        .windows(2)
        .enumerate()
        .map(|(i, pair)| (i, players[pair[0]].vor_total - players[pair[1]].vor_total))
        .filter(|(_, gap)| *gap > 0.0)
        .collect();
    gaps.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal).then(a.0.cmp(&b.0)));
    let mut breaks: Vec<usize> =
        gaps.into_iter().take(n_tiers.saturating_sub(1)).map(|(i, _)| i).collect();
    breaks.sort_unstable();

    let mut tier = 1;
    let mut next_break = breaks.iter().peekable();
    for (position, &index) in order.iter().enumerate() {
        players[index].tier = tier;
        if next_break.peek() == Some(&&position) {
            next_break.next();
            tier += 1;
        }
    }
}
