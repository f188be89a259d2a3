//! Auction simulator
//!
//! One auction is an explicit state machine:
//!
//! ```text
//! Nominating -> Bidding -> Resolving -> Nominating ... -> Complete
//! ```
//!
//! Every pass through `Nominating` removes exactly one player from the pool,
//! either sold or discarded, so an auction always terminates.

use crate::config::{BidDistribution, LeagueConfig, RosterConfig};
use crate::metrics::SimMetrics;
use crate::models::{DraftPick, DraftTeam, Player, PlayerId, Position, RosterSlot, TeamId};
use crate::valuation::ValuedPool;
use rand::distributions::WeightedIndex;
use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::{Distribution, Triangular};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Current state of an auction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuctionPhase {
    Nominating,
    Bidding,
    Resolving,
    Complete,
}

/// Result of one simulated auction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuctionOutcome {
    pub picks: Vec<DraftPick>,
    pub teams: Vec<DraftTeam>,
    /// Nominated players nobody could afford
    pub discarded: Vec<PlayerId>,
    /// Every roster slot in the league was filled
    pub complete: bool,
    pub total_spent: u32,
    /// League dollars left on the table
    pub unspent: u32,
}

impl AuctionOutcome {
    /// Player ids won by `team`, in pick order
    pub fn roster(&self, team: TeamId) -> Vec<PlayerId> {
        self.picks.iter().filter(|p| p.winner == team).map(|p| p.player).collect()
    }

    /// Rosters of every team, indexed by team id
    pub fn rosters(&self) -> Vec<Vec<PlayerId>> {
        (0..self.teams.len()).map(|team| self.roster(team)).collect()
    }
}

/// The player currently on the block
#[derive(Debug, Clone)]
struct Nomination {
    /// Index into the remaining pool
    index: usize,
    nominator: TeamId,
    bid: u32,
    eligible: Vec<TeamId>,
}

/// Mutable state of a single auction
pub struct AuctionState<'a> {
    config: &'a LeagueConfig,
    metrics: &'a SimMetrics,
    /// Remaining players, highest value first
    pool: Vec<Player>,
    teams: Vec<DraftTeam>,
    picks: Vec<DraftPick>,
    discarded: Vec<PlayerId>,
    phase: AuctionPhase,
    next_nominator: TeamId,
    nomination: Option<Nomination>,
}

impl<'a> AuctionState<'a> {
    /// Seat every team with a full budget and draw its aggression trait
    pub fn new(
        config: &'a LeagueConfig,
        pool: &ValuedPool,
        metrics: &'a SimMetrics,
        rng: &mut StdRng,
    ) -> Self {
        let roster = &config.roster;
        let levels = &config.auction.aggression_levels;
        let aggression = WeightedIndex::new(&config.auction.aggression_weights).ok();
        let teams = (0..roster.teams)
            .map(|id| {
                let level = match &aggression {
                    Some(dist) => levels[dist.sample(rng)],
                    None => levels.first().copied().unwrap_or(1),
                };
                DraftTeam::new(id, roster.team_name(id), roster.budget, roster.roster_size(), level)
            })
            .collect();

        Self {
            config,
            metrics,
            pool: pool.players.clone(),
            teams,
            picks: Vec::new(),
            discarded: Vec::new(),
            phase: AuctionPhase::Nominating,
            next_nominator: 0,
            nomination: None,
        }
    }

    pub fn phase(&self) -> AuctionPhase {
        self.phase
    }

    pub fn teams(&self) -> &[DraftTeam] {
        &self.teams
    }

    pub fn picks(&self) -> &[DraftPick] {
        &self.picks
    }

    /// Players still available, highest value first
    pub fn remaining(&self) -> &[Player] {
        &self.pool
    }

    /// League dollars not yet spent
    pub fn remaining_dollars(&self) -> u32 {
        let spent: u32 = self.teams.iter().map(|t| t.spent).sum();
        self.config.roster.total_dollars().saturating_sub(spent)
    }

    /// Advance the state machine by one transition
    pub fn step(&mut self, rng: &mut StdRng) -> AuctionPhase {
        match self.phase {
            AuctionPhase::Nominating => self.nominate(rng),
            AuctionPhase::Bidding => self.open_bidding(rng),
            AuctionPhase::Resolving => self.resolve(rng),
            AuctionPhase::Complete => {}
        }
        self.phase
    }

    pub fn into_outcome(self) -> AuctionOutcome {
        let total_spent: u32 = self.teams.iter().map(|t| t.spent).sum();
        let complete = self.teams.iter().all(|t| t.slots_left == 0);
        AuctionOutcome {
            picks: self.picks,
            teams: self.teams,
            discarded: self.discarded,
            complete,
            total_spent,
            unspent: self.config.roster.total_dollars().saturating_sub(total_spent),
        }
    }

    /// A team may roster `position` if it has an open slot, is under the
    /// position cap, and still has room for every required position it lacks
    fn can_roster(&self, team: &DraftTeam, position: Position) -> bool {
        team.slots_left > 0
            && team.filled[position] < self.config.roster.max_slots[position]
            && !needs_other_position(&self.config.roster, team, position)
    }

    /// After paying `bid` the team must keep the minimum bid for every other
    /// open slot, unless this is its last slot
    fn can_afford(&self, team: &DraftTeam, bid: u32) -> bool {
        let min_bid = self.config.roster.min_bid as i64;
        let after = team.funds as i64 - bid as i64;
        let reserve = (team.slots_left as i64 - 1) * min_bid;
        after >= reserve || (team.slots_left == 1 && after >= 0)
    }

    fn nominate(&mut self, rng: &mut StdRng) {
        if self.teams.iter().all(|t| t.slots_left == 0) {
            self.finish();
            return;
        }

        let open: Vec<Position> = Position::ALL
            .into_iter()
            .filter(|p| self.teams.iter().any(|t| self.can_roster(t, *p)))
            .collect();
        let shortlist: Vec<usize> = self
            .pool
            .iter()
            .enumerate()
            .filter(|(_, p)| open.contains(&p.position))
            .map(|(i, _)| i)
            .take(self.config.auction.shortlist_size)
            .collect();

        if shortlist.is_empty() {
            let open_slots: u32 = self.teams.iter().map(|t| t.slots_left).sum();
            warn!(
                "Auction ran out of nominatable players with {} roster slots open",
                open_slots
            );
            self.metrics.record_incomplete_auction();
            self.finish();
            return;
        }

        let weights: Vec<f64> = shortlist.iter().map(|&i| self.pool[i].value.max(0.0)).collect();
        let index = match WeightedIndex::new(&weights) {
            Ok(dist) => shortlist[dist.sample(rng)],
            Err(_) => shortlist[rng.gen_range(0..shortlist.len())],
        };
        let nominator = self.advance_nominator();

        self.nomination = Some(Nomination { index, nominator, bid: 0, eligible: Vec::new() });
        self.phase = AuctionPhase::Bidding;
    }

    /// Draw an opening bid, then lower it $1 at a time until some team is
    /// eligible. The loop ends at the minimum bid, where the player is
    /// discarded.
    fn open_bidding(&mut self, rng: &mut StdRng) {
        let Some(mut nomination) = self.nomination.take() else {
            self.phase = AuctionPhase::Nominating;
            return;
        };
        let player = &self.pool[nomination.index];
        let position = player.position;
        let auction = &self.config.auction;
        let min_bid = self.config.roster.min_bid;

        let possible = self.teams.iter().filter(|t| self.can_roster(t, position)).count();
        let factor = possible as f64 / self.teams.len() as f64 + auction.competition_offset;
        let (low, high) = {
            let a = player.price * factor;
            let b = player.value * factor;
            if a <= b {
                (a, b)
            } else {
                (b, a)
            }
        };
        let raw = if high > low {
            match auction.bid_distribution {
                BidDistribution::Uniform => rng.gen_range(low..=high),
                BidDistribution::Triangular => {
                    let mode = (low + high) / 2.0;
                    Triangular::new(low, high, mode).map(|d| d.sample(rng)).unwrap_or(mode)
                }
            }
        } else {
            low
        };
        let mut bid = if raw.is_finite() { (raw.round() as i64).max(min_bid as i64) as u32 } else { min_bid };

        let mut decrements = 0u64;
        let eligible = loop {
            let eligible: Vec<TeamId> = self
                .teams
                .iter()
                .filter(|t| self.can_roster(t, position) && self.can_afford(t, bid))
                .map(|t| t.id)
                .collect();
            if !eligible.is_empty() || bid <= min_bid {
                break eligible;
            }
            bid -= 1;
            decrements += 1;
        };
        self.metrics.record_bid_decrements(decrements);

        if eligible.is_empty() {
            let player = self.pool.remove(nomination.index);
            debug!("Discarding {} ({}): no team can afford ${}", player.name, position, bid);
            self.discarded.push(player.id);
            self.metrics.record_discard();
            self.apply_inflation();
            self.phase = AuctionPhase::Nominating;
            return;
        }

        nomination.bid = bid;
        nomination.eligible = eligible;
        self.nomination = Some(nomination);
        self.phase = AuctionPhase::Resolving;
    }

    fn resolve(&mut self, rng: &mut StdRng) {
        let Some(nomination) = self.nomination.take() else {
            self.phase = AuctionPhase::Nominating;
            return;
        };
        let player = &self.pool[nomination.index];
        let weights: Vec<f64> = nomination
            .eligible
            .iter()
            .map(|&t| self.appetite(&self.teams[t], player, &nomination.eligible))
            .collect();
        let winner = match WeightedIndex::new(&weights) {
            Ok(dist) => nomination.eligible[dist.sample(rng)],
            Err(_) => {
                self.metrics.record_appetite_fallback();
                nomination.eligible[rng.gen_range(0..nomination.eligible.len())]
            }
        };

        let player = self.pool.remove(nomination.index);
        let pick = self.picks.len() as u32 + 1;
        let team = &mut self.teams[winner];
        // The last open slot takes whatever money the team has left
        let bid = if team.slots_left == 1 { nomination.bid.max(team.funds) } else { nomination.bid };
        let slot = assign_slot(&self.config.roster, team, player.position);
        team.funds -= bid;
        team.slots_left -= 1;
        team.filled[player.position] += 1;
        team.last_pick = Some(pick);
        team.spent += bid;
        if slot != RosterSlot::Bench {
            team.starter_spent += bid;
        }

        self.picks.push(DraftPick {
            pick,
            player: player.id,
            player_name: player.name,
            position: player.position,
            nominator: nomination.nominator,
            winner,
            bid,
            slot,
            value: player.value,
            price: player.price,
        });
        self.metrics.record_sale();
        self.apply_inflation();
        self.phase = AuctionPhase::Nominating;
    }

    /// Willingness of `team` to win `player`; higher means more likely.
    ///
    /// Combines the player's share of its value tier, the team's slot
    /// scarcity at the position against the rest of the league, how far the
    /// team lags in roster fill, and picks since its last win. Aggression
    /// divides the whole score.
    fn appetite(&self, team: &DraftTeam, player: &Player, eligible: &[TeamId]) -> f64 {
        let roster = &self.config.roster;
        let weights = &self.config.auction.appetite;
        let position = player.position;
        let others = (self.teams.len() - 1).max(1) as f64;

        let tier_vor: f64 = self
            .pool
            .iter()
            .filter(|p| p.position == position && p.tier == player.tier)
            .map(|p| p.vor_total)
            .sum();
        let position_scarcity = player.vor_total / (tier_vor + 1.0) / weights.tier_share_divisor;

        let aggression_total: f64 = eligible.iter().map(|&t| self.teams[t].aggression as f64).sum();
        let aggression = if aggression_total > 0.0 {
            team.aggression as f64 / aggression_total * position_scarcity
        } else {
            0.0
        };

        let max_slots = roster.max_slots[position] as f64;
        let team_slots = max_slots / (team.filled[position] as f64 + 1.0);
        let others_filled: u32 =
            self.teams.iter().filter(|t| t.id != team.id).map(|t| t.filled[position]).sum();
        let league_slots = max_slots * others / (others_filled as f64 + 1.0) / others;
        let lineup_scarcity = if league_slots > 0.0 { team_slots / league_slots } else { 1.0 };

        let pick = self.picks.len() as f64 + 1.0;
        let pick_scarcity = match team.last_pick {
            Some(last) => pick - last as f64,
            None => pick - 1.0,
        };
        let team_roster = (roster.roster_size() - team.slots_left) as f64;
        let league_roster = (pick - team_roster) / others;
        let roster_scarcity = league_roster / (team_roster + 1.0);

        lineup_scarcity / (aggression + 1.0)
            * (roster_scarcity + pick_scarcity / weights.recency_divisor)
    }

    /// Rescale remaining value and price so prices add up to the dollars
    /// still unspent
    fn apply_inflation(&mut self) {
        let remaining_price: f64 = self.pool.iter().map(|p| p.price).sum();
        if remaining_price <= 0.0 {
            return;
        }
        let factor = self.remaining_dollars() as f64 / remaining_price;
        for player in &mut self.pool {
            player.value *= factor;
            player.price *= factor;
        }
    }

    fn advance_nominator(&mut self) -> TeamId {
        let n = self.teams.len();
        for offset in 0..n {
            let team = (self.next_nominator + offset) % n;
            if self.teams[team].slots_left > 0 {
                self.next_nominator = (team + 1) % n;
                return team;
            }
        }
        self.next_nominator
    }

    fn finish(&mut self) {
        self.nomination = None;
        self.phase = AuctionPhase::Complete;
    }
}

/// The team still lacks more required positions than it has slots for,
/// not counting `position` itself
fn needs_other_position(roster: &RosterConfig, team: &DraftTeam, position: Position) -> bool {
    if team.slots_left == 0 {
        return false;
    }
    let missing = Position::ALL
        .into_iter()
        .filter(|&p| p != position && roster.starters[p] > 0 && team.filled[p] == 0)
        .count() as u32;
    missing >= team.slots_left
}

/// Starter first, then flex, then bench
fn assign_slot(roster: &RosterConfig, team: &mut DraftTeam, position: Position) -> RosterSlot {
    if team.starters_filled[position] < roster.starters[position] {
        team.starters_filled[position] += 1;
        RosterSlot::Starter(position)
    } else if roster.is_flex(position) && team.flex_filled < roster.flex_slots {
        team.flex_filled += 1;
        RosterSlot::Flex
    } else {
        RosterSlot::Bench
    }
}

/// Runs complete auctions against a valued pool
pub struct AuctionSimulator {
    config: LeagueConfig,
}

impl AuctionSimulator {
    pub fn new(config: LeagueConfig) -> Self {
        Self { config }
    }

    /// Simulate one auction from start to finish
    pub fn run(&self, pool: &ValuedPool, rng: &mut StdRng, metrics: &SimMetrics) -> AuctionOutcome {
        let mut state = AuctionState::new(&self.config, pool, metrics, rng);
        while state.step(rng) != AuctionPhase::Complete {}
        let outcome = state.into_outcome();
        metrics.record_auction();
        debug!(
            "Auction finished: {} picks, ${} spent, {} discarded",
            outcome.picks.len(),
            outcome.total_spent,
            outcome.discarded.len()
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::synthetic_players;
    use crate::valuation::ValueCalculator;
    use rand::SeedableRng;

    fn valued_pool(config: &LeagueConfig) -> ValuedPool {
        ValueCalculator::new(config.clone()).value_pool(&synthetic_players(3)).unwrap()
    }

    #[test]
    fn test_affordability_rule() {
        let config = LeagueConfig::default();
        let pool = valued_pool(&config);
        let metrics = SimMetrics::new();
        let mut rng = StdRng::seed_from_u64(1);
        let state = AuctionState::new(&config, &pool, &metrics, &mut rng);

        let mut team = DraftTeam::new(0, "A".to_string(), 10, 5, 2);
        assert!(state.can_afford(&team, 6));
        assert!(!state.can_afford(&team, 7));

        team.slots_left = 1;
        assert!(state.can_afford(&team, 10));
        assert!(!state.can_afford(&team, 11));
    }

    #[test]
    fn test_needs_other_position_blocks_last_slots() {
        let roster = RosterConfig::default();
        let mut team = DraftTeam::new(0, "A".to_string(), 200, 1, 2);
        team.filled = crate::config::PositionTable::new(1, 2, 3, 1, 0);
        assert!(needs_other_position(&roster, &team, Position::WR));
        assert!(!needs_other_position(&roster, &team, Position::DST));

        team.slots_left = 2;
        assert!(!needs_other_position(&roster, &team, Position::WR));
    }

    #[test]
    fn test_slot_assignment_order() {
        let roster = RosterConfig::default();
        let mut team = DraftTeam::new(0, "A".to_string(), 200, 15, 2);
        assert_eq!(assign_slot(&roster, &mut team, Position::RB), RosterSlot::Starter(Position::RB));
        assert_eq!(assign_slot(&roster, &mut team, Position::RB), RosterSlot::Starter(Position::RB));
        assert_eq!(assign_slot(&roster, &mut team, Position::RB), RosterSlot::Flex);
        assert_eq!(assign_slot(&roster, &mut team, Position::WR), RosterSlot::Starter(Position::WR));
        assert_eq!(assign_slot(&roster, &mut team, Position::RB), RosterSlot::Bench);
        assert_eq!(assign_slot(&roster, &mut team, Position::TE), RosterSlot::Starter(Position::TE));
        assert_eq!(assign_slot(&roster, &mut team, Position::TE), RosterSlot::Bench);
    }

    #[test]
    fn test_inflation_tracks_remaining_dollars() {
        let config = LeagueConfig::default();
        let pool = valued_pool(&config);
        let metrics = SimMetrics::new();
        let mut rng = StdRng::seed_from_u64(11);
        let mut state = AuctionState::new(&config, &pool, &metrics, &mut rng);

        let mut sales = 0;
        while sales < 40 && state.phase() != AuctionPhase::Complete {
            if state.step(&mut rng) == AuctionPhase::Nominating {
                sales = state.picks().len();
                let remaining: f64 = state.remaining().iter().map(|p| p.price).sum();
                assert!((remaining - state.remaining_dollars() as f64).abs() < 1e-6);
            }
        }
        assert!(sales > 0);
    }

    #[test]
    fn test_full_auction_fills_every_roster() {
        let config = LeagueConfig::default();
        let pool = valued_pool(&config);
        let metrics = SimMetrics::new();
        let mut rng = StdRng::seed_from_u64(5);
        let outcome = AuctionSimulator::new(config.clone()).run(&pool, &mut rng, &metrics);

        assert!(outcome.complete);
        assert_eq!(outcome.picks.len(), 150);
        assert!(outcome.total_spent <= 2000);
        assert_eq!(outcome.total_spent + outcome.unspent, 2000);
        for team in &outcome.teams {
            assert_eq!(team.slots_left, 0);
            assert_eq!(outcome.roster(team.id).len(), 15);
            for (position, count) in team.filled.iter() {
                assert!(*count <= config.roster.max_slots[position]);
            }
        }
        assert_eq!(metrics.snapshot().players_sold, 150);
    }

    #[test]
    fn test_completed_drafts_leave_no_money_behind() {
        let config = LeagueConfig::default();
        let slack = config.roster.roster_size() - 1;
        let simulator = AuctionSimulator::new(config.clone());
        for pool_seed in [3, 8, 21] {
            let pool = ValueCalculator::new(config.clone())
                .value_pool(&synthetic_players(pool_seed))
                .unwrap();
            for seed in 0..30 {
                let metrics = SimMetrics::new();
                let mut rng = StdRng::seed_from_u64(seed);
                let outcome = simulator.run(&pool, &mut rng, &metrics);
                assert!(outcome.complete);
                assert!(
                    outcome.unspent <= slack,
                    "pool {} seed {} left ${} unspent",
                    pool_seed,
                    seed,
                    outcome.unspent
                );
                assert!(outcome.teams.iter().all(|t| t.funds == 0 && t.spent == config.roster.budget));
            }
        }
    }

    #[test]
    fn test_triangular_bids_complete() {
        let mut config = LeagueConfig::default();
        config.auction.bid_distribution = BidDistribution::Triangular;
        let pool = valued_pool(&config);
        let metrics = SimMetrics::new();
        let mut rng = StdRng::seed_from_u64(9);
        let outcome = AuctionSimulator::new(config).run(&pool, &mut rng, &metrics);
        assert!(outcome.complete);
        assert!(outcome.picks.iter().all(|p| p.bid >= 1));
    }
}
