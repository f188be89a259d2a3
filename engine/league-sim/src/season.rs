//! Season simulator
//!
//! Plays the regular season week by week, seeds the playoff field and runs
//! the playoff rounds. A run draws every rostered player's season state once
//! (injuries, performance weight) and reuses it for every week.

use crate::auction::AuctionOutcome;
use crate::config::{LeagueConfig, PlayoffFormat, PositionTable};
use crate::error::{Result, SimError};
use crate::lineup::{replacement_levels, LineupResolver};
use crate::metrics::SimMetrics;
use crate::models::{
    Matchup, PlayerId, PlayerProjection, PlayoffRound, RosterEntry, SeasonOutcome, TeamId,
    TeamRecord, TeamSeason, WeekResult,
};
use crate::sampler::OutcomeSampler;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

/// Regular-season pairings, one list per week starting at week 1
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    weeks: Vec<Vec<(TeamId, TeamId)>>,
}

impl Schedule {
    /// Round-robin schedule by the circle method.
    ///
    /// Team 0 stays fixed while the others rotate. Rounds repeat once every
    /// pairing has been played so any number of weeks can be covered.
    pub fn round_robin(n_teams: usize, weeks: u32) -> Result<Self> {
        if n_teams < 2 || n_teams % 2 != 0 {
            return Err(SimError::InvalidSchedule(format!(
                "round robin needs an even number of teams, got {}",
                n_teams
            )));
        }

        let mut order: Vec<TeamId> = (0..n_teams).collect();
        let mut rounds: Vec<Vec<(TeamId, TeamId)>> = Vec::with_capacity(n_teams - 1);
        for round in 0..n_teams - 1 {
            let pairs = (0..n_teams / 2)
                .map(|i| {
                    let (a, b) = (order[i], order[n_teams - 1 - i]);
                    if round % 2 == 0 {
                        (a, b)
                    } else {
                        (b, a)
                    }
                })
                .collect();
            rounds.push(pairs);
            order[1..].rotate_right(1);
        }

        let weeks = (0..weeks as usize).map(|w| rounds[w % rounds.len()].clone()).collect();
        Ok(Self { weeks })
    }

    /// Wrap explicit pairings after validating them
    pub fn from_weeks(weeks: Vec<Vec<(TeamId, TeamId)>>, n_teams: usize) -> Result<Self> {
        let schedule = Self { weeks };
        schedule.validate(n_teams)?;
        Ok(schedule)
    }

    /// Every team plays exactly once per week
    pub fn validate(&self, n_teams: usize) -> Result<()> {
        for (index, pairs) in self.weeks.iter().enumerate() {
            let week = index + 1;
            let mut seen = HashSet::new();
            for &(home, away) in pairs {
                if home >= n_teams || away >= n_teams {
                    return Err(SimError::InvalidSchedule(format!(
                        "week {} references a team outside 0..{}",
                        week, n_teams
                    )));
                }
                if home == away {
                    return Err(SimError::InvalidSchedule(format!(
                        "week {} pairs team {} with itself",
                        week, home
                    )));
                }
                if !seen.insert(home) || !seen.insert(away) {
                    return Err(SimError::InvalidSchedule(format!(
                        "week {} has a team playing twice",
                        week
                    )));
                }
            }
            if seen.len() != n_teams {
                return Err(SimError::InvalidSchedule(format!(
                    "week {} leaves {} teams without a game",
                    week,
                    n_teams - seen.len()
                )));
            }
        }
        Ok(())
    }

    /// Pairings for a 1-based week
    pub fn week(&self, week: u32) -> Option<&[(TeamId, TeamId)]> {
        let index = (week as usize).checked_sub(1)?;
        self.weeks.get(index).map(|w| w.as_slice())
    }

    pub fn opponent(&self, week: u32, team: TeamId) -> Option<TeamId> {
        self.week(week)?.iter().find_map(|&(home, away)| {
            if home == team {
                Some(away)
            } else if away == team {
                Some(home)
            } else {
                None
            }
        })
    }

    pub fn len(&self) -> usize {
        self.weeks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weeks.is_empty()
    }
}

/// A league team entering a season simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonTeam {
    pub id: TeamId,
    pub name: String,
    pub roster: Vec<PlayerId>,
}

/// Validated, read-only input to a season simulation
#[derive(Debug, Clone)]
pub struct SeasonInput {
    teams: Vec<SeasonTeam>,
    players: Vec<PlayerProjection>,
    index: HashMap<PlayerId, usize>,
    schedule: Schedule,
    start_week: u32,
    prior: Vec<TeamRecord>,
    replacement: PositionTable<f64>,
}

impl SeasonInput {
    /// Validate rosters, schedule and prior records.
    ///
    /// `players` is the whole pool, free agents included; free agents set
    /// the replacement levels. `start_week` is the first week to simulate
    /// and `prior` holds each team's record from the weeks before it (empty
    /// for a fresh season).
    pub fn new(
        config: &LeagueConfig,
        teams: Vec<SeasonTeam>,
        players: Vec<PlayerProjection>,
        schedule: Schedule,
        start_week: u32,
        prior: Vec<TeamRecord>,
    ) -> Result<Self> {
        let n_teams = config.roster.teams;
        let regular_weeks = config.season.regular_weeks;
        if teams.len() != n_teams {
            return Err(SimError::Config(format!(
                "{} teams supplied for a {}-team league",
                teams.len(),
                n_teams
            )));
        }
        if let Some((index, team)) = teams.iter().enumerate().find(|(i, t)| t.id != *i) {
            return Err(SimError::Config(format!(
                "team ids must be dense and ordered; found {} at position {}",
                team.id, index
            )));
        }

        let index: HashMap<PlayerId, usize> =
            players.iter().enumerate().map(|(i, p)| (p.id, i)).collect();
        let mut rostered = HashSet::new();
        for team in &teams {
            for player in &team.roster {
                if !index.contains_key(player) {
                    return Err(SimError::UnknownPlayer(*player));
                }
                if !rostered.insert(*player) {
                    return Err(SimError::Config(format!("player {} is on two rosters", player)));
                }
            }
        }

        schedule.validate(n_teams)?;
        if schedule.len() < regular_weeks as usize {
            return Err(SimError::InvalidSchedule(format!(
                "{} scheduled weeks for a {}-week regular season",
                schedule.len(),
                regular_weeks
            )));
        }
        if start_week == 0 || start_week > regular_weeks + 1 {
            return Err(SimError::Config(format!(
                "start week {} outside 1..={}",
                start_week,
                regular_weeks + 1
            )));
        }

        let prior = if prior.is_empty() { vec![TeamRecord::default(); n_teams] } else { prior };
        if prior.len() != n_teams {
            return Err(SimError::Config(format!(
                "{} prior records for {} teams",
                prior.len(),
                n_teams
            )));
        }

        let replacement = replacement_levels(&players, &rostered, config.season.replacement_top_n);

        Ok(Self { teams, players, index, schedule, start_week, prior, replacement })
    }

    /// Fresh season for rosters produced by an auction
    pub fn from_auction(
        config: &LeagueConfig,
        outcome: &AuctionOutcome,
        players: Vec<PlayerProjection>,
        schedule: Schedule,
    ) -> Result<Self> {
        let teams = outcome
            .teams
            .iter()
            .map(|t| SeasonTeam { id: t.id, name: t.name.clone(), roster: outcome.roster(t.id) })
            .collect();
        Self::new(config, teams, players, schedule, 1, Vec::new())
    }

    pub fn teams(&self) -> &[SeasonTeam] {
        &self.teams
    }

    pub fn players(&self) -> &[PlayerProjection] {
        &self.players
    }

    pub fn player(&self, id: PlayerId) -> Option<&PlayerProjection> {
        self.index.get(&id).map(|&i| &self.players[i])
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn start_week(&self) -> u32 {
        self.start_week
    }

    pub fn prior(&self) -> &[TeamRecord] {
        &self.prior
    }

    /// Per-game replacement level per position
    pub fn replacement(&self) -> &PositionTable<f64> {
        &self.replacement
    }
}

/// Median of a score list; the mean of the middle pair for even lengths
pub fn median(scores: &[f64]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    let mut sorted = scores.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/// Top-half credit: 1 above the median, 0.5 on it, 0 below
pub fn top_half_credit(scores: &[f64]) -> Vec<f64> {
    let m = median(scores);
    scores
        .iter()
        .map(|&s| {
            if s > m {
                1.0
            } else if s == m {
                0.5
            } else {
                0.0
            }
        })
        .collect()
}

/// Drives lineups and sampling through a full season
pub struct SeasonSimulator<'a> {
    config: &'a LeagueConfig,
    metrics: &'a SimMetrics,
}

impl<'a> SeasonSimulator<'a> {
    pub fn new(config: &'a LeagueConfig, metrics: &'a SimMetrics) -> Self {
        Self { config, metrics }
    }

    fn sampler(&self) -> OutcomeSampler<'a> {
        OutcomeSampler::new(&self.config.season, self.metrics)
    }

    /// Season-level draws for every rostered player, indexed by team
    pub fn draw_rosters(&self, input: &SeasonInput, rng: &mut StdRng) -> Vec<Vec<RosterEntry>> {
        let sampler = self.sampler();
        input
            .teams()
            .iter()
            .map(|team| {
                team.roster
                    .iter()
                    .filter_map(|id| input.player(*id))
                    .map(|player| sampler.draw_season(player, rng))
                    .collect()
            })
            .collect()
    }

    /// Simulate the remaining regular season and the playoffs
    pub fn simulate(&self, input: &SeasonInput, rng: &mut StdRng) -> SeasonOutcome {
        let draws = self.draw_rosters(input, rng);
        let mut teams: Vec<TeamSeason> = input
            .prior()
            .iter()
            .enumerate()
            .map(|(team, record)| TeamSeason {
                team,
                matchup_wins: 0.0,
                top_half_wins: 0.0,
                wins: record.wins,
                points: record.points,
                rank: 0,
                made_playoffs: false,
                made_finals: false,
                champion: false,
                runner_up: false,
                third: false,
            })
            .collect();

        let mut player_points = BTreeMap::new();
        let mut weeks = Vec::new();
        for week in input.start_week()..=self.config.season.regular_weeks {
            let result = self.play_week(input, &draws, week, rng, Some(&mut player_points));
            for team in &mut teams {
                let matchup = result.matchup_wins[team.team];
                let top_half = result.top_half[team.team];
                team.matchup_wins += matchup;
                team.top_half_wins += top_half;
                team.wins += matchup + top_half;
                team.points += result.scores[team.team];
            }
            weeks.push(result);
        }

        let seeds = self.seed(&teams);
        for (rank, &team) in seeds.iter().enumerate() {
            teams[team].rank = rank as u32 + 1;
        }
        let playoffs = self.run_playoffs(input, &draws, &seeds, &mut teams, rng);
        self.metrics.record_season();

        SeasonOutcome { teams, weeks, seeds, playoffs, player_points }
    }

    /// Play one scheduled week using existing season draws
    pub fn play_week(
        &self,
        input: &SeasonInput,
        draws: &[Vec<RosterEntry>],
        week: u32,
        rng: &mut StdRng,
        mut player_points: Option<&mut BTreeMap<PlayerId, f64>>,
    ) -> WeekResult {
        let mut replacements = 0;
        let scores: Vec<f64> = draws
            .iter()
            .map(|roster| {
                let (score, used) =
                    self.team_score(input, roster, week, rng, player_points.as_deref_mut());
                replacements += used;
                score
            })
            .collect();

        let n = scores.len();
        let mut matchups = Vec::new();
        let mut matchup_wins = vec![0.0; n];
        for &(home, away) in input.schedule().week(week).unwrap_or(&[]) {
            let matchup =
                Matchup { home, away, home_score: scores[home], away_score: scores[away] };
            if matchup.home_score == matchup.away_score {
                self.metrics.record_tie();
            }
            matchup_wins[home] = matchup.credit_for(home);
            matchup_wins[away] = matchup.credit_for(away);
            matchups.push(matchup);
        }

        let top_half = top_half_credit(&scores);
        let highest = argmax(&scores);
        let lowest = argmin(&scores);
        self.metrics.record_week();
        self.metrics.record_replacements(replacements as u64);

        WeekResult {
            week,
            median: median(&scores),
            scores,
            matchups,
            matchup_wins,
            top_half,
            highest,
            lowest,
            replacements,
        }
    }

    /// Simulated score of one team's best lineup, with the number of
    /// replacement players used
    fn team_score(
        &self,
        input: &SeasonInput,
        roster: &[RosterEntry],
        week: u32,
        rng: &mut StdRng,
        player_points: Option<&mut BTreeMap<PlayerId, f64>>,
    ) -> (f64, u32) {
        let resolver = LineupResolver::new(&self.config.roster, self.config.season.flex_selection);
        let expected_for = |entry: &RosterEntry| match input.player(entry.player) {
            Some(player) => player
                .actual(week)
                .unwrap_or_else(|| player.projection_for_week(week) * entry.weight),
            None => entry.expected,
        };
        let lineup = resolver.resolve(roster, week, input.replacement(), expected_for, rng);

        let sampler = self.sampler();
        let mut total = 0.0;
        let mut scored = Vec::with_capacity(lineup.entries.len());
        for slot in &lineup.entries {
            let points = match slot.player {
                Some(id) => {
                    let entry = roster.iter().find(|e| e.player == id);
                    match (entry, input.player(id)) {
                        (Some(entry), Some(player)) => sampler.sample_points(entry, player, week, rng),
                        _ => slot.expected,
                    }
                }
                None => sampler.sample_replacement(slot.position, slot.expected, rng),
            };
            if let Some(id) = slot.player {
                scored.push((id, points));
            }
            total += points;
        }

        if let Some(player_points) = player_points {
            for (id, points) in scored {
                *player_points.entry(id).or_insert(0.0) += points;
            }
        }
        (total, lineup.replacements())
    }

    /// Order teams into final standings.
    ///
    /// The best `playoff_teams - wildcards` records (wins, then points) seed
    /// first, wild cards follow by points among the rest, everyone else
    /// follows by record.
    pub fn seed(&self, teams: &[TeamSeason]) -> Vec<TeamId> {
        let season = &self.config.season;
        let by_record = |a: &&TeamSeason, b: &&TeamSeason| {
            b.wins
                .partial_cmp(&a.wins)
                .unwrap_or(Ordering::Equal)
                .then(b.points.partial_cmp(&a.points).unwrap_or(Ordering::Equal))
                .then(a.team.cmp(&b.team))
        };
        let by_points = |a: &&TeamSeason, b: &&TeamSeason| {
            b.points
                .partial_cmp(&a.points)
                .unwrap_or(Ordering::Equal)
                .then(a.team.cmp(&b.team))
        };

        let mut order: Vec<&TeamSeason> = teams.iter().collect();
        order.sort_by(by_record);

        let field = season.playoff_teams.min(order.len());
        let direct = field.saturating_sub(season.wildcards);
        let mut seeds: Vec<TeamId> = order[..direct].iter().map(|t| t.team).collect();

        let mut rest: Vec<&TeamSeason> = order[direct..].to_vec();
        rest.sort_by(by_points);
        seeds.extend(rest.iter().take(field - direct).map(|t| t.team));

        for team in &order {
            if !seeds.contains(&team.team) {
                seeds.push(team.team);
            }
        }
        seeds
    }

    fn run_playoffs(
        &self,
        input: &SeasonInput,
        draws: &[Vec<RosterEntry>],
        seeds: &[TeamId],
        teams: &mut [TeamSeason],
        rng: &mut StdRng,
    ) -> Vec<PlayoffRound> {
        let season = &self.config.season;
        let seed_of = |team: TeamId| seeds.iter().position(|&t| t == team).unwrap_or(usize::MAX);

        let mut alive: Vec<TeamId> = seeds[..season.playoff_teams.min(seeds.len())].to_vec();
        for &team in &alive {
            teams[team].made_playoffs = true;
        }

        let mut rounds = Vec::new();
        let mut week = season.regular_weeks + 1;
        while alive.len() > 1 {
            let bye_count = if rounds.is_empty() { season.playoff_byes.min(alive.len()) } else { 0 };
            let byes = alive[..bye_count].to_vec();
            let playing = &alive[bye_count..];
            if alive.len() == 2 {
                for &team in &alive {
                    teams[team].made_finals = true;
                }
            }

            let scores: Vec<(TeamId, f64)> = playing
                .iter()
                .map(|&team| (team, self.team_score(input, &draws[team], week, rng, None).0))
                .collect();
            self.metrics.record_week();

            let winners: Vec<TeamId> = match season.playoff_format {
                PlayoffFormat::TopHalf => {
                    let mut ranked = scores.clone();
                    ranked.sort_by(|a, b| {
                        b.1.partial_cmp(&a.1)
                            .unwrap_or(Ordering::Equal)
                            .then(seed_of(a.0).cmp(&seed_of(b.0)))
                    });
                    ranked.iter().take(playing.len() / 2).map(|(t, _)| *t).collect()
                }
                PlayoffFormat::Bracket => {
                    let n = scores.len();
                    (0..n / 2)
                        .map(|i| {
                            let (high, high_score) = scores[i];
                            let (low, low_score) = scores[n - 1 - i];
                            if low_score > high_score {
                                low
                            } else {
                                high
                            }
                        })
                        .collect()
                }
            };

            let mut advancing: Vec<TeamId> = byes.iter().chain(winners.iter()).copied().collect();
            advancing.sort_by_key(|&t| seed_of(t));

            if advancing.len() == 2 {
                let third = scores
                    .iter()
                    .filter(|(t, _)| !advancing.contains(t))
                    .max_by(|a, b| {
                        a.1.partial_cmp(&b.1)
                            .unwrap_or(Ordering::Equal)
                            .then(seed_of(b.0).cmp(&seed_of(a.0)))
                    })
                    .map(|(t, _)| *t);
                if let Some(team) = third {
                    teams[team].third = true;
                }
            }
            if advancing.len() == 1 {
                let champion = advancing[0];
                teams[champion].champion = true;
                if let Some(&runner_up) = alive.iter().find(|&&t| t != champion) {
                    teams[runner_up].runner_up = true;
                }
            }

            debug!("Playoff week {}: {} teams advance", week, advancing.len());
            rounds.push(PlayoffRound { week, byes, scores, advancing: advancing.clone() });
            alive = advancing;
            week += 1;
        }

        if rounds.is_empty() {
            if let Some(&team) = alive.first() {
                teams[team].made_finals = true;
                teams[team].champion = true;
            }
        }
        rounds
    }
}

fn argmax(scores: &[f64]) -> TeamId {
    let mut best = 0;
    for (i, &s) in scores.iter().enumerate() {
        if s > scores[best] {
            best = i;
        }
    }
    best
}

fn argmin(scores: &[f64]) -> TeamId {
    let mut worst = 0;
    for (i, &s) in scores.iter().enumerate() {
        if s < scores[worst] {
            worst = i;
        }
    }
    worst
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::synthetic_season_input;
    use rand::SeedableRng;

    #[test]
    fn test_round_robin_plays_everyone_once() {
        let schedule = Schedule::round_robin(10, 9).unwrap();
        schedule.validate(10).unwrap();
        for team in 0..10 {
            let mut opponents: Vec<TeamId> =
                (1..=9).filter_map(|w| schedule.opponent(w, team)).collect();
            opponents.sort_unstable();
            opponents.dedup();
            assert_eq!(opponents.len(), 9);
        }
    }

    #[test]
    fn test_round_robin_repeats_to_fill_season() {
        let schedule = Schedule::round_robin(10, 14).unwrap();
        assert_eq!(schedule.len(), 14);
        assert_eq!(schedule.week(10), schedule.week(1));
        assert!(schedule.week(0).is_none());
        assert!(schedule.week(15).is_none());
    }

    #[test]
    fn test_odd_league_rejected() {
        assert!(matches!(Schedule::round_robin(9, 14), Err(SimError::InvalidSchedule(_))));
    }

    #[test]
    fn test_schedule_validation() {
        let bad = vec![vec![(0, 1), (1, 2)]];
        assert!(Schedule::from_weeks(bad, 4).is_err());
        let short = vec![vec![(0, 1)]];
        assert!(Schedule::from_weeks(short, 4).is_err());
        let good = vec![vec![(0, 1), (2, 3)], vec![(0, 2), (1, 3)]];
        assert!(Schedule::from_weeks(good, 4).is_ok());
    }

    #[test]
    fn test_top_half_credit_with_median_tie() {
        let credit = top_half_credit(&[10.0, 20.0, 30.0, 30.0, 40.0, 50.0]);
        assert_eq!(credit, vec![0.0, 0.0, 0.5, 0.5, 1.0, 1.0]);

        let odd = top_half_credit(&[3.0, 1.0, 2.0]);
        assert_eq!(odd, vec![1.0, 0.0, 0.5]);
    }

    fn record(team: TeamId, wins: f64, points: f64) -> TeamSeason {
        TeamSeason {
            team,
            matchup_wins: 0.0,
            top_half_wins: 0.0,
            wins,
            points,
            rank: 0,
            made_playoffs: false,
            made_finals: false,
            champion: false,
            runner_up: false,
            third: false,
        }
    }

    #[test]
    fn test_seeding_with_wildcard() {
        let config = LeagueConfig::default();
        let metrics = SimMetrics::new();
        let simulator = SeasonSimulator::new(&config, &metrics);
        let teams = vec![
            record(0, 20.0, 1500.0),
            record(1, 19.0, 1400.0),
            record(2, 18.0, 1300.0),
            record(3, 17.0, 1350.0),
            record(4, 17.0, 1360.0),
            record(5, 10.0, 1700.0),
            record(6, 16.0, 1200.0),
            record(7, 5.0, 1000.0),
            record(8, 6.0, 1100.0),
            record(9, 12.0, 1250.0),
        ];
        let seeds = simulator.seed(&teams);
        assert_eq!(seeds, vec![0, 1, 2, 4, 3, 5, 6, 9, 8, 7]);
    }

    #[test]
    fn test_season_produces_one_champion() {
        let config = LeagueConfig::default();
        let metrics = SimMetrics::new();
        let input = synthetic_season_input(&config, 21).unwrap();
        let simulator = SeasonSimulator::new(&config, &metrics);

        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let outcome = simulator.simulate(&input, &mut rng);
            assert_eq!(outcome.weeks.len(), 14);
            assert_eq!(outcome.playoffs.len(), 3);
            assert_eq!(outcome.teams.iter().filter(|t| t.champion).count(), 1);
            assert_eq!(outcome.teams.iter().filter(|t| t.runner_up).count(), 1);
            assert_eq!(outcome.teams.iter().filter(|t| t.third).count(), 1);
            assert_eq!(outcome.teams.iter().filter(|t| t.made_finals).count(), 2);
            assert_eq!(outcome.teams.iter().filter(|t| t.made_playoffs).count(), 6);
            let champion = outcome.champion().unwrap();
            assert!(outcome.teams[champion].made_playoffs);
            assert_eq!(outcome.playoffs[0].byes, outcome.seeds[..2].to_vec());
        }
    }

    #[test]
    fn test_bracket_format_produces_one_champion() {
        let mut config = LeagueConfig::default();
        config.season.playoff_format = PlayoffFormat::Bracket;
        let metrics = SimMetrics::new();
        let input = synthetic_season_input(&config, 21).unwrap();
        let simulator = SeasonSimulator::new(&config, &metrics);
        let mut rng = StdRng::seed_from_u64(4);
        let outcome = simulator.simulate(&input, &mut rng);
        assert_eq!(outcome.teams.iter().filter(|t| t.champion).count(), 1);
        assert_eq!(outcome.playoffs[0].advancing.len(), 4);
    }

    #[test]
    fn test_weekly_credit_totals() {
        let config = LeagueConfig::default();
        let metrics = SimMetrics::new();
        let input = synthetic_season_input(&config, 8).unwrap();
        let simulator = SeasonSimulator::new(&config, &metrics);
        let mut rng = StdRng::seed_from_u64(8);
        let outcome = simulator.simulate(&input, &mut rng);

        for week in &outcome.weeks {
            let matchup: f64 = week.matchup_wins.iter().sum();
            let top_half: f64 = week.top_half.iter().sum();
            assert_eq!(matchup, 5.0);
            assert_eq!(top_half, 5.0);
            assert_eq!(week.matchups.len(), 5);
        }
        let total_wins: f64 = outcome.teams.iter().map(|t| t.wins).sum();
        assert_eq!(total_wins, 140.0);
    }

    #[test]
    fn test_mid_season_start_keeps_prior_record() {
        let config = LeagueConfig::default();
        let metrics = SimMetrics::new();
        let base = synthetic_season_input(&config, 8).unwrap();
        let prior: Vec<TeamRecord> = (0..10)
            .map(|t| TeamRecord { wins: t as f64, points: 100.0 * t as f64 })
            .collect();
        let input = SeasonInput::new(
            &config,
            base.teams().to_vec(),
            base.players().to_vec(),
            base.schedule().clone(),
            10,
            prior,
        )
        .unwrap();
        let simulator = SeasonSimulator::new(&config, &metrics);
        let mut rng = StdRng::seed_from_u64(2);
        let outcome = simulator.simulate(&input, &mut rng);

        assert_eq!(outcome.weeks.len(), 5);
        assert_eq!(outcome.weeks[0].week, 10);
        let total_wins: f64 = outcome.teams.iter().map(|t| t.wins).sum();
        assert_eq!(total_wins, 45.0 + 50.0);
    }

    #[test]
    fn test_season_input_rejects_unknown_player() {
        let config = LeagueConfig::default();
        let base = synthetic_season_input(&config, 8).unwrap();
        let mut teams = base.teams().to_vec();
        teams[0].roster.push(999_999);
        let result = SeasonInput::new(
            &config,
            teams,
            base.players().to_vec(),
            base.schedule().clone(),
            1,
            Vec::new(),
        );
        assert!(matches!(result, Err(SimError::UnknownPlayer(999_999))));
    }
}
