//! Outcome sampler
//!
//! Draws per-season player state (injury absences, performance weight) and
//! per-week point totals. Weekly distributions share their shape within a
//! position and are shifted so their mean lands on the individual player's
//! expectation.

use crate::config::{GammaParams, ScoreModel, SeasonConfig};
use crate::metrics::SimMetrics;
use crate::models::{PlayerProjection, Position, RosterEntry};
use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::{Distribution, Gamma, Normal};
use std::collections::BTreeSet;

/// Samples player outcomes for one run
pub struct OutcomeSampler<'a> {
    config: &'a SeasonConfig,
    metrics: &'a SimMetrics,
}

impl<'a> OutcomeSampler<'a> {
    pub fn new(config: &'a SeasonConfig, metrics: &'a SimMetrics) -> Self {
        Self { config, metrics }
    }

    /// Draw the season-level state of a rostered player
    pub fn draw_season(&self, player: &PlayerProjection, rng: &mut StdRng) -> RosterEntry {
        let position = player.position;
        let injured_weeks = self.sample_injury(position, rng);
        let weight = self.sample_weight(position, rng);
        let mut spread = player.per_game * self.config.sd_ratio[position];
        if self.config.score_model == ScoreModel::Normal {
            spread = self.floored(spread);
        } else if !(spread >= self.config.variance_floor) {
            spread = self.config.variance_floor;
        }

        RosterEntry {
            player: player.id,
            position,
            bye_week: player.bye_week,
            injured_weeks,
            weight,
            expected: player.per_game * weight,
            spread,
        }
    }

    /// Weeks missed through injury.
    ///
    /// Games missed follow an exponential with the position's mean, truncated
    /// to the season length and floored; that many distinct weeks are then
    /// drawn from `1..season_length`.
    pub fn sample_injury(&self, position: Position, rng: &mut StdRng) -> BTreeSet<u32> {
        let mean = self.config.injury_mean_games[position];
        let weeks = self.config.season_length.saturating_sub(1) as usize;
        if !(mean > 0.0) || weeks == 0 {
            return BTreeSet::new();
        }

        let upper = self.config.season_length as f64;
        let u: f64 = rng.gen();
        let games = -mean * (1.0 - u * (1.0 - (-upper / mean).exp())).ln();
        let games = (games.floor().max(0.0) as usize).min(weeks);

        rand::seq::index::sample(rng, weeks, games).into_iter().map(|i| i as u32 + 1).collect()
    }

    /// Season-long performance multiplier, never negative
    pub fn sample_weight(&self, position: Position, rng: &mut StdRng) -> f64 {
        let params = self.config.weight[position];
        let weight = if params.sd > 0.0 {
            Normal::new(params.mean, params.sd).map(|d| d.sample(rng)).unwrap_or(params.mean)
        } else {
            params.mean
        };
        weight.max(0.0)
    }

    /// Points for a rostered player in `week`; known actuals are returned as is
    pub fn sample_points(
        &self,
        entry: &RosterEntry,
        player: &PlayerProjection,
        week: u32,
        rng: &mut StdRng,
    ) -> f64 {
        if let Some(actual) = player.actual(week) {
            return actual;
        }
        let expected = player.projection_for_week(week) * entry.weight;
        self.sample_around(entry.position, expected, entry.spread, rng)
    }

    /// Points for a replacement player expected to score `expected`
    pub fn sample_replacement(&self, position: Position, expected: f64, rng: &mut StdRng) -> f64 {
        let spread = expected * self.config.sd_ratio[position];
        self.sample_around(position, expected, spread, rng)
    }

    fn sample_around(&self, position: Position, expected: f64, spread: f64, rng: &mut StdRng) -> f64 {
        match self.config.score_model {
            ScoreModel::Gamma => {
                let params = self.config.gamma[position];
                let shaped = GammaParams {
                    shape: self.floored(params.shape),
                    loc: params.loc,
                    scale: self.floored(params.scale),
                };
                match Gamma::new(shaped.shape, shaped.scale) {
                    Ok(dist) => dist.sample(rng) + shaped.loc + (expected - shaped.mean()),
                    Err(_) => expected,
                }
            }
            ScoreModel::Normal => {
                let sd = self.floored(spread);
                Normal::new(expected, sd).map(|d| d.sample(rng)).unwrap_or(expected)
            }
        }
    }

    /// Raise a degenerate spread parameter to the variance floor
    fn floored(&self, value: f64) -> f64 {
        if value >= self.config.variance_floor {
            value
        } else {
            self.metrics.record_variance_clamp();
            self.config.variance_floor
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use std::collections::BTreeMap;

    fn projection(position: Position, per_game: f64) -> PlayerProjection {
        PlayerProjection {
            id: 1,
            name: "Sample".to_string(),
            position,
            pro_team: "SF".to_string(),
            bye_week: Some(9),
            season_points: per_game * 17.0,
            per_game,
            week_projections: BTreeMap::new(),
            actuals: BTreeMap::new(),
        }
    }

    #[test]
    fn test_actual_points_are_used_directly() {
        let config = SeasonConfig::default();
        let metrics = SimMetrics::new();
        let sampler = OutcomeSampler::new(&config, &metrics);
        let mut rng = StdRng::seed_from_u64(1);

        let mut player = projection(Position::WR, 14.0);
        player.actuals.insert(3, 27.3);
        let entry = sampler.draw_season(&player, &mut rng);
        assert_eq!(sampler.sample_points(&entry, &player, 3, &mut rng), 27.3);
    }

    #[test]
    fn test_dst_never_injured_and_unweighted() {
        let config = SeasonConfig::default();
        let metrics = SimMetrics::new();
        let sampler = OutcomeSampler::new(&config, &metrics);
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..100 {
            assert!(sampler.sample_injury(Position::DST, &mut rng).is_empty());
            assert_eq!(sampler.sample_weight(Position::DST, &mut rng), 1.0);
        }
    }

    #[test]
    fn test_injury_weeks_are_distinct_and_in_range() {
        let config = SeasonConfig::default();
        let metrics = SimMetrics::new();
        let sampler = OutcomeSampler::new(&config, &metrics);
        let mut rng = StdRng::seed_from_u64(3);

        let draws = 4000;
        let mut total = 0;
        for _ in 0..draws {
            let weeks = sampler.sample_injury(Position::RB, &mut rng);
            assert!(weeks.iter().all(|w| (1..=17).contains(w)));
            total += weeks.len();
        }
        let mean = total as f64 / draws as f64;
        assert!(mean > 2.0 && mean < 2.9, "mean games missed {}", mean);
    }

    #[test]
    fn test_gamma_samples_center_on_expectation() {
        let config = SeasonConfig::default();
        let metrics = SimMetrics::new();
        let sampler = OutcomeSampler::new(&config, &metrics);
        let mut rng = StdRng::seed_from_u64(4);

        let n = 5000;
        let total: f64 =
            (0..n).map(|_| sampler.sample_replacement(Position::WR, 15.0, &mut rng)).sum();
        let mean = total / n as f64;
        assert!((mean - 15.0).abs() < 0.5, "sample mean {}", mean);
        assert_eq!(metrics.snapshot().variance_clamps, 0);
    }

    #[test]
    fn test_zero_spread_is_clamped() {
        let config = SeasonConfig { score_model: ScoreModel::Normal, ..SeasonConfig::default() };
        let metrics = SimMetrics::new();
        let sampler = OutcomeSampler::new(&config, &metrics);
        let mut rng = StdRng::seed_from_u64(5);

        let player = projection(Position::TE, 0.0);
        let entry = sampler.draw_season(&player, &mut rng);
        assert_eq!(entry.spread, config.variance_floor);
        let points = sampler.sample_points(&entry, &player, 1, &mut rng);
        assert!(points.is_finite());
        assert!(metrics.snapshot().variance_clamps >= 1);
    }
}
