//! Lineup resolver

use crate::config::{FlexSelection, PositionTable, RosterConfig};
use crate::models::{PlayerId, PlayerProjection, Position, RosterEntry, RosterSlot};
use rand::distributions::WeightedIndex;
use rand::rngs::StdRng;
use rand_distr::Distribution;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;

/// One filled lineup slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineupEntry {
    pub slot: RosterSlot,
    pub position: Position,
    /// `None` when a replacement player fills the slot
    pub player: Option<PlayerId>,
    pub expected: f64,
}

/// A full starting lineup for one week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lineup {
    pub week: u32,
    pub entries: Vec<LineupEntry>,
}

impl Lineup {
    /// Slots filled by replacement players
    pub fn replacements(&self) -> u32 {
        self.entries.iter().filter(|e| e.player.is_none()).count() as u32
    }

    pub fn expected_total(&self) -> f64 {
        self.entries.iter().map(|e| e.expected).sum()
    }
}

/// Picks a legal starting lineup from a roster
pub struct LineupResolver<'a> {
    roster: &'a RosterConfig,
    flex: FlexSelection,
}

impl<'a> LineupResolver<'a> {
    pub fn new(roster: &'a RosterConfig, flex: FlexSelection) -> Self {
        Self { roster, flex }
    }

    /// Resolve the lineup for `week`.
    ///
    /// Players on bye or injured that week sit. Starting slots are filled in
    /// position order with the highest expectation; any slot left empty gets
    /// the position's replacement player. Flex slots are filled last.
    pub fn resolve<F>(
        &self,
        roster: &[RosterEntry],
        week: u32,
        replacement: &PositionTable<f64>,
        expected_for: F,
        rng: &mut StdRng,
    ) -> Lineup
    where
        F: Fn(&RosterEntry) -> f64,
    {
        let mut available: Vec<(&RosterEntry, f64)> = roster
            .iter()
            .filter(|e| e.is_available(week))
            .map(|e| (e, expected_for(e)))
            .collect();
        available.sort_by(|a, b| {
            b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal).then(a.0.player.cmp(&b.0.player))
        });

        let mut entries = Vec::with_capacity(self.roster.starter_slots() as usize);
        for position in Position::ALL {
            for _ in 0..self.roster.starters[position] {
                let slot = RosterSlot::Starter(position);
                match available.iter().position(|(e, _)| e.position == position) {
                    Some(index) => {
                        let (entry, expected) = available.remove(index);
                        entries.push(LineupEntry { slot, position, player: Some(entry.player), expected });
                    }
                    None => entries.push(LineupEntry {
                        slot,
                        position,
                        player: None,
                        expected: replacement[position],
                    }),
                }
            }
        }

        for _ in 0..self.roster.flex_slots {
            let candidates: Vec<usize> = available
                .iter()
                .enumerate()
                .filter(|(_, (e, _))| self.roster.is_flex(e.position))
                .map(|(i, _)| i)
                .collect();

            if candidates.is_empty() {
                if let Some(position) = self.best_flex_replacement(replacement) {
                    entries.push(LineupEntry {
                        slot: RosterSlot::Flex,
                        position,
                        player: None,
                        expected: replacement[position],
                    });
                }
                continue;
            }

            let chosen = match self.flex {
                FlexSelection::Best => candidates[0],
                FlexSelection::Weighted => {
                    let weights: Vec<f64> =
                        candidates.iter().map(|&i| available[i].1.max(0.0)).collect();
                    match WeightedIndex::new(&weights) {
                        Ok(dist) => candidates[dist.sample(rng)],
                        Err(_) => candidates[0],
                    }
                }
            };
            let (entry, expected) = available.remove(chosen);
            entries.push(LineupEntry {
                slot: RosterSlot::Flex,
                position: entry.position,
                player: Some(entry.player),
                expected,
            });
        }

        Lineup { week, entries }
    }

    fn best_flex_replacement(&self, replacement: &PositionTable<f64>) -> Option<Position> {
        self.roster
            .flex_positions
            .iter()
            .copied()
            .max_by(|a, b| replacement[*a].partial_cmp(&replacement[*b]).unwrap_or(Ordering::Equal))
    }
}

/// Per-game level of a replacement player at each position: the mean of the
/// top `top_n` unrostered players, divided by `top_n` even when fewer exist
pub fn replacement_levels(
    players: &[PlayerProjection],
    rostered: &HashSet<PlayerId>,
    top_n: usize,
) -> PositionTable<f64> {
    PositionTable::from_fn(|position| {
        let mut free: Vec<f64> = players
            .iter()
            .filter(|p| p.position == position && !rostered.contains(&p.id))
            .map(|p| p.per_game)
            .collect();
        free.sort_by(|a, b| b.partial_cmp(a).unwrap_or(Ordering::Equal));
        free.iter().take(top_n).sum::<f64>() / top_n.max(1) as f64
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use std::collections::{BTreeMap, BTreeSet};

    fn entry(player: PlayerId, position: Position, expected: f64) -> RosterEntry {
        RosterEntry {
            player,
            position,
            bye_week: None,
            injured_weeks: BTreeSet::new(),
            weight: 1.0,
            expected,
            spread: expected * 0.4,
        }
    }

    fn full_roster() -> Vec<RosterEntry> {
        vec![
            entry(1, Position::QB, 20.0),
            entry(2, Position::QB, 15.0),
            entry(3, Position::RB, 14.0),
            entry(4, Position::RB, 12.0),
            entry(5, Position::RB, 9.0),
            entry(6, Position::WR, 16.0),
            entry(7, Position::WR, 13.0),
            entry(8, Position::WR, 11.0),
            entry(9, Position::WR, 10.0),
            entry(10, Position::TE, 8.0),
            entry(11, Position::DST, 7.0),
        ]
    }

    fn replacement() -> PositionTable<f64> {
        PositionTable::new(12.0, 6.0, 6.5, 4.0, 5.0)
    }

    #[test]
    fn test_best_lineup_by_position() {
        let roster_config = RosterConfig::default();
        let resolver = LineupResolver::new(&roster_config, FlexSelection::Best);
        let mut rng = StdRng::seed_from_u64(1);
        let lineup = resolver.resolve(&full_roster(), 1, &replacement(), |e| e.expected, &mut rng);

        let starters: Vec<Option<PlayerId>> = lineup.entries.iter().map(|e| e.player).collect();
        assert_eq!(
            starters,
            vec![Some(1), Some(3), Some(4), Some(6), Some(7), Some(8), Some(10), Some(11), Some(9)]
        );
        assert_eq!(lineup.entries.last().unwrap().slot, RosterSlot::Flex);
        assert_eq!(lineup.replacements(), 0);
    }

    #[test]
    fn test_bye_and_injury_trigger_replacement() {
        let roster_config = RosterConfig::default();
        let resolver = LineupResolver::new(&roster_config, FlexSelection::Best);
        let mut rng = StdRng::seed_from_u64(1);

        let mut roster = full_roster();
        roster[9].bye_week = Some(5);
        roster[10].injured_weeks.insert(5);

        let lineup = resolver.resolve(&roster, 5, &replacement(), |e| e.expected, &mut rng);
        let te = lineup.entries.iter().find(|e| e.slot == RosterSlot::Starter(Position::TE)).unwrap();
        assert_eq!(te.player, None);
        assert_eq!(te.expected, 4.0);
        assert_eq!(lineup.replacements(), 2);
        assert_eq!(lineup.entries.len(), 9);
    }

    #[test]
    fn test_weighted_flex_only_uses_flex_positions() {
        let roster_config = RosterConfig::default();
        let resolver = LineupResolver::new(&roster_config, FlexSelection::Weighted);
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = BTreeSet::new();
        for _ in 0..200 {
            let lineup = resolver.resolve(&full_roster(), 1, &replacement(), |e| e.expected, &mut rng);
            let flex = lineup.entries.iter().find(|e| e.slot == RosterSlot::Flex).unwrap();
            seen.insert(flex.player.unwrap());
        }
        assert!(seen.is_subset(&[5, 9].into_iter().collect()));
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn test_replacement_levels_divide_by_top_n() {
        let make = |id: PlayerId, position: Position, per_game: f64| PlayerProjection {
            id,
            name: format!("P{}", id),
            position,
            pro_team: String::new(),
            bye_week: None,
            season_points: per_game * 17.0,
            per_game,
            week_projections: BTreeMap::new(),
            actuals: BTreeMap::new(),
        };
        let players = vec![
            make(1, Position::TE, 9.0),
            make(2, Position::TE, 6.0),
            make(3, Position::TE, 3.0),
            make(4, Position::TE, 2.0),
            make(5, Position::QB, 12.0),
        ];
        let rostered: HashSet<PlayerId> = [1].into_iter().collect();
        let levels = replacement_levels(&players, &rostered, 3);
        assert!((levels[Position::TE] - 11.0 / 3.0).abs() < 1e-9);
        assert!((levels[Position::QB] - 4.0).abs() < 1e-9);
        assert_eq!(levels[Position::DST], 0.0);
    }
}
