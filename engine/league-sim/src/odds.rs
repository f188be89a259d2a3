//! American odds for simulated probabilities

use serde::{Deserialize, Serialize};
use std::fmt;

/// Moneyline cap in either direction
pub const MAX_LINE: i32 = 10_000;

/// A probability expressed as an American moneyline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Odds {
    /// Negative for favourites, positive for underdogs
    Line(i32),
    /// Happened in every run
    Locked,
    /// Happened in no run
    Eliminated,
}

/// Convert a probability to a moneyline rounded to the nearest 5.
///
/// Favourites (p >= 0.5) get `-p/(1-p)*100`, underdogs `+(1-p)/p*100`,
/// both capped at 10000.
pub fn american_odds(probability: f64) -> Odds {
    if !(probability > 0.0) {
        return Odds::Eliminated;
    }
    if probability >= 1.0 {
        return Odds::Locked;
    }
    let line = if probability >= 0.5 {
        -(round_to_five(probability / (1.0 - probability) * 100.0))
    } else {
        round_to_five((1.0 - probability) / probability * 100.0)
    };
    Odds::Line(line.clamp(-MAX_LINE, MAX_LINE))
}

fn round_to_five(value: f64) -> i32 {
    let rounded = (value / 5.0).round() * 5.0;
    if rounded > MAX_LINE as f64 {
        MAX_LINE
    } else {
        rounded as i32
    }
}

impl fmt::Display for Odds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Odds::Line(line) if *line > 0 => write!(f, "+{}", line),
            Odds::Line(line) => write!(f, "{}", line),
            Odds::Locked => f.write_str("✓"),
            Odds::Eliminated => f.write_str("-"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_even_money() {
        assert_eq!(american_odds(0.5), Odds::Line(-100));
    }

    #[test]
    fn test_favourite_and_underdog() {
        assert_eq!(american_odds(0.75), Odds::Line(-300));
        assert_eq!(american_odds(0.2), Odds::Line(400));
        assert_eq!(american_odds(0.3), Odds::Line(235));
    }

    #[test]
    fn test_caps_and_extremes() {
        assert_eq!(american_odds(0.99999), Odds::Line(-10_000));
        assert_eq!(american_odds(0.00001), Odds::Line(10_000));
        assert_eq!(american_odds(1.0), Odds::Locked);
        assert_eq!(american_odds(0.0), Odds::Eliminated);
        assert_eq!(american_odds(f64::NAN), Odds::Eliminated);
    }

    #[test]
    fn test_display() {
        assert_eq!(Odds::Line(250).to_string(), "+250");
        assert_eq!(Odds::Line(-150).to_string(), "-150");
        assert_eq!(Odds::Eliminated.to_string(), "-");
    }

    proptest! {
        #[test]
        fn prop_lines_are_multiples_of_five_within_cap(p in 0.0001f64..0.9999) {
            match american_odds(p) {
                Odds::Line(line) => {
                    prop_assert_eq!(line % 5, 0);
                    prop_assert!(line.abs() <= MAX_LINE);
                    prop_assert_eq!(line < 0, p >= 0.5);
                }
                other => prop_assert!(false, "unexpected {:?}", other),
            }
        }
    }
}
