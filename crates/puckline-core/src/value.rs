// Value detection: model probabilities against bookmaker-implied ones.
//
// edge = (model / book - 1) * 100. An outcome is a value bet when its edge is
// strictly above the policy threshold.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::matrix::OutcomeProbabilities;
use crate::odds::{MatchOdds, Quote};

pub const DEFAULT_EDGE_THRESHOLD: f64 = 10.0;

/// Which regulation-time outcome a bet backs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BetType {
    Team1,
    Team2,
    Draw,
}

impl BetType {
    pub const ALL: [BetType; 3] = [BetType::Team1, BetType::Team2, BetType::Draw];
}

impl fmt::Display for BetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BetType::Team1 => "team1",
            BetType::Team2 => "team2",
            BetType::Draw => "draw",
        };
        f.write_str(s)
    }
}

/// How partially priced matchups are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OddsGating {
    /// Every outcome must have a valid price or the matchup is skipped.
    #[default]
    RequireAllOutcomes,
    /// Evaluate whichever outcomes have a valid price.
    PerOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValuePolicy {
    pub threshold: f64,
    pub gating: OddsGating,
}

impl Default for ValuePolicy {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_EDGE_THRESHOLD,
            gating: OddsGating::RequireAllOutcomes,
        }
    }
}

/// Percentage edge of the model over the book.
pub fn edge(model_probability: f64, book_probability: f64) -> f64 {
    (model_probability / book_probability - 1.0) * 100.0
}

/// One evaluated outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueLine {
    pub bet_type: BetType,
    pub model_probability: f64,
    pub book_probability: f64,
    pub edge: f64,
    pub odds: String,
    pub qualifies: bool,
}

/// Result of comparing one matchup's model output against its prices.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValueAnalysis {
    pub lines: Vec<ValueLine>,
}

impl ValueAnalysis {
    /// True when no outcome could be evaluated.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn value_bets(&self) -> impl Iterator<Item = &ValueLine> {
        self.lines.iter().filter(|l| l.qualifies)
    }
}

fn quote_for(odds: &MatchOdds, bet: BetType) -> &Quote {
    match bet {
        BetType::Team1 => &odds.team1,
        BetType::Team2 => &odds.team2,
        BetType::Draw => &odds.draw,
    }
}

fn model_for(probs: &OutcomeProbabilities, bet: BetType) -> f64 {
    match bet {
        BetType::Team1 => probs.team1_win,
        BetType::Team2 => probs.team2_win,
        BetType::Draw => probs.draw,
    }
}

/// Evaluate every priced outcome under `policy`. Outcomes without a valid
/// price are never evaluated; with `RequireAllOutcomes` a single missing or
/// malformed price disables the whole matchup.
pub fn evaluate(probs: &OutcomeProbabilities, odds: &MatchOdds, policy: &ValuePolicy) -> ValueAnalysis {
    if policy.gating == OddsGating::RequireAllOutcomes && !odds.is_complete() {
        return ValueAnalysis::default();
    }

    let lines = BetType::ALL
        .iter()
        .filter_map(|&bet| {
            let quote = quote_for(odds, bet);
            let book = quote.implied_probability()?;
            let model = model_for(probs, bet);
            let e = edge(model, book);
            Some(ValueLine {
                bet_type: bet,
                model_probability: model,
                book_probability: book,
                edge: e,
                odds: quote.raw.clone(),
                qualifies: e > policy.threshold,
            })
        })
        .collect();

    ValueAnalysis { lines }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probs(t1: f64, d: f64, t2: f64) -> OutcomeProbabilities {
        OutcomeProbabilities {
            team1_win: t1,
            draw: d,
            team2_win: t2,
        }
    }

    #[test]
    fn edge_reference_values() {
        assert!((edge(0.6, 0.5) - 20.0).abs() < 1e-9);
        assert_eq!(edge(0.5, 0.5), 0.0);
        assert!(edge(0.4, 0.5) < 0.0);
    }

    #[test]
    fn qualifies_only_above_threshold() {
        // +100 on every outcome: book probability 0.5 each
        let odds = MatchOdds::new("+100", "+100", "+100");
        let analysis = evaluate(&probs(0.6, 0.5, 0.54), &odds, &ValuePolicy::default());

        assert_eq!(analysis.lines.len(), 3);
        let bets: Vec<BetType> = analysis.value_bets().map(|l| l.bet_type).collect();
        // 0.6 -> +20% qualifies, 0.5 -> 0% and 0.54 -> +8% do not
        assert_eq!(bets, vec![BetType::Team1]);
        let draw = &analysis.lines[2];
        assert_eq!(draw.bet_type, BetType::Draw);
        assert_eq!(draw.edge, 0.0);
        assert!(!draw.qualifies);
    }

    #[test]
    fn strict_gating_skips_partial_odds() {
        let odds = MatchOdds::new("+250", "-110", "");
        let analysis = evaluate(&probs(0.5, 0.2, 0.3), &odds, &ValuePolicy::default());
        assert!(analysis.is_empty());

        let malformed = MatchOdds::new("+250", "-110", "n/a");
        assert!(evaluate(&probs(0.5, 0.2, 0.3), &malformed, &ValuePolicy::default()).is_empty());
    }

    #[test]
    fn per_outcome_gating_evaluates_priced_outcomes() {
        let policy = ValuePolicy {
            gating: OddsGating::PerOutcome,
            ..ValuePolicy::default()
        };
        let odds = MatchOdds::new("+250", "-110", "");
        let analysis = evaluate(&probs(0.5, 0.2, 0.3), &odds, &policy);
        assert_eq!(analysis.lines.len(), 2);
        let t1 = &analysis.lines[0];
        assert_eq!(t1.odds, "+250");
        assert!((t1.book_probability - 100.0 / 350.0).abs() < 1e-12);
        assert!(t1.qualifies);
        assert!(!analysis.lines[1].qualifies);
    }

    #[test]
    fn custom_threshold() {
        let policy = ValuePolicy {
            threshold: 25.0,
            ..ValuePolicy::default()
        };
        let odds = MatchOdds::new("+100", "+100", "+100");
        let analysis = evaluate(&probs(0.6, 0.1, 0.3), &odds, &policy);
        assert_eq!(analysis.value_bets().count(), 0);
    }

    #[test]
    fn bet_type_display_and_default_gating() {
        assert_eq!(BetType::Draw.to_string(), "draw");
        assert_eq!(BetType::Team1.to_string(), "team1");
        assert_eq!(OddsGating::default(), OddsGating::RequireAllOutcomes);
    }
}
