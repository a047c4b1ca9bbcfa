// American odds parsing and implied probabilities.

use std::fmt;

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum OddsError {
    #[error("odds value is empty")]
    Empty,

    #[error("could not parse odds `{0}`")]
    Malformed(String),

    #[error("odds `{0}` must have a magnitude of at least 100")]
    OutOfRange(String),

    #[error("odds line `{0}` must have three values: team1 team2 draw")]
    MalformedLine(String),
}

/// A price in American format. Positive values are underdogs (+130 pays 130
/// on 100 staked), negative values favourites (-110 stakes 110 to win 100).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmericanOdds(f64);

impl AmericanOdds {
    /// Parse `+130`, `-110`, `130` (treated as positive) or `EVEN`/`EV`.
    pub fn parse(raw: &str) -> Result<Self, OddsError> {
        let s = raw.trim();
        if s.is_empty() {
            return Err(OddsError::Empty);
        }
        if s.eq_ignore_ascii_case("even") || s.eq_ignore_ascii_case("ev") {
            return Ok(Self(100.0));
        }
        let digits = match s.strip_prefix('+') {
            Some(rest) if rest.starts_with(['+', '-']) => {
                return Err(OddsError::Malformed(s.to_string()))
            }
            Some(rest) => rest,
            None => s,
        };
        let value: f64 = digits
            .parse()
            .map_err(|_| OddsError::Malformed(s.to_string()))?;
        if !value.is_finite() {
            return Err(OddsError::Malformed(s.to_string()));
        }
        if value.abs() < 100.0 {
            return Err(OddsError::OutOfRange(s.to_string()));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Bookmaker-implied probability of the outcome.
    pub fn implied_probability(&self) -> f64 {
        if self.0 > 0.0 {
            100.0 / (self.0 + 100.0)
        } else {
            let odds = self.0.abs();
            odds / (odds + 100.0)
        }
    }

    /// Decimal payout per unit staked, including the stake.
    pub fn decimal(&self) -> f64 {
        if self.0 > 0.0 {
            1.0 + self.0 / 100.0
        } else {
            1.0 + 100.0 / self.0.abs()
        }
    }
}

impl fmt::Display for AmericanOdds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 > 0.0 {
            write!(f, "+{}", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// One side's price: the raw text as entered plus its parsed value, if any.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Quote {
    pub raw: String,
    pub odds: Option<AmericanOdds>,
}

impl Quote {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim().to_string();
        let odds = if raw.is_empty() {
            None
        } else {
            AmericanOdds::parse(&raw).ok()
        };
        Self { raw, odds }
    }

    pub fn missing() -> Self {
        Self::default()
    }

    pub fn implied_probability(&self) -> Option<f64> {
        self.odds.map(|o| o.implied_probability())
    }
}

/// Prices for the three regulation-time outcomes of a matchup.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MatchOdds {
    pub team1: Quote,
    pub team2: Quote,
    pub draw: Quote,
}

impl MatchOdds {
    pub fn new(team1: &str, team2: &str, draw: &str) -> Self {
        Self {
            team1: Quote::parse(team1),
            team2: Quote::parse(team2),
            draw: Quote::parse(draw),
        }
    }

    /// Parse a `"+130 -110 +280"` line (team1, team2, draw).
    pub fn parse_line(line: &str) -> Result<Self, OddsError> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts.as_slice() {
            [t1, t2, d] => Ok(Self::new(t1, t2, d)),
            _ => Err(OddsError::MalformedLine(line.trim().to_string())),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.team1.odds.is_some() && self.team2.odds.is_some() && self.draw.odds.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.team1.raw.is_empty() && self.team2.raw.is_empty() && self.draw.raw.is_empty()
    }

    /// Sum of implied probabilities minus one (the bookmaker margin), when
    /// all three prices are valid.
    pub fn overround(&self) -> Option<f64> {
        let total = self.team1.implied_probability()?
            + self.team2.implied_probability()?
            + self.draw.implied_probability()?;
        Some(total - 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn implied(s: &str) -> f64 {
        AmericanOdds::parse(s).unwrap().implied_probability()
    }

    #[test]
    fn implied_probability_reference_values() {
        assert_eq!(implied("+100"), 0.5);
        assert_eq!(implied("-100"), 0.5);
        assert_eq!(implied("+300"), 0.25);
        assert_eq!(implied("-300"), 0.75);
    }

    #[test]
    fn unsigned_is_positive_and_even_is_plus_100() {
        assert_eq!(AmericanOdds::parse("150").unwrap().value(), 150.0);
        assert_eq!(implied("EVEN"), 0.5);
        assert_eq!(implied("ev"), 0.5);
        assert_eq!(implied(" -110 "), 110.0 / 210.0);
    }

    #[test]
    fn malformed_odds_rejected() {
        assert_eq!(AmericanOdds::parse(""), Err(OddsError::Empty));
        assert_eq!(AmericanOdds::parse("abc"), Err(OddsError::Malformed("abc".into())));
        assert!(matches!(AmericanOdds::parse("+-110"), Err(OddsError::Malformed(_))));
        assert!(matches!(AmericanOdds::parse("inf"), Err(OddsError::Malformed(_))));
        assert_eq!(AmericanOdds::parse("+50"), Err(OddsError::OutOfRange("+50".into())));
        assert!(matches!(AmericanOdds::parse("0"), Err(OddsError::OutOfRange(_))));
    }

    #[test]
    fn decimal_conversion() {
        assert!((AmericanOdds::parse("+150").unwrap().decimal() - 2.5).abs() < 1e-12);
        assert!((AmericanOdds::parse("-200").unwrap().decimal() - 1.5).abs() < 1e-12);
    }

    #[test]
    fn display_keeps_sign() {
        assert_eq!(AmericanOdds::parse("130").unwrap().to_string(), "+130");
        assert_eq!(AmericanOdds::parse("-110").unwrap().to_string(), "-110");
    }

    #[test]
    fn parse_line_three_values() {
        let odds = MatchOdds::parse_line("+130 -110 +280").unwrap();
        assert!(odds.is_complete());
        assert_eq!(odds.team1.raw, "+130");
        assert_eq!(odds.draw.implied_probability(), Some(100.0 / 380.0));
        let over = odds.overround().unwrap();
        assert!(over > 0.0);
    }

    #[test]
    fn parse_line_wrong_shape() {
        assert_eq!(
            MatchOdds::parse_line("+130 -110"),
            Err(OddsError::MalformedLine("+130 -110".into()))
        );
        assert!(MatchOdds::parse_line("").is_err());
        assert!(MatchOdds::parse_line("+130 -110 +280 +100").is_err());
    }

    #[test]
    fn quote_keeps_raw_text_when_unparseable() {
        let odds = MatchOdds::new("+130", "oops", "");
        assert!(!odds.is_complete());
        assert!(!odds.is_empty());
        assert_eq!(odds.team2.raw, "oops");
        assert_eq!(odds.team2.odds, None);
        assert_eq!(odds.draw, Quote::missing());
        assert_eq!(odds.overround(), None);
    }
}
