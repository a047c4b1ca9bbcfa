// Recency-weighted per-minute rates built from multi-season player stats.
//
// Each season carries an explicit weight. A player's rate is the weighted
// metric sum divided by the weighted time-on-ice sum across every season the
// player appears in.

use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq)]
pub enum WeightingError {
    #[error("recency weight must be strictly between 0 and 1, got {0}")]
    InvalidRecencyWeight(f64),

    #[error("at least one season is required")]
    NoSeasons,

    #[error("season id must not be empty")]
    EmptySeasonId,

    #[error("season `{0}` is listed more than once")]
    DuplicateSeason(String),

    #[error("weight for season `{season}` must be finite and >= 0, got {weight}")]
    InvalidWeight { season: String, weight: f64 },

    #[error("season `{season}` (player `{player}`) has no configured weight")]
    UnknownSeason { season: String, player: String },
}

// ---------------------------------------------------------------------------
// Input records
// ---------------------------------------------------------------------------

/// One player's raw statistic for one season.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSeasonStat {
    pub player: String,
    pub season: String,
    /// Raw metric total (e.g. individual expected goals, GSAA).
    pub metric: f64,
    /// Time on ice in minutes.
    pub toi: f64,
}

impl PlayerSeasonStat {
    pub fn new(player: impl Into<String>, season: impl Into<String>, metric: f64, toi: f64) -> Self {
        Self {
            player: player.into(),
            season: season.into(),
            metric,
            toi,
        }
    }
}

// ---------------------------------------------------------------------------
// Season weights
// ---------------------------------------------------------------------------

/// Ordered mapping of season id to weight. Order is most recent first.
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonWeights {
    entries: Vec<(String, f64)>,
}

impl SeasonWeights {
    /// Build from explicit `(season, weight)` pairs.
    pub fn new<I, S>(entries: I) -> Result<Self, WeightingError>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut out: Vec<(String, f64)> = Vec::new();
        for (season, weight) in entries {
            let season = season.into();
            if season.trim().is_empty() {
                return Err(WeightingError::EmptySeasonId);
            }
            if !weight.is_finite() || weight < 0.0 {
                return Err(WeightingError::InvalidWeight { season, weight });
            }
            if out.iter().any(|(s, _)| *s == season) {
                return Err(WeightingError::DuplicateSeason(season));
            }
            out.push((season, weight));
        }
        if out.is_empty() {
            return Err(WeightingError::NoSeasons);
        }
        Ok(Self { entries: out })
    }

    /// The most recent season (first in `seasons`) gets `recency_weight`,
    /// every older season gets `1 - recency_weight`.
    pub fn recency<S: AsRef<str>>(seasons: &[S], recency_weight: f64) -> Result<Self, WeightingError> {
        if !(recency_weight > 0.0 && recency_weight < 1.0) {
            return Err(WeightingError::InvalidRecencyWeight(recency_weight));
        }
        Self::new(seasons.iter().enumerate().map(|(i, s)| {
            let w = if i == 0 { recency_weight } else { 1.0 - recency_weight };
            (s.as_ref().to_string(), w)
        }))
    }

    pub fn weight(&self, season: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(s, _)| s == season)
            .map(|(_, w)| *w)
    }

    pub fn seasons(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(s, _)| s.as_str())
    }

    pub fn most_recent(&self) -> &str {
        // `new` rejects an empty list
        &self.entries[0].0
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Weighted totals for a single player.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerRate {
    pub weighted_metric: f64,
    pub weighted_toi: f64,
    pub rate: f64,
    pub seasons: usize,
}

/// Per-player weighted rates. Lookups for unknown players return 0.
#[derive(Debug, Clone, Default)]
pub struct RateTable {
    rates: HashMap<String, PlayerRate>,
}

impl RateTable {
    /// Rate for `player`, or 0.0 when the player has no usable record.
    pub fn rate(&self, player: &str) -> f64 {
        match self.rates.get(player) {
            Some(r) => r.rate,
            None => {
                debug!("no weighted rate for '{}', defaulting to 0", player);
                0.0
            }
        }
    }

    pub fn get(&self, player: &str) -> Option<&PlayerRate> {
        self.rates.get(player)
    }

    pub fn contains(&self, player: &str) -> bool {
        self.rates.contains_key(player)
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Insert or replace a rate directly. Mostly useful for tests and for
    /// callers that already hold per-minute rates.
    pub fn insert(&mut self, player: impl Into<String>, rate: f64) {
        self.rates.insert(
            player.into(),
            PlayerRate {
                weighted_metric: rate,
                weighted_toi: 1.0,
                rate,
                seasons: 1,
            },
        );
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PlayerRate)> {
        self.rates.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, f64)> for RateTable {
    fn from_iter<T: IntoIterator<Item = (String, f64)>>(iter: T) -> Self {
        let mut table = RateTable::default();
        for (player, rate) in iter {
            table.insert(player, rate);
        }
        table
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Blend every player's seasons into one weighted per-minute rate.
///
/// A player seen in a single season keeps that season's weight on both sums,
/// so the rate equals the raw per-minute rate while the weighted TOI stays
/// scaled by the season weight. Players whose weighted TOI is not positive
/// are left out of the table and therefore resolve to 0.
///
/// Fails on the first record whose season has no configured weight.
pub fn weighted_rates(
    records: &[PlayerSeasonStat],
    weights: &SeasonWeights,
) -> Result<RateTable, WeightingError> {
    let mut sums: HashMap<String, (f64, f64, usize)> = HashMap::new();

    for rec in records {
        let w = weights
            .weight(&rec.season)
            .ok_or_else(|| WeightingError::UnknownSeason {
                season: rec.season.clone(),
                player: rec.player.clone(),
            })?;
        let entry = sums.entry(rec.player.clone()).or_insert((0.0, 0.0, 0));
        entry.0 += rec.metric * w;
        entry.1 += rec.toi * w;
        entry.2 += 1;
    }

    let mut rates = HashMap::with_capacity(sums.len());
    for (player, (weighted_metric, weighted_toi, seasons)) in sums {
        if weighted_toi <= 0.0 {
            warn!("player '{}' has no weighted ice time, rate defaults to 0", player);
            continue;
        }
        rates.insert(
            player,
            PlayerRate {
                weighted_metric,
                weighted_toi,
                rate: weighted_metric / weighted_toi,
                seasons,
            },
        );
    }

    Ok(RateTable { rates })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
