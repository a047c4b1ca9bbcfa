// Lineup-based expected goals: skater rates weighted by per-slot ice time.
//
// A lineup is 18 skaters in slot order. Indices 0-11 are four forward lines
// of three, indices 12-17 are three defense pairs of two. The slot index
// selects the ice-time tier, not the player's identity.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::weighting::RateTable;

pub const FORWARD_LINES: usize = 4;
pub const FORWARDS_PER_LINE: usize = 3;
pub const DEFENSE_PAIRS: usize = 3;
pub const DEFENSE_PER_PAIR: usize = 2;
pub const FORWARD_SLOTS: usize = FORWARD_LINES * FORWARDS_PER_LINE;
pub const DEFENSE_SLOTS: usize = DEFENSE_PAIRS * DEFENSE_PER_PAIR;
pub const LINEUP_SIZE: usize = FORWARD_SLOTS + DEFENSE_SLOTS;

#[derive(Debug, Error, PartialEq)]
pub enum LineupError {
    #[error("lineup must have exactly 18 skaters, got {0}")]
    WrongSize(usize),

    #[error("ice-time table needs {expected} {group} slots, got {got}")]
    WrongTableSize {
        group: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("ice time for {group} slot {slot} must be finite and > 0, got {minutes}")]
    NonPositiveMinutes {
        group: &'static str,
        slot: usize,
        minutes: f64,
    },

    #[error("{group} ice time must not increase from tier {tier} to tier {next}", next = .tier + 1)]
    TierOrder { group: &'static str, tier: usize },
}

// ---------------------------------------------------------------------------
// Lineup
// ---------------------------------------------------------------------------

/// Exactly 18 skater names in slot order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Lineup {
    skaters: Vec<String>,
}

impl Lineup {
    pub fn new(skaters: Vec<String>) -> Result<Self, LineupError> {
        if skaters.len() != LINEUP_SIZE {
            return Err(LineupError::WrongSize(skaters.len()));
        }
        Ok(Self { skaters })
    }

    /// Players on forward line `line` (0-based).
    pub fn forward_line(&self, line: usize) -> &[String] {
        let start = line * FORWARDS_PER_LINE;
        &self.skaters[start..start + FORWARDS_PER_LINE]
    }

    /// Players on defense pair `pair` (0-based).
    pub fn defense_pair(&self, pair: usize) -> &[String] {
        let start = FORWARD_SLOTS + pair * DEFENSE_PER_PAIR;
        &self.skaters[start..start + DEFENSE_PER_PAIR]
    }

    pub fn skaters(&self) -> &[String] {
        &self.skaters
    }

    pub fn contains(&self, player: &str) -> bool {
        self.skaters.iter().any(|s| s == player)
    }
}

impl TryFrom<Vec<String>> for Lineup {
    type Error = LineupError;

    fn try_from(value: Vec<String>) -> Result<Self, Self::Error> {
        Lineup::new(value)
    }
}

impl From<Lineup> for Vec<String> {
    fn from(value: Lineup) -> Self {
        value.skaters
    }
}

// ---------------------------------------------------------------------------
// Ice time table
// ---------------------------------------------------------------------------

/// Expected minutes per lineup slot.
#[derive(Debug, Clone, PartialEq)]
pub struct IceTimeTable {
    forwards: [f64; FORWARD_SLOTS],
    defense: [f64; DEFENSE_SLOTS],
}

impl IceTimeTable {
    /// Validate and build a table. Every slot must be positive and no tier may
    /// get more ice time than the tier above it.
    pub fn new(forwards: &[f64], defense: &[f64]) -> Result<Self, LineupError> {
        let forwards: [f64; FORWARD_SLOTS] =
            forwards.try_into().map_err(|_| LineupError::WrongTableSize {
                group: "forward",
                expected: FORWARD_SLOTS,
                got: forwards.len(),
            })?;
        let defense: [f64; DEFENSE_SLOTS] =
            defense.try_into().map_err(|_| LineupError::WrongTableSize {
                group: "defense",
                expected: DEFENSE_SLOTS,
                got: defense.len(),
            })?;

        check_minutes("forward", &forwards, FORWARDS_PER_LINE)?;
        check_minutes("defense", &defense, DEFENSE_PER_PAIR)?;

        Ok(Self { forwards, defense })
    }

    pub fn forward_minutes(&self, line: usize, position: usize) -> f64 {
        self.forwards[line * FORWARDS_PER_LINE + position]
    }

    pub fn defense_minutes(&self, pair: usize, position: usize) -> f64 {
        self.defense[pair * DEFENSE_PER_PAIR + position]
    }

    pub fn forwards(&self) -> &[f64] {
        &self.forwards
    }

    pub fn defense(&self) -> &[f64] {
        &self.defense
    }
}

impl Default for IceTimeTable {
    fn default() -> Self {
        Self {
            forwards: [
                19.33, 19.33, 19.33, //
                16.37, 16.37, 16.37, //
                13.47, 13.47, 13.47, //
                12.58, 12.58, 12.58,
            ],
            defense: [23.22, 23.22, 20.0, 20.0, 17.53, 17.53],
        }
    }
}

fn check_minutes(group: &'static str, minutes: &[f64], tier_size: usize) -> Result<(), LineupError> {
    for (slot, &m) in minutes.iter().enumerate() {
        if !m.is_finite() || m <= 0.0 {
            return Err(LineupError::NonPositiveMinutes {
                group,
                slot,
                minutes: m,
            });
        }
    }
    // Compare the smallest slot of each tier with the largest of the next.
    let tiers: Vec<&[f64]> = minutes.chunks(tier_size).collect();
    for (tier, pair) in tiers.windows(2).enumerate() {
        let floor = pair[0].iter().copied().fold(f64::INFINITY, f64::min);
        let ceiling = pair[1].iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if ceiling > floor {
            return Err(LineupError::TierOrder { group, tier });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Raw lineup expected goals, split by position group.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LineupScore {
    pub forwards: f64,
    pub defense: f64,
    pub total: f64,
}

/// Sum of rate x slot minutes over every skater. Players missing from
/// `rates` contribute 0.
pub fn score_lineup(lineup: &Lineup, ice_time: &IceTimeTable, rates: &RateTable) -> LineupScore {
    let mut forwards = 0.0;
    for line in 0..FORWARD_LINES {
        for (pos, player) in lineup.forward_line(line).iter().enumerate() {
            forwards += rates.rate(player) * ice_time.forward_minutes(line, pos);
        }
    }

    let mut defense = 0.0;
    for pair in 0..DEFENSE_PAIRS {
        for (pos, player) in lineup.defense_pair(pair).iter().enumerate() {
            defense += rates.rate(player) * ice_time.defense_minutes(pair, pos);
        }
    }

    LineupScore {
        forwards,
        defense,
        total: forwards + defense,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
