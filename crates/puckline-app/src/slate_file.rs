// Slate files (TOML) and correction files.
//
// A slate file is what the lineup collector hands over for one day of games:
// either flat `teams`/`skaters`/`goalies` lists in slot order, or one
// `[[team]]` table per team whose lines may still have holes. Prices live in
// an `[odds]` table keyed by `TEAM1-TEAM2`.

use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

use puckline_core::corrections::{
    apply_corrections, parse_corrections, Correction, CorrectionError, CorrectionOutcome,
    RosterSheet,
};
use puckline_core::odds::MatchOdds;
use puckline_core::slate::{Slate, SlateError};

#[derive(Debug, Error)]
pub enum SlateFileError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse slate file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid slate date `{0}`, expected YYYY-MM-DD")]
    BadDate(String),

    #[error("slate file uses both flat lists and [[team]] tables")]
    MixedFormats,

    #[error(transparent)]
    Slate(#[from] SlateError),

    #[error("lineups incomplete, run `puckline missing` to see open slots: {0}")]
    Incomplete(#[source] CorrectionError),
}

// ---------------------------------------------------------------------------
// Raw TOML structs (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct RawSlate {
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    teams: Vec<String>,
    #[serde(default)]
    skaters: Vec<String>,
    #[serde(default)]
    goalies: Vec<String>,
    #[serde(default)]
    team: Vec<RawTeam>,
    #[serde(default)]
    odds: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTeam {
    abbr: String,
    #[serde(default)]
    goalie: Option<String>,
    #[serde(default)]
    forwards: Vec<Vec<String>>,
    #[serde(default)]
    defense: Vec<Vec<String>>,
}

/// Team abbreviations and odds keys are matched trimmed and uppercased.
fn normalize_abbr(raw: &str) -> String {
    raw.trim().to_uppercase()
}

// ---------------------------------------------------------------------------
// Parsed slate
// ---------------------------------------------------------------------------

/// A slate as read from disk, before corrections are applied.
#[derive(Debug, Clone, PartialEq)]
pub struct SlateInput {
    pub date: Option<NaiveDate>,
    /// Team sheets in file order; consecutive pairs are opponents.
    pub sheets: Vec<RosterSheet>,
    /// Prices keyed by `TEAM1-TEAM2`.
    pub odds: HashMap<String, MatchOdds>,
}

impl SlateInput {
    pub fn parse(text: &str, path: &Path) -> Result<Self, SlateFileError> {
        let raw: RawSlate = toml::from_str(text).map_err(|e| SlateFileError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;

        let date = raw
            .date
            .as_deref()
            .map(|d| {
                NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d")
                    .map_err(|_| SlateFileError::BadDate(d.to_string()))
            })
            .transpose()?;

        let has_flat = !(raw.teams.is_empty() && raw.skaters.is_empty() && raw.goalies.is_empty());
        let sheets: Vec<RosterSheet> = match (has_flat, raw.team.is_empty()) {
            (true, false) => return Err(SlateFileError::MixedFormats),
            (true, true) => {
                let teams: Vec<String> = raw.teams.iter().map(|t| normalize_abbr(t)).collect();
                let slate = Slate::from_flat_lists(&teams, &raw.skaters, &raw.goalies)?;
                slate
                    .matchups()
                    .iter()
                    .flat_map(|m| [&m.team1, &m.team2])
                    .map(RosterSheet::from_team_sheet)
                    .collect()
            }
            (false, false) => raw
                .team
                .into_iter()
                .map(|t| RosterSheet::from_lines(normalize_abbr(&t.abbr), t.forwards, t.defense, t.goalie))
                .collect(),
            (false, true) => return Err(SlateError::Empty.into()),
        };
        if sheets.len() % 2 != 0 {
            return Err(SlateError::OddTeamCount(sheets.len()).into());
        }

        let odds = raw
            .odds
            .into_iter()
            .map(|(key, line)| {
                let parsed = MatchOdds::parse_line(&line).unwrap_or_else(|e| {
                    warn!("odds for {}: {}; treating all three prices as missing", key, e);
                    MatchOdds::default()
                });
                (normalize_abbr(&key), parsed)
            })
            .collect();

        Ok(Self { date, sheets, odds })
    }

    pub fn load(path: &Path) -> Result<Self, SlateFileError> {
        let text = std::fs::read_to_string(path).map_err(|e| SlateFileError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&text, path)
    }

    /// Apply `corrections` to the sheets without consuming them.
    pub fn corrected(&self, corrections: &[Correction]) -> CorrectionOutcome {
        apply_corrections(&self.sheets, corrections)
    }

    /// Odds for `key` (`TEAM1-TEAM2`), or all-missing when none were given.
    pub fn odds_for(&self, key: &str) -> MatchOdds {
        self.odds.get(key).cloned().unwrap_or_default()
    }
}

/// Turn corrected sheets into a scoreable slate. Any remaining hole aborts.
pub fn build_slate(sheets: Vec<RosterSheet>) -> Result<Slate, SlateFileError> {
    let team_sheets = sheets
        .into_iter()
        .map(|s| s.into_team_sheet().map_err(SlateFileError::Incomplete))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Slate::from_sheets(team_sheets)?)
}

/// Read a corrections file. Lines that fail to parse are logged and skipped.
pub fn load_corrections(path: &Path) -> Result<Vec<Correction>, SlateFileError> {
    let text = std::fs::read_to_string(path).map_err(|e| SlateFileError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let (corrections, bad) = parse_corrections(&text);
    for (line, err) in bad {
        warn!("{}:{}: skipping correction: {}", path.display(), line, err);
    }
    Ok(corrections)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
