// Structured lineup repair.
//
// Lineup sources sometimes miss a player. Instead of prompting line by line,
// callers collect corrections such as `BOS F 2 David Pastrnak` from any front
// end and apply them to the incomplete roster sheets in one pure step.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::lineup::{
    Lineup, DEFENSE_PAIRS, DEFENSE_PER_PAIR, FORWARDS_PER_LINE, FORWARD_LINES, LINEUP_SIZE,
};
use crate::slate::TeamSheet;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CorrectionError {
    #[error("expected `[team] [position] [line] [player name]`, got `{0}`")]
    Malformed(String),

    #[error("position must be F, D or G, got `{0}`")]
    UnknownPosition(String),

    #[error("line `{0}` is not a number")]
    BadLine(String),

    #[error("{position} line {line} does not exist")]
    LineOutOfRange { position: SlotGroup, line: usize },

    #[error("team `{0}` is not playing on this slate")]
    UnknownTeam(String),

    #[error("{position} line {line} for {team} is already full")]
    LineFull {
        team: String,
        position: SlotGroup,
        line: usize,
    },

    #[error("{team} already has goalie `{existing}`")]
    GoalieSet { team: String, existing: String },

    #[error("{team} lineup is incomplete: {missing:?}")]
    Incomplete { team: String, missing: Vec<MissingSlot> },
}

/// Position group named in a correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotGroup {
    #[serde(rename = "F")]
    Forward,
    #[serde(rename = "D")]
    Defense,
    #[serde(rename = "G")]
    Goalie,
}

impl SlotGroup {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_uppercase().as_str() {
            "F" | "C" | "W" | "LW" | "RW" => Some(SlotGroup::Forward),
            "D" => Some(SlotGroup::Defense),
            "G" => Some(SlotGroup::Goalie),
            _ => None,
        }
    }

    fn lines(self) -> usize {
        match self {
            SlotGroup::Forward => FORWARD_LINES,
            SlotGroup::Defense => DEFENSE_PAIRS,
            SlotGroup::Goalie => 1,
        }
    }
}

impl fmt::Display for SlotGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SlotGroup::Forward => "F",
            SlotGroup::Defense => "D",
            SlotGroup::Goalie => "G",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Corrections
// ---------------------------------------------------------------------------

/// Add `player` to `team`'s `line` (1-based) at `position`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correction {
    pub team: String,
    pub position: SlotGroup,
    pub line: usize,
    pub player: String,
}

impl Correction {
    /// Parse `"BOS F 2 David Pastrnak"` or `"TOR G 1 Joseph Woll"`.
    pub fn parse(input: &str) -> Result<Self, CorrectionError> {
        let mut parts = input.split_whitespace();
        let (Some(team), Some(pos), Some(line)) = (parts.next(), parts.next(), parts.next()) else {
            return Err(CorrectionError::Malformed(input.trim().to_string()));
        };
        let player = parts.collect::<Vec<_>>().join(" ");
        if player.is_empty() {
            return Err(CorrectionError::Malformed(input.trim().to_string()));
        }

        let position =
            SlotGroup::from_code(pos).ok_or_else(|| CorrectionError::UnknownPosition(pos.to_string()))?;
        let line: usize = line
            .parse()
            .map_err(|_| CorrectionError::BadLine(line.to_string()))?;
        if line == 0 || line > position.lines() {
            return Err(CorrectionError::LineOutOfRange { position, line });
        }

        Ok(Self {
            team: team.to_uppercase(),
            position,
            line,
            player,
        })
    }
}

/// Parse a block of corrections, one per line. Blank lines and `#` comments
/// are ignored. Bad lines are returned alongside the good ones.
pub fn parse_corrections(text: &str) -> (Vec<Correction>, Vec<(usize, CorrectionError)>) {
    let mut ok = Vec::new();
    let mut bad = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match Correction::parse(line) {
            Ok(c) => ok.push(c),
            Err(e) => bad.push((idx + 1, e)),
        }
    }
    (ok, bad)
}

// ---------------------------------------------------------------------------
// Roster sheets
// ---------------------------------------------------------------------------

/// One unfilled slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingSlot {
    pub position: SlotGroup,
    /// 1-based line or pair number.
    pub line: usize,
    pub count: usize,
}

/// A team lineup that may still have empty slots.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RosterSheet {
    pub team: String,
    pub forwards: Vec<Vec<String>>,
    pub defense: Vec<Vec<String>>,
    pub goalie: Option<String>,
}

impl RosterSheet {
    pub fn new(team: impl Into<String>) -> Self {
        Self {
            team: team.into(),
            forwards: vec![Vec::new(); FORWARD_LINES],
            defense: vec![Vec::new(); DEFENSE_PAIRS],
            goalie: None,
        }
    }

    /// Build from grouped lines. Extra lines beyond four forward lines or
    /// three pairs are ignored; short groups are padded with empty lines.
    pub fn from_lines(
        team: impl Into<String>,
        forwards: Vec<Vec<String>>,
        defense: Vec<Vec<String>>,
        goalie: Option<String>,
    ) -> Self {
        let mut sheet = Self::new(team);
        for (slot, line) in sheet.forwards.iter_mut().zip(forwards) {
            *slot = line;
        }
        for (slot, pair) in sheet.defense.iter_mut().zip(defense) {
            *slot = pair;
        }
        sheet.goalie = goalie.filter(|g| !g.trim().is_empty());
        sheet
    }

    /// A complete sheet from an already validated team sheet.
    pub fn from_team_sheet(sheet: &TeamSheet) -> Self {
        Self {
            team: sheet.team.clone(),
            forwards: (0..FORWARD_LINES)
                .map(|l| sheet.lineup.forward_line(l).to_vec())
                .collect(),
            defense: (0..DEFENSE_PAIRS)
                .map(|p| sheet.lineup.defense_pair(p).to_vec())
                .collect(),
            goalie: sheet.goalie.clone(),
        }
    }

    /// Every slot still missing a player, in lineup order.
    pub fn missing_slots(&self) -> Vec<MissingSlot> {
        let mut out = Vec::new();
        for (i, line) in self.forwards.iter().enumerate() {
            if line.len() < FORWARDS_PER_LINE {
                out.push(MissingSlot {
                    position: SlotGroup::Forward,
                    line: i + 1,
                    count: FORWARDS_PER_LINE - line.len(),
                });
            }
        }
        for (i, pair) in self.defense.iter().enumerate() {
            if pair.len() < DEFENSE_PER_PAIR {
                out.push(MissingSlot {
                    position: SlotGroup::Defense,
                    line: i + 1,
                    count: DEFENSE_PER_PAIR - pair.len(),
                });
            }
        }
        if self.goalie.is_none() {
            out.push(MissingSlot {
                position: SlotGroup::Goalie,
                line: 1,
                count: 1,
            });
        }
        out
    }

    pub fn is_complete(&self) -> bool {
        self.missing_slots().is_empty()
    }

    fn apply(&mut self, c: &Correction) -> Result<(), CorrectionError> {
        let out_of_range = CorrectionError::LineOutOfRange {
            position: c.position,
            line: c.line,
        };
        let index = c.line.checked_sub(1);
        let (slots, capacity) = match c.position {
            SlotGroup::Forward => (
                index.and_then(|i| self.forwards.get_mut(i)).ok_or(out_of_range)?,
                FORWARDS_PER_LINE,
            ),
            SlotGroup::Defense => (
                index.and_then(|i| self.defense.get_mut(i)).ok_or(out_of_range)?,
                DEFENSE_PER_PAIR,
            ),
            SlotGroup::Goalie => {
                if let Some(existing) = &self.goalie {
                    return Err(CorrectionError::GoalieSet {
                        team: self.team.clone(),
                        existing: existing.clone(),
                    });
                }
                self.goalie = Some(c.player.clone());
                return Ok(());
            }
        };
        if slots.len() >= capacity {
            return Err(CorrectionError::LineFull {
                team: self.team.clone(),
                position: c.position,
                line: c.line,
            });
        }
        slots.push(c.player.clone());
        Ok(())
    }

    /// Convert to a scored team sheet. Fails while any slot is empty; lines
    /// holding more players than slots are cut to size.
    pub fn into_team_sheet(self) -> Result<TeamSheet, CorrectionError> {
        let missing = self.missing_slots();
        if !missing.is_empty() {
            return Err(CorrectionError::Incomplete {
                team: self.team,
                missing,
            });
        }
        let mut skaters = Vec::with_capacity(LINEUP_SIZE);
        for line in &self.forwards {
            skaters.extend(line.iter().take(FORWARDS_PER_LINE).cloned());
        }
        for pair in &self.defense {
            skaters.extend(pair.iter().take(DEFENSE_PER_PAIR).cloned());
        }
        let lineup = Lineup::new(skaters).map_err(|_| CorrectionError::Incomplete {
            team: self.team.clone(),
            missing: Vec::new(),
        })?;
        Ok(TeamSheet {
            team: self.team,
            lineup,
            goalie: self.goalie,
        })
    }
}

/// Outcome of applying a batch of corrections.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrectionOutcome {
    pub sheets: Vec<RosterSheet>,
    pub applied: Vec<Correction>,
    pub rejected: Vec<(Correction, CorrectionError)>,
}

/// Apply `corrections` in order to copies of `sheets`. A correction that
/// cannot be applied is returned in `rejected`; the rest still apply.
pub fn apply_corrections(sheets: &[RosterSheet], corrections: &[Correction]) -> CorrectionOutcome {
    let mut sheets = sheets.to_vec();
    let mut applied = Vec::new();
    let mut rejected = Vec::new();

    for c in corrections {
        let Some(sheet) = sheets.iter_mut().find(|s| s.team.eq_ignore_ascii_case(&c.team)) else {
            rejected.push((c.clone(), CorrectionError::UnknownTeam(c.team.clone())));
            continue;
        };
        match sheet.apply(c) {
            Ok(()) => applied.push(c.clone()),
            Err(e) => rejected.push((c.clone(), e)),
        }
    }

    CorrectionOutcome {
        sheets,
        applied,
        rejected,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn names(prefix: &str, n: usize) -> Vec<String> {
        (0..n).map(|i| format!("{prefix}{i}")).collect()
    }

    /// A complete sheet minus the last forward on line 2 and the goalie.
    fn nearly_full(team: &str) -> RosterSheet {
        let mut forwards: Vec<Vec<String>> = names("F", 12).chunks(3).map(|c| c.to_vec()).collect();
        forwards[1].pop();
        let defense = names("D", 6).chunks(2).map(|c| c.to_vec()).collect();
        RosterSheet::from_lines(team, forwards, defense, None)
    }

    #[test]
    fn parse_correction_line() {
        let c = Correction::parse("bos F 2 David Pastrnak").unwrap();
        assert_eq!(c.team, "BOS");
        assert_eq!(c.position, SlotGroup::Forward);
        assert_eq!(c.line, 2);
        assert_eq!(c.player, "David Pastrnak");

        let g = Correction::parse("TOR G 1 Joseph Woll").unwrap();
        assert_eq!(g.position, SlotGroup::Goalie);
    }

    #[test]
    fn parse_correction_errors() {
        assert!(matches!(Correction::parse("BOS F 2"), Err(CorrectionError::Malformed(_))));
        assert!(matches!(Correction::parse("BOS"), Err(CorrectionError::Malformed(_))));
        assert_eq!(
            Correction::parse("BOS X 2 Someone"),
            Err(CorrectionError::UnknownPosition("X".into()))
        );
        assert_eq!(
            Correction::parse("BOS F two Someone"),
            Err(CorrectionError::BadLine("two".into()))
        );
        assert_eq!(
            Correction::parse("BOS D 4 Someone"),
            Err(CorrectionError::LineOutOfRange {
                position: SlotGroup::Defense,
                line: 4
            })
        );
        assert!(matches!(
            Correction::parse("BOS G 2 Someone"),
            Err(CorrectionError::LineOutOfRange { .. })
        ));
    }

    #[test]
    fn parse_block_skips_comments_and_collects_errors() {
        let text = "\
# fixes for tonight
BOS F 2 David Pastrnak

TOR G 1 Joseph Woll
nonsense";
        let (ok, bad) = parse_corrections(text);
        assert_eq!(ok.len(), 2);
        assert_eq!(bad.len(), 1);
        assert_eq!(bad[0].0, 5);
    }

    #[test]
    fn missing_slots_reported() {
        let sheet = nearly_full("BOS");
        assert_eq!(
            sheet.missing_slots(),
            vec![
                MissingSlot {
                    position: SlotGroup::Forward,
                    line: 2,
                    count: 1
                },
                MissingSlot {
                    position: SlotGroup::Goalie,
                    line: 1,
                    count: 1
                },
            ]
        );
        assert_eq!(RosterSheet::new("TOR").missing_slots().len(), 8);
    }

    #[test]
    fn corrections_fill_sheet() {
        let sheets = vec![nearly_full("BOS"), nearly_full("TOR")];
        let corrections = vec![
            Correction::parse("BOS F 2 David Pastrnak").unwrap(),
            Correction::parse("BOS G 1 Jeremy Swayman").unwrap(),
        ];
        let outcome = apply_corrections(&sheets, &corrections);

        assert_eq!(outcome.applied.len(), 2);
        assert!(outcome.rejected.is_empty());
        assert!(outcome.sheets[0].is_complete());
        assert!(!outcome.sheets[1].is_complete());
        // input is untouched
        assert!(!sheets[0].is_complete());

        let team = outcome.sheets[0].clone().into_team_sheet().unwrap();
        assert_eq!(team.lineup.forward_line(1)[2], "David Pastrnak");
        assert_eq!(team.goalie.as_deref(), Some("Jeremy Swayman"));
    }

    #[test]
    fn rejected_corrections_keep_reason() {
        let sheets = vec![nearly_full("BOS")];
        let corrections = vec![
            Correction::parse("MTL F 1 Nick Suzuki").unwrap(),
            Correction::parse("BOS F 1 Extra Forward").unwrap(),
            Correction::parse("BOS G 1 Jeremy Swayman").unwrap(),
            Correction::parse("BOS G 1 Joonas Korpisalo").unwrap(),
        ];
        let outcome = apply_corrections(&sheets, &corrections);

        assert_eq!(outcome.applied.len(), 1);
        assert_eq!(outcome.rejected.len(), 3);
        assert_eq!(outcome.rejected[0].1, CorrectionError::UnknownTeam("MTL".into()));
        assert!(matches!(
            outcome.rejected[1].1,
            CorrectionError::LineFull { line: 1, .. }
        ));
        assert!(matches!(outcome.rejected[2].1, CorrectionError::GoalieSet { .. }));
    }

    #[test]
    fn team_sheet_round_trips_through_roster_sheet() {
        let corrections = [
            Correction::parse("BOS G 1 Jeremy Swayman").unwrap(),
            Correction::parse("BOS F 2 David Pastrnak").unwrap(),
        ];
        let outcome = apply_corrections(&[nearly_full("BOS")], &corrections);
        let team = outcome.sheets[0].clone().into_team_sheet().unwrap();

        let sheet = RosterSheet::from_team_sheet(&team);
        assert!(sheet.is_complete());
        assert_eq!(sheet.into_team_sheet().unwrap(), team);
    }

    #[test]
    fn incomplete_sheet_cannot_become_team_sheet() {
        let err = nearly_full("BOS").into_team_sheet().unwrap_err();
        match err {
            CorrectionError::Incomplete { team, missing } => {
                assert_eq!(team, "BOS");
                assert_eq!(missing.len(), 2);
            }
            other => panic!("expected Incomplete, got: {other}"),
        }
    }
}
