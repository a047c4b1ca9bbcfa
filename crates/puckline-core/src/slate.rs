// A day's slate of matchups, built from the lineup source's ordered lists.

use thiserror::Error;

use crate::lineup::{Lineup, LineupError, LINEUP_SIZE};

#[derive(Debug, Error, PartialEq)]
pub enum SlateError {
    #[error("slate has no teams")]
    Empty,

    #[error("teams must come in opponent pairs, got {0} teams")]
    OddTeamCount(usize),

    #[error("expected {expected} skaters (18 per team), got {got}")]
    SkaterCount { expected: usize, got: usize },

    #[error("expected {expected} goalies (one per team), got {got}")]
    GoalieCount { expected: usize, got: usize },

    #[error("team `{0}` appears more than once on the slate")]
    DuplicateTeam(String),

    #[error(transparent)]
    Lineup(#[from] LineupError),
}

/// One team's side of a matchup.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamSheet {
    pub team: String,
    pub lineup: Lineup,
    pub goalie: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Matchup {
    pub team1: TeamSheet,
    pub team2: TeamSheet,
}

impl Matchup {
    /// Key used for odds and log lookups, e.g. `BOS-TOR`.
    pub fn key(&self) -> String {
        format!("{}-{}", self.team1.team, self.team2.team)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Slate {
    matchups: Vec<Matchup>,
}

impl Slate {
    /// Pair up consecutive team sheets as opponents.
    pub fn from_sheets(sheets: Vec<TeamSheet>) -> Result<Self, SlateError> {
        if sheets.is_empty() {
            return Err(SlateError::Empty);
        }
        if sheets.len() % 2 != 0 {
            return Err(SlateError::OddTeamCount(sheets.len()));
        }
        for (i, sheet) in sheets.iter().enumerate() {
            if sheets[..i].iter().any(|s| s.team == sheet.team) {
                return Err(SlateError::DuplicateTeam(sheet.team.clone()));
            }
        }

        let mut matchups = Vec::with_capacity(sheets.len() / 2);
        let mut iter = sheets.into_iter();
        while let (Some(team1), Some(team2)) = (iter.next(), iter.next()) {
            matchups.push(Matchup { team1, team2 });
        }
        Ok(Self { matchups })
    }

    /// Build from flat lists: adjacent team abbreviations are opponents,
    /// skaters come 18 per team in slot order, goalies one per team.
    pub fn from_flat_lists(
        teams: &[String],
        skaters: &[String],
        goalies: &[String],
    ) -> Result<Self, SlateError> {
        if teams.is_empty() {
            return Err(SlateError::Empty);
        }
        if teams.len() % 2 != 0 {
            return Err(SlateError::OddTeamCount(teams.len()));
        }
        let expected = teams.len() * LINEUP_SIZE;
        if skaters.len() != expected {
            return Err(SlateError::SkaterCount {
                expected,
                got: skaters.len(),
            });
        }
        if goalies.len() != teams.len() {
            return Err(SlateError::GoalieCount {
                expected: teams.len(),
                got: goalies.len(),
            });
        }

        let sheets = teams
            .iter()
            .zip(skaters.chunks(LINEUP_SIZE))
            .zip(goalies)
            .map(|((team, chunk), goalie)| {
                Ok(TeamSheet {
                    team: team.clone(),
                    lineup: Lineup::new(chunk.to_vec())?,
                    goalie: Some(goalie.clone()),
                })
            })
            .collect::<Result<Vec<_>, SlateError>>()?;

        Self::from_sheets(sheets)
    }

    pub fn matchups(&self) -> &[Matchup] {
        &self.matchups
    }

    pub fn len(&self) -> usize {
        self.matchups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matchups.is_empty()
    }

    pub fn teams(&self) -> impl Iterator<Item = &str> {
        self.matchups
            .iter()
            .flat_map(|m| [m.team1.team.as_str(), m.team2.team.as_str()])
    }
}
