// Team display names and colours, keyed by abbreviation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum DirectoryError {
    #[error("team abbreviation must not be empty")]
    EmptyAbbreviation,

    #[error("team `{team}` has invalid colour `{color}`, expected #RRGGBB")]
    InvalidColor { team: String, color: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamInfo {
    pub name: String,
    pub color: String,
}

/// Immutable abbreviation -> team info map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeamDirectory {
    teams: BTreeMap<String, TeamInfo>,
}

fn is_hex_color(s: &str) -> bool {
    s.len() == 7 && s.starts_with('#') && s[1..].chars().all(|c| c.is_ascii_hexdigit())
}

impl TeamDirectory {
    pub fn new(
        teams: impl IntoIterator<Item = (String, TeamInfo)>,
    ) -> Result<Self, DirectoryError> {
        let mut map = BTreeMap::new();
        for (abbr, info) in teams {
            let abbr = abbr.trim().to_uppercase();
            if abbr.is_empty() {
                return Err(DirectoryError::EmptyAbbreviation);
            }
            if !is_hex_color(&info.color) {
                return Err(DirectoryError::InvalidColor {
                    team: abbr,
                    color: info.color,
                });
            }
            map.insert(abbr, info);
        }
        Ok(Self { teams: map })
    }

    pub fn get(&self, abbr: &str) -> Option<&TeamInfo> {
        self.teams.get(abbr)
    }

    /// Full team name, or the abbreviation itself when unknown.
    pub fn display_name<'a>(&'a self, abbr: &'a str) -> &'a str {
        self.teams.get(abbr).map(|t| t.name.as_str()).unwrap_or(abbr)
    }

    pub fn color(&self, abbr: &str) -> Option<&str> {
        self.teams.get(abbr).map(|t| t.color.as_str())
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }
}
