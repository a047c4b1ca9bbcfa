// Season stat loading.
//
// Skater and goalie files are Natural Stat Trick exports (one per season);
// team totals come from a MoneyPuck teams export where only the
// `situation == "all"` rows are used.

use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

use puckline_core::team::{TeamStats, TeamStatsTable};
use puckline_core::weighting::{weighted_rates, PlayerSeasonStat, RateTable, SeasonWeights};

use crate::config::{Config, SeasonSource};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum StatsError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("validation error: {0}")]
    Validation(String),
}

/// Everything the projection step reads from disk.
#[derive(Debug, Clone)]
pub struct ModelInputs {
    pub skater_rates: RateTable,
    pub goalie_rates: RateTable,
    pub team_stats: TeamStatsTable,
}

// ---------------------------------------------------------------------------
// Raw CSV serde structs (private)
// ---------------------------------------------------------------------------

/// Natural Stat Trick individual skater row. Extra columns are ignored.
#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct RawSkater {
    Player: String,
    TOI: f64,
    ixG: f64,
}

/// Natural Stat Trick goalie row.
#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct RawGoalie {
    Player: String,
    TOI: f64,
    GSAA: f64,
}

/// MoneyPuck team row.
#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct RawTeam {
    team: String,
    situation: String,
    goalsFor: f64,
    xGoalsFor: f64,
    iceTime: f64,
}

// ---------------------------------------------------------------------------
// Reader-based loaders (private, enable testing without temp files)
// ---------------------------------------------------------------------------

fn load_player_rows<R, T>(
    rdr: R,
    kind: &str,
    season: &str,
    fields: impl Fn(T) -> (String, f64, f64),
) -> Result<Vec<PlayerSeasonStat>, csv::Error>
where
    R: Read,
    T: for<'de> Deserialize<'de>,
{
    let mut reader = csv::Reader::from_reader(rdr);
    let mut rows = Vec::new();
    for result in reader.deserialize::<T>() {
        match result {
            Ok(raw) => {
                let (name, metric, toi) = fields(raw);
                let name = name.trim().to_string();
                if !metric.is_finite() || !toi.is_finite() {
                    warn!("skipping {} '{}' ({}): non-finite value", kind, name, season);
                    continue;
                }
                if toi < 0.0 {
                    warn!("skipping {} '{}' ({}): negative TOI {}", kind, name, season, toi);
                    continue;
                }
                rows.push(PlayerSeasonStat::new(name, season, metric, toi));
            }
            Err(e) => {
                warn!("skipping malformed {} row: {}", kind, e);
            }
        }
    }
    Ok(rows)
}

fn load_skaters_from_reader<R: Read>(
    rdr: R,
    season: &str,
) -> Result<Vec<PlayerSeasonStat>, csv::Error> {
    load_player_rows(rdr, "skater", season, |r: RawSkater| (r.Player, r.ixG, r.TOI))
}

fn load_goalies_from_reader<R: Read>(
    rdr: R,
    season: &str,
) -> Result<Vec<PlayerSeasonStat>, csv::Error> {
    load_player_rows(rdr, "goalie", season, |r: RawGoalie| (r.Player, r.GSAA, r.TOI))
}

fn load_teams_from_reader<R: Read>(rdr: R) -> Result<Vec<TeamStats>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut teams = Vec::new();
    for result in reader.deserialize::<RawTeam>() {
        match result {
            Ok(raw) => {
                if raw.situation.trim() != "all" {
                    continue;
                }
                if ![raw.goalsFor, raw.xGoalsFor, raw.iceTime]
                    .iter()
                    .all(|v| v.is_finite())
                {
                    warn!("skipping team '{}': non-finite value", raw.team.trim());
                    continue;
                }
                teams.push(TeamStats {
                    team: raw.team.trim().to_string(),
                    goals_for: raw.goalsFor,
                    xgoals_for: raw.xGoalsFor,
                    ice_time: raw.iceTime,
                });
            }
            Err(e) => {
                warn!("skipping malformed team row: {}", e);
            }
        }
    }
    Ok(teams)
}

// ---------------------------------------------------------------------------
// Public path-based loaders
// ---------------------------------------------------------------------------

fn open(path: &Path) -> Result<std::fs::File, StatsError> {
    std::fs::File::open(path).map_err(|e| StatsError::Io {
        path: path.display().to_string(),
        source: e,
    })
}

fn csv_error(path: &Path) -> impl FnOnce(csv::Error) -> StatsError + '_ {
    move |e| StatsError::Csv {
        path: path.display().to_string(),
        source: e,
    }
}

/// Load one season of skater stats (`Player`, `TOI`, `ixG`).
pub fn load_skaters(path: &Path, season: &str) -> Result<Vec<PlayerSeasonStat>, StatsError> {
    load_skaters_from_reader(open(path)?, season).map_err(csv_error(path))
}

/// Load one season of goalie stats (`Player`, `TOI`, `GSAA`).
pub fn load_goalies(path: &Path, season: &str) -> Result<Vec<PlayerSeasonStat>, StatsError> {
    load_goalies_from_reader(open(path)?, season).map_err(csv_error(path))
}

/// Load all-situation team totals.
pub fn load_team_stats(path: &Path) -> Result<TeamStatsTable, StatsError> {
    let rows = load_teams_from_reader(open(path)?).map_err(csv_error(path))?;
    Ok(TeamStatsTable::new(rows))
}

/// Load every configured season and fold it into rate tables.
pub fn load_inputs(config: &Config) -> Result<ModelInputs, StatsError> {
    load_inputs_from(&config.seasons, &config.weights, &config.team_stats_path)
}

pub fn load_inputs_from(
    seasons: &[SeasonSource],
    weights: &SeasonWeights,
    team_stats_path: &Path,
) -> Result<ModelInputs, StatsError> {
    let mut skaters = Vec::new();
    let mut goalies = Vec::new();
    for season in seasons {
        skaters.extend(load_skaters(&season.skaters, &season.id)?);
        goalies.extend(load_goalies(&season.goalies, &season.id)?);
    }

    if skaters.is_empty() {
        return Err(StatsError::Validation(
            "skater CSVs produced zero valid rows".into(),
        ));
    }
    if goalies.is_empty() {
        return Err(StatsError::Validation(
            "goalie CSVs produced zero valid rows".into(),
        ));
    }

    let skater_rates =
        weighted_rates(&skaters, weights).map_err(|e| StatsError::Validation(e.to_string()))?;
    let goalie_rates =
        weighted_rates(&goalies, weights).map_err(|e| StatsError::Validation(e.to_string()))?;
    let team_stats = load_team_stats(team_stats_path)?;

    info!(
        "loaded {} skater rates, {} goalie rates, {} teams",
        skater_rates.len(),
        goalie_rates.len(),
        team_stats.len()
    );

    Ok(ModelInputs {
        skater_rates,
        goalie_rates,
        team_stats,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skater_csv_reads_needed_columns() {
        let csv_data = "\
Player,Team,Position,GP,TOI,Goals,ixG
David Pastrnak,BOS,R,82,1650.5,47,38.2
 Brad Marchand ,BOS,L,82,1540.0,29,24.1";

        let rows = load_skaters_from_reader(csv_data.as_bytes(), "2024").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], PlayerSeasonStat::new("David Pastrnak", "2024", 38.2, 1650.5));
        assert_eq!(rows[1].player, "Brad Marchand");
        assert_eq!(rows[1].season, "2024");
    }

    #[test]
    fn malformed_and_non_finite_skater_rows_skipped() {
        let csv_data = "\
Player,TOI,ixG
Valid Player,1000,10.0
Bad Row,not_a_number,5.0
NaN Row,900,NaN
Negative Row,-5,1.0
Another Valid,800,7.5";

        let rows = load_skaters_from_reader(csv_data.as_bytes(), "2022_23").unwrap();
        let names: Vec<&str> = rows.iter().map(|r| r.player.as_str()).collect();
        assert_eq!(names, vec!["Valid Player", "Another Valid"]);
    }

    #[test]
    fn goalie_csv_uses_gsaa() {
        let csv_data = "\
Player,Team,GP,TOI,GSAA,SV%
Jeremy Swayman,BOS,44,2600.0,12.4,0.916
Joseph Woll,TOR,25,1400.0,-3.1,0.903";

        let rows = load_goalies_from_reader(csv_data.as_bytes(), "2024").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].metric, -3.1);
        assert_eq!(rows[1].toi, 1400.0);
    }

    #[test]
    fn team_csv_keeps_all_situation_only() {
        let csv_data = "\
team,season,name,situation,goalsFor,xGoalsFor,iceTime
BOS,2024,BOS,5on5,180,170.5,250000
BOS,2024,BOS,all,260,245.0,300000
TOR,2024,TOR,all,270,275.5,299000
CHI,2024,CHI,all,oops,200,300000";

        let teams = load_teams_from_reader(csv_data.as_bytes()).unwrap();
        assert_eq!(teams.len(), 2);
        assert_eq!(teams[0].team, "BOS");
        assert_eq!(teams[0].goals_for, 260.0);
        assert_eq!(teams[1].xgoals_for, 275.5);
    }

    #[test]
    fn empty_csv_returns_empty_vec() {
        let rows = load_skaters_from_reader("Player,TOI,ixG".as_bytes(), "2024").unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_skaters(Path::new("/nonexistent/skaters.csv"), "2024").unwrap_err();
        match err {
            StatsError::Io { path, .. } => assert!(path.contains("skaters.csv")),
            other => panic!("expected Io, got: {other}"),
        }
    }
}
