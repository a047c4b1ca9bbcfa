// Append-only CSV logs and the team scores export.
//
// predictions_log.csv gets one row per matchup per `predict` run; the header
// is written only when the file is new or empty. value_bets_log.csv follows
// the same rule but is only touched when there is at least one bet.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, HashSet};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use puckline_core::odds::MatchOdds;
use puckline_core::value::BetType;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },

    #[error("failed to write {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

fn two_decimals<S: Serializer>(value: &f64, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format!("{value:.2}"))
}

/// Score cells are typed in by hand. Anything that is not a whole number of
/// goals reads as no score so the rest of the row survives.
fn lenient_score<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
    let raw: Option<String> = Option::deserialize(d)?;
    let Some(raw) = raw else {
        return Ok(None);
    };
    let cell = raw.trim();
    if cell.is_empty() {
        return Ok(None);
    }
    if let Ok(goals) = cell.parse::<u32>() {
        return Ok(Some(goals));
    }
    match cell.parse::<f64>() {
        Ok(v) if v >= 0.0 && v.fract() == 0.0 && v <= f64::from(u32::MAX) => Ok(Some(v as u32)),
        _ => {
            warn!("ignoring unreadable score {:?}", raw);
            Ok(None)
        }
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One row of predictions_log.csv.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Team1")]
    pub team1: String,
    #[serde(rename = "Team1_xG", serialize_with = "two_decimals")]
    pub team1_xg: f64,
    #[serde(rename = "Team2")]
    pub team2: String,
    #[serde(rename = "Team2_xG", serialize_with = "two_decimals")]
    pub team2_xg: f64,
    #[serde(rename = "Team1_Odds", default)]
    pub team1_odds: String,
    #[serde(rename = "Team2_Odds", default)]
    pub team2_odds: String,
    #[serde(rename = "Draw_Odds", default)]
    pub draw_odds: String,
    /// Final scores, filled in by hand after the game.
    #[serde(rename = "Team1_Score", default, deserialize_with = "lenient_score")]
    pub team1_score: Option<u32>,
    #[serde(rename = "Team2_Score", default, deserialize_with = "lenient_score")]
    pub team2_score: Option<u32>,
}

impl PredictionRecord {
    pub fn odds(&self) -> MatchOdds {
        MatchOdds::new(&self.team1_odds, &self.team2_odds, &self.draw_odds)
    }

    pub fn final_score(&self) -> Option<(u32, u32)> {
        Some((self.team1_score?, self.team2_score?))
    }
}

/// One row of value_bets_log.csv. `Result` and `Units` stay blank until
/// the bet is graded by hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueBetRecord {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Team1")]
    pub team1: String,
    #[serde(rename = "Team2")]
    pub team2: String,
    #[serde(rename = "Bet_Type")]
    pub bet_type: BetType,
    #[serde(rename = "Model_Prob")]
    pub model_probability: f64,
    #[serde(rename = "Book_Prob")]
    pub book_probability: f64,
    #[serde(rename = "Edge")]
    pub edge: f64,
    #[serde(rename = "Odds")]
    pub odds: String,
    #[serde(rename = "Result", default)]
    pub result: Option<String>,
    #[serde(rename = "Units", default)]
    pub units: Option<f64>,
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

fn append_records<T: Serialize>(path: &Path, records: &[T]) -> Result<(), LedgerError> {
    let io_err = |source| LedgerError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let needs_header = std::fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(io_err)?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_header)
        .from_writer(file);
    let csv_err = |source| LedgerError::Csv {
        path: path.to_path_buf(),
        source,
    };
    for record in records {
        writer.serialize(record).map_err(csv_err)?;
    }
    writer.flush().map_err(io_err)?;
    Ok(())
}

pub fn append_predictions(path: &Path, records: &[PredictionRecord]) -> Result<(), LedgerError> {
    append_records(path, records)?;
    info!("appended {} predictions to {}", records.len(), path.display());
    Ok(())
}

/// Append value bets. Does nothing (not even create the file) when empty.
pub fn append_value_bets(path: &Path, records: &[ValueBetRecord]) -> Result<(), LedgerError> {
    if records.is_empty() {
        return Ok(());
    }
    append_records(path, records)?;
    info!("appended {} value bets to {}", records.len(), path.display());
    Ok(())
}

/// Overwrite the team scores export with `{ team: expected_goals }`.
pub fn write_team_scores(path: &Path, scores: &BTreeMap<String, f64>) -> Result<(), LedgerError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| LedgerError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    }
    let json = serde_json::to_string_pretty(scores).map_err(|source| LedgerError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, json).map_err(|source| LedgerError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

fn read_predictions_from_reader<R: std::io::Read>(
    rdr: R,
) -> Result<Vec<PredictionRecord>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut records = Vec::new();
    for result in reader.deserialize::<PredictionRecord>() {
        match result {
            Ok(rec) => records.push(rec),
            Err(e) => warn!("skipping malformed prediction row: {}", e),
        }
    }
    Ok(records)
}

/// Every readable row of the predictions log, in file order.
pub fn read_predictions(path: &Path) -> Result<Vec<PredictionRecord>, LedgerError> {
    let file = std::fs::File::open(path).map_err(|source| LedgerError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_predictions_from_reader(file).map_err(|source| LedgerError::Csv {
        path: path.to_path_buf(),
        source,
    })
}

/// Rows for `date`, keeping only the last row for each (date, team1, team2).
/// Surviving rows stay in the order of their last appearance.
pub fn predictions_for_date(records: &[PredictionRecord], date: NaiveDate) -> Vec<PredictionRecord> {
    let mut seen = HashSet::new();
    let mut out: Vec<PredictionRecord> = records
        .iter()
        .rev()
        .filter(|r| r.date == date)
        .filter(|r| seen.insert((r.team1.as_str(), r.team2.as_str())))
        .cloned()
        .collect();
    out.reverse();
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    fn prediction(d: u32, t1: &str, t2: &str, xg: f64) -> PredictionRecord {
        PredictionRecord {
            date: date(d),
            team1: t1.into(),
            team1_xg: xg,
            team2: t2.into(),
            team2_xg: 2.5,
            team1_odds: "+130".into(),
            team2_odds: "-110".into(),
            draw_odds: "+280".into(),
            team1_score: None,
            team2_score: None,
        }
    }

    fn temp_path(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(name);
        let _ = std::fs::remove_file(&path);
        path
    }

    #[test]
    fn header_written_once_across_appends() {
        let path = temp_path("puckline_ledger_header.csv");
        append_predictions(&path, &[prediction(19, "BOS", "TOR", 3.14159)]).unwrap();
        append_predictions(&path, &[prediction(19, "MON", "OTT", 2.0)]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "Date,Team1,Team1_xG,Team2,Team2_xG,Team1_Odds,Team2_Odds,Draw_Odds,Team1_Score,Team2_Score"
        );
        assert_eq!(lines[1], "2026-10-19,BOS,3.14,TOR,2.50,+130,-110,+280,,");

        let back = read_predictions(&path).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back[0].team1_xg, 3.14);
        assert_eq!(back[1].team1, "MON");
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn read_blank_odds_and_filled_scores() {
        let csv_data = "\
Date,Team1,Team1_xG,Team2,Team2_xG,Team1_Odds,Team2_Odds,Draw_Odds,Team1_Score,Team2_Score
2026-10-19,BOS,3.10,TOR,2.95,,,,4,2
2026-10-19,MON,oops,OTT,2.95,,,,,";
        let records = read_predictions_from_reader(csv_data.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].final_score(), Some((4, 2)));
        assert!(records[0].odds().is_empty());
    }

    #[test]
    fn unreadable_score_keeps_the_row() {
        let csv_data = "\
Date,Team1,Team1_xG,Team2,Team2_xG,Team1_Odds,Team2_Odds,Draw_Odds,Team1_Score,Team2_Score
2026-10-19,BOS,3.40,TOR,2.95,+130,-110,+280,,
2026-10-19,BOS,3.10,TOR,2.95,+125,-105,+275,4 (OT),3
2026-10-19,MON,2.80,OTT,2.60,,,, 4 ,4.0";
        let records = read_predictions_from_reader(csv_data.as_bytes()).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].team1_score, None);
        assert_eq!(records[1].team2_score, Some(3));
        assert_eq!(records[2].final_score(), Some((4, 4)));

        let today = predictions_for_date(&records, date(19));
        let bos = today.iter().find(|r| r.team1 == "BOS").unwrap();
        assert_eq!(bos.team1_xg, 3.10);
        assert_eq!(bos.team1_odds, "+125");
    }

    #[test]
    fn dedupe_keeps_last_row_per_matchup() {
        let records = vec![
            prediction(18, "BOS", "TOR", 1.0),
            prediction(19, "BOS", "TOR", 2.0),
            prediction(19, "MON", "OTT", 3.0),
            prediction(19, "BOS", "TOR", 4.0),
        ];
        let today = predictions_for_date(&records, date(19));
        assert_eq!(today.len(), 2);
        assert_eq!(today[0].team1, "MON");
        assert_eq!(today[1].team1_xg, 4.0);

        assert!(predictions_for_date(&records, date(20)).is_empty());
    }

    #[test]
    fn value_bets_only_written_when_present() {
        let path = temp_path("puckline_ledger_value_bets.csv");
        append_value_bets(&path, &[]).unwrap();
        assert!(!path.exists());

        let bet = ValueBetRecord {
            date: date(19),
            team1: "BOS".into(),
            team2: "TOR".into(),
            bet_type: BetType::Draw,
            model_probability: 0.31,
            book_probability: 0.26,
            edge: 19.2,
            odds: "+280".into(),
            result: None,
            units: None,
        };
        append_value_bets(&path, &[bet.clone()]).unwrap();
        append_value_bets(&path, &[bet]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "Date,Team1,Team2,Bet_Type,Model_Prob,Book_Prob,Edge,Odds,Result,Units"
        );
        assert!(lines[1].starts_with("2026-10-19,BOS,TOR,draw,0.31,0.26,19.2,+280,"));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn team_scores_json() {
        let path = temp_path("puckline_team_scores.json");
        let scores = BTreeMap::from([("BOS".to_string(), 3.12), ("TOR".to_string(), 2.8)]);
        write_team_scores(&path, &scores).unwrap();
        let back: BTreeMap<String, f64> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, scores);
        let _ = std::fs::remove_file(&path);
    }
}
