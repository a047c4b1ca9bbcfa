// The three commands as plain functions over config and files.
//
// predict: slate + corrections + stats -> expected scores -> predictions log
// analyze: predictions log for a date -> matrices, probabilities, value bets
// missing: slate + corrections -> open lineup slots

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

use puckline_core::corrections::{Correction, CorrectionError, CorrectionOutcome};
use puckline_core::matrix::{OutcomeProbabilities, ScorelineMatrix};
use puckline_core::team::{project_slate, MatchupProjection, ProjectionContext};
use puckline_core::value::{evaluate, ValueAnalysis};

use crate::config::Config;
use crate::ledger::{self, LedgerError, PredictionRecord, ValueBetRecord};
use crate::slate_file::{self, SlateFileError, SlateInput};
use crate::stats::{self, ModelInputs, StatsError};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Stats(#[from] StatsError),

    #[error(transparent)]
    SlateFile(#[from] SlateFileError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("No games found for {0}")]
    NoGames(NaiveDate),
}

// ---------------------------------------------------------------------------
// predict
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Prediction {
    pub date: NaiveDate,
    pub projections: Vec<MatchupProjection>,
    pub records: Vec<PredictionRecord>,
    pub rejected: Vec<(Correction, CorrectionError)>,
}

impl Prediction {
    /// `{ team: expected goals }` for the export, rounded as logged.
    pub fn team_scores(&self) -> BTreeMap<String, f64> {
        let round = |v: f64| (v * 100.0).round() / 100.0;
        self.projections
            .iter()
            .flat_map(|p| [&p.team1, &p.team2])
            .map(|s| (s.team.clone(), round(s.total)))
            .collect()
    }
}

/// Project every matchup on the slate. Pure apart from logging.
pub fn predict_slate(
    config: &Config,
    inputs: &ModelInputs,
    slate: &SlateInput,
    corrections: &[Correction],
    today: NaiveDate,
) -> Result<Prediction, PipelineError> {
    let outcome = slate.corrected(corrections);
    for (c, reason) in &outcome.rejected {
        warn!("correction '{} {} {} {}' rejected: {}", c.team, c.position, c.line, c.player, reason);
    }
    let rejected = outcome.rejected.clone();
    let built = slate_file::build_slate(outcome.sheets)?;

    let ctx = ProjectionContext {
        skater_rates: &inputs.skater_rates,
        goalie_rates: &inputs.goalie_rates,
        team_stats: &inputs.team_stats,
        ice_time: &config.ice_time,
        adjustment_scale: config.adjustment_scale,
    };
    let projections = project_slate(&built, &ctx);

    let date = slate.date.unwrap_or(today);
    let records = built
        .matchups()
        .iter()
        .zip(&projections)
        .map(|(m, p)| {
            let odds = slate.odds_for(&m.key());
            PredictionRecord {
                date,
                team1: p.team1.team.clone(),
                team1_xg: p.team1.total,
                team2: p.team2.team.clone(),
                team2_xg: p.team2.total,
                team1_odds: odds.team1.raw,
                team2_odds: odds.team2.raw,
                draw_odds: odds.draw.raw,
                team1_score: None,
                team2_score: None,
            }
        })
        .collect();

    Ok(Prediction {
        date,
        projections,
        records,
        rejected,
    })
}

/// Load everything from disk, project, and write the predictions log and
/// team scores export.
pub fn predict(
    config: &Config,
    slate_path: &Path,
    corrections_path: Option<&Path>,
    today: NaiveDate,
) -> Result<Prediction, PipelineError> {
    let slate = SlateInput::load(slate_path)?;
    let corrections = match corrections_path {
        Some(p) => slate_file::load_corrections(p)?,
        None => Vec::new(),
    };
    let inputs = stats::load_inputs(config)?;
    let prediction = predict_slate(config, &inputs, &slate, &corrections, today)?;

    ledger::append_predictions(&config.output.predictions_log, &prediction.records)?;
    ledger::write_team_scores(&config.output.team_scores, &prediction.team_scores())?;
    info!(
        "predicted {} matchups for {}",
        prediction.projections.len(),
        prediction.date
    );
    Ok(prediction)
}

// ---------------------------------------------------------------------------
// analyze
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct GameAnalysis {
    pub record: PredictionRecord,
    pub matrix: ScorelineMatrix,
    pub outcomes: OutcomeProbabilities,
    pub value: ValueAnalysis,
}

#[derive(Debug, Clone)]
pub struct Analysis {
    pub date: NaiveDate,
    pub games: Vec<GameAnalysis>,
    pub value_bets: Vec<ValueBetRecord>,
}

/// Analyse the given (already deduplicated) rows for `date`.
pub fn analyze_records(
    config: &Config,
    records: Vec<PredictionRecord>,
    date: NaiveDate,
) -> Result<Analysis, PipelineError> {
    if records.is_empty() {
        return Err(PipelineError::NoGames(date));
    }

    let mut games = Vec::with_capacity(records.len());
    let mut value_bets = Vec::new();
    for record in records {
        let matrix = ScorelineMatrix::new(record.team1_xg, record.team2_xg, config.max_goals);
        let outcomes = matrix.outcomes();
        let value = evaluate(&outcomes, &record.odds(), &config.value_policy);

        value_bets.extend(value.value_bets().map(|line| ValueBetRecord {
            date,
            team1: record.team1.clone(),
            team2: record.team2.clone(),
            bet_type: line.bet_type,
            model_probability: line.model_probability,
            book_probability: line.book_probability,
            edge: line.edge,
            odds: line.odds.clone(),
            result: None,
            units: None,
        }));

        games.push(GameAnalysis {
            record,
            matrix,
            outcomes,
            value,
        });
    }

    Ok(Analysis {
        date,
        games,
        value_bets,
    })
}

/// Read the predictions log, analyse `date`, and append any value bets.
pub fn analyze(config: &Config, date: NaiveDate) -> Result<Analysis, PipelineError> {
    let all = ledger::read_predictions(&config.output.predictions_log)?;
    let todays = ledger::predictions_for_date(&all, date);
    let analysis = analyze_records(config, todays, date)?;
    ledger::append_value_bets(&config.output.value_bets_log, &analysis.value_bets)?;
    info!(
        "analysed {} games for {}, {} value bets",
        analysis.games.len(),
        date,
        analysis.value_bets.len()
    );
    Ok(analysis)
}

// ---------------------------------------------------------------------------
// missing
// ---------------------------------------------------------------------------

pub fn missing(
    slate_path: &Path,
    corrections_path: Option<&Path>,
) -> Result<CorrectionOutcome, PipelineError> {
    let slate = SlateInput::load(slate_path)?;
    let corrections = match corrections_path {
        Some(p) => slate_file::load_corrections(p)?,
        None => Vec::new(),
    };
    Ok(slate.corrected(&corrections))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
