// Configuration loading and parsing (model.toml, teams.toml).

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use puckline_core::directory::{TeamDirectory, TeamInfo};
use puckline_core::lineup::IceTimeTable;
use puckline_core::value::{OddsGating, ValuePolicy};
use puckline_core::weighting::SeasonWeights;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

/// Largest `matrix.max_goals` accepted from config.
const MAX_GOALS_LIMIT: usize = 20;

fn invalid(field: &str, message: impl ToString) -> ConfigError {
    ConfigError::ValidationError {
        field: field.into(),
        message: message.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

/// Validated configuration, with the model inputs already built.
#[derive(Debug, Clone)]
pub struct Config {
    pub seasons: Vec<SeasonSource>,
    pub weights: SeasonWeights,
    pub ice_time: IceTimeTable,
    pub adjustment_scale: f64,
    pub team_stats_path: PathBuf,
    pub max_goals: usize,
    pub value_policy: ValuePolicy,
    pub output: OutputPaths,
    pub teams: TeamDirectory,
}

// ---------------------------------------------------------------------------
// model.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
struct ModelFile {
    weighting: WeightingSection,
    #[serde(default)]
    ice_time: Option<IceTimeSection>,
    team_adjustment: TeamAdjustmentSection,
    matrix: MatrixSection,
    value: ValueSection,
    output: OutputPaths,
}

#[derive(Debug, Clone, Deserialize)]
struct WeightingSection {
    recency_weight: f64,
    seasons: Vec<SeasonSource>,
}

/// One season's stat files. Listed most recent first.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SeasonSource {
    pub id: String,
    pub skaters: PathBuf,
    pub goalies: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
struct IceTimeSection {
    forwards: Vec<f64>,
    defense: Vec<f64>,
}

#[derive(Debug, Clone, Deserialize)]
struct TeamAdjustmentSection {
    scale: f64,
    stats_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
struct MatrixSection {
    max_goals: usize,
}

#[derive(Debug, Clone, Deserialize)]
struct ValueSection {
    edge_threshold: f64,
    #[serde(default)]
    gating: OddsGating,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OutputPaths {
    pub predictions_log: PathBuf,
    pub value_bets_log: PathBuf,
    pub team_scores: PathBuf,
}

// ---------------------------------------------------------------------------
// teams.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Default)]
struct TeamsFile {
    #[serde(default)]
    teams: BTreeMap<String, TeamInfo>,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/model.toml` and (optionally)
/// `config/teams.toml`, both relative to `base_dir`. Relative data and output
/// paths are resolved against `base_dir` too.
///
/// Does not copy defaults; `load_config()` does.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    // --- model.toml (required) ---
    let model_path = config_dir.join("model.toml");
    let model_text = read_file(&model_path)?;
    let model: ModelFile = toml::from_str(&model_text).map_err(|e| ConfigError::ParseError {
        path: model_path.clone(),
        source: e,
    })?;

    // --- teams.toml (optional) ---
    let teams_path = config_dir.join("teams.toml");
    let teams_file = if teams_path.exists() {
        let text = read_file(&teams_path)?;
        toml::from_str(&text).map_err(|e| ConfigError::ParseError {
            path: teams_path.clone(),
            source: e,
        })?
    } else {
        TeamsFile::default()
    };

    build(base_dir, model, teams_file)
}

/// Config files seeded from `defaults/` on first run.
const SEEDED_FILES: [&str; 2] = ["model.toml", "teams.toml"];

fn seed_error(message: String) -> ConfigError {
    ConfigError::DefaultsCopyError { message }
}

/// Copy `model.toml` and `teams.toml` from `defaults/` into `config/` when
/// they are missing there. Existing config files are never touched.
/// Returns the files written.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.is_dir() {
        if config_dir.is_dir() {
            return Ok(Vec::new());
        }
        return Err(seed_error(format!(
            "no defaults/ or config/ directory under {}",
            base_dir.display()
        )));
    }
    std::fs::create_dir_all(&config_dir)
        .map_err(|e| seed_error(format!("creating {}: {e}", config_dir.display())))?;

    let mut copied = Vec::new();
    for name in SEEDED_FILES {
        let source = defaults_dir.join(name);
        let target = config_dir.join(name);
        if source.is_file() && seed_file(&source, &target)? {
            copied.push(target);
        }
    }
    Ok(copied)
}

/// Returns false when `target` already exists.
fn seed_file(source: &Path, target: &Path) -> Result<bool, ConfigError> {
    let content = std::fs::read(source)
        .map_err(|e| seed_error(format!("reading {}: {e}", source.display())))?;
    let mut dest = match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(target)
    {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(seed_error(format!("creating {}: {e}", target.display()))),
    };
    std::io::Write::write_all(&mut dest, &content)
        .map_err(|e| seed_error(format!("writing {}: {e}", target.display())))?;
    info!("seeded {} from defaults", target.display());
    Ok(true)
}

/// Loads config relative to the current working directory, copying default
/// config files first.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

fn resolve(base_dir: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        base_dir.join(path)
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn build(base_dir: &Path, model: ModelFile, teams_file: TeamsFile) -> Result<Config, ConfigError> {
    let w = &model.weighting;
    if !(w.recency_weight > 0.0 && w.recency_weight < 1.0) {
        return Err(invalid(
            "weighting.recency_weight",
            format!("must be strictly between 0 and 1, got {}", w.recency_weight),
        ));
    }
    let ids: Vec<&str> = w.seasons.iter().map(|s| s.id.as_str()).collect();
    let weights = SeasonWeights::recency(&ids, w.recency_weight)
        .map_err(|e| invalid("weighting.seasons", e))?;

    let ice_time = match &model.ice_time {
        Some(t) => IceTimeTable::new(&t.forwards, &t.defense).map_err(|e| invalid("ice_time", e))?,
        None => IceTimeTable::default(),
    };

    let scale = model.team_adjustment.scale;
    if !scale.is_finite() || scale < 0.0 {
        return Err(invalid(
            "team_adjustment.scale",
            format!("must be finite and >= 0, got {scale}"),
        ));
    }

    if model.matrix.max_goals > MAX_GOALS_LIMIT {
        return Err(invalid(
            "matrix.max_goals",
            format!("must be <= {MAX_GOALS_LIMIT}, got {}", model.matrix.max_goals),
        ));
    }

    let threshold = model.value.edge_threshold;
    if !threshold.is_finite() {
        return Err(invalid(
            "value.edge_threshold",
            format!("must be finite, got {threshold}"),
        ));
    }

    let teams = TeamDirectory::new(teams_file.teams).map_err(|e| invalid("teams", e))?;

    let seasons = model
        .weighting
        .seasons
        .into_iter()
        .map(|s| SeasonSource {
            id: s.id,
            skaters: resolve(base_dir, s.skaters),
            goalies: resolve(base_dir, s.goalies),
        })
        .collect();
    let output = OutputPaths {
        predictions_log: resolve(base_dir, model.output.predictions_log),
        value_bets_log: resolve(base_dir, model.output.value_bets_log),
        team_scores: resolve(base_dir, model.output.team_scores),
    };

    Ok(Config {
        seasons,
        weights,
        ice_time,
        adjustment_scale: scale,
        team_stats_path: resolve(base_dir, model.team_adjustment.stats_path),
        max_goals: model.matrix.max_goals,
        value_policy: ValuePolicy {
            threshold,
            gating: model.value.gating,
        },
        output,
        teams,
    })
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
