// puckline entry point.
//
// Every command follows the same sequence:
// 1. Initialize tracing (log to file, not terminal)
// 2. Load config (copying defaults on first run)
// 3. Run the pipeline step
// 4. Print the report to stdout

use std::path::PathBuf;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use tracing::{error, info};

use puckline_app::config;
use puckline_app::pipeline::{self, PipelineError};
use puckline_app::report::{self, MatchupReport};

#[derive(Parser)]
#[command(name = "puckline")]
#[command(version, about = "Hockey expected-goals projections and value bets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Project expected goals for a slate and append them to the predictions log
    Predict {
        /// Slate file (TOML) from the lineup collector
        #[arg(value_name = "SLATE")]
        slate: PathBuf,

        /// Lineup corrections, one `TEAM POS LINE NAME` per line
        #[arg(short, long)]
        corrections: Option<PathBuf>,
    },

    /// Analyse logged predictions for a date and record value bets
    Analyze {
        /// Date to analyse (YYYY-MM-DD), defaults to today
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },

    /// List lineup slots that still need a player
    Missing {
        #[arg(value_name = "SLATE")]
        slate: PathBuf,

        #[arg(short, long)]
        corrections: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing()?;
    info!("puckline starting up");

    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: {} seasons, most recent {}",
        config.seasons.len(),
        config.weights.most_recent()
    );
    let today = Local::now().date_naive();

    match cli.command {
        Commands::Predict { slate, corrections } => {
            let prediction = pipeline::predict(&config, &slate, corrections.as_deref(), today)
                .with_context(|| format!("failed to predict slate {}", slate.display()))?;

            println!("NHL expected goals for {}", prediction.date);
            println!("{}", "=".repeat(40));
            print!("{}", report::render_projections(&prediction.projections, &config.teams));
            for (c, reason) in &prediction.rejected {
                println!("rejected correction {} {} {} {}: {}", c.team, c.position, c.line, c.player, reason);
            }
            println!(
                "\nLogged {} games to {}",
                prediction.records.len(),
                config.output.predictions_log.display()
            );
        }
        Commands::Analyze { date } => {
            let date = date.unwrap_or(today);
            let analysis = match pipeline::analyze(&config, date) {
                Ok(a) => a,
                Err(PipelineError::NoGames(d)) => {
                    println!(
                        "No games found for {} in {}",
                        d,
                        config.output.predictions_log.display()
                    );
                    return Ok(());
                }
                Err(e) => {
                    error!("analyze failed: {}", e);
                    return Err(e).context("failed to analyze predictions");
                }
            };

            println!("\nAnalyzing NHL Games for {}", analysis.date);
            println!("{}", "=".repeat(40));
            for game in &analysis.games {
                let odds = game.record.odds();
                let view = MatchupReport {
                    team1: &game.record.team1,
                    team2: &game.record.team2,
                    team1_xg: game.record.team1_xg,
                    team2_xg: game.record.team2_xg,
                    matrix: &game.matrix,
                    outcomes: game.outcomes,
                    value: &game.value,
                    odds: &odds,
                    final_score: game.record.final_score(),
                };
                println!("{}", report::render_matchup(&view, &config.teams));
            }
            if !analysis.value_bets.is_empty() {
                println!(
                    "\nSaved {} value bets to {}",
                    analysis.value_bets.len(),
                    config.output.value_bets_log.display()
                );
            }
        }
        Commands::Missing { slate, corrections } => {
            let outcome = pipeline::missing(&slate, corrections.as_deref())
                .with_context(|| format!("failed to read slate {}", slate.display()))?;
            print!("{}", report::render_missing(&outcome, &config.teams));
        }
    }

    Ok(())
}

/// Log to `logs/puckline.log` so stdout carries only the report.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("puckline.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("puckline=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
