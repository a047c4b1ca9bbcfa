// Team-level correction and per-team expected score assembly.
//
// expected = lineup xG + team adjustment - opposing goalie rate
//
// The team adjustment folds in season-long finishing above or below expected
// that individual skater rates do not capture. The goalie term is subtracted
// after the team term.

use std::collections::HashMap;

use tracing::debug;

use crate::lineup::{score_lineup, IceTimeTable, LineupScore};
use crate::slate::{Matchup, Slate, TeamSheet};
use crate::weighting::RateTable;

/// Default multiplier applied to `(goals_for - xgoals_for) / ice_time`.
pub const DEFAULT_ADJUSTMENT_SCALE: f64 = 30.0;

// ---------------------------------------------------------------------------
// Team stats
// ---------------------------------------------------------------------------

/// Season totals for one team in all situations.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamStats {
    pub team: String,
    pub goals_for: f64,
    pub xgoals_for: f64,
    pub ice_time: f64,
}

#[derive(Debug, Clone, Default)]
pub struct TeamStatsTable {
    teams: HashMap<String, TeamStats>,
}

impl TeamStatsTable {
    pub fn new(rows: impl IntoIterator<Item = TeamStats>) -> Self {
        let teams = rows.into_iter().map(|t| (t.team.clone(), t)).collect();
        Self { teams }
    }

    pub fn get(&self, team: &str) -> Option<&TeamStats> {
        self.teams.get(team)
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }
}

/// `scale * (goals_for - xgoals_for) / ice_time`, or 0 for a missing team or
/// a row without positive ice time.
pub fn team_adjustment(stats: Option<&TeamStats>, scale: f64) -> f64 {
    match stats {
        Some(s) if s.ice_time > 0.0 => scale * (s.goals_for - s.xgoals_for) / s.ice_time,
        Some(s) => {
            debug!("team '{}' has no ice time, adjustment defaults to 0", s.team);
            0.0
        }
        None => 0.0,
    }
}

// ---------------------------------------------------------------------------
// Expected score
// ---------------------------------------------------------------------------

/// Everything needed to turn a lineup into an expected score.
#[derive(Debug, Clone, Copy)]
pub struct ProjectionContext<'a> {
    pub skater_rates: &'a RateTable,
    pub goalie_rates: &'a RateTable,
    pub team_stats: &'a TeamStatsTable,
    pub ice_time: &'a IceTimeTable,
    pub adjustment_scale: f64,
}

/// One team's expected score with each additive term kept for auditing.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpectedScore {
    pub team: String,
    pub lineup: LineupScore,
    pub team_adjustment: f64,
    /// The opposing goalie's rate; subtracted from the total.
    pub goalie_adjustment: f64,
    pub total: f64,
}

impl ExpectedScore {
    /// Total formatted for the predictions log.
    pub fn formatted(&self) -> String {
        format!("{:.2}", self.total)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchupProjection {
    pub team1: ExpectedScore,
    pub team2: ExpectedScore,
}

/// Combine the three terms in their fixed order.
pub fn expected_score(lineup: f64, team_adjustment: f64, opposing_goalie: f64) -> f64 {
    let with_team = lineup + team_adjustment;
    with_team - opposing_goalie
}

fn project_team(sheet: &TeamSheet, opponent: &TeamSheet, ctx: &ProjectionContext<'_>) -> ExpectedScore {
    let lineup = score_lineup(&sheet.lineup, ctx.ice_time, ctx.skater_rates);
    let team_adj = team_adjustment(ctx.team_stats.get(&sheet.team), ctx.adjustment_scale);
    let goalie_adj = opponent
        .goalie
        .as_deref()
        .map(|g| ctx.goalie_rates.rate(g))
        .unwrap_or(0.0);

    ExpectedScore {
        team: sheet.team.clone(),
        lineup,
        team_adjustment: team_adj,
        goalie_adjustment: goalie_adj,
        total: expected_score(lineup.total, team_adj, goalie_adj),
    }
}

pub fn project_matchup(matchup: &Matchup, ctx: &ProjectionContext<'_>) -> MatchupProjection {
    MatchupProjection {
        team1: project_team(&matchup.team1, &matchup.team2, ctx),
        team2: project_team(&matchup.team2, &matchup.team1, ctx),
    }
}

pub fn project_slate(slate: &Slate, ctx: &ProjectionContext<'_>) -> Vec<MatchupProjection> {
    slate
        .matchups()
        .iter()
        .map(|m| project_matchup(m, ctx))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
