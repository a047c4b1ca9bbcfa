// Scoreline probability grid from two independent Poisson goal counts.
//
// Each team's distribution is truncated at `max_goals` and renormalised
// before taking the outer product, so the grid always sums to 1.

use serde::Serialize;
use tracing::warn;

pub const DEFAULT_MAX_GOALS: usize = 6;

/// Poisson pmf for k = 0..=max_goals, renormalised to sum to 1.
///
/// Negative or non-finite rates are treated as 0 (all mass on zero goals).
pub fn poisson_distribution(lambda: f64, max_goals: usize) -> Vec<f64> {
    let lambda = if lambda.is_finite() && lambda > 0.0 {
        lambda
    } else {
        if lambda != 0.0 {
            warn!("expected goals {} outside [0, inf), using 0", lambda);
        }
        0.0
    };

    let mut probs = Vec::with_capacity(max_goals + 1);
    let mut p = (-lambda).exp();
    probs.push(p);
    for k in 1..=max_goals {
        p *= lambda / k as f64;
        probs.push(p);
    }

    let total: f64 = probs.iter().sum();
    if total > 0.0 {
        for v in &mut probs {
            *v /= total;
        }
    } else {
        // exp(-lambda) underflowed; the truncated mass sits at the cap
        probs.iter_mut().for_each(|v| *v = 0.0);
        probs[max_goals] = 1.0;
    }
    probs
}

/// Aggregated result probabilities for a matchup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OutcomeProbabilities {
    pub team1_win: f64,
    pub draw: f64,
    pub team2_win: f64,
}

impl OutcomeProbabilities {
    pub fn total(&self) -> f64 {
        self.team1_win + self.draw + self.team2_win
    }
}

/// Joint probabilities: rows are team 1 goals, columns team 2 goals.
#[derive(Debug, Clone, PartialEq)]
pub struct ScorelineMatrix {
    team1: Vec<f64>,
    team2: Vec<f64>,
    cells: Vec<Vec<f64>>,
}

impl ScorelineMatrix {
    pub fn new(team1_xg: f64, team2_xg: f64, max_goals: usize) -> Self {
        let team1 = poisson_distribution(team1_xg, max_goals);
        let team2 = poisson_distribution(team2_xg, max_goals);
        let cells = team1
            .iter()
            .map(|a| team2.iter().map(|b| a * b).collect())
            .collect();
        Self { team1, team2, cells }
    }

    pub fn max_goals(&self) -> usize {
        self.cells.len() - 1
    }

    /// P(team 1 scores `i` and team 2 scores `j`); 0 outside the grid.
    pub fn cell(&self, i: usize, j: usize) -> f64 {
        self.cells
            .get(i)
            .and_then(|row| row.get(j))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.cells
    }

    pub fn team1_marginal(&self) -> &[f64] {
        &self.team1
    }

    pub fn team2_marginal(&self) -> &[f64] {
        &self.team2
    }

    pub fn total(&self) -> f64 {
        self.cells.iter().flatten().sum()
    }

    /// P(team1 goals - team2 goals == margin).
    pub fn margin_probability(&self, margin: i64) -> f64 {
        let mut p = 0.0;
        for (i, row) in self.cells.iter().enumerate() {
            let j = i as i64 - margin;
            if j >= 0 {
                if let Some(v) = row.get(j as usize) {
                    p += v;
                }
            }
        }
        p
    }

    /// Win is the strictly lower triangle (team 1 scores more), draw the
    /// diagonal, loss the strictly upper triangle.
    pub fn outcomes(&self) -> OutcomeProbabilities {
        let mut out = OutcomeProbabilities {
            team1_win: 0.0,
            draw: 0.0,
            team2_win: 0.0,
        };
        for (i, row) in self.cells.iter().enumerate() {
            for (j, &p) in row.iter().enumerate() {
                match i.cmp(&j) {
                    std::cmp::Ordering::Greater => out.team1_win += p,
                    std::cmp::Ordering::Equal => out.draw += p,
                    std::cmp::Ordering::Less => out.team2_win += p,
                }
            }
        }
        out
    }

    /// The single most likely scoreline as `(team1_goals, team2_goals, p)`.
    pub fn most_likely_score(&self) -> (usize, usize, f64) {
        let mut best = (0, 0, f64::NEG_INFINITY);
        for (i, row) in self.cells.iter().enumerate() {
            for (j, &p) in row.iter().enumerate() {
                if p > best.2 {
                    best = (i, j, p);
                }
            }
        }
        best
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-9;

    fn mean_goals(probs: &[f64]) -> f64 {
        probs.iter().enumerate().map(|(k, p)| k as f64 * p).sum()
    }

    #[test]
    fn distribution_sums_to_one() {
        for lambda in [0.0, 0.3, 1.0, 2.75, 3.0, 6.0, 12.0] {
            for max_goals in [0, 1, 6, 10] {
                let d = poisson_distribution(lambda, max_goals);
                assert_eq!(d.len(), max_goals + 1);
                let s: f64 = d.iter().sum();
                assert!((s - 1.0).abs() < TOL, "lambda={lambda} max={max_goals} sum={s}");
            }
        }
    }

    #[test]
    fn zero_lambda_puts_all_mass_on_zero() {
        let d = poisson_distribution(0.0, 6);
        assert_eq!(d[0], 1.0);
        assert!(d[1..].iter().all(|&p| p == 0.0));
    }

    #[test]
    fn negative_lambda_treated_as_zero() {
        assert_eq!(poisson_distribution(-0.4, 4), poisson_distribution(0.0, 4));
    }

    #[test]
    fn truncation_renormalises() {
        let raw: Vec<f64> = (0..=6)
            .scan((-3.0f64).exp(), |p, k| {
                if k > 0 {
                    *p *= 3.0 / k as f64;
                }
                Some(*p)
            })
            .collect();
        let mass: f64 = raw.iter().sum();
        let d = poisson_distribution(3.0, 6);
        for (a, b) in raw.iter().zip(&d) {
            assert!((a / mass - b).abs() < TOL);
        }
    }

    #[test]
    fn grid_sums_to_one() {
        for (a, b) in [(0.0, 0.0), (2.9, 3.4), (1.1, 4.2), (5.0, 0.5)] {
            let m = ScorelineMatrix::new(a, b, DEFAULT_MAX_GOALS);
            assert!((m.total() - 1.0).abs() < TOL);
            assert_eq!(m.max_goals(), 6);
            assert_eq!(m.rows().len(), 7);
        }
    }

    #[test]
    fn mean_increases_with_lambda() {
        let mut last = -1.0;
        for lambda in [0.0, 0.5, 1.0, 2.0, 3.0, 4.5, 6.0] {
            let m = ScorelineMatrix::new(lambda, 2.0, DEFAULT_MAX_GOALS);
            let mean = mean_goals(m.team1_marginal());
            assert!(mean > last, "lambda={lambda} mean={mean} last={last}");
            last = mean;
        }
    }

    #[test]
    fn outcome_probabilities_sum_to_one() {
        for (a, b) in [(0.0, 3.0), (2.5, 2.5), (3.3, 1.9), (7.0, 7.0)] {
            let o = ScorelineMatrix::new(a, b, DEFAULT_MAX_GOALS).outcomes();
            assert!((o.total() - 1.0).abs() < TOL);
        }
    }

    #[test]
    fn outcome_triangles() {
        let m = ScorelineMatrix::new(3.2, 2.1, 6);
        let o = m.outcomes();
        let mut win = 0.0;
        let mut draw = 0.0;
        for i in 0..=6 {
            draw += m.cell(i, i);
            for j in 0..i {
                win += m.cell(i, j);
            }
        }
        assert!((o.team1_win - win).abs() < TOL);
        assert!((o.draw - draw).abs() < TOL);
        assert!(o.team1_win > o.team2_win);
    }

    #[test]
    fn symmetric_matchup() {
        let m = ScorelineMatrix::new(3.0, 3.0, DEFAULT_MAX_GOALS);
        let o = m.outcomes();
        assert!((o.team1_win - o.team2_win).abs() < TOL);
        // A draw is the single most likely goal differential.
        assert!(o.draw > m.margin_probability(1));
        assert!(o.draw > m.margin_probability(-1));
        assert!((m.margin_probability(0) - o.draw).abs() < TOL);
    }

    #[test]
    fn cell_outside_grid_is_zero() {
        let m = ScorelineMatrix::new(1.0, 1.0, 2);
        assert_eq!(m.cell(3, 0), 0.0);
        assert_eq!(m.cell(0, 3), 0.0);
    }

    #[test]
    fn most_likely_score_for_low_scoring_game() {
        let m = ScorelineMatrix::new(0.2, 0.1, 6);
        let (i, j, p) = m.most_likely_score();
        assert_eq!((i, j), (0, 0));
        assert!((p - m.cell(0, 0)).abs() < TOL);
    }

    #[test]
    fn margins_cover_grid() {
        let m = ScorelineMatrix::new(2.2, 3.1, 6);
        let total: f64 = (-6..=6).map(|d| m.margin_probability(d)).sum();
        assert!((total - 1.0).abs() < TOL);
    }
}
