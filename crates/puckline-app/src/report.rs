// Plain-text console report for `predict`, `analyze` and `missing`.

use std::fmt::Write;

use puckline_core::corrections::{CorrectionOutcome, MissingSlot, RosterSheet, SlotGroup};
use puckline_core::directory::TeamDirectory;
use puckline_core::matrix::{OutcomeProbabilities, ScorelineMatrix};
use puckline_core::odds::{AmericanOdds, MatchOdds};
use puckline_core::team::MatchupProjection;
use puckline_core::value::{BetType, ValueAnalysis};

/// Everything shown for one analysed matchup.
#[derive(Debug, Clone)]
pub struct MatchupReport<'a> {
    pub team1: &'a str,
    pub team2: &'a str,
    pub team1_xg: f64,
    pub team2_xg: f64,
    pub matrix: &'a ScorelineMatrix,
    pub outcomes: OutcomeProbabilities,
    pub value: &'a ValueAnalysis,
    pub odds: &'a MatchOdds,
    pub final_score: Option<(u32, u32)>,
}

fn pct(p: f64) -> String {
    format!("{:.1}%", p * 100.0)
}

/// Scoreline grid in percent; rows are team 1 goals, columns team 2 goals.
pub fn render_grid(matrix: &ScorelineMatrix, team1: &str, team2: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Scoreline probabilities (%): rows {team1} goals, columns {team2} goals");
    let _ = write!(out, "{:>4}", "");
    for j in 0..=matrix.max_goals() {
        let _ = write!(out, "{j:>7}");
    }
    out.push('\n');
    for (i, row) in matrix.rows().iter().enumerate() {
        let _ = write!(out, "{i:>4}");
        for p in row {
            let _ = write!(out, "{:>7.2}", p * 100.0);
        }
        out.push('\n');
    }
    out
}

pub fn render_matchup(report: &MatchupReport<'_>, teams: &TeamDirectory) -> String {
    let name1 = teams.display_name(report.team1);
    let name2 = teams.display_name(report.team2);
    let mut out = String::new();

    let _ = writeln!(out, "\n{name1} vs {name2}");
    let _ = writeln!(out, "{}", "=".repeat(40));
    if let Some((g1, g2)) = report.final_score {
        let _ = writeln!(out, "Final: {g1}-{g2}");
    }
    let _ = writeln!(out, "Expected Goals:");
    let _ = writeln!(out, "{name1}: {:.2}", report.team1_xg);
    let _ = writeln!(out, "{name2}: {:.2}", report.team2_xg);

    out.push('\n');
    out.push_str(&render_grid(report.matrix, name1, name2));

    let (row, col, p) = report.matrix.most_likely_score();
    let _ = writeln!(out, "Most likely score: {row}-{col} ({})", pct(p));

    let _ = writeln!(out, "\nModel Probabilities:");
    let _ = writeln!(out, "{name1} win: {}", pct(report.outcomes.team1_win));
    let _ = writeln!(out, "{name2} win: {}", pct(report.outcomes.team2_win));
    let _ = writeln!(out, "Draw: {}", pct(report.outcomes.draw));

    if !report.value.is_empty() {
        let _ = writeln!(out, "\nValue Analysis:");
        let _ = writeln!(out, "{}", "-".repeat(56));
        let _ = writeln!(
            out,
            "{:<15} {:>7} {:>7} {:>7} {:>7} {:>7}",
            "Outcome", "Model", "Book", "Edge", "Odds", "Dec"
        );
        let _ = writeln!(out, "{}", "-".repeat(56));
        for line in &report.value.lines {
            let label = match line.bet_type {
                BetType::Team1 => name1,
                BetType::Team2 => name2,
                BetType::Draw => "Draw",
            };
            let marker = if line.qualifies { " *" } else { "" };
            let decimal = AmericanOdds::parse(&line.odds)
                .map(|o| format!("{:.2}", o.decimal()))
                .unwrap_or_default();
            let _ = writeln!(
                out,
                "{:<15} {:>7} {:>7} {:>+6.1}% {:>7} {:>7}{}",
                label,
                pct(line.model_probability),
                pct(line.book_probability),
                line.edge,
                line.odds,
                decimal,
                marker
            );
        }
        if let Some(margin) = report.odds.overround() {
            let _ = writeln!(out, "Book margin: {}", pct(margin));
        }
    }
    out
}

/// Expected scores from a `predict` run, one line per matchup.
pub fn render_projections(projections: &[MatchupProjection], teams: &TeamDirectory) -> String {
    let mut out = String::new();
    for p in projections {
        let _ = writeln!(
            out,
            "{:<15} {:>5.2}  vs  {:<15} {:>5.2}",
            teams.display_name(&p.team1.team),
            p.team1.total,
            teams.display_name(&p.team2.team),
            p.team2.total
        );
    }
    out
}

fn describe_slot(slot: &MissingSlot) -> String {
    match slot.position {
        SlotGroup::Forward => format!("F line {}: {} needed", slot.line, slot.count),
        SlotGroup::Defense => format!("D pair {}: {} needed", slot.line, slot.count),
        SlotGroup::Goalie => "G: starter needed".to_string(),
    }
}

/// Open slots per team, plus any corrections that could not be applied.
pub fn render_missing(outcome: &CorrectionOutcome, teams: &TeamDirectory) -> String {
    let mut out = String::new();
    let incomplete: Vec<&RosterSheet> = outcome.sheets.iter().filter(|s| !s.is_complete()).collect();
    if incomplete.is_empty() {
        let _ = writeln!(out, "All lineups complete.");
    }
    for sheet in incomplete {
        let slots = sheet.missing_slots();
        let needed: usize = slots.iter().map(|s| s.count).sum();
        let _ = writeln!(
            out,
            "{} ({}): {} players needed",
            teams.display_name(&sheet.team),
            sheet.team,
            needed
        );
        for slot in &slots {
            let _ = writeln!(out, "  {}", describe_slot(slot));
        }
    }
    if !outcome.rejected.is_empty() {
        let _ = writeln!(out, "\nRejected corrections:");
        for (c, reason) in &outcome.rejected {
            let _ = writeln!(out, "  {} {} {} {}: {}", c.team, c.position, c.line, c.player, reason);
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use puckline_core::corrections::apply_corrections;
    use puckline_core::directory::TeamInfo;
    use puckline_core::value::{evaluate, ValuePolicy};

    fn directory() -> TeamDirectory {
        TeamDirectory::new([
            (
                "BOS".to_string(),
                TeamInfo {
                    name: "Boston".into(),
                    color: "#FCB514".into(),
                },
            ),
            (
                "TOR".to_string(),
                TeamInfo {
                    name: "Toronto".into(),
                    color: "#003E7E".into(),
                },
            ),
        ])
        .unwrap()
    }

    #[test]
    fn matchup_report_sections() {
        let matrix = ScorelineMatrix::new(3.1, 2.4, 6);
        let outcomes = matrix.outcomes();
        let odds = MatchOdds::new("+130", "-110", "+280");
        let value = evaluate(&outcomes, &odds, &ValuePolicy::default());
        let report = MatchupReport {
            team1: "BOS",
            team2: "TOR",
            team1_xg: 3.1,
            team2_xg: 2.4,
            matrix: &matrix,
            outcomes,
            value: &value,
            odds: &odds,
            final_score: Some((4, 2)),
        };
        let text = render_matchup(&report, &directory());

        assert!(text.contains("Boston vs Toronto"));
        assert!(text.contains("Final: 4-2"));
        assert!(text.contains("Expected Goals:\nBoston: 3.10\nToronto: 2.40"));
        assert!(text.contains("Model Probabilities:"));
        assert!(text.contains("Value Analysis:"));
        assert!(text.contains("+280"));
        // +280 pays 3.80 per unit; the three prices sum to about 122.2%.
        assert!(text.contains("3.80"));
        assert!(text.contains("Book margin: 22.2%"));
        // header plus 7 rows
        let grid = render_grid(&matrix, "Boston", "Toronto");
        assert_eq!(grid.lines().count(), 9);
    }

    #[test]
    fn value_section_omitted_without_prices() {
        let matrix = ScorelineMatrix::new(3.0, 3.0, 6);
        let outcomes = matrix.outcomes();
        let odds = MatchOdds::default();
        let value = evaluate(&outcomes, &odds, &ValuePolicy::default());
        let report = MatchupReport {
            team1: "BOS",
            team2: "XYZ",
            team1_xg: 3.0,
            team2_xg: 3.0,
            matrix: &matrix,
            outcomes,
            value: &value,
            odds: &odds,
            final_score: None,
        };
        let text = render_matchup(&report, &directory());
        assert!(text.contains("Boston vs XYZ"));
        assert!(!text.contains("Value Analysis"));
        assert!(!text.contains("Book margin"));
        assert!(!text.contains("Final:"));
    }

    #[test]
    fn missing_report_lists_slots_and_rejections() {
        let sheets = vec![RosterSheet::new("BOS")];
        let corrections = vec![
            puckline_core::corrections::Correction::parse("TOR G 1 Joseph Woll").unwrap(),
        ];
        let outcome = apply_corrections(&sheets, &corrections);
        let text = render_missing(&outcome, &directory());
        assert!(text.contains("Boston (BOS): 19 players needed"));
        assert!(text.contains("F line 4: 3 needed"));
        assert!(text.contains("G: starter needed"));
        assert!(text.contains("Rejected corrections:"));
        assert!(text.contains("TOR G 1 Joseph Woll"));
    }
}
