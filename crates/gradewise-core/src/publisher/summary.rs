//! Fixed-structure text report rendered from a [`ScoreOutput`].

use super::ScoreOutput;

fn list(ids: &[String]) -> String {
    if ids.is_empty() {
        "(none)".to_string()
    } else {
        ids.join(", ")
    }
}

/// Render the human summary using only the fields of `output`.
pub fn render_summary(output: &ScoreOutput) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Score: {}/{} ({}%), grade {}\n",
        output.total_score, output.max_possible_score, output.percentage, output.letter_grade
    ));

    for (dimension, b) in &output.dimension_breakdowns {
        out.push_str(&format!(
            "\n{}: {}/{} ({}%)\n",
            dimension.label(),
            b.score,
            b.max,
            b.percentage
        ));
        out.push_str(&format!("  met ({}): {}\n", b.met_count, list(&b.met)));
        out.push_str(&format!("  partial ({}): {}\n", b.partial_count, list(&b.partial)));
        out.push_str(&format!("  unmet ({}): {}\n", b.unmet_count, list(&b.unmet)));
    }

    out.push_str(&format!("\nEvidence files: {}\n", output.evidence_paths.len()));

    if !output.warnings.is_empty() {
        out.push_str("Warnings:\n");
        for warning in &output.warnings {
            out.push_str(&format!("  - {warning}\n"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    use super::*;
    use crate::domain::{Dimension, LetterGrade};
    use crate::publisher::DimensionBreakdown;

    #[test]
    fn test_summary_render_is_stable() {
        let mut breakdowns = BTreeMap::new();
        breakdowns.insert(
            Dimension::Testing,
            DimensionBreakdown {
                score: 12.5,
                max: 40.0,
                percentage: 31.25,
                met_count: 0,
                partial_count: 1,
                unmet_count: 1,
                met: vec![],
                partial: vec!["tests_pass".to_string()],
                unmet: vec!["coverage".to_string()],
            },
        );
        breakdowns.insert(
            Dimension::CodeQuality,
            DimensionBreakdown {
                score: 30.0,
                max: 60.0,
                percentage: 50.0,
                met_count: 1,
                partial_count: 0,
                unmet_count: 1,
                met: vec!["lint_clean".to_string()],
                partial: vec![],
                unmet: vec!["build_passes".to_string()],
            },
        );
        let mut evidence_paths = BTreeMap::new();
        evidence_paths.insert("lint_clean-01".to_string(), PathBuf::from("/e/l.json"));

        let output = ScoreOutput {
            total_score: 42.5,
            max_possible_score: 100.0,
            percentage: 42.5,
            letter_grade: LetterGrade::F,
            dimension_breakdowns: breakdowns,
            evidence_paths,
            warnings: vec!["2 evidence reference(s) dropped".to_string()],
            human_summary: String::new(),
        };

        let expected = "Score: 42.5/100 (42.5%), grade F\n\
\n\
Code Quality: 30/60 (50%)\n  met (1): lint_clean\n  partial (0): (none)\n  unmet (1): build_passes\n\
\n\
Testing: 12.5/40 (31.25%)\n  met (0): (none)\n  partial (1): tests_pass\n  unmet (1): coverage\n\
\n\
Evidence files: 1\n\
Warnings:\n  - 2 evidence reference(s) dropped\n";
        assert_eq!(render_summary(&output), expected);
    }
}
