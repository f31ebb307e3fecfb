//! Scoring vocabulary shared by every component: dimensions, statuses,
//! confidence levels and letter grades.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Tolerance used when comparing point values.
pub const POINTS_EPSILON: f64 = 1e-9;

/// Whether two point values are equal within [`POINTS_EPSILON`].
pub fn points_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < POINTS_EPSILON
}

/// Rubric dimension a criterion contributes to.
///
/// Ordering is fixed (`CodeQuality < Testing < Documentation`) so that every
/// per-dimension output is emitted in the same order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    CodeQuality,
    Testing,
    Documentation,
}

impl Dimension {
    pub const ALL: [Dimension; 3] = [
        Dimension::CodeQuality,
        Dimension::Testing,
        Dimension::Documentation,
    ];

    /// Stable snake_case key, also used as the evidence directory name.
    pub fn key(self) -> &'static str {
        match self {
            Dimension::CodeQuality => "code_quality",
            Dimension::Testing => "testing",
            Dimension::Documentation => "documentation",
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Dimension::CodeQuality => "Code Quality",
            Dimension::Testing => "Testing",
            Dimension::Documentation => "Documentation",
        }
    }

    /// Inverse of [`Dimension::key`].
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.key() == key)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-criterion decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriterionStatus {
    Met,
    Partial,
    Unmet,
}

impl CriterionStatus {
    /// Points awarded for this status on a criterion worth `max_points`.
    pub fn points_for(self, max_points: f64) -> f64 {
        match self {
            CriterionStatus::Met => max_points,
            CriterionStatus::Partial => max_points / 2.0,
            CriterionStatus::Unmet => 0.0,
        }
    }

    /// Whether `score` is the score this status requires.
    pub fn is_consistent(self, score: f64, max_points: f64) -> bool {
        points_eq(score, self.points_for(max_points))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CriterionStatus::Met => "met",
            CriterionStatus::Partial => "partial",
            CriterionStatus::Unmet => "unmet",
        }
    }
}

impl fmt::Display for CriterionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How much weight a reader should put on a piece of evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// Letter grade derived from a percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LetterGrade {
    A,
    B,
    C,
    D,
    F,
}

impl LetterGrade {
    /// A ≥ 90, B ≥ 80, C ≥ 70, D ≥ 60, otherwise F.
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= 90.0 {
            LetterGrade::A
        } else if percentage >= 80.0 {
            LetterGrade::B
        } else if percentage >= 70.0 {
            LetterGrade::C
        } else if percentage >= 60.0 {
            LetterGrade::D
        } else {
            LetterGrade::F
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LetterGrade::A => "A",
            LetterGrade::B => "B",
            LetterGrade::C => "C",
            LetterGrade::D => "D",
            LetterGrade::F => "F",
        }
    }
}

impl fmt::Display for LetterGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Percentage of `score` over `max`, rounded to two decimals. Zero when `max` is zero.
pub fn percentage(score: f64, max: f64) -> f64 {
    if max <= 0.0 {
        return 0.0;
    }
    round2(score / max * 100.0)
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_for_status() {
        assert_eq!(CriterionStatus::Met.points_for(25.0), 25.0);
        assert_eq!(CriterionStatus::Partial.points_for(25.0), 12.5);
        assert_eq!(CriterionStatus::Unmet.points_for(25.0), 0.0);
    }

    #[test]
    fn test_status_consistency() {
        assert!(CriterionStatus::Partial.is_consistent(7.5, 15.0));
        assert!(!CriterionStatus::Met.is_consistent(7.5, 15.0));
        assert!(!CriterionStatus::Unmet.is_consistent(1.0, 15.0));
    }

    #[test]
    fn test_letter_grade_boundaries() {
        assert_eq!(LetterGrade::from_percentage(100.0), LetterGrade::A);
        assert_eq!(LetterGrade::from_percentage(90.0), LetterGrade::A);
        assert_eq!(LetterGrade::from_percentage(89.99), LetterGrade::B);
        assert_eq!(LetterGrade::from_percentage(80.0), LetterGrade::B);
        assert_eq!(LetterGrade::from_percentage(70.0), LetterGrade::C);
        assert_eq!(LetterGrade::from_percentage(60.0), LetterGrade::D);
        assert_eq!(LetterGrade::from_percentage(59.99), LetterGrade::F);
        assert_eq!(LetterGrade::from_percentage(0.0), LetterGrade::F);
    }

    #[test]
    fn test_dimension_order_and_keys() {
        let mut dims = vec![
            Dimension::Documentation,
            Dimension::CodeQuality,
            Dimension::Testing,
        ];
        dims.sort();
        assert_eq!(dims, Dimension::ALL.to_vec());
        assert_eq!(
            serde_json::to_string(&Dimension::CodeQuality).expect("serialize"),
            "\"code_quality\""
        );
        assert_eq!(Dimension::Testing.to_string(), "Testing");
        assert_eq!(Dimension::from_key("documentation"), Some(Dimension::Documentation));
        assert_eq!(Dimension::from_key("Documentation"), None);
    }

    #[test]
    fn test_percentage_rounding_and_zero_max() {
        assert_eq!(percentage(42.5, 100.0), 42.5);
        assert_eq!(percentage(1.0, 3.0), 33.33);
        assert_eq!(percentage(5.0, 0.0), 0.0);
    }
}
