// 📝 Attempt Record - One observation of a student taking a course
//
// Raw strings from upstream collaborators are converted into closed enums at
// the ingestion boundary, so nothing downstream ever sees "RETIRO DE MA".

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

// ============================================================================
// TERM
// ============================================================================

/// Academic term within a year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Term {
    /// First semester ("I")
    First = 1,
    /// Second semester ("II")
    Second = 2,
    /// Summer / any other label
    Third = 3,
}

impl Term {
    /// Parse the source-system label. Anything but "I" or "II" is term 3.
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "I" => Term::First,
            "II" => Term::Second,
            _ => Term::Third,
        }
    }

    /// Whether a label maps to a term without falling back
    pub fn is_recognized_label(label: &str) -> bool {
        matches!(label.trim(), "I" | "II" | "III")
    }

    pub fn number(&self) -> u8 {
        *self as u8
    }

    pub fn label(&self) -> &'static str {
        match self {
            Term::First => "I",
            Term::Second => "II",
            Term::Third => "III",
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// OUTCOME
// ============================================================================

/// Outcome of a single attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Approved,
    Enrolled,
    Failed,
    Withdrawn,
    Equivalent,
    Validated,
    Unknown,
}

impl Outcome {
    /// Parse an upstream status label (Spanish source labels or English names)
    pub fn from_label(label: &str) -> Self {
        let upper = label.trim().to_uppercase();

        match upper.as_str() {
            "APROBADO" | "APPROVED" => Outcome::Approved,
            "MATRICULADO" | "ENROLLED" => Outcome::Enrolled,
            "REPROBADO" | "FAILED" => Outcome::Failed,
            "EQUIVALENTE" | "EQUIVALENT" => Outcome::Equivalent,
            "CONVALIDADO" | "VALIDATED" => Outcome::Validated,
            "WITHDRAWN" => Outcome::Withdrawn,
            s if s.starts_with("RETIRO") => Outcome::Withdrawn,
            _ => Outcome::Unknown,
        }
    }

    /// APPROVED, EQUIVALENT and VALIDATED all satisfy a requirement
    pub fn is_approved_class(&self) -> bool {
        matches!(self, Outcome::Approved | Outcome::Equivalent | Outcome::Validated)
    }

    /// Label used by the source system and by report renderers
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Approved => "APROBADO",
            Outcome::Enrolled => "MATRICULADO",
            Outcome::Failed => "REPROBADO",
            Outcome::Withdrawn => "RETIRO DE MA",
            Outcome::Equivalent => "EQUIVALENTE",
            Outcome::Validated => "CONVALIDADO",
            Outcome::Unknown => "DESCONOCIDO",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// ATTEMPT RECORD
// ============================================================================

/// AttemptRecord - immutable once created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// Code exactly as reported upstream
    pub code: String,

    /// Code after the normalization table was applied
    pub normalized_code: String,

    pub name: String,
    pub group: i32,
    pub term: Term,
    pub year: i32,
    pub outcome: Outcome,

    /// Upstream status label, kept for UNKNOWN outcomes
    pub outcome_label: String,

    /// None when absent or unparsable
    pub grade: Option<f64>,
}

impl AttemptRecord {
    pub fn new(
        code: impl Into<String>,
        normalized_code: impl Into<String>,
        name: impl Into<String>,
        term: Term,
        year: i32,
        outcome: Outcome,
    ) -> Self {
        AttemptRecord {
            code: code.into(),
            normalized_code: normalized_code.into(),
            name: name.into(),
            group: 0,
            term,
            year,
            outcome,
            outcome_label: outcome.label().to_string(),
            grade: None,
        }
    }

    /// Builder pattern: add group number
    pub fn with_group(mut self, group: i32) -> Self {
        self.group = group;
        self
    }

    /// Builder pattern: add grade
    pub fn with_grade(mut self, grade: Option<f64>) -> Self {
        self.grade = grade;
        self
    }

    /// Builder pattern: keep the raw upstream label
    pub fn with_outcome_label(mut self, label: impl Into<String>) -> Self {
        self.outcome_label = label.into();
        self
    }

    /// Sort key: (year, term)
    pub fn chronology(&self) -> (i32, Term) {
        (self.year, self.term)
    }

    /// Most recent first
    pub fn cmp_recency_desc(a: &AttemptRecord, b: &AttemptRecord) -> Ordering {
        b.chronology().cmp(&a.chronology())
    }
}

impl fmt::Display for AttemptRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let grade = self.grade.map(|g| format!("{:.1}", g)).unwrap_or_default();
        write!(
            f,
            "{:8} {:8} {:3} {:4} {:>5} {}",
            self.code, self.normalized_code, self.term, self.year, grade, self.outcome_label
        )
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_from_label() {
        assert_eq!(Term::from_label("I"), Term::First);
        assert_eq!(Term::from_label(" II "), Term::Second);
        assert_eq!(Term::from_label("III"), Term::Third);
        assert_eq!(Term::from_label("V"), Term::Third);
        assert_eq!(Term::from_label(""), Term::Third);
        assert!(Term::First < Term::Second && Term::Second < Term::Third);
    }

    #[test]
    fn test_outcome_from_source_labels() {
        assert_eq!(Outcome::from_label("APROBADO"), Outcome::Approved);
        assert_eq!(Outcome::from_label("matriculado"), Outcome::Enrolled);
        assert_eq!(Outcome::from_label("REPROBADO"), Outcome::Failed);
        assert_eq!(Outcome::from_label("RETIRO DE MA"), Outcome::Withdrawn);
        assert_eq!(Outcome::from_label("EQUIVALENTE"), Outcome::Equivalent);
        assert_eq!(Outcome::from_label("CONVALIDADO"), Outcome::Validated);
        assert_eq!(Outcome::from_label("INCOMPLETO"), Outcome::Unknown);
    }

    #[test]
    fn test_approved_class() {
        assert!(Outcome::Approved.is_approved_class());
        assert!(Outcome::Equivalent.is_approved_class());
        assert!(Outcome::Validated.is_approved_class());
        assert!(!Outcome::Enrolled.is_approved_class());
        assert!(!Outcome::Failed.is_approved_class());
        assert!(!Outcome::Withdrawn.is_approved_class());
        assert!(!Outcome::Unknown.is_approved_class());
    }

    #[test]
    fn test_recency_ordering() {
        let old = AttemptRecord::new("MA1001", "MA1001", "CALCULO I", Term::Second, 2022, Outcome::Failed);
        let new = AttemptRecord::new("MA1001", "MA1001", "CALCULO I", Term::First, 2023, Outcome::Approved);

        let mut attempts = vec![old.clone(), new.clone()];
        attempts.sort_by(AttemptRecord::cmp_recency_desc);

        assert_eq!(attempts[0], new);
        assert_eq!(attempts[1], old);
    }
}
