// 🧭 Status Resolver - Collapse an attempt history into one canonical status
//
// Input is always ordered most-recent-first (CourseInstance keeps it that way).
//
// Two policies exist in practice and they disagree whenever a student is
// re-enrolled in a course they already passed:
//   ApprovalPermanent: any approved-class attempt wins, forever
//   MostRecent:        the latest attempt wins, whatever it says

use crate::entities::attempt::{AttemptRecord, Outcome, Term};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// RESOLUTION POLICY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionPolicy {
    /// Once earned, an approval is the canonical state
    #[default]
    ApprovalPermanent,

    /// The most recent attempt is always authoritative
    MostRecent,
}

// ============================================================================
// RESOLUTION
// ============================================================================

/// Canonical status/grade/term/year of one course
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Resolution {
    /// None means no attempts at all (the NONE sentinel)
    pub outcome: Option<Outcome>,
    pub grade: Option<f64>,
    pub term: Option<Term>,
    pub year: Option<i32>,
}

impl Resolution {
    pub fn none() -> Self {
        Resolution::default()
    }

    fn from_attempt(attempt: &AttemptRecord) -> Self {
        Resolution {
            outcome: Some(attempt.outcome),
            grade: attempt.grade,
            term: Some(attempt.term),
            year: Some(attempt.year),
        }
    }

    pub fn is_none(&self) -> bool {
        self.outcome.is_none()
    }

    pub fn is_approved(&self) -> bool {
        self.outcome.is_some_and(|o| o.is_approved_class())
    }

    pub fn is(&self, outcome: Outcome) -> bool {
        self.outcome == Some(outcome)
    }

    /// Source-system label, empty string for NONE
    pub fn label(&self) -> &'static str {
        self.outcome.map(|o| o.label()).unwrap_or("")
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// RESOLVE
// ============================================================================

/// The attempt that carries the canonical status (most-recent-first input)
pub fn select(attempts: &[AttemptRecord], policy: ResolutionPolicy) -> Option<&AttemptRecord> {
    let latest = attempts.first()?;

    match policy {
        ResolutionPolicy::ApprovalPermanent => Some(
            attempts
                .iter()
                .find(|a| a.outcome.is_approved_class())
                .unwrap_or(latest),
        ),
        ResolutionPolicy::MostRecent => Some(latest),
    }
}

/// Resolve an attempt history (most recent first) under the given policy
pub fn resolve(attempts: &[AttemptRecord], policy: ResolutionPolicy) -> Resolution {
    select(attempts, policy)
        .map(Resolution::from_attempt)
        .unwrap_or_default()
}

// ============================================================================
// TESTS
// ============================================================================
