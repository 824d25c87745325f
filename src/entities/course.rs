// 📚 Course Instance - A catalog course bound to one student
//
// Owns the attempt history (most recent first) and the two requirement
// checklists. The canonical resolution is recomputed on every insert, so it
// can never disagree with the history it was derived from.

use crate::catalog::CatalogEntry;
use crate::entities::attempt::AttemptRecord;
use crate::resolver::{resolve, select, Resolution, ResolutionPolicy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// REQUIREMENT STATE
// ============================================================================

/// Fulfillment state of one prerequisite/co-requisite entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequirementState {
    #[default]
    None,
    Enrolled,
    Failed,
    Withdrawn,
    Approved,
}

impl RequirementState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequirementState::None => "NONE",
            RequirementState::Enrolled => "ENROLLED",
            RequirementState::Failed => "FAILED",
            RequirementState::Withdrawn => "WITHDRAWN",
            RequirementState::Approved => "APPROVED",
        }
    }
}

impl fmt::Display for RequirementState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requisite code → state
pub type Checklist = BTreeMap<String, RequirementState>;

// ============================================================================
// COURSE INSTANCE
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseInstance {
    entry: CatalogEntry,
    attempts: Vec<AttemptRecord>,
    prerequisites: Checklist,
    corequisites: Checklist,
    policy: ResolutionPolicy,
    resolution: Resolution,
}

impl CourseInstance {
    /// Empty instance: no attempts, every requisite NONE
    pub fn new(entry: CatalogEntry, policy: ResolutionPolicy) -> Self {
        let prerequisites = entry
            .prerequisites
            .iter()
            .map(|code| (code.clone(), RequirementState::None))
            .collect();
        let corequisites = entry
            .corequisites
            .iter()
            .map(|code| (code.clone(), RequirementState::None))
            .collect();

        CourseInstance {
            entry,
            attempts: Vec::new(),
            prerequisites,
            corequisites,
            policy,
            resolution: Resolution::none(),
        }
    }

    // ========================================================================
    // CATALOG DATA
    // ========================================================================

    pub fn entry(&self) -> &CatalogEntry {
        &self.entry
    }

    pub fn code(&self) -> &str {
        &self.entry.code
    }

    pub fn name(&self) -> &str {
        &self.entry.name
    }

    pub fn credits(&self) -> u32 {
        self.entry.credits
    }

    pub fn semester(&self) -> u32 {
        self.entry.semester
    }

    // ========================================================================
    // HISTORY
    // ========================================================================

    /// Append an attempt, keep history most-recent-first and re-resolve
    ///
    /// The sort is stable, so attempts in the same (year, term) keep
    /// insertion order.
    pub fn add_attempt(&mut self, attempt: AttemptRecord) {
        let pos = self
            .attempts
            .partition_point(|a| a.chronology() >= attempt.chronology());
        self.attempts.insert(pos, attempt);
        self.resolution = resolve(&self.attempts, self.policy);
    }

    /// Attempts, most recent first
    pub fn attempts(&self) -> &[AttemptRecord] {
        &self.attempts
    }

    pub fn resolution(&self) -> &Resolution {
        &self.resolution
    }

    /// The attempt the canonical resolution was taken from
    pub fn resolved_attempt(&self) -> Option<&AttemptRecord> {
        select(&self.attempts, self.policy)
    }

    /// Upstream label of the canonical status, empty when never attempted
    pub fn status_label(&self) -> &str {
        self.resolved_attempt()
            .map(|a| a.outcome_label.as_str())
            .unwrap_or("")
    }

    pub fn policy(&self) -> ResolutionPolicy {
        self.policy
    }

    pub fn is_approved(&self) -> bool {
        self.resolution.is_approved()
    }

    // ========================================================================
    // REQUIREMENTS
    // ========================================================================

    pub fn prerequisites(&self) -> &Checklist {
        &self.prerequisites
    }

    pub fn corequisites(&self) -> &Checklist {
        &self.corequisites
    }

    pub fn has_prerequisites(&self) -> bool {
        !self.prerequisites.is_empty()
    }

    pub fn has_corequisites(&self) -> bool {
        !self.corequisites.is_empty()
    }

    /// True iff every prerequisite is APPROVED (vacuously true when empty)
    pub fn requisites_met(&self) -> bool {
        self.prerequisites
            .values()
            .all(|s| *s == RequirementState::Approved)
    }

    /// Same rule as `requisites_met`, applied to co-requisites
    pub fn corequisites_met(&self) -> bool {
        self.corequisites
            .values()
            .all(|s| *s == RequirementState::Approved)
    }

    pub(crate) fn checklists_mut(&mut self) -> (&mut Checklist, &mut Checklist) {
        (&mut self.prerequisites, &mut self.corequisites)
    }
}

impl fmt::Display for CourseInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let term = self.resolution.term.map(|t| t.to_string()).unwrap_or_default();
        let year = self.resolution.year.map(|y| y.to_string()).unwrap_or_default();
        let grade = self
            .resolution
            .grade
            .map(|g| format!("{:.1}", g))
            .unwrap_or_default();

        write!(
            f,
            "{:8} {:60} {:2} {:15} {:>3} {:4} {:>5}",
            self.code(),
            self.name(),
            self.credits(),
            self.resolution.label(),
            term,
            year,
            grade
        )
    }
}

// ============================================================================
// TESTS
// ============================================================================
