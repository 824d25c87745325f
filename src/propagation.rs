// 🔗 Requirement Propagator - What each course now requires
//
// The resolver answers "what happened to each course" locally; this module
// answers "is each requirement satisfied" against transcript-wide status
// sets. Prerequisites are only ever looked up one hop away, so the
// curriculum graph is never traversed and cycles cannot loop.

use crate::entities::course::{Checklist, RequirementState};
use crate::entities::transcript::Transcript;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

// ============================================================================
// STATUS SETS
// ============================================================================

/// Transcript-wide aggregate sets; a code is in at most one of them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSets {
    pub approved: BTreeSet<String>,
    pub enrolled: BTreeSet<String>,
    pub failed: BTreeSet<String>,
    pub withdrawn: BTreeSet<String>,
}

impl StatusSets {
    /// Snapshot the aggregate queries of a transcript
    pub fn from_transcript(transcript: &Transcript) -> Self {
        StatusSets {
            approved: transcript.approved_codes().into_iter().collect(),
            enrolled: transcript.enrolled_codes().into_iter().collect(),
            failed: transcript.failed_codes().into_iter().collect(),
            withdrawn: transcript.withdrawn_codes().into_iter().collect(),
        }
    }

    /// Precedence: approved, enrolled, failed, withdrawn, none
    pub fn state_of(&self, code: &str) -> RequirementState {
        if self.approved.contains(code) {
            RequirementState::Approved
        } else if self.enrolled.contains(code) {
            RequirementState::Enrolled
        } else if self.failed.contains(code) {
            RequirementState::Failed
        } else if self.withdrawn.contains(code) {
            RequirementState::Withdrawn
        } else {
            RequirementState::None
        }
    }

    fn apply(&self, checklist: &mut Checklist) {
        for (code, state) in checklist.iter_mut() {
            *state = self.state_of(code);
        }
    }
}

// ============================================================================
// PROPAGATE
// ============================================================================

/// Recompute every requirement checklist in the transcript
///
/// The sets are always taken from the transcript's current canonical
/// statuses, so propagation never runs against a stale aggregate. Running it
/// twice without new ingestion yields identical checklists.
pub fn propagate(transcript: &mut Transcript) -> StatusSets {
    let sets = StatusSets::from_transcript(transcript);

    for course in transcript.courses_mut() {
        let (prerequisites, corequisites) = course.checklists_mut();
        sets.apply(prerequisites);
        sets.apply(corequisites);
    }
    transcript.mark_requirements_current();

    debug!(
        student = %transcript.student_id(),
        approved = sets.approved.len(),
        enrolled = sets.enrolled.len(),
        failed = sets.failed.len(),
        withdrawn = sets.withdrawn.len(),
        "requirements propagated"
    );

    sets
}

// ============================================================================
// TESTS
// ============================================================================
