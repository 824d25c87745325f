// Entity Models - The student-record data model
//
// Catalog entries are values; a Transcript owns Semesters, which own
// CourseInstances, which own their attempt histories. Nothing holds a
// back-reference: every lookup goes through a catalog code.

pub mod attempt;
pub mod course;
pub mod semester;
pub mod transcript;

pub use attempt::{AttemptRecord, Outcome, Term};
pub use course::{Checklist, CourseInstance, RequirementState};
pub use semester::Semester;
pub use transcript::{IngestOutcome, Transcript};
