// Curriculum Audit - Core Library
// Exposes all modules for use in the CLI and tests

pub mod error;
pub mod entities;       // Data model: attempts, courses, semesters, transcripts
pub mod catalog;        // Curriculum definition
pub mod rules;          // Code normalization rules
pub mod parser;         // Record ingestion boundary
pub mod data_quality;   // Recovered defaults, per transcript
pub mod resolver;       // Status Resolver
pub mod propagation;    // Requirement Propagator
pub mod reconciliation; // Equivalency Reconciler
pub mod config;
pub mod audit;          // Per-student pipeline + batch

// Re-export commonly used types
pub use error::{AuditError, CatalogError, ConfigError, RuleTableError};
pub use entities::{
    AttemptRecord, Outcome, Term,
    Checklist, CourseInstance, RequirementState,
    Semester, IngestOutcome, Transcript,
};
pub use catalog::{Catalog, CatalogEntry, CatalogRow};
pub use rules::{CodeNormalizer, NormalizationRule};
pub use parser::{load_history, load_student_info, parse_record, ParsedRecord, RawRecord};
pub use data_quality::{QualityIssue, QualityReport, Severity};
pub use resolver::{resolve, select, Resolution, ResolutionPolicy};
pub use propagation::{propagate, StatusSets};
pub use reconciliation::{
    reconcile, EquivalencyRule, EquivalencyTable, LegacySide, NewSideStatus,
    ReconciliationEngine, ReconciliationReport, ReconciliationRow,
};
pub use config::AuditConfig;
pub use audit::{
    estimated_review_time, validate_student_id, write_report, AuditEngine, BatchFailure, BatchReport,
    StudentAudit, StudentHistory,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
