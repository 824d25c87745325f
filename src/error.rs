// ⚠️ Error Types - What can actually stop the pipeline
//
// Dirty history data never lands here: it is recovered with defaults and
// recorded as a QualityIssue. Only malformed configuration tables are fatal,
// and batch failures are reported per student.

use thiserror::Error;

/// Errors raised while building a Catalog
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Two entries share the same course code
    #[error("Duplicate course code in catalog: {0}")]
    DuplicateCode(String),

    /// A required field is absent or empty
    #[error("Catalog entry #{index} is missing required field '{field}'")]
    MissingField { index: usize, field: &'static str },

    /// Semester numbers start at 1
    #[error("Course {0} has an invalid semester number (must be >= 1)")]
    InvalidSemester(String),

    /// A course lists itself as prerequisite or co-requisite
    #[error("Course {code} lists itself as its own {kind}")]
    SelfRequisite { code: String, kind: &'static str },

    #[error("Failed to parse catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while building a normalization or equivalency table
#[derive(Error, Debug)]
pub enum RuleTableError {
    /// Equivalency rules combine one or two legacy courses
    #[error("Equivalency rule #{index} has {count} legacy codes (expected 1 or 2)")]
    LegacyCodeCount { index: usize, count: usize },

    #[error("Normalization rule #{0} has an empty prefix")]
    EmptyPrefix(usize),

    #[error("Failed to parse rule table JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to read rule table file: {0}")]
    Io(#[from] std::io::Error),
}

/// Per-student failures in batch mode
#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Student record has no identifier")]
    MissingStudentId,

    /// Ids name the report file, so they must be a single path component
    #[error("Student id '{0}' is not a valid file name")]
    InvalidStudentId(String),

    /// The history file for a student could not be read
    #[error("History for student {student} is unreadable: {reason}")]
    History { student: String, reason: String },
}

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
