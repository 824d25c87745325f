// 🧾 Audit Pipeline - One student, or a whole directory of them
//
// Sequential per student: build transcript → ingest → resolve (on attach)
// → propagate → reconcile. Students are independent; a failing student is
// recorded in the batch report and the batch moves on.

use crate::catalog::Catalog;
use crate::config::AuditConfig;
use crate::entities::transcript::Transcript;
use crate::error::AuditError;
use crate::parser::{load_history, load_student_info, RawRecord};
use crate::propagation::{propagate, StatusSets};
use crate::reconciliation::{EquivalencyTable, ReconciliationEngine, ReconciliationReport};
use crate::resolver::ResolutionPolicy;
use crate::rules::CodeNormalizer;
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Manual review cost: a fixed minute per student plus 20 s per history line
pub fn estimated_review_time(history_lines: usize) -> Duration {
    Duration::seconds(60 + 20 * history_lines as i64)
}

// ============================================================================
// STUDENT HISTORY
// ============================================================================

/// Everything the pipeline needs about one student
#[derive(Debug, Clone, Default)]
pub struct StudentHistory {
    pub student_id: String,
    pub student_name: String,
    pub records: Vec<RawRecord>,
}

impl StudentHistory {
    pub fn new(student_id: &str, student_name: &str, records: Vec<RawRecord>) -> Self {
        StudentHistory {
            student_id: student_id.to_string(),
            student_name: student_name.to_string(),
            records,
        }
    }

    /// Read `<stem>.edf` (identity) and `<stem>.sdf` (history) from `dir`
    pub fn load(dir: &Path, stem: &str) -> Result<Self> {
        let (student_id, student_name) = load_student_info(&dir.join(format!("{}.edf", stem)))?;
        let records = load_history(&dir.join(format!("{}.sdf", stem)))?;

        Ok(StudentHistory {
            student_id,
            student_name,
            records,
        })
    }
}

/// Stems of every `.edf` identity file in `dir`, sorted
pub fn list_students(dir: &Path) -> Result<Vec<String>> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("Failed to read history directory: {:?}", dir))?;

    let mut stems = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "edf") {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                stems.push(stem.to_string());
            }
        }
    }
    stems.sort();

    Ok(stems)
}

// ============================================================================
// STUDENT AUDIT
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentAudit {
    pub transcript: Transcript,
    pub status: StatusSets,

    /// None when the engine has no equivalency table
    pub reconciliation: Option<ReconciliationReport>,

    pub audited_at: DateTime<Utc>,
}

impl StudentAudit {
    pub fn student_id(&self) -> &str {
        self.transcript.student_id()
    }

    pub fn review_time_saved(&self) -> Duration {
        estimated_review_time(self.transcript.history_len())
    }

    pub fn summary(&self) -> String {
        let t = &self.transcript;
        let complete = t.completed_semesters().iter().filter(|(_, done)| *done).count();

        format!(
            "{} {}: {}/{} credits approved, {}/{} semesters complete, {} electives, {} unmatched | {}",
            t.student_id(),
            t.student_name(),
            t.approved_credits(),
            t.total_credits(),
            complete,
            t.semesters().count(),
            t.electives().len(),
            t.others().len(),
            t.quality().summary()
        )
    }
}

// ============================================================================
// AUDIT ENGINE
// ============================================================================

pub struct AuditEngine {
    catalog: Catalog,
    normalizer: CodeNormalizer,
    policy: ResolutionPolicy,
    reconciler: Option<ReconciliationEngine>,
}

impl AuditEngine {
    pub fn new(catalog: Catalog, normalizer: CodeNormalizer, policy: ResolutionPolicy) -> Self {
        AuditEngine {
            catalog,
            normalizer,
            policy,
            reconciler: None,
        }
    }

    /// Builder pattern: reconcile every audit against this table
    pub fn with_equivalencies(mut self, table: EquivalencyTable) -> Self {
        self.reconciler = Some(ReconciliationEngine::new(table));
        self
    }

    /// Catalog, rules and equivalencies as the configuration describes them
    pub fn from_config(config: &AuditConfig) -> Result<Self> {
        let catalog = config.load_catalog()?;
        let normalizer = config.normalizer()?;
        let table = config.load_equivalencies()?;

        info!(
            courses = catalog.len(),
            rules = normalizer.rule_count(),
            equivalencies = table.len(),
            policy = ?config.resolution_policy,
            "audit engine ready"
        );

        Ok(AuditEngine::new(catalog, normalizer, config.resolution_policy).with_equivalencies(table))
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn policy(&self) -> ResolutionPolicy {
        self.policy
    }

    /// Run the full pipeline for one student
    pub fn audit_student(&self, history: &StudentHistory) -> Result<StudentAudit, AuditError> {
        validate_student_id(&history.student_id)?;

        let mut transcript = Transcript::from_catalog(&self.catalog, self.policy)
            .with_student(history.student_id.trim(), history.student_name.trim());
        transcript.ingest_all(&history.records, &self.normalizer);

        let status = propagate(&mut transcript);
        let reconciliation = self.reconciler.as_ref().map(|r| r.reconcile(&transcript));

        let audit = StudentAudit {
            transcript,
            status,
            reconciliation,
            audited_at: Utc::now(),
        };
        info!("{}", audit.summary());

        Ok(audit)
    }

    /// Audit every loaded history; load failures pass straight into the report
    pub fn audit_batch<I>(&self, histories: I) -> BatchReport
    where
        I: IntoIterator<Item = (String, Result<StudentHistory, AuditError>)>,
    {
        let mut report = BatchReport::new();

        for (label, loaded) in histories {
            match loaded.and_then(|history| self.audit_student(&history)) {
                Ok(audit) => report.audits.push(audit),
                Err(e) => {
                    error!(student = %label, "audit failed: {}", e);
                    report.failures.push(BatchFailure {
                        student: label,
                        error: e.to_string(),
                    });
                }
            }
        }

        report.finished_at = Utc::now();
        info!("{}", report.summary());
        report
    }

    /// Audit every `<id>.edf` / `<id>.sdf` pair in `dir`
    pub fn audit_directory(&self, dir: &Path) -> Result<BatchReport> {
        let stems = list_students(dir)?;
        info!(students = stems.len(), dir = ?dir, "batch audit started");

        let histories = stems.into_iter().map(|stem| {
            let loaded = StudentHistory::load(dir, &stem).map_err(|e| AuditError::History {
                student: stem.clone(),
                reason: format!("{:#}", e),
            });
            (stem, loaded)
        });

        Ok(self.audit_batch(histories))
    }
}

/// Ids must be usable as a bare file name inside the output directory
pub fn validate_student_id(id: &str) -> Result<(), AuditError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(AuditError::MissingStudentId);
    }
    if id.contains(|c: char| c == '/' || c == '\\') || id.contains("..") {
        return Err(AuditError::InvalidStudentId(id.to_string()));
    }
    Ok(())
}

/// Write `<student_id>.json` into `output_dir`
pub fn write_report(audit: &StudentAudit, output_dir: &Path) -> Result<PathBuf> {
    validate_student_id(audit.student_id())?;
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", output_dir))?;

    let path = output_dir.join(format!("{}.json", audit.student_id()));
    let json = serde_json::to_string_pretty(audit)?;
    fs::write(&path, json).with_context(|| format!("Failed to write report: {:?}", path))?;

    Ok(path)
}

// ============================================================================
// BATCH REPORT
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchFailure {
    pub student: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub audits: Vec<StudentAudit>,
    pub failures: Vec<BatchFailure>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl BatchReport {
    pub fn new() -> Self {
        let now = Utc::now();
        BatchReport {
            audits: Vec::new(),
            failures: Vec::new(),
            started_at: now,
            finished_at: now,
        }
    }

    pub fn total(&self) -> usize {
        self.audits.len() + self.failures.len()
    }

    /// Write one report per audit; a student whose report cannot be written
    /// moves from `audits` to `failures` and the rest are still written
    pub fn write_reports(&mut self, output_dir: &Path) -> Vec<PathBuf> {
        let mut written = Vec::new();

        for audit in std::mem::take(&mut self.audits) {
            match write_report(&audit, output_dir) {
                Ok(path) => {
                    written.push(path);
                    self.audits.push(audit);
                }
                Err(e) => {
                    error!(student = %audit.student_id(), "report not written: {:#}", e);
                    self.failures.push(BatchFailure {
                        student: audit.student_id().to_string(),
                        error: format!("{:#}", e),
                    });
                }
            }
        }

        written
    }

    /// Sum of per-student manual review estimates
    pub fn review_time_saved(&self) -> Duration {
        self.audits
            .iter()
            .fold(Duration::zero(), |acc, a| acc + a.review_time_saved())
    }

    pub fn summary(&self) -> String {
        let saved = self.review_time_saved();
        format!(
            "{} students: {} audited, {} failed | ~{}h {:02}m of manual review saved",
            self.total(),
            self.audits.len(),
            self.failures.len(),
            saved.num_hours(),
            saved.num_minutes() % 60
        )
    }
}

impl Default for BatchReport {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogEntry;
    use crate::reconciliation::{EquivalencyRule, NewSideStatus};

    fn engine() -> AuditEngine {
        let catalog = Catalog::from_entries(vec![
            CatalogEntry::new("MA1001", "CALCULO I", 3, 1),
            CatalogEntry::new("QU0100", "QUIMICA GENERAL I", 3, 1),
            CatalogEntry::new("MA1002", "CALCULO II", 4, 2).with_prerequisites(["MA1001"]),
            CatalogEntry::new("QU0102", "QUIMICA GENERAL II", 3, 2).with_prerequisites(["QU0100"]),
        ])
        .unwrap();
        let table = EquivalencyTable::from_rules(vec![
            EquivalencyRule::new(&["MA1001"], "MA1001"),
            EquivalencyRule::new(&["QU0100", "QU0102"], "QU0114"),
        ])
        .unwrap();

        AuditEngine::new(catalog, CodeNormalizer::new(), ResolutionPolicy::default())
            .with_equivalencies(table)
    }

    fn history(id: &str) -> StudentHistory {
        StudentHistory::new(
            id,
            "ANA MORA",
            vec![
                RawRecord::new("MA1001", "CALCULO I", "I", "2022", "APROBADO"),
                RawRecord::new("QU0100", "QUIMICA GENERAL I", "I", "2022", "APROBADO"),
                RawRecord::new("MA1002", "CALCULO II", "II", "2022", "MATRICULADO"),
            ],
        )
    }

    #[test]
    fn test_review_time_estimate() {
        assert_eq!(estimated_review_time(0), Duration::minutes(1));
        assert_eq!(estimated_review_time(3), Duration::minutes(2));
    }

    #[test]
    fn test_audit_student_runs_full_pipeline() {
        let audit = engine().audit_student(&history("C14407")).unwrap();

        assert!(audit.transcript.requirements_current());
        assert!(audit.status.approved.contains("MA1001"));
        assert!(audit.status.enrolled.contains("MA1002"));
        assert!(audit.transcript.course("MA1002").unwrap().requisites_met());
        assert!(audit.transcript.semester_completion(1));

        let reconciliation = audit.reconciliation.unwrap();
        assert_eq!(
            reconciliation.row_for("QU0100").unwrap().status,
            NewSideStatus::Requires(vec!["QU0102".to_string()])
        );
    }

    #[test]
    fn test_missing_student_id() {
        let err = engine().audit_student(&history("  ")).unwrap_err();
        assert!(matches!(err, AuditError::MissingStudentId));
    }

    #[test]
    fn test_batch_isolates_failures() {
        let histories = vec![
            ("A1".to_string(), Ok(history("A1"))),
            ("bad".to_string(), Ok(history(""))),
            (
                "B2".to_string(),
                Err(AuditError::History {
                    student: "B2".to_string(),
                    reason: "missing file".to_string(),
                }),
            ),
            ("C3".to_string(), Ok(history("C3"))),
        ];

        let report = engine().audit_batch(histories);

        assert_eq!(report.total(), 4);
        assert_eq!(report.audits.len(), 2);
        assert_eq!(report.failures[0].student, "bad");
        assert_eq!(report.failures[1].student, "B2");
        // two students, three lines each: 2 × (60 + 60) s
        assert_eq!(report.review_time_saved(), Duration::minutes(4));
    }

    #[test]
    fn test_path_like_ids_rejected() {
        for id in ["../escaped", "B3/6447", "C1\\4407", ".."] {
            let err = engine().audit_student(&history(id)).unwrap_err();
            assert!(matches!(err, AuditError::InvalidStudentId(_)), "{}", id);
        }
        assert!(validate_student_id("B36447").is_ok());
    }

    #[test]
    fn test_write_reports_isolates_write_failures() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        // a directory squatting on A1's report path makes only that write fail
        fs::create_dir_all(out.join("A1.json")).unwrap();

        let histories = vec![
            ("A1".to_string(), Ok(history("A1"))),
            ("B2".to_string(), Ok(history("B2"))),
        ];
        let mut report = engine().audit_batch(histories);
        let written = report.write_reports(&out);

        assert_eq!(written, vec![out.join("B2.json")]);
        assert_eq!(report.audits.len(), 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].student, "A1");
        assert_eq!(report.total(), 2);
    }

    #[test]
    fn test_write_report() {
        let dir = tempfile::tempdir().unwrap();
        let audit = engine().audit_student(&history("C14407")).unwrap();

        let path = write_report(&audit, &dir.path().join("out")).unwrap();

        assert!(path.ends_with("C14407.json"));
        let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(json["transcript"]["student_id"], "C14407");
    }
}
