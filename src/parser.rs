// 🏗️ Record Parser - The record ingestion boundary
//
// Upstream collaborators (scrapers, clipboard readers, flat files) hand us
// string-typed records. Every field is parsed defensively here and turned
// into closed types; nothing past this module sees a raw string.

use crate::data_quality::{QualityIssue, Severity};
use crate::entities::attempt::{AttemptRecord, Outcome, Term};
use crate::rules::CodeNormalizer;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

// ============================================================================
// RAW RECORD
// ============================================================================

/// RawRecord - one history line exactly as the registry reports it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(rename = "SIGLA", default)]
    pub sigla: String,

    #[serde(rename = "CURSO", default)]
    pub curso: String,

    #[serde(rename = "CREDITOS", default)]
    pub creditos: String,

    #[serde(rename = "GRUPO", default)]
    pub grupo: String,

    #[serde(rename = "SEM", default)]
    pub sem: String,

    #[serde(rename = "AÑO", default)]
    pub anno: String,

    #[serde(rename = "ESTADO", default)]
    pub estado: String,

    #[serde(rename = "NOTA", default)]
    pub nota: Option<String>,
}

impl RawRecord {
    /// Create a record with the fields the core needs to match it
    pub fn new(sigla: &str, curso: &str, sem: &str, anno: &str, estado: &str) -> Self {
        RawRecord {
            sigla: sigla.to_string(),
            curso: curso.to_string(),
            sem: sem.to_string(),
            anno: anno.to_string(),
            estado: estado.to_string(),
            ..Default::default()
        }
    }

    /// Builder pattern: add grade
    pub fn with_nota(mut self, nota: &str) -> Self {
        self.nota = Some(nota.to_string());
        self
    }

    /// Builder pattern: add group
    pub fn with_grupo(mut self, grupo: &str) -> Self {
        self.grupo = grupo.to_string();
        self
    }

    /// Builder pattern: add credits
    pub fn with_creditos(mut self, creditos: &str) -> Self {
        self.creditos = creditos.to_string();
        self
    }

    pub fn code(&self) -> &str {
        self.sigla.trim()
    }
}

// ============================================================================
// FIELD PARSERS
// ============================================================================

/// Group number; 0 when unparsable
pub fn parse_group(value: &str, code: &str, issues: &mut Vec<QualityIssue>) -> i32 {
    let trimmed = value.trim();
    match trimmed.parse::<i32>() {
        Ok(group) => group,
        Err(_) => {
            if !trimmed.is_empty() {
                issues.push(QualityIssue::new(
                    Severity::Info,
                    code,
                    "group",
                    format!("Group is not numeric: '{}'", trimmed),
                    "Group defaulted to 0",
                ));
            }
            0
        }
    }
}

/// Credits as reported upstream. The catalog's credit value is authoritative,
/// so this is only checked, never used.
pub fn check_credits(value: &str, code: &str, issues: &mut Vec<QualityIssue>) {
    let trimmed = value.trim();
    if !trimmed.is_empty() && trimmed.parse::<u32>().is_err() {
        issues.push(QualityIssue::new(
            Severity::Info,
            code,
            "credits",
            format!("Credits are not numeric: '{}'", trimmed),
            "Catalog credits used instead",
        ));
    }
}

/// Year; 0 when unparsable
pub fn parse_year(value: &str, code: &str, issues: &mut Vec<QualityIssue>) -> i32 {
    let trimmed = value.trim();
    trimmed.parse::<i32>().unwrap_or_else(|_| {
        issues.push(QualityIssue::new(
            Severity::Warning,
            code,
            "year",
            format!("Year is not numeric: '{}'", trimmed),
            "Year defaulted to 0; this attempt sorts as the oldest",
        ));
        0
    })
}

/// Term; anything but "I"/"II" is term 3
pub fn parse_term(value: &str, code: &str, issues: &mut Vec<QualityIssue>) -> Term {
    if !Term::is_recognized_label(value) {
        issues.push(QualityIssue::new(
            Severity::Info,
            code,
            "term",
            format!("Unexpected term label: '{}'", value.trim()),
            "Term treated as the third (summer) term",
        ));
    }
    Term::from_label(value)
}

/// Outcome; unknown labels map to UNKNOWN
pub fn parse_outcome(value: &str, code: &str, issues: &mut Vec<QualityIssue>) -> Outcome {
    let outcome = Outcome::from_label(value);
    if outcome == Outcome::Unknown {
        issues.push(QualityIssue::new(
            Severity::Warning,
            code,
            "outcome",
            format!("Unknown status label: '{}'", value.trim()),
            "Attempt cannot satisfy any requirement until the status is corrected",
        ));
    }
    outcome
}

/// Grade as a decimal; absent or unparsable values become None
pub fn parse_grade(value: Option<&str>, code: &str, issues: &mut Vec<QualityIssue>) -> Option<f64> {
    let trimmed = value?.trim();
    if trimmed.is_empty() {
        return None;
    }

    match trimmed.parse::<f64>() {
        Ok(grade) if grade.is_finite() => Some(grade),
        _ => {
            issues.push(QualityIssue::new(
                Severity::Warning,
                code,
                "grade",
                format!("Grade is not numeric: '{}'", trimmed),
                "Grade left empty",
            ));
            None
        }
    }
}

// ============================================================================
// RECORD → ATTEMPT
// ============================================================================

/// Output of `parse_record`: the typed attempt plus recovered defaults
#[derive(Debug, Clone)]
pub struct ParsedRecord {
    pub attempt: AttemptRecord,
    pub issues: Vec<QualityIssue>,
}

/// Convert a raw record into an AttemptRecord. Never fails.
pub fn parse_record(raw: &RawRecord, normalizer: &CodeNormalizer) -> ParsedRecord {
    let code = raw.code();
    let mut issues = Vec::new();

    if code.is_empty() {
        issues.push(QualityIssue::new(
            Severity::Critical,
            code,
            "code",
            "Course code is empty",
            "Record cannot be matched to the catalog",
        ));
    }

    check_credits(&raw.creditos, code, &mut issues);
    let group = parse_group(&raw.grupo, code, &mut issues);
    let term = parse_term(&raw.sem, code, &mut issues);
    let year = parse_year(&raw.anno, code, &mut issues);
    let outcome = parse_outcome(&raw.estado, code, &mut issues);
    let grade = parse_grade(raw.nota.as_deref(), code, &mut issues);

    let attempt = AttemptRecord::new(
        code,
        normalizer.normalize(code),
        raw.curso.trim(),
        term,
        year,
        outcome,
    )
    .with_group(group)
    .with_grade(grade)
    .with_outcome_label(raw.estado.trim());

    ParsedRecord { attempt, issues }
}

// ============================================================================
// FLAT FILES
// ============================================================================

/// Load a tab-separated history file with the SIGLA/CURSO/... header
pub fn load_history(path: &Path) -> Result<Vec<RawRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open history file: {:?}", path))?;

    let mut records = Vec::new();
    for result in rdr.deserialize() {
        let record: RawRecord = result.context("Failed to deserialize history record")?;
        records.push(record);
    }

    Ok(records)
}

/// Load a student identity file: first line id, second line display name
pub fn load_student_info(path: &Path) -> Result<(String, String)> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read student info file: {:?}", path))?;

    let mut lines = content.lines();
    let id = lines.next().unwrap_or_default().trim().to_string();
    let name = lines.next().unwrap_or_default().trim().to_string();

    Ok((id, name))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_clean_record() {
        let raw = RawRecord::new("MA1001", "CALCULO I", "I", "2023", "APROBADO")
            .with_nota("8.5")
            .with_grupo("02")
            .with_creditos(" 3 ");
        let parsed = parse_record(&raw, &CodeNormalizer::new());

        assert!(parsed.issues.is_empty());
        assert_eq!(parsed.attempt.code, "MA1001");
        assert_eq!(parsed.attempt.normalized_code, "MA1001");
        assert_eq!(parsed.attempt.group, 2);
        assert_eq!(parsed.attempt.term, Term::First);
        assert_eq!(parsed.attempt.year, 2023);
        assert_eq!(parsed.attempt.outcome, Outcome::Approved);
        assert_eq!(parsed.attempt.grade, Some(8.5));
    }

    #[test]
    fn test_parse_dirty_record_recovers_defaults() {
        let raw = RawRecord::new("SR0022", "SEMINARIO", "V", "20x3", "RARO")
            .with_nota("N/A")
            .with_grupo("g1")
            .with_creditos("tres");
        let parsed = parse_record(&raw, &CodeNormalizer::new());

        assert_eq!(parsed.attempt.normalized_code, "SR-II");
        assert_eq!(parsed.attempt.group, 0);
        assert_eq!(parsed.attempt.year, 0);
        assert_eq!(parsed.attempt.term, Term::Third);
        assert_eq!(parsed.attempt.outcome, Outcome::Unknown);
        assert_eq!(parsed.attempt.outcome_label, "RARO");
        assert_eq!(parsed.attempt.grade, None);

        let fields: Vec<&str> = parsed.issues.iter().map(|i| i.field.as_str()).collect();
        assert_eq!(fields, vec!["credits", "group", "term", "year", "outcome", "grade"]);
    }

    #[test]
    fn test_absent_grade_is_not_an_issue() {
        let mut issues = Vec::new();
        assert_eq!(parse_grade(None, "MA1001", &mut issues), None);
        assert_eq!(parse_grade(Some("  "), "MA1001", &mut issues), None);
        assert!(issues.is_empty());
    }

    #[test]
    fn test_empty_code_is_critical() {
        let raw = RawRecord::new("", "???", "I", "2023", "APROBADO");
        let parsed = parse_record(&raw, &CodeNormalizer::new());
        assert_eq!(parsed.issues[0].severity, Severity::Critical);
    }

    #[test]
    fn test_load_history_tsv() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "SIGLA\tCURSO\tCREDITOS\tGRUPO\tSEM\tAÑO\tESTADO\tNOTA").unwrap();
        writeln!(file, "MA1001\tCALCULO I\t3\t1\tI\t2023\tAPROBADO\t8.0").unwrap();
        writeln!(file, "MA1002\tCALCULO II\t4\t2\tII\t2023\tMATRICULADO\t").unwrap();

        let records = load_history(file.path()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].sigla, "MA1001");
        assert_eq!(records[0].nota.as_deref(), Some("8.0"));
        assert_eq!(records[1].estado, "MATRICULADO");
        assert_eq!(records[1].nota, None);
    }

    #[test]
    fn test_load_student_info() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "B36447\nMARIA PEREZ").unwrap();

        let (id, name) = load_student_info(file.path()).unwrap();
        assert_eq!(id, "B36447");
        assert_eq!(name, "MARIA PEREZ");
    }
}
