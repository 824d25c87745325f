// ⚖️ Equivalency Reconciler - Legacy curriculum → new curriculum
//
// Table-driven: each rule maps one or two legacy courses onto one new
// course. A two-course rule (e.g. QU0100 + QU0102 → QU0114) is only
// satisfied when BOTH legacy courses are individually approved.

use crate::entities::attempt::{Outcome, Term};
use crate::entities::course::CourseInstance;
use crate::entities::transcript::Transcript;
use crate::error::RuleTableError;
use crate::parser::RawRecord;
use crate::resolver::{Resolution, ResolutionPolicy};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::info;

/// Legacy → new table for the industrial-engineering curriculum change
const BUILTIN_EQUIVALENCIES: &str = include_str!("../data/equivalencies.json");

// ============================================================================
// EQUIVALENCY RULE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquivalencyRule {
    /// One code, or two codes that must both be approved
    pub legacy_codes: Vec<String>,
    pub legacy_name: String,

    #[serde(default)]
    pub legacy_credits: Option<u32>,

    /// Empty means "no equivalence exists"
    #[serde(default)]
    pub new_code: String,

    #[serde(default)]
    pub new_name: String,

    #[serde(default)]
    pub new_credits: Option<u32>,
}

impl EquivalencyRule {
    pub fn new(legacy_codes: &[&str], new_code: &str) -> Self {
        EquivalencyRule {
            legacy_codes: legacy_codes.iter().map(|c| c.to_string()).collect(),
            legacy_name: String::new(),
            legacy_credits: None,
            new_code: new_code.to_string(),
            new_name: String::new(),
            new_credits: None,
        }
    }

    /// Builder pattern: add display names
    pub fn with_names(mut self, legacy_name: &str, new_name: &str) -> Self {
        self.legacy_name = legacy_name.to_string();
        self.new_name = new_name.to_string();
        self
    }

    /// Builder pattern: add credit values
    pub fn with_credits(mut self, legacy: Option<u32>, new: Option<u32>) -> Self {
        self.legacy_credits = legacy;
        self.new_credits = new;
        self
    }

    pub fn has_equivalence(&self) -> bool {
        !self.new_code.is_empty()
    }

    /// Rule that needs several legacy courses approved together
    pub fn is_combination(&self) -> bool {
        self.legacy_codes.len() > 1
    }

    /// Same single code on both sides
    pub fn is_identity(&self) -> bool {
        self.legacy_codes.len() == 1 && self.legacy_codes[0] == self.new_code
    }

    pub fn covers(&self, legacy_code: &str) -> bool {
        self.legacy_codes.iter().any(|c| c == legacy_code)
    }
}

// ============================================================================
// EQUIVALENCY TABLE
// ============================================================================

/// Ordered rule table; read-only once built
#[derive(Debug, Clone, Default)]
pub struct EquivalencyTable {
    rules: Vec<EquivalencyRule>,
}

impl EquivalencyTable {
    pub fn from_rules(rules: Vec<EquivalencyRule>) -> Result<Self, RuleTableError> {
        for (index, rule) in rules.iter().enumerate() {
            let count = rule.legacy_codes.len();
            if count == 0 || count > 2 {
                return Err(RuleTableError::LegacyCodeCount { index, count });
            }
        }

        Ok(EquivalencyTable { rules })
    }

    pub fn from_json_str(json: &str) -> Result<Self, RuleTableError> {
        let rules: Vec<EquivalencyRule> = serde_json::from_str(json)?;
        EquivalencyTable::from_rules(rules)
    }

    /// Load rules from JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RuleTableError> {
        let content = fs::read_to_string(path.as_ref())?;
        EquivalencyTable::from_json_str(&content)
    }

    pub fn builtin() -> Result<Self, RuleTableError> {
        EquivalencyTable::from_json_str(BUILTIN_EQUIVALENCIES)
    }

    /// First rule whose legacy codes contain `legacy_code`
    pub fn rule_for(&self, legacy_code: &str) -> Option<&EquivalencyRule> {
        self.rules.iter().find(|r| r.covers(legacy_code))
    }

    pub fn rules(&self) -> &[EquivalencyRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

// ============================================================================
// RECONCILIATION ROW
// ============================================================================

/// Verdict on the new-curriculum side of a row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NewSideStatus {
    /// The legacy course has no counterpart in the new curriculum
    NoEquivalence,

    /// Same course in both curricula: the upstream status label, verbatim
    Mirrored(String),

    /// Legacy approval counts for the new course
    Reconciled,

    /// Legacy course approved, but these combination siblings are not
    Requires(Vec<String>),

    /// Not yet satisfied
    Pending,
}

impl NewSideStatus {
    pub fn label(&self) -> String {
        match self {
            NewSideStatus::NoEquivalence => "no equivalence".to_string(),
            NewSideStatus::Mirrored(label) => label.clone(),
            NewSideStatus::Reconciled => "RECONCILED".to_string(),
            NewSideStatus::Requires(codes) => format!("requires {}", codes.join(", ")),
            NewSideStatus::Pending => "PENDING".to_string(),
        }
    }
}

impl fmt::Display for NewSideStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Legacy side of a row, as it stands in the transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacySide {
    pub code: String,
    pub name: String,
    pub credits: u32,
    pub status: Resolution,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationRow {
    /// None for a new course with no cataloged legacy counterpart
    pub legacy: Option<LegacySide>,
    pub new_code: String,
    pub new_name: String,
    pub new_credits: Option<u32>,
    pub status: NewSideStatus,
}

// ============================================================================
// RECONCILE
// ============================================================================

/// One row per legacy course instance, then one row per new code that no
/// legacy course reached: PENDING, unless an identity rule finds the code in
/// the overflow buckets
pub fn reconcile(transcript: &Transcript, table: &EquivalencyTable) -> Vec<ReconciliationRow> {
    let mut rows: Vec<ReconciliationRow> = transcript
        .courses()
        .map(|course| reconcile_course(transcript, table, course))
        .collect();

    let mut seen: HashSet<String> = rows
        .iter()
        .filter(|r| !r.new_code.is_empty())
        .map(|r| r.new_code.clone())
        .collect();

    for rule in table.rules() {
        if rule.has_equivalence() && seen.insert(rule.new_code.clone()) {
            // identity rules can still be met by an uncataloged record
            let status = if rule.is_identity() {
                overflow_label(transcript, &rule.new_code)
                    .map(NewSideStatus::Mirrored)
                    .unwrap_or(NewSideStatus::Pending)
            } else {
                NewSideStatus::Pending
            };

            rows.push(ReconciliationRow {
                legacy: None,
                new_code: rule.new_code.clone(),
                new_name: rule.new_name.clone(),
                new_credits: rule.new_credits,
                status,
            });
        }
    }

    rows
}

/// Status label of `code` among the overflow records, resolved the way the
/// transcript resolves cataloged courses
fn overflow_label(transcript: &Transcript, code: &str) -> Option<String> {
    let records: Vec<&RawRecord> = transcript
        .electives()
        .iter()
        .chain(transcript.others())
        .filter(|r| r.code() == code)
        .collect();

    let approved = records
        .iter()
        .find(|r| Outcome::from_label(&r.estado).is_approved_class());
    let latest = records
        .iter()
        .max_by_key(|r| (r.anno.trim().parse::<i32>().unwrap_or(0), Term::from_label(&r.sem)));

    let chosen = match transcript.policy() {
        ResolutionPolicy::ApprovalPermanent => approved.or(latest),
        ResolutionPolicy::MostRecent => latest,
    };
    chosen.map(|r| r.estado.trim().to_string())
}

fn reconcile_course(
    transcript: &Transcript,
    table: &EquivalencyTable,
    course: &CourseInstance,
) -> ReconciliationRow {
    let legacy = LegacySide {
        code: course.code().to_string(),
        name: course.name().to_string(),
        credits: course.credits(),
        status: *course.resolution(),
    };

    let rule = match table.rule_for(course.code()) {
        Some(rule) if rule.has_equivalence() => rule,
        _ => {
            return ReconciliationRow {
                legacy: Some(legacy),
                new_code: String::new(),
                new_name: String::new(),
                new_credits: None,
                status: NewSideStatus::NoEquivalence,
            }
        }
    };

    let status = if rule.is_identity() {
        NewSideStatus::Mirrored(course.status_label().to_string())
    } else if legacy.status.is_approved() {
        let missing = missing_siblings(transcript, rule);
        if missing.is_empty() {
            NewSideStatus::Reconciled
        } else {
            NewSideStatus::Requires(missing)
        }
    } else {
        NewSideStatus::Pending
    };

    ReconciliationRow {
        legacy: Some(legacy),
        new_code: rule.new_code.clone(),
        new_name: rule.new_name.clone(),
        new_credits: rule.new_credits,
        status,
    }
}

/// Legacy codes of the rule that are not approved in the transcript
fn missing_siblings(transcript: &Transcript, rule: &EquivalencyRule) -> Vec<String> {
    rule.legacy_codes
        .iter()
        .filter(|code| !is_approved(transcript, code))
        .cloned()
        .collect()
}

fn is_approved(transcript: &Transcript, code: &str) -> bool {
    transcript.course(code).is_some_and(|c| c.is_approved())
}

// ============================================================================
// RECONCILIATION REPORT
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub student_id: String,
    pub rows: Vec<ReconciliationRow>,

    /// New codes of combination rules whose legacy courses are all approved
    pub satisfied_combinations: Vec<String>,

    pub reconciled_at: DateTime<Utc>,
}

impl ReconciliationReport {
    pub fn count(&self, predicate: impl Fn(&NewSideStatus) -> bool) -> usize {
        self.rows.iter().filter(|r| predicate(&r.status)).count()
    }

    pub fn reconciled_count(&self) -> usize {
        self.count(|s| *s == NewSideStatus::Reconciled)
    }

    pub fn pending_count(&self) -> usize {
        self.count(|s| *s == NewSideStatus::Pending)
    }

    pub fn requires_count(&self) -> usize {
        self.count(|s| matches!(s, NewSideStatus::Requires(_)))
    }

    pub fn no_equivalence_count(&self) -> usize {
        self.count(|s| *s == NewSideStatus::NoEquivalence)
    }

    pub fn mirrored_count(&self) -> usize {
        self.count(|s| matches!(s, NewSideStatus::Mirrored(_)))
    }

    /// Row for a given legacy code
    pub fn row_for(&self, legacy_code: &str) -> Option<&ReconciliationRow> {
        self.rows
            .iter()
            .find(|r| r.legacy.as_ref().is_some_and(|l| l.code == legacy_code))
    }

    pub fn summary(&self) -> String {
        format!(
            "Reconciliation for {}: {} rows | {} reconciled, {} mirrored, {} requiring siblings, {} pending, {} without equivalence",
            self.student_id,
            self.rows.len(),
            self.reconciled_count(),
            self.mirrored_count(),
            self.requires_count(),
            self.pending_count(),
            self.no_equivalence_count()
        )
    }
}

// ============================================================================
// RECONCILIATION ENGINE
// ============================================================================

pub struct ReconciliationEngine {
    table: EquivalencyTable,
}

impl ReconciliationEngine {
    pub fn new(table: EquivalencyTable) -> Self {
        ReconciliationEngine { table }
    }

    pub fn table(&self) -> &EquivalencyTable {
        &self.table
    }

    /// Reconcile a resolved transcript against the equivalency table
    pub fn reconcile(&self, transcript: &Transcript) -> ReconciliationReport {
        let rows = reconcile(transcript, &self.table);

        let satisfied_combinations = self
            .table
            .rules()
            .iter()
            .filter(|r| r.is_combination() && r.has_equivalence())
            .filter(|r| missing_siblings(transcript, r).is_empty())
            .map(|r| r.new_code.clone())
            .collect();

        let report = ReconciliationReport {
            student_id: transcript.student_id().to_string(),
            rows,
            satisfied_combinations,
            reconciled_at: Utc::now(),
        };

        info!("{}", report.summary());
        report
    }
}

// ============================================================================
// TESTS
// ============================================================================
