// 🎓 Transcript - A student's full record against one catalog
//
// Created empty from a Catalog, then mutated by ingestion and by the
// propagator. Records that match no cataloged course are kept in one of two
// overflow buckets for manual review, never dropped.

use crate::catalog::Catalog;
use crate::data_quality::QualityReport;
use crate::entities::attempt::Outcome;
use crate::entities::course::CourseInstance;
use crate::entities::semester::Semester;
use crate::parser::{parse_record, RawRecord};
use crate::resolver::ResolutionPolicy;
use crate::rules::CodeNormalizer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

// ============================================================================
// INGEST OUTCOME
// ============================================================================

/// Where an ingested record ended up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IngestOutcome {
    /// Attached to the course with this catalog code
    Matched { semester: u32, code: String },

    /// No catalog match; raw code follows the elective convention
    Elective,

    /// No catalog match
    Other,
}

// ============================================================================
// TRANSCRIPT
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    student_id: String,
    student_name: String,
    semesters: BTreeMap<u32, Semester>,
    electives: Vec<RawRecord>,
    others: Vec<RawRecord>,
    quality: QualityReport,
    policy: ResolutionPolicy,

    /// False after any ingestion until the propagator runs again
    requirements_current: bool,
}

impl Transcript {
    /// Empty transcript: one Semester per semester number in the catalog
    pub fn from_catalog(catalog: &Catalog, policy: ResolutionPolicy) -> Self {
        let mut semesters: BTreeMap<u32, Semester> = BTreeMap::new();

        for entry in catalog.entries() {
            semesters
                .entry(entry.semester)
                .or_insert_with(|| Semester::new(entry.semester))
                .add_course(CourseInstance::new(entry.clone(), policy));
        }

        Transcript {
            student_id: String::new(),
            student_name: String::new(),
            semesters,
            electives: Vec::new(),
            others: Vec::new(),
            quality: QualityReport::new(),
            policy,
            requirements_current: true,
        }
    }

    /// Builder pattern: attach student identity
    pub fn with_student(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.student_id = id.into();
        self.student_name = name.into();
        self
    }

    // ========================================================================
    // INGESTION
    // ========================================================================

    /// Attach a raw record to its course, or bucket it. Never fails.
    pub fn ingest(&mut self, raw: &RawRecord, normalizer: &CodeNormalizer) -> IngestOutcome {
        let parsed = parse_record(raw, normalizer);

        for issue in &parsed.issues {
            warn!(
                student = %self.student_id,
                code = %issue.code,
                field = %issue.field,
                "{}", issue.issue
            );
        }
        self.quality.record(parsed.issues);
        self.requirements_current = false;

        let normalized = parsed.attempt.normalized_code.clone();
        for semester in self.semesters.values_mut() {
            if let Some(course) = semester.course_mut(&normalized) {
                course.add_attempt(parsed.attempt);
                debug!(code = %raw.code(), course = %normalized, "attempt attached");
                return IngestOutcome::Matched {
                    semester: semester.number(),
                    code: normalized,
                };
            }
        }

        if normalizer.is_elective(raw.code()) {
            debug!(code = %raw.code(), "unmatched record bucketed as elective");
            self.electives.push(raw.clone());
            IngestOutcome::Elective
        } else {
            debug!(code = %raw.code(), "unmatched record bucketed as other");
            self.others.push(raw.clone());
            IngestOutcome::Other
        }
    }

    /// Ingest a sequence of records in order
    pub fn ingest_all<'a, I>(&mut self, records: I, normalizer: &CodeNormalizer)
    where
        I: IntoIterator<Item = &'a RawRecord>,
    {
        for raw in records {
            self.ingest(raw, normalizer);
        }
    }

    // ========================================================================
    // IDENTITY / STRUCTURE
    // ========================================================================

    pub fn student_id(&self) -> &str {
        &self.student_id
    }

    pub fn student_name(&self) -> &str {
        &self.student_name
    }

    pub fn policy(&self) -> ResolutionPolicy {
        self.policy
    }

    pub fn semesters(&self) -> impl Iterator<Item = &Semester> {
        self.semesters.values()
    }

    pub fn semester(&self, number: u32) -> Option<&Semester> {
        self.semesters.get(&number)
    }

    /// Every course instance, in semester order
    pub fn courses(&self) -> impl Iterator<Item = &CourseInstance> {
        self.semesters.values().flat_map(|s| s.courses().iter())
    }

    pub(crate) fn courses_mut(&mut self) -> impl Iterator<Item = &mut CourseInstance> {
        self.semesters.values_mut().flat_map(|s| s.courses_mut())
    }

    pub fn course(&self, code: &str) -> Option<&CourseInstance> {
        self.semesters.values().find_map(|s| s.course(code))
    }

    /// Unmatched records following the elective convention
    pub fn electives(&self) -> &[RawRecord] {
        &self.electives
    }

    /// Unmatched records of any other kind
    pub fn others(&self) -> &[RawRecord] {
        &self.others
    }

    pub fn quality(&self) -> &QualityReport {
        &self.quality
    }

    /// Are the requirement checklists in sync with the attempt histories?
    pub fn requirements_current(&self) -> bool {
        self.requirements_current
    }

    pub(crate) fn mark_requirements_current(&mut self) {
        self.requirements_current = true;
    }

    // ========================================================================
    // AGGREGATE QUERIES
    // ========================================================================

    /// Catalog codes with an approved-class canonical status, sorted
    pub fn approved_codes(&self) -> Vec<String> {
        self.collect_sorted(|s| s.approved_codes())
    }

    pub fn enrolled_codes(&self) -> Vec<String> {
        self.collect_sorted(|s| s.codes_with_outcome(Outcome::Enrolled))
    }

    pub fn failed_codes(&self) -> Vec<String> {
        self.collect_sorted(|s| s.codes_with_outcome(Outcome::Failed))
    }

    pub fn withdrawn_codes(&self) -> Vec<String> {
        self.collect_sorted(|s| s.codes_with_outcome(Outcome::Withdrawn))
    }

    fn collect_sorted<F>(&self, per_semester: F) -> Vec<String>
    where
        F: Fn(&Semester) -> Vec<String>,
    {
        let mut codes: Vec<String> = self.semesters.values().flat_map(per_semester).collect();
        codes.sort();
        codes
    }

    /// True iff every course in semester `number` is approved.
    /// Unknown semester numbers are never complete.
    pub fn semester_completion(&self, number: u32) -> bool {
        self.semesters.get(&number).is_some_and(|s| s.is_complete())
    }

    /// (number, complete) for every semester, ascending
    pub fn completed_semesters(&self) -> Vec<(u32, bool)> {
        self.semesters
            .values()
            .map(|s| (s.number(), s.is_complete()))
            .collect()
    }

    pub fn total_credits(&self) -> u32 {
        self.semesters.values().map(|s| s.total_credits()).sum()
    }

    pub fn approved_credits(&self) -> u32 {
        self.semesters.values().map(|s| s.approved_credits()).sum()
    }

    /// Number of raw history lines ingested
    pub fn history_len(&self) -> usize {
        self.quality.records_total
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogEntry;
    use proptest::prelude::*;

    fn catalog() -> Catalog {
        Catalog::from_entries(vec![
            CatalogEntry::new("MA1001", "CALCULO I", 3, 1),
            CatalogEntry::new("SR-I", "SEMINARIO DE REALIDAD NACIONAL I", 2, 1),
            CatalogEntry::new("MA1002", "CALCULO II", 4, 2).with_prerequisites(["MA1001"]),
        ])
        .unwrap()
    }

    fn transcript() -> Transcript {
        Transcript::from_catalog(&catalog(), ResolutionPolicy::default()).with_student("B36447", "MARIA")
    }

    #[test]
    fn test_skeleton_from_catalog() {
        let t = transcript();

        assert_eq!(t.semesters().count(), 2);
        assert_eq!(t.semester(1).unwrap().courses().len(), 2);
        assert_eq!(t.total_credits(), 9);
        assert!(t.course("MA1002").unwrap().attempts().is_empty());
    }

    #[test]
    fn test_ingest_matches_normalized_code() {
        let mut t = transcript();
        let normalizer = CodeNormalizer::new();

        let outcome = t.ingest(&RawRecord::new("SR0003", "SEMINARIO", "I", "2023", "APROBADO"), &normalizer);

        assert_eq!(outcome, IngestOutcome::Matched { semester: 1, code: "SR-I".to_string() });
        let attempt = &t.course("SR-I").unwrap().attempts()[0];
        assert_eq!(attempt.code, "SR0003");
        assert_eq!(attempt.normalized_code, "SR-I");
        assert!(!t.requirements_current());
    }

    #[test]
    fn test_unmatched_records_bucketed() {
        let mut t = transcript();
        let normalizer = CodeNormalizer::new();

        let elective = t.ingest(&RawRecord::new("II0999", "OPTATIVO", "I", "2023", "APROBADO"), &normalizer);
        let other = t.ingest(&RawRecord::new("XX0001", "OTRO", "I", "2023", "APROBADO"), &normalizer);

        assert_eq!(elective, IngestOutcome::Elective);
        assert_eq!(other, IngestOutcome::Other);
        assert_eq!(t.electives().len(), 1);
        assert_eq!(t.others()[0].sigla, "XX0001");
    }

    #[test]
    fn test_aggregate_sets_are_sorted_and_disjoint() {
        let mut t = transcript();
        let normalizer = CodeNormalizer::new();

        t.ingest(&RawRecord::new("MA1002", "CALCULO II", "I", "2024", "MATRICULADO"), &normalizer);
        t.ingest(&RawRecord::new("MA1001", "CALCULO I", "I", "2022", "REPROBADO"), &normalizer);
        t.ingest(&RawRecord::new("MA1001", "CALCULO I", "II", "2022", "APROBADO"), &normalizer);
        t.ingest(&RawRecord::new("SR0001", "SEMINARIO", "I", "2023", "RETIRO DE MA"), &normalizer);

        assert_eq!(t.approved_codes(), vec!["MA1001"]);
        assert_eq!(t.enrolled_codes(), vec!["MA1002"]);
        assert!(t.failed_codes().is_empty());
        assert_eq!(t.withdrawn_codes(), vec!["SR-I"]);
        assert_eq!(t.approved_credits(), 3);
    }

    #[test]
    fn test_semester_completion() {
        let mut t = transcript();
        let normalizer = CodeNormalizer::new();

        t.ingest(&RawRecord::new("MA1001", "CALCULO I", "I", "2022", "APROBADO"), &normalizer);
        assert!(!t.semester_completion(1));

        t.ingest(&RawRecord::new("SR0002", "SEMINARIO", "I", "2022", "CONVALIDADO"), &normalizer);
        assert!(t.semester_completion(1));
        assert!(!t.semester_completion(2));
        assert!(!t.semester_completion(99));
        assert_eq!(t.completed_semesters(), vec![(1, true), (2, false)]);
    }

    proptest! {
        #[test]
        fn prop_unknown_codes_land_in_exactly_one_bucket(
            codes in prop::collection::vec("[A-Z]{2}[0-9]{4}", 1..20),
        ) {
            let mut t = transcript();
            let normalizer = CodeNormalizer::new();
            let mut unmatched = 0;

            for code in &codes {
                let raw = RawRecord::new(code, "X", "I", "2023", "APROBADO");
                match t.ingest(&raw, &normalizer) {
                    IngestOutcome::Matched { .. } => {}
                    IngestOutcome::Elective => {
                        unmatched += 1;
                        prop_assert!(t.electives().last() == Some(&raw));
                    }
                    IngestOutcome::Other => {
                        unmatched += 1;
                        prop_assert!(t.others().last() == Some(&raw));
                    }
                }
            }

            prop_assert_eq!(t.electives().len() + t.others().len(), unmatched);
        }
    }
}
