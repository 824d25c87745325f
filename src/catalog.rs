// 📖 Catalog - Static definition of one curriculum version
//
// Loaded once, immutable afterwards, shared by reference with every
// Transcript built from it. A malformed catalog is the only condition that
// aborts construction: every downstream invariant depends on it.

use crate::error::CatalogError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Legacy industrial-engineering curriculum shipped with the library
const BUILTIN_CATALOG: &str = include_str!("../data/catalog.json");

// ============================================================================
// CATALOG ENTRY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub code: String,
    pub name: String,
    pub credits: u32,

    /// Placement semester (1-based)
    pub semester: u32,

    pub prerequisites: Vec<String>,
    pub corequisites: Vec<String>,
}

impl CatalogEntry {
    pub fn new(code: impl Into<String>, name: impl Into<String>, credits: u32, semester: u32) -> Self {
        CatalogEntry {
            code: code.into(),
            name: name.into(),
            credits,
            semester,
            prerequisites: Vec::new(),
            corequisites: Vec::new(),
        }
    }

    /// Builder pattern: add prerequisites (duplicates ignored)
    pub fn with_prerequisites<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for code in codes {
            push_unique(&mut self.prerequisites, code.into());
        }
        self
    }

    /// Builder pattern: add co-requisites (duplicates ignored)
    pub fn with_corequisites<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for code in codes {
            push_unique(&mut self.corequisites, code.into());
        }
        self
    }
}

fn push_unique(list: &mut Vec<String>, code: String) {
    if !list.contains(&code) {
        list.push(code);
    }
}

// ============================================================================
// CATALOG CONFIGURATION ENTRY (external interface)
// ============================================================================

/// One entry of the catalog configuration, as externally maintained
///
/// Every field is optional at the serde level so a missing field surfaces as
/// `CatalogError::MissingField` with the entry index, instead of an opaque
/// deserialization error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogRow {
    pub sigla: Option<String>,
    pub curso: Option<String>,
    pub creditos: Option<u32>,
    pub semestre: Option<u32>,

    #[serde(default)]
    pub requisitos: Vec<String>,

    #[serde(default)]
    pub correquisitos: Vec<String>,
}

impl CatalogRow {
    fn into_entry(self, index: usize) -> Result<CatalogEntry, CatalogError> {
        let code = required_text(self.sigla, index, "sigla")?;
        let name = required_text(self.curso, index, "curso")?;
        let credits = self
            .creditos
            .ok_or(CatalogError::MissingField { index, field: "creditos" })?;
        let semester = self
            .semestre
            .ok_or(CatalogError::MissingField { index, field: "semestre" })?;

        Ok(CatalogEntry::new(code, name, credits, semester)
            .with_prerequisites(self.requisitos)
            .with_corequisites(self.correquisitos))
    }
}

fn required_text(
    value: Option<String>,
    index: usize,
    field: &'static str,
) -> Result<String, CatalogError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(CatalogError::MissingField { index, field }),
    }
}

// ============================================================================
// CATALOG
// ============================================================================

#[derive(Debug, Clone)]
pub struct Catalog {
    /// Entries in configuration order
    entries: Vec<CatalogEntry>,

    /// code → position in `entries`
    index: HashMap<String, usize>,
}

impl Catalog {
    /// Build a catalog from already-typed entries
    pub fn from_entries(entries: Vec<CatalogEntry>) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(entries.len());

        for (i, entry) in entries.iter().enumerate() {
            if entry.semester == 0 {
                return Err(CatalogError::InvalidSemester(entry.code.clone()));
            }
            if entry.prerequisites.contains(&entry.code) {
                return Err(CatalogError::SelfRequisite {
                    code: entry.code.clone(),
                    kind: "prerequisite",
                });
            }
            if entry.corequisites.contains(&entry.code) {
                return Err(CatalogError::SelfRequisite {
                    code: entry.code.clone(),
                    kind: "co-requisite",
                });
            }
            if index.insert(entry.code.clone(), i).is_some() {
                return Err(CatalogError::DuplicateCode(entry.code.clone()));
            }
        }

        let catalog = Catalog { entries, index };
        catalog.log_external_requisites();
        Ok(catalog)
    }

    /// Build a catalog from the configuration interface
    pub fn from_rows(rows: Vec<CatalogRow>) -> Result<Self, CatalogError> {
        let entries = rows
            .into_iter()
            .enumerate()
            .map(|(i, row)| row.into_entry(i))
            .collect::<Result<Vec<_>, _>>()?;

        Catalog::from_entries(entries)
    }

    /// Parse a JSON array of catalog configuration entries
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let rows: Vec<CatalogRow> = serde_json::from_str(json)?;
        Catalog::from_rows(rows)
    }

    /// Load catalog configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path.as_ref())?;
        Catalog::from_json_str(&content)
    }

    /// The legacy industrial-engineering curriculum
    pub fn builtin() -> Result<Self, CatalogError> {
        Catalog::from_json_str(BUILTIN_CATALOG)
    }

    /// Requisites may point outside the modeled catalog; that is allowed
    fn log_external_requisites(&self) {
        for entry in &self.entries {
            for code in entry.prerequisites.iter().chain(&entry.corequisites) {
                if !self.contains(code) {
                    debug!(course = %entry.code, requisite = %code, "requisite outside catalog");
                }
            }
        }
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    pub fn get(&self, code: &str) -> Option<&CatalogEntry> {
        self.index.get(code).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, code: &str) -> bool {
        self.index.contains_key(code)
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct semester numbers, ascending
    pub fn semester_numbers(&self) -> BTreeSet<u32> {
        self.entries.iter().map(|e| e.semester).collect()
    }

    pub fn total_credits(&self) -> u32 {
        self.entries.iter().map(|e| e.credits).sum()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_entries() {
        let catalog = Catalog::from_entries(vec![
            CatalogEntry::new("MA1001", "CALCULO I", 3, 1),
            CatalogEntry::new("MA1002", "CALCULO II", 4, 2).with_prerequisites(["MA1001"]),
        ])
        .unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("MA1002").unwrap().prerequisites, vec!["MA1001"]);
        assert_eq!(catalog.semester_numbers().into_iter().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(catalog.total_credits(), 7);
    }

    #[test]
    fn test_duplicate_code_rejected() {
        let err = Catalog::from_entries(vec![
            CatalogEntry::new("MA1001", "CALCULO I", 3, 1),
            CatalogEntry::new("MA1001", "CALCULO I (BIS)", 3, 2),
        ])
        .unwrap_err();

        assert!(matches!(err, CatalogError::DuplicateCode(code) if code == "MA1001"));
    }

    #[test]
    fn test_self_requisite_rejected() {
        let err = Catalog::from_entries(vec![
            CatalogEntry::new("QU0100", "QUIMICA GENERAL I", 3, 1).with_corequisites(["QU0100"]),
        ])
        .unwrap_err();

        assert!(matches!(err, CatalogError::SelfRequisite { kind: "co-requisite", .. }));
    }

    #[test]
    fn test_zero_semester_rejected() {
        let err = Catalog::from_entries(vec![CatalogEntry::new("MA1001", "CALCULO I", 3, 0)])
            .unwrap_err();
        assert!(matches!(err, CatalogError::InvalidSemester(_)));
    }

    #[test]
    fn test_json_missing_field() {
        let json = r#"[
            {"sigla": "MA1001", "curso": "CALCULO I", "creditos": 3, "semestre": 1},
            {"sigla": "MA1002", "creditos": 4, "semestre": 2}
        ]"#;

        let err = Catalog::from_json_str(json).unwrap_err();
        assert!(matches!(err, CatalogError::MissingField { index: 1, field: "curso" }));
    }

    #[test]
    fn test_json_missing_credits_and_semester() {
        let no_credits = r#"[{"sigla": "MA1001", "curso": "CALCULO I", "semestre": 1}]"#;
        let no_semester = r#"[{"sigla": "MA1001", "curso": "CALCULO I", "creditos": 3}]"#;

        assert!(matches!(
            Catalog::from_json_str(no_credits).unwrap_err(),
            CatalogError::MissingField { index: 0, field: "creditos" }
        ));
        assert!(matches!(
            Catalog::from_json_str(no_semester).unwrap_err(),
            CatalogError::MissingField { index: 0, field: "semestre" }
        ));
    }

    #[test]
    fn test_json_blank_code() {
        let json = r#"[
            {"sigla": "MA1001", "curso": "CALCULO I", "creditos": 3, "semestre": 1},
            {"sigla": "   ", "curso": "SIN SIGLA", "creditos": 3, "semestre": 1}
        ]"#;

        let err = Catalog::from_json_str(json).unwrap_err();
        assert!(matches!(err, CatalogError::MissingField { index: 1, field: "sigla" }));
    }

    #[test]
    fn test_json_with_requisites() {
        let json = r#"[
            {"sigla": "QU0100", "curso": "QUIMICA GENERAL I", "creditos": 3, "semestre": 1, "correquisitos": ["QU0101"]},
            {"sigla": "QU0101", "curso": "LAB QUIMICA GENERAL I", "creditos": 1, "semestre": 1, "correquisitos": ["QU0100"]},
            {"sigla": "CI0202", "curso": "PRINCIPIOS DE INFORMATICA", "creditos": 4, "semestre": 3, "requisitos": ["MA0205"]}
        ]"#;

        let catalog = Catalog::from_json_str(json).unwrap();
        assert_eq!(catalog.get("QU0100").unwrap().corequisites, vec!["QU0101"]);
        // MA0205 lives outside this catalog; allowed
        assert!(!catalog.contains("MA0205"));
    }

    #[test]
    fn test_builtin_catalog_loads() {
        let catalog = Catalog::builtin().unwrap();

        assert!(catalog.contains("MA1001"));
        assert!(catalog.contains("SR-II"));
        assert_eq!(catalog.get("MA1002").unwrap().prerequisites, vec!["MA1001"]);
        assert_eq!(catalog.semester_numbers().len(), 12);
    }
}
