// 🏷️ Normalization Rules - Rules as Data
// Ordered prefix rewrites that collapse course-code variants onto the
// canonical code used in the catalog (grouped seminars, sport activities,
// humanities blocks...). First matching prefix wins.

use crate::error::RuleTableError;
use serde::{Deserialize, Serialize};

// ============================================================================
// RULE DEFINITION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizationRule {
    /// Raw code prefix to match (case-sensitive, like the source system)
    pub prefix: String,

    /// Canonical catalog code the prefix collapses to
    pub canonical: String,
}

impl NormalizationRule {
    pub fn new(prefix: impl Into<String>, canonical: impl Into<String>) -> Self {
        NormalizationRule {
            prefix: prefix.into(),
            canonical: canonical.into(),
        }
    }

    pub fn matches(&self, code: &str) -> bool {
        code.starts_with(&self.prefix)
    }
}

/// Rewrite table used by the source registry
pub fn default_rules() -> Vec<NormalizationRule> {
    let mut rules = vec![
        NormalizationRule::new("EF", "EF-D"),
        NormalizationRule::new("RP", "RP-1"),
        NormalizationRule::new("EG03", "EG-CA"),
        NormalizationRule::new("EG0124", "EG-I"),
        NormalizationRule::new("EG0126", "EG-I"),
        NormalizationRule::new("EG0125", "EG-II"),
        NormalizationRule::new("EG0127", "EG-II"),
    ];

    for n in [1, 2, 3, 4, 5, 6, 7, 8, 10] {
        rules.push(NormalizationRule::new(format!("SR{:04}", n), "SR-I"));
    }
    for n in [11, 22, 33, 44, 55, 66, 77, 88, 110] {
        rules.push(NormalizationRule::new(format!("SR{:04}", n), "SR-II"));
    }

    rules
}

/// Raw codes routed to the elective bucket when they match no catalog course
pub fn default_elective_prefixes() -> Vec<String> {
    vec!["II".to_string()]
}

// ============================================================================
// CODE NORMALIZER
// ============================================================================

#[derive(Debug, Clone)]
pub struct CodeNormalizer {
    rules: Vec<NormalizationRule>,
    elective_prefixes: Vec<String>,
}

impl CodeNormalizer {
    /// Normalizer with the default table and elective convention
    pub fn new() -> Self {
        CodeNormalizer {
            rules: default_rules(),
            elective_prefixes: default_elective_prefixes(),
        }
    }

    /// Create normalizer from an ordered list of rules
    pub fn from_rules(
        rules: Vec<NormalizationRule>,
        elective_prefixes: Vec<String>,
    ) -> Result<Self, RuleTableError> {
        if let Some(i) = rules.iter().position(|r| r.prefix.is_empty()) {
            return Err(RuleTableError::EmptyPrefix(i));
        }

        Ok(CodeNormalizer {
            rules,
            elective_prefixes,
        })
    }

    /// Apply the first matching rewrite; unmatched codes pass through
    pub fn normalize(&self, code: &str) -> String {
        self.rules
            .iter()
            .find(|rule| rule.matches(code))
            .map(|rule| rule.canonical.clone())
            .unwrap_or_else(|| code.to_string())
    }

    /// Does the raw code follow the elective naming convention?
    pub fn is_elective(&self, code: &str) -> bool {
        self.elective_prefixes.iter().any(|p| code.starts_with(p.as_str()))
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

impl Default for CodeNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
