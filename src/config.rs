// ⚙️ Audit Configuration - TOML file, defaults for everything
//
// Built once at startup and passed by reference; nothing here is global.

use crate::catalog::Catalog;
use crate::error::ConfigError;
use crate::reconciliation::EquivalencyTable;
use crate::resolver::ResolutionPolicy;
use crate::rules::{default_elective_prefixes, default_rules, CodeNormalizer, NormalizationRule};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    #[serde(default)]
    pub resolution_policy: ResolutionPolicy,

    /// Raw-code prefixes routed to the elective bucket
    #[serde(default = "default_elective_prefixes")]
    pub elective_prefixes: Vec<String>,

    /// Ordered prefix → canonical rewrites, first match wins
    #[serde(default = "default_rules")]
    pub normalization: Vec<NormalizationRule>,

    /// Catalog JSON; built-in catalog when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_path: Option<PathBuf>,

    /// Equivalency JSON; built-in table when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equivalency_path: Option<PathBuf>,

    #[serde(default = "default_history_dir")]
    pub history_dir: PathBuf,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_history_dir() -> PathBuf {
    PathBuf::from("history")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("reports")
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            resolution_policy: ResolutionPolicy::default(),
            elective_prefixes: default_elective_prefixes(),
            normalization: default_rules(),
            catalog_path: None,
            equivalency_path: None,
            history_dir: default_history_dir(),
            output_dir: default_output_dir(),
        }
    }
}

impl AuditConfig {
    /// Load configuration from file, or defaults when the file does not exist
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: AuditConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(i) = self.normalization.iter().position(|r| r.prefix.is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "normalization rule #{} has an empty prefix",
                i
            )));
        }
        if self.elective_prefixes.iter().any(|p| p.is_empty()) {
            return Err(ConfigError::Invalid(
                "elective prefixes must not be empty strings".to_string(),
            ));
        }
        Ok(())
    }

    pub fn normalizer(&self) -> Result<CodeNormalizer, ConfigError> {
        CodeNormalizer::from_rules(self.normalization.clone(), self.elective_prefixes.clone())
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn load_catalog(&self) -> Result<Catalog> {
        match &self.catalog_path {
            Some(path) => Catalog::from_file(path)
                .with_context(|| format!("Failed to load catalog: {:?}", path)),
            None => Catalog::builtin().context("Built-in catalog is invalid"),
        }
    }

    pub fn load_equivalencies(&self) -> Result<EquivalencyTable> {
        match &self.equivalency_path {
            Some(path) => EquivalencyTable::from_file(path)
                .with_context(|| format!("Failed to load equivalency table: {:?}", path)),
            None => EquivalencyTable::builtin().context("Built-in equivalency table is invalid"),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AuditConfig::default();

        assert_eq!(config.resolution_policy, ResolutionPolicy::ApprovalPermanent);
        assert_eq!(config.elective_prefixes, vec!["II"]);
        assert_eq!(config.normalizer().unwrap().normalize("SR0005"), "SR-I");
        assert!(config.catalog_path.is_none());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AuditConfig::from_toml_str(
            r#"
            resolution_policy = "most_recent"
            output_dir = "out"
            "#,
        )
        .unwrap();

        assert_eq!(config.resolution_policy, ResolutionPolicy::MostRecent);
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.history_dir, PathBuf::from("history"));
        assert_eq!(config.normalization, default_rules());
    }

    #[test]
    fn test_custom_normalization_table() {
        let config = AuditConfig::from_toml_str(
            r#"
            elective_prefixes = ["II", "IO"]

            [[normalization]]
            prefix = "XS01"
            canonical = "XS-I"
            "#,
        )
        .unwrap();

        let normalizer = config.normalizer().unwrap();
        assert_eq!(normalizer.rule_count(), 1);
        assert_eq!(normalizer.normalize("XS0107"), "XS-I");
        assert_eq!(normalizer.normalize("SR0005"), "SR0005");
        assert!(normalizer.is_elective("IO0101"));
    }

    #[test]
    fn test_empty_prefix_rejected() {
        let err = AuditConfig::from_toml_str(
            r#"
            [[normalization]]
            prefix = ""
            canonical = "X"
            "#,
        )
        .unwrap_err();

        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AuditConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("reports"));
    }

    #[test]
    fn test_builtin_tables_load() {
        let config = AuditConfig::default();
        assert!(!config.load_catalog().unwrap().is_empty());
        assert!(!config.load_equivalencies().unwrap().is_empty());
    }
}
