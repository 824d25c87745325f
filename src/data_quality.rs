// ✅ Data Quality - Dirty source data is recovered, never raised
//
// Every recovered default (zero year, empty grade, unknown outcome...) is
// recorded here so an advisor can see what the audit had to guess.

use serde::{Deserialize, Serialize};

// ============================================================================
// QUALITY ISSUE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Critical, // Record cannot be matched to any course
    Warning,  // Value replaced by a default that may change the verdict
    Info,     // Value replaced by a default with no effect on status
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityIssue {
    pub severity: Severity,

    /// Raw course code of the offending record
    pub code: String,

    pub field: String,
    pub issue: String,
    pub recommendation: String,
}

impl QualityIssue {
    pub fn new(
        severity: Severity,
        code: &str,
        field: &str,
        issue: impl Into<String>,
        recommendation: &str,
    ) -> Self {
        QualityIssue {
            severity,
            code: code.to_string(),
            field: field.to_string(),
            issue: issue.into(),
            recommendation: recommendation.to_string(),
        }
    }
}

// ============================================================================
// QUALITY REPORT
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QualityReport {
    pub records_total: usize,
    pub records_with_issues: usize,
    pub issues: Vec<QualityIssue>,
}

impl QualityReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one ingested record and whatever issues it produced
    pub fn record(&mut self, issues: Vec<QualityIssue>) {
        self.records_total += 1;
        if !issues.is_empty() {
            self.records_with_issues += 1;
            self.issues.extend(issues);
        }
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    pub fn has_critical_issues(&self) -> bool {
        self.count(Severity::Critical) > 0
    }

    /// Share of records ingested without any recovered default
    pub fn clean_ratio(&self) -> f64 {
        if self.records_total == 0 {
            return 1.0;
        }
        (self.records_total - self.records_with_issues) as f64 / self.records_total as f64
    }

    pub fn summary(&self) -> String {
        format!(
            "{} records, {:.1}% clean | {} issues ({} critical, {} warning, {} info)",
            self.records_total,
            self.clean_ratio() * 100.0,
            self.issues.len(),
            self.count(Severity::Critical),
            self.count(Severity::Warning),
            self.count(Severity::Info)
        )
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_report_is_clean() {
        let report = QualityReport::new();
        assert!(report.is_clean());
        assert_eq!(report.clean_ratio(), 1.0);
    }

    #[test]
    fn test_record_counts() {
        let mut report = QualityReport::new();
        report.record(vec![]);
        report.record(vec![
            QualityIssue::new(Severity::Warning, "MA1001", "year", "Year is not numeric: 'x'", "Fix year"),
            QualityIssue::new(Severity::Info, "MA1001", "group", "Group is not numeric: 'g'", "Fix group"),
        ]);

        assert_eq!(report.records_total, 2);
        assert_eq!(report.records_with_issues, 1);
        assert_eq!(report.count(Severity::Warning), 1);
        assert!(!report.has_critical_issues());
        assert_eq!(report.clean_ratio(), 0.5);
        assert!(report.summary().starts_with("2 records, 50.0% clean"));
    }
}
