//! Drift report schema (stable v1)
//!
//! This schema is STABLE and VERSIONED.
//! Breaking changes require a new version.

use serde::{Deserialize, Serialize};

use crate::change::{ClassifiedChange, Severity};

/// Report schema version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportVersion {
    /// Major version (breaking changes)
    pub major: u32,

    /// Minor version (backward-compatible additions)
    pub minor: u32,
}

impl ReportVersion {
    /// Current report schema version
    pub const CURRENT: ReportVersion = ReportVersion { major: 1, minor: 0 };
}

impl std::fmt::Display for ReportVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Counts by severity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Total number of changes
    pub total: usize,

    /// Number of breaking changes
    pub breaking: usize,

    /// Number of warnings
    pub warning: usize,

    /// Number of safe changes
    pub safe: usize,
}

impl ReportSummary {
    fn from_changes(changes: &[ClassifiedChange]) -> Self {
        let count = |severity: Severity| changes.iter().filter(|c| c.severity == severity).count();

        Self {
            total: changes.len(),
            breaking: count(Severity::Breaking),
            warning: count(Severity::Warning),
            safe: count(Severity::Safe),
        }
    }
}

/// Identity of one side of the comparison
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRef {
    /// Snapshot version
    pub version: u32,

    /// Capture timestamp (ISO 8601)
    pub captured_at: String,

    /// Structural fingerprint
    pub fingerprint: String,
}

/// Drift report (drift-report.json v1)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftReport {
    /// Report format version
    pub version: ReportVersion,

    /// Schema name the report is about
    pub schema_name: String,

    /// When the report was generated (ISO 8601)
    pub generated_at: String,

    /// Baseline snapshot
    pub baseline: SnapshotRef,

    /// Freshly observed snapshot
    pub current: SnapshotRef,

    /// Counts by severity
    pub summary: ReportSummary,

    /// Highest severity among changes, absent when nothing changed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_severity: Option<Severity>,

    /// Classified changes in diff order
    pub changes: Vec<ClassifiedChange>,
}

impl DriftReport {
    /// Build a report from classified changes, kept in the given order
    pub fn from_changes(
        schema_name: impl Into<String>,
        baseline: SnapshotRef,
        current: SnapshotRef,
        changes: Vec<ClassifiedChange>,
    ) -> Self {
        Self {
            version: ReportVersion::CURRENT,
            schema_name: schema_name.into(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            baseline,
            current,
            summary: ReportSummary::from_changes(&changes),
            overall_severity: changes.iter().map(|c| c.severity).max(),
            changes,
        }
    }

    /// Whether any drift was detected
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    /// Whether any change is breaking
    pub fn has_breaking(&self) -> bool {
        self.summary.breaking > 0
    }

    /// Changes at or above a severity
    pub fn changes_at_least(&self, severity: Severity) -> impl Iterator<Item = &ClassifiedChange> {
        self.changes.iter().filter(move |c| c.severity >= severity)
    }

    /// One-line summary, e.g. "3 changes: 1 breaking, 1 warning, 1 safe"
    pub fn summary_line(&self) -> String {
        if self.summary.total == 0 {
            return "No changes".to_string();
        }

        let noun = if self.summary.total == 1 { "change" } else { "changes" };
        format!(
            "{} {}: {} breaking, {} warning, {} safe",
            self.summary.total, noun, self.summary.breaking, self.summary.warning, self.summary.safe
        )
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Save to file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let json = self.to_json()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(path, json)
    }
}
