//! Validation issues
//!
//! The sole output contract of the engine: two ordered collections of
//! [`ValidationIssue`] values, errors and warnings.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};

/// Stable issue taxonomy tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueKind {
    /// Malformed template file
    Template,
    /// Unreadable artifact
    File,
    /// Block cardinality, content shape, identifier grammar, completion
    Structure,
    /// Parent/child placement of blocks
    Nesting,
    /// Identifier to source-code tagging
    Traceability,
}

impl IssueKind {
    /// Stable tag string
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Template => "template",
            Self::File => "file",
            Self::Structure => "structure",
            Self::Nesting => "nesting",
            Self::Traceability => "traceability",
        }
    }
}

impl Display for IssueKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single diagnostic
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// Taxonomy tag
    #[serde(rename = "type")]
    pub kind: IssueKind,
    /// Human-readable message
    pub message: String,
    /// 1-based line number
    pub line: usize,
    /// Originating file
    pub path: PathBuf,
    /// Extra diagnostic fields (`id`, `marker_type`, `covered_by`, ...)
    #[serde(flatten)]
    pub details: BTreeMap<String, String>,
}

impl ValidationIssue {
    /// Create an issue
    #[must_use]
    pub fn new(
        kind: IssueKind,
        path: impl AsRef<Path>,
        line: usize,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            line,
            path: path.as_ref().to_path_buf(),
            details: BTreeMap::new(),
        }
    }

    /// Attach a diagnostic field
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// Lookup a diagnostic field
    #[inline]
    #[must_use]
    pub fn detail(&self, key: &str) -> Option<&str> {
        self.details.get(key).map(String::as_str)
    }
}

impl Display for ValidationIssue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: [{}] {}",
            self.path.display(),
            self.line,
            self.kind,
            self.message
        )
    }
}

/// Errors and warnings of one validation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Contract violations
    pub errors: Vec<ValidationIssue>,
    /// Conditions that could not be verified
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Create empty report
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error
    #[inline]
    pub fn error(&mut self, issue: ValidationIssue) {
        self.errors.push(issue);
    }

    /// Record a warning
    #[inline]
    pub fn warning(&mut self, issue: ValidationIssue) {
        self.warnings.push(issue);
    }

    /// Append another report
    pub fn merge(&mut self, other: ValidationReport) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    /// No errors recorded
    #[inline]
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Errors whose message contains `needle`
    #[must_use]
    pub fn errors_matching(&self, needle: &str) -> Vec<&ValidationIssue> {
        self.errors
            .iter()
            .filter(|i| i.message.contains(needle))
            .collect()
    }

    /// Warnings whose message contains `needle`
    #[must_use]
    pub fn warnings_matching(&self, needle: &str) -> Vec<&ValidationIssue> {
        self.warnings
            .iter()
            .filter(|i| i.message.contains(needle))
            .collect()
    }
}

impl Extend<ValidationReport> for ValidationReport {
    fn extend<I: IntoIterator<Item = ValidationReport>>(&mut self, iter: I) {
        for report in iter {
            self.merge(report);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_display() {
        let issue = ValidationIssue::new(IssueKind::Structure, "docs/PRD.md", 12, "missing block");
        assert_eq!(issue.to_string(), "docs/PRD.md:12: [structure] missing block");
    }

    #[test]
    fn issue_details() {
        let issue = ValidationIssue::new(IssueKind::Nesting, "a.md", 1, "x")
            .with("id", "spd-app-req-a")
            .with("expected_parent", "id:req");
        assert_eq!(issue.detail("id"), Some("spd-app-req-a"));
        assert_eq!(issue.detail("missing"), None);
    }

    #[test]
    fn issue_serializes_type_tag_and_flattened_details() {
        let issue = ValidationIssue::new(IssueKind::Template, "t.md", 3, "bad").with("marker_type", "zz");
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["type"], "template");
        assert_eq!(json["marker_type"], "zz");
        assert_eq!(json["line"], 3);
    }

    #[test]
    fn report_merge_and_ok() {
        let mut a = ValidationReport::new();
        assert!(a.is_ok());
        let mut b = ValidationReport::new();
        b.error(ValidationIssue::new(IssueKind::File, "x", 1, "unreadable"));
        b.warning(ValidationIssue::new(IssueKind::Structure, "x", 1, "unknown marker"));
        a.merge(b);
        assert!(!a.is_ok());
        assert_eq!(a.errors_matching("unreadable").len(), 1);
        assert_eq!(a.warnings_matching("unknown").len(), 1);
    }
}
