//! Error types for template loading
//!
//! Provides error handling for:
//! - Header parsing (restricted `key: value` dialect)
//! - Template loading (fail-fast, carries every accumulated issue)

use crate::issue::ValidationIssue;
use std::path::PathBuf;

/// Errors in the template header dialect
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HeaderError {
    /// Opening `---` without a closing one
    #[error("header starting at line {line} is not closed with '---'")]
    Unterminated { line: usize },

    /// Indentation not a multiple of two spaces, or tabs used
    #[error("line {line}: indentation must be a multiple of two spaces")]
    BadIndent { line: usize },

    /// Line nested deeper than its parent allows
    #[error("line {line}: unexpected indentation")]
    UnexpectedIndent { line: usize },

    /// Line without a `key:` part
    #[error("line {line}: expected 'key: value'")]
    Malformed { line: usize },

    /// Same key twice in one mapping
    #[error("line {line}: duplicate key '{key}'")]
    DuplicateKey { line: usize, key: String },
}

impl HeaderError {
    /// Line the error points at
    #[inline]
    #[must_use]
    pub fn line(&self) -> usize {
        match self {
            Self::Unterminated { line }
            | Self::BadIndent { line }
            | Self::UnexpectedIndent { line }
            | Self::Malformed { line }
            | Self::DuplicateKey { line, .. } => *line,
        }
    }
}

/// Template failed to load; no partial template exists
#[derive(Debug, Clone, thiserror::Error)]
#[error("template {} failed to load with {} issue(s)", .path.display(), .issues.len())]
pub struct TemplateLoadError {
    /// Template path
    pub path: PathBuf,
    /// Every issue found before giving up
    pub issues: Vec<ValidationIssue>,
}

impl TemplateLoadError {
    /// Create load error from accumulated issues
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, issues: Vec<ValidationIssue>) -> Self {
        Self {
            path: path.into(),
            issues,
        }
    }

    /// Consume into the issue list
    #[inline]
    #[must_use]
    pub fn into_issues(self) -> Vec<ValidationIssue> {
        self.issues
    }
}
