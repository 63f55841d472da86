//! Error types for source scanning

use std::path::PathBuf;
use thiserror::Error;

/// Failure while walking or reading source files
#[derive(Debug, Error)]
pub enum ScanError {
    /// Directory could not be listed
    #[error("cannot list {}: {source}", .path.display())]
    ReadDir {
        /// Directory path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// File could not be read
    #[error("cannot read {}: {source}", .path.display())]
    ReadFile {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    /// Path the failure refers to
    #[inline]
    #[must_use]
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::ReadDir { path, .. } | Self::ReadFile { path, .. } => path,
        }
    }
}
