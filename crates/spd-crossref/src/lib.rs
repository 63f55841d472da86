//! SPD Cross-Artifact Validation
//!
//! Checks that only make sense across the whole artifact set: identifier
//! coverage between artifact kinds, dangling and external references,
//! completion consistency, registry-driven identifier kinds, and
//! traceability from definitions into source code.
//!
//! # Architecture
//!
//! ```text
//! Artifact[] (parsed in parallel) ──fan-in──→ CrossIndex → cross_validate()
//! source roots → walk → scan_paths() → CodeTag[] → check_traceability()
//! ```
//!
//! # Example
//!
//! ```rust
//! use spd_crossref::{check_traceability, scan_source};
//! use std::path::Path;
//!
//! let tags = scan_source(Path::new("lib.rs"), "// spd:impl:spd-app-req-x", &["//".to_string()]);
//! let report = check_traceability(&[], &tags);
//! assert_eq!(report.errors.len(), 1);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

// Core modules
pub mod cross;
pub mod error;
pub mod traceability;
pub mod walk;

// Re-exports for convenience
pub use cross::cross_validate;
pub use error::ScanError;
pub use traceability::{
    check_traceability, scan_paths, scan_source, CodeTag, CodeTagKind, CommentSyntax,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for cross-artifact checks
    pub use crate::cross::cross_validate;
    pub use crate::traceability::{check_traceability, scan_paths, CodeTag, CommentSyntax};
}
