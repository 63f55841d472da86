//! SPD Template Engine
//!
//! Templates declare the block structure an artifact kind must follow;
//! artifacts are markdown documents that instantiate a template. Blocks are
//! delimited by paired HTML-comment markers.
//!
//! # Core Operations
//!
//! - **Load**: parse a template header and its block declarations
//! - **Parse**: pair artifact markers into blocks and extract identifiers
//! - **Validate**: content shape, cardinality, nesting and completion
//!
//! # Architecture
//!
//! ```text
//! template.md → Template ──(Arc, TemplateCache)──┐
//!                                                ↓
//! artifact.md → marker pairing → ArtifactBlock[] → extraction → validate()
//! ```
//!
//! # Example
//!
//! ```rust
//! use spd_template::{Artifact, Template};
//! use std::sync::Arc;
//!
//! let template = Template::from_source(
//!     "artifacts/PRD/template.md",
//!     "<!-- spd:paragraph:overview -->\ntext\n<!-- spd:paragraph:overview -->\n",
//! )
//! .unwrap();
//! assert_eq!(template.kind, "PRD");
//!
//! let artifact = Artifact::from_source(Arc::new(template), "PRD.md", "no markers\n");
//! let report = artifact.validate();
//! assert_eq!(report.errors.len(), 1);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

// Core modules
pub mod artifact;
pub mod block;
pub mod cache;
pub mod content;
pub mod error;
pub mod extract;
pub mod header;
pub mod issue;
pub mod marker;
pub mod pairing;
pub mod structure;
pub mod template;

// Re-exports for convenience
pub use artifact::{Artifact, ArtifactBlock};
pub use block::{BlockKind, IdBlockAttrs};
pub use cache::{CacheStats, TemplateCache};
pub use error::{HeaderError, TemplateLoadError};
pub use extract::{IdDefinition, IdReference, TaskStatus};
pub use issue::{IssueKind, ValidationIssue, ValidationReport};
pub use marker::{scan_code_line, scan_line, BlockKey, Marker};
pub use structure::validate_artifact;
pub use template::{
    Repeat, Template, TemplateBlock, TemplateVersion, UnknownSectionsPolicy, MAX_SUPPORTED_VERSION,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for loading templates and validating artifacts
    pub use crate::artifact::{Artifact, ArtifactBlock};
    pub use crate::cache::TemplateCache;
    pub use crate::issue::{IssueKind, ValidationIssue, ValidationReport};
    pub use crate::template::Template;
    pub use spd_ident::{IdentifierResolver, ParsedIdentifier};
}
