//! # SPD Command Line
//!
//! Project-level validation for SPD templates and artifacts.
//!
//! # Core Operations
//!
//! - **Registry**: load `spd.toml` ([`Registry`])
//! - **Project run**: templates, artifacts, cross checks and traceability
//!   in one pass ([`validate_project`])
//! - **Single run**: one artifact against one template ([`validate_single`])
//! - **Rendering**: text and JSON reports ([`render_text`], [`render_json`])
//!
//! # Architecture
//!
//! ```text
//! spd.toml ──► Registry ──► TemplateCache ──► Artifact::parse (rayon)
//!                                                   │
//!                                                   ▼
//!                        cross_validate ◄── readable artifacts
//!                        check_traceability ◄── scan_paths
//!                                                   │
//!                                                   ▼
//!                                           ValidationReport
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

// Core modules
pub mod cli;
pub mod config;
pub mod logging;
pub mod report;
pub mod run;

// Re-exports for convenience
pub use cli::{command, execute, EXIT_CONFIG, EXIT_INVALID, EXIT_OK};
pub use config::{ArtifactEntry, CodeConfig, ConfigError, Registry, SystemEntry, DEFAULT_REGISTRY};
pub use logging::init_tracing;
pub use report::{render_identifier, render_json, render_template, render_text};
pub use run::{validate_project, validate_single, RunSummary};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
