//! Validation runs
//!
//! A project run loads every template through one [`TemplateCache`],
//! parses and validates artifacts in parallel, then fans in for the
//! cross-artifact and traceability checks.

use crate::config::Registry;
use rayon::prelude::*;
use spd_crossref::{check_traceability, cross_validate, scan_paths};
use spd_template::{
    Artifact, IssueKind, Template, TemplateCache, ValidationIssue, ValidationReport,
};
use std::path::Path;
use std::sync::Arc;

/// Outcome of a project run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// All issues found
    pub report: ValidationReport,
    /// Artifacts parsed
    pub artifacts: usize,
    /// Identifier definitions seen
    pub definitions: usize,
    /// Source tags seen
    pub code_tags: usize,
}

/// Validate every artifact a registry lists
#[tracing::instrument(level = "info", skip_all, fields(artifacts = registry.artifacts.len()))]
pub fn validate_project(registry: &Registry, cache: &TemplateCache) -> RunSummary {
    let mut report = ValidationReport::new();

    // Templates first: a broken template blocks its artifacts only
    let mut jobs: Vec<(Arc<Template>, &Path)> = Vec::with_capacity(registry.artifacts.len());
    for entry in &registry.artifacts {
        match cache.load(&entry.template) {
            Ok(template) => jobs.push((template, entry.path.as_path())),
            Err(e) => {
                tracing::warn!(template = %entry.template.display(), "template failed to load");
                for issue in e.into_issues() {
                    if !report.errors.contains(&issue) {
                        report.error(issue);
                    }
                }
            }
        }
    }

    let parsed: Vec<(Artifact, ValidationReport)> = jobs
        .into_par_iter()
        .map(|(template, path)| {
            let artifact = Artifact::parse(template, path);
            let report = artifact.validate();
            (artifact, report)
        })
        .collect();

    let mut artifacts = Vec::with_capacity(parsed.len());
    for (artifact, artifact_report) in parsed {
        report.merge(artifact_report);
        artifacts.push(artifact);
    }

    let systems = registry.registered_systems();
    let kinds = registry.known_kinds();
    let readable: Vec<Artifact> = artifacts.into_iter().filter(Artifact::is_readable).collect();
    report.merge(cross_validate(
        &readable,
        (!systems.is_empty()).then_some(&systems),
        kinds.as_ref(),
    ));

    let mut code_tags = 0;
    if let Some(code) = &registry.code {
        match scan_paths(&code.paths, &registry.comment_syntax()) {
            Ok(tags) => {
                code_tags = tags.len();
                report.merge(check_traceability(&readable, &tags));
            }
            Err(e) => report.error(ValidationIssue::new(
                IssueKind::File,
                e.path(),
                1,
                e.to_string(),
            )),
        }
    }

    let summary = RunSummary {
        artifacts: readable.len(),
        definitions: readable.iter().map(|a| a.definitions.len()).sum(),
        code_tags,
        report,
    };
    tracing::info!(
        artifacts = summary.artifacts,
        definitions = summary.definitions,
        errors = summary.report.errors.len(),
        warnings = summary.report.warnings.len(),
        "validation finished"
    );
    summary
}

/// Validate one artifact against one template, without cross checks
///
/// # Errors
/// Returns the template's load issues when it cannot be loaded.
pub fn validate_single(
    template: &Path,
    artifact: &Path,
    cache: &TemplateCache,
) -> Result<ValidationReport, Vec<ValidationIssue>> {
    let template = cache.load(template).map_err(|e| e.into_issues())?;
    Ok(Artifact::parse(template, artifact).validate())
}
