//! Per-artifact structure validation
//!
//! Runs, in order: parse issues, undeclared markers, block content,
//! cardinality, nesting and completion propagation.

use crate::artifact::Artifact;
use crate::content::check_content;
use crate::issue::{IssueKind, ValidationIssue, ValidationReport};
use crate::template::{Repeat, UnknownSectionsPolicy};

/// Validate one artifact against its template
#[tracing::instrument(level = "debug", skip_all, fields(path = %artifact.path.display()))]
#[must_use]
pub fn validate_artifact(artifact: &Artifact) -> ValidationReport {
    let mut report = ValidationReport::new();
    for issue in &artifact.issues {
        report.error(issue.clone());
    }
    if !artifact.is_readable() {
        return report;
    }

    check_undeclared(artifact, &mut report);
    check_contents(artifact, &mut report);
    check_cardinality(artifact, &mut report);
    check_nesting(artifact, &mut report);
    check_completion(artifact, &mut report);

    tracing::debug!(
        errors = report.errors.len(),
        warnings = report.warnings.len(),
        "artifact validated"
    );
    report
}

fn check_undeclared(artifact: &Artifact, report: &mut ValidationReport) {
    let policy = artifact.template.unknown_sections;
    if policy == UnknownSectionsPolicy::Allow {
        return;
    }
    for block in artifact.blocks.iter().filter(|b| !b.is_declared()) {
        let issue = ValidationIssue::new(
            IssueKind::Structure,
            &artifact.path,
            block.start_line,
            format!("marker '{}' is not declared in the template", block.key()),
        )
        .with("marker_type", block.key().type_token.clone());
        match policy {
            UnknownSectionsPolicy::Error => report.error(issue),
            _ => report.warning(issue),
        }
    }
}

fn check_contents(artifact: &Artifact, report: &mut ValidationReport) {
    for (index, block) in artifact.blocks.iter().enumerate() {
        if !block.is_declared() {
            continue;
        }
        let lines = artifact.own_lines(index);
        if let Err(violation) = check_content(block.kind(), &lines) {
            report.error(
                ValidationIssue::new(
                    IssueKind::Structure,
                    &artifact.path,
                    violation.line.unwrap_or(block.start_line),
                    violation.message,
                )
                .with("marker_type", block.key().type_token.clone())
                .with("block", block.key().to_string()),
            );
        }
    }
}

fn instances_of(artifact: &Artifact, declaration: usize) -> impl Iterator<Item = usize> + '_ {
    artifact
        .blocks
        .iter()
        .enumerate()
        .filter(move |(_, b)| b.template_index == Some(declaration))
        .map(|(i, _)| i)
}

fn check_cardinality(artifact: &Artifact, report: &mut ValidationReport) {
    for (declaration, tb) in artifact.template.blocks.iter().enumerate() {
        // (context block, instances) where context None is the document root
        let groups: Vec<(Option<usize>, Vec<usize>)> = match tb.parent {
            None => vec![(None, instances_of(artifact, declaration).collect())],
            Some(parent_declaration) => instances_of(artifact, parent_declaration)
                .map(|p| {
                    let under = instances_of(artifact, declaration)
                        .filter(|&i| artifact.declared_parent(i) == Some(p))
                        .collect();
                    (Some(p), under)
                })
                .collect(),
        };

        for (context, instances) in groups {
            if tb.required && instances.is_empty() {
                let (line, message) = match context {
                    None => (1, format!("Required block '{}' is missing", tb.key)),
                    Some(p) => {
                        let parent = &artifact.blocks[p];
                        (
                            parent.start_line,
                            format!("Required block '{}' is missing inside '{}'", tb.key, parent.key()),
                        )
                    }
                };
                report.error(
                    ValidationIssue::new(IssueKind::Structure, &artifact.path, line, message)
                        .with("marker_type", tb.key.type_token.clone())
                        .with("block", tb.key.to_string()),
                );
            }
            if tb.repeat == Repeat::One && instances.len() > 1 {
                for &extra in &instances[1..] {
                    report.error(
                        ValidationIssue::new(
                            IssueKind::Structure,
                            &artifact.path,
                            artifact.blocks[extra].start_line,
                            format!("Block '{}' appears more than once", tb.key),
                        )
                        .with("marker_type", tb.key.type_token.clone())
                        .with("block", tb.key.to_string()),
                    );
                }
            }
        }
    }
}

fn check_nesting(artifact: &Artifact, report: &mut ValidationReport) {
    let template = &artifact.template;
    for (index, block) in artifact.blocks.iter().enumerate() {
        let Some(declaration) = block.template_index else {
            continue;
        };
        let expected = template.parent_key(declaration);
        let actual = artifact
            .declared_parent(index)
            .map(|p| artifact.blocks[p].key());

        let message = match (expected, actual) {
            (None, None) => continue,
            (Some(e), Some(a)) if e == a => continue,
            (None, Some(a)) => format!(
                "Block '{}' must be at document root, found inside '{a}'",
                block.key()
            ),
            (Some(e), None) => format!("Block '{}' must be nested under '{e}'", block.key()),
            (Some(e), Some(a)) => format!(
                "Block '{}' is nested under '{a}', expected '{e}'",
                block.key()
            ),
        };

        let mut issue = ValidationIssue::new(IssueKind::Nesting, &artifact.path, block.start_line, message)
            .with("block", block.key().to_string());
        if let Some(e) = expected {
            issue = issue.with("expected_parent", e.to_string());
        }
        if let Some(a) = actual {
            issue = issue.with("actual_parent", a.to_string());
        }
        report.error(issue);
    }
}

fn check_completion(artifact: &Artifact, report: &mut ValidationReport) {
    for (di, def) in artifact.definitions.iter().enumerate() {
        let block = &artifact.blocks[def.block];
        if !block.kind().propagates_completion() {
            continue;
        }

        let task_states = artifact
            .tasks
            .iter()
            .filter(|t| block.contains_line(t.line))
            .map(|t| t.checked);
        let nested_states = artifact
            .definitions
            .iter()
            .enumerate()
            .filter(|&(dj, other)| {
                let other_block = &artifact.blocks[other.block];
                dj != di
                    && other.block != def.block
                    && block.encloses(other_block)
                    && other_block.kind().propagates_completion()
            })
            .map(|(_, other)| other.checked);
        let children: Vec<bool> = task_states.chain(nested_states).collect();
        if children.is_empty() {
            continue;
        }

        let all_done = children.iter().all(|&c| c);
        let message = match (all_done, def.checked) {
            (true, false) => "all tasks done but identifier not marked done",
            (false, true) => "identifier marked done but tasks not all done",
            _ => continue,
        };
        report.error(
            ValidationIssue::new(IssueKind::Structure, &artifact.path, def.line, message)
                .with("id", def.id.clone()),
        );
    }
}
