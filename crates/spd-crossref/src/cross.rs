//! Cross-artifact validation
//!
//! Runs after every artifact is parsed. Builds a global definition index
//! plus per-system scopes (artifact kinds present and references by kind),
//! then checks duplicates, `covered_by` coverage, dangling references,
//! completion consistency and, with a registry, identifier kinds.
//!
//! # Example
//!
//! ```
//! use spd_crossref::cross_validate;
//! use spd_template::{Artifact, Template};
//! use std::sync::Arc;
//!
//! let t = Arc::new(Template::from_source("t.md", "---\nkind: PRD\n---\n").unwrap());
//! let a = Artifact::from_source(t, "PRD.md", "<!-- spd:paragraph:p -->\nsee `spd-app-req-x`\n<!-- spd:paragraph:p -->\n");
//! let report = cross_validate(&[a], None, None);
//! assert_eq!(report.errors.len(), 1);
//! ```

use spd_ident::{system_of, IdentifierResolver};
use spd_template::{Artifact, IdDefinition, IssueKind, ValidationIssue, ValidationReport};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Identifiers, kinds and references grouped for lookup
struct CrossIndex<'a> {
    /// lowercase id -> definitions in artifact order
    definitions: BTreeMap<String, Vec<&'a IdDefinition>>,
    /// system -> artifact kinds present for it
    kinds_in_scope: HashMap<String, BTreeSet<String>>,
    /// (system, artifact kind) -> lowercase referenced ids
    references_in_scope: HashMap<(String, String), HashSet<String>>,
}

fn normalized_system(id: &str, registered: Option<&BTreeSet<String>>) -> Option<String> {
    system_of(id, registered).map(|s| s.to_ascii_lowercase())
}

fn is_registered(system: &str, registered: &BTreeSet<String>) -> bool {
    registered.iter().any(|s| s.eq_ignore_ascii_case(system))
}

impl<'a> CrossIndex<'a> {
    fn build(artifacts: &'a [Artifact], registered: Option<&BTreeSet<String>>) -> Self {
        let mut definitions: BTreeMap<String, Vec<&'a IdDefinition>> = BTreeMap::new();
        let mut kinds_in_scope: HashMap<String, BTreeSet<String>> = HashMap::new();
        let mut references_in_scope: HashMap<(String, String), HashSet<String>> = HashMap::new();

        for artifact in artifacts {
            for def in &artifact.definitions {
                definitions
                    .entry(def.id.to_ascii_lowercase())
                    .or_default()
                    .push(def);
            }

            let mut systems: BTreeSet<String> = artifact
                .definitions
                .iter()
                .filter_map(|d| normalized_system(&d.id, registered))
                .collect();
            if systems.is_empty() {
                systems = artifact
                    .references
                    .iter()
                    .filter_map(|r| normalized_system(&r.id, registered))
                    .collect();
            }

            let kind = artifact.kind().to_ascii_uppercase();
            for system in systems {
                kinds_in_scope
                    .entry(system.clone())
                    .or_default()
                    .insert(kind.clone());
                references_in_scope
                    .entry((system, kind.clone()))
                    .or_default()
                    .extend(artifact.references.iter().map(|r| r.id.to_ascii_lowercase()));
            }
        }

        Self {
            definitions,
            kinds_in_scope,
            references_in_scope,
        }
    }

    fn is_defined(&self, id: &str) -> bool {
        self.definitions.contains_key(&id.to_ascii_lowercase())
    }
}

/// Validate identifiers across all parsed artifacts
///
/// `registered_systems` enables external-reference tolerance and the
/// identifier-kind checks; `known_kinds` restricts the first kind token.
#[tracing::instrument(level = "debug", skip_all, fields(artifacts = artifacts.len()))]
#[must_use]
pub fn cross_validate(
    artifacts: &[Artifact],
    registered_systems: Option<&BTreeSet<String>>,
    known_kinds: Option<&BTreeSet<String>>,
) -> ValidationReport {
    let index = CrossIndex::build(artifacts, registered_systems);
    let mut report = ValidationReport::new();

    check_duplicates(&index, &mut report);
    check_coverage(artifacts, &index, registered_systems, &mut report);
    check_references(artifacts, &index, registered_systems, &mut report);
    if let Some(systems) = registered_systems {
        check_identifier_kinds(artifacts, &index, systems, known_kinds, &mut report);
    }

    tracing::info!(
        identifiers = index.definitions.len(),
        errors = report.errors.len(),
        warnings = report.warnings.len(),
        "cross-artifact validation finished"
    );
    report
}

fn check_duplicates(index: &CrossIndex<'_>, report: &mut ValidationReport) {
    for defs in index.definitions.values() {
        let Some((first, rest)) = defs.split_first() else {
            continue;
        };
        for dup in rest {
            report.error(
                ValidationIssue::new(
                    IssueKind::Structure,
                    &dup.path,
                    dup.line,
                    "duplicate identifier definition",
                )
                .with("id", dup.id.clone())
                .with("first_defined", format!("{}:{}", first.path.display(), first.line)),
            );
        }
    }
}

fn check_coverage(
    artifacts: &[Artifact],
    index: &CrossIndex<'_>,
    registered: Option<&BTreeSet<String>>,
    report: &mut ValidationReport,
) {
    // Duplicates are reported separately; coverage follows the first definition
    let mut seen: HashSet<String> = HashSet::new();
    for artifact in artifacts {
        for def in &artifact.definitions {
            if !seen.insert(def.id.to_ascii_lowercase()) {
                continue;
            }
            let Some(attrs) = artifact.blocks[def.block].kind().id_attrs() else {
                continue;
            };
            if attrs.covered_by.is_empty() {
                continue;
            }
            let Some(system) = normalized_system(&def.id, registered) else {
                continue;
            };
            let required = attrs.covered_by.join(",");
            let present = index.kinds_in_scope.get(&system);
            let targets: Vec<String> = attrs
                .covered_by
                .iter()
                .map(|k| k.to_ascii_uppercase())
                .filter(|k| present.is_some_and(|p| p.contains(k)))
                .collect();

            let issue = |message: String| {
                ValidationIssue::new(IssueKind::Structure, &def.path, def.line, message)
                    .with("id", def.id.clone())
                    .with("covered_by", required.clone())
            };

            if targets.is_empty() {
                tracing::warn!(id = %def.id, covered_by = %required, "coverage unverifiable");
                report.warning(issue(format!(
                    "identifier not covered: no {required} artifact in scope of system '{system}'"
                )));
                continue;
            }

            let id = def.id.to_ascii_lowercase();
            let covered = targets.into_iter().any(|kind| {
                index
                    .references_in_scope
                    .get(&(system.clone(), kind))
                    .is_some_and(|ids| ids.contains(&id))
            });
            if !covered {
                report.error(issue(format!(
                    "identifier is not referenced by any {required} artifact"
                )));
            }
        }
    }
}

fn check_references(
    artifacts: &[Artifact],
    index: &CrossIndex<'_>,
    registered: Option<&BTreeSet<String>>,
    report: &mut ValidationReport,
) {
    for reference in artifacts.iter().flat_map(|a| &a.references) {
        match index.definitions.get(&reference.id.to_ascii_lowercase()) {
            None => {
                let external = match (registered, normalized_system(&reference.id, registered)) {
                    (Some(systems), Some(system)) => !is_registered(&system, systems),
                    _ => false,
                };
                if external {
                    tracing::debug!(id = %reference.id, "external reference tolerated");
                    continue;
                }
                report.error(
                    ValidationIssue::new(
                        IssueKind::Structure,
                        &reference.path,
                        reference.line,
                        "reference has no definition",
                    )
                    .with("id", reference.id.clone()),
                );
            }
            Some(defs) => {
                if reference.checked && !defs.iter().any(|d| d.checked) {
                    report.error(
                        ValidationIssue::new(
                            IssueKind::Structure,
                            &reference.path,
                            reference.line,
                            "reference marked done but definition not done",
                        )
                        .with("id", reference.id.clone()),
                    );
                }
            }
        }
    }
}

fn check_identifier_kinds(
    artifacts: &[Artifact],
    index: &CrossIndex<'_>,
    systems: &BTreeSet<String>,
    known_kinds: Option<&BTreeSet<String>>,
    report: &mut ValidationReport,
) {
    let resolver = IdentifierResolver::new(systems.iter().cloned(), known_kinds.cloned());
    let where_defined = |parent: &str| index.is_defined(parent);

    for artifact in artifacts {
        let definitions = artifact.definitions.iter().map(|d| (&d.id, d.block, &d.path, d.line));
        let references = artifact
            .references
            .iter()
            .filter(|r| r.formal)
            .map(|r| (&r.id, r.block, &r.path, r.line));

        for (id, block, path, line) in definitions.chain(references) {
            let registered = resolver
                .system_of(id)
                .is_some_and(|s| resolver.is_registered(&s));
            if !registered {
                continue;
            }
            let expected = &artifact.blocks[block].key().name;
            if resolver.resolve(id, expected, Some(&where_defined)).is_none() {
                report.error(
                    ValidationIssue::new(
                        IssueKind::Structure,
                        path,
                        line,
                        format!("identifier does not match block kind '{expected}'"),
                    )
                    .with("id", id.clone())
                    .with("expected_kind", expected.clone()),
                );
            }
        }
    }
}
