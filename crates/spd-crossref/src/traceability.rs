//! Code traceability
//!
//! Source files carry `spd:<impl|test|flow>:<id>[:inst-<slug>]` tags inside
//! comments. Definitions whose block declares `to_code="true"` must be
//! tagged somewhere; tags must point at defined identifiers.

use crate::error::ScanError;
use crate::walk::collect_source_paths;
use rayon::prelude::*;
use serde::Serialize;
use spd_template::{scan_code_line, Artifact, IssueKind, ValidationIssue, ValidationReport};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Role of a code tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeTagKind {
    /// Implementation site
    Impl,
    /// Test covering the identifier
    Test,
    /// Flow step implementation
    Flow,
}

impl CodeTagKind {
    fn parse(token: &str) -> Option<Self> {
        match token {
            "impl" => Some(Self::Impl),
            "test" => Some(Self::Test),
            "flow" => Some(Self::Flow),
            _ => None,
        }
    }

    /// Tag token
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Impl => "impl",
            Self::Test => "test",
            Self::Flow => "flow",
        }
    }
}

/// Traceability tag found in source code
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeTag {
    /// Tag role
    pub kind: CodeTagKind,
    /// Tagged identifier
    pub id: String,
    /// Flow instruction slug, if any
    pub inst: Option<String>,
    /// Source file
    pub path: PathBuf,
    /// 1-based line
    pub line: usize,
}

/// Comment prefixes per file extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentSyntax {
    table: BTreeMap<String, Vec<String>>,
}

impl Default for CommentSyntax {
    fn default() -> Self {
        let mut syntax = Self::empty();
        for ext in ["rs", "ts", "tsx", "js", "jsx", "go", "c", "h", "cpp", "hpp", "java", "kt", "swift"] {
            syntax.insert(ext, ["//"]);
        }
        for ext in ["py", "sh", "toml", "yaml", "yml", "rb"] {
            syntax.insert(ext, ["#"]);
        }
        syntax
    }
}

impl CommentSyntax {
    /// Table with no entries
    #[must_use]
    pub fn empty() -> Self {
        Self {
            table: BTreeMap::new(),
        }
    }

    /// Set the comment prefixes for an extension (without the dot)
    pub fn insert<S: Into<String>>(&mut self, ext: &str, prefixes: impl IntoIterator<Item = S>) {
        self.table.insert(
            ext.trim_start_matches('.').to_ascii_lowercase(),
            prefixes.into_iter().map(Into::into).collect(),
        );
    }

    /// Builder form of [`insert`](Self::insert)
    #[must_use]
    pub fn with<S: Into<String>>(mut self, ext: &str, prefixes: impl IntoIterator<Item = S>) -> Self {
        self.insert(ext, prefixes);
        self
    }

    /// Comment prefixes for a file, by extension
    #[must_use]
    pub fn prefixes_for(&self, path: &Path) -> Option<&[String]> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        self.table.get(&ext).map(Vec::as_slice)
    }
}

/// Scan already-read source text for tags
#[must_use]
pub fn scan_source(path: &Path, text: &str, prefixes: &[String]) -> Vec<CodeTag> {
    text.lines()
        .enumerate()
        .flat_map(|(i, line)| scan_code_line(line, i + 1, prefixes))
        .filter_map(|marker| {
            Some(CodeTag {
                kind: CodeTagKind::parse(&marker.type_token)?,
                inst: marker.attrs.get("inst").cloned(),
                id: marker.name,
                path: path.to_path_buf(),
                line: marker.line,
            })
        })
        .collect()
}

/// Walk `roots` and scan every file the comment syntax table covers
///
/// # Errors
/// Returns [`ScanError`] on the first unreadable directory or file.
#[tracing::instrument(level = "debug", skip_all, fields(roots = roots.len()))]
pub fn scan_paths(roots: &[PathBuf], syntax: &CommentSyntax) -> Result<Vec<CodeTag>, ScanError> {
    let mut files = Vec::new();
    for root in roots {
        collect_source_paths(root, syntax, &mut files)?;
    }
    files.sort();
    files.dedup();

    let per_file = files
        .par_iter()
        .map(|file| {
            let text = std::fs::read_to_string(file).map_err(|e| ScanError::ReadFile {
                path: file.clone(),
                source: e,
            })?;
            let prefixes = syntax.prefixes_for(file).unwrap_or(&[]);
            Ok(scan_source(file, &text, prefixes))
        })
        .collect::<Result<Vec<_>, ScanError>>()?;

    let tags: Vec<CodeTag> = per_file.into_iter().flatten().collect();
    tracing::debug!(files = files.len(), tags = tags.len(), "source scanned");
    Ok(tags)
}

/// Check definitions against code tags
#[must_use]
pub fn check_traceability(artifacts: &[Artifact], tags: &[CodeTag]) -> ValidationReport {
    let mut report = ValidationReport::new();

    // lowercase id -> whether any definition expects a code tag
    let mut defined: HashMap<String, bool> = HashMap::new();
    for def in artifacts.iter().flat_map(|a| &a.definitions) {
        *defined.entry(def.id.to_ascii_lowercase()).or_default() |= def.to_code;
    }
    let tagged: HashSet<String> = tags.iter().map(|t| t.id.to_ascii_lowercase()).collect();

    for def in artifacts.iter().flat_map(|a| &a.definitions) {
        if def.to_code && !tagged.contains(&def.id.to_ascii_lowercase()) {
            report.error(
                ValidationIssue::new(
                    IssueKind::Traceability,
                    &def.path,
                    def.line,
                    "identifier expected in code has no code marker",
                )
                .with("id", def.id.clone()),
            );
        }
    }

    for tag in tags {
        let issue = |message: &str| {
            ValidationIssue::new(IssueKind::Traceability, &tag.path, tag.line, message)
                .with("id", tag.id.clone())
                .with("marker_type", tag.kind.as_str())
        };
        match defined.get(&tag.id.to_ascii_lowercase()) {
            None => report.error(issue("code marker references an undefined identifier")),
            Some(false) => {
                report.warning(issue("code marker references an identifier not expected in code"));
            }
            Some(true) => {}
        }
    }

    tracing::debug!(
        tags = tags.len(),
        errors = report.errors.len(),
        "traceability checked"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use spd_test_utils::{block, create_artifact, create_template};

    #[test]
    fn default_table() {
        let syntax = CommentSyntax::default();
        assert_eq!(syntax.prefixes_for(Path::new("a/b.rs")), Some(&["//".to_string()][..]));
        assert_eq!(syntax.prefixes_for(Path::new("x.PY")), Some(&["#".to_string()][..]));
        assert_eq!(syntax.prefixes_for(Path::new("README.md")), None);
        assert_eq!(syntax.prefixes_for(Path::new("Makefile")), None);
    }

    #[test]
    fn custom_table_entries() {
        let syntax = CommentSyntax::empty().with(".sql", ["--"]);
        let tags = scan_source(
            Path::new("q.sql"),
            "select 1; -- spd:impl:spd-app-req-query",
            syntax.prefixes_for(Path::new("q.sql")).unwrap(),
        );
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].kind, CodeTagKind::Impl);
    }

    #[test]
    fn scan_source_records_positions() {
        let text = "fn a() {}\n// spd:flow:spd-app-flow-login:inst-check\nfn b() {}\n";
        let tags = scan_source(Path::new("a.rs"), text, &["//".to_string()]);
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].line, 2);
        assert_eq!(tags[0].inst.as_deref(), Some("inst-check"));
        assert_eq!(tags[0].id, "spd-app-flow-login");
    }

    #[test]
    fn traceability_findings() {
        let template = create_template(
            "PRD",
            &format!(
                "{}{}",
                block("id", "req", "to_code=\"true\" repeat=\"many\"", "**ID**: `spd-app-req-x`"),
                block("id", "goal", "required=\"false\" repeat=\"many\"", "**ID**: `spd-app-goal-x`"),
            ),
        );
        let artifact = create_artifact(
            &template,
            "PRD.md",
            &format!(
                "{}{}{}",
                block("id", "req", "", "**ID**: `spd-app-req-login`"),
                block("id", "req", "", "**ID**: `spd-app-req-logout`"),
                block("id", "goal", "", "**ID**: `spd-app-goal-speed`"),
            ),
        );
        let tags = scan_source(
            Path::new("src/lib.rs"),
            "// spd:impl:spd-app-req-login\n// spd:test:spd-app-goal-speed\n// spd:impl:spd-app-req-ghost\n",
            &["//".to_string()],
        );

        let report = check_traceability(&[artifact], &tags);
        let errors: Vec<_> = report.errors.iter().map(|e| (e.message.as_str(), e.detail("id"))).collect();
        assert_eq!(
            errors,
            vec![
                ("identifier expected in code has no code marker", Some("spd-app-req-logout")),
                ("code marker references an undefined identifier", Some("spd-app-req-ghost")),
            ]
        );
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].detail("marker_type"), Some("test"));
        assert!(report.errors.iter().all(|e| e.kind == IssueKind::Traceability));
    }
}
