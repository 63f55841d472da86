//! Artifact model
//!
//! An artifact is a markdown document instantiating a [`Template`]. Parsing
//! never fails: structural problems are kept as issues on the artifact and
//! surface through [`Artifact::validate`].
//!
//! # Example
//!
//! ```
//! use spd_template::{Artifact, Template};
//! use std::sync::Arc;
//!
//! let template = Template::from_source(
//!     "prd.md",
//!     "---\nkind: PRD\n---\n<!-- spd:id:req -->\n**ID**: `spd-app-req-x`\n<!-- spd:id:req -->\n",
//! )
//! .unwrap();
//! let artifact = Artifact::from_source(
//!     Arc::new(template),
//!     "PRD.md",
//!     "<!-- spd:id:req -->\n**ID**: `spd-app-req-login`\n<!-- spd:id:req -->\n",
//! );
//! assert_eq!(artifact.definitions[0].id, "spd-app-req-login");
//! assert!(artifact.validate().is_ok());
//! ```

use crate::block::BlockKind;
use crate::content::ContentLine;
use crate::extract::{extract, IdDefinition, IdReference, TaskStatus};
use crate::header::parse_header;
use crate::issue::{IssueKind, ValidationIssue, ValidationReport};
use crate::marker::{is_marker_line, BlockKey};
use crate::pairing::{pair_markers, parents};
use crate::template::{Template, TemplateBlock, HEADER_ROOT};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One block instance found in an artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactBlock {
    /// Matching declaration, or a synthetic one for undeclared markers
    pub template_block: Arc<TemplateBlock>,
    /// Index of the matching declaration in [`Template::blocks`]
    pub template_index: Option<usize>,
    /// Lines strictly between the opening and closing markers
    pub content: Vec<String>,
    /// Opening marker line
    pub start_line: usize,
    /// Closing marker line
    pub end_line: usize,
    /// Index of the innermost enclosing block
    pub parent: Option<usize>,
}

impl ArtifactBlock {
    /// `(type, name)` key
    #[inline]
    #[must_use]
    pub fn key(&self) -> &BlockKey {
        &self.template_block.key
    }

    /// Validator-relevant kind
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &BlockKind {
        &self.template_block.kind
    }

    /// Whether a template declaration matched this block
    #[inline]
    #[must_use]
    pub fn is_declared(&self) -> bool {
        self.template_index.is_some()
    }

    /// Whether `other` lies strictly inside this block
    #[inline]
    #[must_use]
    pub fn encloses(&self, other: &ArtifactBlock) -> bool {
        self.start_line <= other.start_line
            && other.end_line <= self.end_line
            && (self.start_line, self.end_line) != (other.start_line, other.end_line)
    }

    /// Whether `line` falls strictly between the markers
    #[inline]
    #[must_use]
    pub fn contains_line(&self, line: usize) -> bool {
        self.start_line < line && line < self.end_line
    }
}

/// Parsed artifact
#[derive(Debug, Clone)]
pub struct Artifact {
    /// Source file
    pub path: PathBuf,
    /// Template the artifact instantiates
    pub template: Arc<Template>,
    /// Block instances ordered by opening line
    pub blocks: Vec<ArtifactBlock>,
    /// Identifier definitions
    pub definitions: Vec<IdDefinition>,
    /// Formal and informal identifier references
    pub references: Vec<IdReference>,
    /// Checkbox states of task-tracking lines
    pub tasks: Vec<TaskStatus>,
    /// Problems found while parsing
    pub issues: Vec<ValidationIssue>,
    readable: bool,
}

impl Artifact {
    /// Read and parse an artifact from disk
    ///
    /// An unreadable file yields an artifact with no blocks and a single
    /// `file` issue.
    #[tracing::instrument(level = "debug", skip_all, fields(path = %path.as_ref().display()))]
    pub fn parse(template: Arc<Template>, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(source) => Self::from_source(template, path, &source),
            Err(e) => {
                tracing::warn!(error = %e, "artifact unreadable");
                Self {
                    path: path.to_path_buf(),
                    template,
                    blocks: Vec::new(),
                    definitions: Vec::new(),
                    references: Vec::new(),
                    tasks: Vec::new(),
                    issues: vec![ValidationIssue::new(
                        IssueKind::File,
                        path,
                        1,
                        format!("cannot read artifact: {e}"),
                    )],
                    readable: false,
                }
            }
        }
    }

    /// Parse already-read text
    #[must_use]
    pub fn from_source(template: Arc<Template>, path: impl AsRef<Path>, source: &str) -> Self {
        let path = path.as_ref();
        let lines: Vec<&str> = source.lines().collect();
        let mut issues = Vec::new();

        // Only a leading header block counts; examples in fences are content
        if let Ok(Some(header)) = parse_header(&lines) {
            if header.values.contains_key(HEADER_ROOT) {
                let line = lines[..header.end_line]
                    .iter()
                    .position(|l| l.trim().strip_suffix(':') == Some(HEADER_ROOT))
                    .map_or(1, |i| i + 1);
                issues.push(ValidationIssue::new(
                    IssueKind::Structure,
                    path,
                    line,
                    "template header found in artifact",
                ));
            }
        }

        let pairing = pair_markers(&lines, 1);
        for marker in &pairing.unclosed {
            issues.push(
                ValidationIssue::new(
                    IssueKind::Structure,
                    path,
                    marker.line,
                    format!("unclosed marker '{}'", marker.key()),
                )
                .with("marker_type", marker.type_token.clone()),
            );
        }

        let spans: Vec<_> = pairing
            .pairs
            .iter()
            .map(|p| (p.open.line, p.close_line))
            .collect();
        let block_parents = parents(&spans);
        let index = template.key_index();

        let mut blocks: Vec<ArtifactBlock> = Vec::with_capacity(pairing.pairs.len());
        for (pair, parent) in pairing.pairs.iter().zip(block_parents) {
            let key = pair.open.key();
            let declared_parent = parent.and_then(|p| declared_ancestor(&blocks, p));
            let template_index = index.get(&key).and_then(|candidates| {
                let wanted = declared_parent.and_then(|p| blocks[p].template_index);
                candidates
                    .iter()
                    .copied()
                    .find(|&c| template.blocks[c].parent == wanted)
                    .or_else(|| candidates.first().copied())
            });
            let template_block = match template_index {
                Some(i) => Arc::clone(&template.blocks[i]),
                None => Arc::new(TemplateBlock::unmatched(&pair.open, pair.close_line)),
            };
            let content = lines
                .get(pair.open.line..pair.close_line.saturating_sub(1))
                .unwrap_or(&[])
                .iter()
                .map(|l| (*l).to_string())
                .collect();
            blocks.push(ArtifactBlock {
                template_block,
                template_index,
                content,
                start_line: pair.open.line,
                end_line: pair.close_line,
                parent,
            });
        }

        let mut artifact = Self {
            path: path.to_path_buf(),
            template,
            blocks,
            definitions: Vec::new(),
            references: Vec::new(),
            tasks: Vec::new(),
            issues,
            readable: true,
        };
        let extraction = extract(&artifact);
        artifact.definitions = extraction.definitions;
        artifact.references = extraction.references;
        artifact.tasks = extraction.tasks;

        tracing::debug!(
            path = %artifact.path.display(),
            blocks = artifact.blocks.len(),
            definitions = artifact.definitions.len(),
            references = artifact.references.len(),
            "artifact parsed"
        );
        artifact
    }

    /// Artifact kind (the template's kind)
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.template.kind
    }

    /// Whether the source file could be read
    #[inline]
    #[must_use]
    pub fn is_readable(&self) -> bool {
        self.readable
    }

    /// Nearest ancestor of block `index` that matched a declaration
    #[must_use]
    pub fn declared_parent(&self, index: usize) -> Option<usize> {
        self.blocks
            .get(index)?
            .parent
            .and_then(|p| declared_ancestor(&self.blocks, p))
    }

    /// Lines belonging to block `index` itself
    ///
    /// Marker lines and lines inside nested blocks are excluded, so each
    /// line of the document is validated and extracted exactly once.
    #[must_use]
    pub fn own_lines(&self, index: usize) -> Vec<ContentLine<'_>> {
        let Some(block) = self.blocks.get(index) else {
            return Vec::new();
        };
        let nested: Vec<(usize, usize)> = self
            .blocks
            .iter()
            .enumerate()
            .filter(|&(j, other)| j != index && block.encloses(other))
            .map(|(_, other)| (other.start_line, other.end_line))
            .collect();

        block
            .content
            .iter()
            .enumerate()
            .map(|(offset, text)| ContentLine::new(block.start_line + 1 + offset, text.as_str()))
            .filter(|line| !nested.iter().any(|&(s, e)| s <= line.number && line.number <= e))
            .filter(|line| !is_marker_line(line.text))
            .collect()
    }

    /// Run every per-artifact check
    #[must_use]
    pub fn validate(&self) -> ValidationReport {
        crate::structure::validate_artifact(self)
    }
}

fn declared_ancestor(blocks: &[ArtifactBlock], mut index: usize) -> Option<usize> {
    loop {
        let block = blocks.get(index)?;
        if block.is_declared() {
            return Some(index);
        }
        index = block.parent?;
    }
}
