//! Template model
//!
//! Loads a template document into an immutable list of [`TemplateBlock`]
//! declarations. Loading is fail-fast: any fatal condition yields a
//! [`TemplateLoadError`] carrying every issue found, never a partial
//! template.

use crate::block::BlockKind;
use crate::error::TemplateLoadError;
use crate::header::{parse_header, HeaderValue};
use crate::issue::{IssueKind, ValidationIssue};
use crate::marker::{BlockKey, Marker};
use crate::pairing::{pair_markers, parents};
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt::{self, Display, Formatter};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

/// Root key of the template header
pub const HEADER_ROOT: &str = "spd-template";

/// Highest template format version this engine understands
pub const MAX_SUPPORTED_VERSION: TemplateVersion = TemplateVersion { major: 1, minor: 0 };

/// Template format version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TemplateVersion {
    /// Major component
    pub major: u32,
    /// Minor component
    pub minor: u32,
}

impl Display for TemplateVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl TemplateVersion {
    fn from_header(value: &HeaderValue) -> Option<Self> {
        match value {
            HeaderValue::Int(major) => Some(Self {
                major: u32::try_from(*major).ok()?,
                minor: 0,
            }),
            HeaderValue::Str(s) => {
                let (major, minor) = s.split_once('.').unwrap_or((s.as_str(), "0"));
                Some(Self {
                    major: major.trim().parse().ok()?,
                    minor: minor.trim().parse().ok()?,
                })
            }
            HeaderValue::Map(map) => {
                let component = |key: &str| match map.get(key) {
                    Some(HeaderValue::Int(n)) => u32::try_from(*n).ok(),
                    None if key == "minor" => Some(0),
                    _ => None,
                };
                Some(Self {
                    major: component("major")?,
                    minor: component("minor")?,
                })
            }
            HeaderValue::Bool(_) => None,
        }
    }
}

/// What to do with artifact markers the template does not declare
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownSectionsPolicy {
    /// Report as error
    Error,
    /// Report as warning
    #[default]
    Warn,
    /// Ignore
    Allow,
}

impl UnknownSectionsPolicy {
    /// Parse policy; unrecognised values fall back to `warn`
    #[must_use]
    pub fn from_header(value: Option<&HeaderValue>) -> Self {
        match value.and_then(HeaderValue::as_str) {
            Some("error") => Self::Error,
            Some("allow") => Self::Allow,
            _ => Self::Warn,
        }
    }
}

/// Block cardinality
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Repeat {
    /// At most one instance per parent
    #[default]
    One,
    /// Any number of instances
    Many,
}

/// Declared block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateBlock {
    /// `(type, name)` key
    pub key: BlockKey,
    /// Validator-relevant kind
    pub kind: BlockKind,
    /// Must appear in the artifact
    pub required: bool,
    /// Cardinality
    pub repeat: Repeat,
    /// Raw attributes of the opening marker
    pub attrs: IndexMap<String, String>,
    /// Opening marker line
    pub start_line: usize,
    /// Closing marker line
    pub end_line: usize,
    /// Index of the enclosing declared block
    pub parent: Option<usize>,
}

impl TemplateBlock {
    /// Descriptor for an artifact block no declaration matches
    #[must_use]
    pub fn unmatched(marker: &Marker, end_line: usize) -> Self {
        Self {
            key: marker.key(),
            kind: BlockKind::from_marker(&marker.type_token, &marker.attrs)
                .unwrap_or(BlockKind::Free),
            required: false,
            repeat: Repeat::Many,
            attrs: marker.attrs.clone(),
            start_line: marker.line,
            end_line,
            parent: None,
        }
    }
}

/// Loaded template
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Template {
    /// Source file
    pub path: PathBuf,
    /// Artifact kind this template describes
    pub kind: String,
    /// Format version
    pub version: TemplateVersion,
    /// Policy for undeclared artifact markers
    pub unknown_sections: UnknownSectionsPolicy,
    /// Declarations ordered by opening line
    pub blocks: Vec<Arc<TemplateBlock>>,
}

impl Template {
    /// Load template from disk
    ///
    /// # Errors
    /// Returns [`TemplateLoadError`] when the file is unreadable or malformed.
    #[tracing::instrument(level = "debug", skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TemplateLoadError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| {
            TemplateLoadError::new(
                path,
                vec![ValidationIssue::new(
                    IssueKind::Template,
                    path,
                    1,
                    format!("cannot read template: {e}"),
                )],
            )
        })?;
        Self::from_source(path, &source)
    }

    /// Build template from already-read text
    ///
    /// # Errors
    /// Returns [`TemplateLoadError`] carrying every fatal issue.
    pub fn from_source(path: impl AsRef<Path>, source: &str) -> Result<Self, TemplateLoadError> {
        let path = path.as_ref();
        let lines: Vec<&str> = source.lines().collect();
        let fail = |line: usize, message: String| {
            TemplateLoadError::new(
                path,
                vec![ValidationIssue::new(IssueKind::Template, path, line, message)],
            )
        };

        let header = parse_header(&lines)
            .map_err(|e| fail(e.line(), format!("invalid template header: {e}")))?;
        let (mut values, body_start) = match header {
            Some(h) => (h.values, h.end_line + 1),
            None => (IndexMap::new(), 1),
        };
        let settings = match values.shift_remove(HEADER_ROOT) {
            Some(HeaderValue::Map(inner)) => inner,
            _ => values,
        };

        let kind = settings
            .get("kind")
            .and_then(HeaderValue::as_str)
            .map(str::to_string)
            .filter(|k| !k.is_empty())
            .or_else(|| kind_from_path(path))
            .ok_or_else(|| {
                fail(
                    1,
                    "template kind is neither declared in the header nor implied by an artifacts/<KIND>/ path"
                        .to_string(),
                )
            })?;

        let version = match settings.get("version") {
            Some(value) => TemplateVersion::from_header(value)
                .ok_or_else(|| fail(1, "invalid template version".to_string()))?,
            None => MAX_SUPPORTED_VERSION,
        };
        if version > MAX_SUPPORTED_VERSION {
            return Err(fail(
                1,
                format!(
                    "template version {version} is newer than the supported {MAX_SUPPORTED_VERSION}"
                ),
            ));
        }

        let policy = settings
            .get("policy")
            .and_then(|p| p.get("unknown_sections"))
            .or_else(|| settings.get("unknown_sections"));
        let unknown_sections = UnknownSectionsPolicy::from_header(policy);

        let body = lines.get(body_start - 1..).unwrap_or(&[]);
        let blocks = declare_blocks(path, body, body_start)
            .map_err(|issues| TemplateLoadError::new(path, issues))?;

        tracing::debug!(
            kind = %kind,
            version = %version,
            blocks = blocks.len(),
            "template loaded"
        );

        Ok(Self {
            path: path.to_path_buf(),
            kind,
            version,
            unknown_sections,
            blocks,
        })
    }

    /// Declarations sharing `key`, in template order
    pub fn blocks_for<'a>(&'a self, key: &'a BlockKey) -> impl Iterator<Item = (usize, &'a Arc<TemplateBlock>)> + 'a {
        self.blocks
            .iter()
            .enumerate()
            .filter(move |(_, b)| &b.key == key)
    }

    /// Lookup from key to declaration indices
    #[must_use]
    pub fn key_index(&self) -> IndexMap<BlockKey, Vec<usize>> {
        let mut index: IndexMap<BlockKey, Vec<usize>> = IndexMap::new();
        for (i, block) in self.blocks.iter().enumerate() {
            index.entry(block.key.clone()).or_default().push(i);
        }
        index
    }

    /// Key of a declaration's parent
    #[inline]
    #[must_use]
    pub fn parent_key(&self, index: usize) -> Option<&BlockKey> {
        let parent = self.blocks.get(index)?.parent?;
        self.blocks.get(parent).map(|b| &b.key)
    }
}

/// Kind from an `artifacts/<KIND>/...` path segment
#[must_use]
pub fn kind_from_path(path: &Path) -> Option<String> {
    let parts: Vec<&str> = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => s.to_str(),
            _ => None,
        })
        .collect();
    parts
        .windows(3)
        .find(|w| w[0] == "artifacts")
        .map(|w| w[1].to_string())
}

fn declare_blocks(
    path: &Path,
    body: &[&str],
    first_line: usize,
) -> Result<Vec<Arc<TemplateBlock>>, Vec<ValidationIssue>> {
    let pairing = pair_markers(body, first_line);
    let mut issues = Vec::new();

    for marker in &pairing.unclosed {
        issues.push(
            ValidationIssue::new(
                IssueKind::Template,
                path,
                marker.line,
                format!("unclosed marker '{}'", marker.key()),
            )
            .with("marker_type", marker.type_token.clone()),
        );
    }

    let mut blocks = Vec::with_capacity(pairing.pairs.len());
    for pair in &pairing.pairs {
        let open = &pair.open;
        let Some(kind) = BlockKind::from_marker(&open.type_token, &open.attrs) else {
            issues.push(
                ValidationIssue::new(
                    IssueKind::Template,
                    path,
                    open.line,
                    format!("unknown marker type '{}'", open.type_token),
                )
                .with("marker_type", open.type_token.clone()),
            );
            continue;
        };
        if kind.is_id() && open.name.contains('-') {
            issues.push(
                ValidationIssue::new(
                    IssueKind::Template,
                    path,
                    open.line,
                    format!("identifier kind '{}' must not contain '-'", open.name),
                )
                .with("marker_type", open.type_token.clone()),
            );
            continue;
        }
        let required = match open.attrs.get("required").map(String::as_str) {
            None | Some("true") => true,
            Some("false") => false,
            Some(other) => {
                issues.push(ValidationIssue::new(
                    IssueKind::Template,
                    path,
                    open.line,
                    format!("invalid required value '{other}'"),
                ));
                continue;
            }
        };
        let repeat = match open.attrs.get("repeat").map(String::as_str) {
            None | Some("one") => Repeat::One,
            Some("many") => Repeat::Many,
            Some(other) => {
                issues.push(ValidationIssue::new(
                    IssueKind::Template,
                    path,
                    open.line,
                    format!("invalid repeat value '{other}'"),
                ));
                continue;
            }
        };
        blocks.push(TemplateBlock {
            key: open.key(),
            kind,
            required,
            repeat,
            attrs: open.attrs.clone(),
            start_line: open.line,
            end_line: pair.close_line,
            parent: None,
        });
    }

    if !issues.is_empty() {
        issues.sort_by_key(|i| i.line);
        return Err(issues);
    }

    let spans: Vec<_> = blocks.iter().map(|b| (b.start_line, b.end_line)).collect();
    for (block, parent) in blocks.iter_mut().zip(parents(&spans)) {
        block.parent = parent;
    }
    Ok(blocks.into_iter().map(Arc::new).collect())
}
