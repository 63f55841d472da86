//! Block kinds
//!
//! Closed set of block types a template may declare. Each variant carries
//! only the attributes its content validator needs.

use indexmap::IndexMap;
use serde::Serialize;

/// Attributes of an identifier block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IdBlockAttrs {
    /// Every definition must carry a priority token
    pub priority: bool,
    /// Completion is propagated from contained tasks
    pub task: bool,
    /// Identifier is expected to be tagged in source code
    pub to_code: bool,
    /// Artifact kinds that must reference each definition
    pub covered_by: Vec<String>,
}

/// Block type with validator-relevant attributes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum BlockKind {
    /// No content constraint
    Free,
    /// Identifier definitions
    Id(IdBlockAttrs),
    /// Identifier references
    IdRef {
        /// Every reference must carry a priority token
        priority: bool,
    },
    /// Bullet list
    List,
    /// Numbered list
    NumberedList,
    /// Checkbox list
    TaskList {
        /// Every task must carry a priority token
        priority: bool,
    },
    /// Markdown table
    Table,
    /// Non-empty prose
    Paragraph,
    /// Fenced code
    Code,
    /// Heading of the given level (1-6)
    Heading {
        /// Number of `#` characters
        level: u8,
    },
    /// Markdown link
    Link,
    /// Markdown image
    Image,
    /// Structured flow-language steps
    Fdl,
}

/// Comma-separated attribute value as trimmed, non-empty items
#[must_use]
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn has_flag(attrs: &IndexMap<String, String>, flag: &str) -> bool {
    attrs
        .get("has")
        .map(|v| split_list(v).iter().any(|f| f.eq_ignore_ascii_case(flag)))
        .unwrap_or(false)
}

fn bool_attr(attrs: &IndexMap<String, String>, key: &str) -> bool {
    attrs
        .get(key)
        .map(|v| v.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

impl BlockKind {
    /// Build kind from a marker type token and its attributes
    ///
    /// Returns `None` for a type outside the supported set.
    #[must_use]
    pub fn from_marker(type_token: &str, attrs: &IndexMap<String, String>) -> Option<Self> {
        let kind = match type_token {
            "free" => Self::Free,
            "id" => Self::Id(IdBlockAttrs {
                priority: has_flag(attrs, "priority"),
                task: has_flag(attrs, "task"),
                to_code: bool_attr(attrs, "to_code"),
                covered_by: attrs
                    .get("covered_by")
                    .map(|v| split_list(v))
                    .unwrap_or_default(),
            }),
            "id-ref" => Self::IdRef {
                priority: has_flag(attrs, "priority"),
            },
            "list" => Self::List,
            "numbered-list" => Self::NumberedList,
            "task-list" => Self::TaskList {
                priority: has_flag(attrs, "priority"),
            },
            "table" => Self::Table,
            "paragraph" => Self::Paragraph,
            "code" => Self::Code,
            "link" => Self::Link,
            "image" => Self::Image,
            "fdl" => Self::Fdl,
            hashes if (1..=6).contains(&hashes.len()) && hashes.bytes().all(|b| b == b'#') => {
                // length bounded to 1..=6 above
                Self::Heading {
                    level: u8::try_from(hashes.len()).unwrap_or(6),
                }
            }
            _ => return None,
        };
        Some(kind)
    }

    /// Identifier block attributes, if this is an identifier block
    #[inline]
    #[must_use]
    pub fn id_attrs(&self) -> Option<&IdBlockAttrs> {
        match self {
            Self::Id(attrs) => Some(attrs),
            _ => None,
        }
    }

    /// Identifier definitions block
    #[inline]
    #[must_use]
    pub fn is_id(&self) -> bool {
        matches!(self, Self::Id(_))
    }

    /// Identifier references block
    #[inline]
    #[must_use]
    pub fn is_id_ref(&self) -> bool {
        matches!(self, Self::IdRef { .. })
    }

    /// Produces task status entries
    #[inline]
    #[must_use]
    pub fn tracks_tasks(&self) -> bool {
        matches!(self, Self::TaskList { .. } | Self::Fdl)
    }

    /// Identifier block that propagates completion from tasks
    #[inline]
    #[must_use]
    pub fn propagates_completion(&self) -> bool {
        self.id_attrs().is_some_and(|a| a.task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn id_block_attributes() {
        let kind = BlockKind::from_marker(
            "id",
            &attrs(&[
                ("has", "priority, task"),
                ("covered_by", "DESIGN,DECOMPOSITION"),
                ("to_code", "true"),
            ]),
        )
        .unwrap();
        let id = kind.id_attrs().unwrap();
        assert!(id.priority);
        assert!(id.task);
        assert!(id.to_code);
        assert_eq!(id.covered_by, vec!["DESIGN", "DECOMPOSITION"]);
        assert!(kind.propagates_completion());
    }

    #[test]
    fn heading_levels() {
        let empty = IndexMap::new();
        assert_eq!(
            BlockKind::from_marker("###", &empty),
            Some(BlockKind::Heading { level: 3 })
        );
        assert_eq!(BlockKind::from_marker("#######", &empty), None);
        assert_eq!(BlockKind::from_marker("#a", &empty), None);
    }

    #[test]
    fn unknown_type_rejected() {
        assert_eq!(BlockKind::from_marker("bogus", &IndexMap::new()), None);
    }

    #[test]
    fn task_tracking_kinds() {
        let empty = IndexMap::new();
        assert!(BlockKind::from_marker("fdl", &empty).unwrap().tracks_tasks());
        assert!(BlockKind::from_marker("task-list", &empty).unwrap().tracks_tasks());
        assert!(!BlockKind::from_marker("list", &empty).unwrap().tracks_tasks());
    }
}
