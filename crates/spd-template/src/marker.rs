//! Marker scanner
//!
//! Finds `<!-- spd:<type>:<name> attr="value" -->` markers in document
//! lines, and `spd:<type>:<id>` tags inside source-code comments.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt::{self, Display, Formatter};

/// Type used when a marker omits it
pub const FREE_TYPE: &str = "free";

static DOC_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"<!--\s*spd:(?P<body>[^\s:>]+(?::[^\s:>]+)?)(?P<attrs>(?:\s+[A-Za-z_][A-Za-z0-9_-]*="[^"]*")*)\s*-->"#,
    )
    .unwrap_or_else(|_| unreachable!("marker pattern is a literal"))
});

static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?P<key>[A-Za-z_][A-Za-z0-9_-]*)="(?P<value>[^"]*)""#)
        .unwrap_or_else(|_| unreachable!("attribute pattern is a literal"))
});

static CODE_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\bspd:(?P<type>impl|test|flow):(?P<id>spd-[a-z0-9]+(?:-[a-z0-9]+)+)(?::(?P<inst>inst-[a-z0-9]+(?:-[a-z0-9]+)*))?",
    )
    .unwrap_or_else(|_| unreachable!("code tag pattern is a literal"))
});

/// `(type, name)` pair identifying a block declaration
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct BlockKey {
    /// Block type token
    pub type_token: String,
    /// Block name
    pub name: String,
}

impl BlockKey {
    /// Create key
    #[inline]
    #[must_use]
    pub fn new(type_token: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            type_token: type_token.into(),
            name: name.into(),
        }
    }
}

impl Display for BlockKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.type_token, self.name)
    }
}

/// One marker occurrence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    /// Block type token (`free` when omitted)
    pub type_token: String,
    /// Block name
    pub name: String,
    /// Attributes in source order
    pub attrs: IndexMap<String, String>,
    /// 1-based line number
    pub line: usize,
}

impl Marker {
    /// `(type, name)` key
    #[inline]
    #[must_use]
    pub fn key(&self) -> BlockKey {
        BlockKey::new(self.type_token.clone(), self.name.clone())
    }

    /// Whether this marker shares its key with another
    #[inline]
    #[must_use]
    pub fn same_key(&self, other: &Marker) -> bool {
        self.type_token == other.type_token && self.name == other.name
    }
}

/// Scan one document line for markers
#[must_use]
pub fn scan_line(line: &str, line_number: usize) -> Vec<Marker> {
    DOC_MARKER
        .captures_iter(line)
        .filter_map(|caps| {
            let body = caps.name("body")?.as_str();
            let (type_token, name) = match body.split_once(':') {
                Some((t, n)) => (t, n),
                None => (FREE_TYPE, body),
            };
            let attrs = caps
                .name("attrs")
                .map(|m| parse_attrs(m.as_str()))
                .unwrap_or_default();
            Some(Marker {
                type_token: type_token.to_string(),
                name: name.to_string(),
                attrs,
                line: line_number,
            })
        })
        .collect()
}

fn parse_attrs(raw: &str) -> IndexMap<String, String> {
    ATTRIBUTE
        .captures_iter(raw)
        .filter_map(|c| Some((c.name("key")?.as_str().to_string(), c.name("value")?.as_str().to_string())))
        .collect()
}

/// Whether a line holds at least one marker
#[inline]
#[must_use]
pub fn is_marker_line(line: &str) -> bool {
    DOC_MARKER.is_match(line)
}

/// Scan one source-code line for traceability tags
///
/// Only text after one of `comment_prefixes` is considered. The identifier
/// becomes the marker name; an instruction suffix lands in the `inst`
/// attribute.
#[must_use]
pub fn scan_code_line<S: AsRef<str>>(
    line: &str,
    line_number: usize,
    comment_prefixes: &[S],
) -> Vec<Marker> {
    let Some(start) = comment_prefixes
        .iter()
        .filter_map(|p| line.find(p.as_ref()).map(|at| at + p.as_ref().len()))
        .min()
    else {
        return Vec::new();
    };

    CODE_TAG
        .captures_iter(&line[start..])
        .filter_map(|caps| {
            let mut attrs = IndexMap::new();
            if let Some(inst) = caps.name("inst") {
                attrs.insert("inst".to_string(), inst.as_str().to_string());
            }
            Some(Marker {
                type_token: caps.name("type")?.as_str().to_ascii_lowercase(),
                name: caps.name("id")?.as_str().to_string(),
                attrs,
                line: line_number,
            })
        })
        .collect()
}
