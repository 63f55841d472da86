//! Identifier grammar
//!
//! Line-level patterns for identifier definitions, identifier references,
//! priority tokens and backticked identifier mentions in free text.

use once_cell::sync::Lazy;
use regex::Regex;

/// Fixed prefix every project identifier starts with
pub const ID_PREFIX: &str = "spd";

/// Marker text that makes a line a definition candidate
pub const DEFINITION_TAG: &str = "**ID**";

static DEFINITION_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(?P<bullet>[-*+]\s+)?(?:\[(?P<check>[ xX])\]\s+)?(?:`(?P<priority>[pP]\d+)`\s*(?:-\s*)?)?\*\*ID\*\*:\s*`(?P<id>(?i:spd-[a-z0-9]+(?:-[a-z0-9]+)+))`",
    )
    .unwrap_or_else(|_| unreachable!("definition pattern is a literal"))
});

static REFERENCE_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:\[(?P<check>[ x])\]\s*)?(?:`(?P<priority>p\d+)`\s*(?:-\s*)?)?`(?P<id>spd-[a-z0-9]+(?:-[a-z0-9]+)+)`$",
    )
    .unwrap_or_else(|_| unreachable!("reference pattern is a literal"))
});

static BACKTICKED_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)`(?P<id>spd-[a-z0-9]+(?:-[a-z0-9]+)+)`")
        .unwrap_or_else(|_| unreachable!("identifier pattern is a literal"))
});

static LIST_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:[-*+]|\d+[.)])\s+")
        .unwrap_or_else(|_| unreachable!("list marker pattern is a literal"))
});

static PRIORITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^p\d+$").unwrap_or_else(|_| unreachable!("priority pattern is a literal"))
});

/// A line that defines an identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionLine {
    /// Line starts with a list bullet
    pub list_item: bool,
    /// Checkbox state, `None` when the line carries no checkbox
    pub checkbox: Option<bool>,
    /// Priority token without backticks (e.g. `p1`)
    pub priority: Option<String>,
    /// Defined identifier
    pub id: String,
}

impl DefinitionLine {
    /// Completion flag (absent checkbox counts as not done)
    #[inline]
    #[must_use]
    pub fn checked(&self) -> bool {
        self.checkbox.unwrap_or(false)
    }
}

/// One comma-separated token of an identifier-reference line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceToken {
    /// Checkbox state, `None` when the token carries no checkbox
    pub checkbox: Option<bool>,
    /// Priority token without backticks
    pub priority: Option<String>,
    /// Referenced identifier
    pub id: String,
}

impl ReferenceToken {
    /// Completion flag (absent checkbox counts as not done)
    #[inline]
    #[must_use]
    pub fn checked(&self) -> bool {
        self.checkbox.unwrap_or(false)
    }
}

fn checkbox_state(raw: Option<regex::Match<'_>>) -> Option<bool> {
    raw.map(|m| m.as_str().eq_ignore_ascii_case("x"))
}

/// Whether a line is meant to define an identifier
#[inline]
#[must_use]
pub fn looks_like_definition(line: &str) -> bool {
    line.contains(DEFINITION_TAG)
}

/// Parse an identifier definition line
#[must_use]
pub fn parse_definition_line(line: &str) -> Option<DefinitionLine> {
    let caps = DEFINITION_LINE.captures(line)?;
    Some(DefinitionLine {
        list_item: caps.name("bullet").is_some(),
        checkbox: checkbox_state(caps.name("check")),
        priority: caps.name("priority").map(|m| m.as_str().to_string()),
        id: caps.name("id")?.as_str().to_string(),
    })
}

/// Parse a single reference token (already stripped of list marker and commas)
#[must_use]
pub fn parse_reference_token(token: &str) -> Option<ReferenceToken> {
    let caps = REFERENCE_TOKEN.captures(token.trim())?;
    Some(ReferenceToken {
        checkbox: checkbox_state(caps.name("check")),
        priority: caps.name("priority").map(|m| m.as_str().to_string()),
        id: caps.name("id")?.as_str().to_string(),
    })
}

/// Split a leading list marker (`-`, `*`, `+`, `1.`, `1)`) off a line
///
/// Returns whether a marker was present and the remaining text.
#[must_use]
pub fn strip_list_marker(line: &str) -> (bool, &str) {
    match LIST_MARKER.find(line) {
        Some(m) => (true, &line[m.end()..]),
        None => (false, line.trim_start()),
    }
}

/// Every backticked identifier on a line, in order of appearance
#[must_use]
pub fn find_backticked_ids(line: &str) -> Vec<String> {
    BACKTICKED_ID
        .captures_iter(line)
        .filter_map(|c| c.name("id").map(|m| m.as_str().to_string()))
        .collect()
}

/// Whether `token` (without backticks) is a priority token such as `p1`
#[inline]
#[must_use]
pub fn is_priority_token(token: &str) -> bool {
    PRIORITY.is_match(token)
}

/// Whether a line carries a backticked priority token anywhere
#[must_use]
pub fn has_priority_token(line: &str) -> bool {
    line.split('`')
        .skip(1)
        .step_by(2)
        .any(is_priority_token)
}
