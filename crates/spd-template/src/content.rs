//! Block content validators
//!
//! One shape check per [`BlockKind`]. Each check stops at the first
//! violation so a malformed block yields exactly one issue.

use crate::block::BlockKind;
use once_cell::sync::Lazy;
use regex::Regex;
use spd_ident::{
    has_priority_token, looks_like_definition, parse_definition_line, parse_reference_token,
    strip_list_marker,
};

static BULLET_ITEM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*[-*+]\s+\S").unwrap_or_else(|_| unreachable!("bullet pattern is a literal"))
});

static NUMBERED_ITEM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*\d+[.)]\s+\S").unwrap_or_else(|_| unreachable!("numbered pattern is a literal"))
});

pub(crate) static TASK_ITEM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:[-*+]|\d+[.)])\s+\[(?P<check>[ xX])\]")
        .unwrap_or_else(|_| unreachable!("task pattern is a literal"))
});

static FLOW_STEP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*\d+\.\s+\[(?P<check>[ x])\]\s+-\s+`p\d+`\s+-\s+\S.*?\s+-\s+`inst-[a-z0-9]+(?:-[a-z0-9]+)*`\s*$",
    )
    .unwrap_or_else(|_| unreachable!("flow step pattern is a literal"))
});

/// A numbered line of block content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentLine<'a> {
    /// 1-based line number
    pub number: usize,
    /// Line text
    pub text: &'a str,
}

impl<'a> ContentLine<'a> {
    /// Create content line
    #[inline]
    #[must_use]
    pub fn new(number: usize, text: &'a str) -> Self {
        Self { number, text }
    }

    #[inline]
    fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// First violation found in a block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentViolation {
    /// Offending line, `None` when the block as a whole is at fault
    pub line: Option<usize>,
    /// Human-readable message
    pub message: String,
}

impl ContentViolation {
    fn at(line: usize, message: impl Into<String>) -> Self {
        Self {
            line: Some(line),
            message: message.into(),
        }
    }

    fn block(message: impl Into<String>) -> Self {
        Self {
            line: None,
            message: message.into(),
        }
    }
}

fn is_fence(text: &str) -> bool {
    let t = text.trim_start();
    t.starts_with("```") || t.starts_with("~~~")
}

/// Lines outside fenced code, fence lines themselves excluded
#[must_use]
pub fn outside_fences<'a>(lines: &[ContentLine<'a>]) -> Vec<ContentLine<'a>> {
    let mut in_fence = false;
    let mut out = Vec::with_capacity(lines.len());
    for line in lines {
        if is_fence(line.text) {
            in_fence = !in_fence;
            continue;
        }
        if !in_fence {
            out.push(*line);
        }
    }
    out
}

/// Checkbox state of a task line, if it is one
#[must_use]
pub fn task_checkbox(text: &str) -> Option<bool> {
    TASK_ITEM
        .captures(text)
        .and_then(|c| c.name("check"))
        .map(|m| m.as_str().eq_ignore_ascii_case("x"))
}

/// Checkbox state of a flow-language step, if it is one
#[must_use]
pub fn flow_step_checkbox(text: &str) -> Option<bool> {
    FLOW_STEP
        .captures(text)
        .and_then(|c| c.name("check"))
        .map(|m| m.as_str().eq_ignore_ascii_case("x"))
}

fn first_non_blank<'a>(lines: &[ContentLine<'a>]) -> Option<ContentLine<'a>> {
    lines.iter().copied().find(|l| !l.is_blank())
}

fn non_blank<'a>(lines: &'a [ContentLine<'a>]) -> impl Iterator<Item = &'a ContentLine<'a>> {
    lines.iter().filter(|l| !l.is_blank())
}

/// Validate a block's own content lines against its kind
///
/// # Errors
/// Returns the first [`ContentViolation`] found.
pub fn check_content(kind: &BlockKind, lines: &[ContentLine<'_>]) -> Result<(), ContentViolation> {
    match kind {
        BlockKind::Free => Ok(()),
        BlockKind::Id(attrs) => check_definitions(lines, attrs.priority),
        BlockKind::IdRef { priority } => check_references(lines, *priority),
        BlockKind::List => check_items(lines, &BULLET_ITEM, "List", "bullet list item"),
        BlockKind::NumberedList => {
            check_items(lines, &NUMBERED_ITEM, "Numbered list", "numbered list item")
        }
        BlockKind::TaskList { priority } => {
            check_items(lines, &TASK_ITEM, "Task list", "task list item")?;
            if *priority {
                if let Some(line) = non_blank(lines).find(|l| !has_priority_token(l.text)) {
                    return Err(ContentViolation::at(line.number, "Task is missing a priority"));
                }
            }
            Ok(())
        }
        BlockKind::Table => check_table(lines),
        BlockKind::Paragraph => match first_non_blank(lines) {
            Some(_) => Ok(()),
            None => Err(ContentViolation::block("Paragraph must not be empty")),
        },
        BlockKind::Code => check_code(lines),
        BlockKind::Heading { level } => {
            let line = first_non_blank(lines)
                .ok_or_else(|| ContentViolation::block(format!("Expected a level-{level} heading")))?;
            let text = line.text.trim_start();
            let hashes = text.bytes().take_while(|&b| b == b'#').count();
            if hashes == usize::from(*level) && text[hashes..].starts_with(' ') {
                Ok(())
            } else {
                Err(ContentViolation::at(
                    line.number,
                    format!("Expected a level-{level} heading"),
                ))
            }
        }
        BlockKind::Link => {
            let line = first_non_blank(lines)
                .ok_or_else(|| ContentViolation::block("Expected a markdown link"))?;
            if line.text.contains('[') && line.text.contains("](") {
                Ok(())
            } else {
                Err(ContentViolation::at(line.number, "Expected a markdown link"))
            }
        }
        BlockKind::Image => {
            let line = first_non_blank(lines)
                .ok_or_else(|| ContentViolation::block("Expected a markdown image"))?;
            if line.text.trim_start().starts_with('!') {
                Ok(())
            } else {
                Err(ContentViolation::at(line.number, "Expected a markdown image"))
            }
        }
        BlockKind::Fdl => match non_blank(lines).find(|l| !FLOW_STEP.is_match(l.text)) {
            Some(line) => Err(ContentViolation::at(
                line.number,
                "Invalid flow step, expected: N. [ ] - `pN` - description - `inst-slug`",
            )),
            None => Ok(()),
        },
    }
}

fn check_definitions(lines: &[ContentLine<'_>], priority: bool) -> Result<(), ContentViolation> {
    let mut found = false;
    for line in outside_fences(lines) {
        if !looks_like_definition(line.text) {
            continue;
        }
        let def = parse_definition_line(line.text).ok_or_else(|| {
            ContentViolation::at(line.number, "Invalid identifier definition")
        })?;
        if def.checkbox.is_some() && !def.list_item {
            return Err(ContentViolation::at(
                line.number,
                "Checkbox on identifier definition requires a list item",
            ));
        }
        if priority && def.priority.is_none() {
            return Err(ContentViolation::at(
                line.number,
                "Identifier definition is missing a priority",
            ));
        }
        found = true;
    }
    if found {
        Ok(())
    } else {
        Err(ContentViolation::block("Block must contain an identifier definition"))
    }
}

fn check_references(lines: &[ContentLine<'_>], priority: bool) -> Result<(), ContentViolation> {
    for line in outside_fences(lines) {
        if line.is_blank() {
            continue;
        }
        let (list_item, rest) = strip_list_marker(line.text);
        for token in rest.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let reference = parse_reference_token(token).ok_or_else(|| {
                ContentViolation::at(line.number, format!("Invalid identifier reference '{token}'"))
            })?;
            if reference.checkbox.is_some() && !list_item {
                return Err(ContentViolation::at(
                    line.number,
                    "Checkbox on identifier reference requires a list item",
                ));
            }
            if priority && reference.priority.is_none() {
                return Err(ContentViolation::at(
                    line.number,
                    "Identifier reference is missing a priority",
                ));
            }
        }
    }
    Ok(())
}

fn check_items(
    lines: &[ContentLine<'_>],
    pattern: &Regex,
    what: &str,
    item: &str,
) -> Result<(), ContentViolation> {
    if first_non_blank(lines).is_none() {
        return Err(ContentViolation::block(format!("{what} must not be empty")));
    }
    match non_blank(lines).find(|l| !pattern.is_match(l.text)) {
        Some(line) => Err(ContentViolation::at(line.number, format!("Expected a {item}"))),
        None => Ok(()),
    }
}

fn split_row(row: &str) -> Vec<&str> {
    let row = row.trim();
    let row = row.strip_prefix('|').unwrap_or(row);
    let row = row.strip_suffix('|').unwrap_or(row);
    row.split('|').map(str::trim).collect()
}

fn check_table(lines: &[ContentLine<'_>]) -> Result<(), ContentViolation> {
    let rows: Vec<&ContentLine<'_>> = non_blank(lines).collect();
    let (Some(header), Some(separator)) = (rows.first(), rows.get(1)) else {
        return Err(ContentViolation::block(
            "Table must have a header row and a separator row",
        ));
    };

    let columns = split_row(header.text).len();
    let separator_cells = split_row(separator.text);
    if separator_cells.len() != columns {
        return Err(ContentViolation::at(
            separator.number,
            format!(
                "Table separator has {} cells, header has {columns}",
                separator_cells.len()
            ),
        ));
    }
    let well_formed = separator_cells
        .iter()
        .all(|c| c.contains('-') && c.chars().all(|ch| ch == '-' || ch == ':'));
    if !well_formed {
        return Err(ContentViolation::at(
            separator.number,
            "Table separator may only contain '-' and ':'",
        ));
    }

    let data = &rows[2..];
    if data.is_empty() {
        return Err(ContentViolation::block("Table must have at least one data row"));
    }
    for row in data {
        let cells = split_row(row.text).len();
        if cells != columns {
            return Err(ContentViolation::at(
                row.number,
                format!("Table row has {cells} cells, expected {columns}"),
            ));
        }
    }
    Ok(())
}

fn check_code(lines: &[ContentLine<'_>]) -> Result<(), ContentViolation> {
    let Some(open) = first_non_blank(lines) else {
        return Err(ContentViolation::block("Code block must start with a fence"));
    };
    if !is_fence(open.text) {
        return Err(ContentViolation::at(open.number, "Code block must start with a fence"));
    }
    let fence = &open.text.trim_start()[..3];
    let closed = lines
        .iter()
        .filter(|l| l.number > open.number)
        .any(|l| l.text.trim_start().starts_with(fence));
    if closed {
        Ok(())
    } else {
        Err(ContentViolation::at(open.number, "Code block fence is not closed"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::IdBlockAttrs;

    fn numbered(text: &str) -> Vec<ContentLine<'_>> {
        text.lines()
            .enumerate()
            .map(|(i, t)| ContentLine::new(i + 1, t))
            .collect()
    }

    fn check(kind: BlockKind, text: &str) -> Result<(), ContentViolation> {
        check_content(&kind, &numbered(text))
    }

    fn id_kind(priority: bool) -> BlockKind {
        BlockKind::Id(IdBlockAttrs {
            priority,
            ..IdBlockAttrs::default()
        })
    }

    #[test]
    fn free_accepts_anything() {
        assert!(check(BlockKind::Free, "").is_ok());
    }

    #[test]
    fn identifier_block() {
        assert!(check(id_kind(false), "**ID**: `spd-app-req-a`\nmore text").is_ok());
        assert!(check(id_kind(true), "- [ ] `p1` - **ID**: `spd-app-req-a`").is_ok());

        let err = check(id_kind(true), "- [ ] **ID**: `spd-app-req-a`").unwrap_err();
        assert_eq!(err.message, "Identifier definition is missing a priority");

        let err = check(id_kind(false), "[x] **ID**: `spd-app-req-a`").unwrap_err();
        assert!(err.message.contains("requires a list item"));

        let err = check(id_kind(false), "**ID**: spd-app-req-a").unwrap_err();
        assert_eq!(err.line, Some(1));
    }

    #[test]
    fn identifier_in_fence_does_not_count() {
        let err = check(id_kind(false), "```\n**ID**: `spd-app-req-a`\n```").unwrap_err();
        assert_eq!(err.message, "Block must contain an identifier definition");
    }

    #[test]
    fn reference_block() {
        let kind = BlockKind::IdRef { priority: false };
        assert!(check(kind.clone(), "- [x] `spd-app-req-a`, `spd-app-req-b`\n\n").is_ok());
        assert!(check(kind.clone(), "").is_ok());

        let err = check(kind.clone(), "`spd-app-req-a`, nope").unwrap_err();
        assert!(err.message.contains("'nope'"));

        let err = check(kind, "[x] `spd-app-req-a`").unwrap_err();
        assert!(err.message.contains("requires a list item"));

        let err = check(BlockKind::IdRef { priority: true }, "- `spd-app-req-a`").unwrap_err();
        assert!(err.message.contains("priority"));
    }

    #[test]
    fn lists() {
        assert!(check(BlockKind::List, "- a\n  - nested\n* b").is_ok());
        assert!(check(BlockKind::List, "\n\n").is_err());
        assert_eq!(check(BlockKind::List, "- a\nb").unwrap_err().line, Some(2));

        assert!(check(BlockKind::NumberedList, "1. a\n2) b").is_ok());
        assert!(check(BlockKind::NumberedList, "- a").is_err());

        assert!(check(BlockKind::TaskList { priority: false }, "- [ ] a\n- [x] b").is_ok());
        assert!(check(BlockKind::TaskList { priority: false }, "- a").is_err());
        let err = check(BlockKind::TaskList { priority: true }, "- [ ] `p1` a\n- [x] b").unwrap_err();
        assert_eq!(err.line, Some(2));
    }

    #[test]
    fn table_requires_data_row() {
        let err = check(BlockKind::Table, "| h1 | h2 |\n|----|----|").unwrap_err();
        assert_eq!(err.message, "Table must have at least one data row");
        assert!(check(BlockKind::Table, "| h1 | h2 |\n|----|----|\n| a | b |").is_ok());
    }

    #[test]
    fn table_shape_errors() {
        assert!(check(BlockKind::Table, "| h1 |").is_err());
        let err = check(BlockKind::Table, "| h1 | h2 |\n|----|\n| a | b |").unwrap_err();
        assert!(err.message.contains("separator has 1 cells"));
        let err = check(BlockKind::Table, "| h1 | h2 |\n|--x-|----|\n| a | b |").unwrap_err();
        assert!(err.message.contains("only contain"));
        assert!(check(BlockKind::Table, "| h1 | h2 |\n|:---|---:|\n| a | b |").is_ok());
        let err = check(BlockKind::Table, "| h1 | h2 |\n|---|---|\n| a |").unwrap_err();
        assert_eq!(err.line, Some(3));
    }

    #[test]
    fn paragraph_code_heading_link_image() {
        assert!(check(BlockKind::Paragraph, "\ntext").is_ok());
        assert!(check(BlockKind::Paragraph, " \n").is_err());

        assert!(check(BlockKind::Code, "```rust\nfn a() {}\n```").is_ok());
        assert!(check(BlockKind::Code, "```\nfn a() {}").is_err());
        assert!(check(BlockKind::Code, "fn a() {}").is_err());

        assert!(check(BlockKind::Heading { level: 2 }, "## Goals").is_ok());
        assert!(check(BlockKind::Heading { level: 2 }, "### Goals").is_err());
        assert!(check(BlockKind::Heading { level: 2 }, "##Goals").is_err());

        assert!(check(BlockKind::Link, "[docs](https://example.com)").is_ok());
        assert!(check(BlockKind::Link, "docs").is_err());
        assert!(check(BlockKind::Image, "![diagram](d.png)").is_ok());
        assert!(check(BlockKind::Image, "diagram").is_err());
    }

    #[test]
    fn flow_steps() {
        let ok = "1. [ ] - `p1` - Validate the token - `inst-validate-token`\n2. [x] - `p2` - Return - `inst-return`";
        assert!(check(BlockKind::Fdl, ok).is_ok());
        assert_eq!(flow_step_checkbox("2. [x] - `p2` - Return - `inst-return`"), Some(true));

        let err = check(BlockKind::Fdl, "1. [ ] - Validate - `inst-a`").unwrap_err();
        assert_eq!(err.line, Some(1));
    }

    #[test]
    fn fence_filtering() {
        let lines = numbered("a\n```\nb\n```\nc");
        let kept: Vec<_> = outside_fences(&lines).iter().map(|l| l.text).collect();
        assert_eq!(kept, vec!["a", "c"]);
    }
}
