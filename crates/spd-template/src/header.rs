//! Template header dialect
//!
//! A deliberately small `key: value` grammar between two `---` lines:
//! two-space indentation for nested mappings, `#` comments, and scalar
//! coercion into [`HeaderValue`].

use crate::error::HeaderError;
use indexmap::IndexMap;
use serde::Serialize;

/// Header delimiter line
pub const DELIMITER: &str = "---";

/// Parsed header value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum HeaderValue {
    /// `true` / `false`
    Bool(bool),
    /// Integer literal
    Int(i64),
    /// Anything else, quotes stripped
    Str(String),
    /// Nested mapping
    Map(IndexMap<String, HeaderValue>),
}

impl HeaderValue {
    /// Coerce a raw scalar
    #[must_use]
    pub fn scalar(raw: &str) -> Self {
        let raw = raw.trim();
        if let Some(quoted) = unquote(raw) {
            return Self::Str(quoted.to_string());
        }
        match raw {
            "true" => Self::Bool(true),
            "false" => Self::Bool(false),
            _ => raw
                .parse::<i64>()
                .map(Self::Int)
                .unwrap_or_else(|_| Self::Str(raw.to_string())),
        }
    }

    /// String content
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Mapping content
    #[inline]
    #[must_use]
    pub fn as_map(&self) -> Option<&IndexMap<String, HeaderValue>> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Nested lookup
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&HeaderValue> {
        self.as_map()?.get(key)
    }
}

fn unquote(raw: &str) -> Option<&str> {
    let bytes = raw.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if (first == b'"' || first == b'\'') && first == last {
            return Some(&raw[1..raw.len() - 1]);
        }
    }
    None
}

/// Drop a trailing ` # comment` from an unquoted value
fn strip_comment(value: &str) -> &str {
    if unquote(value.trim()).is_some() {
        return value;
    }
    match value.find(" #") {
        Some(at) => &value[..at],
        None => value,
    }
}

/// Header found at the top of a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Parsed root mapping
    pub values: IndexMap<String, HeaderValue>,
    /// 1-based line of the closing delimiter
    pub end_line: usize,
}

struct Entry<'a> {
    indent: usize,
    key: &'a str,
    value: Option<&'a str>,
    line: usize,
}

/// Detect and parse a header at the start of `lines`
///
/// Returns `Ok(None)` when the first line is not a delimiter.
///
/// # Errors
/// Returns [`HeaderError`] for a missing closing delimiter or malformed body.
pub fn parse_header<S: AsRef<str>>(lines: &[S]) -> Result<Option<Header>, HeaderError> {
    match lines.first() {
        Some(first) if first.as_ref().trim_end() == DELIMITER => {}
        _ => return Ok(None),
    }

    let close = lines
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, l)| l.as_ref().trim_end() == DELIMITER)
        .map(|(i, _)| i)
        .ok_or(HeaderError::Unterminated { line: 1 })?;

    let mut entries = Vec::new();
    for (idx, raw) in lines[1..close].iter().enumerate() {
        let line = idx + 2;
        let text = raw.as_ref().trim_end();
        let body = text.trim_start_matches(' ');
        if body.is_empty() || body.starts_with('#') {
            continue;
        }
        if body.starts_with('\t') {
            return Err(HeaderError::BadIndent { line });
        }
        let indent = text.len() - body.len();
        if indent % 2 != 0 {
            return Err(HeaderError::BadIndent { line });
        }
        let (key, value) = body.split_once(':').ok_or(HeaderError::Malformed { line })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(HeaderError::Malformed { line });
        }
        let value = strip_comment(value).trim();
        entries.push(Entry {
            indent,
            key,
            value: (!value.is_empty()).then_some(value),
            line,
        });
    }

    let mut pos = 0;
    let values = parse_mapping(&entries, &mut pos, 0)?;
    if let Some(entry) = entries.get(pos) {
        return Err(HeaderError::UnexpectedIndent { line: entry.line });
    }

    Ok(Some(Header {
        values,
        end_line: close + 1,
    }))
}

fn parse_mapping(
    entries: &[Entry<'_>],
    pos: &mut usize,
    indent: usize,
) -> Result<IndexMap<String, HeaderValue>, HeaderError> {
    let mut map = IndexMap::new();

    while let Some(entry) = entries.get(*pos) {
        if entry.indent < indent {
            break;
        }
        if entry.indent > indent {
            return Err(HeaderError::UnexpectedIndent { line: entry.line });
        }
        *pos += 1;

        let value = match entry.value {
            Some(raw) => HeaderValue::scalar(raw),
            None => match entries.get(*pos) {
                Some(next) if next.indent == indent + 2 => {
                    HeaderValue::Map(parse_mapping(entries, pos, indent + 2)?)
                }
                Some(next) if next.indent > indent => {
                    return Err(HeaderError::UnexpectedIndent { line: next.line });
                }
                _ => HeaderValue::Map(IndexMap::new()),
            },
        };

        if map.contains_key(entry.key) {
            return Err(HeaderError::DuplicateKey {
                line: entry.line,
                key: entry.key.to_string(),
            });
        }
        map.insert(entry.key.to_string(), value);
    }

    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lines(text: &str) -> Vec<&str> {
        text.lines().collect()
    }

    #[test]
    fn no_header() {
        assert_eq!(parse_header(&lines("# Title\n")).unwrap(), None);
        assert_eq!(parse_header::<&str>(&[]).unwrap(), None);
    }

    #[test]
    fn nested_header_with_coercion() {
        let text = "---\nspd-template:\n  kind: PRD # trailing\n  version:\n    major: 1\n    minor: 0\n  strict: true\n  title: \"a # b\"\n---\nbody";
        let header = parse_header(&lines(text)).unwrap().unwrap();
        assert_eq!(header.end_line, 9);

        let root = &header.values["spd-template"];
        assert_eq!(root.get("kind"), Some(&HeaderValue::Str("PRD".into())));
        assert_eq!(
            root.get("version").and_then(|v| v.get("major")),
            Some(&HeaderValue::Int(1))
        );
        assert_eq!(root.get("strict"), Some(&HeaderValue::Bool(true)));
        assert_eq!(root.get("title"), Some(&HeaderValue::Str("a # b".into())));
    }

    #[test]
    fn comments_and_blank_lines_skipped() {
        let text = "---\n# comment\n\nkind: ADR\n---";
        let header = parse_header(&lines(text)).unwrap().unwrap();
        assert_eq!(header.values["kind"], HeaderValue::Str("ADR".into()));
    }

    #[test]
    fn unterminated_header() {
        let err = parse_header(&lines("---\nkind: PRD\n")).unwrap_err();
        assert_eq!(err, HeaderError::Unterminated { line: 1 });
    }

    #[test]
    fn odd_indentation_rejected() {
        let err = parse_header(&lines("---\na:\n   b: 1\n---")).unwrap_err();
        assert_eq!(err, HeaderError::BadIndent { line: 3 });
    }

    #[test]
    fn over_indentation_rejected() {
        let err = parse_header(&lines("---\na:\n    b: 1\n---")).unwrap_err();
        assert_eq!(err, HeaderError::UnexpectedIndent { line: 3 });
    }

    #[test]
    fn missing_colon_rejected() {
        let err = parse_header(&lines("---\njust text\n---")).unwrap_err();
        assert_eq!(err, HeaderError::Malformed { line: 2 });
    }

    #[test]
    fn duplicate_key_rejected() {
        let err = parse_header(&lines("---\na: 1\na: 2\n---")).unwrap_err();
        assert!(matches!(err, HeaderError::DuplicateKey { line: 3, .. }));
    }
}
