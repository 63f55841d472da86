//! Stack-based marker pairing
//!
//! Shared by template loading and artifact parsing. An opening marker is
//! pushed; a marker whose key matches the top of the stack closes it.

use crate::marker::{scan_line, Marker};

/// A matched opening/closing marker pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerPair {
    /// Opening marker (carries the attributes)
    pub open: Marker,
    /// Closing marker line
    pub close_line: usize,
}

/// Result of pairing every marker of a document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pairing {
    /// Closed pairs, ordered by opening line
    pub pairs: Vec<MarkerPair>,
    /// Markers still open at end of input
    pub unclosed: Vec<Marker>,
}

/// Pair markers across `lines`, numbering from `first_line` (1-based)
#[must_use]
pub fn pair_markers<S: AsRef<str>>(lines: &[S], first_line: usize) -> Pairing {
    let mut stack: Vec<Marker> = Vec::new();
    let mut pairs = Vec::new();

    for (offset, line) in lines.iter().enumerate() {
        for marker in scan_line(line.as_ref(), first_line + offset) {
            match stack.last() {
                Some(top) if top.same_key(&marker) => {
                    if let Some(open) = stack.pop() {
                        pairs.push(MarkerPair {
                            open,
                            close_line: marker.line,
                        });
                    }
                }
                _ => stack.push(marker),
            }
        }
    }

    pairs.sort_by_key(|p| (p.open.line, std::cmp::Reverse(p.close_line)));
    Pairing {
        pairs,
        unclosed: stack,
    }
}

/// Innermost enclosing span for each span, by index
///
/// `spans` are `(start, end)` line pairs; a parent strictly contains its child.
#[must_use]
pub fn parents(spans: &[(usize, usize)]) -> Vec<Option<usize>> {
    spans
        .iter()
        .enumerate()
        .map(|(i, &(start, end))| {
            spans
                .iter()
                .enumerate()
                .filter(|&(j, &(s, e))| j != i && s <= start && e >= end && (s, e) != (start, end))
                .max_by_key(|&(_, &(s, e))| (s, std::cmp::Reverse(e)))
                .map(|(j, _)| j)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_pairs() {
        let doc = [
            "<!-- spd:id:req -->",
            "**ID**: `spd-app-req-a`",
            "<!-- spd:task-list:tasks -->",
            "- [ ] one",
            "<!-- spd:task-list:tasks -->",
            "<!-- spd:id:req -->",
        ];
        let pairing = pair_markers(&doc, 1);
        assert!(pairing.unclosed.is_empty());
        assert_eq!(pairing.pairs.len(), 2);
        assert_eq!(pairing.pairs[0].open.name, "req");
        assert_eq!((pairing.pairs[0].open.line, pairing.pairs[0].close_line), (1, 6));
        assert_eq!((pairing.pairs[1].open.line, pairing.pairs[1].close_line), (3, 5));

        let spans: Vec<_> = pairing
            .pairs
            .iter()
            .map(|p| (p.open.line, p.close_line))
            .collect();
        assert_eq!(parents(&spans), vec![None, Some(0)]);
    }

    #[test]
    fn unclosed_left_on_stack() {
        let doc = ["<!-- spd:paragraph:a -->", "text", "<!-- spd:paragraph:b -->"];
        let pairing = pair_markers(&doc, 10);
        assert!(pairing.pairs.is_empty());
        assert_eq!(pairing.unclosed.len(), 2);
        assert_eq!(pairing.unclosed[0].line, 10);
    }

    #[test]
    fn interleaved_markers_do_not_pair() {
        let doc = [
            "<!-- spd:list:a -->",
            "<!-- spd:list:b -->",
            "<!-- spd:list:a -->",
            "<!-- spd:list:b -->",
        ];
        let pairing = pair_markers(&doc, 1);
        assert!(pairing.pairs.is_empty());
        assert_eq!(pairing.unclosed.len(), 4);
    }

    #[test]
    fn siblings_have_same_parent() {
        let spans = [(1, 10), (2, 4), (5, 9), (6, 7)];
        assert_eq!(parents(&spans), vec![None, Some(0), Some(0), Some(2)]);
    }
}
