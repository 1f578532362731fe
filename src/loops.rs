//! # Loop Region Tracker
//!
//! Finds the top-level `[ … ]` regions of a paragraph.
//!
//! The scan is stack based: an opening bracket outside quotes pushes its
//! position and a closing bracket outside quotes pops it, giving a matched
//! pair. Pairs enclosed by another matched pair belong to it; the rest are
//! emitted as regions covering their interiors (brackets excluded). Unmatched
//! brackets of either kind are ignored and do not affect other regions.
//!
//! The tracker keeps no state between calls. Identity across edits comes from
//! [`RegionKey`]: the interior text plus how many earlier regions in the same
//! scan have that same text. A region keeps its key when other regions move
//! around it, and gets a new key as soon as its own text changes.

use crate::ast::StyledChar;
use crate::config::NotationSymbols;
use serde::Serialize;
use std::ops::Range;

/// Identity of a loop region across rescans
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RegionKey {
    /// Interior text, brackets excluded
    pub content: String,
    /// Number of earlier regions in the same paragraph with identical content
    pub occurrence: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoopRegion {
    pub key: RegionKey,
    /// Position of the opening bracket
    pub open: usize,
    /// Position of the matching closing bracket
    pub close: usize,
}

impl LoopRegion {
    /// Stream positions strictly between the brackets
    pub fn interior(&self) -> Range<usize> {
        self.open + 1..self.close
    }
}

/// Scan a stream for top-level loop regions, left to right.
pub fn find_loop_regions(stream: &[StyledChar], symbols: &NotationSymbols) -> Vec<LoopRegion> {
    let mut pairs: Vec<(usize, usize)> = Vec::new();
    let mut open_stack: Vec<usize> = Vec::new();
    let mut in_quote = false;

    for (i, styled) in stream.iter().enumerate() {
        let c = styled.ch;
        if c == symbols.quote {
            in_quote = !in_quote;
        } else if in_quote {
            continue;
        } else if c == symbols.loop_open {
            open_stack.push(i);
        } else if c == symbols.loop_close {
            if let Some(open) = open_stack.pop() {
                pairs.push((open, i));
            }
        }
    }

    // Brackets still on the stack never matched; a pair is top-level when no
    // other matched pair encloses it
    let mut top_level: Vec<(usize, usize)> = pairs
        .iter()
        .copied()
        .filter(|&(open, close)| !pairs.iter().any(|&(o, c)| o < open && close < c))
        .collect();
    top_level.sort_unstable();

    let mut regions: Vec<LoopRegion> = Vec::with_capacity(top_level.len());
    for (open, close) in top_level {
        let content: String = stream[open + 1..close].iter().map(|c| c.ch).collect();
        let occurrence = regions.iter().filter(|r| r.key.content == content).count();
        regions.push(LoopRegion {
            key: RegionKey { content, occurrence },
            open,
            close,
        });
    }
    regions
}

/// Look up a region by identity in a fresh scan
pub fn find_region<'a>(regions: &'a [LoopRegion], key: &RegionKey) -> Option<&'a LoopRegion> {
    regions.iter().find(|r| &r.key == key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Paragraph;
    use crate::style::resolve;

    fn scan(text: &str) -> Vec<LoopRegion> {
        let stream = resolve(&Paragraph::plain(text), 12.0);
        find_loop_regions(&stream, &NotationSymbols::default())
    }

    fn contents(regions: &[LoopRegion]) -> Vec<&str> {
        regions.iter().map(|r| r.key.content.as_str()).collect()
    }

    #[test]
    fn test_simple_region() {
        let regions = scan("ab[c].");
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].key.content, "c");
        assert_eq!(regions[0].interior(), 3..4);
    }

    #[test]
    fn test_regions_in_textual_order() {
        assert_eq!(contents(&scan("[a b] x [c] [d e].")), vec!["a b", "c", "d e"]);
    }

    #[test]
    fn test_nested_brackets_belong_to_outer_region() {
        let regions = scan("[a [b] c]");
        assert_eq!(contents(&regions), vec!["a [b] c"]);
        assert_eq!((regions[0].open, regions[0].close), (0, 8));
    }

    #[test]
    fn test_unmatched_brackets_are_ignored() {
        assert!(scan("a] b").is_empty());
        assert!(scan("[a b").is_empty());
        assert_eq!(contents(&scan("] [a] [b")), vec!["a"]);
    }

    #[test]
    fn test_unmatched_open_does_not_hide_later_regions() {
        assert_eq!(contents(&scan("[a [b].")), vec!["b"]);
        assert_eq!(contents(&scan("[x [a] y [b]")), vec!["a", "b"]);

        let regions = scan("[a [b [c] d]");
        assert_eq!(contents(&regions), vec!["b [c] d"]);
        assert_eq!((regions[0].open, regions[0].close), (3, 11));
    }

    #[test]
    fn test_brackets_inside_quotes_are_ignored() {
        assert!(scan("\"[a]\"").is_empty());
        assert_eq!(contents(&scan("[a \"]\" b]")), vec!["a \"]\" b"]);
    }

    #[test]
    fn test_empty_region() {
        let regions = scan("[]");
        assert_eq!(regions.len(), 1);
        assert!(regions[0].interior().is_empty());
    }

    #[test]
    fn test_duplicate_contents_get_distinct_keys() {
        let regions = scan("[a] [b] [a]");
        assert_eq!(regions[0].key.occurrence, 0);
        assert_eq!(regions[1].key.occurrence, 0);
        assert_eq!(regions[2].key.occurrence, 1);
        assert_ne!(regions[0].key, regions[2].key);
    }

    #[test]
    fn test_key_survives_reordering() {
        let before = scan("[a] [b]");
        let after = scan("[b] x [a]");
        let key = &before[0].key;
        let moved = find_region(&after, key).unwrap();
        assert_eq!(moved.key.content, "a");
        assert_eq!(moved.open, 6);
    }
}
