//! Sequence-trace notation.
//!
//! `action 'a' THEN ('b' THEN 'c')` describes the ordered pattern list
//! `[a, b, c]`. Nesting only groups the concatenation, so segments are
//! flattened in textual order.

use std::sync::LazyLock;

use regex::Regex;

use crate::pattern::{ActionPattern, PatternError};

static THEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bTHEN\b").expect("THEN regex is valid"));

#[derive(Debug, thiserror::Error)]
pub enum SequenceError {
    #[error("sequence has no segments")]
    Empty,

    #[error("segment {index} of the sequence is empty")]
    EmptySegment { index: usize },

    #[error(transparent)]
    Pattern(#[from] PatternError),
}

/// Split `text` on `THEN`, strip decoration and compile each segment.
pub fn parse_sequence(text: &str) -> Result<Vec<ActionPattern>, SequenceError> {
    if text.trim().is_empty() {
        return Err(SequenceError::Empty);
    }

    THEN.split(text)
        .enumerate()
        .map(|(index, segment)| {
            let body = strip_decoration(segment);
            if body.is_empty() {
                return Err(SequenceError::EmptySegment { index });
            }
            Ok(ActionPattern::new(body)?)
        })
        .collect()
}

/// Remove grouping parentheses, an `action`/`actions` keyword and one level
/// of quotes.
fn strip_decoration(segment: &str) -> &str {
    let mut s = strip_unmatched(segment.trim());
    while is_enclosed(s) {
        s = s[1..s.len() - 1].trim();
    }

    for keyword in ["actions", "action"] {
        if let Some(rest) = s.strip_prefix(keyword) {
            if rest.starts_with(char::is_whitespace) || rest.starts_with(['\'', '"']) {
                s = rest.trim_start();
                break;
            }
        }
    }

    for quote in ['\'', '"'] {
        if s.len() >= 2 && s.starts_with(quote) && s.ends_with(quote) {
            return &s[1..s.len() - 1];
        }
    }
    s
}

// Splitting `(a THEN b(c))` on THEN leaves `(a` and `b(c))`. Drop the
// unmatched leading `(` and trailing `)`; balanced groups stay.
fn strip_unmatched(segment: &str) -> &str {
    let mut open = 0usize;
    let mut extra_close = 0usize;
    for c in segment.chars() {
        match c {
            '(' => open += 1,
            ')' if open == 0 => extra_close += 1,
            ')' => open -= 1,
            _ => {}
        }
    }

    let mut s = segment;
    for _ in 0..open {
        match s.strip_prefix('(') {
            Some(rest) => s = rest.trim_start(),
            None => break,
        }
    }
    for _ in 0..extra_close {
        match s.strip_suffix(')') {
            Some(rest) => s = rest.trim_end(),
            None => break,
        }
    }
    s
}

/// True when the first `(` closes at the last character.
fn is_enclosed(s: &str) -> bool {
    if !(s.starts_with('(') && s.ends_with(')')) {
        return false;
    }
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return i == s.len() - 1;
                }
            }
            _ => {}
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sources(patterns: &[ActionPattern]) -> Vec<&str> {
        patterns.iter().map(|p| p.as_str()).collect()
    }

    #[test]
    fn test_plain_sequence() {
        let seq = parse_sequence("a THEN b THEN c").unwrap();
        assert_eq!(sources(&seq), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_decorated_and_nested_sequence() {
        let seq = parse_sequence("action 'x.*' THEN (action \"y\" THEN ('z(1|2)'))").unwrap();
        assert_eq!(sources(&seq), vec!["x.*", "y", "z(1|2)"]);
        assert!(seq[2].matches("z2"));
    }

    #[test]
    fn test_trailing_group_is_kept() {
        let seq = parse_sequence("dial THEN x(y)").unwrap();
        assert_eq!(sources(&seq), vec!["dial", "x(y)"]);
        assert!(seq[1].matches("xy"));
    }

    #[test]
    fn test_nested_grouping_keeps_inner_group() {
        let seq = parse_sequence("(a THEN b(c))").unwrap();
        assert_eq!(sources(&seq), vec!["a", "b(c)"]);

        let seq = parse_sequence("((a THEN b) THEN (c|d))").unwrap();
        assert_eq!(sources(&seq), vec!["a", "b", "c|d"]);
    }

    #[test]
    fn test_keyword_inside_name_is_not_a_separator() {
        let seq = parse_sequence("'THEN_x' THEN y").unwrap();
        assert_eq!(sources(&seq), vec!["THEN_x", "y"]);
    }

    #[test]
    fn test_empty_sequence_rejected() {
        assert!(matches!(parse_sequence("   "), Err(SequenceError::Empty)));
        assert!(matches!(
            parse_sequence("a THEN () THEN b"),
            Err(SequenceError::EmptySegment { index: 1 })
        ));
    }
}
