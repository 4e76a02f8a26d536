//! Expected-output compiler (§4.5): translates an expected-output string
//! containing ellipsis wildcards and named capture tags into a regex, via
//! two state-machine variants that share lexing and tag-group bookkeeping.

mod lexer;
mod sm_literal;
mod sm_normws;

pub use lexer::sanitize_group_name;

use std::collections::BTreeMap;

/// Compiled expected-output artifact (§3). Immutable once produced.
#[derive(Debug, Clone)]
pub struct Expected {
    pub expected_str: String,
    pub regex_segments: Vec<String>,
    pub charnos: Vec<usize>,
    pub rcounts: Vec<usize>,
    /// Segment index -> tag name (`None` for an unnamed ellipsis). Only
    /// tag segments appear here; literal/whitespace/anchor segments never
    /// do (§3 invariant).
    pub tags_by_idx: BTreeMap<usize, Option<String>>,
}

impl Expected {
    /// Join `regex_segments` and compile with multi-line + dot-matches-
    /// newline semantics (§6). `fancy_regex` is used rather than the
    /// backtracking-free `regex` crate because the duplicate-tag policy
    /// (§4.5.4) requires backreferences and `SM_NormWS` requires lookaround
    /// assertions, neither of which `regex` supports.
    pub fn matcher(&self) -> Result<fancy_regex::Regex, fancy_regex::Error> {
        let pattern = format!("(?sm){}", self.regex_segments.concat());
        fancy_regex::Regex::new(&pattern)
    }
}

/// Bookkeeping shared by both state machines: tracks which capture-group
/// number a named tag was first assigned, so a repeated tag can be emitted
/// as a backreference instead of a re-declared group (§4.5.4).
struct TagGroups {
    next_group_no: usize,
    seen: BTreeMap<String, usize>,
}

impl TagGroups {
    fn new() -> Self {
        Self {
            next_group_no: 1,
            seen: BTreeMap::new(),
        }
    }

    /// Returns `Some(group_no)` if `sanitized_name` was already assigned a
    /// group (the caller should emit a backreference), or `None` plus
    /// records a fresh assignment for first occurrences (the caller emits
    /// `(?P<name>...)`).
    fn assign_or_backreference(&mut self, sanitized_name: &str) -> Option<usize> {
        if let Some(&n) = self.seen.get(sanitized_name) {
            return Some(n);
        }
        let n = self.next_group_no;
        self.next_group_no += 1;
        self.seen.insert(sanitized_name.to_string(), n);
        None
    }
}

/// Compile `expected_str` into a regex-segment list (§4.5). `tags_enabled`
/// controls whether `<NAME>` is recognized at all; `normalize_whitespace`
/// picks `SM_NormWS` vs `SM_NotNormWS`.
pub fn compile_expected(expected_str: &str, tags_enabled: bool, normalize_whitespace: bool) -> Expected {
    let (regex_segments, charnos, rcounts, tags_by_idx) = if normalize_whitespace {
        sm_normws::compile(expected_str, tags_enabled)
    } else {
        sm_literal::compile(expected_str, tags_enabled)
    };

    Expected {
        expected_str: expected_str.to_string(),
        regex_segments,
        charnos,
        rcounts,
        tags_by_idx,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_accounting_invariant_holds() {
        for norm_ws in [false, true] {
            let expected = compile_expected("a <foo> b <...> c", true, norm_ws);
            assert_eq!(expected.regex_segments.len(), expected.charnos.len());
            assert_eq!(expected.regex_segments.len(), expected.rcounts.len());
            assert_eq!(expected.charnos[0], 0);
            assert_eq!(*expected.charnos.last().unwrap(), expected.expected_str.len());
            for w in expected.charnos.windows(2) {
                assert!(w[0] <= w[1]);
            }
            for (idx, name) in &expected.tags_by_idx {
                assert!(*idx < expected.regex_segments.len());
                let _ = name;
            }
        }
    }

    #[test]
    fn literal_match_scenario() {
        let expected = compile_expected("hello world", true, false);
        let re = expected.matcher().unwrap();
        assert!(re.is_match("hello world").unwrap());
        assert!(!re.is_match("hello  world").unwrap());
    }

    #[test]
    fn ellipsis_scenario() {
        let expected = compile_expected("a<...>c", true, false);
        let re = expected.matcher().unwrap();
        assert!(re.is_match("axyzc").unwrap());
        assert!(re.is_match("ab\ncz").unwrap());
    }

    #[test]
    fn named_tag_scenario() {
        let expected = compile_expected("a<foo>b<bar>c", true, false);
        let re = expected.matcher().unwrap();
        let caps = re.captures("axxbyyyc").unwrap().unwrap();
        assert_eq!(&caps["foo"], "xx");
        assert_eq!(&caps["bar"], "yyy");
    }

    #[test]
    fn whitespace_normalization_scenario() {
        let expected = compile_expected("ex <...>\nu<...>", true, true);
        let re = expected.matcher().unwrap();
        assert!(re.is_match("ex  x\n  u  \n").unwrap());
    }

    #[test]
    fn duplicate_named_tag_uses_backreference() {
        let expected = compile_expected("<x> and <x>", true, false);
        let re = expected.matcher().unwrap();
        assert!(re.is_match("hi and hi").unwrap());
        assert!(!re.is_match("hi and bye").unwrap());
    }

    #[test]
    fn tag_replay_property() {
        let expected = compile_expected("a<foo>b<bar>c", true, false);
        let re = expected.matcher().unwrap();
        let caps = re.captures("a123b456c").unwrap().unwrap();
        assert_eq!(&caps["foo"], "123");
        assert_eq!(&caps["bar"], "456");
    }

    #[test]
    fn regex_round_trip_for_not_norm_ws() {
        let expected = compile_expected("plain text, no tags here", true, false);
        let re = expected.matcher().unwrap();
        assert!(re.is_match(&expected.expected_str).unwrap());
    }
}
