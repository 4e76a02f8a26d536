//! `SM_NormWS` (§4.5.2): whitespace in the expected string is normalized —
//! any run of whitespace in the expected string matches any run of
//! whitespace in the captured output. Leading anchor `\A`, trailing anchor
//! `\s*\Z`.
//!
//! A tag's neighbors decide its anchors: a tag immediately followed by a
//! whitespace run (or by the end of the string, treated as virtual
//! trailing whitespace) gets a `(?<!\s)` suffix so the lazy `.*?` can't
//! eat into whitespace that the adjacent `\s+(?!\s)` segment already
//! owns. A tag preceded by a whitespace run needs no extra anchor: the
//! preceding segment already consumes everything up to the first
//! non-whitespace character. A whitespace run that is the very last token
//! is dropped entirely; the trailing `\s*\Z` anchor already covers it.

use super::lexer::{lex, sanitize_group_name, LexItem};
use super::TagGroups;
use std::collections::BTreeMap;

enum Token<'a> {
    Ws { start: usize, len_chars: usize },
    NonWs { text: &'a str, start: usize },
    Tag { raw_name: &'a str, start: usize, is_ellipsis: bool },
}

fn flatten(items: Vec<LexItem<'_>>) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    for item in items {
        match item {
            LexItem::Literal { text, start } => split_ws(text, start, &mut tokens),
            LexItem::Tag {
                raw_name,
                start,
                is_ellipsis,
            } => tokens.push(Token::Tag {
                raw_name,
                start,
                is_ellipsis,
            }),
        }
    }
    tokens
}

/// Split a literal run into alternating whitespace/non-whitespace
/// sub-tokens, preserving absolute byte offsets.
fn split_ws<'a>(text: &'a str, base_start: usize, out: &mut Vec<Token<'a>>) {
    let mut iter = text.char_indices().peekable();
    while let Some(&(idx, ch)) = iter.peek() {
        let is_ws = ch.is_whitespace();
        let run_start = idx;
        let mut run_end = idx;
        let mut len_chars = 0;
        while let Some(&(i2, c2)) = iter.peek() {
            if c2.is_whitespace() != is_ws {
                break;
            }
            run_end = i2 + c2.len_utf8();
            len_chars += 1;
            iter.next();
        }
        if is_ws {
            out.push(Token::Ws {
                start: base_start + run_start,
                len_chars,
            });
        } else {
            out.push(Token::NonWs {
                text: &text[run_start..run_end],
                start: base_start + run_start,
            });
        }
    }
}

pub fn compile(
    expected_str: &str,
    tags_enabled: bool,
) -> (Vec<String>, Vec<usize>, Vec<usize>, BTreeMap<usize, Option<String>>) {
    let tokens = flatten(lex(expected_str, tags_enabled));

    let mut segments = vec![r"\A".to_string()];
    let mut charnos = vec![0];
    let mut rcounts = vec![0];
    let mut tags_by_idx = BTreeMap::new();
    let mut groups = TagGroups::new();

    let n = tokens.len();
    for (i, token) in tokens.iter().enumerate() {
        match token {
            Token::Ws { start, len_chars: _ } => {
                if i + 1 == n {
                    // Trailing whitespace run: absorbed by the `\s*\Z` anchor.
                    continue;
                }
                segments.push(r"\s+(?!\s)".to_string());
                charnos.push(*start);
                rcounts.push(1);
            }
            Token::NonWs { text, start } => {
                segments.push(regex::escape(text));
                charnos.push(*start);
                rcounts.push(text.chars().count());
            }
            Token::Tag {
                raw_name,
                start,
                is_ellipsis,
            } => {
                let right_is_ws_or_end = match tokens.get(i + 1) {
                    None => true,
                    Some(Token::Ws { .. }) => true,
                    Some(_) => false,
                };

                let idx = segments.len();
                let mut pattern = if *is_ellipsis {
                    tags_by_idx.insert(idx, None);
                    "(?:.*?)".to_string()
                } else {
                    let sanitized = sanitize_group_name(raw_name);
                    let pat = match groups.assign_or_backreference(&sanitized) {
                        Some(group_no) => format!(r"\{group_no}"),
                        None => format!("(?P<{sanitized}>.*?)"),
                    };
                    tags_by_idx.insert(idx, Some(raw_name.to_string()));
                    pat
                };
                if right_is_ws_or_end {
                    pattern.push_str(r"(?<!\s)");
                }
                segments.push(pattern);
                charnos.push(*start);
                rcounts.push(0);
            }
        }
    }

    segments.push(r"\s*\Z".to_string());
    charnos.push(expected_str.len());
    rcounts.push(0);

    (segments, charnos, rcounts, tags_by_idx)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher(expected_str: &str, tags_enabled: bool) -> fancy_regex::Regex {
        let (segments, ..) = compile(expected_str, tags_enabled);
        fancy_regex::Regex::new(&segments.concat()).unwrap()
    }

    #[test]
    fn docstring_example_matches_expected_structure() {
        let (segments, ..) = compile("a<...> <foo-bar>c", true);
        assert_eq!(
            segments,
            vec![
                r"\A".to_string(),
                "a".to_string(),
                "(?:.*?)(?<!\\s)".to_string(),
                r"\s+(?!\s)".to_string(),
                "(?P<foo_bar>.*?)".to_string(),
                "c".to_string(),
                r"\s*\Z".to_string(),
            ]
        );
    }

    #[test]
    fn whitespace_widths_are_interchangeable() {
        let re = matcher("ex <...>\nu<...>", true);
        assert!(re.is_match("ex  x\n  u  \n").unwrap());
    }

    #[test]
    fn exact_whitespace_also_matches() {
        let re = matcher("ex <...>\nu<...>", true);
        assert!(re.is_match("ex x\nu\n").unwrap());
    }

    #[test]
    fn literal_non_whitespace_is_still_exact() {
        let re = matcher("ex act", true);
        assert!(!re.is_match("exact").unwrap());
    }
}
