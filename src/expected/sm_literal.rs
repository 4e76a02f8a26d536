//! `SM_NotNormWS` (§4.5.1): whitespace in the expected string is matched
//! literally. Leading anchor `\A`, trailing anchor `\n*\Z`.

use super::lexer::{lex, sanitize_group_name, LexItem};
use super::TagGroups;
use std::collections::BTreeMap;

pub fn compile(
    expected_str: &str,
    tags_enabled: bool,
) -> (Vec<String>, Vec<usize>, Vec<usize>, BTreeMap<usize, Option<String>>) {
    let mut segments = vec![r"\A".to_string()];
    let mut charnos = vec![0];
    let mut rcounts = vec![0];
    let mut tags_by_idx = BTreeMap::new();

    let mut groups = TagGroups::new();

    for item in lex(expected_str, tags_enabled) {
        match item {
            LexItem::Literal { text, start } => {
                segments.push(regex::escape(text));
                charnos.push(start);
                rcounts.push(text.chars().count());
            }
            LexItem::Tag {
                raw_name,
                start,
                is_ellipsis,
            } => {
                let idx = segments.len();
                if is_ellipsis {
                    segments.push("(?:.*?)".to_string());
                    tags_by_idx.insert(idx, None);
                } else {
                    let sanitized = sanitize_group_name(raw_name);
                    match groups.assign_or_backreference(&sanitized) {
                        Some(group_no) => segments.push(format!(r"\{group_no}")),
                        None => segments.push(format!("(?P<{sanitized}>.*?)")),
                    }
                    tags_by_idx.insert(idx, Some(raw_name.to_string()));
                }
                charnos.push(start);
                rcounts.push(0);
            }
        }
    }

    segments.push(r"\n*\Z".to_string());
    charnos.push(expected_str.len());
    rcounts.push(0);

    (segments, charnos, rcounts, tags_by_idx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_is_escaped() {
        let (segments, ..) = compile("a.b*c", true);
        assert!(segments.iter().any(|s| s.contains(r"a\.b\*c")));
    }

    #[test]
    fn trailing_newlines_are_optional() {
        let (segments, ..) = compile("done", true);
        let pattern = segments.concat();
        let re = fancy_regex::Regex::new(&pattern).unwrap();
        assert!(re.is_match("done").unwrap());
        assert!(re.is_match("done\n\n").unwrap());
    }
}
