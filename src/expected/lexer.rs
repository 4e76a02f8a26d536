//! Lexing of `expected_str` into literal/tag tokens, shared by both state
//! machines (§4.5.1).

use std::sync::OnceLock;

/// `NAME = [A-Za-z.][A-Za-z0-9:.-]*`, matching a `<NAME>` capture tag.
fn tag_regex() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| regex::Regex::new(r"<([A-Za-z.][A-Za-z0-9:.-]*)>").unwrap())
}

/// Replace any character a regex capture-group name can't contain (`-`,
/// `.`, `:`) with `_`. `tags_by_idx` still keys on the original name.
pub fn sanitize_group_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

#[derive(Debug, Clone)]
pub enum LexItem<'a> {
    Literal { text: &'a str, start: usize },
    Tag {
        raw_name: &'a str,
        start: usize,
        is_ellipsis: bool,
    },
}

impl LexItem<'_> {
    pub fn start(&self) -> usize {
        match self {
            LexItem::Literal { start, .. } => *start,
            LexItem::Tag { start, .. } => *start,
        }
    }
}

/// Split `expected_str` on `<NAME>` tags. When `tags_enabled` is false the
/// whole string is returned as a single literal (including any literal
/// `<...>`-shaped text).
pub fn lex(expected_str: &str, tags_enabled: bool) -> Vec<LexItem<'_>> {
    if !tags_enabled {
        if expected_str.is_empty() {
            return Vec::new();
        }
        return vec![LexItem::Literal {
            text: expected_str,
            start: 0,
        }];
    }

    let re = tag_regex();
    let mut items = Vec::new();
    let mut last = 0;
    for caps in re.captures_iter(expected_str) {
        let whole = caps.get(0).unwrap();
        if whole.start() > last {
            items.push(LexItem::Literal {
                text: &expected_str[last..whole.start()],
                start: last,
            });
        }
        let name = caps.get(1).unwrap().as_str();
        items.push(LexItem::Tag {
            raw_name: name,
            start: whole.start(),
            is_ellipsis: name == "...",
        });
        last = whole.end();
    }
    if last < expected_str.len() {
        items.push(LexItem::Literal {
            text: &expected_str[last..],
            start: last,
        });
    }
    items
}
