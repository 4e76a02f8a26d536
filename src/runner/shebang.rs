//! `ShebangTemplate` (§4.7): a `%`-delimited template for building the
//! command line used to spawn an interpreter, e.g. `%bash -c %script`.
//! Bare tokens (`%name`) end at the first non-identifier character; braced
//! tokens (`%{name}`) allow a literal identifier character to follow.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::sync::OnceLock;

fn token_regex() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| {
        regex::Regex::new(r"%(?:\{(?P<braced>[A-Za-z_][A-Za-z0-9_]*)\}|(?P<bare>[A-Za-z_][A-Za-z0-9_]*))").unwrap()
    })
}

/// A token's substitution value: a single string quoted as one shell word,
/// or a list whose elements are each quoted individually and joined by a
/// single space (not re-quoted as one word).
#[derive(Debug, Clone)]
pub enum TokenValue {
    Single(String),
    Many(Vec<String>),
}

impl TokenValue {
    fn render(&self) -> String {
        match self {
            TokenValue::Single(s) => shell_words::quote(s).into_owned(),
            TokenValue::Many(items) => items
                .iter()
                .map(|s| shell_words::quote(s).into_owned())
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ShebangTemplate {
    template: String,
}

impl ShebangTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Substitute `%name` / `%{name}` occurrences within one already
    /// shell-split word of the template, inserting each token's quoted
    /// rendering verbatim.
    fn substitute_into(&self, word: &str, tokens: &BTreeMap<String, TokenValue>) -> Result<String> {
        let re = token_regex();
        let mut out = String::with_capacity(word.len());
        let mut last = 0;
        for caps in re.captures_iter(word) {
            let whole = caps.get(0).unwrap();
            let name = caps
                .name("braced")
                .or_else(|| caps.name("bare"))
                .unwrap()
                .as_str();
            let value = tokens
                .get(name)
                .ok_or_else(|| anyhow::anyhow!("shebang template references unknown token {name:?}"))?;
            out.push_str(&word[last..whole.start()]);
            out.push_str(&value.render());
            last = whole.end();
        }
        out.push_str(&word[last..]);
        Ok(out)
    }

    /// Substitute every `%name`/`%{name}` occurrence with its quoted value
    /// (§4.7). The template is first split into shell words the same way
    /// the original source's `shlex.split` does, so a segment the template
    /// author quoted together (e.g. `'%e %p %a >/dev/null'`) stays one word
    /// after substitution: such a word is re-quoted as a whole once its
    /// tokens are filled in, so a multi-word token value inserted into it
    /// can't spill past the template's original word boundary. A word that
    /// was never quoted together in the template (e.g. a bare `%args`) is
    /// left as-is, so a `Many` token's elements stay separate shell words.
    pub fn substitute(&self, tokens: &BTreeMap<String, TokenValue>) -> Result<String> {
        let words = shell_words::split(&self.template).context("shebang template is not valid shell syntax")?;
        let mut rendered_words = Vec::with_capacity(words.len());
        for word in &words {
            let was_quoted_together = shell_words::split(word).map(|parts| parts.len() > 1).unwrap_or(false);
            let substituted = self.substitute_into(word, tokens)?;
            rendered_words.push(if was_quoted_together {
                shell_words::quote(&substituted).into_owned()
            } else {
                substituted
            });
        }
        Ok(rendered_words.join(" "))
    }
}
