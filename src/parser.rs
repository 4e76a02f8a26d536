//! Parser (§4.3): per-language contract that extracts per-example options,
//! normalizes snippet/expected text, and compiles the expected-output regex.

use crate::error::CoreError;
use crate::expected::compile_expected;
use crate::harvest::example::{Example, ExampleCandidate};
use crate::location::Where;
use crate::options::{OptionScope, OptionStack, OptionValue};
use crate::util::enrich;
use anyhow::Result;

/// Option names every Parser recognizes out of the box (SPEC_FULL §A.3).
/// A language's `known_options` extends this list rather than replacing it.
pub const CORE_KNOWN_OPTIONS: &[&str] = &[
    "norm_ws",
    "tags",
    "rm",
    "timeout",
    "geometry",
    "term",
    "x.dfl_timeout",
    "x.delaybeforesend",
    "stop_on_timeout",
    "stop_on_silence",
];

/// Option names that accumulate into an `OptionValue::List` across repeated
/// `+name=value` tokens instead of being overwritten by the last occurrence.
pub const CORE_LIST_OPTIONS: &[&str] = &["rm"];

/// Contract per language (§4.3).
pub trait Parser: Send + Sync {
    fn language(&self) -> &'static str;

    /// A regex with a single capture extracting the raw options string from
    /// the snippet (typically a `byexample: ...` comment).
    fn options_string_regex(&self) -> &regex::Regex;

    /// Tokenize the raw options string. POSIX-shell rules by default.
    fn options_as_list(&self, raw: &str) -> Result<Vec<String>> {
        Ok(shell_words::split(raw)?)
    }

    /// Option names this parser recognizes; anything else is a
    /// `CoreError::UnrecognizedOption` under strict parsing (§7).
    fn known_options(&self) -> &'static [&'static str] {
        CORE_KNOWN_OPTIONS
    }

    /// Option names that accumulate into a list rather than being
    /// overwritten by the last occurrence (e.g. `rm`).
    fn list_option_names(&self) -> &'static [&'static str] {
        CORE_LIST_OPTIONS
    }

    /// Parse the tokenized option list into a scope, applying any
    /// language-specific flags (`extend_option_parser` in the original).
    /// The default implementation validates every token's name against
    /// [`Self::known_options`] and accumulates [`Self::list_option_names`]
    /// into lists.
    fn parse_option_tokens(&self, tokens: &[String], at: &Where) -> Result<OptionScope> {
        default_parse_option_tokens(tokens, self.known_options(), self.list_option_names(), at)
    }

    /// Final normalization of the snippet/expected pair: by default ensures
    /// `source` ends with a newline and an absent `expected` becomes `""`.
    fn process_snippet_and_expected(&self, snippet: &str, expected: &str) -> (String, String) {
        let mut source = snippet.to_string();
        if !source.ends_with('\n') {
            source.push('\n');
        }
        (source, expected.to_string())
    }

    /// Run the full parse pipeline (§4.3 steps 1-5) for one candidate,
    /// leaving the stack balanced on every exit path.
    fn parse(&self, candidate: ExampleCandidate, stack: &mut OptionStack) -> Result<Example> {
        let optstring = self
            .options_string_regex()
            .captures(&candidate.snippet)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();
        let tokens = enrich(self.options_as_list(&optstring), &candidate.where_, self.language())?;
        let local_options = enrich(
            self.parse_option_tokens(&tokens, &candidate.where_),
            &candidate.where_,
            self.language(),
        )?;

        let _guard = stack.push_scope(local_options.clone());

        let (source, mut expected_str) =
            self.process_snippet_and_expected(&candidate.snippet, &candidate.expected_text);

        for needle in stack.get_list("rm") {
            expected_str = expected_str.replace(needle, "");
        }

        let tags_enabled = stack.get_bool("tags");
        let norm_ws = stack.get_bool("norm_ws");

        let expected = compile_expected(&expected_str, tags_enabled, norm_ws);

        Ok(Example {
            finder_id: candidate.finder_id,
            language: candidate.language,
            snippet: candidate.snippet,
            indentation: candidate.indentation,
            where_: candidate.where_,
            source,
            expected_str,
            expected,
            options: local_options,
        })
    }
}

/// Default strict tokenizer for `+name`, `-name`, `+name=value` tokens:
/// rejects any `name` outside `known`, and accumulates repeated
/// `+name=value` tokens into an `OptionValue::List` for every `name` in
/// `list_names` instead of letting the last one win.
pub fn default_parse_option_tokens(
    tokens: &[String],
    known: &[&str],
    list_names: &[&str],
    at: &Where,
) -> Result<OptionScope> {
    let mut scope = OptionScope::new();
    for token in tokens {
        if let Some(rest) = token.strip_prefix('+') {
            let (name, value) = match rest.split_once('=') {
                Some((name, value)) => (name, Some(value)),
                None => (rest, None),
            };
            if !known.contains(&name) {
                return Err(CoreError::UnrecognizedOption {
                    name: name.to_string(),
                    at: at.clone(),
                }
                .into());
            }
            if list_names.contains(&name) {
                let item = value.unwrap_or_default().to_string();
                let items = match scope.get(name) {
                    Some(OptionValue::List(existing)) => {
                        let mut items = existing.clone();
                        items.push(item);
                        items
                    }
                    _ => vec![item],
                };
                scope.set(name.to_string(), OptionValue::List(items));
            } else if let Some(value) = value {
                scope.set(name.to_string(), OptionValue::Str(value.to_string()));
            } else {
                scope.set(name.to_string(), OptionValue::Bool(true));
            }
        } else if let Some(name) = token.strip_prefix('-') {
            if !known.contains(&name) {
                return Err(CoreError::UnrecognizedOption {
                    name: name.to_string(),
                    at: at.clone(),
                }
                .into());
            }
            scope.set(name.to_string(), OptionValue::Bool(false));
        }
    }
    Ok(scope)
}
