//! ExampleCandidate and Example (§3).

use crate::expected::Expected;
use crate::location::Where;
use crate::options::OptionScope;

/// Raw example emitted by a finder, before the parser has run. Mirrors the
/// "Example (not parsed yet)" state in the original source.
#[derive(Debug, Clone)]
pub struct ExampleCandidate {
    pub finder_id: &'static str,
    pub language: String,
    pub snippet: String,
    pub expected_text: String,
    pub indentation: String,
    pub where_: Where,
}

/// A fully-parsed example: immutable once produced by [`crate::parser`].
#[derive(Debug, Clone)]
pub struct Example {
    pub finder_id: &'static str,
    pub language: String,
    pub snippet: String,
    pub indentation: String,
    pub where_: Where,

    /// Final executable text; always ends with a newline.
    pub source: String,
    pub expected_str: String,
    pub expected: Expected,
    pub options: OptionScope,
}

impl ExampleCandidate {
    pub fn new(
        finder_id: &'static str,
        language: impl Into<String>,
        snippet: impl Into<String>,
        expected_text: impl Into<String>,
        indentation: impl Into<String>,
        where_: Where,
    ) -> Self {
        Self {
            finder_id,
            language: language.into(),
            snippet: snippet.into(),
            expected_text: expected_text.into(),
            indentation: indentation.into(),
            where_,
        }
    }
}
