//! Source-span bookkeeping shared by zones, candidates, and examples.

use std::fmt;

/// A 1-based, inclusive line span within a single document.
///
/// Created at match time and immutable afterwards, except that the indent
/// normalizer in [`crate::harvest::finder`] may shrink `end_lineno` when it
/// truncates a snippet at a ragged indentation line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Where {
    pub start_lineno: usize,
    pub end_lineno: usize,
    pub filepath: String,
    pub zone_delimiter_id: Option<String>,
}

impl Where {
    pub fn new(start_lineno: usize, end_lineno: usize, filepath: impl Into<String>) -> Self {
        Self {
            start_lineno,
            end_lineno,
            filepath: filepath.into(),
            zone_delimiter_id: None,
        }
    }

    pub fn with_zone_delimiter_id(mut self, id: impl Into<String>) -> Self {
        self.zone_delimiter_id = Some(id.into());
        self
    }
}

impl fmt::Display for Where {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, lines {}-{}",
            self.filepath, self.start_lineno, self.end_lineno
        )
    }
}
