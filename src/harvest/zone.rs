//! ZoneDelimiter (§4.1): splits a document into zero or more zones in which
//! examples may live.

use crate::location::Where;

/// A contiguous region of a document in which examples may appear.
#[derive(Debug, Clone)]
pub struct Zone {
    pub text: String,
    pub where_: Where,
    pub delimiter_id: String,
}

/// Contract: given a document string, return zones covering disjoint
/// substrings, each tagged with its absolute (1-based) line span.
pub trait ZoneDelimiter {
    /// Stable identifier used in diagnostics and `Where::zone_delimiter_id`.
    fn id(&self) -> &'static str;

    fn zones(&self, document: &str, filepath: &str) -> Vec<Zone>;
}

/// The default delimiter: the whole document is a single zone.
#[derive(Debug, Default)]
pub struct NoDelimiter;

impl ZoneDelimiter for NoDelimiter {
    fn id(&self) -> &'static str {
        "no-delimiter"
    }

    fn zones(&self, document: &str, filepath: &str) -> Vec<Zone> {
        let end_lineno = document.lines().count().max(1);
        vec![Zone {
            text: document.to_string(),
            where_: Where::new(1, end_lineno, filepath).with_zone_delimiter_id(self.id()),
            delimiter_id: self.id().to_string(),
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_delimiter_yields_one_zone_covering_the_document() {
        let doc = "line one\nline two\nline three\n";
        let zones = NoDelimiter.zones(doc, "doc.md");
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].text, doc);
        assert_eq!(zones[0].where_.start_lineno, 1);
        assert_eq!(zones[0].where_.end_lineno, 3);
    }
}
