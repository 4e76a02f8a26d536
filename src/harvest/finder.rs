//! Finder (§4.2): locates raw examples inside a zone via a regex with named
//! groups `indent`, `snippet`, `expected`, then normalizes indentation and
//! re-validates the result against itself.

use crate::error::CoreError;
use crate::harvest::example::ExampleCandidate;
use crate::location::Where;
use crate::options::OptionStack;
use fancy_regex::Regex;

/// One match of a finder's regex against zone text, with an absolute
/// (document-relative) starting line number for the match.
pub struct FinderMatch<'t> {
    /// The whole match (`indent` + `snippet` + `expected` concatenated).
    pub whole: &'t str,
    pub indent: &'t str,
    pub snippet: &'t str,
    pub expected: &'t str,
    /// Byte offset of the match start within the zone text.
    pub start_byte: usize,
    /// 1-based line number of the match start, relative to the document.
    pub start_lineno: usize,
}

/// Contract: expose a regex over zone text with named groups `indent`,
/// `snippet`, `expected`, and classify the language of a match.
pub trait Finder {
    fn id(&self) -> &'static str;

    /// The regex with the `indent`/`snippet`/`expected` named groups.
    fn regex(&self) -> &Regex;

    /// `language_of(options, indent, snippet) -> language_id | None`.
    /// Returning `None` means the caller should drop the candidate with a
    /// diagnostic.
    fn language_of(&self, options: &OptionStack, indent: &str, snippet: &str) -> Option<String>;

    /// Scan `text` (one zone) and return matches in order, each carrying an
    /// absolute line number computed from `zone_start_lineno`.
    fn matches<'t>(&self, text: &'t str, zone_start_lineno: usize) -> Vec<FinderMatch<'t>> {
        let re = self.regex();
        let mut out = Vec::new();
        for caps in re.captures_iter(text).flatten() {
            let whole = caps.get(0).expect("group 0 always matches");
            let indent = caps.name("indent").map(|m| m.as_str()).unwrap_or("");
            let snippet = caps.name("snippet").map(|m| m.as_str()).unwrap_or("");
            let expected = caps.name("expected").map(|m| m.as_str()).unwrap_or("");
            let start_lineno = zone_start_lineno + text[..whole.start()].matches('\n').count();
            out.push(FinderMatch {
                whole: whole.as_str(),
                indent,
                snippet,
                expected,
                start_byte: whole.start(),
                start_lineno,
            });
        }
        out
    }

    /// Perform indent normalization (over the whole match, snippet +
    /// expected together, per §4.2) and the self-recheck, returning the
    /// normalized `(snippet, expected)` and the (possibly shrunk) `Where`.
    /// Finders that need to post-process the snippet (stripping prompt
    /// markers, say) should call [`normalize_and_recheck`] directly rather
    /// than overriding this default.
    fn snippet_and_expected(
        &self,
        m: &FinderMatch<'_>,
        where_: Where,
    ) -> Result<(String, String, Where), CoreError> {
        normalize_and_recheck(self, m, where_)
    }
}

/// Shared body of the default `snippet_and_expected`: normalize indentation
/// over the whole match, then re-apply `finder`'s regex to validate it.
pub fn normalize_and_recheck(
    finder: &(impl Finder + ?Sized),
    m: &FinderMatch<'_>,
    where_: Where,
) -> Result<(String, String, Where), CoreError> {
    let (normalized_whole, new_end_lineno) = normalize_indent(m.whole, m.indent, &where_)?;
    let mut where_ = where_;
    where_.end_lineno = new_end_lineno;

    let caps = self_recheck(finder.regex(), &normalized_whole, &where_)?;
    let snippet = caps.name("snippet").map(|c| c.as_str()).unwrap_or("").to_string();
    let expected = caps.name("expected").map(|c| c.as_str()).unwrap_or("").to_string();

    Ok((snippet, expected, where_))
}

/// Strip the finder-captured `indent` prefix from every line of `text` (the
/// whole match: snippet + expected). Blank lines are kept verbatim. A line
/// that does not begin with `indent` truncates the text at the previous
/// line and shrinks `where.end_lineno` accordingly (§4.2).
fn normalize_indent(text: &str, indent: &str, where_: &Where) -> Result<(String, usize), CoreError> {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut kept = Vec::with_capacity(lines.len());
    let mut end_lineno = where_.start_lineno;

    for (i, line) in lines.iter().enumerate() {
        if line.is_empty() {
            kept.push(*line);
            end_lineno = where_.start_lineno + i;
            continue;
        }
        match line.strip_prefix(indent) {
            Some(rest) => {
                kept.push(rest);
                end_lineno = where_.start_lineno + i;
            }
            None => {
                kept.truncate(i);
                break;
            }
        }
    }

    if kept.is_empty() {
        return Err(CoreError::SelfRecheckFailed {
            at: where_.clone(),
            bytes_lost: text.len(),
            end: "whole",
        });
    }

    Ok((kept.join("\n"), end_lineno))
}

/// Re-apply `re` to `normalized`; it must match from offset 0 to the end.
/// Returns the fresh captures so the caller can re-extract `snippet`/
/// `expected` from the (possibly truncated) text.
fn self_recheck<'t>(
    re: &Regex,
    normalized: &'t str,
    where_: &Where,
) -> Result<fancy_regex::Captures<'t>, CoreError> {
    match re.captures(normalized) {
        Ok(Some(caps)) => {
            let m = caps.get(0).expect("group 0 always matches");
            if m.start() == 0 && m.end() == normalized.len() {
                Ok(caps)
            } else if m.start() == 0 {
                Err(CoreError::SelfRecheckFailed {
                    at: where_.clone(),
                    bytes_lost: normalized.len() - m.end(),
                    end: "end",
                })
            } else {
                Err(CoreError::SelfRecheckFailed {
                    at: where_.clone(),
                    bytes_lost: m.start(),
                    end: "start",
                })
            }
        }
        Ok(None) | Err(_) => Err(CoreError::SelfRecheckFailed {
            at: where_.clone(),
            bytes_lost: normalized.len(),
            end: "whole",
        }),
    }
}

/// Turn every match a finder produced in one zone into candidates, applying
/// the language classifier. A `None` language drops the candidate (logged);
/// any other error is a self-recheck failure and is fatal for the example.
pub fn candidates_in_zone(
    finder: &dyn Finder,
    zone_text: &str,
    zone_start_lineno: usize,
    filepath: &str,
    options: &OptionStack,
) -> Vec<Result<ExampleCandidate, CoreError>> {
    let mut out = Vec::new();
    for m in finder.matches(zone_text, zone_start_lineno) {
        let end_lineno =
            zone_start_lineno + zone_text[..m.start_byte].matches('\n').count() + m.whole.matches('\n').count();
        let where_ = Where::new(m.start_lineno, end_lineno, filepath);

        let language = match finder.language_of(options, m.indent, m.snippet) {
            Some(language) => language,
            None => {
                tracing::warn!(at = %where_, finder = finder.id(), "language undefined, dropping candidate");
                continue;
            }
        };

        match finder.snippet_and_expected(&m, where_.clone()) {
            Ok((snippet, expected, where_)) => out.push(Ok(ExampleCandidate::new(
                finder.id(),
                language,
                snippet,
                expected,
                m.indent.to_string(),
                where_,
            ))),
            Err(e) => out.push(Err(e)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_common_indent_from_every_line() {
        let where_ = Where::new(1, 1, "doc.md");
        let text = "   $ echo hi\n   more\n   lines";
        let (normalized, end) = normalize_indent(text, "   ", &where_).unwrap();
        assert_eq!(normalized, "$ echo hi\nmore\nlines");
        assert_eq!(end, 3);
    }

    #[test]
    fn normalize_keeps_blank_lines() {
        let where_ = Where::new(1, 1, "doc.md");
        let text = "   $ echo hi\n\n   more";
        let (normalized, end) = normalize_indent(text, "   ", &where_).unwrap();
        assert_eq!(normalized, "$ echo hi\n\nmore");
        assert_eq!(end, 2);
    }

    #[test]
    fn normalize_truncates_at_ragged_indentation() {
        let where_ = Where::new(10, 10, "doc.md");
        let text = "   $ echo hi\n   more\nnotindented";
        let (normalized, end) = normalize_indent(text, "   ", &where_).unwrap();
        assert_eq!(normalized, "$ echo hi\nmore");
        assert_eq!(end, 11);
    }

    #[test]
    fn normalize_idempotent() {
        let where_ = Where::new(1, 1, "doc.md");
        let text = "   $ echo hi\n   more\n   lines";
        let (once, _) = normalize_indent(text, "   ", &where_).unwrap();
        let (twice, _) = normalize_indent(&once, "", &where_).unwrap();
        assert_eq!(once, twice);
    }
}
