//! Shared utilities: error enrichment and text truncation for diagnostics
//! (§2, "shared utilities"; §7 "Propagation policy").

use crate::location::Where;
use anyhow::{Context, Result};

/// Attach `where_`/`component` context to a failing `Result`, per the
/// propagation policy: "errors raised inside finder/parser operations are
/// enriched with the current `Where` and owner component identity, then
/// rethrown" (§7).
pub fn enrich<T>(result: Result<T>, where_: &Where, component: &str) -> Result<T> {
    result.with_context(|| format!("{component} at {where_}"))
}

/// Truncate `text` to at most `max_bytes` bytes without splitting a
/// multi-byte character, for bounding diagnostic/partial-output messages.
pub fn truncate_string(text: &str, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text.to_string();
    }
    let mut truncated = String::new();
    for ch in text.chars() {
        if truncated.len() + ch.len_utf8() > max_bytes {
            break;
        }
        truncated.push(ch);
    }
    truncated
}

pub fn truncate_bytes(bytes: &[u8], max_bytes: usize) -> String {
    truncate_string(&String::from_utf8_lossy(bytes), max_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enrich_adds_where_context_on_error() {
        let where_ = Where::new(3, 3, "doc.md");
        let result: Result<()> = Err(anyhow::anyhow!("boom"));
        let enriched = enrich(result, &where_, "parser");
        let message = format!("{:#}", enriched.unwrap_err());
        assert!(message.contains("parser at doc.md, lines 3-3"));
        assert!(message.contains("boom"));
    }

    #[test]
    fn truncate_string_keeps_whole_chars() {
        assert_eq!(truncate_string("héllo", 2), "h");
        assert_eq!(truncate_string("hi", 10), "hi");
    }
}
