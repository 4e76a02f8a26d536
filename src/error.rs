//! Fatal error taxonomy (§7). Discovery diagnostics are deliberately absent
//! here: they are non-fatal, logged via `tracing::warn!`, and never produce
//! an `Err`.

use crate::location::Where;
use thiserror::Error;

/// The fatal error taxonomy a caller needs to pattern-match on. Everything
/// else (I/O, malformed shebang templates, pty spawn failures) propagates as
/// `anyhow::Error` with context attached at each component boundary instead.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Type 1 overlap: two candidates share the same `start_lineno`.
    #[error("{first} and {second} start on the same line and overlap ambiguously")]
    AmbiguousOverlap { first: Where, second: Where },

    /// Type 3 overlap: partial, non-nesting overlap between two candidates.
    #[error("{first} and {second} partially overlap")]
    PartialOverlap { first: Where, second: Where },

    /// The finder's regex failed to re-match the snippet after indent
    /// normalization.
    #[error("self-recheck failed at {at}: {bytes_lost} bytes lost at the {end} end")]
    SelfRecheckFailed {
        at: Where,
        bytes_lost: usize,
        end: &'static str,
    },

    /// An option name or value was rejected under strict parsing.
    #[error("unrecognized option {name:?} at {at}")]
    UnrecognizedOption { name: String, at: Where },

    /// A `Runner::run`/`Runner::cancel` `expect` call exceeded its timeout.
    /// Carries whatever output was captured before the deadline so the
    /// caller can report a useful diff or attempt `cancel`.
    #[error("timed out waiting for the prompt at {at}")]
    Timeout { at: Where, partial_output: String },

    /// A failed `cancel()` (or an interpreter that exited unexpectedly)
    /// leaves the Runner unusable; the remaining examples for that language
    /// in the document must be skipped.
    #[error("runner for language {language:?} is broken: {reason}")]
    BrokenRunner { language: String, reason: String },
}
