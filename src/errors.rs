//! Failure kinds surfaced by the parsing entry points.
//!
//! Diffing and matching cannot fail: a diff that runs out of time
//! degrades to a trivial edit script, and a match that finds nothing is
//! `None`. Patch application reports per-hunk misses in its boolean
//! results instead of erroring. What remains is parsing: deltas, hunk
//! texts and percent escapes.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// A delta token had an unknown opcode or an unparsable length.
    #[error("malformed delta token: {0:?}")]
    MalformedDelta(String),

    /// A percent escape was truncated, not hexadecimal, or decoded to
    /// invalid UTF-8.
    #[error("invalid percent escape in {0:?}")]
    BadEscape(String),

    /// A delta consumed a different number of source characters than
    /// the source text contains.
    #[error("delta covers {consumed} source characters, text has {expected}")]
    DeltaLengthMismatch { consumed: usize, expected: usize },

    /// A hunk header or body line did not match the patch text format.
    #[error("malformed patch line: {0:?}")]
    MalformedPatch(String),
}
