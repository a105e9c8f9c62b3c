use std::time::Duration;

use crate::codec::ValueKind;

/// Errors from acquiring clipboard access with a bounded retry policy.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The single permitted attempt was refused.
    #[error("clipboard access denied (os error {code})")]
    AccessDenied { code: u32 },

    /// Every attempt within the timeout was refused.
    #[error("clipboard still busy after {timeout:?} ({attempts} attempts)")]
    Timeout { timeout: Duration, attempts: u32 },
}

/// Errors from converting clipboard text into typed values.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CodecError {
    /// The text is not a valid value of the requested kind.
    #[error("cannot parse {input:?} as {kind}: {reason}")]
    Parse {
        kind: ValueKind,
        input: String,
        reason: String,
    },

    /// Integer radix outside 2..=36.
    #[error("unsupported radix {0} (expected 2..=36)")]
    InvalidRadix(u32),
}

pub type Result<T> = std::result::Result<T, SessionError>;
