//! Typed errors surfaced at the engine boundary.
//!
//! Numeric evaluation failures and malformed options are fatal: the solve
//! aborts and returns a [`SolverError`] to the caller rather than retrying.
//! Internal consistency violations (an unreachable enum arm, a corrupted
//! index) are Rust panics, not `Result::Err` — see `spec.md` §7 and §9.

/// Errors that can escape a solve.
#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    /// An internal invariant was violated. Indicates an engine bug rather
    /// than a problem with caller-supplied input.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// A caller-supplied option value is out of range or otherwise
    /// inconsistent. Detected at setup time, before any search runs.
    #[error("invalid option: {0}")]
    UserInputError(String),

    /// A NaN or infinite value was produced while evaluating an objective,
    /// expression, or penalty.
    #[error("numeric error: {0}")]
    NumericError(String),
}

/// Convenience alias used throughout the crate.
pub type SolverResult<T> = Result<T, SolverError>;
