//! Evaluation error types.
//!
//! Every variant is recoverable at the call site: the surrounding
//! application prompts the child to redraw the gesture instead of ending the
//! session. None of these errors change mastery state.

use thiserror::Error;

/// Errors raised by the trace model, reference generator, and evaluation engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScribeError {
    /// The user trace has too few points to be scored.
    #[error("trace too short: {points} point(s), at least {required} required")]
    InsufficientTrace { points: usize, required: usize },

    /// No reference shape exists for this letter.
    #[error("unknown letter: {0}")]
    UnknownLetter(String),

    /// The exercise or letter slot needed to build a reference does not exist.
    #[error("missing reference: {0}")]
    MissingReference(String),

    /// The reference trace cannot be resampled (too few points or zero length).
    #[error("degenerate reference: {0}")]
    DegenerateReference(String),

    /// Append/finalize misuse, or an operation on a trace in the wrong state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A trace was finalized without any points.
    #[error("trace has no points")]
    EmptyTrace,
}

impl ScribeError {
    /// Tag the UI renders next to the "try again" prompt.
    pub fn feedback_tag(&self) -> &'static str {
        match self {
            ScribeError::InsufficientTrace { .. } | ScribeError::EmptyTrace => "trace-too-short",
            ScribeError::UnknownLetter(_)
            | ScribeError::MissingReference(_)
            | ScribeError::DegenerateReference(_) => "exercise-unavailable",
            ScribeError::InvalidState(_) => "input-interrupted",
        }
    }

    /// Returns `true` if drawing the gesture again can succeed.
    ///
    /// Reference problems come from catalog data, so redrawing will not help.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ScribeError::InsufficientTrace { .. }
                | ScribeError::EmptyTrace
                | ScribeError::InvalidState(_)
        )
    }
}

/// Result alias for engine operations.
pub type Result<T> = std::result::Result<T, ScribeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_trace_maps_to_retry_tag() {
        let err = ScribeError::InsufficientTrace {
            points: 3,
            required: 5,
        };
        assert_eq!(err.feedback_tag(), "trace-too-short");
        assert!(err.is_retryable());
        assert_eq!(
            err.to_string(),
            "trace too short: 3 point(s), at least 5 required"
        );
    }

    #[test]
    fn reference_errors_are_not_retryable() {
        assert!(!ScribeError::UnknownLetter("ж".into()).is_retryable());
        assert!(!ScribeError::DegenerateReference("1 point".into()).is_retryable());
        assert_eq!(
            ScribeError::MissingReference("ex-9".into()).feedback_tag(),
            "exercise-unavailable"
        );
    }
}
