//! Error types for the evaluator.

use thiserror::Error;

/// Result type for evaluator operations.
pub type Result<T> = std::result::Result<T, EvalError>;

/// Error type for evaluator operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum EvalError {
    /// Span fields violate the pairing or ordering invariant.
    #[error(
        "invalid span (start_token={start_token}, end_token={end_token}, \
         start_byte={start_byte}, end_byte={end_byte}): {reason}"
    )]
    InvalidSpan {
        start_token: i64,
        end_token: i64,
        start_byte: i64,
        end_byte: i64,
        reason: &'static str,
    },

    /// A record is missing fields or carries out-of-range values.
    #[error("malformed record for example {example_id}: {reason}")]
    MalformedRecord { example_id: String, reason: String },

    /// `yes_no_answer` outside `{yes, no, none}`.
    #[error("unknown yes_no_answer value {0:?}")]
    UnknownVerdict(String),

    /// A gold example has no matching prediction.
    #[error("no prediction for example {0}")]
    MissingPrediction(String),

    /// Accepted gold examples disagree on the number of raters.
    #[error("inconsistent rater counts across the gold set: {0:?}")]
    InconsistentRaterCounts(Vec<usize>),

    /// Nothing left to evaluate.
    #[error("gold set is empty")]
    EmptyGoldSet,

    /// Configuration rejected by validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A global logger was already installed.
    #[error("logger setup failed: {0}")]
    Logger(#[from] log::SetLoggerError),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EvalError {
    /// Create a malformed record error.
    pub fn malformed(example_id: impl Into<String>, reason: impl Into<String>) -> Self {
        EvalError::MalformedRecord {
            example_id: example_id.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        EvalError::InvalidConfig(msg.into())
    }

    /// True for errors that only reject a single example.
    pub fn is_per_example(&self) -> bool {
        matches!(
            self,
            EvalError::InvalidSpan { .. }
                | EvalError::MalformedRecord { .. }
                | EvalError::UnknownVerdict(_)
                | EvalError::MissingPrediction(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_example_errors() {
        assert!(EvalError::malformed("1", "no annotations").is_per_example());
        assert!(EvalError::UnknownVerdict("maybe".into()).is_per_example());
        assert!(EvalError::MissingPrediction("1".into()).is_per_example());

        assert!(!EvalError::EmptyGoldSet.is_per_example());
        assert!(!EvalError::InconsistentRaterCounts(vec![1, 5]).is_per_example());
        assert!(!EvalError::invalid_config("bad").is_per_example());
    }
}
