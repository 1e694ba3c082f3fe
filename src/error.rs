//! Error types for regex2fsm.
//!
//! Uncertain equivalences and discarded session steps are not errors;
//! they are ordinary return values of the construction API.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, FsmError>;

#[derive(Error, Debug)]
pub enum FsmError {
    /// The input text is not a well-formed regular expression.
    #[error("invalid expression{}: {reason}", position_suffix(.position))]
    InvalidExpression {
        reason: String,
        /// Character offset of the offending symbol, when known.
        position: Option<usize>,
    },

    /// The parser returned before consuming every token.
    #[error("incomplete parse: unconsumed input at offset {position}")]
    IncompleteParse { position: usize },

    /// Contract violation by the caller (e.g. deriving by a foreign letter).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The rewriter or derivative engine reached an impossible shape.
    #[error("internal invariant violated: {0}")]
    InternalInvariantViolation(String),

    /// Construction produced more states than the configured limit.
    #[error("state limit of {0} exceeded")]
    StateLimitExceeded(usize),

    #[error("config error: {0}")]
    ConfigError(String),

    #[error("serialization error: {0}")]
    SerializeError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn position_suffix(position: &Option<usize>) -> String {
    match position {
        Some(p) => format!(" at offset {}", p),
        None => String::new(),
    }
}

impl FsmError {
    pub(crate) fn invalid(reason: impl Into<String>, position: Option<usize>) -> Self {
        FsmError::InvalidExpression {
            reason: reason.into(),
            position,
        }
    }

    pub(crate) fn invariant(msg: impl Into<String>) -> Self {
        FsmError::InternalInvariantViolation(msg.into())
    }

    /// True for errors caused by malformed user input.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            FsmError::InvalidExpression { .. } | FsmError::IncompleteParse { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_expression_display() {
        let err = FsmError::invalid("unbalanced parentheses", Some(3));
        assert_eq!(
            err.to_string(),
            "invalid expression at offset 3: unbalanced parentheses"
        );

        let err = FsmError::invalid("empty input", None);
        assert_eq!(err.to_string(), "invalid expression: empty input");
        assert!(err.is_user_error());
    }

    #[test]
    fn test_invariant_is_not_user_error() {
        let err = FsmError::invariant("union without members");
        assert!(!err.is_user_error());
        assert!(err.to_string().contains("union without members"));
    }
}
