//! Error types for the restriction language.

use thiserror::Error;

/// Errors raised while compiling a restriction expression.
///
/// These describe a broken command definition, not bad user input: a
/// restriction that cannot be compiled will fail the same way for every
/// message that reaches it.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum RestrictionError {
    /// One OR-term of a numeric expression could not be parsed.
    #[error("the condition {condition:?} in {expression:?} is not valid")]
    InvalidCondition {
        /// The offending term, after whitespace stripping.
        condition: String,
        /// The full expression the term came from.
        expression: String,
    },

    /// An operand literal did not fit the numeric range.
    #[error("the operand {0:?} is out of range")]
    OperandOutOfRange(String),

    /// The expression is not a valid regular expression.
    #[error("invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        /// The pattern as compiled (including anchors added for whole-string matching).
        pattern: String,
        /// The underlying regex error.
        #[source]
        source: regex::Error,
    },

    /// A converter that only works with a restriction was given none.
    #[error("{0} parameters must have a regex restriction to match against")]
    Missing(String),
}

impl RestrictionError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidCondition { .. } => "invalid_condition",
            Self::OperandOutOfRange(_) => "operand_out_of_range",
            Self::InvalidPattern { .. } => "invalid_pattern",
            Self::Missing(_) => "missing_restriction",
        }
    }
}
