//! Macro preprocessing errors.

use thiserror::Error;

use super::expr::EvalError;

/// Result type for macro substitution.
pub type MacroResult<T> = Result<T, MacroError>;

#[derive(Debug, Error)]
pub enum MacroError {
    /// A dynamic date literal doesn't follow `:YYYYMMDD-N`, `:YYYYMM-N` or `:YYYY-N`.
    #[error("Macro {name} has incorrect format '{value}', expected :YYYYMMDD-1, or :YYYYMM-1, or :YYYY-1")]
    Format { name: String, value: String },

    /// A dynamic date literal shifts the date out of the supported range.
    #[error("Macro {name} resolves to a date out of range ('{value}')")]
    DateOutOfRange { name: String, value: String },

    /// A `${...}` block failed to parse or evaluate.
    #[error("failed to evaluate expression '${{{expr}}}': {source}")]
    Expression {
        expr: String,
        #[source]
        source: EvalError,
    },
}
