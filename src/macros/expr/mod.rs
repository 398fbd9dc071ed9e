//! Embedded expression language for `${...}` macro blocks.
//!
//! A closed, sandboxed grammar: arithmetic, comparison, boolean logic, a
//! ternary, a fixed function set and read-only access to macro values by
//! name. See [`parser`] for the grammar.

pub mod eval;
pub mod lexer;
pub mod parser;

use std::fmt;

use chumsky::error::Rich;
use thiserror::Error;

pub use eval::{EvalContext, Value};
pub use parser::{BinaryOp, Expr, UnaryOp};

/// Result type for expression parsing and evaluation.
pub type EvalResult<T> = Result<T, EvalError>;

#[derive(Debug, Error, PartialEq)]
pub enum EvalError {
    /// Lexing or parsing failed at byte `offset` of the expression.
    #[error("syntax error at offset {offset}: {message}")]
    Syntax { message: String, offset: usize },

    #[error("undefined symbol '{0}'")]
    UnknownVariable(String),

    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("function {function} expects {expected} argument(s), got {found}")]
    Arity {
        function: String,
        expected: &'static str,
        found: usize,
    },

    #[error("cannot apply '{op}' to {found}")]
    TypeMismatch { op: String, found: &'static str },

    #[error("division by zero")]
    DivisionByZero,

    #[error("date out of range")]
    DateOutOfRange,
}

/// Parse an expression without evaluating it.
pub fn parse(source: &str) -> EvalResult<Expr> {
    let tokens = lexer::lex(source)?;
    parser::parse_tokens(&tokens, source.len())
}

/// Parse and evaluate an expression.
pub fn evaluate(source: &str, ctx: &EvalContext<'_>) -> EvalResult<Value> {
    let expr = parse(source)?;
    ctx.eval(&expr)
}

/// Report the first lexer or parser error.
fn syntax_error<'a, T>(errors: Vec<Rich<'a, T>>) -> EvalError
where
    Rich<'a, T>: fmt::Display,
{
    match errors.first() {
        Some(error) => EvalError::Syntax {
            message: error.to_string(),
            offset: error.span().start,
        },
        None => EvalError::Syntax {
            message: "invalid expression".to_string(),
            offset: 0,
        },
    }
}
