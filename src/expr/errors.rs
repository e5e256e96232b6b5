//! Expression evaluation error types
//!
//! [`EvalError`] covers every way an already-lexed token sequence can fail
//! to produce a value; [`ExprError`] is the combined taxonomy the public
//! tokenize-then-evaluate entry point returns. All failures are carried as
//! `Result` values threaded through the recursion — the first error
//! short-circuits every enclosing call.

use crate::expr::eval::MAX_EVAL_DEPTH;
use crate::expr::lexer::LexError;
use std::fmt;

/// Errors produced while evaluating a token sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    /// A single-token range holds a token with no value interpretation.
    NoViableLeaf { token: String },

    /// A numeric literal does not fit in a 64-bit word.
    BadLiteral { text: String },

    /// No operator outside parentheses to split the range at.
    MissingOperator,

    /// Unbalanced parentheses in the range.
    MismatchedParens,

    /// Right operand of `/` evaluated to zero.
    DivisionByZero,

    /// Register reference the machine cannot resolve.
    UnknownRegister { name: String },

    /// Expression nesting exceeds the recursion bound.
    NestingTooDeep,
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::NoViableLeaf { token } => {
                write!(f, "token '{}' is not a value", token)
            }
            EvalError::BadLiteral { text } => {
                write!(f, "literal '{}' does not fit in 64 bits", text)
            }
            EvalError::MissingOperator => {
                write!(f, "malformed expression: no operator to split at")
            }
            EvalError::MismatchedParens => {
                write!(f, "mismatched parentheses")
            }
            EvalError::DivisionByZero => {
                write!(f, "division by zero")
            }
            EvalError::UnknownRegister { name } => {
                write!(f, "unknown register '${}'", name)
            }
            EvalError::NestingTooDeep => {
                write!(f, "expression nests deeper than {} levels", MAX_EVAL_DEPTH)
            }
        }
    }
}

impl std::error::Error for EvalError {}

/// Any failure from evaluating an expression string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprError {
    Lex(LexError),
    Eval(EvalError),
}

impl fmt::Display for ExprError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExprError::Lex(err) => fmt::Display::fmt(err, f),
            ExprError::Eval(err) => fmt::Display::fmt(err, f),
        }
    }
}

impl std::error::Error for ExprError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExprError::Lex(err) => Some(err),
            ExprError::Eval(err) => Some(err),
        }
    }
}

impl From<LexError> for ExprError {
    fn from(err: LexError) -> Self {
        ExprError::Lex(err)
    }
}

impl From<EvalError> for ExprError {
    fn from(err: EvalError) -> Self {
        ExprError::Eval(err)
    }
}
