//! Debugger expression pipeline
//!
//! This module turns expression text into a signed 64-bit value:
//! - [`lexer`]: Tokenization (ordered-rule, first-match-wins)
//! - [`eval`]: Evaluation (dominant-operator recursion, no AST)
//! - [`errors`]: Lex/eval error taxonomy
//!
//! # Grammar
//!
//! Decimal literals, `0x` hex literals, `$name` register references,
//! binary `+ - * / == != &&`, parentheses, and unary `*` as a 32-bit
//! memory dereference. Comparisons and `&&` evaluate to 0 or 1.
//!
//! The whole pipeline is a pure function of the input text and the
//! [`crate::machine::MachineState`] it reads from; no state survives a
//! call to [`eval::evaluate`].

pub mod errors;
pub mod eval;
pub mod lexer;
