//! # Introduction
//!
//! rsdb is the expression core of an interactive machine-level debugger:
//! it evaluates arithmetic/register expressions against a target machine's
//! state, and it keeps a registry of watched expressions that is re-checked
//! after every execution step to detect state changes.
//!
//! ## Evaluation pipeline
//!
//! ```text
//! Expression text → Lexer → Tokens → Evaluator → i64
//!                                        ↑
//!                       MachineState (registers, memory)
//! ```
//!
//! 1. [`expr`] — tokenises expression text with an ordered rule table and
//!    evaluates the token stream by recursive dominant-operator selection;
//!    no intermediate AST is built.
//! 2. [`machine`] — the collaborator seam: [`machine::MachineState`]
//!    supplies register and memory reads, [`machine::flat::FlatMachine`]
//!    is the built-in demo target.
//! 3. [`watch`] — fixed-capacity watchpoint pool; re-evaluates every
//!    stored expression after a step and reports the first change.
//! 4. [`shell`] — line-oriented monitor dispatching `p`, `w`, `d`, `x`,
//!    `si`, `c` and `info` onto the core.
//!
//! ## Expression grammar
//!
//! Decimal literals, `0x` hex literals, `$name` register references,
//! binary `+ - * / == != &&`, parentheses, and unary `*` as a 32-bit
//! memory dereference. Comparisons and `&&` evaluate to 0 or 1.

pub mod expr;
pub mod machine;
pub mod shell;
pub mod watch;
