//! Expression evaluator
//!
//! Consumes a token sequence by recursion over subslices: strip a redundant
//! parenthesis wrap, locate the dominant operator at parenthesis depth
//! zero, split there and recurse. There is no AST — the token slice is the
//! only structure, and every sub-expression is a bounds-checked view into
//! it.
//!
//! Before recursion starts, a single pre-pass reclassifies `*` tokens in
//! operand position as unary memory dereference. Register and memory reads
//! go through the [`MachineState`] collaborator; the evaluator owns no
//! machine state of its own.

use crate::expr::errors::{EvalError, ExprError};
use crate::expr::lexer::{Lexer, Token, TokenKind};
use crate::machine::{MachineState, WORD_BYTES};

/// Recursion bound for nested expressions.
pub const MAX_EVAL_DEPTH: usize = 512;

/// Evaluate an expression string against a machine's current state.
///
/// This is the combined entry point the shell and the watchpoint registry
/// use: tokenize, reclassify unary `*`, then evaluate the full range.
pub fn evaluate<M: MachineState + ?Sized>(text: &str, machine: &M) -> Result<i64, ExprError> {
    let mut tokens = Lexer::new(text).tokenize()?;
    mark_unary_derefs(&mut tokens);
    Ok(eval_slice(&tokens, machine, 0)?)
}

/// Reclassify `*` tokens in operand position as unary dereference.
///
/// A `*` is a dereference when the expression starts with it or when the
/// preceding token cannot end an operand (another operator, or `(`).
pub fn mark_unary_derefs(tokens: &mut [Token]) {
    for i in 0..tokens.len() {
        if tokens[i].kind == TokenKind::Star && (i == 0 || !ends_operand(tokens[i - 1].kind)) {
            tokens[i].kind = TokenKind::Deref;
        }
    }
}

fn ends_operand(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Decimal | TokenKind::Hex | TokenKind::Register | TokenKind::RParen
    )
}

/// Evaluate one token range. Empty ranges are the implicit operand of a
/// unary split and yield 0; they are never a user-visible final answer.
pub fn eval_slice<M: MachineState + ?Sized>(
    tokens: &[Token],
    machine: &M,
    depth: usize,
) -> Result<i64, EvalError> {
    if depth > MAX_EVAL_DEPTH {
        return Err(EvalError::NestingTooDeep);
    }

    match tokens {
        [] => Ok(0),
        [token] => eval_leaf(token, machine),
        _ if wrapped_in_parens(tokens) => {
            eval_slice(&tokens[1..tokens.len() - 1], machine, depth + 1)
        }
        _ => {
            let at = find_dominant(tokens)?;
            if tokens[at].kind == TokenKind::Deref {
                let addr = eval_slice(&tokens[at + 1..], machine, depth + 1)?;
                return Ok(machine.read_word(addr as u64, WORD_BYTES) as i64);
            }
            let lhs = eval_slice(&tokens[..at], machine, depth + 1)?;
            let rhs = eval_slice(&tokens[at + 1..], machine, depth + 1)?;
            apply(tokens[at].kind, lhs, rhs)
        }
    }
}

/// Interpret a singleton range as a value.
fn eval_leaf<M: MachineState + ?Sized>(token: &Token, machine: &M) -> Result<i64, EvalError> {
    match token.kind {
        TokenKind::Decimal => token
            .text
            .parse::<u64>()
            .map(|value| value as i64)
            .map_err(|_| EvalError::BadLiteral {
                text: token.text.clone(),
            }),
        TokenKind::Hex => u64::from_str_radix(&token.text[2..], 16)
            .map(|value| value as i64)
            .map_err(|_| EvalError::BadLiteral {
                text: token.text.clone(),
            }),
        TokenKind::Register => {
            let name = &token.text[1..];
            machine
                .read_register(name)
                .ok_or_else(|| EvalError::UnknownRegister {
                    name: name.to_string(),
                })
        }
        _ => Err(EvalError::NoViableLeaf {
            token: token.text.clone(),
        }),
    }
}

/// True when the range is `( inner )` with the final `)` matching the
/// first `(`: the depth counter must stay positive until the last token.
fn wrapped_in_parens(tokens: &[Token]) -> bool {
    if tokens.len() < 2
        || tokens[0].kind != TokenKind::LParen
        || tokens[tokens.len() - 1].kind != TokenKind::RParen
    {
        return false;
    }
    let mut depth = 0i32;
    for token in &tokens[..tokens.len() - 1] {
        match token.kind {
            TokenKind::LParen => depth += 1,
            TokenKind::RParen => depth -= 1,
            _ => {}
        }
        if depth <= 0 {
            return false;
        }
    }
    true
}

/// Selection priority for the dominant-operator scan. Lower binds looser
/// and is preferred as the split point.
fn selection_class(kind: TokenKind) -> Option<u8> {
    match kind {
        TokenKind::AndAnd => Some(0),
        TokenKind::EqEq | TokenKind::NotEq => Some(1),
        TokenKind::Plus | TokenKind::Minus => Some(2),
        TokenKind::Star | TokenKind::Slash => Some(3),
        TokenKind::Deref => Some(4),
        _ => None,
    }
}

/// Locate the operator the range splits at.
///
/// Scan right to left with a parenthesis depth counter, skipping tokens
/// inside parens, and keep the loosest-binding operator seen. Ties within
/// a class keep the first occurrence found (the rightmost — left
/// associativity), except dereference, which keeps the last found (the
/// leftmost), since it is a prefix operator.
fn find_dominant(tokens: &[Token]) -> Result<usize, EvalError> {
    let mut depth = 0i32;
    let mut best: Option<(u8, usize)> = None;

    for (i, token) in tokens.iter().enumerate().rev() {
        match token.kind {
            TokenKind::RParen => depth += 1,
            TokenKind::LParen => {
                depth -= 1;
                if depth < 0 {
                    return Err(EvalError::MismatchedParens);
                }
            }
            _ if depth != 0 => {}
            kind => {
                if let Some(class) = selection_class(kind) {
                    let replace = match best {
                        None => true,
                        Some((held, _)) => {
                            class < held || (class == held && kind == TokenKind::Deref)
                        }
                    };
                    if replace {
                        best = Some((class, i));
                    }
                }
            }
        }
    }

    if depth != 0 {
        return Err(EvalError::MismatchedParens);
    }
    match best {
        Some((_, at)) => Ok(at),
        None => Err(EvalError::MissingOperator),
    }
}

/// Combine two operand values. Arithmetic wraps at 64 bits; division
/// truncates toward zero; comparisons and `&&` yield 0 or 1.
fn apply(kind: TokenKind, lhs: i64, rhs: i64) -> Result<i64, EvalError> {
    match kind {
        TokenKind::Plus => Ok(lhs.wrapping_add(rhs)),
        TokenKind::Minus => Ok(lhs.wrapping_sub(rhs)),
        TokenKind::Star => Ok(lhs.wrapping_mul(rhs)),
        TokenKind::Slash => {
            if rhs == 0 {
                Err(EvalError::DivisionByZero)
            } else {
                Ok(lhs.wrapping_div(rhs))
            }
        }
        TokenKind::EqEq => Ok((lhs == rhs) as i64),
        TokenKind::NotEq => Ok((lhs != rhs) as i64),
        TokenKind::AndAnd => Ok((lhs != 0 && rhs != 0) as i64),
        _ => unreachable!("dominant token is always an operator"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashMap;

    struct StubMachine {
        registers: FxHashMap<String, i64>,
        memory: FxHashMap<u64, u64>,
    }

    impl StubMachine {
        fn new() -> Self {
            Self {
                registers: FxHashMap::default(),
                memory: FxHashMap::default(),
            }
        }

        fn with_register(mut self, name: &str, value: i64) -> Self {
            self.registers.insert(name.to_string(), value);
            self
        }

        fn with_word(mut self, addr: u64, value: u64) -> Self {
            self.memory.insert(addr, value);
            self
        }
    }

    impl MachineState for StubMachine {
        fn read_register(&self, name: &str) -> Option<i64> {
            self.registers.get(name).copied()
        }

        fn read_word(&self, addr: u64, width: u32) -> u64 {
            let word = self.memory.get(&addr).copied().unwrap_or(0);
            if width >= 8 {
                word
            } else {
                word & ((1u64 << (8 * width)) - 1)
            }
        }

        fn registers(&self) -> Vec<(String, i64)> {
            Vec::new()
        }
    }

    fn eval(text: &str) -> Result<i64, ExprError> {
        evaluate(text, &StubMachine::new())
    }

    #[test]
    fn test_multiplication_binds_tighter() {
        assert_eq!(eval("2+3*4").unwrap(), 14);
    }

    #[test]
    fn test_paren_wrap_stripped() {
        assert_eq!(eval("(2+3)*4").unwrap(), 20);
        assert_eq!(eval("((2+3))*4").unwrap(), 20);
    }

    #[test]
    fn test_left_associativity() {
        assert_eq!(eval("2-1-1").unwrap(), 0);
        assert_eq!(eval("8/4/2").unwrap(), 1);
    }

    #[test]
    fn test_division_truncates() {
        assert_eq!(eval("7/2").unwrap(), 3);
    }

    #[test]
    fn test_division_by_zero() {
        assert!(matches!(
            eval("10/0"),
            Err(ExprError::Eval(EvalError::DivisionByZero))
        ));
    }

    #[test]
    fn test_comparisons_yield_zero_or_one() {
        assert_eq!(eval("1==1").unwrap(), 1);
        assert_eq!(eval("1!=1").unwrap(), 0);
        assert_eq!(eval("1+2==3").unwrap(), 1);
    }

    #[test]
    fn test_logical_and() {
        assert_eq!(eval("1&&2").unwrap(), 1);
        assert_eq!(eval("0&&5").unwrap(), 0);
        assert_eq!(eval("3&&0").unwrap(), 0);
    }

    #[test]
    fn test_and_binds_looser_than_equality() {
        assert_eq!(eval("1==2&&0==0").unwrap(), 0);
        assert_eq!(eval("1==1&&2==2").unwrap(), 1);
    }

    #[test]
    fn test_leading_minus_subtracts_from_empty_operand() {
        assert_eq!(eval("-5").unwrap(), -5);
        assert_eq!(eval("3-(-5)").unwrap(), 8);
    }

    #[test]
    fn test_hex_literal() {
        assert_eq!(eval("0x10+1").unwrap(), 17);
        assert_eq!(eval("0xffffffffffffffff").unwrap(), -1);
    }

    #[test]
    fn test_oversized_decimal_literal_fails() {
        assert!(matches!(
            eval("99999999999999999999"),
            Err(ExprError::Eval(EvalError::BadLiteral { .. }))
        ));
    }

    #[test]
    fn test_register_lookup() {
        let machine = StubMachine::new().with_register("a0", 10);
        assert_eq!(evaluate("$a0+4", &machine).unwrap(), 14);
    }

    #[test]
    fn test_unknown_register() {
        let err = eval("$nope").unwrap_err();
        assert_eq!(
            err,
            ExprError::Eval(EvalError::UnknownRegister {
                name: "nope".to_string()
            })
        );
    }

    #[test]
    fn test_deref_reads_memory_word() {
        let machine = StubMachine::new().with_word(0x100, 0xdead_beef);
        assert_eq!(evaluate("*0x100", &machine).unwrap(), 0xdead_beef);
    }

    #[test]
    fn test_double_deref() {
        let machine = StubMachine::new()
            .with_word(0x100, 0x200)
            .with_word(0x200, 7);
        assert_eq!(evaluate("**0x100", &machine).unwrap(), 7);
    }

    #[test]
    fn test_deref_vs_multiplication() {
        let machine = StubMachine::new().with_word(0x100, 3);
        assert_eq!(evaluate("2**0x100", &machine).unwrap(), 6);
        assert_eq!(evaluate("*0x100*2", &machine).unwrap(), 6);
    }

    #[test]
    fn test_deref_of_register() {
        let machine = StubMachine::new()
            .with_register("sp", 0x100)
            .with_word(0x100, 42);
        assert_eq!(evaluate("*$sp", &machine).unwrap(), 42);
    }

    #[test]
    fn test_mark_unary_derefs_positions() {
        let mut tokens = Lexer::new("*2*(*$sp)*4").tokenize().unwrap();
        mark_unary_derefs(&mut tokens);
        let kinds: Vec<TokenKind> = tokens.iter().map(|token| token.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Deref,
                TokenKind::Decimal,
                TokenKind::Star,
                TokenKind::LParen,
                TokenKind::Deref,
                TokenKind::Register,
                TokenKind::RParen,
                TokenKind::Star,
                TokenKind::Decimal,
            ]
        );
    }

    #[test]
    fn test_mismatched_parens() {
        assert!(matches!(
            eval("(1+2"),
            Err(ExprError::Eval(EvalError::MismatchedParens))
        ));
        assert!(matches!(
            eval("1+2)"),
            Err(ExprError::Eval(EvalError::MismatchedParens))
        ));
    }

    #[test]
    fn test_missing_operator() {
        assert!(matches!(
            eval("1 2"),
            Err(ExprError::Eval(EvalError::MissingOperator))
        ));
    }

    #[test]
    fn test_operator_alone_is_not_a_value() {
        assert!(matches!(
            eval("+"),
            Err(ExprError::Eval(EvalError::NoViableLeaf { .. }))
        ));
    }

    #[test]
    fn test_lex_error_surfaces_through_evaluate() {
        assert!(matches!(eval("1 # 2"), Err(ExprError::Lex(_))));
    }

    #[test]
    fn test_deep_nesting_is_bounded() {
        let depth = MAX_EVAL_DEPTH + 8;
        let text = format!("{}1{}", "(".repeat(depth), ")".repeat(depth));
        assert!(matches!(
            eval(&text),
            Err(ExprError::Eval(EvalError::NestingTooDeep))
        ));
    }
}
