//! Lexer (tokenizer) for debugger expressions
//!
//! Converts raw expression text into a flat [`Token`] stream consumed by the
//! evaluator. Lexing is driven by a fixed, ordered rule table: at each scan
//! position every rule is tried in declaration order and the first match
//! wins. The order is load-bearing because some patterns overlap — a leading
//! `0x` must hit the hex rule before the decimal rule can claim the `0`.

use std::fmt;

/// Longest numeric or register lexeme the lexer accepts, in bytes.
pub const MAX_TOKEN_LEN: usize = 32;

/// All token variants produced by the lexer (plus [`TokenKind::Deref`],
/// which the evaluator's pre-pass rewrites from [`TokenKind::Star`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Decimal integer literal
    Decimal,
    /// Hexadecimal integer literal with `0x` prefix
    Hex,
    /// Register reference with `$` sigil
    Register,
    Plus,
    Minus,
    /// `*` as produced by the lexer; multiplication until the evaluator
    /// reclassifies operand-position occurrences as dereference
    Star,
    Slash,
    EqEq,
    NotEq,
    AndAnd,
    /// Unary memory dereference; never produced by the lexer directly
    Deref,
    LParen,
    RParen,
}

/// One lexed token: its kind, the matched text, and where it started.
///
/// Every token keeps its lexeme so a stream can be re-joined into the
/// non-whitespace characters of its source, and `offset` is the byte
/// position used in error reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub offset: usize,
}

/// Lexer error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    /// No rule matches at `offset`; `rest` is the unconsumed input.
    UnexpectedInput { offset: usize, rest: String },
    /// A numeric or register lexeme exceeds [`MAX_TOKEN_LEN`].
    TokenTooLong { offset: usize, len: usize },
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexError::UnexpectedInput { offset, rest } => {
                write!(f, "no rule matches input at byte {}: '{}'", offset, rest)
            }
            LexError::TokenTooLong { offset, len } => {
                write!(
                    f,
                    "token at byte {} is {} bytes long (limit {})",
                    offset, len, MAX_TOKEN_LEN
                )
            }
        }
    }
}

impl std::error::Error for LexError {}

/// Anchored pattern a rule matches at the scan position.
enum Pattern {
    /// One or more spaces or tabs.
    Whitespace,
    /// Exact operator or punctuation text.
    Literal(&'static str),
    /// `0x` followed by one or more of `[0-9a-f]`.
    HexNumber,
    /// `$` followed by one or more of `[a-z0-9]`.
    Register,
    /// One or more decimal digits.
    Decimal,
}

/// A lexical rule: the pattern tried at the scan position and the token
/// kind it yields (`None` for input that is skipped).
struct Rule {
    pattern: Pattern,
    kind: Option<TokenKind>,
}

/// Rules are tried strictly in this order and the first match wins.
/// Overlapping patterns resolve by position in the table, not by longest
/// match, so the table order must not be rearranged.
const RULES: &[Rule] = &[
    Rule { pattern: Pattern::Whitespace, kind: None },
    Rule { pattern: Pattern::Literal("+"), kind: Some(TokenKind::Plus) },
    Rule { pattern: Pattern::Literal("=="), kind: Some(TokenKind::EqEq) },
    Rule { pattern: Pattern::Literal("!="), kind: Some(TokenKind::NotEq) },
    Rule { pattern: Pattern::Literal("-"), kind: Some(TokenKind::Minus) },
    Rule { pattern: Pattern::Literal("*"), kind: Some(TokenKind::Star) },
    Rule { pattern: Pattern::Literal("/"), kind: Some(TokenKind::Slash) },
    Rule { pattern: Pattern::Literal("("), kind: Some(TokenKind::LParen) },
    Rule { pattern: Pattern::Literal(")"), kind: Some(TokenKind::RParen) },
    Rule { pattern: Pattern::HexNumber, kind: Some(TokenKind::Hex) },
    Rule { pattern: Pattern::Register, kind: Some(TokenKind::Register) },
    Rule { pattern: Pattern::Decimal, kind: Some(TokenKind::Decimal) },
    Rule { pattern: Pattern::Literal("&&"), kind: Some(TokenKind::AndAnd) },
];

impl Pattern {
    /// Length of the match anchored at the start of `rest`, or 0.
    fn match_len(&self, rest: &[u8]) -> usize {
        match self {
            Pattern::Whitespace => rest
                .iter()
                .take_while(|&&byte| byte == b' ' || byte == b'\t')
                .count(),
            Pattern::Literal(text) => {
                if rest.starts_with(text.as_bytes()) {
                    text.len()
                } else {
                    0
                }
            }
            Pattern::HexNumber => {
                if !rest.starts_with(b"0x") {
                    return 0;
                }
                let digits = rest[2..]
                    .iter()
                    .take_while(|&&byte| matches!(byte, b'0'..=b'9' | b'a'..=b'f'))
                    .count();
                if digits > 0 {
                    2 + digits
                } else {
                    0
                }
            }
            Pattern::Register => {
                if rest.first() != Some(&b'$') {
                    return 0;
                }
                let name = rest[1..]
                    .iter()
                    .take_while(|&&byte| byte.is_ascii_lowercase() || byte.is_ascii_digit())
                    .count();
                if name > 0 {
                    1 + name
                } else {
                    0
                }
            }
            Pattern::Decimal => rest.iter().take_while(|byte| byte.is_ascii_digit()).count(),
        }
    }
}

/// First rule in table order matching at the start of `rest`.
fn first_match(rest: &[u8]) -> Option<(&'static Rule, usize)> {
    for rule in RULES {
        let len = rule.pattern.match_len(rest);
        if len > 0 {
            return Some((rule, len));
        }
    }
    None
}

/// Lexer for debugger expression text
pub struct Lexer<'a> {
    input: &'a str,
    position: usize,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given expression string.
    pub fn new(input: &'a str) -> Self {
        Self { input, position: 0 }
    }

    /// Tokenize the entire input
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        let bytes = self.input.as_bytes();

        while self.position < bytes.len() {
            let rest = &bytes[self.position..];
            let Some((rule, len)) = first_match(rest) else {
                return Err(LexError::UnexpectedInput {
                    offset: self.position,
                    rest: String::from_utf8_lossy(rest).into_owned(),
                });
            };

            if let Some(kind) = rule.kind {
                if len > MAX_TOKEN_LEN {
                    return Err(LexError::TokenTooLong {
                        offset: self.position,
                        len,
                    });
                }
                tokens.push(Token {
                    kind,
                    text: self.input[self.position..self.position + len].to_string(),
                    offset: self.position,
                });
            }

            self.position += len;
        }

        Ok(tokens)
    }
}
