//! Gollo tokens

use gollo_error::{Span, Spanned};
use std::fmt;

/// The three lexical atoms of the language
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Anything whitespace-delimited that is not an integer: `+`, `while`, `2copy`
    Word(String),
    /// A word that parses as a signed 64-bit integer
    Int(i64),
    /// Contents of a `"..."` literal, without the quotes
    Str(String),
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Word(w) => write!(f, "word `{}`", w),
            TokenKind::Int(v) => write!(f, "int {}", v),
            TokenKind::Str(s) => write!(f, "string {:?}", s),
        }
    }
}

/// A token with its location in the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

impl Spanned for Token {
    fn span(&self) -> Span {
        self.span
    }
}
