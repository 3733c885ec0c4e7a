//! gollo-lexer - Lexer/Tokenizer for the Gollo language
//!
//! Converts source text into located [`Token`]s. There are only three
//! kinds of token: words, integers and string literals.
//!
//! # Example
//!
//! ```rust
//! use gollo_lexer::{tokenize, TokenKind};
//!
//! let (tokens, diagnostics) = tokenize("34 35 + put // 69", 0);
//! assert!(diagnostics.is_empty());
//! assert_eq!(tokens[0].kind, TokenKind::Int(34));
//! assert_eq!(tokens.len(), 4);
//! ```

pub mod lexer;
pub mod token;

pub use lexer::{lex_file, tokenize, Lexer};
pub use token::{Token, TokenKind};
