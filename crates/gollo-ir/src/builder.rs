//! Instruction builder
//!
//! Maps tokens one-to-one onto operations. Jump targets are left unset;
//! the block resolver fills them in.

use crate::opcode::Opcode;
use crate::operation::Operation;
use gollo_error::{Diagnostic, Diagnostics, ErrorCode};
use gollo_lexer::{Token, TokenKind};

/// Builds raw (unresolved) operations from a token stream.
///
/// Every unknown word is reported; the returned operations skip them.
pub fn build(tokens: Vec<Token>) -> (Vec<Operation>, Diagnostics) {
    let mut ops = Vec::with_capacity(tokens.len());
    let mut diagnostics = Diagnostics::new();

    for token in tokens {
        let opcode = match token.kind {
            TokenKind::Int(value) => Opcode::PushInt(value),
            TokenKind::Str(text) => Opcode::PushStr(text),
            TokenKind::Word(word) => match Opcode::from_word(&word) {
                Some(opcode) => opcode,
                None => {
                    diagnostics.push(unknown_word(&word, token.span));
                    continue;
                }
            },
        };
        ops.push(Operation::new(opcode, token.span));
    }

    tracing::debug!(ops = ops.len(), errors = diagnostics.len(), "built instructions");
    (ops, diagnostics)
}

fn unknown_word(word: &str, span: gollo_error::Span) -> Diagnostic {
    let diagnostic = Diagnostic::error(format!("unknown word `{}`", word))
        .with_code(ErrorCode::UNKNOWN_WORD)
        .with_label(span, "not a known operation");

    match suggest(word) {
        Some(known) => diagnostic.with_help(format!("did you mean `{}`?", known)),
        None => diagnostic,
    }
}

/// Spellings borrowed from other stack languages
fn suggest(word: &str) -> Option<&'static str> {
    let known = match word {
        "dup" => "copy",
        "2dup" => "2copy",
        "." | "print" | "dump" => "put",
        "=" => "==",
        "<>" => "!=",
        "or" | "|" => "bor",
        "and" | "&" => "band",
        "^" => "xor",
        "<<" => "shl",
        ">>" => "shr",
        "mod" => "%",
        "then" | "fi" | "done" => "end",
        _ => return None,
    };
    Some(known)
}
