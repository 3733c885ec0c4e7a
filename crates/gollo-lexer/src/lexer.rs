//! Lexer for the Gollo language
//!
//! Source is processed line by line: everything after `//` is dropped,
//! then the remainder is split into whitespace-delimited words. A `"`
//! opens a string literal that runs to the next `"` on the same line.

use crate::token::{Token, TokenKind};
use gollo_error::{Diagnostic, Diagnostics, ErrorCode, SourceCache, Span};
use std::fs;
use std::path::Path;

/// The Gollo language lexer
pub struct Lexer<'src> {
    source: &'src str,
    file_id: u32,
    diagnostics: Diagnostics,
}

/// One comment-stripped line being scanned
struct Line<'a> {
    text: &'a str,
    /// Characters with their byte index inside `text`
    chars: Vec<(usize, char)>,
    number: u32,
    /// Byte offset of the line start within the file
    base: usize,
}

impl Line<'_> {
    fn byte_at(&self, pos: usize) -> usize {
        self.chars.get(pos).map_or(self.text.len(), |&(b, _)| b)
    }

    /// Span covering characters `from..to`
    fn span(&self, from: usize, to: usize, file_id: u32) -> Span {
        let lo = self.byte_at(from);
        let hi = self.byte_at(to);
        Span::on_line(
            self.number,
            from as u32 + 1,
            self.base + lo,
            (to - from) as u32,
            hi - lo,
            file_id,
        )
    }

    /// Index of the first character at or after `from` matching `pred`
    fn find(&self, from: usize, pred: impl Fn(char) -> bool) -> usize {
        self.chars[from..]
            .iter()
            .position(|&(_, c)| pred(c))
            .map_or(self.chars.len(), |rel| from + rel)
    }
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str, file_id: u32) -> Self {
        Self {
            source,
            file_id,
            diagnostics: Diagnostics::new(),
        }
    }

    /// Consumes and returns the diagnostics
    pub fn take_diagnostics(&mut self) -> Diagnostics {
        std::mem::take(&mut self.diagnostics)
    }

    /// Tokenizes the entire source, in file order
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut base = 0;

        for (idx, raw) in self.source.split('\n').enumerate() {
            let text = strip_comment(raw);
            let line = Line {
                text,
                chars: text.char_indices().collect(),
                number: idx as u32 + 1,
                base,
            };
            self.lex_line(&line, &mut tokens);
            base += raw.len() + 1;
        }

        tracing::debug!(tokens = tokens.len(), file_id = self.file_id, "lexed source");
        tokens
    }

    fn lex_line(&mut self, line: &Line<'_>, tokens: &mut Vec<Token>) {
        let mut pos = line.find(0, |c| !c.is_whitespace());

        while pos < line.chars.len() {
            let (_, ch) = line.chars[pos];

            let end = if ch == '"' {
                let close = line.find(pos + 1, |c| c == '"');
                if close == line.chars.len() {
                    let span = line.span(pos, close, self.file_id);
                    self.diagnostics.push(
                        Diagnostic::error("unterminated string literal")
                            .with_code(ErrorCode::UNTERMINATED_STRING)
                            .with_label(span, "string starts here but is not closed on this line")
                            .with_help("add a closing `\"`; string literals cannot span lines"),
                    );
                    return;
                }
                let text = &line.text[line.byte_at(pos + 1)..line.byte_at(close)];
                tokens.push(Token::new(
                    TokenKind::Str(text.to_string()),
                    line.span(pos, close + 1, self.file_id),
                ));
                close + 1
            } else {
                let end = line.find(pos, char::is_whitespace);
                let text = &line.text[line.byte_at(pos)..line.byte_at(end)];
                let span = line.span(pos, end, self.file_id);
                if let Some(kind) = self.classify(text, span) {
                    tokens.push(Token::new(kind, span));
                }
                end
            };

            pos = line.find(end, |c| !c.is_whitespace());
        }
    }

    /// Integer if the word parses as one, word otherwise
    fn classify(&mut self, text: &str, span: Span) -> Option<TokenKind> {
        if let Ok(value) = text.parse::<i64>() {
            return Some(TokenKind::Int(value));
        }

        if looks_numeric(text) {
            self.diagnostics.push(
                Diagnostic::error(format!("integer literal `{}` does not fit in 64 bits", text))
                    .with_code(ErrorCode::INVALID_NUMBER)
                    .with_label(span, "out of range"),
            );
            return None;
        }

        Some(TokenKind::Word(text.to_string()))
    }
}

fn strip_comment(line: &str) -> &str {
    match line.find("//") {
        Some(idx) => &line[..idx],
        None => line,
    }
}

fn looks_numeric(text: &str) -> bool {
    let digits = text.strip_prefix(|c| c == '+' || c == '-').unwrap_or(text);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Tokenizes source code and returns the tokens
pub fn tokenize(source: &str, file_id: u32) -> (Vec<Token>, Diagnostics) {
    let mut lexer = Lexer::new(source, file_id);
    let tokens = lexer.tokenize();
    (tokens, lexer.take_diagnostics())
}

/// Reads `path` into `cache` and tokenizes it.
///
/// An unreadable file is reported as a diagnostic like any other error.
pub fn lex_file(path: &Path, cache: &mut SourceCache) -> Result<Vec<Token>, Diagnostics> {
    let source = fs::read_to_string(path).map_err(|e| {
        Diagnostic::error(format!("can't read `{}`: {}", path.display(), e))
            .with_code(ErrorCode::FILE_UNREADABLE)
    })?;

    let file_id = cache.add(path.display().to_string(), source);
    let source = cache.get(file_id).map_or("", |f| f.source.as_str());

    let (tokens, diagnostics) = tokenize(source, file_id);
    if diagnostics.has_errors() {
        return Err(diagnostics);
    }
    Ok(tokens)
}
