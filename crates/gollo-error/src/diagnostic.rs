//! Diagnostic - compiler-style error messages
//!
//! A diagnostic carries:
//! - an error code (EL001, EB002, ...)
//! - labelled source locations
//! - notes and fix suggestions
//!
//! and is rendered against a [`SourceCache`] into the familiar
//! `error[CODE]: message` / `--> file:line:column` layout.

use crate::span::Span;
use std::fmt;

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const RED: &str = "\x1b[1;31m";
const BLUE: &str = "\x1b[1;34m";
const GREEN: &str = "\x1b[1;32m";

/// A label pointing to a specific region of the code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub span: Span,
    pub message: String,
    /// Primary labels are underlined with `^`, secondary ones with `-`
    pub primary: bool,
}

impl Label {
    pub fn primary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            primary: true,
        }
    }

    pub fn secondary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            primary: false,
        }
    }
}

/// Structured error code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode {
    /// Category (F = File, L = Lexer, P = Builder, B = Blocks, R = Runtime)
    pub category: char,
    pub number: u16,
}

impl ErrorCode {
    pub const fn new(category: char, number: u16) -> Self {
        Self { category, number }
    }

    // File errors
    pub const FILE_UNREADABLE: Self = Self::new('F', 1);

    // Lexer errors
    pub const UNTERMINATED_STRING: Self = Self::new('L', 1);
    pub const INVALID_NUMBER: Self = Self::new('L', 2);

    // Instruction builder errors
    pub const UNKNOWN_WORD: Self = Self::new('P', 1);

    // Block resolver errors
    pub const UNCLOSED_BLOCK: Self = Self::new('B', 1);
    pub const UNMATCHED_KEYWORD: Self = Self::new('B', 2);

    // Runtime errors
    pub const STACK_UNDERFLOW: Self = Self::new('R', 1);
    pub const DIVISION_BY_ZERO: Self = Self::new('R', 2);
    pub const BAD_DESCRIPTOR: Self = Self::new('R', 3);
    pub const MEMORY_OUT_OF_BOUNDS: Self = Self::new('R', 4);
    pub const OUTPUT_FAILED: Self = Self::new('R', 5);
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}{:03}", self.category, self.number)
    }
}

/// A complete diagnostic. Every diagnostic is fatal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct Diagnostic {
    pub code: Option<ErrorCode>,
    pub message: String,
    pub labels: Vec<Label>,
    pub notes: Vec<String>,
    pub help: Vec<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            labels: Vec::new(),
            notes: Vec::new(),
            help: Vec::new(),
        }
    }

    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Adds a primary label
    pub fn with_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::primary(span, message));
        self
    }

    /// Adds a secondary label
    pub fn with_secondary_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::secondary(span, message));
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help.push(help.into());
        self
    }

    /// Span of the first primary label, if any
    pub fn primary_span(&self) -> Option<Span> {
        self.labels.iter().find(|l| l.primary).map(|l| l.span)
    }
}

/// Stores the source files of one compilation for rendering diagnostics
#[derive(Debug, Default)]
pub struct SourceCache {
    files: Vec<SourceFile>,
}

#[derive(Debug)]
pub struct SourceFile {
    pub name: String,
    pub source: String,
    /// Offset of each line (for fast lookup)
    line_starts: Vec<usize>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        let source = source.into();
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();

        Self {
            name: name.into(),
            source,
            line_starts,
        }
    }

    /// Returns the text of a 1-indexed line, without its line terminator
    pub fn get_line(&self, line: u32) -> Option<&str> {
        let line_idx = line.checked_sub(1)? as usize;
        let start = *self.line_starts.get(line_idx)?;
        let end = self
            .line_starts
            .get(line_idx + 1)
            .map(|&e| e.saturating_sub(1))
            .unwrap_or(self.source.len());

        Some(self.source[start..end].trim_end_matches('\r'))
    }
}

impl SourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file and returns its ID
    pub fn add(&mut self, name: impl Into<String>, source: impl Into<String>) -> u32 {
        let id = self.files.len() as u32;
        self.files.push(SourceFile::new(name, source));
        id
    }

    pub fn get(&self, id: u32) -> Option<&SourceFile> {
        self.files.get(id as usize)
    }

    /// Formats a span as `file:line:column`
    pub fn locate(&self, span: Span) -> String {
        match self.get(span.file_id) {
            Some(file) => format!("{}:{}", file.name, span.start),
            None => format!("<unknown>:{}", span.start),
        }
    }
}

/// Renders a diagnostic for display
pub struct DiagnosticRenderer<'a> {
    cache: &'a SourceCache,
    use_colors: bool,
}

impl<'a> DiagnosticRenderer<'a> {
    pub fn new(cache: &'a SourceCache) -> Self {
        Self {
            cache,
            use_colors: true,
        }
    }

    pub fn without_colors(mut self) -> Self {
        self.use_colors = false;
        self
    }

    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    fn paint(&self, color: &'static str) -> &'static str {
        if self.use_colors {
            color
        } else {
            ""
        }
    }

    /// Renders the diagnostic as a string
    pub fn render(&self, diagnostic: &Diagnostic) -> String {
        let reset = self.paint(RESET);
        let red = self.paint(RED);
        let blue = self.paint(BLUE);
        let bold = self.paint(BOLD);

        // error[EB001]: message
        let mut output = format!("{red}error");
        if let Some(code) = diagnostic.code {
            output.push_str(&format!("[{code}]"));
        }
        output.push_str(&format!("{reset}{bold}: {}{reset}\n", diagnostic.message));

        for label in &diagnostic.labels {
            let Some(file) = self.cache.get(label.span.file_id) else {
                continue;
            };
            let start = label.span.start;
            output.push_str(&format!(" {blue}-->{reset} {}:{}\n", file.name, start));

            let Some(line_content) = file.get_line(start.line) else {
                continue;
            };
            let padding = " ".repeat(start.line.to_string().len());

            output.push_str(&format!(" {padding} {blue}|{reset}\n"));
            output.push_str(&format!(" {blue}{}{reset} | {line_content}\n", start.line));

            let underline_len = if label.span.end.line == start.line {
                label.span.end.column.saturating_sub(start.column).max(1) as usize
            } else {
                1
            };
            let spaces = " ".repeat(start.column.saturating_sub(1) as usize);
            let (mark, color) = if label.primary { ('^', red) } else { ('-', blue) };
            let underline = mark.to_string().repeat(underline_len);

            output.push_str(&format!(
                " {padding} {blue}|{reset} {spaces}{color}{underline}{reset} {}\n",
                label.message
            ));
        }

        for note in &diagnostic.notes {
            output.push_str(&format!("  = {bold}note{reset}: {note}\n"));
        }

        let green = self.paint(GREEN);
        for help in &diagnostic.help {
            output.push_str(&format!("  = {green}help{reset}: {help}\n"));
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_diagnostic_rendering() {
        let mut cache = SourceCache::new();
        let file_id = cache.add("loop.glo", "1 while copy 5 < do\n  copy put 1 +\n");

        let diagnostic = Diagnostic::error("block is never closed with `end`")
            .with_code(ErrorCode::UNCLOSED_BLOCK)
            .with_label(Span::on_line(1, 3, 2, 5, 5, file_id), "this `while` is still open")
            .with_help("add `end` after the loop body");

        let output = DiagnosticRenderer::new(&cache).without_colors().render(&diagnostic);

        assert_eq!(
            output,
            "error[EB001]: block is never closed with `end`\n\
             \x20--> loop.glo:1:3\n\
             \x20  |\n\
             \x201 | 1 while copy 5 < do\n\
             \x20  |   ^^^^^ this `while` is still open\n\
             \x20 = help: add `end` after the loop body\n"
        );
    }

    #[test]
    fn test_locate() {
        let mut cache = SourceCache::new();
        let file_id = cache.add("main.glo", "34 35 + put");
        let span = Span::on_line(1, 7, 6, 1, 1, file_id);
        assert_eq!(cache.locate(span), "main.glo:1:7");
    }

    #[test]
    fn test_get_line_strips_carriage_return() {
        let file = SourceFile::new("crlf.glo", "1 put\r\n2 put\r\n");
        assert_eq!(file.get_line(1), Some("1 put"));
        assert_eq!(file.get_line(2), Some("2 put"));
        assert_eq!(file.get_line(4), None);
    }

    #[test]
    fn test_error_code_format() {
        assert_eq!(ErrorCode::STACK_UNDERFLOW.to_string(), "ER001");
        assert_eq!(ErrorCode::UNKNOWN_WORD.to_string(), "EP001");
    }
}
