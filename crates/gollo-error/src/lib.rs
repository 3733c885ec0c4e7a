//! gollo-error - Diagnostics system for the Gollo toolchain
//!
//! This crate provides source locations and structured, renderable
//! errors shared by every stage of the pipeline.
//!
//! # Example
//!
//! ```rust
//! use gollo_error::{Diagnostic, DiagnosticRenderer, ErrorCode, SourceCache, Span};
//!
//! let mut cache = SourceCache::new();
//! let file_id = cache.add("example.glo", "34 35 frob");
//!
//! let diagnostic = Diagnostic::error("unknown word `frob`")
//!     .with_code(ErrorCode::UNKNOWN_WORD)
//!     .with_label(Span::on_line(1, 7, 6, 4, 4, file_id), "not a known operation");
//!
//! let renderer = DiagnosticRenderer::new(&cache).without_colors();
//! assert!(renderer.render(&diagnostic).contains("example.glo:1:7"));
//! ```

pub mod diagnostic;
pub mod span;

pub use diagnostic::{Diagnostic, DiagnosticRenderer, ErrorCode, Label, SourceCache, SourceFile};
pub use span::{Position, Span, Spanned};

/// Default Result type for operations that may fail with one diagnostic
pub type Result<T> = std::result::Result<T, Diagnostic>;

/// Collection of diagnostics accumulated during compilation
#[derive(Debug, Default, Clone, PartialEq, Eq, thiserror::Error)]
#[error("compilation failed with {} error(s)", .items.len())]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        !self.items.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    /// Renders all diagnostics
    pub fn render(&self, renderer: &DiagnosticRenderer<'_>) -> String {
        self.items
            .iter()
            .map(|d| renderer.render(d))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl From<Diagnostic> for Diagnostics {
    fn from(diagnostic: Diagnostic) -> Self {
        Self {
            items: vec![diagnostic],
        }
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}
