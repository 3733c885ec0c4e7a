//! Interpreter runtime errors

use gollo_error::{Diagnostic, ErrorCode, Span};
use std::io;
use thiserror::Error;

/// Runtime result type
pub type Result<T> = std::result::Result<T, RuntimeError>;

/// A fatal error raised while executing a program
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("stack underflow in `{op}`: needs {needed} value(s), found {available}")]
    StackUnderflow {
        op: &'static str,
        needed: usize,
        available: usize,
        span: Span,
    },

    #[error("division by zero")]
    DivisionByZero { span: Span },

    #[error("unknown file descriptor {fd}")]
    BadDescriptor { fd: i64, span: Span },

    #[error("memory access out of bounds: {len} byte(s) at offset {offset}, memory holds {size}")]
    MemoryOutOfBounds {
        offset: i64,
        len: i64,
        size: usize,
        span: Span,
    },

    #[error("failed to write program output: {source}")]
    Output {
        #[source]
        source: io::Error,
        span: Option<Span>,
    },

    #[error("`{op}` at address {addr} has no jump target")]
    UnresolvedJump {
        op: &'static str,
        addr: usize,
        span: Span,
    },
}

impl RuntimeError {
    /// Location of the operation that failed, if any
    pub fn span(&self) -> Option<Span> {
        match self {
            RuntimeError::StackUnderflow { span, .. }
            | RuntimeError::DivisionByZero { span }
            | RuntimeError::BadDescriptor { span, .. }
            | RuntimeError::MemoryOutOfBounds { span, .. }
            | RuntimeError::UnresolvedJump { span, .. } => Some(*span),
            RuntimeError::Output { span, .. } => *span,
        }
    }

    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            RuntimeError::StackUnderflow { .. } => Some(ErrorCode::STACK_UNDERFLOW),
            RuntimeError::DivisionByZero { .. } => Some(ErrorCode::DIVISION_BY_ZERO),
            RuntimeError::BadDescriptor { .. } => Some(ErrorCode::BAD_DESCRIPTOR),
            RuntimeError::MemoryOutOfBounds { .. } => Some(ErrorCode::MEMORY_OUT_OF_BOUNDS),
            RuntimeError::Output { .. } => Some(ErrorCode::OUTPUT_FAILED),
            RuntimeError::UnresolvedJump { .. } => None,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            RuntimeError::StackUnderflow { .. } => "not enough values on the stack",
            RuntimeError::DivisionByZero { .. } => "divisor is zero",
            RuntimeError::BadDescriptor { .. } => "only 1 (stdout) and 2 (stderr) can be written",
            RuntimeError::MemoryOutOfBounds { .. } => "buffer outside of string memory",
            RuntimeError::Output { .. } => "while executing this operation",
            RuntimeError::UnresolvedJump { .. } => "block resolver did not run",
        }
    }
}

impl From<RuntimeError> for Diagnostic {
    fn from(error: RuntimeError) -> Self {
        let mut diagnostic = Diagnostic::error(error.to_string());
        if let Some(code) = error.code() {
            diagnostic = diagnostic.with_code(code);
        }
        if let Some(span) = error.span() {
            diagnostic = diagnostic.with_label(span, error.label());
        }
        diagnostic
    }
}
