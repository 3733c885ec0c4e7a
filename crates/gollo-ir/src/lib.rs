//! gollo-ir - Intermediate Representation of the Gollo language
//!
//! The Gollo IR is a flat list of stack-machine operations:
//! - One operation per source token
//! - An operation's index is its address
//! - Structured control flow is lowered into resolved jump targets
//!
//! # Architecture
//!
//! ```text
//! Tokens (gollo-lexer)
//!         ↓
//!    [Builder]      unknown words → EP001
//!         ↓
//!    [Resolver]     unbalanced blocks → EB001 / EB002
//!         ↓
//!   Program
//!         ↓
//!   gollo-interp / gollo-codegen
//! ```
//!
//! # Example
//!
//! ```rust
//! use gollo_ir::{compile_source, Opcode};
//!
//! let program = compile_source("1 if 2 put end", 0).unwrap();
//! assert_eq!(program[1].opcode, Opcode::If);
//! assert_eq!(program[1].jump(), Some(4));
//! ```

pub mod builder;
pub mod opcode;
pub mod operation;
pub mod resolve;

pub use builder::build;
pub use opcode::{BinaryOp, CompareOp, Opcode};
pub use operation::{Operation, Program};
pub use resolve::resolve;

use gollo_error::Diagnostics;
use gollo_lexer::Token;

/// Builds and resolves a token stream into a program.
///
/// Block resolution only runs once every word is known.
pub fn lower(tokens: Vec<Token>) -> Result<Program, Diagnostics> {
    let (ops, diagnostics) = build(tokens);
    if diagnostics.has_errors() {
        return Err(diagnostics);
    }
    Ok(resolve(ops)?)
}

/// Runs the whole front end over in-memory source
pub fn compile_source(source: &str, file_id: u32) -> Result<Program, Diagnostics> {
    let (tokens, diagnostics) = gollo_lexer::tokenize(source, file_id);
    if diagnostics.has_errors() {
        return Err(diagnostics);
    }
    lower(tokens)
}
