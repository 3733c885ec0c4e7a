//! gollo-interp - Interpreter for the Gollo IR
//!
//! Executes a resolved [`Program`](gollo_ir::Program) directly:
//! - a growable operand stack of `i64`
//! - a flat byte memory holding string literals
//! - raw syscalls behind the [`Syscalls`] capability, with `write` to
//!   stdout/stderr emulated from string memory
//!
//! # Example
//!
//! ```rust
//! use gollo_interp::{HostSyscalls, Interpreter};
//!
//! let program = gollo_ir::compile_source("34 35 + put", 0).unwrap();
//! let mut out = Vec::new();
//! Interpreter::new(HostSyscalls, &mut out, Vec::new()).run(&program).unwrap();
//! assert_eq!(out, b"69\n");
//! ```

pub mod error;
pub mod interpreter;
pub mod memory;
pub mod stack;
pub mod syscall;

pub use error::{Result, RuntimeError};
pub use interpreter::Interpreter;
pub use memory::Memory;
pub use stack::Stack;
pub use syscall::{HostSyscalls, Syscalls, SYS_WRITE};

use gollo_ir::Program;
use std::io;

/// Runs `program` against the real process: host syscalls, stdout and stderr
pub fn run(program: &Program) -> Result<()> {
    let stdout = io::stdout();
    let stderr = io::stderr();
    Interpreter::new(HostSyscalls, stdout.lock(), stderr.lock()).run(program)
}
