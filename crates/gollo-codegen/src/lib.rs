//! gollo-codegen - Native code generation for the Gollo language
//!
//! Supports two backends, both emitting assembly text for a static Linux
//! executable with a `_start` entry point:
//! - **x86_64**: NASM syntax, assembled with `nasm -felf64` and linked with `ld`
//! - **aarch64**: GNU as syntax, assembled with `as` and linked with `ld`
//!
//! Every operation `i` gets the label `_addr_i`, so resolved jump targets
//! map onto labels with no translation. `_addr_<len>` marks the exit code.
//!
//! # Example
//!
//! ```rust
//! use gollo_codegen::{generate, Target};
//!
//! let program = gollo_ir::compile_source("34 35 + put", 0).unwrap();
//! let asm = generate(&program, Target::X86_64Linux).unwrap();
//! assert!(asm.contains("_addr_4:"));
//! ```

pub mod aarch64;
pub mod error;
pub mod x86_64;

pub use aarch64::Aarch64Backend;
pub use error::{CodegenError, Result};
pub use x86_64::X86_64Backend;

use gollo_ir::{Operation, Program};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Trait for code generation backends
pub trait CodeGen {
    /// Generates the full assembly source for `program`
    fn generate(&self, program: &Program) -> Result<String>;
}

/// Native target (ISA + OS)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    X86_64Linux,
    Aarch64Linux,
}

impl Target {
    pub const ALL: [Target; 2] = [Target::X86_64Linux, Target::Aarch64Linux];

    /// The target matching the machine we run on
    pub fn host() -> Result<Target> {
        if cfg!(all(target_arch = "x86_64", target_os = "linux")) {
            Ok(Target::X86_64Linux)
        } else if cfg!(all(target_arch = "aarch64", target_os = "linux")) {
            Ok(Target::Aarch64Linux)
        } else {
            Err(CodegenError::UnsupportedHost {
                arch: std::env::consts::ARCH,
                os: std::env::consts::OS,
            })
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Target::X86_64Linux => "x86_64-linux",
            Target::Aarch64Linux => "aarch64-linux",
        }
    }

    /// File extension of the generated assembly
    pub fn asm_extension(&self) -> &'static str {
        match self {
            Target::X86_64Linux => "asm",
            Target::Aarch64Linux => "s",
        }
    }

    pub fn backend(&self) -> Box<dyn CodeGen> {
        match self {
            Target::X86_64Linux => Box::new(X86_64Backend::new()),
            Target::Aarch64Linux => Box::new(Aarch64Backend::new()),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Target {
    type Err = CodegenError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "x86_64-linux" | "x86_64" | "amd64" => Ok(Target::X86_64Linux),
            "aarch64-linux" | "aarch64" | "arm64" => Ok(Target::Aarch64Linux),
            other => Err(CodegenError::UnknownTarget(other.to_string())),
        }
    }
}

/// Compilation options
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Output executable path
    pub output: PathBuf,
    pub target: Target,
    /// Keep the assembly and object files next to the executable
    pub keep_asm: bool,
}

impl CompileOptions {
    pub fn new(output: impl Into<PathBuf>, target: Target) -> Self {
        Self {
            output: output.into(),
            target,
            keep_asm: false,
        }
    }

    /// Path of the generated assembly file
    pub fn asm_path(&self) -> PathBuf {
        self.output.with_extension(self.target.asm_extension())
    }

    /// Path of the assembled object file
    pub fn object_path(&self) -> PathBuf {
        self.output.with_extension("o")
    }
}

/// Generates assembly for `program` with the backend for `target`
pub fn generate(program: &Program, target: Target) -> Result<String> {
    let asm = target.backend().generate(program)?;
    tracing::debug!(%target, ops = program.len(), bytes = asm.len(), "generated assembly");
    Ok(asm)
}

/// Message printed by generated code when a divisor is zero
pub(crate) const DIV_ZERO_MESSAGE: &str = "runtime error: division by zero\n";

/// Resolved jump target of `op`
pub(crate) fn jump_target(op: &Operation, addr: usize) -> Result<usize> {
    op.jump().ok_or(CodegenError::UnresolvedJump {
        op: op.opcode.word(),
        addr,
    })
}

/// Comma-separated byte list for a data directive; an empty string still
/// gets one byte so its label has storage.
pub(crate) fn byte_list(bytes: &[u8]) -> String {
    if bytes.is_empty() {
        return "0".to_string();
    }
    bytes
        .iter()
        .map(|b| format!("0x{:02x}", b))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_target_names_round_trip() {
        for target in Target::ALL {
            assert_eq!(target.name().parse::<Target>().ok(), Some(target));
        }
        assert_eq!("arm64".parse::<Target>().ok(), Some(Target::Aarch64Linux));
        assert!(matches!(
            "riscv64".parse::<Target>(),
            Err(CodegenError::UnknownTarget(name)) if name == "riscv64"
        ));
    }

    #[test]
    fn test_compile_options_paths() {
        let options = CompileOptions::new("build/hello", Target::Aarch64Linux);
        assert_eq!(options.asm_path(), PathBuf::from("build/hello.s"));
        assert_eq!(options.object_path(), PathBuf::from("build/hello.o"));
        assert!(!options.keep_asm);
    }

    #[test]
    fn test_byte_list() {
        assert_eq!(byte_list(b"hi\n"), "0x68,0x69,0x0a");
        assert_eq!(byte_list(b""), "0");
    }

    #[test]
    fn test_every_target_generates_for_the_same_program() {
        let program = gollo_ir::compile_source("1 2 < if \"yes\" 1 1 syscall3 drop end", 0)
            .expect("compiles");
        for target in Target::ALL {
            let asm = generate(&program, target).expect("generates");
            assert!(asm.contains("_start:"), "{} has no entry point", target);
            assert!(asm.contains("_str_0:"), "{} has no string data", target);
        }
    }
}
