//! Integration tests for the Gollo programming language
//!
//! This crate provides end-to-end testing of the complete pipeline:
//! Source → Lexer → Builder → Resolver → Interpreter / Codegen

use gollo_codegen::Target;
use gollo_error::{Diagnostics, ErrorCode};
use gollo_interp::{Interpreter, RuntimeError, Syscalls};
use gollo_ir::Program;
use std::path::PathBuf;

/// Syscall number the test interpreter emulates as `write`, matching
/// x86_64 Linux so fixtures behave the same on every host
pub const TEST_WRITE: i64 = 1;

/// Records forwarded syscalls instead of performing them
#[derive(Debug, Default)]
pub struct RecordingSyscalls {
    pub calls: Vec<(i64, Vec<i64>)>,
}

impl RecordingSyscalls {
    fn record(&mut self, nr: i64, args: &[i64]) -> i64 {
        self.calls.push((nr, args.to_vec()));
        0
    }
}

impl Syscalls for RecordingSyscalls {
    fn write_number(&self) -> i64 {
        TEST_WRITE
    }

    fn syscall0(&mut self, nr: i64) -> i64 {
        self.record(nr, &[])
    }

    fn syscall1(&mut self, nr: i64, arg1: i64) -> i64 {
        self.record(nr, &[arg1])
    }

    fn syscall2(&mut self, nr: i64, arg1: i64, arg2: i64) -> i64 {
        self.record(nr, &[arg1, arg2])
    }

    fn syscall3(&mut self, nr: i64, arg1: i64, arg2: i64, arg3: i64) -> i64 {
        self.record(nr, &[arg1, arg2, arg3])
    }
}

/// Observable result of interpreting a program
#[derive(Debug)]
pub struct Execution {
    pub stdout: String,
    pub stderr: String,
    pub error: Option<RuntimeError>,
    pub syscalls: Vec<(i64, Vec<i64>)>,
}

/// Runs the front end over `source`
pub fn compile(source: &str) -> Result<Program, Diagnostics> {
    gollo_ir::compile_source(source, 0)
}

/// Compiles and interprets `source` with captured output
pub fn interpret(source: &str) -> Execution {
    let program = match compile(source) {
        Ok(program) => program,
        Err(diagnostics) => panic!("Expected source to compile, but got errors:\n{:?}", diagnostics),
    };

    let mut interp = Interpreter::new(RecordingSyscalls::default(), Vec::new(), Vec::new());
    let error = interp.run(&program).err();
    let (syscalls, stdout, stderr) = interp.into_parts();

    Execution {
        stdout: String::from_utf8_lossy(&stdout).into_owned(),
        stderr: String::from_utf8_lossy(&stderr).into_owned(),
        error,
        syscalls: syscalls.calls,
    }
}

/// Compiles `source` and generates assembly for `target`
pub fn emit(source: &str, target: Target) -> String {
    let program = match compile(source) {
        Ok(program) => program,
        Err(diagnostics) => panic!("Expected source to compile, but got errors:\n{:?}", diagnostics),
    };
    match gollo_codegen::generate(&program, target) {
        Ok(asm) => asm,
        Err(e) => panic!("code generation failed: {}", e),
    }
}

/// Asserts that `source` runs cleanly and prints exactly `expected`
pub fn assert_output(source: &str, expected: &str) {
    let execution = interpret(source);
    if let Some(error) = &execution.error {
        panic!("Expected source to run, but got: {}", error);
    }
    if execution.stdout != expected {
        panic!(
            "Expected output {:?}, got {:?}\n\nSource:\n{}",
            expected, execution.stdout, source
        );
    }
}

/// Asserts that `source` is rejected and returns the reported error codes
pub fn assert_compile_fails(source: &str) -> Vec<ErrorCode> {
    match compile(source) {
        Ok(program) => panic!("Expected source to fail compilation, got:\n{}", program),
        Err(diagnostics) => diagnostics.iter().filter_map(|d| d.code).collect(),
    }
}

/// Asserts that `source` compiles but fails at run time
pub fn assert_runtime_error(source: &str) -> RuntimeError {
    let execution = interpret(source);
    match execution.error {
        Some(error) => error,
        None => panic!(
            "Expected a runtime error, but the program printed {:?}",
            execution.stdout
        ),
    }
}

/// Directory holding `*.glo` fixtures and their `*.output.txt` files
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}
