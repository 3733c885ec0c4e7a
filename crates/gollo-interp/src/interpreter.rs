//! Stack-machine interpreter
//!
//! Executes a resolved [`Program`] top to bottom. Binary operators pop the
//! right-hand operand first, so `a b -` computes `a - b`.

use crate::error::{Result, RuntimeError};
use crate::memory::Memory;
use crate::stack::Stack;
use crate::syscall::Syscalls;
use gollo_ir::{BinaryOp, CompareOp, Opcode, Operation, Program};
use std::io::{self, Write};

/// Interpreter state for one program run
pub struct Interpreter<S, O, E> {
    syscalls: S,
    stdout: O,
    stderr: E,
    stack: Stack,
    memory: Memory,
    /// Memory offset of each string literal operation, set on first execution
    strings: Vec<Option<usize>>,
}

impl<S: Syscalls, O: Write, E: Write> Interpreter<S, O, E> {
    pub fn new(syscalls: S, stdout: O, stderr: E) -> Self {
        Self {
            syscalls,
            stdout,
            stderr,
            stack: Stack::new(),
            memory: Memory::new(),
            strings: Vec::new(),
        }
    }

    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Gives back the syscall backend and output streams
    pub fn into_parts(self) -> (S, O, E) {
        (self.syscalls, self.stdout, self.stderr)
    }

    /// Runs `program` to completion on a fresh stack and memory
    pub fn run(&mut self, program: &Program) -> Result<()> {
        tracing::info!(ops = program.len(), "interpreting program");
        self.stack = Stack::new();
        self.memory = Memory::new();
        self.strings = vec![None; program.len()];

        let mut pc = 0;
        let mut steps: u64 = 0;
        while pc < program.len() {
            let op = &program[pc];
            tracing::trace!(pc, op = %op.opcode, depth = self.stack.len(), "step");
            pc = self.step(program, pc)?;
            steps += 1;
        }

        self.stdout
            .flush()
            .and_then(|()| self.stderr.flush())
            .map_err(|source| RuntimeError::Output { source, span: None })?;

        tracing::debug!(
            steps,
            depth = self.stack.len(),
            memory = self.memory.len(),
            "program finished"
        );
        Ok(())
    }

    /// Executes the operation at `addr` and returns the next address
    fn step(&mut self, program: &Program, addr: usize) -> Result<usize> {
        let op = &program[addr];
        let next = addr + 1;

        match &op.opcode {
            Opcode::PushInt(value) => self.stack.push(*value),
            Opcode::PushStr(text) => {
                let offset = match self.strings[addr] {
                    Some(offset) => offset,
                    None => {
                        let offset = self.memory.store(text.as_bytes());
                        self.strings[addr] = Some(offset);
                        offset
                    }
                };
                self.stack.push(text.len() as i64);
                self.stack.push(offset as i64);
            }
            Opcode::Binary(bin) => {
                let [lhs, rhs] = self.pop(op)?;
                let value =
                    binary(*bin, lhs, rhs).ok_or(RuntimeError::DivisionByZero { span: op.span })?;
                self.stack.push(value);
            }
            Opcode::Compare(cmp) => {
                let [lhs, rhs] = self.pop(op)?;
                self.stack.push(compare(*cmp, lhs, rhs) as i64);
            }

            Opcode::If | Opcode::Do => {
                let [cond] = self.pop(op)?;
                if cond == 0 {
                    return target(op, addr);
                }
            }
            Opcode::Else => return target(op, addr),
            Opcode::End => {
                if let Some(head) = program.loop_head(addr) {
                    return Ok(head);
                }
            }
            Opcode::While => {}

            Opcode::Put => {
                let [value] = self.pop(op)?;
                writeln!(self.stdout, "{}", value).map_err(|source| RuntimeError::Output {
                    source,
                    span: Some(op.span),
                })?;
            }

            Opcode::Copy => {
                let [a] = self.pop(op)?;
                self.push_all(&[a, a]);
            }
            Opcode::TwoCopy => {
                let [a, b] = self.pop(op)?;
                self.push_all(&[a, b, a, b]);
            }
            Opcode::Swap => {
                let [a, b] = self.pop(op)?;
                self.push_all(&[b, a]);
            }
            Opcode::Drop => {
                let [_] = self.pop(op)?;
            }
            Opcode::Over => {
                let [a, b] = self.pop(op)?;
                self.push_all(&[a, b, a]);
            }

            // Arguments are pushed before the number, so in push order the
            // number comes last and argument 1 right before it.
            Opcode::Syscall0 => {
                let [nr] = self.pop(op)?;
                let ret = self.syscalls.syscall0(nr);
                self.stack.push(ret);
            }
            Opcode::Syscall1 => {
                let [arg1, nr] = self.pop(op)?;
                let ret = self.syscalls.syscall1(nr, arg1);
                self.stack.push(ret);
            }
            Opcode::Syscall2 => {
                let [arg2, arg1, nr] = self.pop(op)?;
                let ret = self.syscalls.syscall2(nr, arg1, arg2);
                self.stack.push(ret);
            }
            Opcode::Syscall3 => {
                let [arg3, arg2, arg1, nr] = self.pop(op)?;
                let ret = if nr == self.syscalls.write_number() {
                    self.write(op, arg1, arg2, arg3)?
                } else {
                    self.syscalls.syscall3(nr, arg1, arg2, arg3)
                };
                self.stack.push(ret);
            }
        }

        Ok(next)
    }

    /// Emulated `write(fd, buf, len)`: `buf` is an offset into string
    /// memory and a newline follows the bytes.
    fn write(&mut self, op: &Operation, fd: i64, buf: i64, len: i64) -> Result<i64> {
        let bytes = self
            .memory
            .slice(buf, len)
            .ok_or(RuntimeError::MemoryOutOfBounds {
                offset: buf,
                len,
                size: self.memory.len(),
                span: op.span,
            })?;

        let written = match fd {
            1 => write_line(&mut self.stdout, bytes),
            2 => write_line(&mut self.stderr, bytes),
            _ => return Err(RuntimeError::BadDescriptor { fd, span: op.span }),
        };
        written.map_err(|source| RuntimeError::Output {
            source,
            span: Some(op.span),
        })?;
        Ok(len)
    }

    fn pop<const N: usize>(&mut self, op: &Operation) -> Result<[i64; N]> {
        let available = self.stack.len();
        self.stack.take::<N>().ok_or(RuntimeError::StackUnderflow {
            op: op.opcode.word(),
            needed: N,
            available,
            span: op.span,
        })
    }

    fn push_all(&mut self, values: &[i64]) {
        for &value in values {
            self.stack.push(value);
        }
    }
}

fn write_line(stream: &mut impl Write, bytes: &[u8]) -> io::Result<()> {
    stream.write_all(bytes)?;
    stream.write_all(b"\n")
}

fn target(op: &Operation, addr: usize) -> Result<usize> {
    op.jump().ok_or(RuntimeError::UnresolvedJump {
        op: op.opcode.word(),
        addr,
        span: op.span,
    })
}

/// Wrapping 64-bit arithmetic; `None` only for a zero divisor
fn binary(op: BinaryOp, lhs: i64, rhs: i64) -> Option<i64> {
    let value = match op {
        BinaryOp::Add => lhs.wrapping_add(rhs),
        BinaryOp::Sub => lhs.wrapping_sub(rhs),
        BinaryOp::Mul => lhs.wrapping_mul(rhs),
        BinaryOp::Div | BinaryOp::Mod if rhs == 0 => return None,
        BinaryOp::Div => lhs.wrapping_div(rhs),
        BinaryOp::Mod => lhs.wrapping_rem(rhs),
        BinaryOp::Or => lhs | rhs,
        BinaryOp::And => lhs & rhs,
        BinaryOp::Xor => lhs ^ rhs,
        // Shift counts are taken modulo 64, shr is arithmetic
        BinaryOp::Shl => lhs.wrapping_shl(rhs as u32),
        BinaryOp::Shr => lhs.wrapping_shr(rhs as u32),
    };
    Some(value)
}

fn compare(op: CompareOp, lhs: i64, rhs: i64) -> bool {
    match op {
        CompareOp::Eq => lhs == rhs,
        CompareOp::Ne => lhs != rhs,
        CompareOp::Lt => lhs < rhs,
        CompareOp::Gt => lhs > rhs,
        CompareOp::Le => lhs <= rhs,
        CompareOp::Ge => lhs >= rhs,
    }
}
