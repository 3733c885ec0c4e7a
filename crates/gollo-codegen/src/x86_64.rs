//! x86_64 Linux backend (NASM syntax)
//!
//! The operand stack is the native stack: one 8-byte slot per value.
//! Binary operators pop the right-hand operand into `rbx` (or `rcx` for
//! shifts) and the left-hand operand into `rax`.

use crate::error::Result;
use crate::{byte_list, jump_target, CodeGen, DIV_ZERO_MESSAGE};
use gollo_ir::{BinaryOp, CompareOp, Opcode, Operation, Program};
use std::fmt::{self, Write};

const SYS_WRITE: i64 = 1;
const SYS_EXIT: i64 = 60;

/// Runtime routines shared by every program.
///
/// `put` prints `rdi` as a signed decimal plus newline. `write_line` is
/// `write(rdi, rsi, rdx)` followed by a newline on the same descriptor,
/// returning the first write's result. `div_zero` reports and exits 1.
const RUNTIME: &str = "\
put:
    push rbp
    mov rbp, rsp
    sub rsp, 32
    mov rax, rdi
    lea rsi, [rbp-1]
    mov byte [rsi], 10
    mov r8, rax
    test rax, rax
    jns .digits
    neg rax
.digits:
    mov rcx, 10
.loop:
    xor rdx, rdx
    div rcx
    add dl, '0'
    dec rsi
    mov [rsi], dl
    test rax, rax
    jnz .loop
    test r8, r8
    jns .emit
    dec rsi
    mov byte [rsi], '-'
.emit:
    mov rax, 1
    mov rdi, 1
    mov rdx, rbp
    sub rdx, rsi
    syscall
    leave
    ret

write_line:
    mov rax, 1
    syscall
    push rax
    mov rax, 1
    mov rsi, newline
    mov rdx, 1
    syscall
    pop rax
    ret

div_zero:
    mov rax, 1
    mov rdi, 2
    mov rsi, div_zero_msg
    mov rdx, div_zero_len
    syscall
    mov rax, 60
    mov rdi, 1
    syscall

";

/// x86_64 code generation backend
#[derive(Debug, Default, Clone, Copy)]
pub struct X86_64Backend;

impl X86_64Backend {
    pub fn new() -> Self {
        Self
    }

    fn emit_op(
        &self,
        out: &mut String,
        program: &Program,
        addr: usize,
        op: &Operation,
        strings: &mut Vec<Vec<u8>>,
    ) -> Result<()> {
        match &op.opcode {
            Opcode::PushInt(value) => {
                writeln!(out, "    mov rax, {}", value)?;
                ins(out, &["push rax"])?;
            }
            Opcode::PushStr(text) => {
                writeln!(out, "    mov rax, {}", text.len())?;
                ins(out, &["push rax"])?;
                writeln!(out, "    mov rax, _str_{}", strings.len())?;
                ins(out, &["push rax"])?;
                strings.push(text.as_bytes().to_vec());
            }
            Opcode::Binary(bin) => emit_binary(out, *bin)?,
            Opcode::Compare(cmp) => {
                ins(out, &["pop rbx", "pop rax", "xor rcx, rcx", "cmp rax, rbx"])?;
                writeln!(out, "    set{} cl", condition(*cmp))?;
                ins(out, &["push rcx"])?;
            }

            Opcode::If | Opcode::Do => {
                ins(out, &["pop rax", "test rax, rax"])?;
                writeln!(out, "    jz _addr_{}", jump_target(op, addr)?)?;
            }
            Opcode::Else => writeln!(out, "    jmp _addr_{}", jump_target(op, addr)?)?,
            Opcode::End => {
                if let Some(head) = program.loop_head(addr) {
                    writeln!(out, "    jmp _addr_{}", head)?;
                }
            }
            Opcode::While => {}

            Opcode::Put => ins(out, &["pop rdi", "call put"])?,

            Opcode::Copy => ins(out, &["pop rax", "push rax", "push rax"])?,
            Opcode::TwoCopy => ins(
                out,
                &["pop rbx", "pop rax", "push rax", "push rbx", "push rax", "push rbx"],
            )?,
            Opcode::Swap => ins(out, &["pop rbx", "pop rax", "push rbx", "push rax"])?,
            Opcode::Drop => ins(out, &["pop rax"])?,
            Opcode::Over => ins(
                out,
                &["pop rbx", "pop rax", "push rax", "push rbx", "push rax"],
            )?,

            Opcode::Syscall0 => ins(out, &["pop rax", "syscall", "push rax"])?,
            Opcode::Syscall1 => ins(out, &["pop rax", "pop rdi", "syscall", "push rax"])?,
            Opcode::Syscall2 => {
                ins(out, &["pop rax", "pop rdi", "pop rsi", "syscall", "push rax"])?
            }
            Opcode::Syscall3 => {
                ins(out, &["pop rax", "pop rdi", "pop rsi", "pop rdx"])?;
                writeln!(out, "    cmp rax, {}", SYS_WRITE)?;
                ins(out, &["jne .raw", "call write_line", "jmp .done"])?;
                writeln!(out, ".raw:")?;
                ins(out, &["syscall"])?;
                writeln!(out, ".done:")?;
                ins(out, &["push rax"])?;
            }
        }
        Ok(())
    }
}

impl CodeGen for X86_64Backend {
    fn generate(&self, program: &Program) -> Result<String> {
        let mut out = String::new();
        let mut strings = Vec::new();

        writeln!(out, "; generated by gollo for x86_64-linux")?;
        writeln!(out, "BITS 64")?;
        writeln!(out, "segment .text")?;
        out.push_str(RUNTIME);
        writeln!(out, "global _start")?;
        writeln!(out, "_start:")?;

        for (addr, op) in program.iter().enumerate() {
            writeln!(out, "_addr_{}:", addr)?;
            writeln!(out, "    ; -- {} -- {}", op.opcode, op.span)?;
            self.emit_op(&mut out, program, addr, op, &mut strings)?;
        }

        writeln!(out, "_addr_{}:", program.len())?;
        writeln!(out, "    mov rax, {}", SYS_EXIT)?;
        ins(&mut out, &["xor rdi, rdi", "syscall"])?;

        writeln!(out)?;
        writeln!(out, "segment .rodata")?;
        writeln!(out, "newline: db 10")?;
        writeln!(out, "div_zero_msg: db {}", byte_list(DIV_ZERO_MESSAGE.as_bytes()))?;
        writeln!(out, "div_zero_len equ $ - div_zero_msg")?;
        for (index, bytes) in strings.iter().enumerate() {
            writeln!(out, "_str_{}: db {}", index, byte_list(bytes))?;
        }

        Ok(out)
    }
}

fn ins(out: &mut String, lines: &[&str]) -> fmt::Result {
    for line in lines {
        writeln!(out, "    {}", line)?;
    }
    Ok(())
}

fn emit_binary(out: &mut String, op: BinaryOp) -> fmt::Result {
    match op {
        BinaryOp::Add => ins(out, &["pop rbx", "pop rax", "add rax, rbx", "push rax"]),
        BinaryOp::Sub => ins(out, &["pop rbx", "pop rax", "sub rax, rbx", "push rax"]),
        BinaryOp::Mul => ins(out, &["pop rbx", "pop rax", "imul rax, rbx", "push rax"]),
        // `idiv` faults on `i64::MIN / -1`; a -1 divisor is negation, remainder 0
        BinaryOp::Div => ins(
            out,
            &[
                "pop rbx",
                "pop rax",
                "test rbx, rbx",
                "jz div_zero",
                "cmp rbx, -1",
                "jne .div",
                "neg rax",
                "jmp .quotient",
                ".div:",
                "cqo",
                "idiv rbx",
                ".quotient:",
                "push rax",
            ],
        ),
        BinaryOp::Mod => ins(
            out,
            &[
                "pop rbx",
                "pop rax",
                "test rbx, rbx",
                "jz div_zero",
                "cmp rbx, -1",
                "jne .div",
                "xor rdx, rdx",
                "jmp .remainder",
                ".div:",
                "cqo",
                "idiv rbx",
                ".remainder:",
                "push rdx",
            ],
        ),
        BinaryOp::Or => ins(out, &["pop rbx", "pop rax", "or rax, rbx", "push rax"]),
        BinaryOp::And => ins(out, &["pop rbx", "pop rax", "and rax, rbx", "push rax"]),
        BinaryOp::Xor => ins(out, &["pop rbx", "pop rax", "xor rax, rbx", "push rax"]),
        BinaryOp::Shl => ins(out, &["pop rcx", "pop rax", "shl rax, cl", "push rax"]),
        BinaryOp::Shr => ins(out, &["pop rcx", "pop rax", "sar rax, cl", "push rax"]),
    }
}

/// `setcc` suffix for a signed comparison
fn condition(op: CompareOp) -> &'static str {
    match op {
        CompareOp::Eq => "e",
        CompareOp::Ne => "ne",
        CompareOp::Lt => "l",
        CompareOp::Gt => "g",
        CompareOp::Le => "le",
        CompareOp::Ge => "ge",
    }
}
