//! aarch64 Linux backend (GNU as syntax)
//!
//! The operand stack is the native stack. `sp` must stay 16-byte aligned,
//! so every value takes a 16-byte slot.
//!
//! Integers are built with `movz`/`movk` and addresses with `adrp`/`add`,
//! so no literal pool is needed however large the program grows.

use crate::error::Result;
use crate::{byte_list, jump_target, CodeGen, DIV_ZERO_MESSAGE};
use gollo_ir::{BinaryOp, CompareOp, Opcode, Operation, Program};
use std::fmt::{self, Write};

const SYS_WRITE: i64 = 64;
const SYS_EXIT: i64 = 93;

const PUSH_X0: &str = "str x0, [sp, #-16]!";
const PUSH_X1: &str = "str x1, [sp, #-16]!";
const POP_X0: &str = "ldr x0, [sp], #16";
const POP_X1: &str = "ldr x1, [sp], #16";

/// `put` prints `x0` as a signed decimal plus newline; `write_line` writes
/// `x2` bytes at `x1` to descriptor `x0`, then a newline, and returns the
/// first write's result.
const RUNTIME: &str = "\
put:
    sub sp, sp, #32
    add x9, sp, #31
    mov w10, #10
    strb w10, [x9]
    mov x11, x0
    cmp x0, #0
    cneg x0, x0, lt
    mov x12, #10
1:
    udiv x13, x0, x12
    msub x14, x13, x12, x0
    add w14, w14, #48
    sub x9, x9, #1
    strb w14, [x9]
    mov x0, x13
    cbnz x0, 1b
    tbz x11, #63, 2f
    mov w14, #45
    sub x9, x9, #1
    strb w14, [x9]
2:
    mov x0, #1
    mov x1, x9
    add x2, sp, #32
    sub x2, x2, x9
    mov x8, #64
    svc #0
    add sp, sp, #32
    ret

write_line:
    mov x9, x0
    mov x8, #64
    svc #0
    mov x10, x0
    mov x0, x9
    adrp x1, newline
    add x1, x1, :lo12:newline
    mov x2, #1
    mov x8, #64
    svc #0
    mov x0, x10
    ret

";

/// aarch64 code generation backend
#[derive(Debug, Default, Clone, Copy)]
pub struct Aarch64Backend;

impl Aarch64Backend {
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
                load_immediate(out, "x0", *value)?;
                ins(out, &[PUSH_X0])?;
            }
            Opcode::PushStr(text) => {
                load_immediate(out, "x0", text.len() as i64)?;
                ins(out, &[PUSH_X0])?;
                load_address(out, "x0", &format!("_str_{}", strings.len()))?;
                ins(out, &[PUSH_X0])?;
                strings.push(text.as_bytes().to_vec());
            }
            Opcode::Binary(bin) => {
                ins(out, &[POP_X1, POP_X0])?;
                emit_binary(out, *bin)?;
                ins(out, &[PUSH_X0])?;
            }
            Opcode::Compare(cmp) => {
                ins(out, &[POP_X1, POP_X0, "cmp x0, x1"])?;
                writeln!(out, "    cset x0, {}", condition(*cmp))?;
                ins(out, &[PUSH_X0])?;
            }

            Opcode::If | Opcode::Do => {
                ins(out, &[POP_X0])?;
                writeln!(out, "    cbz x0, _addr_{}", jump_target(op, addr)?)?;
            }
            Opcode::Else => writeln!(out, "    b _addr_{}", jump_target(op, addr)?)?,
            Opcode::End => {
                if let Some(head) = program.loop_head(addr) {
                    writeln!(out, "    b _addr_{}", head)?;
                }
            }
            Opcode::While => {}

            Opcode::Put => ins(out, &[POP_X0, "bl put"])?,

            Opcode::Copy => ins(out, &[POP_X0, PUSH_X0, PUSH_X0])?,
            Opcode::TwoCopy => ins(out, &[POP_X1, POP_X0, PUSH_X0, PUSH_X1, PUSH_X0, PUSH_X1])?,
            Opcode::Swap => ins(out, &[POP_X1, POP_X0, PUSH_X1, PUSH_X0])?,
            Opcode::Drop => ins(out, &["add sp, sp, #16"])?,
            Opcode::Over => ins(out, &[POP_X1, POP_X0, PUSH_X0, PUSH_X1, PUSH_X0])?,

            Opcode::Syscall0 => ins(out, &["ldr x8, [sp], #16", "svc #0", PUSH_X0])?,
            Opcode::Syscall1 => ins(out, &["ldr x8, [sp], #16", POP_X0, "svc #0", PUSH_X0])?,
            Opcode::Syscall2 => ins(
                out,
                &["ldr x8, [sp], #16", POP_X0, POP_X1, "svc #0", PUSH_X0],
            )?,
            Opcode::Syscall3 => {
                ins(out, &["ldr x8, [sp], #16", POP_X0, POP_X1, "ldr x2, [sp], #16"])?;
                writeln!(out, "    cmp x8, #{}", SYS_WRITE)?;
                ins(out, &["b.ne 1f", "bl write_line", "b 2f"])?;
                writeln!(out, "1:")?;
                ins(out, &["svc #0"])?;
                writeln!(out, "2:")?;
                ins(out, &[PUSH_X0])?;
            }
        }
        Ok(())
    }
}

impl CodeGen for Aarch64Backend {
    fn generate(&self, program: &Program) -> Result<String> {
        let mut out = String::new();
        let mut strings = Vec::new();

        writeln!(out, "// generated by gollo for aarch64-linux")?;
        writeln!(out, ".text")?;
        out.push_str(RUNTIME);
        writeln!(out, "div_zero:")?;
        ins(&mut out, &["mov x0, #2"])?;
        load_address(&mut out, "x1", "div_zero_msg")?;
        writeln!(out, "    mov x2, #{}", DIV_ZERO_MESSAGE.len())?;
        writeln!(out, "    mov x8, #{}", SYS_WRITE)?;
        ins(&mut out, &["svc #0", "mov x0, #1"])?;
        writeln!(out, "    mov x8, #{}", SYS_EXIT)?;
        ins(&mut out, &["svc #0"])?;
        writeln!(out)?;

        writeln!(out, ".global _start")?;
        writeln!(out, "_start:")?;

        for (addr, op) in program.iter().enumerate() {
            writeln!(out, "_addr_{}:", addr)?;
            writeln!(out, "    // -- {} -- {}", op.opcode, op.span)?;
            self.emit_op(&mut out, program, addr, op, &mut strings)?;
        }

        writeln!(out, "_addr_{}:", program.len())?;
        ins(&mut out, &["mov x0, #0"])?;
        writeln!(out, "    mov x8, #{}", SYS_EXIT)?;
        ins(&mut out, &["svc #0"])?;

        writeln!(out)?;
        writeln!(out, ".section .rodata")?;
        writeln!(out, "newline: .byte 10")?;
        writeln!(out, "div_zero_msg: .byte {}", byte_list(DIV_ZERO_MESSAGE.as_bytes()))?;
        for (index, bytes) in strings.iter().enumerate() {
            writeln!(out, "_str_{}: .byte {}", index, byte_list(bytes))?;
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

/// Loads a 64-bit constant: `movz` for the low half-word, `movk` for every
/// other non-zero one
fn load_immediate(out: &mut String, reg: &str, value: i64) -> fmt::Result {
    let bits = value as u64;
    writeln!(out, "    movz {}, #{:#x}", reg, bits & 0xffff)?;
    for shift in [16, 32, 48] {
        let chunk = (bits >> shift) & 0xffff;
        if chunk != 0 {
            writeln!(out, "    movk {}, #{:#x}, lsl #{}", reg, chunk, shift)?;
        }
    }
    Ok(())
}

/// Page-relative address of `symbol` (reach of +-4 GiB)
fn load_address(out: &mut String, reg: &str, symbol: &str) -> fmt::Result {
    writeln!(out, "    adrp {}, {}", reg, symbol)?;
    writeln!(out, "    add {}, {}, :lo12:{}", reg, reg, symbol)
}

/// `x0 = x0 <op> x1`. `sdiv` wraps `i64::MIN / -1` to `i64::MIN`.
fn emit_binary(out: &mut String, op: BinaryOp) -> fmt::Result {
    match op {
        BinaryOp::Add => ins(out, &["add x0, x0, x1"]),
        BinaryOp::Sub => ins(out, &["sub x0, x0, x1"]),
        BinaryOp::Mul => ins(out, &["mul x0, x0, x1"]),
        BinaryOp::Div => ins(out, &["cbz x1, div_zero", "sdiv x0, x0, x1"]),
        BinaryOp::Mod => ins(
            out,
            &["cbz x1, div_zero", "sdiv x2, x0, x1", "msub x0, x2, x1, x0"],
        ),
        BinaryOp::Or => ins(out, &["orr x0, x0, x1"]),
        BinaryOp::And => ins(out, &["and x0, x0, x1"]),
        BinaryOp::Xor => ins(out, &["eor x0, x0, x1"]),
        BinaryOp::Shl => ins(out, &["lsl x0, x0, x1"]),
        BinaryOp::Shr => ins(out, &["asr x0, x0, x1"]),
    }
}

/// `cset` condition for a signed comparison
fn condition(op: CompareOp) -> &'static str {
    match op {
        CompareOp::Eq => "eq",
        CompareOp::Ne => "ne",
        CompareOp::Lt => "lt",
        CompareOp::Gt => "gt",
        CompareOp::Le => "le",
        CompareOp::Ge => "ge",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gollo_ir::compile_source;
    use pretty_assertions::assert_eq;

    fn asm(source: &str) -> String {
        let program = compile_source(source, 0).expect("compiles");
        Aarch64Backend::new().generate(&program).expect("generates")
    }

    fn body(asm: &str, addr: usize) -> Vec<String> {
        let start = format!("_addr_{}:", addr);
        asm.lines()
            .skip_while(|line| *line != start)
            .skip(1)
            .take_while(|line| !line.starts_with("_addr_"))
            .filter(|line| !line.trim_start().starts_with("//"))
            .map(|line| line.trim().to_string())
            .collect()
    }

    #[test]
    fn test_push_int_builds_immediate() {
        let out = asm("-9223372036854775808 5 -1 74565");
        assert_eq!(
            body(&out, 0),
            vec!["movz x0, #0x0", "movk x0, #0x8000, lsl #48", "str x0, [sp, #-16]!"]
        );
        assert_eq!(body(&out, 1), vec!["movz x0, #0x5", "str x0, [sp, #-16]!"]);
        assert_eq!(
            body(&out, 2)[..4],
            [
                "movz x0, #0xffff",
                "movk x0, #0xffff, lsl #16",
                "movk x0, #0xffff, lsl #32",
                "movk x0, #0xffff, lsl #48",
            ]
        );
        assert_eq!(body(&out, 3)[..2], ["movz x0, #0x2345", "movk x0, #0x1, lsl #16"]);
    }

    #[test]
    fn test_no_literal_pool_loads() {
        let out = asm(r#""hi" 1 1 syscall3 drop 10 0 / put"#);
        assert!(!out.lines().any(|line| line.contains(", =")), "{}", out);
        assert!(!out.contains(".ltorg"));
        assert_eq!(
            body(&out, 0)[2..4],
            ["adrp x0, _str_0", "add x0, x0, :lo12:_str_0"]
        );
        assert!(out.contains("adrp x1, div_zero_msg"));
    }

    #[test]
    fn test_every_opcode_is_implemented() {
        let out = asm(
            "1 2 + 3 - 4 * 5 / 6 % 7 bor 8 band 9 xor 1 shl 1 shr
             1 == 1 != 1 < 1 > 1 <= 1 >= put
             1 copy 2copy swap drop over drop drop drop
             39 syscall0 drop 0 60 syscall1 drop 1 2 3 syscall2 drop
             \"s\" 1 1 syscall3 drop
             while 0 do end 1 if else end",
        );
        assert!(out.contains("sdiv x0, x0, x1"));
        assert!(out.contains("msub x0, x2, x1, x0"));
        assert!(out.contains("asr x0, x0, x1"));
        assert!(out.contains("cset x0, ge"));
        assert!(out.contains("bl write_line"));
        assert!(out.contains("_str_0: .byte 0x73"));
    }

    #[test]
    fn test_control_flow_jumps() {
        let out = asm("1 2 < if 10 put else 20 put end");
        assert_eq!(body(&out, 3), vec!["ldr x0, [sp], #16", "cbz x0, _addr_7"]);
        assert_eq!(body(&out, 6), vec!["b _addr_9"]);
        assert!(body(&out, 9).is_empty());
    }

    #[test]
    fn test_loop_end_branches_to_head() {
        let out = asm("1 while copy 5 < do copy put 1 + end drop");
        assert_eq!(body(&out, 10), vec!["b _addr_1"]);
        assert_eq!(body(&out, 5).last().map(String::as_str), Some("cbz x0, _addr_11"));
    }

    #[test]
    fn test_syscall_argument_registers() {
        let out = asm("1 2 3 syscall2");
        assert_eq!(
            body(&out, 3),
            vec![
                "ldr x8, [sp], #16",
                "ldr x0, [sp], #16",
                "ldr x1, [sp], #16",
                "svc #0",
                "str x0, [sp, #-16]!",
            ]
        );
    }

    #[test]
    fn test_exit_sequence() {
        let out = asm("");
        assert_eq!(body(&out, 0)[..3], ["mov x0, #0", "mov x8, #93", "svc #0"]);
        assert!(out.contains("mov x2, #32"));
    }
}
