//! IR opcodes
//!
//! The opcode set is closed: every backend matches on [`Opcode`] without a
//! wildcard arm, so adding a variant is a compile error until every
//! backend handles it.

use serde::Serialize;
use std::fmt;

/// Binary operation (pops rhs, then lhs; pushes one result)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    // Bitwise
    Or,
    And,
    Xor,
    Shl,
    Shr,
}

impl BinaryOp {
    pub fn word(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Or => "bor",
            BinaryOp::And => "band",
            BinaryOp::Xor => "xor",
            BinaryOp::Shl => "shl",
            BinaryOp::Shr => "shr",
        }
    }
}

/// Comparison (pops rhs, then lhs; pushes 1 or 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl CompareOp {
    pub fn word(&self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Gt => ">",
            CompareOp::Le => "<=",
            CompareOp::Ge => ">=",
        }
    }
}

/// One IR instruction kind, with its literal payload if it has one
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Opcode {
    /// Pushes an integer literal
    PushInt(i64),
    /// Pushes the byte length, then the memory address of a string literal
    PushStr(String),
    Binary(BinaryOp),
    Compare(CompareOp),

    // Structured control flow, resolved into jumps
    If,
    Else,
    End,
    Do,
    While,

    /// Pops and prints a decimal integer plus newline
    Put,

    // Stack shuffles
    Copy,
    TwoCopy,
    Swap,
    Drop,
    Over,

    // Raw syscalls: pop the number, then N arguments
    Syscall0,
    Syscall1,
    Syscall2,
    Syscall3,
}

impl Opcode {
    /// Maps a source word to its opcode
    pub fn from_word(word: &str) -> Option<Opcode> {
        let op = match word {
            "+" => Opcode::Binary(BinaryOp::Add),
            "-" => Opcode::Binary(BinaryOp::Sub),
            "*" => Opcode::Binary(BinaryOp::Mul),
            "/" => Opcode::Binary(BinaryOp::Div),
            "%" => Opcode::Binary(BinaryOp::Mod),
            "bor" => Opcode::Binary(BinaryOp::Or),
            "band" => Opcode::Binary(BinaryOp::And),
            "xor" => Opcode::Binary(BinaryOp::Xor),
            "shl" => Opcode::Binary(BinaryOp::Shl),
            "shr" => Opcode::Binary(BinaryOp::Shr),

            "==" => Opcode::Compare(CompareOp::Eq),
            "!=" => Opcode::Compare(CompareOp::Ne),
            "<" => Opcode::Compare(CompareOp::Lt),
            ">" => Opcode::Compare(CompareOp::Gt),
            "<=" => Opcode::Compare(CompareOp::Le),
            ">=" => Opcode::Compare(CompareOp::Ge),

            "if" => Opcode::If,
            "else" => Opcode::Else,
            "end" => Opcode::End,
            "do" => Opcode::Do,
            "while" => Opcode::While,

            "put" => Opcode::Put,

            "copy" => Opcode::Copy,
            "2copy" => Opcode::TwoCopy,
            "swap" => Opcode::Swap,
            "drop" => Opcode::Drop,
            "over" => Opcode::Over,

            "syscall0" => Opcode::Syscall0,
            "syscall1" => Opcode::Syscall1,
            "syscall2" => Opcode::Syscall2,
            "syscall3" => Opcode::Syscall3,

            _ => return None,
        };
        Some(op)
    }

    /// Source spelling of the opcode (literals render as `int`/`str`)
    pub fn word(&self) -> &'static str {
        match self {
            Opcode::PushInt(_) => "int",
            Opcode::PushStr(_) => "str",
            Opcode::Binary(op) => op.word(),
            Opcode::Compare(op) => op.word(),
            Opcode::If => "if",
            Opcode::Else => "else",
            Opcode::End => "end",
            Opcode::Do => "do",
            Opcode::While => "while",
            Opcode::Put => "put",
            Opcode::Copy => "copy",
            Opcode::TwoCopy => "2copy",
            Opcode::Swap => "swap",
            Opcode::Drop => "drop",
            Opcode::Over => "over",
            Opcode::Syscall0 => "syscall0",
            Opcode::Syscall1 => "syscall1",
            Opcode::Syscall2 => "syscall2",
            Opcode::Syscall3 => "syscall3",
        }
    }

    /// Whether the block resolver assigns this opcode a jump target
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Opcode::If | Opcode::Else | Opcode::End | Opcode::Do | Opcode::While
        )
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Opcode::PushInt(v) => write!(f, "push-int {}", v),
            Opcode::PushStr(s) => write!(f, "push-str {:?}", s),
            other => f.write_str(other.word()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VOCABULARY: &[&str] = &[
        "+", "-", "*", "/", "%", "bor", "band", "xor", "shl", "shr", "==", "!=", "<", ">", "<=",
        ">=", "if", "else", "end", "do", "while", "put", "copy", "2copy", "swap", "drop", "over",
        "syscall0", "syscall1", "syscall2", "syscall3",
    ];

    #[test]
    fn test_vocabulary_round_trips_through_word() {
        for word in VOCABULARY {
            let op = Opcode::from_word(word).unwrap_or_else(|| panic!("`{}` not recognized", word));
            assert_eq!(op.word(), *word);
        }
    }

    #[test]
    fn test_unknown_words() {
        assert_eq!(Opcode::from_word("dup"), None);
        assert_eq!(Opcode::from_word("PUT"), None);
        assert_eq!(Opcode::from_word("syscall4"), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Opcode::PushInt(-3).to_string(), "push-int -3");
        assert_eq!(Opcode::PushStr("hi".into()).to_string(), "push-str \"hi\"");
        assert_eq!(Opcode::Binary(BinaryOp::Shl).to_string(), "shl");
    }
}
