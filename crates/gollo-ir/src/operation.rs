//! Operations and programs
//!
//! A [`Program`] is a flat `Vec` of [`Operation`]s; an operation's index
//! is its address and jump targets are plain indices into the same vector.

use crate::opcode::Opcode;
use gollo_error::{Span, Spanned};
use serde::Serialize;
use std::fmt;
use std::ops::Index;

/// One IR instruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Operation {
    pub opcode: Opcode,
    pub span: Span,
    /// Resolved jump target, set once by the block resolver
    jump: Option<usize>,
}

impl Operation {
    pub fn new(opcode: Opcode, span: Span) -> Self {
        Self {
            opcode,
            span,
            jump: None,
        }
    }

    /// Resolved jump target.
    ///
    /// Always `Some` for `if`, `else` and `do` in a resolved program; `Some`
    /// for `end` only when it closes a `while` loop.
    pub fn jump(&self) -> Option<usize> {
        self.jump
    }

    pub(crate) fn set_jump(&mut self, target: usize) {
        debug_assert!(self.jump.is_none(), "jump target of `{}` written twice", self.opcode);
        self.jump = Some(target);
    }
}

impl Spanned for Operation {
    fn span(&self) -> Span {
        self.span
    }
}

/// A fully resolved program, ready for a backend
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Program {
    ops: Vec<Operation>,
}

impl Program {
    /// Only the block resolver builds programs, so every jump in one is resolved.
    pub(crate) fn from_resolved(ops: Vec<Operation>) -> Self {
        Self { ops }
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Operation> {
        self.ops.iter()
    }

    /// If the operation at `addr` is an `end` closing a loop, the address
    /// of the loop's `while`
    pub fn loop_head(&self, addr: usize) -> Option<usize> {
        let op = self.ops.get(addr)?;
        if op.opcode != Opcode::End {
            return None;
        }
        op.jump
            .filter(|&target| matches!(self.ops.get(target), Some(t) if t.opcode == Opcode::While))
    }
}

impl Index<usize> for Program {
    type Output = Operation;

    fn index(&self, addr: usize) -> &Operation {
        &self.ops[addr]
    }
}

impl<'a> IntoIterator for &'a Program {
    type Item = &'a Operation;
    type IntoIter = std::slice::Iter<'a, Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.iter()
    }
}

/// Human-readable listing, one operation per line:
///
/// ```text
///    3  if -> 7          ; 1:7
/// ```
impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.ops.len().max(1).to_string().len().max(4);
        for (addr, op) in self.ops.iter().enumerate() {
            let text = match op.jump {
                Some(target) => format!("{} -> {}", op.opcode, target),
                None => op.opcode.to_string(),
            };
            writeln!(f, "{addr:>width$}  {text:<24} ; {}", op.span)?;
        }
        Ok(())
    }
}
