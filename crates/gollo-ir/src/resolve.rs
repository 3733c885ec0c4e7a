//! Block resolver
//!
//! One left-to-right pass over the raw operations with a local stack of
//! open blocks. Afterwards:
//!
//! - `if` jumps to the first operation of its `else` body, or to its `end`
//! - `else` jumps to its `end`
//! - `do` jumps one past its `end` (loop exit)
//! - an `end` closing a loop jumps to the loop's `while`
//!
//! ```text
//! addr  0 1     2    3 4 5  6    7   8 9 10  11
//! word  1 while copy 5 < do copy put 1 + end drop
//!
//! do -> 11    end -> 1
//! ```

use crate::opcode::Opcode;
use crate::operation::{Operation, Program};
use gollo_error::{Diagnostic, ErrorCode, Result};

/// A block opener still waiting for its closer
#[derive(Debug, Clone, Copy)]
enum Open {
    If(usize),
    Else(usize),
    While(usize),
    Do { at: usize, head: usize },
}

impl Open {
    fn addr(self) -> usize {
        match self {
            Open::If(at) | Open::Else(at) | Open::While(at) | Open::Do { at, .. } => at,
        }
    }
}

/// Resolves every jump target in `ops`.
///
/// Either all targets are resolved or the first structural error is
/// returned; there is no partial result.
pub fn resolve(mut ops: Vec<Operation>) -> Result<Program> {
    let mut open: Vec<Open> = Vec::new();

    for addr in 0..ops.len() {
        match ops[addr].opcode {
            Opcode::If => open.push(Open::If(addr)),
            Opcode::While => open.push(Open::While(addr)),
            Opcode::Else => match open.pop() {
                Some(Open::If(at)) => {
                    ops[at].set_jump(addr + 1);
                    open.push(Open::Else(addr));
                }
                other => return Err(mismatch(&ops, addr, other, "`else` must follow an `if` body")),
            },
            Opcode::Do => match open.pop() {
                Some(Open::While(head)) => open.push(Open::Do { at: addr, head }),
                other => return Err(mismatch(&ops, addr, other, "`do` must follow a `while` condition")),
            },
            Opcode::End => match open.pop() {
                Some(Open::If(at) | Open::Else(at)) => ops[at].set_jump(addr),
                Some(Open::Do { at, head }) => {
                    ops[addr].set_jump(head);
                    ops[at].set_jump(addr + 1);
                }
                other => {
                    return Err(mismatch(
                        &ops,
                        addr,
                        other,
                        "`end` can only close if/else or do/while blocks",
                    ))
                }
            },
            _ => {}
        }
    }

    if let Some(&oldest) = open.first() {
        let op = &ops[oldest.addr()];
        return Err(Diagnostic::error("block is never closed with `end`")
            .with_code(ErrorCode::UNCLOSED_BLOCK)
            .with_label(op.span, format!("this `{}` is still open at end of file", op.opcode.word()))
            .with_help("add `end` to close the block"));
    }

    tracing::debug!(ops = ops.len(), "resolved blocks");
    Ok(Program::from_resolved(ops))
}

/// Error for a keyword that does not fit the innermost open block
fn mismatch(ops: &[Operation], addr: usize, innermost: Option<Open>, rule: &str) -> Diagnostic {
    let op = &ops[addr];
    let diagnostic = Diagnostic::error(format!("unexpected `{}`", op.opcode.word()))
        .with_code(ErrorCode::UNMATCHED_KEYWORD)
        .with_label(op.span, rule);

    match innermost {
        Some(open) => {
            let opener = &ops[open.addr()];
            diagnostic.with_secondary_label(
                opener.span,
                format!("innermost open block is this `{}`", opener.opcode.word()),
            )
        }
        None => diagnostic.with_note("no block is open here"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build;
    use gollo_error::Position;
    use gollo_lexer::tokenize;
    use pretty_assertions::assert_eq;

    fn resolved(source: &str) -> Result<Program> {
        let (tokens, _) = tokenize(source, 0);
        let (ops, diagnostics) = build(tokens);
        assert!(diagnostics.is_empty());
        resolve(ops)
    }

    fn jumps(source: &str) -> Vec<Option<usize>> {
        let program = resolved(source).expect("resolves");
        program.iter().map(|op| op.jump()).collect()
    }

    #[test]
    fn test_if_end() {
        //          0 1 2 3  4  5   6
        assert_eq!(
            jumps("1 2 < if 10 put end"),
            vec![None, None, None, Some(6), None, None, None]
        );
    }

    #[test]
    fn test_if_else_end() {
        //       0 1 2 3  4  5   6    7  8   9
        let src = "1 2 < if 10 put else 20 put end";
        let program = resolved(src).expect("resolves");
        assert_eq!(program[3].jump(), Some(7));
        assert_eq!(program[6].jump(), Some(9));
        assert_eq!(program[9].jump(), None);
        assert_eq!(program.loop_head(9), None);
    }

    #[test]
    fn test_while_loop() {
        //       0 1     2    3 4 5  6    7   8 9 10  11
        let src = "1 while copy 5 < do copy put 1 + end drop";
        let program = resolved(src).expect("resolves");
        assert_eq!(program[1].jump(), None);
        assert_eq!(program[5].jump(), Some(11));
        assert_eq!(program[10].jump(), Some(1));
        assert_eq!(program.loop_head(10), Some(1));
    }

    #[test]
    fn test_nested_blocks() {
        let src = "while 1 do 0 if 1 else 2 end end";
        let program = resolved(src).expect("resolves");
        assert_eq!(program[2].jump(), Some(10));
        assert_eq!(program[4].jump(), Some(7));
        assert_eq!(program[6].jump(), Some(8));
        assert_eq!(program[8].jump(), None);
        assert_eq!(program[9].jump(), Some(0));
        assert_eq!(program.loop_head(8), None);
        assert_eq!(program.loop_head(9), Some(0));
    }

    #[test]
    fn test_if_inside_loop_does_not_loop_back() {
        // The `end` of an `if` must never look like a loop end, even when
        // address 0 is a `while`.
        let src = "while 0 do 1 if 2 put end end";
        let program = resolved(src).expect("resolves");
        assert_eq!(program[7].jump(), None);
        assert_eq!(program.loop_head(7), None);
        assert_eq!(program.loop_head(8), Some(0));
    }

    #[test]
    fn test_unclosed_block_points_at_oldest_opener() {
        let err = resolved("1 if\n  while 1 do").unwrap_err();
        assert_eq!(err.code, Some(ErrorCode::UNCLOSED_BLOCK));
        assert_eq!(err.primary_span().map(|s| s.start), Some(Position::new(1, 3, 2)));
    }

    #[test]
    fn test_end_without_block() {
        let err = resolved("1 put end").unwrap_err();
        assert_eq!(err.code, Some(ErrorCode::UNMATCHED_KEYWORD));
        assert_eq!(err.message, "unexpected `end`");
        assert_eq!(err.notes, vec!["no block is open here".to_string()]);
    }

    #[test]
    fn test_end_closing_while_without_do() {
        let err = resolved("while 1 end").unwrap_err();
        assert_eq!(err.code, Some(ErrorCode::UNMATCHED_KEYWORD));
        assert_eq!(err.labels.len(), 2);
        assert_eq!(err.labels[1].span.start.column, 1);
    }

    #[test]
    fn test_else_without_if() {
        let err = resolved("while 1 else end").unwrap_err();
        assert_eq!(err.message, "unexpected `else`");
    }

    #[test]
    fn test_do_without_while() {
        let err = resolved("1 if 1 do end end").unwrap_err();
        assert_eq!(err.message, "unexpected `do`");
    }

    #[test]
    fn test_double_else() {
        let err = resolved("1 if 1 else 2 else 3 end").unwrap_err();
        assert_eq!(err.message, "unexpected `else`");
        assert_eq!(err.primary_span().map(|s| s.start.column), Some(15));
    }

    #[test]
    fn test_listing() {
        let listing = resolved("1 if 2 put end").expect("resolves").to_string();
        let lines: Vec<_> = listing.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("   0  push-int 1 "));
        assert!(lines[1].starts_with("   1  if -> 4 "));
        assert!(lines[1].ends_with("; 1:3"));
        assert!(lines[4].ends_with("; 1:12"));
    }

    #[test]
    fn test_json_dump() {
        let program = resolved("1 if 2 end").expect("resolves");
        let json = serde_json::to_value(&program).expect("serializes");
        assert_eq!(json[1]["opcode"], "If");
        assert_eq!(json[1]["jump"], 3);
        assert_eq!(json[0]["opcode"]["PushInt"], 1);
        assert_eq!(json[0]["span"]["start"]["column"], 1);
    }
}
