//! Code generation errors

use std::fmt;
use thiserror::Error;

/// Code generation result type
pub type Result<T> = std::result::Result<T, CodegenError>;

#[derive(Debug, Error)]
pub enum CodegenError {
    #[error("failed to format assembly: {0}")]
    Fmt(#[from] fmt::Error),

    #[error("`{op}` at address {addr} has no jump target")]
    UnresolvedJump { op: &'static str, addr: usize },

    #[error("unknown target `{0}` (expected one of: x86_64-linux, aarch64-linux)")]
    UnknownTarget(String),

    #[error("no native backend for host {arch}-{os}; pass --target explicitly")]
    UnsupportedHost {
        arch: &'static str,
        os: &'static str,
    },
}
