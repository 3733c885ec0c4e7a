//! External assembler and linker

use crate::CliError;
use gollo_codegen::Target;
use std::path::Path;
use std::process::Command;

/// Platform tools that turn generated assembly into an executable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    assembler: String,
    assembler_flags: &'static [&'static str],
    linker: String,
}

impl Toolchain {
    /// Host tools when `target` is the host, `<arch>-linux-gnu-` prefixed
    /// cross tools otherwise
    pub fn for_target(target: Target) -> Self {
        let prefix = match Target::host() {
            Ok(host) if host == target => String::new(),
            _ => match target {
                Target::X86_64Linux => "x86_64-linux-gnu-".to_string(),
                Target::Aarch64Linux => "aarch64-linux-gnu-".to_string(),
            },
        };

        match target {
            Target::X86_64Linux => Self {
                assembler: "nasm".to_string(),
                assembler_flags: &["-felf64"],
                linker: format!("{prefix}ld"),
            },
            Target::Aarch64Linux => Self {
                assembler: format!("{prefix}as"),
                assembler_flags: &[],
                linker: format!("{prefix}ld"),
            },
        }
    }

    pub fn assemble(&self, asm: &Path, object: &Path) -> Result<(), CliError> {
        let mut cmd = Command::new(&self.assembler);
        cmd.args(self.assembler_flags).arg(asm).arg("-o").arg(object);
        run_tool(&mut cmd)
    }

    pub fn link(&self, object: &Path, output: &Path) -> Result<(), CliError> {
        let mut cmd = Command::new(&self.linker);
        cmd.arg("-o").arg(output).arg(object);
        run_tool(&mut cmd)
    }
}

/// Runs a tool to completion, inheriting stdio
pub fn run_tool(cmd: &mut Command) -> Result<(), CliError> {
    let program = cmd.get_program().to_string_lossy().into_owned();
    tracing::info!(command = ?cmd, "running");

    let status = cmd
        .status()
        .map_err(|source| CliError::Spawn {
            program: program.clone(),
            source,
        })?;

    if !status.success() {
        return Err(CliError::ToolFailed { program, status });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_x86_64_uses_nasm() {
        let toolchain = Toolchain::for_target(Target::X86_64Linux);
        assert_eq!(toolchain.assembler, "nasm");
        assert_eq!(toolchain.assembler_flags, &["-felf64"]);
        assert!(toolchain.linker.ends_with("ld"));
    }

    #[test]
    fn test_cross_tools_are_prefixed() {
        for target in Target::ALL {
            let toolchain = Toolchain::for_target(target);
            let native = Target::host().ok() == Some(target);
            assert_eq!(toolchain.linker == "ld", native, "{}", toolchain.linker);
        }
    }

    #[test]
    fn test_missing_tool_is_reported() {
        let err = run_tool(&mut Command::new("gollo-definitely-not-a-tool")).unwrap_err();
        assert!(matches!(err, CliError::Spawn { program, .. } if program == "gollo-definitely-not-a-tool"));
    }
}
