//! Gollo toolchain CLI

mod toolchain;

use clap::{Parser, Subcommand};
use gollo_codegen::{CodegenError, CompileOptions, Target};
use gollo_error::{Diagnostic, DiagnosticRenderer, Diagnostics, SourceCache};
use gollo_interp::RuntimeError;
use gollo_ir::Program;
use std::ffi::OsStr;
use std::fs;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode, ExitStatus};
use thiserror::Error;
use toolchain::Toolchain;
use tracing::Level;

/// Source file extension
const EXTENSION: &str = "glo";
/// File looked up when a directory is given
const DIRECTORY_ENTRY: &str = "main.glo";

#[derive(Parser)]
#[command(name = "gollo")]
#[command(version)]
#[command(about = "Gollo stack language toolchain", long_about = None)]
struct Cli {
    /// Log more (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interprets a program
    Run {
        /// Input file or directory containing main.glo
        #[arg(value_name = "PATH")]
        input: PathBuf,
    },

    /// Compiles a program to a native executable
    Compile {
        #[arg(value_name = "PATH")]
        input: PathBuf,

        /// Run the executable after building it
        #[arg(short, long)]
        run: bool,

        /// Output executable (default: input path without extension)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Target: x86_64-linux or aarch64-linux (default: host)
        #[arg(long)]
        target: Option<Target>,

        /// Keep the generated assembly and object file
        #[arg(long)]
        keep_asm: bool,
    },

    /// Writes the generated assembly without assembling it
    Emit {
        #[arg(value_name = "PATH")]
        input: PathBuf,

        #[arg(long)]
        target: Option<Target>,

        /// Output file (default: stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Shows file tokens (debug)
    Lex {
        #[arg(value_name = "PATH")]
        input: PathBuf,
    },

    /// Shows the resolved IR (debug)
    Ir {
        #[arg(value_name = "PATH")]
        input: PathBuf,

        /// Print JSON instead of a listing
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Error)]
pub enum CliError {
    /// Compile or runtime diagnostics; rendered against the source cache
    #[error("{0}")]
    Diagnostics(Diagnostics),

    #[error("`{}` is not a gollo source file (expected a `.{}` extension)", .0.display(), EXTENSION)]
    BadExtension(PathBuf),

    #[error(transparent)]
    Codegen(#[from] CodegenError),

    #[error("failed to write `{}`: {source}", path.display())]
    WriteFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to run `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("`{program}` failed ({status})")]
    ToolFailed { program: String, status: ExitStatus },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl From<Diagnostics> for CliError {
    fn from(diagnostics: Diagnostics) -> Self {
        CliError::Diagnostics(diagnostics)
    }
}

impl From<RuntimeError> for CliError {
    fn from(error: RuntimeError) -> Self {
        CliError::Diagnostics(Diagnostic::from(error).into())
    }
}

/// Source files loaded during one invocation
struct Session {
    cache: SourceCache,
}

impl Session {
    fn new() -> Self {
        Self {
            cache: SourceCache::new(),
        }
    }

    fn tokens(&mut self, input: &Path) -> Result<Vec<gollo_lexer::Token>, CliError> {
        let path = resolve_source(input)?;
        tracing::info!(path = %path.display(), "loading source");
        Ok(gollo_lexer::lex_file(&path, &mut self.cache)?)
    }

    fn program(&mut self, input: &Path) -> Result<Program, CliError> {
        let tokens = self.tokens(input)?;
        Ok(gollo_ir::lower(tokens)?)
    }

    fn report(&self, diagnostics: &Diagnostics) {
        let renderer =
            DiagnosticRenderer::new(&self.cache).with_colors(io::stderr().is_terminal());
        eprint!("{}", diagnostics.render(&renderer));
    }
}

/// A directory stands for its `main.glo`; anything else must end in `.glo`
fn resolve_source(input: &Path) -> Result<PathBuf, CliError> {
    let path = if input.is_dir() {
        input.join(DIRECTORY_ENTRY)
    } else {
        input.to_path_buf()
    };

    if path.extension() != Some(OsStr::new(EXTENSION)) {
        return Err(CliError::BadExtension(path));
    }
    Ok(path)
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut session = Session::new();
    match execute(cli.command, &mut session) {
        Ok(code) => code,
        Err(CliError::Diagnostics(diagnostics)) => {
            session.report(&diagnostics);
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn execute(command: Commands, session: &mut Session) -> Result<ExitCode, CliError> {
    match command {
        Commands::Run { input } => {
            let program = session.program(&input)?;
            gollo_interp::run(&program)?;
            Ok(ExitCode::SUCCESS)
        }

        Commands::Compile {
            input,
            run,
            output,
            target,
            keep_asm,
        } => {
            let program = session.program(&input)?;
            let target = target.map_or_else(Target::host, Ok)?;
            let output = output.unwrap_or_else(|| default_output(&input));

            let mut options = CompileOptions::new(output, target);
            options.keep_asm = keep_asm;
            let executable = build(&program, &options)?;

            if run {
                return run_executable(&executable);
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::Emit {
            input,
            target,
            output,
        } => {
            let program = session.program(&input)?;
            let target = target.map_or_else(Target::host, Ok)?;
            let asm = gollo_codegen::generate(&program, target)?;

            match output {
                Some(path) => write_file(&path, &asm)?,
                None => io::stdout().lock().write_all(asm.as_bytes())?,
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::Lex { input } => {
            let tokens = session.tokens(&input)?;
            write_tokens(&mut io::stdout().lock(), &session.cache, &tokens)?;
            Ok(ExitCode::SUCCESS)
        }

        Commands::Ir { input, json } => {
            let program = session.program(&input)?;
            let mut stdout = io::stdout().lock();
            if json {
                serde_json::to_writer_pretty(&mut stdout, &program)?;
                writeln!(stdout)?;
            } else {
                write!(stdout, "{}", program)?;
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// `dir/prog.glo` builds `dir/prog`; a directory builds `dir/main`
fn default_output(input: &Path) -> PathBuf {
    if input.is_dir() {
        input.join(DIRECTORY_ENTRY).with_extension("")
    } else {
        input.with_extension("")
    }
}

/// One `file:line:column  token` row per token
fn write_tokens(
    out: &mut impl Write,
    cache: &SourceCache,
    tokens: &[gollo_lexer::Token],
) -> io::Result<()> {
    for token in tokens {
        writeln!(out, "{:<20} {}", cache.locate(token.span), token.kind)?;
    }
    Ok(())
}

fn write_file(path: &Path, contents: &str) -> Result<(), CliError> {
    fs::write(path, contents).map_err(|source| CliError::WriteFile {
        path: path.to_path_buf(),
        source,
    })
}

/// Generates, assembles and links; returns the executable path
fn build(program: &Program, options: &CompileOptions) -> Result<PathBuf, CliError> {
    let asm = gollo_codegen::generate(program, options.target)?;
    let asm_path = options.asm_path();
    let object_path = options.object_path();
    write_file(&asm_path, &asm)?;

    let toolchain = Toolchain::for_target(options.target);
    toolchain.assemble(&asm_path, &object_path)?;
    toolchain.link(&object_path, &options.output)?;

    if !options.keep_asm {
        for path in [&asm_path, &object_path] {
            if let Err(e) = fs::remove_file(path) {
                tracing::warn!(path = %path.display(), error = %e, "could not remove intermediate file");
            }
        }
    }

    tracing::info!(output = %options.output.display(), target = %options.target, "built executable");
    Ok(options.output.clone())
}

/// Runs the built program and forwards its exit code
fn run_executable(executable: &Path) -> Result<ExitCode, CliError> {
    // A bare file name would be looked up in PATH
    let path = if executable.components().count() == 1 {
        Path::new(".").join(executable)
    } else {
        executable.to_path_buf()
    };

    let program = path.display().to_string();
    tracing::info!(%program, "running");
    let status = Command::new(&path)
        .status()
        .map_err(|source| CliError::Spawn {
            program: program.clone(),
            source,
        })?;

    Ok(match status.code() {
        Some(code) => ExitCode::from(code as u8),
        None => ExitCode::FAILURE,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_compile_flags() {
        let cli = Cli::try_parse_from([
            "gollo", "-vv", "compile", "-r", "-o", "out", "--target", "aarch64-linux", "prog.glo",
        ])
        .expect("parses");
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Compile {
                input,
                run,
                output,
                target,
                keep_asm,
            } => {
                assert_eq!(input, PathBuf::from("prog.glo"));
                assert!(run);
                assert_eq!(output, Some(PathBuf::from("out")));
                assert_eq!(target, Some(Target::Aarch64Linux));
                assert!(!keep_asm);
            }
            _ => panic!("expected compile"),
        }
    }

    #[test]
    fn test_unknown_target_is_rejected() {
        assert!(Cli::try_parse_from(["gollo", "emit", "--target", "mips", "a.glo"]).is_err());
    }

    #[test]
    fn test_resolve_source_extension() {
        assert_eq!(
            resolve_source(Path::new("examples/hello.glo")).ok(),
            Some(PathBuf::from("examples/hello.glo"))
        );
        assert!(matches!(
            resolve_source(Path::new("hello.txt")),
            Err(CliError::BadExtension(_))
        ));
        assert!(matches!(resolve_source(Path::new("hello")), Err(CliError::BadExtension(_))));
    }

    #[test]
    fn test_directory_resolves_to_main() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = resolve_source(dir.path()).expect("resolves");
        assert_eq!(path, dir.path().join("main.glo"));
        assert_eq!(default_output(dir.path()), dir.path().join("main"));
    }

    #[test]
    fn test_missing_file_is_a_diagnostic() {
        let mut session = Session::new();
        let err = session.program(Path::new("/no/such/dir/prog.glo")).unwrap_err();
        match err {
            CliError::Diagnostics(diagnostics) => assert_eq!(diagnostics.len(), 1),
            other => panic!("expected diagnostics, got {:?}", other),
        }
    }

    #[test]
    fn test_lex_rows_carry_file_locations() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("lex.glo");
        fs::write(&path, "34 put\n").expect("write");

        let mut session = Session::new();
        let tokens = session.tokens(&path).expect("lexes");
        let mut out = Vec::new();
        write_tokens(&mut out, &session.cache, &tokens).expect("writes");

        let text = String::from_utf8(out).expect("utf-8");
        let rows: Vec<_> = text.lines().collect();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].contains("lex.glo:1:1"), "{}", rows[0]);
        assert!(rows[1].contains("lex.glo:1:4"), "{}", rows[1]);
        assert!(rows[1].ends_with("word `put`"), "{}", rows[1]);
    }

    #[test]
    fn test_session_renders_source_errors() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bad.glo");
        fs::write(&path, "1 frob put\n").expect("write");

        let mut session = Session::new();
        let Err(CliError::Diagnostics(diagnostics)) = session.program(&path) else {
            panic!("expected diagnostics");
        };
        let renderer = DiagnosticRenderer::new(&session.cache).without_colors();
        let text = diagnostics.render(&renderer);
        assert!(text.starts_with("error[EP001]: unknown word `frob`"));
        assert!(text.contains("bad.glo:1:3"));
    }
}
