//! Runs every fixture program and compares its output with the expected file.
//!
//! On an x86_64 Linux host with `nasm` and `ld` installed, fixtures are also
//! compiled to native executables whose stdout must match the interpreter's.

use gollo_codegen::Target;
use gollo_tests::{emit, fixtures_dir, interpret};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

struct Fixture {
    name: String,
    source: String,
    expected: String,
}

fn fixtures() -> Vec<Fixture> {
    let dir = fixtures_dir();
    let mut paths: Vec<PathBuf> = fs::read_dir(&dir)
        .unwrap_or_else(|e| panic!("can't read {}: {}", dir.display(), e))
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().map_or(false, |ext| ext == "glo"))
        .collect();
    paths.sort();

    paths
        .into_iter()
        .map(|path| {
            let name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let expected_path = path.with_file_name(format!("{}.output.txt", name));
            Fixture {
                source: fs::read_to_string(&path).expect("fixture source"),
                expected: fs::read_to_string(&expected_path)
                    .unwrap_or_else(|e| panic!("missing {}: {}", expected_path.display(), e)),
                name,
            }
        })
        .collect()
}

#[test]
fn test_fixtures_match_expected_output() {
    let fixtures = fixtures();
    assert!(!fixtures.is_empty(), "no fixtures found");

    for fixture in fixtures {
        let execution = interpret(&fixture.source);
        assert!(
            execution.error.is_none(),
            "{}: runtime error {:?}",
            fixture.name,
            execution.error
        );
        assert_eq!(execution.stdout, fixture.expected, "fixture `{}`", fixture.name);
    }
}

#[test]
fn test_fixtures_generate_for_every_target() {
    for fixture in fixtures() {
        for target in Target::ALL {
            let asm = emit(&fixture.source, target);
            assert!(asm.contains("_start:"), "{} on {}", fixture.name, target);
        }
    }
}

fn has_tool(name: &str, arg: &str) -> bool {
    Command::new(name).arg(arg).output().is_ok()
}

fn build_native(source: &str, dir: &Path, name: &str) -> PathBuf {
    let asm_path = dir.join(format!("{}.asm", name));
    let object = dir.join(format!("{}.o", name));
    let executable = dir.join(name);
    fs::write(&asm_path, emit(source, Target::X86_64Linux)).expect("write assembly");

    let status = Command::new("nasm")
        .arg("-felf64")
        .arg(&asm_path)
        .arg("-o")
        .arg(&object)
        .status()
        .expect("nasm");
    assert!(status.success(), "nasm failed for {}", name);

    let status = Command::new("ld")
        .arg("-o")
        .arg(&executable)
        .arg(&object)
        .status()
        .expect("ld");
    assert!(status.success(), "ld failed for {}", name);

    executable
}

#[test]
fn test_native_round_trip() {
    if !cfg!(all(target_arch = "x86_64", target_os = "linux"))
        || !has_tool("nasm", "-v")
        || !has_tool("ld", "--version")
    {
        eprintln!("skipping native round trip: needs nasm and ld on x86_64 Linux");
        return;
    }

    let dir = tempfile::tempdir().expect("tempdir");
    for fixture in fixtures() {
        let executable = build_native(&fixture.source, dir.path(), &fixture.name);
        let output = Command::new(&executable).output().expect("run executable");
        assert!(output.status.success(), "{} exited with {}", fixture.name, output.status);

        let interpreted = interpret(&fixture.source);
        assert_eq!(
            String::from_utf8_lossy(&output.stdout),
            interpreted.stdout,
            "fixture `{}`",
            fixture.name
        );
    }

    let executable = build_native("10 0 /", dir.path(), "div_zero");
    let output = Command::new(&executable).output().expect("run executable");
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        String::from_utf8_lossy(&output.stderr),
        "runtime error: division by zero\n"
    );
}
