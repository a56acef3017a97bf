//! Snapshot tests: each case directory under `tests/snapshots/<group>/` holds
//! a `src/` tree of Go packages, an optional `gomono.toml`, and:
//!
//! - `case.args`: command line arguments, one per line
//! - `expected/`: the exact files expected in the output directory
//! - `case.stderr`: text expected somewhere in stderr
//! - `case.exitcode`: expected exit code (default: 0)
//!
//! Cases run with `GOPATH` set to their working copy, so `src/` is searched
//! for import paths. The output directory is the value of `-o`. When the exit code is not
//! zero, the output directory must not exist afterwards.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Run gomono in `dir` and return (stderr, exit_code)
fn run_gomono(dir: &Path, args: &[String]) -> (String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_gomono"))
        .args(args)
        .current_dir(dir)
        .env("GOPATH", dir)
        .output()
        .expect("failed to execute gomono");

    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stderr, output.status.code().unwrap_or(-1))
}

fn copy_tree(from: &Path, to: &Path) {
    fs::create_dir_all(to).unwrap();
    for entry in fs::read_dir(from).unwrap() {
        let entry = entry.unwrap();
        let target = to.join(entry.file_name());
        if entry.path().is_dir() {
            copy_tree(&entry.path(), &target);
        } else {
            fs::copy(entry.path(), &target).unwrap();
        }
    }
}

/// Files of a directory by name, sorted.
fn list_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap_or_else(|e| panic!("Failed to read {:?}: {}", dir, e))
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

fn read_args(case: &Path) -> Vec<String> {
    let args_path = case.join("case.args");
    fs::read_to_string(&args_path)
        .unwrap_or_else(|e| panic!("Failed to read {:?}: {}", args_path, e))
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}

fn output_dir(args: &[String]) -> PathBuf {
    let pos = args
        .iter()
        .position(|a| a == "-o")
        .unwrap_or_else(|| panic!("no -o in {:?}", args));
    PathBuf::from(&args[pos + 1])
}

fn run_snapshot_test(case: &Path) {
    let work = TempDir::new().unwrap();
    if case.join("src").exists() {
        copy_tree(&case.join("src"), &work.path().join("src"));
    }
    if case.join("gomono.toml").exists() {
        fs::copy(case.join("gomono.toml"), work.path().join("gomono.toml")).unwrap();
    }

    let args = read_args(case);
    let (stderr, exit_code) = run_gomono(work.path(), &args);

    let stderr_path = case.join("case.stderr");
    if stderr_path.exists() {
        let expected = fs::read_to_string(&stderr_path).unwrap();
        assert!(
            stderr.contains(expected.trim_end()),
            "stderr mismatch for {:?}\n--- expected (substring) ---\n{}\n--- actual ---\n{}",
            case,
            expected,
            stderr
        );
    }

    let exitcode_path = case.join("case.exitcode");
    let expected_exit = if exitcode_path.exists() {
        fs::read_to_string(&exitcode_path)
            .unwrap()
            .trim()
            .parse::<i32>()
            .unwrap_or_else(|e| panic!("Invalid exitcode in {:?}: {}", exitcode_path, e))
    } else {
        0
    };
    assert_eq!(
        exit_code, expected_exit,
        "exit code mismatch for {:?}, stderr:\n{}",
        case, stderr
    );

    let has_output = args.iter().any(|a| a == "-o");
    if !has_output {
        return;
    }
    let output = work.path().join(output_dir(&args));

    if expected_exit != 0 {
        assert!(!output.exists(), "{:?} left output behind", case);
        return;
    }

    let expected_dir = case.join("expected");
    assert_eq!(
        list_files(&output),
        list_files(&expected_dir),
        "output files mismatch for {:?}",
        case
    );
    for name in list_files(&expected_dir) {
        let expected = fs::read_to_string(expected_dir.join(&name)).unwrap();
        let actual = fs::read_to_string(output.join(&name)).unwrap();
        assert_eq!(
            actual, expected,
            "{} mismatch for {:?}\n--- expected ---\n{}\n--- actual ---\n{}",
            name, case, expected, actual
        );
    }

    let leftovers: Vec<String> = list_files(output.parent().unwrap())
        .into_iter()
        .filter(|n| n.starts_with(".gomono-"))
        .collect();
    assert!(leftovers.is_empty(), "scratch left behind: {:?}", leftovers);
}

/// Run every case directory of a group.
fn run_snapshot_dir(dir: &str) {
    let dir_path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("snapshots")
        .join(dir);

    let mut cases: Vec<PathBuf> = fs::read_dir(&dir_path)
        .unwrap_or_else(|e| panic!("Failed to read {:?}: {}", dir_path, e))
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.join("case.args").exists())
        .collect();
    cases.sort();
    assert!(!cases.is_empty(), "no cases in {:?}", dir_path);

    for case in cases {
        run_snapshot_test(&case);
    }
}

#[test]
fn snapshot_generate() {
    run_snapshot_dir("generate");
}

#[test]
fn snapshot_errors() {
    run_snapshot_dir("errors");
}
