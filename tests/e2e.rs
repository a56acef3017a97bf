use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

const BOX: &str = r#"package box

import "gomono/generic"

type T generic.Generic

type Box struct {
	items []T
}

func (b *Box) Put(x T) {
	b.items = append(b.items, x)
}
"#;

/// A GOPATH-style workspace holding `example.com/box`.
fn workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    let pkg = dir.path().join("src/example.com/box");
    fs::create_dir_all(&pkg).unwrap();
    fs::write(pkg.join("box.go"), BOX).unwrap();
    dir
}

fn run_gomono(dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_gomono"))
        .args(args)
        .current_dir(dir)
        .env("GOPATH", dir)
        .output()
        .expect("failed to execute gomono");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.code().unwrap_or(-1))
}

#[test]
fn test_success() {
    let ws = workspace();
    let (_, stderr, code) = run_gomono(
        ws.path(),
        &["-o", "gen/intbox", "example.com/box", "T=int", "Box=IntBox"],
    );
    assert_eq!(code, 0, "stderr:\n{}", stderr);

    let out = ws.path().join("gen/intbox");
    let generated = fs::read_to_string(out.join("box.go")).unwrap();
    assert!(generated.starts_with("package intbox\n"));
    assert!(generated.contains("func (b *IntBox) Put(x int) {"));
    assert_eq!(fs::read_to_string(out.join(".gitignore")).unwrap(), "*\n");
}

#[test]
fn test_stage_logging() {
    let ws = workspace();
    let (stdout, stderr, code) = run_gomono(ws.path(), &["-o", "gen/intbox", "example.com/box", "T=int"]);
    assert_eq!(code, 0, "stderr:\n{}", stderr);
    assert!(stdout.is_empty());
    assert!(stderr.contains("INFO"), "{}", stderr);
    assert!(stderr.contains("type checking generated code"), "{}", stderr);
    assert!(!stderr.contains("DEBUG"), "{}", stderr);
}

#[test]
fn test_quiet_suppresses_logging() {
    let ws = workspace();
    let (_, stderr, code) = run_gomono(ws.path(), &["-q", "-o", "gen/intbox", "example.com/box", "T=int"]);
    assert_eq!(code, 0);
    assert!(stderr.is_empty(), "{}", stderr);
}

#[test]
fn test_verbose_logs_details() {
    let ws = workspace();
    let (_, stderr, code) = run_gomono(ws.path(), &["-v", "-o", "gen/intbox", "example.com/box", "T=int"]);
    assert_eq!(code, 0);
    assert!(stderr.contains("DEBUG"), "{}", stderr);
    assert!(stderr.contains("creating .gitignore"), "{}", stderr);
}

#[test]
fn test_no_gitignore() {
    let ws = workspace();
    let (_, _, code) = run_gomono(
        ws.path(),
        &["--no-gi", "-o", "gen/intbox", "example.com/box", "T=int"],
    );
    assert_eq!(code, 0);
    let out = ws.path().join("gen/intbox");
    assert!(out.join("box.go").exists());
    assert!(!out.join(".gitignore").exists());
}

#[test]
fn test_help_exits_with_usage() {
    let ws = workspace();
    let (stdout, stderr, code) = run_gomono(ws.path(), &["-h"]);
    assert_eq!(code, 2);
    assert!(stdout.is_empty());
    assert!(stderr.contains("Usage: gomono"), "{}", stderr);
    assert!(stderr.contains("--no-gi"), "{}", stderr);
}

#[test]
fn test_missing_arguments_exit_with_usage() {
    let ws = workspace();
    for args in [&[][..], &["-o", "gen/x"][..], &["example.com/box"][..]] {
        let (_, stderr, code) = run_gomono(ws.path(), args);
        assert_eq!(code, 2, "{:?}", args);
        assert!(stderr.contains("Usage: gomono"), "{}", stderr);
    }
}

#[test]
fn test_unknown_flag_is_usage_error() {
    let ws = workspace();
    let (_, _, code) = run_gomono(ws.path(), &["--frobnicate", "-o", "gen/x", "example.com/box"]);
    assert_eq!(code, 2);
}

#[test]
fn test_malformed_binding_is_usage_error() {
    let ws = workspace();
    let (_, stderr, code) = run_gomono(ws.path(), &["-o", "gen/x", "example.com/box", "T"]);
    assert_eq!(code, 2);
    assert!(stderr.contains("expected Key=Value"), "{}", stderr);
    assert!(!ws.path().join("gen").exists());
}

#[test]
fn test_failure_exits_one_and_leaves_output_alone() {
    let ws = workspace();
    let out = ws.path().join("gen/intbox");
    fs::create_dir_all(&out).unwrap();
    fs::write(out.join("existing.go"), "package intbox\n").unwrap();

    let (_, stderr, code) = run_gomono(ws.path(), &["-o", "gen/intbox", "example.com/box", "T=Missing"]);
    assert_eq!(code, 1, "stderr:\n{}", stderr);
    assert!(stderr.contains("error: package intbox failed type checking"), "{}", stderr);

    let mut names: Vec<_> = fs::read_dir(&out)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    assert_eq!(names, vec!["existing.go"]);
}

#[test]
fn test_directory_template() {
    let ws = workspace();
    let (_, stderr, code) = run_gomono(
        ws.path(),
        &["-o", "gen/floatbox", "./src/example.com/box", "T=float64"],
    );
    assert_eq!(code, 0, "stderr:\n{}", stderr);
    let generated = fs::read_to_string(ws.path().join("gen/floatbox/box.go")).unwrap();
    assert!(generated.contains("items []float64"), "{}", generated);
}

#[test]
fn test_explicit_config() {
    let ws = workspace();
    let marker = ws.path().join("markers/example.org/anything");
    fs::create_dir_all(&marker).unwrap();
    fs::write(marker.join("anything.go"), "package anything\n\ntype Value interface{}\n\nvar _ Value\n").unwrap();
    let pkg = ws.path().join("src/example.com/cell");
    fs::create_dir_all(&pkg).unwrap();
    fs::write(
        pkg.join("cell.go"),
        "package cell\n\nimport \"example.org/anything\"\n\ntype T anything.Value\n\ntype Cell struct {\n\tv T\n}\n",
    )
    .unwrap();
    fs::write(
        ws.path().join("settings.toml"),
        "search_paths = [\"markers\"]\nmarker = \"example.org/anything\"\n",
    )
    .unwrap();

    let (_, stderr, code) = run_gomono(
        ws.path(),
        &["--config", "settings.toml", "-o", "gen/intcell", "example.com/cell", "T=int"],
    );
    assert_eq!(code, 0, "stderr:\n{}", stderr);
    let generated = fs::read_to_string(ws.path().join("gen/intcell/cell.go")).unwrap();
    assert!(generated.contains("type _ anything.Value"), "{}", generated);
    assert!(generated.contains("\tv int\n"), "{}", generated);
}
