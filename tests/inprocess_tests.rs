//! In-process integration tests that contribute to coverage.
//!
//! These tests call the generation API directly instead of spawning a
//! separate process.

use std::fs;
use std::path::{Path, PathBuf};

use gomono::compiler::format_source;
use gomono::{BindingMap, GenError, GenerateOptions, generate};
use tempfile::TempDir;

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn options(root: &Path, template: &str, out: &str, bindings: &[&str]) -> GenerateOptions {
    let mut options = GenerateOptions::new(template, root.join(out));
    options.search_paths = vec![root.join("src")];
    options.bindings = BindingMap::parse(bindings).unwrap();
    options
}

fn read(dir: &Path, name: &str) -> String {
    fs::read_to_string(dir.join(name)).unwrap_or_else(|e| panic!("{}: {}", name, e))
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

const LIST: &str = r#"package list

import "gomono/generic"

// T is the element type.
type T generic.Generic

// Node is one link of a List.
type Node struct {
	Value T
	next  *Node
}

// List is a singly linked list.
type List struct {
	head *Node
	size int
}

// Push adds v at the front.
func (l *List) Push(v T) {
	l.head = &Node{Value: v, next: l.head}
	l.size++
}

// Values returns the elements from front to back.
func (l *List) Values() []T {
	out := make([]T, 0, l.size)
	for n := l.head; n != nil; n = n.next {
		out = append(out, n.Value)
	}
	return out
}

// Find returns the first element matching pred.
func (l *List) Find(pred func(T) bool) (T, bool) {
	for n := l.head; n != nil; n = n.next {
		if pred(n.Value) {
			return n.Value, true
		}
	}
	var zero T
	return zero, false
}
"#;

fn list_workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "src/example.com/list/list.go", LIST);
    dir
}

#[test]
fn test_generate_list() {
    let ws = list_workspace();
    let opts = options(ws.path(), "example.com/list", "gen/intlist", &["T=int", "List=IntList", "Node=intNode"]);

    let generated = generate(&opts).unwrap();
    assert_eq!(generated.package, "intlist");
    assert_eq!(generated.stats.erased, 1);

    let out = ws.path().join("gen/intlist");
    assert_eq!(file_names(&out), vec![".gitignore", "list.go"]);
    let list = read(&out, "list.go");
    assert!(list.starts_with("package intlist\n"), "{}", list);
    assert!(list.contains("type _ generic.Generic"), "{}", list);
    assert!(list.contains("type intNode struct {\n\tValue int\n\tnext  *intNode\n}"), "{}", list);
    assert!(list.contains("func (l *IntList) Find(pred func(int) bool) (int, bool) {"), "{}", list);
    assert!(list.contains("l.head = &intNode{Value: v, next: l.head}"), "{}", list);
}

#[test]
fn test_generated_output_is_canonical() {
    let ws = list_workspace();
    let opts = options(ws.path(), "example.com/list", "gen/strlist", &["T=string"]);
    generate(&opts).unwrap();

    let list = read(&ws.path().join("gen/strlist"), "list.go");
    assert_eq!(format_source("list.go", &list).unwrap(), list);
}

#[test]
fn test_runs_are_deterministic() {
    let ws = list_workspace();
    let bindings = ["T=float64", "List=Floats"];
    generate(&options(ws.path(), "example.com/list", "gen/a/floats", &bindings)).unwrap();
    generate(&options(ws.path(), "example.com/list", "gen/b/floats", &bindings)).unwrap();

    let a = ws.path().join("gen/a/floats");
    let b = ws.path().join("gen/b/floats");
    assert_eq!(file_names(&a), file_names(&b));
    for name in file_names(&a) {
        assert_eq!(read(&a, &name), read(&b, &name), "{}", name);
    }
}

#[test]
fn test_placeholder_is_not_declared_in_output() {
    let ws = list_workspace();
    generate(&options(ws.path(), "example.com/list", "gen/bools", &["T=bool"])).unwrap();

    let list = read(&ws.path().join("gen/bools"), "list.go");
    assert!(!list.contains("type T "), "{}", list);
    assert!(!list.contains("[]T"), "{}", list);
}

#[test]
fn test_only_keys_are_renamed() {
    let ws = list_workspace();
    generate(&options(ws.path(), "example.com/list", "gen/bytes", &["T=byte", "size=count"])).unwrap();

    let list = read(&ws.path().join("gen/bytes"), "list.go");
    assert!(list.contains("\tcount int\n"), "{}", list);
    assert!(list.contains("l.count++"), "{}", list);
    assert!(!list.contains("size"), "{}", list);
    // Near misses of a key stay as they are.
    assert!(list.contains("out := make([]byte, 0, l.count)"), "{}", list);
    assert!(list.contains("func (l *List) Values() []byte {"), "{}", list);
}

#[test]
fn test_empty_bindings_change_only_the_package() {
    let ws = list_workspace();
    let mut opts = options(ws.path(), "example.com/list", "gen/list2", &[]);
    opts.gitignore = false;
    generate(&opts).unwrap();

    let out = ws.path().join("gen/list2");
    assert_eq!(file_names(&out), vec!["list.go"]);
    assert_eq!(read(&out, "list.go"), LIST.replacen("package list", "package list2", 1));
}

#[test]
fn test_failed_check_publishes_nothing() {
    let ws = list_workspace();
    let out = ws.path().join("gen/broken");
    write(&out, "keep.go", "package broken\n");

    let err = generate(&options(ws.path(), "example.com/list", "gen/broken", &["T=Undeclared"])).unwrap_err();
    match &err {
        GenError::TypeCheck { package, diagnostics } => {
            assert_eq!(package, "broken");
            assert!(diagnostics.iter().any(|d| d.message == "undefined: Undeclared"), "{:?}", diagnostics);
            assert!(diagnostics.iter().all(|d| d.file == "list.go"), "{:?}", diagnostics);
        }
        other => panic!("unexpected error: {}", other),
    }
    assert!(!err.to_string().contains(".gomono-"), "{}", err);
    assert_eq!(err.exit_code(), 1);
    assert_eq!(file_names(&out), vec!["keep.go"]);

    let leftovers: Vec<String> = file_names(&ws.path().join("gen"))
        .into_iter()
        .filter(|n| n.starts_with(".gomono-"))
        .collect();
    assert!(leftovers.is_empty(), "{:?}", leftovers);
}

#[test]
fn test_pointer_receiver_does_not_satisfy_interface_for_values() {
    let ws = TempDir::new().unwrap();
    write(
        ws.path(),
        "src/example.com/named/named.go",
        "package named\n\nimport \"gomono/generic\"\n\ntype T generic.Generic\n\ntype Stringer interface {\n\tString() string\n}\n\ntype Named struct {\n\tv T\n}\n\nfunc (n *Named) String() string {\n\treturn \"named\"\n}\n\nfunc Wrap(n Named) Stringer {\n\treturn n\n}\n",
    );

    let err = generate(&options(ws.path(), "example.com/named", "gen/intnamed", &["T=int"])).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("method String has pointer receiver"), "{}", message);
    assert!(!ws.path().join("gen/intnamed").exists());
}

#[test]
fn test_template_errors_are_reported_with_positions() {
    let ws = TempDir::new().unwrap();
    write(
        ws.path(),
        "src/example.com/bad/bad.go",
        "package bad\n\nimport \"gomono/generic\"\n\ntype T generic.Generic\n\nfunc f() T {\n\treturn undefinedThing\n}\n",
    );

    let err = generate(&options(ws.path(), "example.com/bad", "gen/good", &["T=int"])).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("error: package example.com/bad failed type checking"), "{}", message);
    assert!(message.contains("undefined: undefinedThing"), "{}", message);
    assert!(message.contains("bad.go:8:9"), "{}", message);
    assert!(!ws.path().join("gen/good").exists());
}

#[test]
fn test_syntax_errors_abort() {
    let ws = TempDir::new().unwrap();
    write(ws.path(), "src/example.com/bad/bad.go", "package bad\n\nfunc (\n");

    let err = generate(&options(ws.path(), "example.com/bad", "gen/good", &[])).unwrap_err();
    assert!(matches!(err, GenError::Syntax(_)), "{}", err);
}

#[test]
fn test_missing_template() {
    let ws = TempDir::new().unwrap();
    let err = generate(&options(ws.path(), "example.com/absent", "gen/x", &[])).unwrap_err();
    assert!(matches!(err, GenError::PackageNotFound(ref p) if p == "example.com/absent"), "{}", err);
}

#[test]
fn test_invalid_output_name() {
    let ws = list_workspace();
    let err = generate(&options(ws.path(), "example.com/list", "gen/int-list", &["T=int"])).unwrap_err();
    assert_eq!(err.exit_code(), 2);
    assert!(!ws.path().join("gen").exists());
}

#[test]
fn test_dependencies_of_the_template_are_available() {
    let ws = TempDir::new().unwrap();
    write(
        ws.path(),
        "src/example.com/util/util.go",
        "package util\n\n// Clamp limits n to [0, max].\nfunc Clamp(n, max int) int {\n\tif n < 0 {\n\t\treturn 0\n\t}\n\tif n > max {\n\t\treturn max\n\t}\n\treturn n\n}\n",
    );
    write(
        ws.path(),
        "src/example.com/ring/ring.go",
        "package ring\n\nimport (\n\t\"example.com/util\"\n\t\"gomono/generic\"\n)\n\ntype T generic.Generic\n\ntype Ring struct {\n\tbuf []T\n}\n\nfunc (r *Ring) At(i int) T {\n\treturn r.buf[util.Clamp(i, len(r.buf)-1)]\n}\n",
    );

    let opts = options(ws.path(), "example.com/ring", "gen/runes", &["T=rune", "Ring=Runes"]);
    generate(&opts).unwrap();
    let ring = read(&ws.path().join("gen/runes"), "ring.go");
    assert!(ring.contains("func (r *Runes) At(i int) rune {"), "{}", ring);
    assert!(ring.contains("r.buf[util.Clamp(i, len(r.buf)-1)]"), "{}", ring);
}

#[test]
fn test_generate_into_existing_directory() {
    let ws = list_workspace();
    let out: PathBuf = ws.path().join("gen/ints");
    write(&out, "README", "hand written\n");

    generate(&options(ws.path(), "example.com/list", "gen/ints", &["T=int"])).unwrap();
    assert_eq!(file_names(&out), vec![".gitignore", "README", "list.go"]);
    assert_eq!(read(&out, "README"), "hand written\n");
}
