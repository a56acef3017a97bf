//! Monomorphisation of a template package.
//!
//! A template is written against a placeholder type (`type T generic.Generic`).
//! Specializing it is a rename done in place on each file's syntax tree:
//! 1. Erase: every top-level type declaration whose name is a binding key and
//!    whose type is the placeholder is renamed to `_`, so the concrete type
//!    named by the binding takes its place.
//! 2. Rename: every identifier whose text is a binding key is rewritten to
//!    the bound value.
//! 3. The package clause takes the name of the output package.
//!
//! Erasure runs over the whole file before renaming starts; erasure decides
//! on the type checker's view of the template, which the renaming would
//! otherwise invalidate.

use crate::compiler::ast::{Decl, File, Ident, Spec};
use crate::compiler::typechecker::TypeChecker;
use crate::compiler::types::Type;
use crate::compiler::visit::VisitMut;
use std::collections::BTreeMap;

/// What a rewrite changed, for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteStats {
    pub erased: usize,
    pub renamed: usize,
}

/// Specializes the files of one checked template package.
pub struct Monomorphiser<'a> {
    bindings: &'a BTreeMap<String, String>,
    placeholder: &'a Type,
    checker: &'a TypeChecker,
    /// Import path the template was checked under
    template: &'a str,
}

impl<'a> Monomorphiser<'a> {
    pub fn new(
        bindings: &'a BTreeMap<String, String>,
        placeholder: &'a Type,
        checker: &'a TypeChecker,
        template: &'a str,
    ) -> Self {
        Self {
            bindings,
            placeholder,
            checker,
            template,
        }
    }

    /// Rewrite file number `file_idx` of the template into package `package_name`.
    pub fn rewrite_file(&self, file_idx: usize, file: &mut File, package_name: &str) -> RewriteStats {
        let erased = self.erase_placeholders(file_idx, file);

        let mut renamer = Renamer {
            bindings: self.bindings,
            renamed: 0,
        };
        renamer.visit_file(file);

        file.package.name = package_name.to_string();

        RewriteStats {
            erased,
            renamed: renamer.renamed,
        }
    }

    fn erase_placeholders(&self, file_idx: usize, file: &mut File) -> usize {
        let mut erased = 0;

        for decl in &mut file.decls {
            let Decl::Gen(decl) = decl else { continue };
            for spec in &mut decl.specs {
                let Spec::Type(spec) = spec else { continue };
                if !self.bindings.contains_key(&spec.name.name) {
                    continue;
                }
                let resolved = self.checker.type_of(self.template, file_idx, &spec.ty);
                if resolved == Some(self.placeholder) {
                    spec.name.name = "_".to_string();
                    erased += 1;
                }
            }
        }

        erased
    }
}

struct Renamer<'a> {
    bindings: &'a BTreeMap<String, String>,
    renamed: usize,
}

impl VisitMut for Renamer<'_> {
    fn visit_ident(&mut self, ident: &mut Ident) {
        if ident.is_blank() {
            return;
        }
        if let Some(name) = self.bindings.get(&ident.name) {
            ident.name = name.clone();
            self.renamed += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::format::format_file;
    use crate::compiler::generic::resolve_placeholder;
    use crate::compiler::module::{MARKER_SOURCE, Package};
    use crate::compiler::parser::parse_file;

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

    fn bindings(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    /// Check the template, then rewrite every file with `pairs` into package `name`.
    fn specialize(sources: &[&str], pairs: &[(&str, &str)], name: &str) -> (Vec<String>, RewriteStats) {
        let mut checker = TypeChecker::new();
        let marker = Package {
            path: "gomono/generic".to_string(),
            dir: None,
            files: vec![parse_file("generic.go", MARKER_SOURCE).unwrap()],
        };
        checker.check_package(&marker.path, &marker.files).unwrap();
        let placeholder = resolve_placeholder(&marker, &checker).unwrap();

        let mut files: Vec<File> = sources
            .iter()
            .enumerate()
            .map(|(i, s)| parse_file(&format!("f{}.go", i), s).unwrap())
            .collect();
        checker.check_package("example.com/box", &files).unwrap();

        let map = bindings(pairs);
        let engine = Monomorphiser::new(&map, &placeholder, &checker, "example.com/box");
        let mut total = RewriteStats::default();
        let mut printed = Vec::new();
        for (i, file) in files.iter_mut().enumerate() {
            let stats = engine.rewrite_file(i, file, name);
            total.erased += stats.erased;
            total.renamed += stats.renamed;
            printed.push(format_file(file));
        }
        (printed, total)
    }

    #[test]
    fn test_box_becomes_int_box() {
        let (files, stats) = specialize(&[BOX], &[("T", "int"), ("Box", "IntBox")], "intbox");
        assert_eq!(stats.erased, 1);
        assert_eq!(
            files[0],
            r#"package intbox

import "gomono/generic"

type _ generic.Generic

type IntBox struct {
	items []int
}

func (b *IntBox) Put(x int) {
	b.items = append(b.items, x)
}
"#
        );
    }

    #[test]
    fn test_empty_bindings_only_rename_package() {
        let (files, stats) = specialize(&[BOX], &[], "box2");
        assert_eq!(stats, RewriteStats::default());
        assert!(files[0].starts_with("package box2\n"));
        assert!(files[0].contains("type T generic.Generic"));
    }

    #[test]
    fn test_non_placeholder_type_is_renamed_not_erased() {
        let source = "package box\n\nimport \"gomono/generic\"\n\ntype T generic.Generic\n\ntype Key string\n\nvar index map[Key]T\n";
        let (files, stats) = specialize(&[source], &[("T", "float64"), ("Key", "Name")], "box");
        assert_eq!(stats.erased, 1);
        assert!(files[0].contains("type Name string"), "{}", files[0]);
        assert!(files[0].contains("var index map[Name]float64"), "{}", files[0]);
    }

    #[test]
    fn test_grouped_type_specs_are_erased() {
        let source = "package box\n\nimport \"gomono/generic\"\n\ntype (\n\tT generic.Generic\n\tList []T\n)\n";
        let (files, stats) = specialize(&[source], &[("T", "bool")], "box");
        assert_eq!(stats.erased, 1);
        assert!(files[0].contains("\t_    generic.Generic\n"), "{}", files[0]);
        assert!(files[0].contains("\tList []bool\n"), "{}", files[0]);
    }

    #[test]
    fn test_alias_of_placeholder_is_erased() {
        let source = "package box\n\nimport \"gomono/generic\"\n\ntype T = generic.Generic\n\nvar zero T\n";
        let (files, stats) = specialize(&[source], &[("T", "string")], "box");
        assert_eq!(stats.erased, 1);
        assert!(files[0].contains("type _ = generic.Generic"), "{}", files[0]);
        assert!(files[0].contains("var zero string"), "{}", files[0]);
    }

    #[test]
    fn test_renames_reach_nested_expressions() {
        let source = r#"package box

import "gomono/generic"

type T generic.Generic

type Pair struct {
	Left, Right T
}

func Swap(p Pair) Pair {
	var first T = p.Left
	return Pair{Left: p.Right, Right: first}
}
"#;
        let (files, stats) = specialize(&[source], &[("T", "int"), ("Left", "A"), ("Right", "B")], "box");
        assert_eq!(stats.renamed, 8, "{:?}", stats);
        assert!(files[0].contains("A, B int"), "{}", files[0]);
        assert!(files[0].contains("\tvar first int = p.A\n"), "{}", files[0]);
        assert!(files[0].contains("return Pair{A: p.B, B: first}"), "{}", files[0]);
        assert!(!files[0].contains("Left"));
        assert!(!files[0].contains("Right"));
    }

    #[test]
    fn test_every_file_is_rewritten() {
        let second = "package box\n\nfunc (b *Box) Len() int {\n\treturn len(b.items)\n}\n";
        let (files, _) = specialize(&[BOX, second], &[("T", "int"), ("Box", "IntBox")], "intbox");
        assert_eq!(files.len(), 2);
        assert!(files[1].starts_with("package intbox\n"));
        assert!(files[1].contains("func (b *IntBox) Len() int"));
    }
}
