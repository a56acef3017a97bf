//! Finding the placeholder type in the marker package.

use crate::compiler::ast::{Decl, DeclKeyword, Spec};
use crate::compiler::module::Package;
use crate::compiler::typechecker::TypeChecker;
use crate::compiler::types::Type;

/// Return the type of the first top-level `var` or `const` spec with an
/// explicit type, scanning the marker's files in load order.
///
/// The marker must already have been type checked by `checker`.
pub fn resolve_placeholder(marker: &Package, checker: &TypeChecker) -> Result<Type, String> {
    for (idx, file) in marker.files.iter().enumerate() {
        for decl in &file.decls {
            let Decl::Gen(decl) = decl else { continue };
            if decl.keyword == DeclKeyword::Type {
                continue;
            }
            for spec in &decl.specs {
                let Spec::Value(spec) = spec else { continue };
                let Some(ty) = &spec.ty else { continue };
                if let Some(resolved) = checker.type_of(&marker.path, idx, ty) {
                    return Ok(resolved.clone());
                }
            }
        }
    }

    Err(format!("no generic type found in {}", marker.path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::parser::parse_file;

    fn marker(sources: &[(&str, &str)]) -> (Package, TypeChecker) {
        let files = sources
            .iter()
            .map(|(name, source)| parse_file(name, source).unwrap())
            .collect();
        let package = Package {
            path: "gomono/generic".to_string(),
            dir: None,
            files,
        };
        let mut checker = TypeChecker::new();
        checker
            .check_package(&package.path, &package.files)
            .unwrap();
        (package, checker)
    }

    fn named(ty: &Type) -> &str {
        match ty {
            Type::Named(named) => &named.name,
            other => panic!("expected a named type, got {}", other),
        }
    }

    #[test]
    fn test_embedded_marker_resolves_to_generic() {
        let (package, checker) = marker(&[("generic.go", crate::compiler::module::MARKER_SOURCE)]);
        let ty = resolve_placeholder(&package, &checker).unwrap();
        assert_eq!(named(&ty), "generic.Generic");
    }

    #[test]
    fn test_untyped_specs_are_skipped() {
        let source = "package generic\n\ntype A interface{}\ntype B interface{}\n\nvar x = 1\n\nvar y B\n";
        let (package, checker) = marker(&[("generic.go", source)]);
        let ty = resolve_placeholder(&package, &checker).unwrap();
        assert_eq!(named(&ty), "generic.B");
    }

    #[test]
    fn test_first_candidate_in_file_order_wins() {
        let (package, checker) = marker(&[
            ("a.go", "package generic\n\ntype First interface{}\n\nvar _ First\n"),
            ("b.go", "package generic\n\ntype Second interface{}\n\nvar _ Second\n"),
        ]);
        let ty = resolve_placeholder(&package, &checker).unwrap();
        assert_eq!(named(&ty), "generic.First");
    }

    #[test]
    fn test_no_candidate() {
        let (package, checker) = marker(&[("generic.go", "package generic\n\ntype Generic interface{}\n")]);
        let err = resolve_placeholder(&package, &checker).unwrap_err();
        assert_eq!(err, "no generic type found in gomono/generic");
    }
}
