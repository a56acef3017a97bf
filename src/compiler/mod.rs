pub mod ast;
pub mod format;
pub mod generic;
pub mod lexer;
pub mod module;
pub mod monomorphise;
mod parser;
pub mod typechecker;
pub mod types;
pub mod visit;

pub use format::format_file;
pub use generic::resolve_placeholder;
pub use lexer::Lexer;
pub use module::{CheckFailure, ModuleLoader, Package};
pub use monomorphise::{Monomorphiser, RewriteStats};
pub use parser::{Parser, parse_file};
pub use typechecker::{TypeChecker, TypeError};

/// Parse a Go source file and print it in canonical form.
pub fn format_source(filename: &str, source: &str) -> Result<String, String> {
    let file = parse_file(filename, source)?;
    Ok(format_file(&file))
}

/// Format type errors for display.
pub fn format_type_errors(errors: &[TypeError]) -> String {
    let mut output = String::new();

    for error in errors {
        output.push_str(&format!(
            "error: type error: {}\n  --> {}:{}:{}\n",
            error.message, error.file, error.span.line, error.span.column
        ));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::lexer::Span;

    #[test]
    fn test_format_type_errors() {
        let errors = vec![
            TypeError::new("undefined: x", Span::new(3, 9), "box.go"),
            TypeError::new("missing return", Span::new(7, 1), "list.go"),
        ];
        assert_eq!(
            format_type_errors(&errors),
            "error: type error: undefined: x\n  --> box.go:3:9\n\
             error: type error: missing return\n  --> list.go:7:1\n"
        );
    }

    #[test]
    fn test_format_source_reports_syntax_errors() {
        assert!(format_source("bad.go", "package p\n\nfunc (\n").is_err());
    }

    #[test]
    fn test_format_source_is_idempotent() {
        let once = format_source("a.go", "package p\nvar x=1\n").unwrap();
        assert_eq!(format_source("a.go", &once).unwrap(), once);
    }
}
