//! The generation pipeline.
//!
//! load template and marker → resolve the placeholder → rewrite each file
//! → print into a scratch directory → type check the scratch directory as a
//! new package → publish. Nothing reaches the output directory unless the
//! check passes, and the scratch directory is removed on every path.

mod scratch;

pub use scratch::Scratch;

use crate::compiler::lexer::TokenKind;
use crate::compiler::{
    CheckFailure, Lexer, ModuleLoader, Monomorphiser, RewriteStats, format_file,
    resolve_placeholder,
};
use crate::config::GenerateOptions;
use crate::error::{GenError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct Generated {
    /// Package clause of the generated files
    pub package: String,
    /// Published files, `.gitignore` included
    pub files: Vec<PathBuf>,
    pub stats: RewriteStats,
}

/// Specialize the template named by `options` into its output directory.
pub fn generate(options: &GenerateOptions) -> Result<Generated> {
    let output = std::path::absolute(&options.output).map_err(|e| GenError::io(&options.output, e))?;
    let package = package_name(&output)?;

    info!("loading and type checking {}", options.template);
    let mut loader = ModuleLoader::new(options.search_paths.clone(), options.marker.clone());
    if options.template_is_dir() {
        loader
            .load_dir(&options.template, Path::new(&options.template))
            .map_err(GenError::Syntax)?;
    } else {
        if options.template != options.marker && loader.resolve_import(&options.template).is_none() {
            return Err(GenError::PackageNotFound(options.template.clone()));
        }
        loader.load(&options.template).map_err(GenError::Syntax)?;
    }
    loader.load(&options.marker).map_err(GenError::Syntax)?;
    let checker = loader.check().map_err(type_check_error)?;

    info!("determining generic type");
    let marker = loader
        .package(&options.marker)
        .ok_or_else(|| GenError::Resolution(format!("marker package {} was not loaded", options.marker)))?;
    let placeholder = resolve_placeholder(marker, &checker).map_err(GenError::Resolution)?;
    debug!("generic type is {}", placeholder);

    let template = loader
        .package_mut(&options.template)
        .ok_or_else(|| GenError::PackageNotFound(options.template.clone()))?;

    info!("generating {} from {}", package, options.template);
    let scratch = Scratch::create(&output)?;
    let engine = Monomorphiser::new(options.bindings.as_map(), &placeholder, &checker, &options.template);
    let mut stats = RewriteStats::default();

    for (idx, file) in template.files.iter_mut().enumerate() {
        let name = base_name(&file.path);
        let file_stats = engine.rewrite_file(idx, file, &package);
        stats.erased += file_stats.erased;
        stats.renamed += file_stats.renamed;

        let source = format_file(file);
        Lexer::new(&name, &source)
            .scan_tokens()
            .map_err(|message| GenError::Emission {
                file: name.clone(),
                message,
            })?;
        scratch.write(&name, &source)?;
        debug!(
            "wrote {} ({} erased, {} renamed)",
            name, file_stats.erased, file_stats.renamed
        );
    }

    info!("type checking generated code");
    verify(&scratch, options, &output)?;

    if options.gitignore {
        debug!("creating .gitignore");
        scratch.write(".gitignore", "*\n")?;
    } else {
        debug!("skipping .gitignore");
    }

    debug!("copying generated code to {}", output.display());
    let files = scratch.publish(&output)?;
    info!("wrote {} files to {}", files.len(), output.display());

    Ok(Generated {
        package,
        files,
        stats,
    })
}

/// Read the scratch directory back from disk and type check it as a package
/// of its own. Diagnostics name the generated files by base name, since the
/// scratch directory is gone once the run ends.
pub fn verify(scratch: &Scratch, options: &GenerateOptions, output: &Path) -> Result<()> {
    let path = output.to_string_lossy().to_string();
    let scratch_prefix = format!("{}{}", scratch.path().display(), std::path::MAIN_SEPARATOR);
    let mut loader = ModuleLoader::new(options.search_paths.clone(), options.marker.clone());
    loader
        .load_dir(&path, scratch.path())
        .map_err(|message| GenError::Syntax(message.replace(&scratch_prefix, "")))?;
    loader.check().map_err(|failure| {
        if failure.package == path {
            GenError::TypeCheck {
                package: base_name(&path),
                diagnostics: failure
                    .errors
                    .into_iter()
                    .map(|mut error| {
                        error.file = base_name(&error.file);
                        error
                    })
                    .collect(),
            }
        } else {
            type_check_error(failure)
        }
    })?;
    Ok(())
}

fn type_check_error(failure: CheckFailure) -> GenError {
    GenError::TypeCheck {
        package: failure.package,
        diagnostics: failure.errors,
    }
}

/// The output directory's base name, which must be a valid package name.
fn package_name(output: &Path) -> Result<String> {
    let name = output
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| GenError::Usage(format!("invalid output directory {}", output.display())))?;

    let tokens = Lexer::new("", &name).scan_tokens().unwrap_or_default();
    let is_ident = matches!(
        tokens.first().map(|t| &t.kind),
        Some(TokenKind::Ident(ident)) if *ident == name
    );
    if !is_ident || name == "_" {
        return Err(GenError::Usage(format!(
            "output directory name '{}' is not a valid package name",
            name
        )));
    }
    Ok(name)
}

fn base_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_name_from_output() {
        assert_eq!(package_name(Path::new("/tmp/gen/intbox")).unwrap(), "intbox");
        assert_eq!(package_name(Path::new("/tmp/gen/int_box2")).unwrap(), "int_box2");
    }

    #[test]
    fn test_invalid_package_names() {
        for dir in ["/tmp/int-box", "/tmp/2box", "/tmp/func", "/tmp/_"] {
            let err = package_name(Path::new(dir)).unwrap_err();
            assert!(matches!(err, GenError::Usage(_)), "{}: {}", dir, err);
        }
    }

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("/src/box/box.go"), "box.go");
        assert_eq!(base_name("generic.go"), "generic.go");
    }
}
