use crate::compiler::ast::File;
use crate::compiler::lexer::unquote;
use crate::compiler::parser::parse_file;
use crate::compiler::typechecker::{TypeChecker, TypeError};
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Source of the marker package, used when it is not found on disk.
pub const MARKER_SOURCE: &str = "\
// Package generic defines the placeholder type templates are written against.
package generic

// Generic stands for the type parameter of a template:
//
//\ttype T generic.Generic
type Generic interface{}

var _ Generic
";

/// A loaded package: its parsed files in file-name order.
#[derive(Debug, Clone)]
pub struct Package {
    pub path: String,
    /// Directory the files were read from; `None` for the embedded marker.
    pub dir: Option<PathBuf>,
    pub files: Vec<File>,
}

impl Package {
    /// Name from the package clause of the first file.
    #[cfg(test)]
    pub fn name(&self) -> &str {
        self.files
            .first()
            .map(|f| f.package.name.as_str())
            .unwrap_or_default()
    }

    /// Import paths used by the package's files, sorted and deduplicated.
    pub fn imports(&self) -> Result<Vec<String>, String> {
        let mut imports = BTreeSet::new();
        for file in &self.files {
            for spec in file.imports.iter().flat_map(|decl| &decl.specs) {
                let path = unquote(&spec.path).ok_or_else(|| {
                    format!(
                        "error: invalid import path {}\n  --> {}:{}:{}",
                        spec.path, file.path, spec.span.line, spec.span.column
                    )
                })?;
                imports.insert(path);
            }
        }
        Ok(imports.into_iter().collect())
    }
}

/// Type errors of one package, in the order the checker reported them.
#[derive(Debug, Clone)]
pub struct CheckFailure {
    pub package: String,
    pub errors: Vec<TypeError>,
}

/// Resolves import paths to package directories and loads them with their
/// dependencies.
pub struct ModuleLoader {
    /// Directories searched for import paths, in order
    search_paths: Vec<PathBuf>,
    /// Import path of the marker package
    marker: String,
    /// Loaded packages by import path
    cache: HashMap<String, Package>,
    /// Import paths in dependency order
    order: Vec<String>,
    /// Paths that were not found and are checked as opaque
    opaque: BTreeSet<String>,
}

impl ModuleLoader {
    pub fn new(search_paths: Vec<PathBuf>, marker: impl Into<String>) -> Self {
        Self {
            search_paths,
            marker: marker.into(),
            cache: HashMap::new(),
            order: Vec::new(),
            opaque: BTreeSet::new(),
        }
    }

    /// Resolve an import path to the directory holding its files.
    pub fn resolve_import(&self, path: &str) -> Option<PathBuf> {
        self.search_paths
            .iter()
            .map(|search_path| search_path.join(path))
            .find(|dir| dir.is_dir() && has_go_files(dir))
    }

    /// Load a package by import path, and everything it imports.
    pub fn load(&mut self, path: &str) -> Result<(), String> {
        let mut stack = Vec::new();
        self.load_path(path, &mut stack)
    }

    /// Load the package in `dir` under the import path `path`, and
    /// everything it imports.
    pub fn load_dir(&mut self, path: &str, dir: &Path) -> Result<(), String> {
        if self.cache.contains_key(path) {
            return Ok(());
        }
        let package = read_package(path, dir)?;
        let mut stack = vec![path.to_string()];
        self.load_package(package, &mut stack)
    }

    pub fn package(&self, path: &str) -> Option<&Package> {
        self.cache.get(path)
    }

    pub fn package_mut(&mut self, path: &str) -> Option<&mut Package> {
        self.cache.get_mut(path)
    }

    /// Whether the path was registered as an opaque package.
    #[cfg(test)]
    pub fn is_opaque(&self, path: &str) -> bool {
        self.opaque.contains(path)
    }

    /// Loaded import paths, dependencies before their importers.
    #[cfg(test)]
    pub fn order(&self) -> &[String] {
        &self.order
    }

    /// Type check every loaded package in dependency order.
    pub fn check(&self) -> Result<TypeChecker, CheckFailure> {
        let mut checker = TypeChecker::new();
        for path in &self.order {
            if self.opaque.contains(path) {
                checker.add_opaque(path);
                continue;
            }
            let Some(package) = self.cache.get(path) else {
                continue;
            };
            debug!("type checking {} ({} files)", path, package.files.len());
            checker
                .check_package(path, &package.files)
                .map_err(|errors| CheckFailure {
                    package: path.clone(),
                    errors,
                })?;
        }
        Ok(checker)
    }

    fn load_path(&mut self, path: &str, stack: &mut Vec<String>) -> Result<(), String> {
        if self.cache.contains_key(path) || self.opaque.contains(path) {
            return Ok(());
        }
        if let Some(pos) = stack.iter().position(|p| p == path) {
            let mut cycle = stack[pos..].to_vec();
            cycle.push(path.to_string());
            return Err(format!("error: import cycle not allowed: {}", cycle.join(" -> ")));
        }

        stack.push(path.to_string());

        let package = match self.resolve_import(path) {
            Some(dir) => read_package(path, &dir)?,
            None if path == self.marker => {
                debug!("using embedded source for {}", path);
                let file = parse_file("generic.go", MARKER_SOURCE)?;
                Package {
                    path: path.to_string(),
                    dir: None,
                    files: vec![file],
                }
            }
            None if is_standard_path(path) => {
                debug!("{} not found; treating it as an opaque package", path);
                self.opaque.insert(path.to_string());
                self.order.push(path.to_string());
                stack.pop();
                return Ok(());
            }
            None => {
                return Err(format!(
                    "error: cannot find package \"{}\" in any of:\n{}",
                    path,
                    self.search_paths
                        .iter()
                        .map(|p| format!("\t{}", p.display()))
                        .collect::<Vec<_>>()
                        .join("\n")
                ));
            }
        };

        self.load_package(package, stack)
    }

    /// Load the imports of `package`, then record it. The package's path is
    /// the last entry of `stack`.
    fn load_package(&mut self, package: Package, stack: &mut Vec<String>) -> Result<(), String> {
        for import in package.imports()? {
            self.load_path(&import, stack)?;
        }
        stack.pop();

        self.order.push(package.path.clone());
        self.cache.insert(package.path.clone(), package);
        Ok(())
    }
}

/// Paths whose first element has no dot, such as `fmt` or `net/http`.
fn is_standard_path(path: &str) -> bool {
    path.split('/').next().is_some_and(|first| !first.contains('.'))
}

fn has_go_files(dir: &Path) -> bool {
    go_files(dir).is_ok_and(|files| !files.is_empty())
}

/// Source files of a package directory, sorted by name. Test files are skipped.
pub fn go_files(dir: &Path) -> Result<Vec<PathBuf>, String> {
    let entries = fs::read_dir(dir)
        .map_err(|e| format!("error: failed to read directory '{}': {}", dir.display(), e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry
            .map_err(|e| format!("error: failed to read directory '{}': {}", dir.display(), e))?;
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.ends_with(".go") && !name.ends_with("_test.go") && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn read_package(path: &str, dir: &Path) -> Result<Package, String> {
    let mut files = Vec::new();
    for file_path in go_files(dir)? {
        let source = fs::read_to_string(&file_path)
            .map_err(|e| format!("error: failed to read '{}': {}", file_path.display(), e))?;
        let filename = file_path.to_string_lossy().to_string();
        debug!("parsing {}", filename);
        files.push(parse_file(&filename, &source)?);
    }

    if files.is_empty() {
        return Err(format!("error: no Go files in {}", dir.display()));
    }

    Ok(Package {
        path: path.to_string(),
        dir: Some(dir.to_path_buf()),
        files,
    })
}
