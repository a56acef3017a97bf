//! Run configuration types.

use crate::error::GenError;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Import path of the marker package unless configured otherwise.
pub const DEFAULT_MARKER: &str = "gomono/generic";

/// Logging detail
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Verbosity {
    /// Warnings and errors only (`-q`)
    Quiet,
    /// Pipeline stages
    #[default]
    Normal,
    /// Per-file detail (`-v`)
    Verbose,
}

impl Verbosity {
    /// `-q` wins over `-v`.
    pub fn from_flags(quiet: bool, verbose: bool) -> Self {
        match (quiet, verbose) {
            (true, _) => Verbosity::Quiet,
            (false, true) => Verbosity::Verbose,
            (false, false) => Verbosity::Normal,
        }
    }
}

/// Identifier renames applied to the template, keyed by the template name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingMap(BTreeMap<String, String>);

impl BindingMap {
    /// Parse `Key=Value` arguments. The value may be empty; the key may not,
    /// and may not repeat.
    pub fn parse<I, S>(args: I) -> Result<Self, GenError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut map = BTreeMap::new();
        for arg in args {
            let arg = arg.as_ref();
            let Some((key, value)) = arg.split_once('=') else {
                return Err(GenError::Usage(format!(
                    "invalid binding '{}': expected Key=Value",
                    arg
                )));
            };
            if key.is_empty() {
                return Err(GenError::Usage(format!("invalid binding '{}': empty key", arg)));
            }
            if key == "_" {
                return Err(GenError::Usage("'_' cannot be renamed".to_string()));
            }
            if map.insert(key.to_string(), value.to_string()).is_some() {
                return Err(GenError::Usage(format!("duplicate binding for '{}'", key)));
            }
        }
        Ok(Self(map))
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Everything a generation run needs, fixed before the run starts.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Import path of the template, or a directory path
    pub template: String,
    pub output: PathBuf,
    pub bindings: BindingMap,
    /// Directories searched for import paths, in order
    pub search_paths: Vec<PathBuf>,
    /// Import path of the marker package
    pub marker: String,
    /// Publish a `.gitignore` with the generated files
    pub gitignore: bool,
}

impl GenerateOptions {
    pub fn new(template: impl Into<String>, output: impl Into<PathBuf>) -> Self {
        Self {
            template: template.into(),
            output: output.into(),
            bindings: BindingMap::default(),
            search_paths: vec![PathBuf::from(".")],
            marker: DEFAULT_MARKER.to_string(),
            gitignore: true,
        }
    }

    /// Whether the template names a directory rather than an import path.
    pub fn template_is_dir(&self) -> bool {
        let t = self.template.as_str();
        t.starts_with("./")
            || t.starts_with("../")
            || t == "."
            || t == ".."
            || std::path::Path::new(t).is_absolute()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_flags() {
        assert_eq!(Verbosity::from_flags(false, false), Verbosity::Normal);
        assert_eq!(Verbosity::from_flags(false, true), Verbosity::Verbose);
        assert_eq!(Verbosity::from_flags(true, true), Verbosity::Quiet);
    }

    #[test]
    fn test_parse_bindings() {
        let map = BindingMap::parse(["T=int", "Box=IntBox", "Zero="]).unwrap();
        assert_eq!(map.len(), 3);
        assert_eq!(map.as_map()["T"], "int");
        assert_eq!(map.as_map()["Box"], "IntBox");
        assert_eq!(map.as_map()["Zero"], "");
    }

    #[test]
    fn test_value_may_contain_equals() {
        let map = BindingMap::parse(["T=a=b"]).unwrap();
        assert_eq!(map.as_map()["T"], "a=b");
    }

    #[test]
    fn test_binding_errors_are_usage_errors() {
        for args in [vec!["T"], vec!["=int"], vec!["T=int", "T=bool"], vec!["_=x"]] {
            let err = BindingMap::parse(args.clone()).unwrap_err();
            assert!(matches!(err, GenError::Usage(_)), "{:?}: {}", args, err);
        }
    }

    #[test]
    fn test_empty_bindings() {
        let map = BindingMap::parse(Vec::<String>::new()).unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn test_template_is_dir() {
        let mut options = GenerateOptions::new("example.com/box", "out");
        assert!(!options.template_is_dir());
        options.template = "./box".to_string();
        assert!(options.template_is_dir());
        options.template = "/src/box".to_string();
        assert!(options.template_is_dir());
    }
}
