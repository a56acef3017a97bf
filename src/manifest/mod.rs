use crate::config::{DEFAULT_MARKER, GenerateOptions};
use crate::error::GenError;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// File name looked up in the current directory when `--config` is absent.
pub const MANIFEST_NAME: &str = "gomono.toml";

/// Project settings (gomono.toml)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Directories searched for import paths, relative to the manifest
    #[serde(default = "default_search_paths")]
    pub search_paths: Vec<PathBuf>,
    #[serde(default = "default_marker")]
    pub marker: String,
    /// Publish a `.gitignore` with generated files unless `--no-gi` is given
    #[serde(default = "default_gitignore")]
    pub gitignore: bool,
    /// Directory the manifest was read from
    #[serde(skip)]
    pub root: PathBuf,
}

fn default_search_paths() -> Vec<PathBuf> {
    vec![PathBuf::from(".")]
}

fn default_marker() -> String {
    DEFAULT_MARKER.to_string()
}

fn default_gitignore() -> bool {
    true
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            search_paths: default_search_paths(),
            marker: default_marker(),
            gitignore: default_gitignore(),
            root: PathBuf::from("."),
        }
    }
}

impl Manifest {
    /// Load a manifest file.
    pub fn load(path: &Path) -> Result<Self, GenError> {
        let content = fs::read_to_string(path).map_err(|e| GenError::io(path, e))?;
        let mut manifest: Manifest = toml::from_str(&content).map_err(|e| {
            GenError::Usage(format!("failed to parse {}: {}", path.display(), e.message()))
        })?;
        manifest.root = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(manifest)
    }

    /// Load `explicit` if given, otherwise `gomono.toml` in `cwd` if it
    /// exists, otherwise the defaults.
    pub fn discover(explicit: Option<&Path>, cwd: &Path) -> Result<Self, GenError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let default = cwd.join(MANIFEST_NAME);
        if default.is_file() {
            Self::load(&default)
        } else {
            Ok(Self {
                root: cwd.to_path_buf(),
                ..Self::default()
            })
        }
    }

    /// Search paths resolved against the manifest's directory, followed by
    /// `$GOPATH/src` when `gopath` is set.
    pub fn resolved_search_paths(&self, gopath: Option<OsString>) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self
            .search_paths
            .iter()
            .map(|p| if p.is_absolute() { p.clone() } else { self.root.join(p) })
            .collect();
        if let Some(gopath) = gopath.filter(|g| !g.is_empty()) {
            let src = PathBuf::from(gopath).join("src");
            if !paths.contains(&src) {
                paths.push(src);
            }
        }
        paths
    }

    /// Fill the project-level settings of `options`.
    pub fn apply(&self, options: &mut GenerateOptions, gopath: Option<OsString>) {
        options.search_paths = self.resolved_search_paths(gopath);
        options.marker = self.marker.clone();
        options.gitignore = options.gitignore && self.gitignore;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_without_manifest() {
        let dir = TempDir::new().unwrap();
        let manifest = Manifest::discover(None, dir.path()).unwrap();
        assert_eq!(manifest.marker, "gomono/generic");
        assert!(manifest.gitignore);
        assert_eq!(manifest.resolved_search_paths(None), vec![dir.path().join(".")]);
    }

    #[test]
    fn test_load_manifest() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(MANIFEST_NAME),
            "search_paths = [\"src\", \"/opt/go\"]\nmarker = \"example.com/generic\"\ngitignore = false\n",
        )
        .unwrap();

        let manifest = Manifest::discover(None, dir.path()).unwrap();
        assert_eq!(manifest.marker, "example.com/generic");
        assert!(!manifest.gitignore);
        assert_eq!(
            manifest.resolved_search_paths(None),
            vec![dir.path().join("src"), PathBuf::from("/opt/go")]
        );
    }

    #[test]
    fn test_gopath_is_appended() {
        let manifest = Manifest::default();
        let paths = manifest.resolved_search_paths(Some(OsString::from("/home/go")));
        assert_eq!(paths, vec![PathBuf::from("./."), PathBuf::from("/home/go/src")]);
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "serach_paths = []\n").unwrap();
        let err = Manifest::discover(Some(&path), dir.path()).unwrap_err();
        assert!(err.to_string().contains("custom.toml"), "{}", err);
    }

    #[test]
    fn test_missing_explicit_manifest() {
        let dir = TempDir::new().unwrap();
        let err = Manifest::discover(Some(&dir.path().join("nope.toml")), dir.path()).unwrap_err();
        assert!(matches!(err, GenError::Io { .. }));
    }

    #[test]
    fn test_apply_keeps_no_gitignore_flag() {
        let mut options = GenerateOptions::new("example.com/box", "out");
        options.gitignore = false;
        Manifest::default().apply(&mut options, None);
        assert!(!options.gitignore);
        assert_eq!(options.marker, "gomono/generic");
    }

    #[test]
    fn test_manifest_serialization() {
        let text = toml::to_string_pretty(&Manifest::default()).unwrap();
        assert!(text.contains("marker = \"gomono/generic\""));
        assert!(text.contains("gitignore = true"));
    }
}
