//! Errors of a generation run.

use crate::compiler::{TypeError, format_type_errors};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Exit code for bad or missing arguments.
pub const EXIT_USAGE: u8 = 2;

/// Exit code for every failure after the arguments were accepted.
pub const EXIT_FAILURE: u8 = 1;

#[derive(Debug, Error)]
pub enum GenError {
    #[error("error: {0}")]
    Usage(String),

    #[error("error: {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Lexer, parser and package loading diagnostics, already formatted.
    #[error("{0}")]
    Syntax(String),

    #[error("error: {0}")]
    Resolution(String),

    #[error("error: package {package} failed type checking\n{}", render(.diagnostics))]
    TypeCheck {
        package: String,
        diagnostics: Vec<TypeError>,
    },

    #[error("error: emitted invalid source for {file}: {message}")]
    Emission { file: String, message: String },

    #[error("error: cannot find package \"{0}\"")]
    PackageNotFound(String),
}

impl GenError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        GenError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            GenError::Usage(_) => EXIT_USAGE,
            _ => EXIT_FAILURE,
        }
    }
}

fn render(diagnostics: &[TypeError]) -> String {
    format_type_errors(diagnostics).trim_end().to_string()
}

pub type Result<T> = std::result::Result<T, GenError>;
