//! gomono - stamp out concrete Go packages from a template
//!
//! A template package is written against a placeholder type
//! (`type T generic.Generic`). Generating from it erases the placeholder
//! declaration, renames identifiers by a binding map, type checks the result
//! as a package of its own and only then publishes it.

pub mod compiler;
pub mod config;
pub mod error;
pub mod generate;
pub mod logger;
pub mod manifest;

pub use config::{BindingMap, GenerateOptions, Verbosity};
pub use error::GenError;
pub use generate::{Generated, generate};
pub use manifest::Manifest;
